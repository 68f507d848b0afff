// Flight offer acquisition and normalization engine.
//
// Fetches and normalizes live offers from the configured provider when it is
// reachable, and synthesizes plausible offers otherwise, so callers always
// receive a usable, paginated result set.

pub mod config;
pub mod duration;
pub mod model;
pub mod normalize;
pub mod provider;
pub mod search;
pub mod synthetic;

// Re-export key types for convenience
pub use config::ProviderConfig;
pub use model::{
    FlightOffer, FlightSegment, PaginatedResponse, PaginationMetadata, SearchCriteria,
};
pub use provider::{
    ExternalSearchClient, HttpTransport, ProviderError, ProviderTransport, TokenManager,
};
pub use search::TicketSearchService;
pub use synthetic::SyntheticOfferGenerator;
