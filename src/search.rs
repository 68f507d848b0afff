// Search orchestration: live offers when the provider is reachable,
// synthetic backfill otherwise, pagination over whichever list was produced.

use tracing::{info, warn};

use crate::config::ProviderConfig;
use crate::model::{FlightOffer, PaginatedResponse, PaginationMetadata, SearchCriteria};
use crate::provider::ExternalSearchClient;
use crate::synthetic::SyntheticOfferGenerator;

/// The engine's sole public operation lives here. `search_tickets` never
/// fails outward: absence of live data is transparently backfilled with
/// synthetic offers.
pub struct TicketSearchService {
    config: ProviderConfig,
    external: ExternalSearchClient,
    synthetic: SyntheticOfferGenerator,
}

impl TicketSearchService {
    pub fn new(config: ProviderConfig) -> Self {
        Self {
            external: ExternalSearchClient::new(config.clone()),
            synthetic: SyntheticOfferGenerator::new(),
            config,
        }
    }

    /// Wires the service from pre-built parts. Used by tests to substitute
    /// transports and seeded generators.
    pub fn with_parts(
        config: ProviderConfig,
        external: ExternalSearchClient,
        synthetic: SyntheticOfferGenerator,
    ) -> Self {
        Self {
            config,
            external,
            synthetic,
        }
    }

    pub async fn search_tickets(
        &self,
        criteria: &SearchCriteria,
    ) -> PaginatedResponse<FlightOffer> {
        info!(
            origin = %criteria.origin,
            destination = %criteria.destination,
            departure = %criteria.departure_date,
            "searching tickets"
        );

        let offers = match self.try_external(criteria).await {
            Some(offers) => offers,
            None => {
                warn!("no live offers available, generating synthetic offers");
                self.synthetic.generate(criteria)
            }
        };

        let page = paginate(offers, criteria.page, criteria.size);
        info!(
            returned = page.items.len(),
            page = page.metadata.page,
            total_pages = page.metadata.total_pages,
            "returning ticket page"
        );
        page
    }

    /// First pipeline stage: `None` means the provider path produced nothing,
    /// whether because it is unconfigured, forced off, failed, or returned
    /// zero offers.
    async fn try_external(&self, criteria: &SearchCriteria) -> Option<Vec<FlightOffer>> {
        if self.config.force_synthetic || !self.config.has_credentials() {
            return None;
        }
        let offers = self.external.search(criteria).await;
        if offers.is_empty() {
            None
        } else {
            Some(offers)
        }
    }
}

/// Slices `[page*size, min(page*size+size, total))` and attaches metadata
/// computed from the true total. An out-of-range page yields an empty slice.
/// `size` is clamped to at least 1 before any division.
pub fn paginate<T>(items: Vec<T>, page: usize, size: usize) -> PaginatedResponse<T> {
    let size = size.max(1);
    let total = items.len();
    let metadata = PaginationMetadata::compute(total, page, size);

    let start = page.saturating_mul(size);
    let items = if start >= total {
        Vec::new()
    } else {
        items
            .into_iter()
            .skip(start)
            .take(size.min(total - start))
            .collect()
    };

    PaginatedResponse { items, metadata }
}
