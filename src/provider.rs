// Provider-facing side of the engine: bearer-token lifecycle, transport
// abstraction, and the live flight-offer search client.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::Mutex;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::config::ProviderConfig;
use crate::model::{FlightOffer, SearchCriteria};
use crate::normalize::normalize_offers;

/// A cached token is not handed out once it is this close to expiry.
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// Fixed result cap sent with every provider search.
const MAX_RESULTS: u32 = 50;

/// Candidate OAuth endpoints, tried in order until one succeeds.
const DEFAULT_TOKEN_ENDPOINTS: [&str; 2] = [
    "https://test.api.amadeus.com/v1/security/oauth2/token",
    "https://api.amadeus.com/v1/security/oauth2/token",
];

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("provider credentials are not configured")]
    MissingCredentials,

    #[error("network error: {0}")]
    Network(String),

    #[error("provider returned status {0}")]
    Status(u16),

    #[error("all token endpoints failed")]
    TokenUnavailable,

    #[error("malformed provider response: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        ProviderError::Network(err.to_string())
    }
}

/// The minimal HTTP surface the engine needs. Production code goes through
/// [`HttpTransport`]; tests substitute an in-process mock.
#[async_trait]
pub trait ProviderTransport: Send + Sync {
    /// POSTs a form-urlencoded body, returning the response body on 2xx.
    async fn post_form(&self, url: &str, body: String) -> Result<String, ProviderError>;

    /// GETs with a bearer token, returning the response body on 2xx.
    async fn get_with_bearer(&self, url: &str, token: &str) -> Result<String, ProviderError>;
}

/// reqwest-backed transport. Timeouts are whatever the client enforces by
/// default; callers needing bounded latency wrap the whole search call.
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProviderTransport for HttpTransport {
    async fn post_form(&self, url: &str, body: String) -> Result<String, ProviderError> {
        let response = self
            .client
            .post(url)
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(body)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Status(status.as_u16()));
        }
        Ok(response.text().await?)
    }

    async fn get_with_bearer(&self, url: &str, token: &str) -> Result<String, ProviderError> {
        let response = self
            .client
            .get(url)
            .bearer_auth(token)
            .header("Accept", "application/json")
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Status(status.as_u16()));
        }
        Ok(response.text().await?)
    }
}

struct CachedToken {
    value: String,
    expires_at: Instant,
}

/// Acquires and caches the provider bearer token.
///
/// The cached value is replaced wholesale on refresh; concurrent refreshes
/// serialize on the lock, so the worst case is one redundant token request.
pub struct TokenManager {
    config: ProviderConfig,
    endpoints: Vec<String>,
    transport: Arc<dyn ProviderTransport>,
    cached: Mutex<Option<CachedToken>>,
}

impl TokenManager {
    pub fn new(config: ProviderConfig, transport: Arc<dyn ProviderTransport>) -> Self {
        Self {
            config,
            endpoints: DEFAULT_TOKEN_ENDPOINTS
                .iter()
                .map(|endpoint| endpoint.to_string())
                .collect(),
            transport,
            cached: Mutex::new(None),
        }
    }

    /// Overrides the candidate OAuth endpoints.
    pub fn with_endpoints(mut self, endpoints: Vec<String>) -> Self {
        self.endpoints = endpoints;
        self
    }

    /// Returns the cached token while it is comfortably inside its validity
    /// window, otherwise refreshes. Failure here means the provider is
    /// unavailable; callers must not retry synchronously.
    pub async fn get_token(&self) -> Result<String, ProviderError> {
        if let Some(token) = self.cached_token() {
            debug!("reusing cached provider token");
            return Ok(token);
        }
        self.refresh().await
    }

    fn cached_token(&self) -> Option<String> {
        let cached = self.cached.lock();
        cached
            .as_ref()
            .filter(|token| Instant::now() + TOKEN_EXPIRY_MARGIN < token.expires_at)
            .map(|token| token.value.clone())
    }

    async fn refresh(&self) -> Result<String, ProviderError> {
        let body = format!(
            "grant_type=client_credentials&client_id={}&client_secret={}",
            self.config.client_id, self.config.client_secret
        );

        for endpoint in &self.endpoints {
            match self.transport.post_form(endpoint, body.clone()).await {
                Ok(response) => match parse_token_response(&response) {
                    Ok((value, expires_in)) => {
                        info!(endpoint = %endpoint, "obtained provider access token");
                        let expires_at = Instant::now() + Duration::from_secs(expires_in);
                        *self.cached.lock() = Some(CachedToken {
                            value: value.clone(),
                            expires_at,
                        });
                        return Ok(value);
                    }
                    Err(err) => {
                        warn!(endpoint = %endpoint, error = %err, "unusable token response");
                    }
                },
                Err(err) => {
                    warn!(endpoint = %endpoint, error = %err, "token request failed, trying next endpoint");
                }
            }
        }

        error!("all token endpoints failed");
        Err(ProviderError::TokenUnavailable)
    }
}

fn parse_token_response(body: &str) -> Result<(String, u64), ProviderError> {
    let json: serde_json::Value =
        serde_json::from_str(body).map_err(|err| ProviderError::Malformed(err.to_string()))?;
    let token = json
        .get("access_token")
        .and_then(|value| value.as_str())
        .ok_or_else(|| ProviderError::Malformed("missing access_token".to_string()))?;
    let expires_in = json
        .get("expires_in")
        .and_then(|value| value.as_u64())
        .ok_or_else(|| ProviderError::Malformed("missing expires_in".to_string()))?;
    Ok((token.to_string(), expires_in))
}

/// Live flight-offer search against the provider.
pub struct ExternalSearchClient {
    config: ProviderConfig,
    tokens: TokenManager,
    transport: Arc<dyn ProviderTransport>,
}

impl ExternalSearchClient {
    pub fn new(config: ProviderConfig) -> Self {
        Self::with_transport(config, Arc::new(HttpTransport::new()))
    }

    pub fn with_transport(config: ProviderConfig, transport: Arc<dyn ProviderTransport>) -> Self {
        Self {
            tokens: TokenManager::new(config.clone(), Arc::clone(&transport)),
            config,
            transport,
        }
    }

    /// Searches the provider for live offers. Never raises: missing
    /// credentials, token failure, transport failure and malformed responses
    /// all degrade to an empty list.
    pub async fn search(&self, criteria: &SearchCriteria) -> Vec<FlightOffer> {
        if !self.config.has_credentials() {
            debug!("provider credentials absent, skipping live search");
            return Vec::new();
        }

        match self.try_search(criteria).await {
            Ok(offers) => offers,
            Err(err) => {
                warn!(error = %err, "live offer search failed");
                Vec::new()
            }
        }
    }

    async fn try_search(
        &self,
        criteria: &SearchCriteria,
    ) -> Result<Vec<FlightOffer>, ProviderError> {
        let token = self.tokens.get_token().await?;
        let url = self.build_search_url(criteria);
        let body = self.transport.get_with_bearer(&url, &token).await?;
        let offers = normalize_offers(&body, criteria);
        info!(count = offers.len(), "normalized live offers");
        Ok(offers)
    }

    fn build_search_url(&self, criteria: &SearchCriteria) -> String {
        let mut url = format!(
            "{}/shopping/flight-offers?originLocationCode={}&destinationLocationCode={}&departureDate={}&adults={}&max={}",
            self.config.base_url,
            criteria.origin,
            criteria.destination,
            criteria.departure_date.format("%Y-%m-%d"),
            criteria.passengers,
            MAX_RESULTS,
        );
        if criteria.round_trip {
            if let Some(return_date) = criteria.return_date {
                url.push_str(&format!("&returnDate={}", return_date.format("%Y-%m-%d")));
            }
        }
        url
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::collections::HashSet;

    // In-process transport double: records every call, fails the endpoints
    // it is told to, and answers everything else with canned bodies.
    struct MockTransport {
        post_calls: Mutex<Vec<(String, String)>>,
        get_calls: Mutex<Vec<(String, String)>>,
        failing_urls: HashSet<String>,
        token_body: String,
        search_body: String,
    }

    impl MockTransport {
        fn new() -> Self {
            Self {
                post_calls: Mutex::new(Vec::new()),
                get_calls: Mutex::new(Vec::new()),
                failing_urls: HashSet::new(),
                token_body: r#"{"access_token":"tok-1","expires_in":1799}"#.to_string(),
                search_body: r#"{"data":[]}"#.to_string(),
            }
        }

        fn failing(mut self, url: &str) -> Self {
            self.failing_urls.insert(url.to_string());
            self
        }

        fn with_search_body(mut self, body: &str) -> Self {
            self.search_body = body.to_string();
            self
        }

        fn post_count(&self) -> usize {
            self.post_calls.lock().len()
        }
    }

    #[async_trait]
    impl ProviderTransport for MockTransport {
        async fn post_form(&self, url: &str, body: String) -> Result<String, ProviderError> {
            self.post_calls.lock().push((url.to_string(), body));
            if self.failing_urls.contains(url) {
                return Err(ProviderError::Status(500));
            }
            Ok(self.token_body.clone())
        }

        async fn get_with_bearer(&self, url: &str, token: &str) -> Result<String, ProviderError> {
            self.get_calls.lock().push((url.to_string(), token.to_string()));
            if self.failing_urls.contains(url) {
                return Err(ProviderError::Status(503));
            }
            Ok(self.search_body.clone())
        }
    }

    fn configured() -> ProviderConfig {
        ProviderConfig {
            client_id: "client-id".to_string(),
            client_secret: "client-secret".to_string(),
            ..ProviderConfig::default()
        }
    }

    fn criteria() -> SearchCriteria {
        SearchCriteria {
            origin: "JFK".to_string(),
            destination: "LAX".to_string(),
            departure_date: NaiveDate::from_ymd_opt(2026, 9, 1).expect("valid date"),
            return_date: None,
            round_trip: false,
            passengers: 2,
            page: 0,
            size: 20,
        }
    }

    fn manager(transport: Arc<MockTransport>, endpoints: Vec<&str>) -> TokenManager {
        TokenManager::new(configured(), transport)
            .with_endpoints(endpoints.into_iter().map(str::to_string).collect())
    }

    #[tokio::test]
    async fn token_request_sends_client_credentials_form() {
        let transport = Arc::new(MockTransport::new());
        let tokens = manager(Arc::clone(&transport), vec!["https://auth.test/token"]);

        let token = tokens.get_token().await.expect("token");
        assert_eq!(token, "tok-1");

        let calls = transport.post_calls.lock();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "https://auth.test/token");
        assert_eq!(
            calls[0].1,
            "grant_type=client_credentials&client_id=client-id&client_secret=client-secret"
        );
    }

    #[tokio::test]
    async fn valid_cached_token_is_reused_without_network_call() {
        let transport = Arc::new(MockTransport::new());
        let tokens = manager(Arc::clone(&transport), vec!["https://auth.test/token"]);

        tokens.get_token().await.expect("first token");
        tokens.get_token().await.expect("cached token");

        assert_eq!(transport.post_count(), 1);
    }

    #[tokio::test]
    async fn token_inside_expiry_margin_triggers_refresh() {
        let transport = Arc::new(MockTransport::new());
        let tokens = manager(Arc::clone(&transport), vec!["https://auth.test/token"]);

        // 30 seconds of remaining lifetime is inside the 60 second margin.
        *tokens.cached.lock() = Some(CachedToken {
            value: "stale".to_string(),
            expires_at: Instant::now() + Duration::from_secs(30),
        });

        let token = tokens.get_token().await.expect("refreshed token");
        assert_eq!(token, "tok-1");
        assert_eq!(transport.post_count(), 1);
    }

    #[tokio::test]
    async fn token_well_outside_margin_is_kept() {
        let transport = Arc::new(MockTransport::new());
        let tokens = manager(Arc::clone(&transport), vec!["https://auth.test/token"]);

        *tokens.cached.lock() = Some(CachedToken {
            value: "still-good".to_string(),
            expires_at: Instant::now() + Duration::from_secs(300),
        });

        let token = tokens.get_token().await.expect("cached token");
        assert_eq!(token, "still-good");
        assert_eq!(transport.post_count(), 0);
    }

    #[tokio::test]
    async fn failing_endpoint_fails_over_to_next() {
        let transport = Arc::new(MockTransport::new().failing("https://auth.test/token"));
        let tokens = manager(
            Arc::clone(&transport),
            vec!["https://auth.test/token", "https://auth.prod/token"],
        );

        let token = tokens.get_token().await.expect("token from second endpoint");
        assert_eq!(token, "tok-1");

        let calls = transport.post_calls.lock();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].0, "https://auth.test/token");
        assert_eq!(calls[1].0, "https://auth.prod/token");
    }

    #[tokio::test]
    async fn exhausted_endpoints_report_token_unavailable() {
        let transport = Arc::new(
            MockTransport::new()
                .failing("https://auth.test/token")
                .failing("https://auth.prod/token"),
        );
        let tokens = manager(
            Arc::clone(&transport),
            vec!["https://auth.test/token", "https://auth.prod/token"],
        );

        let err = tokens.get_token().await.expect_err("all endpoints down");
        assert!(matches!(err, ProviderError::TokenUnavailable));
        assert_eq!(transport.post_count(), 2);
    }

    #[tokio::test]
    async fn search_without_credentials_skips_all_network_io() {
        let transport = Arc::new(MockTransport::new());
        let client =
            ExternalSearchClient::with_transport(
                ProviderConfig::default(),
                Arc::clone(&transport) as Arc<dyn ProviderTransport>,
            );

        let offers = client.search(&criteria()).await;

        assert!(offers.is_empty());
        assert_eq!(transport.post_count(), 0);
        assert!(transport.get_calls.lock().is_empty());
    }

    #[tokio::test]
    async fn search_url_carries_expected_query_parameters() {
        let transport = Arc::new(MockTransport::new());
        let client = ExternalSearchClient::with_transport(
            configured(),
            Arc::clone(&transport) as Arc<dyn ProviderTransport>,
        );

        client.search(&criteria()).await;

        let calls = transport.get_calls.lock();
        assert_eq!(calls.len(), 1);
        assert_eq!(
            calls[0].0,
            "https://test.api.amadeus.com/v2/shopping/flight-offers\
             ?originLocationCode=JFK&destinationLocationCode=LAX\
             &departureDate=2026-09-01&adults=2&max=50"
        );
        assert_eq!(calls[0].1, "tok-1");
    }

    #[tokio::test]
    async fn round_trip_search_appends_return_date() {
        let transport = Arc::new(MockTransport::new());
        let client = ExternalSearchClient::with_transport(
            configured(),
            Arc::clone(&transport) as Arc<dyn ProviderTransport>,
        );

        let round_trip = SearchCriteria {
            round_trip: true,
            return_date: NaiveDate::from_ymd_opt(2026, 9, 8),
            ..criteria()
        };
        client.search(&round_trip).await;

        let calls = transport.get_calls.lock();
        assert!(calls[0].0.ends_with("&returnDate=2026-09-08"));
    }

    #[tokio::test]
    async fn transport_failure_degrades_to_empty_list() {
        let transport = Arc::new(
            MockTransport::new()
                .failing("https://test.api.amadeus.com/v1/security/oauth2/token")
                .failing("https://api.amadeus.com/v1/security/oauth2/token"),
        );
        let client = ExternalSearchClient::with_transport(configured(), transport);

        assert!(client.search(&criteria()).await.is_empty());
    }

    #[tokio::test]
    async fn search_normalizes_provider_body() {
        let body = r#"{
            "data": [{
                "id": "live-1",
                "price": { "total": "410.00" },
                "itineraries": [{
                    "segments": [{
                        "departure": { "iataCode": "JFK", "at": "2026-09-01T08:00:00" },
                        "arrival": { "iataCode": "LAX", "at": "2026-09-01T11:10:00" },
                        "carrierCode": "DL",
                        "duration": "PT6H10M"
                    }]
                }]
            }]
        }"#;
        let transport = Arc::new(MockTransport::new().with_search_body(body));
        let client = ExternalSearchClient::with_transport(configured(), transport);

        let offers = client.search(&criteria()).await;
        assert_eq!(offers.len(), 1);
        assert_eq!(offers[0].id, "live-1");
        assert_eq!(offers[0].duration, "6h 10m");
    }
}
