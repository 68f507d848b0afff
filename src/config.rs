// Provider configuration for the flight-offer engine.

use std::env;

/// Connection settings for the upstream flight-offer provider.
///
/// Absent credentials mean the provider is treated as unavailable and every
/// search falls back to synthetic offers. `force_synthetic` skips the
/// provider even when credentials are present.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub client_id: String,
    pub client_secret: String,
    pub base_url: String,
    pub force_synthetic: bool,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            base_url: "https://test.api.amadeus.com/v2".to_string(),
            force_synthetic: false,
        }
    }
}

impl ProviderConfig {
    /// Reads configuration from the environment, falling back to defaults
    /// for anything unset.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            client_id: env::var("AMADEUS_CLIENT_ID").unwrap_or_default(),
            client_secret: env::var("AMADEUS_CLIENT_SECRET").unwrap_or_default(),
            base_url: env::var("AMADEUS_BASE_URL").unwrap_or(defaults.base_url),
            force_synthetic: env::var("FORCE_SYNTHETIC_OFFERS")
                .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
        }
    }

    /// Availability precheck: both client id and secret configured and
    /// non-empty. No network I/O is attempted when this is false.
    pub fn has_credentials(&self) -> bool {
        !self.client_id.is_empty() && !self.client_secret.is_empty()
    }
}
