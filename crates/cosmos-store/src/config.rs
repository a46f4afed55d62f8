//! Connection settings.

use std::time::Duration;

/// Default page size requested for queries
pub const DEFAULT_PAGE_SIZE: u32 = 100;
/// Default HTTP request timeout
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Account endpoint and credentials.
#[derive(Clone)]
pub struct CosmosConfig {
    /// Account URI, e.g. `https://myaccount.documents.azure.com:443/`
    pub endpoint: String,
    /// Base64 master key
    pub key: String,
    /// Skip TLS verification (local emulator only)
    pub accept_invalid_certs: bool,
    pub request_timeout: Duration,
    /// `x-ms-max-item-count` sent with queries
    pub page_size: u32,
}

impl CosmosConfig {
    pub fn new(endpoint: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            key: key.into(),
            accept_invalid_certs: false,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }
}

impl std::fmt::Debug for CosmosConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CosmosConfig")
            .field("endpoint", &self.endpoint)
            .field("key", &"<redacted>")
            .field("accept_invalid_certs", &self.accept_invalid_certs)
            .field("request_timeout", &self.request_timeout)
            .field("page_size", &self.page_size)
            .finish()
    }
}
