pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const CREDENTIAL_HEADER: &str = "X-Master-Key";

#[derive(Clone, Debug)]
pub struct StoreConfig {
    /// Base URL of the document, e.g. `https://api.jsonbin.io/v3/b/<id>`
    pub endpoint: String,
    pub credential: String,
    pub timeout_secs: u64,
}

impl StoreConfig {
    pub fn new(endpoint: impl Into<String>, credential: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            credential: credential.into(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.to_string();
        self
    }

    pub fn with_credential(mut self, credential: &str) -> Self {
        self.credential = credential.to_string();
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub(crate) fn latest_url(&self) -> String {
        format!("{}/latest", self.endpoint.trim_end_matches('/'))
    }

    pub(crate) fn document_url(&self) -> String {
        self.endpoint.trim_end_matches('/').to_string()
    }
}
