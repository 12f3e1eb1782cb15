pub const DEFAULT_EXPIRY_HOURS: i64 = 24;
pub const DEFAULT_MAX_GENERATION_ATTEMPTS: u32 = 32;
/// Upper bound accepted for `default_expiry_hours` (about a century).
pub const MAX_EXPIRY_HOURS: i64 = 24 * 366 * 100;

#[derive(Clone, Debug)]
pub struct LifecycleConfig {
    pub store_endpoint: String,
    pub store_credential: String,
    /// Lifetime given to codes generated without an explicit `expiresAt`
    pub default_expiry_hours: i64,
    pub max_generation_attempts: u32,
}

impl LifecycleConfig {
    pub fn new(store_endpoint: impl Into<String>, store_credential: impl Into<String>) -> Self {
        Self {
            store_endpoint: store_endpoint.into(),
            store_credential: store_credential.into(),
            default_expiry_hours: DEFAULT_EXPIRY_HOURS,
            max_generation_attempts: DEFAULT_MAX_GENERATION_ATTEMPTS,
        }
    }

    pub fn with_default_expiry_hours(mut self, hours: i64) -> Self {
        self.default_expiry_hours = hours;
        self
    }

    pub fn with_max_generation_attempts(mut self, attempts: u32) -> Self {
        self.max_generation_attempts = attempts;
        self
    }
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self::new("", "")
    }
}
