//! Environment-supplied client configuration.

/// Variable holding the API base URL.
pub const BASE_URL_VAR: &str = "INVENTORY_API_BASE_URL";

/// Used when `INVENTORY_API_BASE_URL` is unset or blank.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub base_url: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_value(std::env::var(BASE_URL_VAR).ok())
    }

    fn from_value(raw: Option<String>) -> Self {
        let base_url = raw
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        Self { base_url }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_value(None)
    }
}
