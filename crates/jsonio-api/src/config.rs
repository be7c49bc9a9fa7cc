//! # Pipeline Configuration

/// Default request body limit: 2 MiB.
pub const DEFAULT_MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Environment variable overriding [`JsonIoConfig::max_body_bytes`].
pub const MAX_BODY_BYTES_ENV: &str = "JSONIO_MAX_BODY_BYTES";

/// Settings for the document translator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JsonIoConfig {
    /// Largest request body read before answering 413.
    pub max_body_bytes: usize,
}

impl Default for JsonIoConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

impl JsonIoConfig {
    /// Defaults overridden by `JSONIO_MAX_BODY_BYTES` when it parses.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(raw) = lookup(MAX_BODY_BYTES_ENV) {
            match raw.trim().parse::<usize>() {
                Ok(limit) => config.max_body_bytes = limit,
                Err(e) => tracing::warn!(
                    value = %raw,
                    error = %e,
                    "ignoring invalid {MAX_BODY_BYTES_ENV}"
                ),
            }
        }
        config
    }
}
