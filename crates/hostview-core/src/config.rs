//! Request view configuration
//!
//! Defaults suit most hosts. Deployments that want to tune the form body
//! limit without recompiling can load overrides from the process
//! environment with [`RequestConfig::from_env`].

use crate::error::ConfigError;

/// Default cap on form bodies (10MB)
pub const DEFAULT_FORM_LIMIT: usize = 10 * 1024 * 1024;

/// Environment variable overriding [`RequestConfig::max_form_size`]
pub const ENV_MAX_FORM_SIZE: &str = "HOSTVIEW_MAX_FORM_SIZE";

/// Environment variable overriding [`RequestConfig::require_form_content_type`]
pub const ENV_REQUIRE_FORM_CONTENT_TYPE: &str = "HOSTVIEW_REQUIRE_FORM_CONTENT_TYPE";

/// Per-view settings
///
/// # Example
///
/// ```rust
/// use hostview_core::RequestConfig;
///
/// let config = RequestConfig::new()
///     .max_form_size(64 * 1024)
///     .require_form_content_type(true);
///
/// assert_eq!(config.max_form_size, 64 * 1024);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestConfig {
    /// Largest body the form view will read, in bytes
    pub max_form_size: usize,
    /// When true, a request without `Content-Type` is treated as having no form
    pub require_form_content_type: bool,
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            max_form_size: DEFAULT_FORM_LIMIT,
            require_form_content_type: false,
        }
    }
}

impl RequestConfig {
    /// Create a config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the form body limit
    pub fn max_form_size(mut self, limit: usize) -> Self {
        self.max_form_size = limit;
        self
    }

    /// Require an explicit form content type before reading the body
    pub fn require_form_content_type(mut self, required: bool) -> Self {
        self.require_form_content_type = required;
        self
    }

    /// Load the config from `HOSTVIEW_*` environment variables.
    ///
    /// Unset variables keep their defaults; set-but-invalid ones are errors.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(value) = lookup(ENV_MAX_FORM_SIZE) {
            config.max_form_size = value.trim().parse().map_err(|_| ConfigError::InvalidVar {
                var: ENV_MAX_FORM_SIZE,
                value: value.clone(),
            })?;
        }

        if let Some(value) = lookup(ENV_REQUIRE_FORM_CONTENT_TYPE) {
            config.require_form_content_type = match value.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                _ => {
                    return Err(ConfigError::InvalidVar {
                        var: ENV_REQUIRE_FORM_CONTENT_TYPE,
                        value,
                    })
                }
            };
        }

        Ok(config)
    }
}
