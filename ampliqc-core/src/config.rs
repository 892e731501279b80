//! Pipeline configuration

use crate::ConfigError;
use std::time::Duration;

/// Default total attempts for the design request (1 initial + 3 retries).
pub const DEFAULT_DESIGN_MAX_ATTEMPTS: u32 = 4;

/// Default per-request timeout in milliseconds.
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;

/// Default capacity of the pipeline event channel.
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Default backend base URL.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Configuration for the verification pipeline and its backend client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Base URL of the backend that serves design, search, PCR and notes
    pub backend_base_url: String,

    /// Timeout applied to every backend request
    pub request_timeout: Duration,

    /// Total attempts for the design request, including the first
    /// (default: 4)
    pub design_max_attempts: u32,

    /// Capacity of the bounded event channel handed to the presentation
    /// layer (default: 256)
    pub event_capacity: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            backend_base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout: Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS),
            design_max_attempts: DEFAULT_DESIGN_MAX_ATTEMPTS,
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl PipelineConfig {
    /// Create PipelineConfig from environment variables.
    ///
    /// # Environment Variables
    /// - `AMPLIQC_BASE_URL`: Backend base URL (default: http://localhost:8000)
    /// - `AMPLIQC_REQUEST_TIMEOUT_MS`: Per-request timeout (default: 30000)
    /// - `AMPLIQC_DESIGN_MAX_ATTEMPTS`: Design attempts incl. first (default: 4)
    /// - `AMPLIQC_EVENT_CAPACITY`: Event channel capacity (default: 256)
    pub fn from_env() -> Self {
        let backend_base_url = std::env::var("AMPLIQC_BASE_URL")
            .ok()
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let request_timeout = Duration::from_millis(
            std::env::var("AMPLIQC_REQUEST_TIMEOUT_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_MS),
        );

        let design_max_attempts = std::env::var("AMPLIQC_DESIGN_MAX_ATTEMPTS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_DESIGN_MAX_ATTEMPTS);

        let event_capacity = std::env::var("AMPLIQC_EVENT_CAPACITY")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_EVENT_CAPACITY);

        Self {
            backend_base_url,
            request_timeout,
            design_max_attempts,
            event_capacity,
        }
    }

    /// Configuration for development against a local backend:
    /// short timeout so a dead backend fails fast.
    pub fn development() -> Self {
        Self {
            request_timeout: Duration::from_secs(5),
            ..Self::default()
        }
    }

    /// Production configuration. The design step can legitimately run for
    /// a while, so the timeout is generous.
    pub fn production() -> Self {
        Self {
            request_timeout: Duration::from_secs(60),
            ..Self::default()
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.backend_base_url.is_empty() {
            return Err(ConfigError::MissingRequired {
                field: "backend_base_url".to_string(),
            });
        }
        if !self.backend_base_url.starts_with("http://")
            && !self.backend_base_url.starts_with("https://")
        {
            return Err(ConfigError::InvalidValue {
                field: "backend_base_url".to_string(),
                value: self.backend_base_url.clone(),
                reason: "must be an http(s) URL".to_string(),
            });
        }
        if self.request_timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                field: "request_timeout".to_string(),
                value: "0".to_string(),
                reason: "must be positive".to_string(),
            });
        }
        if self.design_max_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                field: "design_max_attempts".to_string(),
                value: "0".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if self.event_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                field: "event_capacity".to_string(),
                value: "0".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================
