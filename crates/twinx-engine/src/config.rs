//! Engine configuration
//!
//! Loaded from TOML. Every key is optional; a missing key takes its default.
//!
//! ```toml
//! [invocation]
//! default_timeout_ms = 60000
//! handle_ttl_secs = 3600
//!
//! [pagination]
//! default_limit = 100
//!
//! [logging]
//! profile = "production"
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use twinx_core::invocation::{HandleRetention, InvocationEngine};
use twinx_core::logging_facility::Profile;
use twinx_core::{ExError, ExErrorKind};

use crate::Result;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub invocation: InvocationConfig,
    pub pagination: PaginationConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InvocationConfig {
    /// Handler budget when a request names none
    pub default_timeout_ms: u64,
    /// Keep completed async results this long; absent keeps them until evicted
    pub handle_ttl_secs: Option<u64>,
}

impl Default for InvocationConfig {
    fn default() -> Self {
        Self {
            default_timeout_ms: 60_000,
            handle_ttl_secs: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationConfig {
    /// Page size when the caller passes no limit
    pub default_limit: usize,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self { default_limit: 100 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub profile: Profile,
}

impl EngineConfig {
    /// Parse a TOML document
    ///
    /// # Errors
    /// * `Serialization` - the document is not valid TOML or has wrongly typed keys
    pub fn from_toml_str(source: &str) -> Result<Self> {
        toml::from_str(source).map_err(|e| {
            ExError::new(ExErrorKind::Serialization)
                .with_op("config_parse")
                .with_message(e.to_string())
        })
    }

    /// Read and parse a TOML file
    ///
    /// # Errors
    /// * `Io` - the file cannot be read
    /// * `Serialization` - the content is not a valid configuration
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|e| {
            ExError::new(ExErrorKind::Io)
                .with_op("config_load")
                .with_message(format!("cannot read {}: {}", path.display(), e))
        })?;
        let config = Self::from_toml_str(&source)?;
        tracing::debug!(path = %path.display(), "engine configuration loaded");
        Ok(config)
    }

    pub fn default_timeout(&self) -> Duration {
        Duration::from_millis(self.invocation.default_timeout_ms)
    }

    pub fn handle_retention(&self) -> HandleRetention {
        match self.invocation.handle_ttl_secs {
            Some(secs) => HandleRetention::Ttl(Duration::from_secs(secs)),
            None => HandleRetention::KeepForever,
        }
    }

    /// Invocation engine set up with this configuration
    pub fn invocation_engine(&self) -> InvocationEngine {
        InvocationEngine::new()
            .with_default_timeout(self.default_timeout())
            .with_retention(self.handle_retention())
    }

    /// Install the global subscriber for the configured profile (once per process)
    pub fn init_logging(&self) {
        twinx_core::logging_facility::init(self.logging.profile);
    }

    /// Limit to use for a listing call
    pub fn page_limit(&self, requested: Option<usize>) -> usize {
        requested.unwrap_or(self.pagination.default_limit)
    }
}
