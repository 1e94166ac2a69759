//! TwinX Engine - Provider layer
//!
//! Binds Shells and Submodels to the CRUD and invocation contract consumed by
//! a transport layer, and keeps identifier-keyed registries of those bindings.
//!
//! ## Logging Ownership
//!
//! Every public provider operation emits `log_op_start!` on entry and
//! `log_op_end!` or `log_op_error!` on exit, scoped to the Shell or Submodel id
//! and the element or Operation path it touches. `twinx-core` only adds
//! `tracing::debug!`/`warn!` detail below that.

pub mod config;
pub mod provider;

pub use config::EngineConfig;
pub use provider::{
    ProviderRegistry, ShellFilter, ShellRepositoryProvider, ShellServiceProvider, SubmodelFilter,
    SubmodelRepositoryProvider, SubmodelServiceProvider,
};

/// Result type of the provider layer
pub type Result<T> = std::result::Result<T, twinx_core::ExError>;
