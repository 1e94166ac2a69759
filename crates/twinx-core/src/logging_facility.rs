//! Structured logging facility for TwinX
//!
//! This module provides a canonical logging facility with:
//! - Single initialization point via `init(profile)`
//! - Structured logging macros (`log_op_start!`, `log_op_end!`, `log_op_error!`)
//! - Test capture mode for deterministic assertions
//!
//! # Usage
//!
//! ```rust
//! use twinx_core::logging_facility::{init, Profile};
//!
//! // Initialize once at application startup
//! init(Profile::Development);
//! ```
//!
//! # Logging Macros
//!
//! - `log_op_start!(op, scope = ...)` - Log operation start
//! - `log_op_end!(op, duration_ms = ...)` - Log operation end
//! - `log_op_error!(op, err, duration_ms = ..., scope = ...)` - Log operation error
//!
//! The provider layer owns these boundary events and names their subject with
//! an [`OpScope`]. Kernel modules only emit `tracing::debug!` / `tracing::warn!`
//! for internal details, keyed by the same [`crate::schema`] field names.

pub mod init;
pub mod macros;
pub mod scope;
pub mod test_capture;

pub use init::{init, Profile};
pub use scope::OpScope;
pub use test_capture::{init_test_capture, CapturedEvent, Outcome, TestCapture};
