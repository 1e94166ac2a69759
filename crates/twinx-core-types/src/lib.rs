//! Core types shared across TwinX facilities
//!
//! This crate provides foundational types used by the error facility,
//! the logging facility and the invocation engine:
//!
//! - **Correlation types**: RequestId
//! - **Schema constants**: Canonical field keys and event names

pub mod correlation;
pub mod schema;

pub use correlation::RequestId;
