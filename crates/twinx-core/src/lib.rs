//! TwinX Core - In-memory kernel of the digital twin engine
//!
//! This crate provides the data structures and operations behind the
//! provider layer, including:
//! - The Submodel element model (closed set of element variants, ordered containers)
//! - Element tree CRUD addressed by idShort paths
//! - Value-only projection of elements
//! - Field-wise merge of partial Shell/Submodel updates
//! - Cursor pagination over ordered collections
//! - Operation invocation with timeout, cooperative cancellation and async handles
//!
//! Nothing here logs boundary events; that is left to the provider layer.

pub mod errors;
pub mod invocation;
pub mod logging_facility;
pub mod model;
pub mod ops;

pub use twinx_core_types::schema;

// Re-export commonly used types
pub use errors::{ExError, ExErrorKind, Result, TwinError};
pub use invocation::{InvocationEngine, InvocationMode, InvocationRequest, InvocationResponse};
pub use model::{AssetAdministrationShell, ElementContainer, Submodel, SubmodelElement};
pub use ops::{IdShortPath, Page};
