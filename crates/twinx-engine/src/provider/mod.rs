//! Service and repository providers
//!
//! A service provider binds one Shell or Submodel snapshot behind a lock and
//! exposes the CRUD and invocation contract over it. Repository providers hold
//! many service providers keyed by entity id.

pub mod registry;
pub mod repository;
pub mod shell_provider;
pub mod submodel_provider;

pub use registry::ProviderRegistry;
pub use repository::{ShellFilter, ShellRepositoryProvider, SubmodelFilter, SubmodelRepositoryProvider};
pub use shell_provider::ShellServiceProvider;
pub use submodel_provider::SubmodelServiceProvider;

use std::time::Instant;

use twinx_core::logging_facility::OpScope;
use twinx_core::ops::Page;
use twinx_core::{log_op_end, log_op_error, log_op_start};

use crate::Result;

/// Run `f` between the boundary start and end/error events of `op`
pub(crate) fn observed<T>(op: &'static str, scope: OpScope<'_>, f: impl FnOnce() -> Result<T>) -> Result<T> {
    let (result, duration_ms) = boundary(op, scope, f)?;
    log_op_end!(op, duration_ms = duration_ms);
    Ok(result)
}

/// [`observed`] for listings; the end event records the page length
pub(crate) fn observed_page<T>(
    op: &'static str,
    scope: OpScope<'_>,
    f: impl FnOnce() -> Result<Page<T>>,
) -> Result<Page<T>> {
    let (page, duration_ms) = boundary(op, scope, f)?;
    log_op_end!(op, duration_ms = duration_ms, page_len = page.items.len());
    Ok(page)
}

/// Start event, then `f`; errors are logged and leave with `op` attached
/// when they carry no operation yet
fn boundary<T>(op: &'static str, scope: OpScope<'_>, f: impl FnOnce() -> Result<T>) -> Result<(T, u64)> {
    log_op_start!(op, scope = scope);
    let start = Instant::now();

    match f() {
        Ok(value) => Ok((value, start.elapsed().as_millis() as u64)),
        Err(e) => {
            let e = if e.op().is_none() { e.with_op(op) } else { e };
            log_op_error!(
                op,
                e.clone(),
                duration_ms = start.elapsed().as_millis() as u64,
                scope = scope
            );
            Err(e)
        }
    }
}
