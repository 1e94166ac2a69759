//! Service provider bound to one Submodel
//!
//! The Submodel sits behind one `RwLock`. Readers share it; each write holds
//! the exclusive lock across its whole read-modify-write. Invocations clone
//! the Operation out under a read lock and release it before any handler runs.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use parking_lot::RwLock;
use serde_json::Value;
use twinx_core::invocation::{
    InvocationEngine, InvocationMode, InvocationRequest, InvocationResponse, OperationHandler,
    ValueOnlyInvocationRequest, ValueOnlyInvocationResponse,
};
use twinx_core::model::{Operation, PartialSubmodel, Submodel, SubmodelElement};
use twinx_core::ops::{self, element_ops, merge, IdShortPath, Page, PathSegment};
use twinx_core::logging_facility::OpScope;
use twinx_core::schema::{FIELD_ELEMENT_PATH, FIELD_OPERATION_PATH};
use twinx_core::{log_op_end, log_op_error, log_op_start, TwinError};

use super::{observed, observed_page};
use crate::config::EngineConfig;
use crate::Result;

const PROVIDER: &str = "SubmodelServiceProvider";

pub struct SubmodelServiceProvider {
    submodel: RwLock<Option<Submodel>>,
    engine: InvocationEngine,
    default_limit: usize,
}

impl Default for SubmodelServiceProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SubmodelServiceProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct(PROVIDER)
            .field("submodel_id", &self.bound_id())
            .field("engine", &self.engine)
            .finish()
    }
}

fn unbound() -> TwinError {
    TwinError::UnboundProvider {
        provider: PROVIDER.to_string(),
    }
}

/// Reject a Submodel that cannot be bound
pub(crate) fn validate_submodel(submodel: &Submodel) -> twinx_core::Result<()> {
    if submodel.id.trim().is_empty() {
        return Err(TwinError::InvalidEntity {
            reason: "submodel id is empty".to_string(),
        });
    }
    ops::validate_id_short(&submodel.id_short)
}

impl SubmodelServiceProvider {
    /// Unbound provider with default settings
    ///
    /// Every operation fails with `ContractViolation` until [`bind`](Self::bind).
    pub fn new() -> Self {
        Self::with_config(&EngineConfig::default())
    }

    pub fn with_config(config: &EngineConfig) -> Self {
        Self {
            submodel: RwLock::new(None),
            engine: config.invocation_engine(),
            default_limit: config.pagination.default_limit,
        }
    }

    /// Provider bound to `submodel` with default settings
    pub fn from_submodel(submodel: Submodel) -> Result<Self> {
        let provider = Self::new();
        provider.bind(submodel)?;
        Ok(provider)
    }

    /// Bind (or rebind) the Submodel snapshot
    ///
    /// # Errors
    /// * `InvalidInput` - empty id or unaddressable idShort
    pub fn bind(&self, submodel: Submodel) -> Result<()> {
        let id = submodel.id.clone();
        observed("submodel_bind", OpScope::entity(id.as_str()), || {
            validate_submodel(&submodel)?;
            *self.submodel.write() = Some(submodel);
            Ok(())
        })
    }

    pub fn is_bound(&self) -> bool {
        self.submodel.read().is_some()
    }

    pub fn bound_id(&self) -> Option<String> {
        self.submodel.read().as_ref().map(|sm| sm.id.clone())
    }

    pub fn engine(&self) -> &InvocationEngine {
        &self.engine
    }


    fn read<T>(&self, f: impl FnOnce(&Submodel) -> twinx_core::Result<T>) -> Result<T> {
        let guard = self.submodel.read();
        let submodel = guard.as_ref().ok_or_else(unbound)?;
        Ok(f(submodel)?)
    }

    fn write<T>(&self, f: impl FnOnce(&mut Submodel) -> twinx_core::Result<T>) -> Result<T> {
        let mut guard = self.submodel.write();
        let submodel = guard.as_mut().ok_or_else(unbound)?;
        Ok(f(submodel)?)
    }

    /// Current Submodel snapshot
    ///
    /// # Errors
    /// * `ContractViolation` - nothing bound
    pub fn retrieve(&self) -> Result<Submodel> {
        let id = self.bound_id();
        observed("submodel_retrieve", OpScope::entity(id.as_deref()), || {
            self.read(|sm| Ok(sm.clone()))
        })
    }

    /// Snapshot with Blob payloads left out
    pub fn retrieve_without_blob_values(&self) -> Result<Submodel> {
        let id = self.bound_id();
        observed("submodel_retrieve_metadata", OpScope::entity(id.as_deref()), || {
            self.read(|sm| Ok(sm.without_blob_values()))
        })
    }

    /// Merge `partial` into the bound Submodel
    ///
    /// Present fields override, absent fields are kept, elements are upserted.
    /// A failing merge leaves the Submodel untouched.
    pub fn update(&self, partial: PartialSubmodel) -> Result<()> {
        let id = self.bound_id();
        observed("submodel_update", OpScope::entity(id.as_deref()), || {
            self.write(|sm| {
                *sm = merge::merge_submodel(sm, partial)?;
                Ok(())
            })
        })
    }

    /// # Errors
    /// * `NotFound` - parent path does not resolve
    /// * `Conflict` - idShort taken under the parent
    /// * `InvalidInput` - bad path, idShort or List element type
    pub fn create_element(&self, parent_path: &str, element: SubmodelElement) -> Result<SubmodelElement> {
        let id = self.bound_id();
        let scope = OpScope::entity(id.as_deref()).element(parent_path);
        observed("submodel_create_element", scope, || {
            let parent = IdShortPath::parse(parent_path)?;
            self.write(|sm| {
                element_ops::create_element(&mut sm.submodel_elements, &parent, element).cloned()
            })
        })
    }

    pub fn retrieve_element(&self, path: &str) -> Result<SubmodelElement> {
        let id = self.bound_id();
        observed("submodel_retrieve_element", OpScope::entity(id.as_deref()).element(path), || {
            let path = IdShortPath::parse(path)?;
            self.read(|sm| element_ops::resolve_element(&sm.submodel_elements, &path).cloned())
        })
    }

    /// Replace the element at `path`, keeping its idShort
    pub fn update_element(&self, path: &str, element: SubmodelElement) -> Result<()> {
        let id = self.bound_id();
        observed("submodel_update_element", OpScope::entity(id.as_deref()).element(path), || {
            let path = IdShortPath::parse(path)?;
            self.write(|sm| {
                element_ops::update_element(&mut sm.submodel_elements, &path, element).map(|_| ())
            })
        })
    }

    pub fn create_or_update_element(
        &self,
        parent_path: &str,
        element: SubmodelElement,
    ) -> Result<SubmodelElement> {
        let id = self.bound_id();
        let scope = OpScope::entity(id.as_deref()).element(parent_path);
        observed("submodel_create_or_update_element", scope, || {
            let parent = IdShortPath::parse(parent_path)?;
            self.write(|sm| {
                element_ops::create_or_update_element(&mut sm.submodel_elements, &parent, element)
                    .cloned()
            })
        })
    }

    /// Remove the element at `path`
    ///
    /// Handlers bound at or below `path` are unbound. Removing a List item
    /// moves the handlers of the items after it down one position.
    pub fn delete_element(&self, path: &str) -> Result<()> {
        let id = self.bound_id();
        observed("submodel_delete_element", OpScope::entity(id.as_deref()).element(path), || {
            let path = IdShortPath::parse(path)?;
            self.write(|sm| {
                element_ops::delete_element(&mut sm.submodel_elements, &path)?;
                let handlers = self.engine.handlers();
                let unbound = handlers.unbind_subtree(&path.to_string());
                if let Some((list, PathSegment::Index(index))) = path.split_last() {
                    handlers.shift_list_indices(&list.to_string(), *index);
                }
                if unbound > 0 {
                    tracing::debug!({ FIELD_ELEMENT_PATH } = %path, unbound, "handlers unbound with element");
                }
                Ok(())
            })
        })
    }

    pub fn retrieve_element_value(&self, path: &str) -> Result<Value> {
        let id = self.bound_id();
        let scope = OpScope::entity(id.as_deref()).element(path);
        observed("submodel_retrieve_element_value", scope, || {
            let path = IdShortPath::parse(path)?;
            self.read(|sm| element_ops::element_value(&sm.submodel_elements, &path))
        })
    }

    /// Value-only update; all or nothing
    pub fn update_element_value(&self, path: &str, value: &Value) -> Result<()> {
        let id = self.bound_id();
        observed("submodel_update_element_value", OpScope::entity(id.as_deref()).element(path), || {
            let path = IdShortPath::parse(path)?;
            self.write(|sm| element_ops::update_element_value(&mut sm.submodel_elements, &path, value))
        })
    }

    /// One page of the top-level elements, keyed by idShort
    ///
    /// `limit` defaults to the configured page size.
    pub fn retrieve_elements(&self, limit: Option<usize>, cursor: &str) -> Result<Page<SubmodelElement>> {
        let id = self.bound_id();
        observed_page("submodel_retrieve_elements", OpScope::entity(id.as_deref()), || {
            let items: Vec<SubmodelElement> =
                self.read(|sm| Ok(sm.submodel_elements.iter().cloned().collect()))?;
            let limit = limit.unwrap_or(self.default_limit);
            Ok(ops::paginate(items, limit, cursor, |e| e.id_short.clone())?)
        })
    }

    /// Every element path in pre-order
    pub fn path_notation(&self) -> Result<Vec<String>> {
        let id = self.bound_id();
        observed("submodel_path_notation", OpScope::entity(id.as_deref()), || {
            self.read(|sm| Ok(element_ops::path_notation(&sm.submodel_elements)))
        })
    }

    /// Bind `handler` to the Operation at `path`
    ///
    /// # Errors
    /// * `NotFound` - nothing at the path
    /// * `InvalidInput` - the element is not an Operation
    pub fn register_handler(&self, path: &str, handler: Arc<dyn OperationHandler>) -> Result<()> {
        let id = self.bound_id();
        observed("submodel_register_handler", OpScope::entity(id.as_deref()).operation(path), || {
            let (canonical, _) = self.operation_at(path)?;
            if self.engine.bind_handler(canonical.clone(), handler).is_some() {
                tracing::debug!({ FIELD_OPERATION_PATH } = %canonical, "operation handler replaced");
            }
            Ok(())
        })
    }

    /// Canonical path string and a copy of the Operation at `path`
    fn operation_at(&self, path: &str) -> Result<(String, Operation)> {
        let parsed = IdShortPath::parse(path)?;
        let canonical = parsed.to_string();
        let operation = self.read(|sm| {
            element_ops::resolve_element(&sm.submodel_elements, &parsed)?
                .as_operation()
                .cloned()
                .ok_or_else(|| TwinError::NotAnOperation {
                    path: canonical.clone(),
                })
        })?;
        Ok((canonical, operation))
    }

    /// Invoke the Operation at `path`
    ///
    /// Must be called inside a Tokio runtime.
    pub async fn invoke_operation(
        &self,
        path: &str,
        request: InvocationRequest,
        mode: InvocationMode,
    ) -> Result<InvocationResponse> {
        let op = "submodel_invoke_operation";
        let id = self.bound_id();
        let scope = OpScope::entity(id.as_deref()).operation(path);
        let timeout_ms = self.engine.timeout_for(request.timeout_millis).as_millis() as u64;
        log_op_start!(op, scope = scope, timeout_ms = timeout_ms);
        let start = Instant::now();

        let result = self.invoke_operation_impl(path, request, mode).await;
        match &result {
            Ok(response) => log_op_end!(
                op,
                duration_ms = start.elapsed().as_millis() as u64,
                execution_state = response.execution_state.as_str(),
                request_id = response.request_id.as_str()
            ),
            Err(e) => log_op_error!(
                op,
                e.clone(),
                duration_ms = start.elapsed().as_millis() as u64,
                scope = scope
            ),
        }
        result
    }

    async fn invoke_operation_impl(
        &self,
        path: &str,
        request: InvocationRequest,
        mode: InvocationMode,
    ) -> Result<InvocationResponse> {
        let (canonical, operation) = self.operation_at(path)?;
        Ok(self.engine.invoke(&canonical, &operation, request, mode).await?)
    }

    /// Invoke with plain name → value arguments (sync only)
    pub async fn invoke_operation_value_only(
        &self,
        path: &str,
        request: ValueOnlyInvocationRequest,
        mode: InvocationMode,
    ) -> Result<ValueOnlyInvocationResponse> {
        let op = "submodel_invoke_operation_value_only";
        let id = self.bound_id();
        let scope = OpScope::entity(id.as_deref()).operation(path);
        let timeout_ms = self.engine.timeout_for(request.timeout_millis).as_millis() as u64;
        log_op_start!(op, scope = scope, timeout_ms = timeout_ms);
        let start = Instant::now();

        let result = match self.operation_at(path) {
            Ok((canonical, operation)) => self
                .engine
                .invoke_value_only(&canonical, &operation, request, mode)
                .await
                .map_err(Into::into),
            Err(e) => Err(e),
        };
        match &result {
            Ok(response) => log_op_end!(
                op,
                duration_ms = start.elapsed().as_millis() as u64,
                execution_state = response.execution_state.as_str(),
                request_id = response.request_id.as_str()
            ),
            Err(e) => log_op_error!(
                op,
                e.clone(),
                duration_ms = start.elapsed().as_millis() as u64,
                scope = scope
            ),
        }
        result
    }

    /// Poll an asynchronous invocation
    ///
    /// # Errors
    /// * `NotFound` - no handle for the path and request id
    pub fn get_invocation_result(&self, path: &str, request_id: &str) -> Result<InvocationResponse> {
        let id = self.bound_id();
        let scope = OpScope::entity(id.as_deref()).operation(path);
        observed("submodel_get_invocation_result", scope, || {
            let canonical = IdShortPath::parse(path)?.to_string();
            Ok(self.engine.get_invocation_result(&canonical, request_id)?)
        })
    }

    /// Drop asynchronous results past the configured retention
    pub fn evict_expired_results(&self) -> usize {
        self.engine.handles().evict_expired(Utc::now())
    }
}
