use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use thiserror::Error;
use twinx_core_types::RequestId;

use super::cancellation::CancellationToken;
use super::request::Message;
use crate::model::{ElementContainer, SubmodelElement};

/// What a handler receives and hands back
///
/// `outputs` and `inoutputs` arrive pre-shaped from the declared variables, so
/// a handler only fills in values.
#[derive(Debug, Clone)]
pub struct OperationCall {
    pub operation_path: String,
    pub request_id: RequestId,
    pub inputs: ElementContainer,
    pub outputs: ElementContainer,
    pub inoutputs: ElementContainer,
    pub messages: Vec<Message>,
}

impl OperationCall {
    pub fn input(&self, id_short: &str) -> Option<&SubmodelElement> {
        self.inputs.get(id_short)
    }

    pub fn output(&self, id_short: &str) -> Option<&SubmodelElement> {
        self.outputs.get(id_short)
    }

    /// Set the lexical value of a declared output Property
    ///
    /// Returns `false` when no output with this idShort was declared.
    pub fn set_output(&mut self, id_short: &str, value: impl Into<String>) -> bool {
        match self.outputs.get_mut(id_short) {
            Some(output) => {
                output.set_property_value(Some(value.into()));
                true
            }
            None => false,
        }
    }

    /// Set the lexical value of a declared in-out Property
    pub fn set_inoutput(&mut self, id_short: &str, value: impl Into<String>) -> bool {
        match self.inoutputs.get_mut(id_short) {
            Some(variable) => {
                variable.set_property_value(Some(value.into()));
                true
            }
            None => false,
        }
    }

    pub fn push_message(&mut self, message: Message) {
        self.messages.push(message);
    }
}

/// A handler's own failure signal
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message}")]
pub struct HandlerFailure {
    pub code: Option<String>,
    pub message: String,
}

impl HandlerFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }
}

/// Function bound to an Operation element
///
/// Handlers run on a spawned task racing a timeout. They should watch `cancel`
/// and return early once it fires; the engine never aborts them.
#[async_trait]
pub trait OperationHandler: Send + Sync {
    async fn invoke(
        &self,
        call: OperationCall,
        cancel: CancellationToken,
    ) -> Result<OperationCall, HandlerFailure>;
}

struct FnHandler<F>(F);

#[async_trait]
impl<F, Fut> OperationHandler for FnHandler<F>
where
    F: Fn(OperationCall, CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<OperationCall, HandlerFailure>> + Send + 'static,
{
    async fn invoke(
        &self,
        call: OperationCall,
        cancel: CancellationToken,
    ) -> Result<OperationCall, HandlerFailure> {
        (self.0)(call, cancel).await
    }
}

/// Build a handler from an async closure
///
/// ```
/// use twinx_core::invocation::{handler_fn, OperationCall, CancellationToken};
///
/// let double = handler_fn(|mut call: OperationCall, _cancel: CancellationToken| async move {
///     let x = call.input("x").and_then(|e| e.as_i64()).unwrap_or(0);
///     call.set_output("y", (x * 2).to_string());
///     Ok(call)
/// });
/// # let _ = double;
/// ```
pub fn handler_fn<F, Fut>(f: F) -> Arc<dyn OperationHandler>
where
    F: Fn(OperationCall, CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<OperationCall, HandlerFailure>> + Send + 'static,
{
    Arc::new(FnHandler(f))
}

/// Handlers keyed by operation idShort path
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: RwLock<HashMap<String, Arc<dyn OperationHandler>>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a handler, returning the one it replaces
    pub fn bind(
        &self,
        operation_path: impl Into<String>,
        handler: Arc<dyn OperationHandler>,
    ) -> Option<Arc<dyn OperationHandler>> {
        self.handlers.write().insert(operation_path.into(), handler)
    }

    pub fn unbind(&self, operation_path: &str) -> Option<Arc<dyn OperationHandler>> {
        self.handlers.write().remove(operation_path)
    }

    /// Unbind the handler at `path` and every handler below it
    ///
    /// Returns how many handlers were removed.
    pub fn unbind_subtree(&self, path: &str) -> usize {
        let mut handlers = self.handlers.write();
        let before = handlers.len();
        handlers.retain(|key, _| !is_within(key, path));
        before - handlers.len()
    }

    /// Move handlers below `list[j]` to `list[j - 1]` for every `j > removed`
    ///
    /// Keeps handler keys aligned with list positions after an item is removed.
    pub fn shift_list_indices(&self, list_path: &str, removed: usize) {
        let mut handlers = self.handlers.write();
        let prefix = format!("{}[", list_path);
        let stale: Vec<(String, String)> = handlers
            .keys()
            .filter_map(|key| {
                let rest = key.strip_prefix(&prefix)?;
                let close = rest.find(']')?;
                let index = rest[..close].parse::<usize>().ok()?;
                (index > removed).then(|| {
                    let moved = format!("{}{}]{}", prefix, index - 1, &rest[close + 1..]);
                    (key.clone(), moved)
                })
            })
            .collect();

        let moved: Vec<(String, Arc<dyn OperationHandler>)> = stale
            .into_iter()
            .filter_map(|(old, new)| handlers.remove(&old).map(|h| (new, h)))
            .collect();
        handlers.extend(moved);
    }

    pub fn get(&self, operation_path: &str) -> Option<Arc<dyn OperationHandler>> {
        self.handlers.read().get(operation_path).cloned()
    }

    pub fn is_bound(&self, operation_path: &str) -> bool {
        self.handlers.read().contains_key(operation_path)
    }

    pub fn len(&self) -> usize {
        self.handlers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.read().is_empty()
    }
}

/// True when `key` is `path` itself or an element path below it
fn is_within(key: &str, path: &str) -> bool {
    key.strip_prefix(path)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('.') || rest.starts_with('['))
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut paths: Vec<String> = self.handlers.read().keys().cloned().collect();
        paths.sort();
        f.debug_struct("HandlerRegistry")
            .field("bound", &paths)
            .finish()
    }
}
