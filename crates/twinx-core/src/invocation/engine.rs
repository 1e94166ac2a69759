//! Operation invocation
//!
//! An invocation validates the caller's arguments against the Operation's
//! declared variables, shapes the output containers, then races the bound
//! handler against a timeout on a spawned task. Sync invocations return the
//! outcome; async invocations record a handle first and let the race finish in
//! the background.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{Map, Value};
use twinx_core_types::schema::{
    FIELD_EXECUTION_STATE, FIELD_OPERATION_PATH, FIELD_REQUEST_ID, FIELD_TIMEOUT_MS,
};
use twinx_core_types::RequestId;

use super::cancellation::CancellationToken;
use super::handle_store::{HandleKey, HandleRetention, HandleStore};
use super::handler::{HandlerRegistry, OperationCall, OperationHandler};
use super::request::{
    ExecutionState, InvocationMode, InvocationRequest, InvocationResponse, Message,
    ValueOnlyInvocationRequest, ValueOnlyInvocationResponse,
};
use crate::errors::{Result, TwinError};
use crate::model::{ElementContainer, ElementValue, Operation, SubmodelElement};
use crate::ops::value;

/// Handler budget when the request names none
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(60_000);

/// Runs Operation handlers and keeps asynchronous results
#[derive(Debug)]
pub struct InvocationEngine {
    handlers: HandlerRegistry,
    handles: Arc<HandleStore>,
    default_timeout: Duration,
}

impl Default for InvocationEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl InvocationEngine {
    pub fn new() -> Self {
        Self {
            handlers: HandlerRegistry::new(),
            handles: Arc::new(HandleStore::default()),
            default_timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    /// Replace the handle store with an empty one under `retention`
    pub fn with_retention(mut self, retention: HandleRetention) -> Self {
        self.handles = Arc::new(HandleStore::new(retention));
        self
    }

    pub fn handlers(&self) -> &HandlerRegistry {
        &self.handlers
    }

    pub fn handles(&self) -> &HandleStore {
        &self.handles
    }

    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    /// Bind the handler for the Operation at `operation_path`
    pub fn bind_handler(
        &self,
        operation_path: impl Into<String>,
        handler: Arc<dyn OperationHandler>,
    ) -> Option<Arc<dyn OperationHandler>> {
        self.handlers.bind(operation_path, handler)
    }

    /// Timeout applied to a request asking for `request_timeout` ms
    ///
    /// Absent or zero falls back to the engine default.
    pub fn timeout_for(&self, request_timeout: Option<u64>) -> Duration {
        match request_timeout {
            None | Some(0) => self.default_timeout,
            Some(ms) => Duration::from_millis(ms),
        }
    }

    /// Invoke `operation` (found at `operation_path`)
    ///
    /// Sync: waits for the handler or the timeout and returns the terminal
    /// response. Async: records an `Initiated` handle, starts the race in the
    /// background and returns the `Initiated` response straight away.
    ///
    /// Must be called inside a Tokio runtime.
    ///
    /// # Errors
    /// * `MissingArguments` / `UnknownArgument` / `ModelTypeMismatch` / `CoercionFailed` -
    ///   argument validation
    /// * `HandlerNotBound` - nothing bound at `operation_path`
    /// * `DuplicateHandle` - async request id already has a handle
    pub async fn invoke(
        &self,
        operation_path: &str,
        operation: &Operation,
        request: InvocationRequest,
        mode: InvocationMode,
    ) -> Result<InvocationResponse> {
        let request_id = RequestId::or_generate(request.request_id.clone());
        let call = prepare_call(operation_path, operation, &request, request_id.clone())?;
        let handler = self
            .handlers
            .get(operation_path)
            .ok_or_else(|| TwinError::HandlerNotBound {
                operation_path: operation_path.to_string(),
            })?;
        let timeout = self.timeout_for(request.timeout_millis);

        match mode {
            InvocationMode::Sync => Ok(race(handler, call, timeout).await),
            InvocationMode::Async => {
                let mut initiated = InvocationResponse::new(request_id.clone(), ExecutionState::Initiated);
                initiated.output_arguments = call.outputs.clone();
                initiated.inoutput_arguments = call.inoutputs.clone();

                let key = HandleKey::new(operation_path, request_id);
                self.handles.begin(key.clone(), initiated.clone())?;

                let handles = Arc::clone(&self.handles);
                tokio::spawn(async move {
                    if let Err(e) = handles.mark_running(&key) {
                        tracing::warn!(
                            { FIELD_OPERATION_PATH } = %key.operation_path,
                            { FIELD_REQUEST_ID } = %key.request_id,
                            error = %e,
                            "could not mark invocation running"
                        );
                    }
                    let outcome = race(handler, call, timeout).await;
                    let state = outcome.execution_state;
                    if let Err(e) = handles.complete(&key, outcome) {
                        tracing::warn!(
                            { FIELD_OPERATION_PATH } = %key.operation_path,
                            { FIELD_REQUEST_ID } = %key.request_id,
                            { FIELD_EXECUTION_STATE } = %state,
                            error = %e,
                            "could not record invocation outcome"
                        );
                    }
                });

                Ok(initiated)
            }
        }
    }

    /// Invoke with plain name → value arguments
    ///
    /// Values are applied onto copies of the declared variables, then the
    /// invocation runs synchronously.
    ///
    /// # Errors
    /// * `Unsupported` - async mode
    /// * the errors of [`invoke`](Self::invoke) and of value application
    pub async fn invoke_value_only(
        &self,
        operation_path: &str,
        operation: &Operation,
        request: ValueOnlyInvocationRequest,
        mode: InvocationMode,
    ) -> Result<ValueOnlyInvocationResponse> {
        if mode == InvocationMode::Async {
            return Err(TwinError::Unsupported {
                feature: "asynchronous value-only invocation".to_string(),
            });
        }

        let full = InvocationRequest {
            request_id: request.request_id,
            input_arguments: expand_values(
                operation_path,
                &operation.input_variables,
                request.input_arguments.as_ref(),
            )?,
            inoutput_arguments: expand_values(
                operation_path,
                &operation.inoutput_variables,
                request.inoutput_arguments.as_ref(),
            )?,
            timeout_millis: request.timeout_millis,
        };

        let response = self
            .invoke(operation_path, operation, full, InvocationMode::Sync)
            .await?;
        Ok(ValueOnlyInvocationResponse {
            output_arguments: container_values(&response.output_arguments)?,
            inoutput_arguments: container_values(&response.inoutput_arguments)?,
            request_id: response.request_id,
            execution_state: response.execution_state,
            messages: response.messages,
        })
    }

    /// Current result of an asynchronous invocation
    ///
    /// # Errors
    /// * `HandleNotFound` - no handle for this path and request id
    pub fn get_invocation_result(
        &self,
        operation_path: &str,
        request_id: &str,
    ) -> Result<InvocationResponse> {
        self.handles
            .get(&HandleKey::new(operation_path, RequestId::from(request_id)))
    }
}

/// Run the handler on its own task against a timer
async fn race(
    handler: Arc<dyn OperationHandler>,
    call: OperationCall,
    timeout: Duration,
) -> InvocationResponse {
    let request_id = call.request_id.clone();
    let operation_path = call.operation_path.clone();
    let mut shaped = InvocationResponse::new(request_id, ExecutionState::Running);
    shaped.output_arguments = call.outputs.clone();
    shaped.inoutput_arguments = call.inoutputs.clone();

    let cancel = CancellationToken::new();
    let handler_cancel = cancel.clone();
    let mut task = tokio::spawn(async move { handler.invoke(call, handler_cancel).await });

    tokio::select! {
        joined = &mut task => {
            cancel.cancel();
            match joined {
                Ok(Ok(done)) => InvocationResponse {
                    request_id: done.request_id,
                    execution_state: ExecutionState::Completed,
                    output_arguments: done.outputs,
                    inoutput_arguments: done.inoutputs,
                    messages: done.messages,
                },
                Ok(Err(failure)) => {
                    tracing::debug!(
                        { FIELD_OPERATION_PATH } = %operation_path,
                        error = %failure,
                        "operation handler failed"
                    );
                    let mut message = Message::error(failure.message);
                    message.code = failure.code;
                    shaped.execution_state = ExecutionState::Failed;
                    shaped.messages.push(message);
                    shaped
                }
                Err(join_error) => {
                    tracing::warn!(
                        { FIELD_OPERATION_PATH } = %operation_path,
                        error = %join_error,
                        "operation handler aborted"
                    );
                    shaped.execution_state = ExecutionState::Failed;
                    shaped
                        .messages
                        .push(Message::exception(format!("handler aborted: {}", join_error)));
                    shaped
                }
            }
        }
        _ = tokio::time::sleep(timeout) => {
            cancel.cancel();
            let timeout_ms = timeout.as_millis() as u64;
            tracing::warn!(
                { FIELD_OPERATION_PATH } = %operation_path,
                { FIELD_TIMEOUT_MS } = timeout_ms,
                "operation handler timed out"
            );
            shaped.execution_state = ExecutionState::Timeout;
            shaped.messages.push(
                Message::error(format!("operation did not finish within {} ms", timeout_ms))
                    .with_code("TIMEOUT"),
            );
            shaped
        }
    }
}

/// Validate arguments and build what the handler receives
fn prepare_call(
    operation_path: &str,
    operation: &Operation,
    request: &InvocationRequest,
    request_id: RequestId,
) -> Result<OperationCall> {
    if request.input_arguments.is_none() && !operation.input_variables.is_empty() {
        return Err(TwinError::MissingArguments {
            operation_path: operation_path.to_string(),
            declared: operation.input_variables.len(),
        });
    }

    Ok(OperationCall {
        operation_path: operation_path.to_string(),
        request_id,
        inputs: bind_arguments(
            operation_path,
            &operation.input_variables,
            request.input_arguments.as_ref(),
        )?,
        outputs: operation.output_variables.clone(),
        inoutputs: bind_arguments(
            operation_path,
            &operation.inoutput_variables,
            request.inoutput_arguments.as_ref(),
        )?,
        messages: Vec::new(),
    })
}

/// Match supplied arguments to declared variables, in declared order
///
/// Variables the caller leaves out are passed with their declared value.
fn bind_arguments(
    operation_path: &str,
    declared: &ElementContainer,
    supplied: Option<&ElementContainer>,
) -> Result<ElementContainer> {
    let supplied = match supplied {
        Some(supplied) => supplied,
        None => return Ok(declared.clone()),
    };

    if let Some(unknown) = supplied.iter().find(|arg| !declared.contains(&arg.id_short)) {
        return Err(TwinError::UnknownArgument {
            operation_path: operation_path.to_string(),
            name: unknown.id_short.clone(),
        });
    }

    let mut bound = ElementContainer::new();
    for variable in declared.iter() {
        let argument = match supplied.get(&variable.id_short) {
            Some(argument) => coerce_argument(variable, argument)?,
            None => variable.clone(),
        };
        bound.insert(argument);
    }
    Ok(bound)
}

/// Check the argument against its declaration and convert scalar values
fn coerce_argument(variable: &SubmodelElement, argument: &SubmodelElement) -> Result<SubmodelElement> {
    if variable.model_type() != argument.model_type() {
        return Err(TwinError::ModelTypeMismatch {
            name: variable.id_short.clone(),
            expected: variable.model_type(),
            actual: argument.model_type(),
        });
    }

    let mut coerced = argument.clone();
    match (&variable.value, &mut coerced.value) {
        (
            ElementValue::Property {
                value_type: declared,
                ..
            },
            ElementValue::Property { value_type, value },
        ) => {
            if let Some(raw) = value.as_deref() {
                *value = Some(declared.normalize(&variable.id_short, raw)?);
            }
            *value_type = *declared;
        }
        (
            ElementValue::Range {
                value_type: declared,
                ..
            },
            ElementValue::Range {
                value_type,
                min,
                max,
            },
        ) => {
            for bound in [min, max] {
                if let Some(raw) = bound.as_deref() {
                    *bound = Some(declared.normalize(&variable.id_short, raw)?);
                }
            }
            *value_type = *declared;
        }
        _ => {}
    }
    Ok(coerced)
}

fn expand_values(
    operation_path: &str,
    declared: &ElementContainer,
    values: Option<&Map<String, Value>>,
) -> Result<Option<ElementContainer>> {
    let values = match values {
        Some(values) => values,
        None => return Ok(None),
    };

    let mut arguments = ElementContainer::new();
    for (name, json) in values {
        let mut argument = declared
            .get(name)
            .cloned()
            .ok_or_else(|| TwinError::UnknownArgument {
                operation_path: operation_path.to_string(),
                name: name.clone(),
            })?;
        value::apply_value(&mut argument, json, name)?;
        arguments.insert(argument);
    }
    Ok(Some(arguments))
}

fn container_values(container: &ElementContainer) -> Result<Map<String, Value>> {
    container
        .iter()
        .map(|element| {
            value::element_value(element, &element.id_short).map(|v| (element.id_short.clone(), v))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DataTypeDefXsd, ModelType};

    fn int_var(id: &str) -> SubmodelElement {
        SubmodelElement::property(id, DataTypeDefXsd::Int, None)
    }

    fn op() -> Operation {
        Operation::new().with_input(int_var("x")).with_output(int_var("y"))
    }

    #[test]
    fn test_missing_inputs_rejected_when_declared() {
        let err = prepare_call("op", &op(), &InvocationRequest::new(), RequestId::new()).unwrap_err();
        assert!(matches!(err, TwinError::MissingArguments { declared: 1, .. }));
    }

    #[test]
    fn test_no_inputs_ok_when_none_declared() {
        let operation = Operation::new().with_output(int_var("y"));
        let call = prepare_call("op", &operation, &InvocationRequest::new(), RequestId::new()).unwrap();
        assert!(call.inputs.is_empty());
        assert!(call.outputs.contains("y"));
    }

    #[test]
    fn test_string_argument_coerced_to_declared_type() {
        let request = InvocationRequest::new().with_input(SubmodelElement::property(
            "x",
            DataTypeDefXsd::String,
            Some("42".into()),
        ));
        let call = prepare_call("op", &op(), &request, RequestId::new()).unwrap();
        let x = call.input("x").unwrap();
        assert_eq!(x.value_type(), Some(DataTypeDefXsd::Int));
        assert_eq!(x.as_i64(), Some(42));
    }

    #[test]
    fn test_uncoercible_argument_rejected() {
        let request = InvocationRequest::new().with_input(SubmodelElement::property(
            "x",
            DataTypeDefXsd::String,
            Some("forty-two".into()),
        ));
        let err = prepare_call("op", &op(), &request, RequestId::new()).unwrap_err();
        assert!(matches!(err, TwinError::CoercionFailed { .. }));
    }

    #[test]
    fn test_unknown_and_mismatched_arguments() {
        let unknown = InvocationRequest::new().with_input(int_var("z"));
        assert!(matches!(
            prepare_call("op", &op(), &unknown, RequestId::new()),
            Err(TwinError::UnknownArgument { .. })
        ));

        let mismatched = InvocationRequest::new()
            .with_input(SubmodelElement::collection("x", Vec::new()));
        match prepare_call("op", &op(), &mismatched, RequestId::new()) {
            Err(TwinError::ModelTypeMismatch { expected, actual, .. }) => {
                assert_eq!(expected, ModelType::Property);
                assert_eq!(actual, ModelType::SubmodelElementCollection);
            }
            other => panic!("expected mismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_omitted_inputs_use_declared_default() {
        let operation = Operation::new()
            .with_input(int_var("x"))
            .with_input(SubmodelElement::property("scale", DataTypeDefXsd::Int, Some("10".into())));
        let request = InvocationRequest::new().with_input(SubmodelElement::property(
            "x",
            DataTypeDefXsd::Int,
            Some("1".into()),
        ));
        let call = prepare_call("op", &operation, &request, RequestId::new()).unwrap();
        assert_eq!(call.input("scale").unwrap().as_i64(), Some(10));
        let order: Vec<_> = call.inputs.id_shorts().collect();
        assert_eq!(order, vec!["x", "scale"]);
    }

    #[test]
    fn test_timeout_zero_means_default() {
        let engine = InvocationEngine::new().with_default_timeout(Duration::from_millis(123));
        assert_eq!(engine.timeout_for(None), Duration::from_millis(123));
        assert_eq!(engine.timeout_for(Some(0)), Duration::from_millis(123));
        assert_eq!(engine.timeout_for(Some(5)), Duration::from_millis(5));
    }
}
