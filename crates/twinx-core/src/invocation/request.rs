use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use twinx_core_types::RequestId;

use crate::model::{ElementContainer, SubmodelElement};

/// Lifecycle state of one invocation
///
/// `Initiated → Running → {Completed | Failed | Timeout}`; terminal states are final.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExecutionState {
    Initiated,
    Running,
    Completed,
    Failed,
    Timeout,
}

impl ExecutionState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ExecutionState::Completed | ExecutionState::Failed | ExecutionState::Timeout
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionState::Initiated => "Initiated",
            ExecutionState::Running => "Running",
            ExecutionState::Completed => "Completed",
            ExecutionState::Failed => "Failed",
            ExecutionState::Timeout => "Timeout",
        }
    }
}

impl std::fmt::Display for ExecutionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether `invoke` waits for the handler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum InvocationMode {
    #[default]
    Sync,
    Async,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageType {
    Info,
    Warning,
    Error,
    Exception,
}

/// A diagnostic attached to an invocation response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub message_type: MessageType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn new(message_type: MessageType, text: impl Into<String>) -> Self {
        Self {
            message_type,
            code: None,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self::new(MessageType::Info, text)
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::new(MessageType::Error, text)
    }

    pub fn exception(text: impl Into<String>) -> Self {
        Self::new(MessageType::Exception, text)
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }
}

/// Arguments and options for one invocation
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InvocationRequest {
    /// Caller-chosen id; a UUIDv7 is generated when absent or blank
    pub request_id: Option<String>,
    pub input_arguments: Option<ElementContainer>,
    pub inoutput_arguments: Option<ElementContainer>,
    /// Handler budget; absent or zero means the engine default
    pub timeout_millis: Option<u64>,
}

impl InvocationRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    pub fn with_input(mut self, argument: SubmodelElement) -> Self {
        self.input_arguments
            .get_or_insert_with(ElementContainer::new)
            .insert(argument);
        self
    }

    pub fn with_inoutput(mut self, argument: SubmodelElement) -> Self {
        self.inoutput_arguments
            .get_or_insert_with(ElementContainer::new)
            .insert(argument);
        self
    }

    pub fn with_timeout_millis(mut self, millis: u64) -> Self {
        self.timeout_millis = Some(millis);
        self
    }
}

/// Invocation request carrying plain name → value maps instead of elements
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ValueOnlyInvocationRequest {
    pub request_id: Option<String>,
    pub input_arguments: Option<Map<String, Value>>,
    pub inoutput_arguments: Option<Map<String, Value>>,
    pub timeout_millis: Option<u64>,
}

impl ValueOnlyInvocationRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    pub fn with_input(mut self, name: impl Into<String>, value: Value) -> Self {
        self.input_arguments
            .get_or_insert_with(Map::new)
            .insert(name.into(), value);
        self
    }

    pub fn with_inoutput(mut self, name: impl Into<String>, value: Value) -> Self {
        self.inoutput_arguments
            .get_or_insert_with(Map::new)
            .insert(name.into(), value);
        self
    }

    pub fn with_timeout_millis(mut self, millis: u64) -> Self {
        self.timeout_millis = Some(millis);
        self
    }
}

/// Result of an invocation, also the record kept for async handles
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvocationResponse {
    pub request_id: RequestId,
    pub execution_state: ExecutionState,
    #[serde(default)]
    pub output_arguments: ElementContainer,
    #[serde(default)]
    pub inoutput_arguments: ElementContainer,
    #[serde(default)]
    pub messages: Vec<Message>,
}

impl InvocationResponse {
    pub fn new(request_id: RequestId, execution_state: ExecutionState) -> Self {
        Self {
            request_id,
            execution_state,
            output_arguments: ElementContainer::new(),
            inoutput_arguments: ElementContainer::new(),
            messages: Vec::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.execution_state == ExecutionState::Completed
    }

    pub fn output(&self, id_short: &str) -> Option<&SubmodelElement> {
        self.output_arguments.get(id_short)
    }
}

/// Value-only view of an [`InvocationResponse`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueOnlyInvocationResponse {
    pub request_id: RequestId,
    pub execution_state: ExecutionState,
    #[serde(default)]
    pub output_arguments: Map<String, Value>,
    #[serde(default)]
    pub inoutput_arguments: Map<String, Value>,
    #[serde(default)]
    pub messages: Vec<Message>,
}
