use thiserror::Error;
use twinx_core_types::RequestId;

use crate::model::ModelType;

/// Result type alias using TwinError
pub type Result<T> = std::result::Result<T, TwinError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Every error surfaced by the kernel or the provider layer is classified into
/// one of these kinds. Each kind maps to a stable error code that transport
/// layers use to pick a status without inspecting messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExErrorKind {
    /// An id, path or invocation handle does not resolve
    NotFound,
    /// A create collided with an existing identifier or path
    Conflict,
    /// Malformed or missing input (bad path, argument mismatch, bad value)
    InvalidInput,
    /// An internal invariant was broken by an earlier setup step
    ContractViolation,
    /// An invocation handler did not finish within its budget
    Timeout,
    /// Recognised by the contract but not implemented for this combination
    Unsupported,

    // Integration
    Serialization,
    Io,

    // Internal
    Internal,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::NotFound => "ERR_NOT_FOUND",
            ExErrorKind::Conflict => "ERR_CONFLICT",
            ExErrorKind::InvalidInput => "ERR_INVALID_INPUT",
            ExErrorKind::ContractViolation => "ERR_CONTRACT_VIOLATION",
            ExErrorKind::Timeout => "ERR_TIMEOUT",
            ExErrorKind::Unsupported => "ERR_UNSUPPORTED",
            ExErrorKind::Serialization => "ERR_SERIALIZATION",
            ExErrorKind::Io => "ERR_IO",
            ExErrorKind::Internal => "ERR_INTERNAL",
        }
    }
}

/// Canonical structured error type
///
/// Carries the classification plus optional context (operation, entity id,
/// element path, request id) for the provider layer and its callers.
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    entity_id: Option<String>,
    path: Option<String>,
    request_id: Option<RequestId>,
    message: String,
    source: Option<Box<ExError>>,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            entity_id: None,
            path: None,
            request_id: None,
            message: String::new(),
            source: None,
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add entity ID context
    pub fn with_entity_id(mut self, id: impl Into<String>) -> Self {
        self.entity_id = Some(id.into());
        self
    }

    /// Add element path context
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Add request ID context
    pub fn with_request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = Some(request_id);
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Add source error
    pub fn with_source(mut self, source: ExError) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Get the error kind
    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    /// Get the operation context, if any
    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    /// Get the entity ID context, if any
    pub fn entity_id(&self) -> Option<&str> {
        self.entity_id.as_deref()
    }

    /// Get the element path context, if any
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// Get the request ID context, if any
    pub fn request_id(&self) -> Option<&RequestId> {
        self.request_id.as_ref()
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the source error, if any
    pub fn source_error(&self) -> Option<&ExError> {
        self.source.as_deref()
    }

    /// True when the kind is `NotFound`
    pub fn is_not_found(&self) -> bool {
        self.kind == ExErrorKind::NotFound
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(entity_id) = &self.entity_id {
            write!(f, " (entity_id: {})", entity_id)?;
        }
        if let Some(path) = &self.path {
            write!(f, " (path: {})", path)?;
        }
        if let Some(request_id) = &self.request_id {
            write!(f, " (request_id: {})", request_id)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

// ========== End Error Facility ==========

/// Error taxonomy for kernel operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TwinError {
    // ===== Element tree =====
    /// No element at the given path
    #[error("Element not found: {path}")]
    ElementNotFound { path: String },

    /// The path does not lead to something that can hold elements
    #[error("No element container at path: {path}")]
    ContainerNotFound { path: String },

    /// An element with the same idShort already exists under the parent
    #[error("Duplicate idShort '{id_short}' under '{parent_path}'")]
    DuplicateIdShort {
        parent_path: String,
        id_short: String,
    },

    /// The path string could not be parsed
    #[error("Invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    /// The idShort is empty or contains characters not allowed in a path
    #[error("Invalid idShort '{id_short}': {reason}")]
    InvalidIdShort { id_short: String, reason: String },

    /// An update tried to rename the element it replaces
    #[error("Update at '{path}' would change idShort to '{id_short}'")]
    IdentityChange { path: String, id_short: String },

    /// A value does not fit the target element
    #[error("Invalid value at '{path}': {reason}")]
    InvalidValue { path: String, reason: String },

    /// A lexical value could not be converted to the declared value type
    #[error("Cannot coerce value '{value}' of '{name}' to {value_type}")]
    CoercionFailed {
        name: String,
        value_type: String,
        value: String,
    },

    // ===== Invocation =====
    /// The element at the path is not an Operation
    #[error("Element at '{path}' is not an Operation")]
    NotAnOperation { path: String },

    /// An argument names no declared variable
    #[error("Operation '{operation_path}' declares no variable '{name}'")]
    UnknownArgument {
        operation_path: String,
        name: String,
    },

    /// An argument's model type differs from the declared variable
    #[error("Argument '{name}' is a {actual}, declared as {expected}")]
    ModelTypeMismatch {
        name: String,
        expected: ModelType,
        actual: ModelType,
    },

    /// Input arguments are absent while the operation declares inputs
    #[error("Operation '{operation_path}' requires {declared} input argument(s)")]
    MissingArguments {
        operation_path: String,
        declared: usize,
    },

    /// No handler has been bound for the operation
    #[error("No handler bound for operation '{operation_path}'")]
    HandlerNotBound { operation_path: String },

    /// No invocation handle for the key
    #[error("No invocation result for request '{request_id}' on '{operation_path}'")]
    HandleNotFound {
        operation_path: String,
        request_id: String,
    },

    /// A live handle already exists for the key
    #[error("Request '{request_id}' on '{operation_path}' is already registered")]
    DuplicateHandle {
        operation_path: String,
        request_id: String,
    },

    /// A terminal handle record was written again
    #[error("Invocation '{request_id}' on '{operation_path}' is already {state}")]
    HandleFrozen {
        operation_path: String,
        request_id: String,
        state: String,
    },

    // ===== Pagination =====
    /// The cursor is not a cursor this engine produced
    #[error("Invalid cursor: {reason}")]
    InvalidCursor { reason: String },

    // ===== Entities =====
    /// No entity with this identifier
    #[error("Entity not found: {entity_id}")]
    EntityNotFound { entity_id: String },

    /// An entity with this identifier already exists
    #[error("Entity already exists: {entity_id}")]
    EntityAlreadyExists { entity_id: String },

    /// The provider has no bound entity
    #[error("Inner entity is null in {provider}")]
    UnboundProvider { provider: String },

    /// A rejected entity field
    #[error("Invalid entity: {reason}")]
    InvalidEntity { reason: String },

    // ===== Generic =====
    /// Recognised feature path that is not implemented
    #[error("Unsupported: {feature}")]
    Unsupported { feature: String },

    /// JSON encoding/decoding failure
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// Generic internal error
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl TwinError {
    /// Classify this error into the canonical kind taxonomy
    pub fn kind(&self) -> ExErrorKind {
        match self {
            TwinError::ElementNotFound { .. }
            | TwinError::ContainerNotFound { .. }
            | TwinError::HandlerNotBound { .. }
            | TwinError::HandleNotFound { .. }
            | TwinError::EntityNotFound { .. } => ExErrorKind::NotFound,

            TwinError::DuplicateIdShort { .. }
            | TwinError::DuplicateHandle { .. }
            | TwinError::EntityAlreadyExists { .. } => ExErrorKind::Conflict,

            TwinError::InvalidPath { .. }
            | TwinError::InvalidIdShort { .. }
            | TwinError::IdentityChange { .. }
            | TwinError::InvalidValue { .. }
            | TwinError::CoercionFailed { .. }
            | TwinError::NotAnOperation { .. }
            | TwinError::UnknownArgument { .. }
            | TwinError::ModelTypeMismatch { .. }
            | TwinError::MissingArguments { .. }
            | TwinError::InvalidCursor { .. }
            | TwinError::InvalidEntity { .. } => ExErrorKind::InvalidInput,

            TwinError::HandleFrozen { .. } | TwinError::UnboundProvider { .. } => {
                ExErrorKind::ContractViolation
            }

            TwinError::Unsupported { .. } => ExErrorKind::Unsupported,
            TwinError::Serialization { .. } => ExErrorKind::Serialization,
            TwinError::Internal { .. } => ExErrorKind::Internal,
        }
    }
}

/// Conversion from TwinError to ExError
///
/// Keeps the kind classification and lifts path/entity/request context into
/// the structured fields.
impl From<TwinError> for ExError {
    fn from(err: TwinError) -> Self {
        let base = ExError::new(err.kind()).with_message(err.to_string());
        match err {
            TwinError::ElementNotFound { path }
            | TwinError::ContainerNotFound { path }
            | TwinError::InvalidPath { path, .. }
            | TwinError::IdentityChange { path, .. }
            | TwinError::InvalidValue { path, .. }
            | TwinError::NotAnOperation { path } => base.with_path(path),

            TwinError::DuplicateIdShort { parent_path, .. } => base.with_path(parent_path),

            TwinError::UnknownArgument { operation_path, .. }
            | TwinError::MissingArguments { operation_path, .. }
            | TwinError::HandlerNotBound { operation_path } => base.with_path(operation_path),

            TwinError::HandleNotFound {
                operation_path,
                request_id,
            }
            | TwinError::DuplicateHandle {
                operation_path,
                request_id,
            }
            | TwinError::HandleFrozen {
                operation_path,
                request_id,
                ..
            } => base
                .with_path(operation_path)
                .with_request_id(RequestId::from_string(request_id)),

            TwinError::EntityNotFound { entity_id }
            | TwinError::EntityAlreadyExists { entity_id } => base.with_entity_id(entity_id),

            TwinError::UnboundProvider { provider } => base.with_op(provider),

            TwinError::InvalidIdShort { .. }
            | TwinError::CoercionFailed { .. }
            | TwinError::ModelTypeMismatch { .. }
            | TwinError::InvalidCursor { .. }
            | TwinError::InvalidEntity { .. }
            | TwinError::Unsupported { .. }
            | TwinError::Serialization { .. }
            | TwinError::Internal { .. } => base,
        }
    }
}

impl From<serde_json::Error> for TwinError {
    fn from(err: serde_json::Error) -> Self {
        TwinError::Serialization {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_codes_are_stable() {
        assert_eq!(ExErrorKind::NotFound.code(), "ERR_NOT_FOUND");
        assert_eq!(ExErrorKind::Conflict.code(), "ERR_CONFLICT");
        assert_eq!(ExErrorKind::Unsupported.code(), "ERR_UNSUPPORTED");
    }

    #[test]
    fn test_unbound_provider_is_contract_violation() {
        let err = TwinError::UnboundProvider {
            provider: "SubmodelServiceProvider".to_string(),
        };
        assert_eq!(err.kind(), ExErrorKind::ContractViolation);
        assert!(err.to_string().contains("Inner entity is null"));
    }

    #[test]
    fn test_conversion_keeps_path_context() {
        let ex: ExError = TwinError::ElementNotFound {
            path: "a.b".to_string(),
        }
        .into();
        assert_eq!(ex.kind(), ExErrorKind::NotFound);
        assert_eq!(ex.path(), Some("a.b"));
        assert!(ex.is_not_found());
    }

    #[test]
    fn test_display_includes_code_and_message() {
        let ex = ExError::new(ExErrorKind::Timeout)
            .with_op("invoke")
            .with_message("took too long");
        let s = ex.to_string();
        assert!(s.starts_with("[ERR_TIMEOUT]"));
        assert!(s.contains("invoke"));
        assert!(s.contains("took too long"));
    }
}
