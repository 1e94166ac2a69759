pub mod cancellation;
pub mod engine;
pub mod handle_store;
pub mod handler;
pub mod request;

pub use cancellation::CancellationToken;
pub use engine::{InvocationEngine, DEFAULT_TIMEOUT};
pub use handle_store::{HandleKey, HandleRecord, HandleRetention, HandleStore};
pub use handler::{handler_fn, HandlerFailure, HandlerRegistry, OperationCall, OperationHandler};
pub use request::{
    ExecutionState, InvocationMode, InvocationRequest, InvocationResponse, Message, MessageType,
    ValueOnlyInvocationRequest, ValueOnlyInvocationResponse,
};
