//! Boundary event macros
//!
//! A provider call emits one `start` event, then one `end` or `end_error`.
//! Field names come from [`crate::schema`]. Start and error events carry the
//! call's [`OpScope`](crate::logging_facility::OpScope); end events carry what
//! the call produced (page size, execution state).

/// Log the start of a provider call
///
/// # Example
///
/// ```
/// # use twinx_core::log_op_start;
/// use twinx_core::logging_facility::OpScope;
///
/// log_op_start!("submodel_retrieve");
/// log_op_start!("submodel_create_element", scope = OpScope::entity("urn:sm:1").element("a.b"));
/// log_op_start!(
///     "submodel_invoke_operation",
///     scope = OpScope::entity("urn:sm:1").operation("ops.double"),
///     timeout_ms = 500
/// );
/// ```
#[macro_export]
macro_rules! log_op_start {
    ($op:expr) => {
        $crate::log_op_start!($op, scope = $crate::logging_facility::OpScope::default())
    };
    ($op:expr, scope = $scope:expr) => {{
        let scope: $crate::logging_facility::OpScope<'_> = $scope;
        tracing::info!(
            { $crate::schema::FIELD_COMPONENT } = module_path!(),
            { $crate::schema::FIELD_OP } = $op,
            { $crate::schema::FIELD_EVENT } = $crate::schema::EVENT_START,
            { $crate::schema::FIELD_ENTITY_ID } = scope.entity_id,
            { $crate::schema::FIELD_ELEMENT_PATH } = scope.element_path,
            { $crate::schema::FIELD_OPERATION_PATH } = scope.operation_path,
        );
    }};
    ($op:expr, scope = $scope:expr, timeout_ms = $timeout:expr) => {{
        let scope: $crate::logging_facility::OpScope<'_> = $scope;
        tracing::info!(
            { $crate::schema::FIELD_COMPONENT } = module_path!(),
            { $crate::schema::FIELD_OP } = $op,
            { $crate::schema::FIELD_EVENT } = $crate::schema::EVENT_START,
            { $crate::schema::FIELD_ENTITY_ID } = scope.entity_id,
            { $crate::schema::FIELD_OPERATION_PATH } = scope.operation_path,
            { $crate::schema::FIELD_TIMEOUT_MS } = $timeout,
        );
    }};
}

/// Log the successful end of a provider call
///
/// # Example
///
/// ```
/// # use twinx_core::log_op_end;
/// log_op_end!("submodel_update", duration_ms = 3);
/// log_op_end!("submodel_retrieve_elements", duration_ms = 3, page_len = 100);
/// log_op_end!(
///     "submodel_invoke_operation",
///     duration_ms = 12,
///     execution_state = "Completed",
///     request_id = "req-1"
/// );
/// ```
#[macro_export]
macro_rules! log_op_end {
    ($op:expr, duration_ms = $duration:expr) => {
        tracing::info!(
            { $crate::schema::FIELD_COMPONENT } = module_path!(),
            { $crate::schema::FIELD_OP } = $op,
            { $crate::schema::FIELD_EVENT } = $crate::schema::EVENT_END,
            { $crate::schema::FIELD_DURATION_MS } = $duration,
        )
    };
    ($op:expr, duration_ms = $duration:expr, page_len = $len:expr) => {
        tracing::info!(
            { $crate::schema::FIELD_COMPONENT } = module_path!(),
            { $crate::schema::FIELD_OP } = $op,
            { $crate::schema::FIELD_EVENT } = $crate::schema::EVENT_END,
            { $crate::schema::FIELD_DURATION_MS } = $duration,
            { $crate::schema::FIELD_PAGE_LEN } = $len,
        )
    };
    ($op:expr, duration_ms = $duration:expr, execution_state = $state:expr, request_id = $request_id:expr) => {
        tracing::info!(
            { $crate::schema::FIELD_COMPONENT } = module_path!(),
            { $crate::schema::FIELD_OP } = $op,
            { $crate::schema::FIELD_EVENT } = $crate::schema::EVENT_END,
            { $crate::schema::FIELD_DURATION_MS } = $duration,
            { $crate::schema::FIELD_EXECUTION_STATE } = $state,
            { $crate::schema::FIELD_REQUEST_ID } = $request_id,
        )
    };
}

/// Log a failed provider call
///
/// The error is classified through [`ExError`](crate::errors::ExError). An
/// entity id carried by the error fills in for a scope that names none.
///
/// # Example
///
/// ```
/// # use twinx_core::{log_op_error, errors::TwinError};
/// use twinx_core::logging_facility::OpScope;
///
/// let err = TwinError::ElementNotFound { path: "a.b".to_string() };
/// log_op_error!(
///     "submodel_retrieve_element",
///     err,
///     duration_ms = 1,
///     scope = OpScope::entity("urn:sm:1").element("a.b")
/// );
/// ```
#[macro_export]
macro_rules! log_op_error {
    ($op:expr, $err:expr, duration_ms = $duration:expr) => {
        $crate::log_op_error!(
            $op,
            $err,
            duration_ms = $duration,
            scope = $crate::logging_facility::OpScope::default()
        )
    };
    ($op:expr, $err:expr, duration_ms = $duration:expr, scope = $scope:expr) => {{
        let ex_err: $crate::errors::ExError = $err.into();
        let scope: $crate::logging_facility::OpScope<'_> = $scope;
        tracing::error!(
            { $crate::schema::FIELD_COMPONENT } = module_path!(),
            { $crate::schema::FIELD_OP } = $op,
            { $crate::schema::FIELD_EVENT } = $crate::schema::EVENT_END_ERROR,
            { $crate::schema::FIELD_DURATION_MS } = $duration,
            { $crate::schema::FIELD_ERR_KIND } = ?ex_err.kind(),
            { $crate::schema::FIELD_ERR_CODE } = ex_err.code(),
            { $crate::schema::FIELD_ENTITY_ID } = scope.entity_id.or(ex_err.entity_id()),
            { $crate::schema::FIELD_ELEMENT_PATH } = scope.element_path,
            { $crate::schema::FIELD_OPERATION_PATH } = scope.operation_path,
        );
    }};
}
