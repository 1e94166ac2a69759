//! Field and event names for structured logging
//!
//! Shared by the boundary macros, kernel `tracing` events and the test capture.

// Canonical field keys for structured logging
pub const FIELD_COMPONENT: &str = "component";
pub const FIELD_OP: &str = "op";
pub const FIELD_EVENT: &str = "event";
pub const FIELD_DURATION_MS: &str = "duration_ms";
pub const FIELD_REQUEST_ID: &str = "request_id";

// Entity and element identifiers
pub const FIELD_ENTITY_ID: &str = "entity_id";
pub const FIELD_ELEMENT_PATH: &str = "element_path";
pub const FIELD_OPERATION_PATH: &str = "operation_path";

// Invocation
pub const FIELD_EXECUTION_STATE: &str = "execution_state";
pub const FIELD_TIMEOUT_MS: &str = "timeout_ms";

// Collection sizes
pub const FIELD_PAGE_LEN: &str = "page_len";

// Error fields
pub const FIELD_ERR_KIND: &str = "err_kind";
pub const FIELD_ERR_CODE: &str = "err_code";

// Canonical event names
pub const EVENT_START: &str = "start";
pub const EVENT_END: &str = "end";
pub const EVENT_END_ERROR: &str = "end_error";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constants_accessibility() {
        assert!(!FIELD_COMPONENT.is_empty());
        assert!(!FIELD_OP.is_empty());
        assert!(!EVENT_START.is_empty());
        assert!(!EVENT_END.is_empty());
        assert!(!EVENT_END_ERROR.is_empty());
    }

    #[test]
    fn test_event_names_are_distinct() {
        assert_ne!(EVENT_START, EVENT_END);
        assert_ne!(EVENT_START, EVENT_END_ERROR);
        assert_ne!(EVENT_END, EVENT_END_ERROR);
    }
}
