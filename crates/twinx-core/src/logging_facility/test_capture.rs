//! In-memory capture of boundary events for test assertions

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;
use tracing::field::{Field, Visit};
use tracing::{Level, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Layer;

use crate::schema;

/// One recorded event, fields rendered to strings
#[derive(Clone, Debug)]
pub struct CapturedEvent {
    pub level: Level,
    fields: HashMap<String, String>,
}

impl CapturedEvent {
    /// Raw field lookup by name
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    pub fn component(&self) -> Option<&str> {
        self.field(schema::FIELD_COMPONENT)
    }

    pub fn op(&self) -> Option<&str> {
        self.field(schema::FIELD_OP)
    }

    /// `start`, `end` or `end_error`
    pub fn event(&self) -> Option<&str> {
        self.field(schema::FIELD_EVENT)
    }

    pub fn entity_id(&self) -> Option<&str> {
        self.field(schema::FIELD_ENTITY_ID)
    }

    pub fn element_path(&self) -> Option<&str> {
        self.field(schema::FIELD_ELEMENT_PATH)
    }

    pub fn operation_path(&self) -> Option<&str> {
        self.field(schema::FIELD_OPERATION_PATH)
    }

    pub fn execution_state(&self) -> Option<&str> {
        self.field(schema::FIELD_EXECUTION_STATE)
    }

    pub fn request_id(&self) -> Option<&str> {
        self.field(schema::FIELD_REQUEST_ID)
    }

    pub fn err_code(&self) -> Option<&str> {
        self.field(schema::FIELD_ERR_CODE)
    }

    pub fn duration_ms(&self) -> Option<u64> {
        self.field(schema::FIELD_DURATION_MS)?.parse().ok()
    }

    pub fn timeout_ms(&self) -> Option<u64> {
        self.field(schema::FIELD_TIMEOUT_MS)?.parse().ok()
    }

    pub fn page_len(&self) -> Option<usize> {
        self.field(schema::FIELD_PAGE_LEN)?.parse().ok()
    }

    fn is_boundary(&self) -> bool {
        matches!(
            self.event(),
            Some(schema::EVENT_START | schema::EVENT_END | schema::EVENT_END_ERROR)
        )
    }
}

#[derive(Default)]
struct FieldVisitor {
    fields: HashMap<String, String>,
}

impl FieldVisitor {
    fn put(&mut self, field: &Field, value: String) {
        self.fields.insert(field.name().to_string(), value);
    }
}

impl Visit for FieldVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.put(field, format!("{:?}", value));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.put(field, value.to_string());
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.put(field, value.to_string());
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.put(field, value.to_string());
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.put(field, value.to_string());
    }
}

/// Layer that appends every event to a shared buffer
pub struct TestCaptureLayer {
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

impl TestCaptureLayer {
    pub fn new() -> (Self, TestCapture) {
        let events = Arc::new(Mutex::new(Vec::new()));
        let layer = Self {
            events: events.clone(),
        };
        (layer, TestCapture { events })
    }
}

impl<S> Layer<S> for TestCaptureLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);

        self.events.lock().push(CapturedEvent {
            level: *event.metadata().level(),
            fields: visitor.fields,
        });
    }
}

/// Outcome of one provider call as seen through its boundary events
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// `start` was seen without a closing event
    Pending,
    Ok,
    /// Closed by `end_error` with this error code
    Failed(String),
}

/// Handle for reading captured events
#[derive(Clone)]
pub struct TestCapture {
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

impl TestCapture {
    pub fn events(&self) -> Vec<CapturedEvent> {
        self.events.lock().clone()
    }

    /// Boundary events of one operation name, in emission order
    pub fn events_for_op(&self, op: &str) -> Vec<CapturedEvent> {
        self.filtered(|e| e.op() == Some(op))
    }

    /// Boundary events naming one Shell or Submodel id, in emission order
    pub fn events_for_entity(&self, entity_id: &str) -> Vec<CapturedEvent> {
        self.filtered(|e| e.is_boundary() && e.entity_id() == Some(entity_id))
    }

    /// Outcome of the latest `op` call on `entity_id`, `None` if never started
    pub fn outcome(&self, op: &str, entity_id: &str) -> Option<Outcome> {
        let events = self.events.lock();
        let start = events.iter().rposition(|e| {
            e.op() == Some(op)
                && e.event() == Some(schema::EVENT_START)
                && e.entity_id() == Some(entity_id)
        })?;

        // end events carry no scope; the next closing event of `op` is ours
        let closing = events[start + 1..].iter().find(|e| {
            e.op() == Some(op)
                && matches!(e.event(), Some(schema::EVENT_END | schema::EVENT_END_ERROR))
        });
        Some(match closing {
            None => Outcome::Pending,
            Some(e) if e.event() == Some(schema::EVENT_END) => Outcome::Ok,
            Some(e) => Outcome::Failed(e.err_code().unwrap_or_default().to_string()),
        })
    }

    /// # Panics
    ///
    /// Panics if no event of `op` has the given event name
    pub fn assert_event_exists(&self, op: &str, event: &str) {
        let events = self.events_for_op(op);
        assert!(
            events.iter().any(|e| e.event() == Some(event)),
            "no {}={} event for {}={} among {} captured",
            schema::FIELD_EVENT,
            event,
            schema::FIELD_OP,
            op,
            self.events.lock().len()
        );
    }

    fn filtered(&self, keep: impl Fn(&CapturedEvent) -> bool) -> Vec<CapturedEvent> {
        self.events.lock().iter().filter(|e| keep(e)).cloned().collect()
    }
}

static GLOBAL_CAPTURE: OnceLock<TestCapture> = OnceLock::new();

/// Install the capture layer once per process and hand out its handle
///
/// Tests share the buffer, so they should filter by a unique operation name
/// or entity id.
///
/// # Example
///
/// ```
/// use twinx_core::logging_facility::{init_test_capture, OpScope};
/// use twinx_core::log_op_start;
///
/// let capture = init_test_capture();
/// log_op_start!("doc_retrieve", scope = OpScope::entity("urn:sm:doc"));
/// capture.assert_event_exists("doc_retrieve", "start");
/// assert_eq!(capture.events_for_entity("urn:sm:doc").len(), 1);
/// ```
pub fn init_test_capture() -> TestCapture {
    GLOBAL_CAPTURE
        .get_or_init(|| {
            let (layer, capture) = TestCaptureLayer::new();
            // another subscriber may already be installed in this process
            let _ = tracing_subscriber::registry().with(layer).try_init();
            capture
        })
        .clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn captured(fields: &[(&str, &str)]) -> CapturedEvent {
        CapturedEvent {
            level: Level::INFO,
            fields: fields
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    #[test]
    fn test_accessors_read_schema_fields() {
        let event = captured(&[
            (schema::FIELD_OP, "submodel_retrieve_elements"),
            (schema::FIELD_EVENT, schema::EVENT_END),
            (schema::FIELD_PAGE_LEN, "100"),
            (schema::FIELD_DURATION_MS, "4"),
        ]);
        assert_eq!(event.op(), Some("submodel_retrieve_elements"));
        assert_eq!(event.page_len(), Some(100));
        assert_eq!(event.duration_ms(), Some(4));
        assert!(event.entity_id().is_none());
        assert!(event.is_boundary());
    }

    #[test]
    fn test_kernel_event_is_not_boundary() {
        let event = captured(&[(schema::FIELD_OPERATION_PATH, "ops.double")]);
        assert!(!event.is_boundary());
        assert_eq!(event.operation_path(), Some("ops.double"));
    }

    #[test]
    fn test_outcome_follows_latest_start() {
        let (_layer, capture) = TestCaptureLayer::new();
        capture.events.lock().extend([
            captured(&[
                (schema::FIELD_OP, "shell_update"),
                (schema::FIELD_EVENT, schema::EVENT_START),
                (schema::FIELD_ENTITY_ID, "urn:aas:1"),
            ]),
            captured(&[
                (schema::FIELD_OP, "shell_update"),
                (schema::FIELD_EVENT, schema::EVENT_END_ERROR),
                (schema::FIELD_ERR_CODE, "ERR_INVALID_ENTITY"),
            ]),
            captured(&[
                (schema::FIELD_OP, "shell_update"),
                (schema::FIELD_EVENT, schema::EVENT_START),
                (schema::FIELD_ENTITY_ID, "urn:aas:1"),
            ]),
        ]);
        assert_eq!(capture.outcome("shell_update", "urn:aas:1"), Some(Outcome::Pending));
        assert_eq!(capture.outcome("shell_update", "urn:aas:2"), None);

        capture.events.lock().push(captured(&[
            (schema::FIELD_OP, "shell_update"),
            (schema::FIELD_EVENT, schema::EVENT_END),
        ]));
        assert_eq!(capture.outcome("shell_update", "urn:aas:1"), Some(Outcome::Ok));
    }
}
