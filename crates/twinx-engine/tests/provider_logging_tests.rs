#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::{doubling_element, empty_s1, prop};
use twinx_core::invocation::{
    handler_fn, CancellationToken, InvocationMode, InvocationRequest, OperationCall,
};
use twinx_core::logging_facility::test_capture::init_test_capture;
use twinx_core::logging_facility::Outcome;
use twinx_core::model::{DataTypeDefXsd, Submodel, SubmodelElement};
use twinx_engine::{SubmodelFilter, SubmodelRepositoryProvider, SubmodelServiceProvider};

#[test]
fn test_successful_call_logs_start_and_end() {
    let capture = init_test_capture();
    let provider = empty_s1();
    provider.create_element("", prop("logged", "1")).unwrap();

    capture.assert_event_exists("submodel_create_element", "start");
    capture.assert_event_exists("submodel_create_element", "end");
}

#[test]
fn test_failed_call_logs_error_kind_and_code() {
    let capture = init_test_capture();
    let provider = SubmodelServiceProvider::new();
    let _ = provider.retrieve_element_value("nowhere");

    let errors: Vec<_> = capture
        .events_for_op("submodel_retrieve_element_value")
        .into_iter()
        .filter(|e| e.event() == Some("end_error"))
        .collect();
    assert!(!errors.is_empty());
    assert_eq!(errors[0].err_code(), Some("ERR_CONTRACT_VIOLATION"));
}

#[test]
fn test_element_calls_name_submodel_and_path() {
    let capture = init_test_capture();
    let provider =
        SubmodelServiceProvider::from_submodel(Submodel::new("urn:sm:log-paths", "Paths")).unwrap();
    provider.create_element("", prop("speed", "3")).unwrap();
    let _ = provider.retrieve_element("missing");

    let events = capture.events_for_entity("urn:sm:log-paths");
    let create = events
        .iter()
        .find(|e| e.op() == Some("submodel_create_element"))
        .unwrap();
    assert_eq!(create.element_path(), Some(""));
    let failed = events
        .iter()
        .find(|e| e.op() == Some("submodel_retrieve_element") && e.event() == Some("end_error"))
        .unwrap();
    assert_eq!(failed.element_path(), Some("missing"));
    assert_eq!(
        capture.outcome("submodel_retrieve_element", "urn:sm:log-paths"),
        Some(Outcome::Failed("ERR_NOT_FOUND".to_string()))
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_invocation_logs_operation_path_timeout_and_state() {
    let capture = init_test_capture();
    let provider =
        SubmodelServiceProvider::from_submodel(Submodel::new("urn:sm:log-invoke", "Invoke")).unwrap();
    provider
        .create_element("", SubmodelElement::collection("ops", vec![doubling_element()]))
        .unwrap();
    provider
        .register_handler(
            "ops.double",
            handler_fn(|mut call: OperationCall, _cancel: CancellationToken| async move {
                call.set_output("y", "2".to_string());
                Ok(call)
            }),
        )
        .unwrap();

    let request = InvocationRequest::new()
        .with_input(SubmodelElement::property("x", DataTypeDefXsd::Int, Some("1".into())))
        .with_timeout_millis(1500);
    let response = provider
        .invoke_operation("ops.double", request, InvocationMode::Sync)
        .await
        .unwrap();

    let events = capture.events_for_op("submodel_invoke_operation");
    let start = events
        .iter()
        .find(|e| e.event() == Some("start") && e.entity_id() == Some("urn:sm:log-invoke"))
        .unwrap();
    assert_eq!(start.operation_path(), Some("ops.double"));
    assert_eq!(start.timeout_ms(), Some(1500));

    let end = events
        .iter()
        .find(|e| e.event() == Some("end") && e.request_id() == Some(response.request_id.as_str()))
        .unwrap();
    assert_eq!(end.execution_state(), Some("Completed"));
    assert_eq!(
        capture.outcome("submodel_invoke_operation", "urn:sm:log-invoke"),
        Some(Outcome::Ok)
    );
}

#[test]
fn test_repository_listing_records_page_len() {
    let capture = init_test_capture();
    let repo = SubmodelRepositoryProvider::new();
    repo.create(Submodel::new("urn:sm:log", "Logged")).unwrap();
    repo.create(Submodel::new("urn:sm:log-2", "Logged2")).unwrap();
    let page = repo
        .retrieve_submodels(Some(1), "", &SubmodelFilter::default())
        .unwrap();
    assert_eq!(page.items.len(), 1);

    assert_eq!(
        capture.outcome("submodel_repository_create", "urn:sm:log"),
        Some(Outcome::Ok)
    );
    capture.assert_event_exists("submodel_repository_list", "start");
    let ends: Vec<_> = capture
        .events_for_op("submodel_repository_list")
        .into_iter()
        .filter(|e| e.event() == Some("end"))
        .collect();
    assert!(ends.iter().any(|e| e.page_len() == Some(1)));
}
