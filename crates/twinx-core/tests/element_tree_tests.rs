#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::{path, prop, sample_tree, typed_prop};
use proptest::prelude::*;
use serde_json::json;
use twinx_core::errors::{ExError, ExErrorKind, TwinError};
use twinx_core::model::{DataTypeDefXsd, ElementContainer, ModelType, SubmodelElement};
use twinx_core::ops::{
    create_element, create_or_update_element, delete_element, element_value, parent_model_type,
    path_notation, resolve, resolve_container, resolve_element, update_element,
    update_element_value, IdShortPath, Node,
};

#[test]
fn test_temperature_scenario() {
    let mut root = ElementContainer::new();
    create_element(
        &mut root,
        &IdShortPath::root(),
        typed_prop("temperature", DataTypeDefXsd::Double, "21.5"),
    )
    .unwrap();

    let temperature = resolve_element(&root, &path("temperature")).unwrap();
    assert_eq!(temperature.as_f64(), Some(21.5));
    assert_eq!(element_value(&root, &path("temperature")).unwrap(), json!(21.5));
}

#[test]
fn test_empty_path_resolves_to_root_container() {
    let root = sample_tree();
    match resolve(&root, &IdShortPath::root()).unwrap() {
        Node::Root(container) => assert_eq!(container.len(), 4),
        Node::Element(_) => panic!("empty path must address the root"),
    }
    assert_eq!(resolve_container(&root, &IdShortPath::root()).unwrap().len(), 4);
}

#[test]
fn test_entity_statements_are_descended() {
    let root = sample_tree();
    let speed = resolve_element(&root, &path("machine.speed")).unwrap();
    assert_eq!(speed.as_i64(), Some(1500));
    assert_eq!(
        parent_model_type(&root, &path("machine.speed")).unwrap(),
        Some(ModelType::Entity)
    );
}

#[test]
fn test_create_under_missing_parent_is_not_found() {
    let mut root = sample_tree();
    let err = create_element(&mut root, &path("nowhere"), prop("x", "1")).unwrap_err();
    let ex: ExError = err.into();
    assert_eq!(ex.kind(), ExErrorKind::NotFound);
}

#[test]
fn test_create_conflict_maps_to_conflict_kind() {
    let mut root = sample_tree();
    let err = create_element(&mut root, &IdShortPath::root(), prop("name", "again")).unwrap_err();
    let ex: ExError = err.into();
    assert_eq!(ex.kind(), ExErrorKind::Conflict);
}

#[test]
fn test_create_rejects_unaddressable_id_short() {
    let mut root = ElementContainer::new();
    let err = create_element(&mut root, &IdShortPath::root(), prop("has.dot", "x")).unwrap_err();
    assert!(matches!(err, TwinError::InvalidIdShort { .. }));
}

#[test]
fn test_update_replaces_value_and_metadata() {
    let mut root = sample_tree();
    let replacement = typed_prop("t1", DataTypeDefXsd::Double, "99.0").with_category("VARIABLE");
    update_element(&mut root, &path("sensors.t1"), replacement).unwrap();

    let t1 = resolve_element(&root, &path("sensors.t1")).unwrap();
    assert_eq!(t1.as_f64(), Some(99.0));
    assert_eq!(t1.category.as_deref(), Some("VARIABLE"));
    let order: Vec<_> = resolve_container(&root, &path("sensors"))
        .unwrap()
        .id_shorts()
        .collect();
    assert_eq!(order, vec!["t1", "t2"]);
}

#[test]
fn test_update_missing_is_not_found() {
    let mut root = sample_tree();
    let err = update_element(&mut root, &path("sensors.t9"), prop("t9", "x")).unwrap_err();
    assert!(matches!(err, TwinError::ElementNotFound { .. }));
}

#[test]
fn test_value_only_update_of_nested_collection() {
    let mut root = sample_tree();
    update_element_value(&mut root, &path("sensors"), &json!({"t2": 22.25})).unwrap();
    assert_eq!(
        element_value(&root, &path("sensors")).unwrap(),
        json!({"t1": 20.5, "t2": 22.25})
    );
}

#[test]
fn test_value_only_update_rejects_bad_scalar() {
    let mut root = sample_tree();
    let err = update_element_value(&mut root, &path("readings[0]"), &json!("one")).unwrap_err();
    assert_eq!(ExError::from(err).kind(), ExErrorKind::InvalidInput);
    assert_eq!(
        resolve_element(&root, &path("readings[0]")).unwrap().as_i64(),
        Some(1)
    );
}

#[test]
fn test_path_notation_lists_every_element() {
    let root = sample_tree();
    let paths = path_notation(&root);
    assert_eq!(
        paths,
        vec![
            "name", "sensors", "", "", "readings", "readings[0]", "readings[1]", "machine",
            "machine.speed",
        ]
    );
}

#[test]
fn test_create_or_update_is_idempotent_on_sample() {
    let element = SubmodelElement::collection("extra", vec![prop("a", "1")]);
    let mut once = sample_tree();
    create_or_update_element(&mut once, &IdShortPath::root(), element.clone()).unwrap();
    let mut twice = once.clone();
    create_or_update_element(&mut twice, &IdShortPath::root(), element).unwrap();
    assert_eq!(once, twice);
}

fn id_short_strategy() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,6}"
}

proptest! {
    #[test]
    fn prop_created_element_resolves_then_deletes(
        chain in prop::collection::vec(id_short_strategy(), 0..4),
        leaf in id_short_strategy(),
        value in "[ -~]{0,12}",
    ) {
        let mut root = ElementContainer::new();
        let mut parent = IdShortPath::root();
        for id in &chain {
            create_or_update_element(&mut root, &parent, SubmodelElement::collection(id.clone(), Vec::new()))
                .unwrap();
            parent = parent.child(id.clone());
        }

        create_element(&mut root, &parent, prop(&leaf, &value)).unwrap();
        let leaf_path = parent.child(leaf.clone());

        let reparsed = IdShortPath::parse(&leaf_path.to_string()).unwrap();
        let found = resolve_element(&root, &reparsed).unwrap();
        prop_assert_eq!(&found.id_short, &leaf);
        prop_assert_eq!(found.as_str(), Some(value.as_str()));

        delete_element(&mut root, &reparsed).unwrap();
        prop_assert!(
            matches!(resolve(&root, &reparsed), Err(TwinError::ElementNotFound { .. })),
            "deleted element still resolves"
        );
    }

    #[test]
    fn prop_create_or_update_idempotent(
        id in prop::sample::select(vec!["name", "sensors", "fresh", "other"]),
        value in "[a-z0-9]{0,8}",
    ) {
        let element = prop(id, &value);
        let mut once = sample_tree();
        create_or_update_element(&mut once, &IdShortPath::root(), element.clone()).unwrap();
        let mut twice = once.clone();
        create_or_update_element(&mut twice, &IdShortPath::root(), element).unwrap();
        prop_assert_eq!(once, twice);
    }
}
