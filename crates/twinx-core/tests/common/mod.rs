use twinx_core::model::{DataTypeDefXsd, ElementContainer, ModelType, Operation, SubmodelElement};
use twinx_core::ops::IdShortPath;

/// Parse a path, panicking on malformed input
#[allow(dead_code)]
pub fn path(s: &str) -> IdShortPath {
    IdShortPath::parse(s).expect("test path should parse")
}

/// String Property with a value
#[allow(dead_code)]
pub fn prop(id_short: &str, value: &str) -> SubmodelElement {
    SubmodelElement::property(id_short, DataTypeDefXsd::String, Some(value.to_string()))
}

/// Property of the given type with a value
#[allow(dead_code)]
pub fn typed_prop(id_short: &str, value_type: DataTypeDefXsd, value: &str) -> SubmodelElement {
    SubmodelElement::property(id_short, value_type, Some(value.to_string()))
}

/// Declared int variable without a default
#[allow(dead_code)]
pub fn int_var(id_short: &str) -> SubmodelElement {
    SubmodelElement::property(id_short, DataTypeDefXsd::Int, None)
}

/// Tree used across tests:
///
/// ```text
/// name            Property
/// sensors         Collection { t1, t2 }
/// readings        List[Property] { r0, r1 }
/// machine         Entity { statements: { speed } }
/// ```
#[allow(dead_code)]
pub fn sample_tree() -> ElementContainer {
    let mut root = ElementContainer::new();
    root.insert(prop("name", "pump"));
    root.insert(SubmodelElement::collection(
        "sensors",
        vec![
            typed_prop("t1", DataTypeDefXsd::Double, "20.5"),
            typed_prop("t2", DataTypeDefXsd::Double, "21.0"),
        ],
    ));
    root.insert(SubmodelElement::list(
        "readings",
        ModelType::Property,
        vec![
            typed_prop("r0", DataTypeDefXsd::Int, "1"),
            typed_prop("r1", DataTypeDefXsd::Int, "2"),
        ],
    ));
    root.insert(SubmodelElement::new(
        "machine",
        twinx_core::model::ElementValue::Entity {
            entity_type: twinx_core::model::EntityType::SelfManagedEntity,
            global_asset_id: Some("urn:asset:pump-1".to_string()),
            statements: vec![typed_prop("speed", DataTypeDefXsd::Int, "1500")]
                .into_iter()
                .collect(),
        },
    ));
    root
}

/// Operation `x: int → y: int`
#[allow(dead_code)]
pub fn doubling_operation() -> Operation {
    Operation::new().with_input(int_var("x")).with_output(int_var("y"))
}
