use twinx_core::model::{DataTypeDefXsd, Operation, Submodel, SubmodelElement};
use twinx_engine::SubmodelServiceProvider;

/// String Property with a value
#[allow(dead_code)]
pub fn prop(id_short: &str, value: &str) -> SubmodelElement {
    SubmodelElement::property(id_short, DataTypeDefXsd::String, Some(value.to_string()))
}

/// Double Property with a value
#[allow(dead_code)]
pub fn double_prop(id_short: &str, value: &str) -> SubmodelElement {
    SubmodelElement::property(id_short, DataTypeDefXsd::Double, Some(value.to_string()))
}

/// Provider bound to an empty Submodel `S1`
#[allow(dead_code)]
pub fn empty_s1() -> SubmodelServiceProvider {
    SubmodelServiceProvider::from_submodel(Submodel::new("urn:sm:S1", "S1"))
        .expect("S1 should bind")
}

/// Operation `x: int → y: int`, wrapped as element `double`
#[allow(dead_code)]
pub fn doubling_element() -> SubmodelElement {
    SubmodelElement::operation(
        "double",
        Operation::new()
            .with_input(SubmodelElement::property("x", DataTypeDefXsd::Int, None))
            .with_output(SubmodelElement::property("y", DataTypeDefXsd::Int, None)),
    )
}
