pub mod container;
pub mod element;
pub mod operation;
pub mod reference;
pub mod shell;
pub mod submodel;
pub mod value_type;

pub use container::ElementContainer;
pub use element::{Direction, ElementValue, EntityType, ModelType, StateOfEvent, SubmodelElement};
pub use operation::Operation;
pub use reference::{
    AdministrativeInformation, Key, KeyType, LangString, Qualifier, Reference, ReferenceType,
};
pub use shell::{AssetAdministrationShell, AssetInformation, AssetKind, PartialShell};
pub use submodel::{ModellingKind, PartialSubmodel, Submodel};
pub use value_type::DataTypeDefXsd;

/// An entity addressed by a globally unique identifier
pub trait Identifiable {
    fn id(&self) -> &str;
    fn id_short(&self) -> &str;
}
