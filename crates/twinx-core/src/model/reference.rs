use serde::{Deserialize, Serialize};

use super::value_type::DataTypeDefXsd;

/// Whether a reference points outside the model or at a model element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReferenceType {
    ExternalReference,
    ModelReference,
}

/// Kind of the entity a reference key addresses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyType {
    GlobalReference,
    FragmentReference,
    AssetAdministrationShell,
    Submodel,
    ConceptDescription,
    SubmodelElement,
    SubmodelElementCollection,
    SubmodelElementList,
    Property,
    Operation,
    File,
    Blob,
    Entity,
}

/// One step of a reference
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Key {
    #[serde(rename = "type")]
    pub key_type: KeyType,
    pub value: String,
}

/// A reference to an external concept or a model element
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Reference {
    #[serde(rename = "type")]
    pub reference_type: ReferenceType,
    pub keys: Vec<Key>,
}

impl Reference {
    /// External reference with a single `GlobalReference` key (typical semanticId)
    pub fn global(value: impl Into<String>) -> Self {
        Self {
            reference_type: ReferenceType::ExternalReference,
            keys: vec![Key {
                key_type: KeyType::GlobalReference,
                value: value.into(),
            }],
        }
    }

    /// Model reference to a Submodel by id
    pub fn to_submodel(id: impl Into<String>) -> Self {
        Self {
            reference_type: ReferenceType::ModelReference,
            keys: vec![Key {
                key_type: KeyType::Submodel,
                value: id.into(),
            }],
        }
    }

    /// Value of the first key, used for matching semantic ids
    pub fn first_value(&self) -> Option<&str> {
        self.keys.first().map(|k| k.value.as_str())
    }
}

/// A qualifier attached to an element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Qualifier {
    #[serde(rename = "type")]
    pub qualifier_type: String,
    pub value_type: DataTypeDefXsd,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

/// A language-tagged text
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LangString {
    pub language: String,
    pub text: String,
}

impl LangString {
    pub fn new(language: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            text: text.into(),
        }
    }
}

/// Version/revision information of an identifiable
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AdministrativeInformation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision: Option<String>,
}
