use serde::{Deserialize, Serialize};

use super::container::ElementContainer;
use super::element::SubmodelElement;
use super::reference::{AdministrativeInformation, LangString, Qualifier, Reference};
use super::Identifiable;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModellingKind {
    Template,
    Instance,
}

/// A Submodel: an identifiable root of one element tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submodel {
    /// Globally unique identifier
    pub id: String,
    pub id_short: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub description: Vec<LangString>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub administration: Option<AdministrativeInformation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<ModellingKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub semantic_id: Option<Reference>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub qualifiers: Vec<Qualifier>,
    #[serde(default)]
    pub submodel_elements: ElementContainer,
}

impl Submodel {
    pub fn new(id: impl Into<String>, id_short: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            id_short: id_short.into(),
            category: None,
            description: Vec::new(),
            administration: None,
            kind: None,
            semantic_id: None,
            qualifiers: Vec::new(),
            submodel_elements: ElementContainer::new(),
        }
    }

    pub fn with_semantic_id(mut self, semantic_id: Reference) -> Self {
        self.semantic_id = Some(semantic_id);
        self
    }

    pub fn with_element(mut self, element: SubmodelElement) -> Self {
        self.submodel_elements.insert(element);
        self
    }

    /// Copy with Blob payloads dropped from every element
    pub fn without_blob_values(&self) -> Self {
        let mut copy = self.clone();
        copy.submodel_elements = self
            .submodel_elements
            .iter()
            .map(SubmodelElement::without_blob_values)
            .collect();
        copy
    }
}

impl Identifiable for Submodel {
    fn id(&self) -> &str {
        &self.id
    }

    fn id_short(&self) -> &str {
        &self.id_short
    }
}

/// Caller-supplied Submodel fields for a merge update
///
/// Every field is optional; absent fields keep the stored value. Elements are
/// upserted into the stored tree, not substituted for it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PartialSubmodel {
    pub id_short: Option<String>,
    pub category: Option<String>,
    pub description: Option<Vec<LangString>>,
    pub administration: Option<AdministrativeInformation>,
    pub kind: Option<ModellingKind>,
    pub semantic_id: Option<Reference>,
    pub qualifiers: Option<Vec<Qualifier>>,
    pub submodel_elements: Option<Vec<SubmodelElement>>,
}
