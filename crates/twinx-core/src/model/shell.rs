use serde::{Deserialize, Serialize};

use super::reference::{AdministrativeInformation, LangString, Reference};
use super::submodel::Submodel;
use super::Identifiable;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AssetKind {
    Type,
    #[default]
    Instance,
    NotApplicable,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetInformation {
    pub asset_kind: AssetKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global_asset_id: Option<String>,
}

/// An Asset Administration Shell and the Submodels it carries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetAdministrationShell {
    pub id: String,
    pub id_short: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub description: Vec<LangString>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub administration: Option<AdministrativeInformation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub derived_from: Option<Reference>,
    #[serde(default)]
    pub asset_information: AssetInformation,
    #[serde(default)]
    pub submodels: Vec<Submodel>,
}

impl AssetAdministrationShell {
    pub fn new(id: impl Into<String>, id_short: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            id_short: id_short.into(),
            description: Vec::new(),
            administration: None,
            derived_from: None,
            asset_information: AssetInformation::default(),
            submodels: Vec::new(),
        }
    }

    pub fn with_global_asset_id(mut self, asset_id: impl Into<String>) -> Self {
        self.asset_information.global_asset_id = Some(asset_id.into());
        self
    }

    pub fn with_submodel(mut self, submodel: Submodel) -> Self {
        self.submodels.push(submodel);
        self
    }

    /// References to the carried Submodels, in carried order
    pub fn submodel_references(&self) -> Vec<Reference> {
        self.submodels
            .iter()
            .map(|sm| Reference::to_submodel(sm.id.clone()))
            .collect()
    }
}

impl Identifiable for AssetAdministrationShell {
    fn id(&self) -> &str {
        &self.id
    }

    fn id_short(&self) -> &str {
        &self.id_short
    }
}

/// Caller-supplied Shell fields for a merge update
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PartialShell {
    pub id_short: Option<String>,
    pub description: Option<Vec<LangString>>,
    pub administration: Option<AdministrativeInformation>,
    pub derived_from: Option<Reference>,
    pub asset_information: Option<AssetInformation>,
    pub submodels: Option<Vec<Submodel>>,
}
