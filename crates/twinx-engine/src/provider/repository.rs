//! Repository providers: many Shells or Submodels keyed by id
//!
//! By-id calls are routed to the child service provider; the repository only
//! owns the id → provider map.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use twinx_core::model::{AssetAdministrationShell, PartialShell, PartialSubmodel, Submodel};
use twinx_core::logging_facility::OpScope;
use twinx_core::ops::{self, Page};

use super::{observed, observed_page};
use super::registry::ProviderRegistry;
use super::shell_provider::{validate_shell, ShellServiceProvider};
use super::submodel_provider::{validate_submodel, SubmodelServiceProvider};
use crate::config::EngineConfig;
use crate::Result;

/// Listing filter for Submodels; unset fields match everything
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SubmodelFilter {
    pub id_short: Option<String>,
    /// Compared with the first key value of the semantic id
    pub semantic_id: Option<String>,
}

impl SubmodelFilter {
    pub fn matches(&self, submodel: &Submodel) -> bool {
        let id_short_ok = self
            .id_short
            .as_deref()
            .map_or(true, |wanted| submodel.id_short == wanted);
        let semantic_ok = self.semantic_id.as_deref().map_or(true, |wanted| {
            submodel
                .semantic_id
                .as_ref()
                .and_then(|r| r.first_value())
                == Some(wanted)
        });
        id_short_ok && semantic_ok
    }
}

/// Listing filter for Shells; unset fields match everything
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ShellFilter {
    pub id_short: Option<String>,
    pub global_asset_id: Option<String>,
}

impl ShellFilter {
    pub fn matches(&self, shell: &AssetAdministrationShell) -> bool {
        let id_short_ok = self
            .id_short
            .as_deref()
            .map_or(true, |wanted| shell.id_short == wanted);
        let asset_ok = self.global_asset_id.as_deref().map_or(true, |wanted| {
            shell.asset_information.global_asset_id.as_deref() == Some(wanted)
        });
        id_short_ok && asset_ok
    }
}

#[derive(Debug, Default)]
pub struct SubmodelRepositoryProvider {
    submodels: ProviderRegistry<SubmodelServiceProvider>,
    config: EngineConfig,
}

impl SubmodelRepositoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            submodels: ProviderRegistry::new(),
            config,
        }
    }

    /// Add a Submodel under its id
    ///
    /// # Errors
    /// * `InvalidInput` - empty id or unaddressable idShort
    /// * `Conflict` - the id is taken
    pub fn create(&self, submodel: Submodel) -> Result<Arc<SubmodelServiceProvider>> {
        let id = submodel.id.clone();
        observed("submodel_repository_create", OpScope::entity(id.as_str()), || {
            validate_submodel(&submodel)?;
            if self.submodels.contains(&id) {
                return Err(twinx_core::TwinError::EntityAlreadyExists {
                    entity_id: id.clone(),
                }
                .into());
            }
            let provider = SubmodelServiceProvider::with_config(&self.config);
            provider.bind(submodel)?;
            self.submodels.register(id.clone(), Arc::new(provider))
        })
    }

    /// # Errors
    /// * `NotFound` - no Submodel with this id
    pub fn retrieve(&self, id: &str) -> Result<Submodel> {
        observed("submodel_repository_retrieve", OpScope::entity(id), || {
            self.submodels.get(id)?.retrieve()
        })
    }

    /// Merge `partial` into the Submodel with this id
    pub fn update(&self, id: &str, partial: PartialSubmodel) -> Result<()> {
        observed("submodel_repository_update", OpScope::entity(id), || {
            self.submodels.get(id)?.update(partial)
        })
    }

    pub fn delete(&self, id: &str) -> Result<()> {
        observed("submodel_repository_delete", OpScope::entity(id), || {
            self.submodels.unregister(id).map(|_| ())
        })
    }

    /// One page of the Submodels passing `filter`, keyed by id
    pub fn retrieve_submodels(
        &self,
        limit: Option<usize>,
        cursor: &str,
        filter: &SubmodelFilter,
    ) -> Result<Page<Submodel>> {
        observed_page("submodel_repository_list", OpScope::default(), || {
            let mut items = Vec::new();
            for provider in self.submodels.providers() {
                let submodel = provider.retrieve()?;
                if filter.matches(&submodel) {
                    items.push(submodel);
                }
            }
            let limit = self.config.page_limit(limit);
            Ok(ops::paginate(items, limit, cursor, |sm| sm.id.clone())?)
        })
    }

    /// # Errors
    /// * `NotFound` - no Submodel with this id
    pub fn get_submodel_provider(&self, id: &str) -> Result<Arc<SubmodelServiceProvider>> {
        self.submodels.get(id)
    }

    pub fn len(&self) -> usize {
        self.submodels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.submodels.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct ShellRepositoryProvider {
    shells: ProviderRegistry<ShellServiceProvider>,
    config: EngineConfig,
}

impl ShellRepositoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            shells: ProviderRegistry::new(),
            config,
        }
    }

    /// Add a Shell under its id
    ///
    /// # Errors
    /// * `InvalidInput` - bad Shell or carried Submodel
    /// * `Conflict` - the id is taken
    pub fn create(&self, shell: AssetAdministrationShell) -> Result<Arc<ShellServiceProvider>> {
        let id = shell.id.clone();
        observed("shell_repository_create", OpScope::entity(id.as_str()), || {
            validate_shell(&shell)?;
            if self.shells.contains(&id) {
                return Err(twinx_core::TwinError::EntityAlreadyExists {
                    entity_id: id.clone(),
                }
                .into());
            }
            let provider = ShellServiceProvider::with_config(self.config.clone());
            provider.bind(shell)?;
            self.shells.register(id.clone(), Arc::new(provider))
        })
    }

    /// # Errors
    /// * `NotFound` - no Shell with this id
    pub fn retrieve(&self, id: &str) -> Result<AssetAdministrationShell> {
        observed("shell_repository_retrieve", OpScope::entity(id), || {
            self.shells.get(id)?.retrieve()
        })
    }

    pub fn update(&self, id: &str, partial: PartialShell) -> Result<()> {
        observed("shell_repository_update", OpScope::entity(id), || {
            self.shells.get(id)?.update(partial)
        })
    }

    pub fn delete(&self, id: &str) -> Result<()> {
        observed("shell_repository_delete", OpScope::entity(id), || {
            self.shells.unregister(id).map(|_| ())
        })
    }

    /// One page of the Shells passing `filter`, keyed by id
    pub fn retrieve_shells(
        &self,
        limit: Option<usize>,
        cursor: &str,
        filter: &ShellFilter,
    ) -> Result<Page<AssetAdministrationShell>> {
        observed_page("shell_repository_list", OpScope::default(), || {
            let mut items = Vec::new();
            for provider in self.shells.providers() {
                let shell = provider.retrieve()?;
                if filter.matches(&shell) {
                    items.push(shell);
                }
            }
            let limit = self.config.page_limit(limit);
            Ok(ops::paginate(items, limit, cursor, |s| s.id.clone())?)
        })
    }

    /// # Errors
    /// * `NotFound` - no Shell with this id
    pub fn get_shell_provider(&self, id: &str) -> Result<Arc<ShellServiceProvider>> {
        self.shells.get(id)
    }

    pub fn len(&self) -> usize {
        self.shells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shells.is_empty()
    }
}
