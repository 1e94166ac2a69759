//! Service provider bound to one Asset Administration Shell
//!
//! The Shell is stored without its Submodels. Each carried Submodel lives in
//! its own [`SubmodelServiceProvider`], and reads fold their current state back
//! into the Shell in registration order.

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::RwLock;
use twinx_core::model::{AssetAdministrationShell, PartialShell, Submodel};
use twinx_core::ops::{self, merge, Page};
use twinx_core::logging_facility::OpScope;
use twinx_core::TwinError;

use super::{observed, observed_page};
use super::registry::ProviderRegistry;
use super::submodel_provider::{validate_submodel, SubmodelServiceProvider};
use crate::config::EngineConfig;
use crate::Result;

const PROVIDER: &str = "ShellServiceProvider";

pub struct ShellServiceProvider {
    shell: RwLock<Option<AssetAdministrationShell>>,
    submodels: ProviderRegistry<SubmodelServiceProvider>,
    config: EngineConfig,
}

impl Default for ShellServiceProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ShellServiceProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct(PROVIDER)
            .field("shell_id", &self.bound_id())
            .field("submodels", &self.submodels)
            .finish()
    }
}

fn unbound() -> TwinError {
    TwinError::UnboundProvider {
        provider: PROVIDER.to_string(),
    }
}

pub(crate) fn validate_shell(shell: &AssetAdministrationShell) -> twinx_core::Result<()> {
    if shell.id.trim().is_empty() {
        return Err(TwinError::InvalidEntity {
            reason: "shell id is empty".to_string(),
        });
    }
    ops::validate_id_short(&shell.id_short)
}

impl ShellServiceProvider {
    /// Unbound provider with default settings
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    /// Unbound provider; child Submodel providers inherit `config`
    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            shell: RwLock::new(None),
            submodels: ProviderRegistry::new(),
            config,
        }
    }

    pub fn from_shell(shell: AssetAdministrationShell) -> Result<Self> {
        let provider = Self::new();
        provider.bind(shell)?;
        Ok(provider)
    }

    /// Bind (or rebind) the Shell
    ///
    /// A fresh Submodel provider is created for every carried Submodel,
    /// replacing whatever was registered before.
    ///
    /// # Errors
    /// * `InvalidInput` - bad Shell or Submodel identity, or a Submodel id carried twice
    pub fn bind(&self, mut shell: AssetAdministrationShell) -> Result<()> {
        let id = shell.id.clone();
        observed("shell_bind", OpScope::entity(id.as_str()), || {
            validate_shell(&shell)?;
            let carried = std::mem::take(&mut shell.submodels);
            let children = self.child_providers(carried)?;

            let mut slot = self.shell.write();
            self.submodels.replace_all(children);
            *slot = Some(shell);
            Ok(())
        })
    }

    fn child_providers(
        &self,
        submodels: Vec<Submodel>,
    ) -> Result<Vec<(String, Arc<SubmodelServiceProvider>)>> {
        let mut seen = HashSet::new();
        let mut children = Vec::with_capacity(submodels.len());
        for submodel in submodels {
            validate_submodel(&submodel)?;
            if !seen.insert(submodel.id.clone()) {
                return Err(TwinError::InvalidEntity {
                    reason: format!("submodel '{}' is carried twice", submodel.id),
                }
                .into());
            }
            children.push((submodel.id.clone(), self.child_provider(submodel)?));
        }
        Ok(children)
    }

    fn child_provider(&self, submodel: Submodel) -> Result<Arc<SubmodelServiceProvider>> {
        let provider = SubmodelServiceProvider::with_config(&self.config);
        provider.bind(submodel)?;
        Ok(Arc::new(provider))
    }

    pub fn is_bound(&self) -> bool {
        self.shell.read().is_some()
    }

    pub fn bound_id(&self) -> Option<String> {
        self.shell.read().as_ref().map(|s| s.id.clone())
    }

    fn current_submodels(&self) -> Result<Vec<Submodel>> {
        self.submodels
            .providers()
            .iter()
            .map(|provider| provider.retrieve())
            .collect()
    }

    /// The Shell with its current Submodels folded in
    ///
    /// # Errors
    /// * `ContractViolation` - nothing bound, here or in a child provider
    pub fn retrieve(&self) -> Result<AssetAdministrationShell> {
        let id = self.bound_id();
        observed("shell_retrieve", OpScope::entity(id.as_deref()), || {
            let mut shell = self.shell.read().clone().ok_or_else(unbound)?;
            shell.submodels = self.current_submodels()?;
            Ok(shell)
        })
    }

    /// Merge `partial` into the bound Shell
    ///
    /// Supplied Submodels rebind the provider with the same id, or get a new
    /// provider appended. Nothing changes if any supplied field is rejected.
    pub fn update(&self, partial: PartialShell) -> Result<()> {
        let id = self.bound_id();
        observed("shell_update", OpScope::entity(id.as_deref()), || {
            let mut supplied = HashSet::new();
            for submodel in partial.submodels.iter().flatten() {
                validate_submodel(submodel)?;
                if !supplied.insert(submodel.id.clone()) {
                    return Err(TwinError::InvalidEntity {
                        reason: format!("submodel '{}' is supplied twice", submodel.id),
                    }
                    .into());
                }
            }

            let mut slot = self.shell.write();
            let mut folded = slot.clone().ok_or_else(unbound)?;
            folded.submodels = self.current_submodels()?;
            let mut next = merge::merge_shell(&folded, partial)?;

            // merged Submodels go back to the child providers
            for submodel in std::mem::take(&mut next.submodels) {
                if !supplied.contains(&submodel.id) {
                    continue;
                }
                match self.submodels.get(&submodel.id) {
                    Ok(existing) => existing.bind(submodel)?,
                    Err(_) => {
                        let id = submodel.id.clone();
                        self.submodels.register(id, self.child_provider(submodel)?)?;
                    }
                }
            }
            *slot = Some(next);
            Ok(())
        })
    }

    /// Attach a bound Submodel provider under its Submodel id
    ///
    /// # Errors
    /// * `ContractViolation` - the provider is unbound
    /// * `Conflict` - a provider with that id is already attached
    pub fn register_submodel_provider(&self, provider: Arc<SubmodelServiceProvider>) -> Result<()> {
        let id = self.bound_id();
        observed("shell_register_submodel_provider", OpScope::entity(id.as_deref()), || {
            let id = provider.bound_id().ok_or_else(|| TwinError::UnboundProvider {
                provider: "SubmodelServiceProvider".to_string(),
            })?;
            self.submodels.register(id, provider)?;
            Ok(())
        })
    }

    /// # Errors
    /// * `NotFound` - no provider for `submodel_id`
    pub fn unregister_submodel_provider(&self, submodel_id: &str) -> Result<Arc<SubmodelServiceProvider>> {
        observed("shell_unregister_submodel_provider", OpScope::entity(submodel_id), || {
            self.submodels.unregister(submodel_id)
        })
    }

    /// # Errors
    /// * `NotFound` - no provider for `submodel_id`
    pub fn get_submodel_provider(&self, submodel_id: &str) -> Result<Arc<SubmodelServiceProvider>> {
        self.submodels.get(submodel_id)
    }

    pub fn submodel_ids(&self) -> Vec<String> {
        self.submodels.ids()
    }

    /// One page of the carried Submodels, keyed by Submodel id
    pub fn retrieve_submodels(&self, limit: Option<usize>, cursor: &str) -> Result<Page<Submodel>> {
        let id = self.bound_id();
        observed_page("shell_retrieve_submodels", OpScope::entity(id.as_deref()), || {
            if !self.is_bound() {
                return Err(unbound().into());
            }
            let items = self.current_submodels()?;
            let limit = self.config.page_limit(limit);
            Ok(ops::paginate(items, limit, cursor, |sm| sm.id.clone())?)
        })
    }
}
