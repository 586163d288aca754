use std::collections::{BTreeMap, BTreeSet};

use anyhow::Result;
use depot_core::{
    ActionState, DependencySolver, InstalledIndex, PackageId, RepoPackage, Resolution,
    TransactionInfo,
};

mod order;

use order::dependency_first_order;

// Closure-based resolver over declared requires/provides. It promotes
// available candidates into the transaction until every requirement of every
// mutating action is satisfied, then fixes a dependency-first order.
pub struct ClosureSolver {
    by_id: BTreeMap<PackageId, RepoPackage>,
    providers: BTreeMap<String, Vec<PackageId>>,
}

impl ClosureSolver {
    pub fn new(available: Vec<RepoPackage>) -> Self {
        let mut by_id = BTreeMap::new();
        let mut providers: BTreeMap<String, Vec<PackageId>> = BTreeMap::new();

        for package in available {
            let id = package.id();
            providers
                .entry(package.name.clone())
                .or_default()
                .push(id.clone());
            for capability in &package.provides {
                providers
                    .entry(capability.clone())
                    .or_default()
                    .push(id.clone());
            }
            by_id.insert(id, package);
        }

        Self { by_id, providers }
    }

    fn satisfied_in_session(
        &self,
        capability: &str,
        info: &TransactionInfo,
        installed: &InstalledIndex,
        erased: &BTreeSet<String>,
    ) -> bool {
        // An installed package satisfies the requirement by name unless this
        // very transaction erases it.
        if !erased.contains(capability)
            && installed.keys().any(|id| id.name == capability)
        {
            return true;
        }

        // A pending install/update satisfies it by name or by capability.
        info.iter().any(|(id, action)| {
            if !action.state.mutates() || action.state == ActionState::Erase {
                return false;
            }
            if id.name == capability {
                return true;
            }
            self.by_id
                .get(id)
                .is_some_and(|package| package.provides.iter().any(|p| p == capability))
        })
    }

    fn available_provider(&self, capability: &str, info: &TransactionInfo) -> Option<PackageId> {
        let ids = self.providers.get(capability)?;
        ids.iter()
            .find(|id| {
                info.get(id)
                    .is_some_and(|action| action.state == ActionState::Available)
            })
            .cloned()
    }
}

impl DependencySolver for ClosureSolver {
    fn resolve(
        &self,
        info: &mut TransactionInfo,
        installed: &InstalledIndex,
    ) -> Result<Resolution> {
        let erased: BTreeSet<String> = info
            .iter()
            .filter(|(_, action)| action.state == ActionState::Erase)
            .map(|(id, _)| id.name.clone())
            .collect();

        let mut messages = Vec::new();

        // Fixpoint: promoting a provider can introduce new requirements.
        loop {
            let mut promotions = Vec::new();

            for (id, action) in info.iter() {
                if !action.state.mutates() || action.state == ActionState::Erase {
                    continue;
                }
                let Some(package) = self.by_id.get(id) else {
                    continue;
                };
                for requirement in &package.requires {
                    if self.satisfied_in_session(requirement, info, installed, &erased) {
                        continue;
                    }
                    match self.available_provider(requirement, info) {
                        Some(provider) => promotions.push(provider),
                        None => {
                            let message =
                                format!("nothing provides {requirement} needed by {id}");
                            if !messages.contains(&message) {
                                messages.push(message);
                            }
                        }
                    }
                }
            }

            if promotions.is_empty() {
                break;
            }
            for provider in promotions {
                // The same provider may satisfy several requirements; only
                // the first promotion moves it.
                if info
                    .get(&provider)
                    .is_some_and(|action| action.state == ActionState::Available)
                {
                    info.mark(&provider, ActionState::Install)?;
                }
            }
        }

        if !messages.is_empty() {
            return Ok(Resolution::Failed(messages));
        }

        let order = dependency_first_order(info, &self.by_id)?;
        info.set_order(order);
        Ok(Resolution::Resolved)
    }
}

#[cfg(test)]
mod tests;
