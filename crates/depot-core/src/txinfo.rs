use std::collections::BTreeMap;

use anyhow::Result;

use crate::evr::Evr;
use crate::package::PackageId;

pub type InstalledIndex = BTreeMap<PackageId, Evr>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionState {
    Available,
    Install,
    Update,
    Erase,
    InstallAsUpdate,
}

impl ActionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Install => "install",
            Self::Update => "update",
            Self::Erase => "erase",
            Self::InstallAsUpdate => "install-as-update",
        }
    }

    pub fn mutates(&self) -> bool {
        !matches!(self, Self::Available)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingAction {
    pub evr: Evr,
    pub size: u64,
    pub state: ActionState,
    pub displaces: Vec<PackageId>,
}

// The working set of pending actions, keyed by (name, arch). State movement
// per key is monotonic within one session: a key enters once, may leave the
// `available` pool exactly once, and is never re-added after that.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionInfo {
    actions: BTreeMap<PackageId, PendingAction>,
    order: Vec<PackageId>,
}

impl TransactionInfo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: &PackageId) -> bool {
        self.actions.contains_key(id)
    }

    pub fn get(&self, id: &PackageId) -> Option<&PendingAction> {
        self.actions.get(id)
    }

    // Returns false without touching the entry when the key is already
    // present.
    pub fn add(&mut self, id: PackageId, action: PendingAction) -> bool {
        if self.actions.contains_key(&id) {
            return false;
        }
        self.actions.insert(id, action);
        true
    }

    // Promotes an `available` entry to a resolved state. Entries that have
    // already left the available pool are frozen.
    pub fn mark(&mut self, id: &PackageId, state: ActionState) -> Result<()> {
        let action = self
            .actions
            .get_mut(id)
            .ok_or_else(|| anyhow::anyhow!("no pending entry for {id}"))?;
        if action.state != ActionState::Available {
            anyhow::bail!(
                "refusing to move {id} from {} to {}",
                action.state.as_str(),
                state.as_str()
            );
        }
        action.state = state;
        Ok(())
    }

    pub fn record_displaced(&mut self, id: &PackageId, displaced: PackageId) -> Result<()> {
        let action = self
            .actions
            .get_mut(id)
            .ok_or_else(|| anyhow::anyhow!("no pending entry for {id}"))?;
        action.displaces.push(displaced);
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PackageId, &PendingAction)> {
        self.actions.iter()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    // True when resolution left nothing that would mutate the host.
    pub fn is_noop(&self) -> bool {
        self.actions.values().all(|action| !action.state.mutates())
    }

    pub fn mutating_count(&self) -> usize {
        self.actions
            .values()
            .filter(|action| action.state.mutates())
            .count()
    }

    pub fn set_order(&mut self, order: Vec<PackageId>) {
        self.order = order;
    }

    // Dependency-first ordering established by resolution; falls back to key
    // order for sets that were never ordered (pure-erase transactions).
    pub fn ordered_actions(&self) -> Vec<(PackageId, PendingAction)> {
        let mut out = Vec::new();
        if self.order.is_empty() {
            for (id, action) in &self.actions {
                if action.state.mutates() {
                    out.push((id.clone(), action.clone()));
                }
            }
            return out;
        }
        for id in &self.order {
            if let Some(action) = self.actions.get(id) {
                if action.state.mutates() {
                    out.push((id.clone(), action.clone()));
                }
            }
        }
        out
    }

    pub fn classify(&self) -> ActionLists {
        let mut lists = ActionLists::default();
        for (id, action) in &self.actions {
            let entry = (id.clone(), action.evr.clone());
            match action.state {
                ActionState::Available => continue,
                ActionState::Install | ActionState::InstallAsUpdate => {
                    lists.install.push(entry);
                    lists
                        .update_displaced
                        .extend(action.displaces.iter().cloned());
                }
                ActionState::Update => {
                    lists.update.push(entry);
                    lists
                        .update_displaced
                        .extend(action.displaces.iter().cloned());
                }
                ActionState::Erase => {
                    lists.erase.push(entry);
                    lists
                        .erase_displaced
                        .extend(action.displaces.iter().cloned());
                }
            }
        }
        lists
    }
}

// The disjoint display lists shown at the confirmation gate and written to
// the logs after commit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionLists {
    pub install: Vec<(PackageId, Evr)>,
    pub update: Vec<(PackageId, Evr)>,
    pub erase: Vec<(PackageId, Evr)>,
    pub update_displaced: Vec<PackageId>,
    pub erase_displaced: Vec<PackageId>,
}

impl ActionLists {
    pub fn is_empty(&self) -> bool {
        self.install.is_empty()
            && self.update.is_empty()
            && self.erase.is_empty()
            && self.update_displaced.is_empty()
            && self.erase_displaced.is_empty()
    }
}

// Typed result at the resolver boundary: either the set is dependency
// complete and ordered, or resolution failed with operator-facing messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Resolved,
    Failed(Vec<String>),
}

pub trait DependencySolver {
    fn resolve(&self, info: &mut TransactionInfo, installed: &InstalledIndex)
        -> Result<Resolution>;
}
