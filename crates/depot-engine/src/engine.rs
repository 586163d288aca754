use std::collections::BTreeMap;

use anyhow::{bail, Result};
use depot_core::{ActionState, PackageId, PendingAction, TransactionInfo};

use crate::layout::HostLayout;
use crate::receipts::{
    current_unix_timestamp, read_installed, remove_receipt, write_receipt, InstalledPackage,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProblemFilter {
    Default,
    SkipDiskSpace,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitEvent {
    Start { total: usize },
    Package { id: PackageId, state: ActionState },
    Done,
}

// The delegated transaction engine, at its interface boundary: a built
// handle must be checked and ordered before commit, and closed before it is
// discarded on every path.
pub trait TransactionEngine {
    fn build(&self, info: &TransactionInfo) -> Result<Box<dyn EngineTransaction>>;
}

pub trait EngineTransaction {
    fn set_problem_filter(&mut self, filter: ProblemFilter);
    fn verify(&mut self) -> Result<Vec<String>>;
    fn check(&mut self) -> Result<()>;
    fn order(&mut self) -> Result<()>;
    fn commit(&mut self, progress: &mut dyn FnMut(CommitEvent)) -> Result<Vec<String>>;
    fn close(&mut self) -> Result<()>;
}

// Receipt-backed engine: installing writes a receipt, erasing removes one.
// Good enough to drive the whole pipeline against a real filesystem.
#[derive(Debug, Clone)]
pub struct LocalEngine {
    layout: HostLayout,
}

impl LocalEngine {
    pub fn new(layout: HostLayout) -> Self {
        Self { layout }
    }
}

impl TransactionEngine for LocalEngine {
    fn build(&self, info: &TransactionInfo) -> Result<Box<dyn EngineTransaction>> {
        let installed = read_installed(&self.layout)?;
        Ok(Box::new(LocalTransaction {
            layout: self.layout.clone(),
            actions: info.ordered_actions(),
            installed: Some(installed),
            filter: ProblemFilter::Default,
            checked: false,
            ordered: false,
        }))
    }
}

struct LocalTransaction {
    layout: HostLayout,
    actions: Vec<(PackageId, PendingAction)>,
    // The open database handle; close() drops it.
    installed: Option<BTreeMap<PackageId, InstalledPackage>>,
    filter: ProblemFilter,
    checked: bool,
    ordered: bool,
}

impl LocalTransaction {
    fn installed(&self) -> Result<&BTreeMap<PackageId, InstalledPackage>> {
        match &self.installed {
            Some(installed) => Ok(installed),
            None => bail!("transaction handle is closed"),
        }
    }

    fn pending_bytes(&self) -> u64 {
        self.actions
            .iter()
            .filter(|(_, action)| action.state != ActionState::Erase)
            .map(|(_, action)| action.size)
            .fold(0u64, u64::saturating_add)
    }

    fn available_bytes(&self) -> Result<u64> {
        let stat = nix::sys::statvfs::statvfs(&self.layout.state_dir())?;
        Ok(stat.blocks_available() as u64 * stat.fragment_size() as u64)
    }
}

impl EngineTransaction for LocalTransaction {
    fn set_problem_filter(&mut self, filter: ProblemFilter) {
        self.filter = filter;
    }

    fn verify(&mut self) -> Result<Vec<String>> {
        let installed = self.installed()?;
        let mut problems = Vec::new();

        for (id, action) in &self.actions {
            match action.state {
                ActionState::Install => {
                    if let Some(existing) = installed.get(id) {
                        if existing.evr >= action.evr {
                            problems.push(format!(
                                "package {id} is already installed ({})",
                                existing.evr
                            ));
                        }
                    }
                }
                ActionState::Update | ActionState::InstallAsUpdate => {
                    // Updates replace whatever is there; nothing to check
                    // beyond the receipts themselves being readable, which
                    // build already guaranteed.
                }
                ActionState::Erase => {
                    if !installed.contains_key(id) {
                        problems.push(format!("cannot erase {id}: not installed"));
                    }
                }
                ActionState::Available => {}
            }
        }

        if self.filter != ProblemFilter::SkipDiskSpace {
            let needed = self.pending_bytes();
            let available = self.available_bytes()?;
            if needed > available {
                problems.push(format!(
                    "insufficient disk space: {needed} bytes needed, {available} available"
                ));
            }
        }

        Ok(problems)
    }

    fn check(&mut self) -> Result<()> {
        let installed = self.installed()?;
        for (id, action) in &self.actions {
            if id.name.is_empty() || id.arch.is_empty() {
                bail!("malformed package identity in transaction");
            }
            if action.state == ActionState::Erase && !installed.contains_key(id) {
                bail!("cannot erase {id}: not installed");
            }
        }
        self.checked = true;
        Ok(())
    }

    fn order(&mut self) -> Result<()> {
        if !self.checked {
            bail!("transaction must be checked before it is ordered");
        }
        self.ordered = true;
        Ok(())
    }

    fn commit(&mut self, progress: &mut dyn FnMut(CommitEvent)) -> Result<Vec<String>> {
        if self.installed.is_none() {
            bail!("transaction handle is closed");
        }
        if !self.checked || !self.ordered {
            bail!("transaction must be checked and ordered before commit");
        }

        let now = current_unix_timestamp()?;
        let mut errors = Vec::new();
        progress(CommitEvent::Start {
            total: self.actions.len(),
        });

        for (id, action) in &self.actions {
            progress(CommitEvent::Package {
                id: id.clone(),
                state: action.state,
            });
            match action.state {
                ActionState::Install | ActionState::Update | ActionState::InstallAsUpdate => {
                    let receipt = InstalledPackage {
                        name: id.name.clone(),
                        arch: id.arch.clone(),
                        evr: action.evr.clone(),
                        size: action.size,
                        installed_at_unix: now,
                    };
                    if let Err(err) = write_receipt(&self.layout, &receipt) {
                        errors.push(format!("error installing {id}: {err}"));
                        continue;
                    }
                    for displaced in &action.displaces {
                        if let Err(err) =
                            remove_receipt(&self.layout, &displaced.name, &displaced.arch)
                        {
                            errors.push(format!("error displacing {displaced}: {err}"));
                        }
                    }
                }
                ActionState::Erase => match remove_receipt(&self.layout, &id.name, &id.arch) {
                    Ok(true) => {}
                    Ok(false) => errors.push(format!("error erasing {id}: not installed")),
                    Err(err) => errors.push(format!("error erasing {id}: {err}")),
                },
                ActionState::Available => {}
            }
        }

        progress(CommitEvent::Done);
        Ok(errors)
    }

    fn close(&mut self) -> Result<()> {
        self.installed = None;
        Ok(())
    }
}
