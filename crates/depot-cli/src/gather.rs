use std::collections::BTreeMap;

use depot_core::{
    is_excluded, wildcard_match, ActionState, Candidate, CandidateSet, InstalledIndex, PackageId,
    PendingAction, RepoPackage, TransactionInfo,
};

use crate::errors::SessionError;

// Builds the candidate set for a session: the best version of every visible
// repo package, classified against the installed index. Installed packages
// with no repo counterpart still show up, so listings cover the whole host.
pub fn assemble_candidates(
    packages: Vec<RepoPackage>,
    installed: &InstalledIndex,
    excludes: &[String],
    filters: &[String],
) -> CandidateSet {
    let mut best: BTreeMap<PackageId, RepoPackage> = BTreeMap::new();
    for package in packages {
        if is_excluded(&package.name, excludes) {
            continue;
        }
        if !matches_filters(&package.name, filters) {
            continue;
        }
        let id = package.id();
        match best.get(&id) {
            Some(existing) if existing.evr >= package.evr => {}
            _ => {
                best.insert(id, package);
            }
        }
    }

    let mut set = CandidateSet::default();
    for (id, package) in &best {
        match installed.get(id) {
            None => set.fresh.push(Candidate {
                package: package.clone(),
                installed: false,
            }),
            Some(installed_evr) if package.evr > *installed_evr => set.updates.push(Candidate {
                package: package.clone(),
                installed: true,
            }),
            Some(_) => set.available.push(Candidate {
                package: package.clone(),
                installed: true,
            }),
        }
    }

    for (id, evr) in installed {
        if best.contains_key(id) || is_excluded(&id.name, excludes) {
            continue;
        }
        if !matches_filters(&id.name, filters) {
            continue;
        }
        set.available.push(Candidate {
            package: RepoPackage {
                name: id.name.clone(),
                arch: id.arch.clone(),
                evr: evr.clone(),
                size: 0,
                summary: String::new(),
                provides: Vec::new(),
                requires: Vec::new(),
                repo: "installed".to_string(),
            },
            installed: true,
        });
    }

    set
}

fn matches_filters(name: &str, filters: &[String]) -> bool {
    filters.is_empty() || filters.iter().any(|filter| wildcard_match(filter, name))
}

fn pending(candidate: &Candidate, state: ActionState) -> PendingAction {
    PendingAction {
        evr: candidate.evr().clone(),
        size: candidate.package.size,
        state,
        displaces: Vec::new(),
    }
}

// Seeds the transaction with the operator's explicit install requests.
pub fn seed_installs(
    info: &mut TransactionInfo,
    args: &[String],
    set: &CandidateSet,
) -> Result<(), SessionError> {
    for arg in args {
        let mut matched = false;
        let mut actionable = false;

        for candidate in set.iter() {
            if !wildcard_match(arg, &candidate.id().name) {
                continue;
            }
            matched = true;
            if candidate.installed {
                let state = if set
                    .updates
                    .iter()
                    .any(|update| update.id() == candidate.id())
                {
                    ActionState::Update
                } else {
                    continue; // already installed, nothing newer
                };
                info.add(candidate.id(), pending(candidate, state));
                actionable = true;
            } else {
                info.add(candidate.id(), pending(candidate, ActionState::Install));
                actionable = true;
            }
        }

        if !matched {
            return Err(SessionError::Fatal(format!(
                "no package matching '{arg}' available"
            )));
        }
        if !actionable {
            return Err(SessionError::Fatal(format!(
                "package matching '{arg}' is already installed and current"
            )));
        }
    }
    Ok(())
}

// Seeds updates: every updatable package, or just those matching the
// requested patterns. With obsoletes handling on, a fresh package that
// provides an installed name displaces it.
pub fn seed_updates(
    info: &mut TransactionInfo,
    args: &[String],
    set: &CandidateSet,
    installed: &InstalledIndex,
    obsoletes: bool,
) -> Result<(), SessionError> {
    for candidate in &set.updates {
        if !matches_filters(&candidate.id().name, args) {
            continue;
        }
        info.add(candidate.id(), pending(candidate, ActionState::Update));
    }

    if obsoletes {
        for candidate in &set.fresh {
            if !matches_filters(&candidate.id().name, args) {
                continue;
            }
            let displaced: Vec<PackageId> = installed
                .keys()
                .filter(|id| {
                    candidate
                        .package
                        .provides
                        .iter()
                        .any(|capability| capability == &id.name)
                })
                .cloned()
                .collect();
            if displaced.is_empty() {
                continue;
            }
            let id = candidate.id();
            if info.add(id.clone(), pending(candidate, ActionState::InstallAsUpdate)) {
                for old in displaced {
                    info.record_displaced(&id, old).map_err(|err| {
                        SessionError::Fatal(format!("cannot record displaced package: {err}"))
                    })?;
                }
            }
        }
    }

    Ok(())
}

pub fn seed_erases(
    info: &mut TransactionInfo,
    args: &[String],
    installed: &InstalledIndex,
) -> Result<(), SessionError> {
    for arg in args {
        let matches: Vec<(&PackageId, &depot_core::Evr)> = installed
            .iter()
            .filter(|(id, _)| wildcard_match(arg, &id.name))
            .collect();
        if matches.is_empty() {
            return Err(SessionError::Fatal(format!(
                "no installed package matching '{arg}'"
            )));
        }
        for (id, evr) in matches {
            info.add(
                id.clone(),
                PendingAction {
                    evr: evr.clone(),
                    size: 0,
                    state: ActionState::Erase,
                    displaces: Vec::new(),
                },
            );
        }
    }
    Ok(())
}

// Everything not already pending enters in the available state so the
// resolver can draw dependencies from it. Skipped entirely for erases.
pub fn seed_available(info: &mut TransactionInfo, set: &CandidateSet) {
    for candidate in set.iter() {
        if candidate.installed && !info.contains(&candidate.id()) {
            continue;
        }
        info.add(candidate.id(), pending(candidate, ActionState::Available));
    }
}

pub fn find_providers<'a>(packages: &'a [RepoPackage], token: &str) -> Vec<&'a RepoPackage> {
    packages
        .iter()
        .filter(|package| {
            package.name == token
                || package
                    .provides
                    .iter()
                    .any(|capability| capability == token)
        })
        .collect()
}

pub fn search_packages<'a>(packages: &'a [RepoPackage], terms: &[String]) -> Vec<&'a RepoPackage> {
    packages
        .iter()
        .filter(|package| {
            terms.iter().any(|term| {
                let term = term.to_lowercase();
                package.name.to_lowercase().contains(&term)
                    || package.summary.to_lowercase().contains(&term)
            })
        })
        .collect()
}
