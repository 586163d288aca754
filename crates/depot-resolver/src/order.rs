use std::collections::{BTreeMap, BTreeSet, HashSet};

use anyhow::{anyhow, Result};
use depot_core::{ActionState, PackageId, RepoPackage, TransactionInfo};

// Orders the mutating actions dependency-first: a package sorts after every
// in-transaction package it requires. Erase actions go last, in key order.
pub(crate) fn dependency_first_order(
    info: &TransactionInfo,
    by_id: &BTreeMap<PackageId, RepoPackage>,
) -> Result<Vec<PackageId>> {
    let mut installs: BTreeSet<PackageId> = BTreeSet::new();
    let mut erases: Vec<PackageId> = Vec::new();

    for (id, action) in info.iter() {
        match action.state {
            ActionState::Erase => erases.push(id.clone()),
            state if state.mutates() => {
                installs.insert(id.clone());
            }
            _ => {}
        }
    }

    let mut name_to_id: BTreeMap<&str, &PackageId> = BTreeMap::new();
    for id in &installs {
        name_to_id.insert(id.name.as_str(), id);
        if let Some(package) = by_id.get(id) {
            for capability in &package.provides {
                name_to_id.entry(capability.as_str()).or_insert(id);
            }
        }
    }

    let mut deps: BTreeMap<PackageId, BTreeSet<PackageId>> = BTreeMap::new();
    let mut reverse: BTreeMap<PackageId, BTreeSet<PackageId>> = BTreeMap::new();
    for id in &installs {
        deps.insert(id.clone(), BTreeSet::new());
        reverse.insert(id.clone(), BTreeSet::new());
    }

    for id in &installs {
        let Some(package) = by_id.get(id) else {
            continue;
        };
        for requirement in &package.requires {
            let Some(&provider) = name_to_id.get(requirement.as_str()) else {
                continue;
            };
            if provider == id {
                continue;
            }
            deps.entry(id.clone()).or_default().insert(provider.clone());
            reverse
                .entry(provider.clone())
                .or_default()
                .insert(id.clone());
        }
    }

    let mut in_degree: BTreeMap<PackageId, usize> = deps
        .iter()
        .map(|(id, set)| (id.clone(), set.len()))
        .collect();
    let mut ready: BTreeSet<PackageId> = in_degree
        .iter()
        .filter_map(|(id, degree)| (*degree == 0).then(|| id.clone()))
        .collect();
    let mut ordered = Vec::new();

    while let Some(next) = ready.pop_first() {
        ordered.push(next.clone());
        if let Some(children) = reverse.get(&next) {
            for child in children {
                if let Some(degree) = in_degree.get_mut(child) {
                    *degree = degree.saturating_sub(1);
                    if *degree == 0 {
                        ready.insert(child.clone());
                    }
                }
            }
        }
    }

    if ordered.len() != installs.len() {
        let ordered_set: HashSet<&PackageId> = ordered.iter().collect();
        let mut cycle_nodes = installs
            .iter()
            .filter(|id| !ordered_set.contains(id))
            .map(|id| id.to_string())
            .collect::<Vec<_>>();
        cycle_nodes.sort();
        return Err(anyhow!(
            "dependency cycle detected involving: {}",
            cycle_nodes.join(", ")
        ));
    }

    ordered.extend(erases);
    Ok(ordered)
}
