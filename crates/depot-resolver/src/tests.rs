use std::collections::BTreeMap;

use depot_core::{
    ActionState, DependencySolver, Evr, InstalledIndex, PackageId, PendingAction, RepoPackage,
    Resolution, TransactionInfo,
};

use super::ClosureSolver;

fn package(name: &str, requires: &[&str], provides: &[&str]) -> RepoPackage {
    RepoPackage {
        name: name.to_string(),
        arch: "x86_64".to_string(),
        evr: Evr::parse("1.0-1").expect("evr must parse"),
        size: 4096,
        summary: format!("{name} package"),
        provides: provides.iter().map(|p| p.to_string()).collect(),
        requires: requires.iter().map(|r| r.to_string()).collect(),
        repo: "base".to_string(),
    }
}

fn seed(info: &mut TransactionInfo, package: &RepoPackage, state: ActionState) {
    info.add(
        package.id(),
        PendingAction {
            evr: package.evr.clone(),
            size: package.size,
            state,
            displaces: Vec::new(),
        },
    );
}

fn installed(names: &[&str]) -> InstalledIndex {
    let mut index = BTreeMap::new();
    for name in names {
        index.insert(
            PackageId::new(*name, "x86_64"),
            Evr::parse("1.0-1").expect("evr must parse"),
        );
    }
    index
}

#[test]
fn promotes_available_dependencies_transitively() {
    let app = package("app", &["liba"], &[]);
    let liba = package("liba", &["libb"], &[]);
    let libb = package("libb", &[], &[]);

    let mut info = TransactionInfo::new();
    seed(&mut info, &app, ActionState::Install);
    seed(&mut info, &liba, ActionState::Available);
    seed(&mut info, &libb, ActionState::Available);

    let solver = ClosureSolver::new(vec![app, liba, libb]);
    let resolution = solver
        .resolve(&mut info, &installed(&[]))
        .expect("resolve must not fail");

    assert_eq!(resolution, Resolution::Resolved);
    assert_eq!(
        info.get(&PackageId::new("liba", "x86_64"))
            .expect("entry must exist")
            .state,
        ActionState::Install
    );
    assert_eq!(
        info.get(&PackageId::new("libb", "x86_64"))
            .expect("entry must exist")
            .state,
        ActionState::Install
    );
}

#[test]
fn capability_providers_satisfy_requirements() {
    let app = package("mta-user", &["smtp-daemon"], &[]);
    let postfix = package("postfix", &[], &["smtp-daemon"]);

    let mut info = TransactionInfo::new();
    seed(&mut info, &app, ActionState::Install);
    seed(&mut info, &postfix, ActionState::Available);

    let solver = ClosureSolver::new(vec![app, postfix]);
    let resolution = solver
        .resolve(&mut info, &installed(&[]))
        .expect("resolve must not fail");

    assert_eq!(resolution, Resolution::Resolved);
    assert_eq!(
        info.get(&PackageId::new("postfix", "x86_64"))
            .expect("entry must exist")
            .state,
        ActionState::Install
    );
}

#[test]
fn installed_packages_satisfy_requirements_without_promotion() {
    let app = package("app", &["zlib"], &[]);
    let zlib = package("zlib", &[], &[]);

    let mut info = TransactionInfo::new();
    seed(&mut info, &app, ActionState::Install);
    seed(&mut info, &zlib, ActionState::Available);

    let solver = ClosureSolver::new(vec![app, zlib]);
    let resolution = solver
        .resolve(&mut info, &installed(&["zlib"]))
        .expect("resolve must not fail");

    assert_eq!(resolution, Resolution::Resolved);
    assert_eq!(
        info.get(&PackageId::new("zlib", "x86_64"))
            .expect("entry must exist")
            .state,
        ActionState::Available
    );
}

#[test]
fn missing_requirement_fails_with_message() {
    let app = package("app", &["no-such-lib"], &[]);

    let mut info = TransactionInfo::new();
    seed(&mut info, &app, ActionState::Install);

    let solver = ClosureSolver::new(vec![app]);
    let resolution = solver
        .resolve(&mut info, &installed(&[]))
        .expect("resolve must not fail");

    match resolution {
        Resolution::Failed(messages) => {
            assert_eq!(
                messages,
                vec!["nothing provides no-such-lib needed by app.x86_64".to_string()]
            );
        }
        Resolution::Resolved => panic!("resolution must fail"),
    }
}

#[test]
fn erased_package_no_longer_satisfies_requirements() {
    let app = package("app", &["zlib"], &[]);
    let zlib = package("zlib", &[], &[]);

    let mut info = TransactionInfo::new();
    seed(&mut info, &app, ActionState::Install);
    seed(&mut info, &zlib, ActionState::Erase);

    let solver = ClosureSolver::new(vec![app]);
    let resolution = solver
        .resolve(&mut info, &installed(&["zlib"]))
        .expect("resolve must not fail");

    match resolution {
        Resolution::Failed(messages) => {
            assert!(messages[0].contains("nothing provides zlib"));
        }
        Resolution::Resolved => panic!("resolution must fail"),
    }
}

#[test]
fn order_places_dependencies_before_dependents_and_erases_last() {
    let app = package("app", &["liba"], &[]);
    let liba = package("liba", &[], &[]);
    let old = package("old", &[], &[]);

    let mut info = TransactionInfo::new();
    seed(&mut info, &app, ActionState::Install);
    seed(&mut info, &liba, ActionState::Available);
    seed(&mut info, &old, ActionState::Erase);

    let solver = ClosureSolver::new(vec![app, liba]);
    let resolution = solver
        .resolve(&mut info, &installed(&[]))
        .expect("resolve must not fail");
    assert_eq!(resolution, Resolution::Resolved);

    let ordered: Vec<String> = info
        .ordered_actions()
        .into_iter()
        .map(|(id, _)| id.name)
        .collect();
    assert_eq!(ordered, vec!["liba", "app", "old"]);
}

#[test]
fn dependency_cycle_is_reported() {
    let ping = package("ping", &["pong"], &[]);
    let pong = package("pong", &["ping"], &[]);

    let mut info = TransactionInfo::new();
    seed(&mut info, &ping, ActionState::Install);
    seed(&mut info, &pong, ActionState::Install);

    let solver = ClosureSolver::new(vec![ping, pong]);
    let err = solver
        .resolve(&mut info, &installed(&[]))
        .expect_err("cycle must surface as an error");
    assert!(err.to_string().contains("dependency cycle"));
}
