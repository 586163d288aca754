use super::*;

fn evr(input: &str) -> Evr {
    Evr::parse(input).expect("evr must parse")
}

fn pending(evr_str: &str, state: ActionState) -> PendingAction {
    PendingAction {
        evr: evr(evr_str),
        size: 1024,
        state,
        displaces: Vec::new(),
    }
}

#[test]
fn parses_plain_version() {
    let parsed = evr("1.2.3");
    assert_eq!(parsed.epoch, 0);
    assert_eq!(parsed.version, "1.2.3");
    assert!(parsed.release.is_none());
}

#[test]
fn parses_full_evr() {
    let parsed = evr("2:1.2.3-4.fc40");
    assert_eq!(parsed.epoch, 2);
    assert_eq!(parsed.version, "1.2.3");
    assert_eq!(parsed.release.as_deref(), Some("4.fc40"));
    assert_eq!(parsed.to_string(), "2:1.2.3-4.fc40");
}

#[test]
fn rejects_empty_version() {
    assert!(Evr::parse("2:").is_err());
    assert!(Evr::parse("2:-1").is_err());
}

#[test]
fn epoch_dominates_version_comparison() {
    assert!(evr("1:0.1") > evr("9.9-12"));
}

#[test]
fn numeric_segments_compare_numerically() {
    assert!(evr("1.10") > evr("1.9"));
    assert!(evr("1.2-10") > evr("1.2-9"));
}

#[test]
fn numeric_segment_outranks_alpha() {
    // 0 vs rc at the second segment: numeric wins
    assert!(evr("1.0") > evr("1.rc"));
    // trailing alpha run makes the pre-release longer, so the bare version loses
    assert!(evr("1.0rc1") > evr("1.0"));
}

#[test]
fn longer_version_wins_on_equal_prefix() {
    assert!(evr("1.2.1") > evr("1.2"));
}

#[test]
fn release_breaks_version_tie() {
    assert!(evr("1.2-2.fc40") > evr("1.2-1.fc40"));
    assert_eq!(evr("1.2-1"), evr("1.2-1"));
}

#[test]
fn transaction_info_is_add_once() {
    let mut info = TransactionInfo::new();
    let id = PackageId::new("foo", "x86_64");

    assert!(info.add(id.clone(), pending("1.0-1", ActionState::Install)));
    assert!(!info.add(id.clone(), pending("2.0-1", ActionState::Erase)));
    assert_eq!(info.get(&id).expect("entry must exist").evr, evr("1.0-1"));
    assert_eq!(info.get(&id).expect("entry must exist").state, ActionState::Install);
}

#[test]
fn mark_promotes_only_available_entries() {
    let mut info = TransactionInfo::new();
    let id = PackageId::new("foo", "x86_64");
    info.add(id.clone(), pending("1.0-1", ActionState::Available));

    info.mark(&id, ActionState::Install).expect("promotion must succeed");
    assert!(info.mark(&id, ActionState::Erase).is_err());
    assert_eq!(info.get(&id).expect("entry must exist").state, ActionState::Install);
}

#[test]
fn mark_unknown_key_is_an_error() {
    let mut info = TransactionInfo::new();
    assert!(info
        .mark(&PackageId::new("ghost", "noarch"), ActionState::Install)
        .is_err());
}

#[test]
fn noop_detection_ignores_available_entries() {
    let mut info = TransactionInfo::new();
    info.add(
        PackageId::new("foo", "x86_64"),
        pending("1.0-1", ActionState::Available),
    );
    assert!(info.is_noop());
    assert!(!info.is_empty());

    info.add(
        PackageId::new("bar", "x86_64"),
        pending("1.0-1", ActionState::Update),
    );
    assert!(!info.is_noop());
    assert_eq!(info.mutating_count(), 1);
}

#[test]
fn classify_builds_disjoint_lists() {
    let mut info = TransactionInfo::new();
    info.add(
        PackageId::new("new", "x86_64"),
        pending("1.0-1", ActionState::Install),
    );
    info.add(
        PackageId::new("up", "x86_64"),
        pending("2.0-1", ActionState::Update),
    );
    info.add(
        PackageId::new("gone", "x86_64"),
        pending("0.9-1", ActionState::Erase),
    );
    info.add(
        PackageId::new("iu", "x86_64"),
        pending("3.0-1", ActionState::InstallAsUpdate),
    );
    info.add(
        PackageId::new("idle", "x86_64"),
        pending("1.0-1", ActionState::Available),
    );
    info.record_displaced(
        &PackageId::new("up", "x86_64"),
        PackageId::new("legacy", "x86_64"),
    )
    .expect("displaced entry must record");

    let lists = info.classify();
    assert_eq!(lists.install.len(), 2); // install + install-as-update
    assert_eq!(lists.update.len(), 1);
    assert_eq!(lists.erase.len(), 1);
    assert_eq!(lists.update_displaced, vec![PackageId::new("legacy", "x86_64")]);
    assert!(lists.erase_displaced.is_empty());
}

#[test]
fn ordered_actions_follow_resolution_order() {
    let mut info = TransactionInfo::new();
    let dep = PackageId::new("libdep", "x86_64");
    let app = PackageId::new("app", "x86_64");
    info.add(app.clone(), pending("1.0-1", ActionState::Install));
    info.add(dep.clone(), pending("1.0-1", ActionState::Install));
    info.set_order(vec![dep.clone(), app.clone()]);

    let ordered = info.ordered_actions();
    assert_eq!(ordered[0].0, dep);
    assert_eq!(ordered[1].0, app);
}

#[test]
fn ordered_actions_fall_back_to_key_order() {
    let mut info = TransactionInfo::new();
    info.add(
        PackageId::new("zsh", "x86_64"),
        pending("5.9-1", ActionState::Erase),
    );
    info.add(
        PackageId::new("bash", "x86_64"),
        pending("5.2-1", ActionState::Erase),
    );

    let ordered = info.ordered_actions();
    assert_eq!(ordered[0].0.name, "bash");
    assert_eq!(ordered[1].0.name, "zsh");
}

#[test]
fn group_merge_is_stable_by_repo_id() {
    let mut alpha = GroupCatalog::new();
    alpha.insert(PackageGroup {
        id: "editors".to_string(),
        name: "Editors (alpha)".to_string(),
        packages: vec!["vim".to_string()],
        repo: "alpha".to_string(),
    });

    let mut beta = GroupCatalog::new();
    beta.insert(PackageGroup {
        id: "editors".to_string(),
        name: "Editors (beta)".to_string(),
        packages: vec!["emacs".to_string()],
        repo: "beta".to_string(),
    });
    beta.insert(PackageGroup {
        id: "shells".to_string(),
        name: "Shells".to_string(),
        packages: vec!["zsh".to_string()],
        repo: "beta".to_string(),
    });

    // Supplied out of order; merge must still prefer the alpha repo.
    let merged = merge_group_catalogs(vec![
        ("beta".to_string(), beta),
        ("alpha".to_string(), alpha),
    ]);

    assert_eq!(merged.len(), 2);
    assert_eq!(
        merged.get("editors").expect("group must exist").repo,
        "alpha"
    );
    assert_eq!(merged.get("shells").expect("group must exist").repo, "beta");
}

#[test]
fn wildcard_matching_covers_star_and_question() {
    assert!(wildcard_match("kernel*", "kernel-core"));
    assert!(wildcard_match("*-devel", "zlib-devel"));
    assert!(wildcard_match("gcc-?", "gcc-9"));
    assert!(!wildcard_match("gcc-?", "gcc-10"));
    assert!(wildcard_match("exact", "exact"));
    assert!(!wildcard_match("exact", "exactly"));
}

#[test]
fn exclusion_checks_every_pattern() {
    let patterns = vec!["kernel*".to_string(), "*-debuginfo".to_string()];
    assert!(is_excluded("kernel-core", &patterns));
    assert!(is_excluded("bash-debuginfo", &patterns));
    assert!(!is_excluded("bash", &patterns));
}

#[test]
fn candidate_set_iteration_covers_all_buckets() {
    let package = RepoPackage {
        name: "foo".to_string(),
        arch: "x86_64".to_string(),
        evr: evr("1.0-1"),
        size: 10,
        summary: String::new(),
        provides: Vec::new(),
        requires: Vec::new(),
        repo: "base".to_string(),
    };
    let mut set = CandidateSet::default();
    assert!(set.is_empty());

    set.updates.push(Candidate {
        package: package.clone(),
        installed: true,
    });
    set.fresh.push(Candidate {
        package,
        installed: false,
    });

    assert_eq!(set.len(), 2);
    assert_eq!(set.iter().count(), 2);
    assert!(!set.is_empty());
}
