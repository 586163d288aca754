use std::io::BufRead;
use std::process::ExitCode;
use std::thread;
use std::time::Duration;

use depot_core::{
    merge_group_catalogs, CandidateSet, DependencySolver, Resolution, TransactionInfo,
};
use depot_engine::{
    installed_index, BootConfigHook, HostProbe, LocalEngine, LockAcquire, NoopBootHook,
    ProcessProbe, SessionLock,
};
use depot_repo::RepoStore;
use depot_resolver::ClosureSolver;
use rand::Rng;

use crate::cli::{Cli, Command};
use crate::config::{load_session_config, resolve_config_path};
use crate::confirm::confirm_transaction;
use crate::errors::SessionError;
use crate::gather::{
    assemble_candidates, find_providers, search_packages, seed_available, seed_erases,
    seed_installs, seed_updates,
};
use crate::pipeline::{run_pipeline, PipelineOutcome};
use crate::postactions::run_post_actions;
use crate::render::render_candidate_listing;
use crate::session::{bootstrap, SessionContext};

// The session's host-facing collaborators, injectable so tests can run a
// whole session without real identity, processes, or a terminal.
pub struct SessionDeps<'a> {
    pub pid: u32,
    pub privileged: bool,
    pub probe: &'a dyn ProcessProbe,
    pub boot: &'a dyn BootConfigHook,
    pub input: &'a mut dyn BufRead,
}

pub fn run(cli: Cli) -> ExitCode {
    let privileged = nix::unistd::geteuid().is_root();
    let probe = HostProbe;
    let boot = NoopBootHook;
    let stdin = std::io::stdin();
    let mut input = stdin.lock();

    let mut deps = SessionDeps {
        pid: std::process::id(),
        privileged,
        probe: &probe,
        boot: &boot,
        input: &mut input,
    };

    match run_session(&cli, &mut deps) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            for line in err.detail() {
                eprintln!("{line}");
            }
            eprintln!("{err}");
            ExitCode::from(err.exit_code())
        }
    }
}

pub fn run_session(cli: &Cli, deps: &mut SessionDeps) -> Result<(), SessionError> {
    random_delay(cli.random_wait);

    let config_path = resolve_config_path(cli)?;
    let config = load_session_config(cli, &config_path)?;
    let mut ctx = bootstrap(config, cli.command, deps.privileged)?;

    if !ctx.privileged {
        return execute(cli, &mut ctx, deps);
    }

    // Privileged sessions hold the host-wide lock for their whole lifetime,
    // read-only commands included.
    ctx.layout
        .ensure_base_dirs()
        .map_err(|err| SessionError::Fatal(format!("cannot prepare host directories: {err}")))?;

    match SessionLock::acquire(&ctx.layout.lock_path(), deps.pid, deps.probe) {
        Ok(LockAcquire::Acquired(mut lock)) => {
            if let Some(audit) = &mut ctx.audit {
                audit
                    .record(
                        "session",
                        serde_json::json!({
                            "command": cli.command.as_str(),
                            "packages": cli.packages,
                        }),
                    )
                    .map_err(|err| {
                        SessionError::Fatal(format!("cannot write audit log: {err}"))
                    })?;
            }
            let outcome = execute(cli, &mut ctx, deps);
            let released = lock.release();
            outcome?;
            released.map_err(|err| SessionError::Fatal(format!("cannot release lock: {err}")))
        }
        Ok(LockAcquire::Busy { owner }) => Err(SessionError::LockBusy { owner }),
        Err(err) => {
            // An unprobeable owner is an anomaly, not ordinary contention.
            ctx.errors.say(1, &format!("lock probe anomaly: {err:#}"));
            Err(SessionError::LockProbe(err.to_string()))
        }
    }
}

fn random_delay(minutes: Option<u64>) {
    let Some(minutes) = minutes else { return };
    let bound = delay_bound_seconds(minutes);
    if bound == 0 {
        return;
    }
    let seconds = rand::thread_rng().gen_range(0..=bound);
    thread::sleep(Duration::from_secs(seconds));
}

pub(crate) fn delay_bound_seconds(minutes: u64) -> u64 {
    minutes.saturating_mul(60)
}

fn execute(
    cli: &Cli,
    ctx: &mut SessionContext,
    deps: &mut SessionDeps,
) -> Result<(), SessionError> {
    let mut store = RepoStore::new(
        ctx.config.repos.clone(),
        ctx.layout.cache_dir(),
        ctx.cache_only,
    );
    store.apply_overrides(&ctx.config.enable_repos, &ctx.config.disable_repos);

    if cli.command == Command::Clean {
        store
            .clean_cache()
            .map_err(|err| SessionError::Fatal(format!("cannot clean cache: {err}")))?;
        ctx.operator.say(1, "metadata cache cleaned");
        return Ok(());
    }

    let packages = store
        .load_packages()
        .map_err(|err| SessionError::Fatal(format!("cannot load repository metadata: {err}")))?;
    let installed = installed_index(&ctx.layout)
        .map_err(|err| SessionError::Fatal(format!("cannot read installed state: {err}")))?;

    if cli.command.is_read_only() {
        return run_read_only(cli, ctx, &store, packages, &installed);
    }

    let args = if cli.command.is_group() {
        expand_groups(&store, &cli.packages)?
    } else {
        cli.packages.clone()
    };

    let set = assemble_candidates(packages.clone(), &installed, &ctx.config.exclude, &[]);

    let mut info = TransactionInfo::new();
    match cli.command {
        Command::Install | Command::Groupinstall => {
            seed_install_requests(&mut info, &args, &set, ctx)?;
        }
        command if command.is_update() || command == Command::Groupupdate => {
            let obsoletes = ctx.config.obsoletes || cli.command == Command::Upgrade;
            seed_updates(&mut info, &args, &set, &installed, obsoletes)?;
        }
        command if command.is_erase() => {
            seed_erase_requests(&mut info, &args, &installed, ctx)?;
        }
        // Read-only commands and clean have already returned.
        command => {
            return Err(SessionError::Fatal(format!(
                "command '{}' cannot reach the transaction stage",
                command.as_str()
            )));
        }
    }

    if info.is_noop() {
        ctx.operator.say(1, "Nothing to do");
        return Ok(());
    }

    // Erases resolve against installed state only; everything else may pull
    // dependencies from the remaining available pool.
    if !cli.command.is_erase() {
        seed_available(&mut info, &set);
    }

    let solver = ClosureSolver::new(packages);
    match solver
        .resolve(&mut info, &installed)
        .map_err(|err| SessionError::Fatal(format!("resolver error: {err}")))?
    {
        Resolution::Resolved => {}
        Resolution::Failed(messages) => return Err(SessionError::Resolution(messages)),
    }

    if info.is_noop() {
        ctx.operator.say(1, "Nothing to do");
        return Ok(());
    }

    confirm_transaction(
        &info.classify(),
        ctx.config.assume_yes,
        &ctx.operator,
        deps.input,
    )?;

    let engine = LocalEngine::new(ctx.layout.clone());
    if run_pipeline(ctx, &engine, &info)? == PipelineOutcome::Committed {
        run_post_actions(ctx, &info, deps.boot)?;
        ctx.operator.say(1, "Transaction complete");
    }
    Ok(())
}

fn run_read_only(
    cli: &Cli,
    ctx: &mut SessionContext,
    store: &RepoStore,
    packages: Vec<depot_core::RepoPackage>,
    installed: &depot_core::InstalledIndex,
) -> Result<(), SessionError> {
    match cli.command {
        Command::List | Command::Info | Command::CheckUpdate => {
            let set = assemble_candidates(packages, installed, &ctx.config.exclude, &cli.packages);
            let set = if cli.command == Command::CheckUpdate {
                CandidateSet {
                    updates: set.updates,
                    ..CandidateSet::default()
                }
            } else {
                set
            };
            for line in render_candidate_listing(&set, cli.command == Command::Info) {
                ctx.operator.say(1, &line);
            }
        }
        Command::Provides => {
            for token in &cli.packages {
                for package in find_providers(&packages, token) {
                    ctx.operator.say(
                        1,
                        &format!("{} {} : {}", package.id(), package.evr, package.summary),
                    );
                }
            }
        }
        Command::Search => {
            for package in search_packages(&packages, &cli.packages) {
                ctx.operator.say(
                    1,
                    &format!("{} {} : {}", package.id(), package.evr, package.summary),
                );
            }
        }
        Command::Grouplist => {
            let merged = merge_group_catalogs(
                store
                    .group_catalogs()
                    .map_err(|err| SessionError::Fatal(format!("cannot load groups: {err}")))?,
            );
            if merged.is_empty() {
                return Err(SessionError::NoGroups);
            }
            ctx.operator.say(1, "Available groups:");
            for group in merged.iter() {
                ctx.operator.say(1, &format!("  {} ({})", group.name, group.id));
            }
        }
        _ => {}
    }
    Ok(())
}

// Tolerant sessions skip package arguments that cannot be honored instead
// of aborting the whole request.
fn seed_install_requests(
    info: &mut TransactionInfo,
    args: &[String],
    set: &CandidateSet,
    ctx: &mut SessionContext,
) -> Result<(), SessionError> {
    for arg in args {
        match seed_installs(info, std::slice::from_ref(arg), set) {
            Err(err) if ctx.config.tolerant => {
                ctx.errors.say(1, &format!("skipping '{arg}': {err}"));
            }
            outcome => outcome?,
        }
    }
    Ok(())
}

fn seed_erase_requests(
    info: &mut TransactionInfo,
    args: &[String],
    installed: &depot_core::InstalledIndex,
    ctx: &mut SessionContext,
) -> Result<(), SessionError> {
    for arg in args {
        match seed_erases(info, std::slice::from_ref(arg), installed) {
            Err(err) if ctx.config.tolerant => {
                ctx.errors.say(1, &format!("skipping '{arg}': {err}"));
            }
            outcome => outcome?,
        }
    }
    Ok(())
}

fn expand_groups(store: &RepoStore, args: &[String]) -> Result<Vec<String>, SessionError> {
    let merged = merge_group_catalogs(
        store
            .group_catalogs()
            .map_err(|err| SessionError::Fatal(format!("cannot load groups: {err}")))?,
    );
    if merged.is_empty() {
        return Err(SessionError::NoGroups);
    }

    let mut names = Vec::new();
    for arg in args {
        match merged.get(arg) {
            Some(group) => names.extend(group.packages.iter().cloned()),
            None => return Err(SessionError::Fatal(format!("no group named '{arg}'"))),
        }
    }
    names.sort();
    names.dedup();
    Ok(names)
}
