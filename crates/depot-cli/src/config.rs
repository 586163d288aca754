use std::fs;
use std::path::{Path, PathBuf};

use depot_engine::HostLayout;
use depot_repo::RepoConfig;
use serde::Deserialize;

use crate::cli::Cli;
use crate::errors::SessionError;
use crate::render::ProgressMeter;

// Below this debug level no progress meter exists at all: the configuration
// carries no handle, so later stages have nothing to drive.
pub const PROGRESS_DEBUG_THRESHOLD: u32 = 2;

// Immutable after bootstrap. Command-line options win over the config file;
// nothing later in the session redefines a user-supplied value.
#[derive(Debug)]
pub struct SessionConfig {
    pub debug_level: u32,
    pub error_level: u32,
    pub assume_yes: bool,
    pub tolerant: bool,
    pub cache_only: bool,
    pub obsoletes: bool,
    pub disk_space_check: bool,
    pub exclude: Vec<String>,
    pub install_root: PathBuf,
    pub enable_repos: Vec<String>,
    pub disable_repos: Vec<String>,
    pub repos: Vec<RepoConfig>,
    pub progress: Option<ProgressMeter>,
}

#[derive(Debug, Deserialize, Default)]
struct ConfigFile {
    #[serde(default)]
    main: MainSection,
    #[serde(default)]
    repos: Vec<RepoConfig>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct MainSection {
    debug_level: u32,
    error_level: u32,
    assume_yes: bool,
    tolerant: bool,
    cache_only: bool,
    obsoletes: bool,
    disk_space_check: bool,
    exclude: Vec<String>,
}

impl Default for MainSection {
    fn default() -> Self {
        Self {
            debug_level: 2,
            error_level: 2,
            assume_yes: false,
            tolerant: false,
            cache_only: false,
            obsoletes: false,
            disk_space_check: true,
            exclude: Vec::new(),
        }
    }
}

// The -c option wins; otherwise the install root decides where the default
// config file is looked up.
pub fn default_config_path(install_root: &Path) -> PathBuf {
    HostLayout::new(install_root).config_path()
}

pub fn resolve_config_path(cli: &Cli) -> Result<PathBuf, SessionError> {
    if let Some(path) = &cli.config {
        return Ok(path.clone());
    }
    let root = cli
        .install_root
        .clone()
        .unwrap_or_else(|| PathBuf::from("/"));
    let default = default_config_path(&root);
    if is_readable(&default) {
        return Ok(default);
    }
    Err(SessionError::Config(
        "cannot find any configuration file".to_string(),
    ))
}

fn is_readable(path: &Path) -> bool {
    fs::metadata(path).is_ok()
}

pub fn load_session_config(cli: &Cli, path: &Path) -> Result<SessionConfig, SessionError> {
    let raw = fs::read_to_string(path).map_err(|err| {
        SessionError::Config(format!("cannot read {}: {err}", path.display()))
    })?;
    let file: ConfigFile = toml::from_str(&raw).map_err(|err| {
        SessionError::Config(format!("cannot parse {}: {err}", path.display()))
    })?;

    let debug_level = cli.debug_level.unwrap_or(file.main.debug_level);
    let error_level = cli.error_level.unwrap_or(file.main.error_level);

    let mut exclude = file.main.exclude;
    exclude.extend(cli.exclude.iter().cloned());

    Ok(SessionConfig {
        debug_level,
        error_level,
        assume_yes: cli.assume_yes || file.main.assume_yes,
        tolerant: cli.tolerant || file.main.tolerant,
        cache_only: cli.cache_only || file.main.cache_only,
        obsoletes: cli.obsoletes || file.main.obsoletes,
        disk_space_check: file.main.disk_space_check,
        exclude,
        install_root: cli
            .install_root
            .clone()
            .unwrap_or_else(|| PathBuf::from("/")),
        enable_repos: cli.enable_repo.clone(),
        disable_repos: cli.disable_repo.clone(),
        repos: file.repos,
        progress: (debug_level >= PROGRESS_DEBUG_THRESHOLD).then(ProgressMeter::new),
    })
}
