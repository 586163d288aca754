use std::path::PathBuf;

use clap::{Parser, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "depot")]
#[command(version)]
#[command(about = "Host package-management client", long_about = None)]
pub struct Cli {
    /// Configuration file path
    #[arg(short = 'c', value_name = "path")]
    pub config: Option<PathBuf>,

    /// Sleep up to this many minutes before starting
    #[arg(short = 'R', value_name = "minutes")]
    pub random_wait: Option<u64>,

    /// Error verbosity level
    #[arg(short = 'e', value_name = "level")]
    pub error_level: Option<u32>,

    /// Debug verbosity level
    #[arg(short = 'd', value_name = "level")]
    pub debug_level: Option<u32>,

    /// Assume yes to all confirmations
    #[arg(short = 'y')]
    pub assume_yes: bool,

    /// Be tolerant about per-package command errors
    #[arg(short = 't', long = "tolerant")]
    pub tolerant: bool,

    /// Run entirely from the metadata cache
    #[arg(short = 'C')]
    pub cache_only: bool,

    /// Alternate install root
    #[arg(long = "installroot", value_name = "path")]
    pub install_root: Option<PathBuf>,

    /// Enable a repository for this run (repeatable)
    #[arg(long = "enablerepo", value_name = "id")]
    pub enable_repo: Vec<String>,

    /// Disable a repository for this run (repeatable)
    #[arg(long = "disablerepo", value_name = "id")]
    pub disable_repo: Vec<String>,

    /// Exclude packages matching this pattern (repeatable)
    #[arg(long = "exclude", value_name = "pattern")]
    pub exclude: Vec<String>,

    /// Enable obsoletes handling during updates
    #[arg(long = "obsoletes")]
    pub obsoletes: bool,

    #[arg(value_enum, value_name = "command")]
    pub command: Command,

    #[arg(value_name = "package", trailing_var_arg = true)]
    pub packages: Vec<String>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Update,
    Upgrade,
    Install,
    Info,
    List,
    Erase,
    Remove,
    Grouplist,
    Groupupdate,
    Groupinstall,
    Clean,
    Provides,
    CheckUpdate,
    Search,
}

impl Command {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Update => "update",
            Self::Upgrade => "upgrade",
            Self::Install => "install",
            Self::Info => "info",
            Self::List => "list",
            Self::Erase => "erase",
            Self::Remove => "remove",
            Self::Grouplist => "grouplist",
            Self::Groupupdate => "groupupdate",
            Self::Groupinstall => "groupinstall",
            Self::Clean => "clean",
            Self::Provides => "provides",
            Self::CheckUpdate => "check-update",
            Self::Search => "search",
        }
    }

    // erase/remove and update/upgrade are spelled two ways.
    pub fn is_erase(&self) -> bool {
        matches!(self, Self::Erase | Self::Remove)
    }

    pub fn is_update(&self) -> bool {
        matches!(self, Self::Update | Self::Upgrade)
    }

    pub fn is_group(&self) -> bool {
        matches!(self, Self::Grouplist | Self::Groupupdate | Self::Groupinstall)
    }

    // Commands that only inspect state: no lock-protected mutation, no
    // transaction pipeline.
    pub fn is_read_only(&self) -> bool {
        matches!(
            self,
            Self::Info
                | Self::List
                | Self::Provides
                | Self::Search
                | Self::CheckUpdate
                | Self::Grouplist
        )
    }
}
