use thiserror::Error;

pub const EXIT_LOCKED: u8 = 200;

// Every way a session can terminate early. Each variant owns its exit code;
// the dispatch layer is the only place that turns one into process exit.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("config error: {0}")]
    Config(String),

    #[error("existing lock: another copy is running as pid {owner}, aborting")]
    LockBusy { owner: u32 },

    #[error("unable to check whether the lock owner is still running: {0}")]
    LockProbe(String),

    #[error("error resolving dependencies")]
    Resolution(Vec<String>),

    #[error("exiting on operator request")]
    Declined,

    #[error("transaction verification failed")]
    Verification(Vec<String>),

    #[error("errors were encountered during the transaction")]
    Commit(Vec<String>),

    #[error("no groups provided or accessible on any repository")]
    NoGroups,

    #[error("{0}")]
    Fatal(String),
}

impl SessionError {
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::LockBusy { .. } | Self::LockProbe(_) => EXIT_LOCKED,
            _ => 1,
        }
    }

    // Per-item messages that precede the headline (resolver output, commit
    // errors, verification problems).
    pub fn detail(&self) -> &[String] {
        match self {
            Self::Resolution(messages)
            | Self::Verification(messages)
            | Self::Commit(messages) => messages,
            _ => &[],
        }
    }
}
