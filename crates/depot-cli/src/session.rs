use depot_engine::HostLayout;

use crate::cli::Command;
use crate::config::SessionConfig;
use crate::errors::SessionError;
use crate::logging::{AuditLog, LogStream, Logger};

// Everything a stage needs, derived once from the configuration and the
// effective identity. The configuration itself stays as the user supplied
// it; policy decisions land in derived fields.
pub struct SessionContext {
    pub config: SessionConfig,
    pub layout: HostLayout,
    pub privileged: bool,
    // Effective cache policy, not the raw -C flag.
    pub cache_only: bool,
    pub operator: Logger,
    pub errors: Logger,
    pub audit: Option<AuditLog>,
}

pub fn bootstrap(
    config: SessionConfig,
    command: Command,
    privileged: bool,
) -> Result<SessionContext, SessionError> {
    let layout = HostLayout::new(&config.install_root);

    // Policy order: identity first, then the clean command, then the flag.
    let cache_only = if !privileged {
        true
    } else if command == Command::Clean {
        true
    } else {
        config.cache_only
    };

    let operator = Logger::new(config.debug_level, LogStream::Stdout);
    let errors = Logger::new(config.error_level, LogStream::Stderr);

    // The persistent audit stream exists only for privileged sessions.
    let audit = if privileged {
        Some(
            AuditLog::open(&layout.log_path())
                .map_err(|err| SessionError::Fatal(format!("cannot open audit log: {err}")))?,
        )
    } else {
        None
    };

    Ok(SessionContext {
        config,
        layout,
        privileged,
        cache_only,
        operator,
        errors,
        audit,
    })
}
