use depot_core::TransactionInfo;
use depot_engine::{CommitEvent, ProblemFilter, TransactionEngine};

use crate::errors::SessionError;
use crate::render::ProgressHandle;
use crate::session::SessionContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineOutcome {
    // Dry-run succeeded but the session is not allowed to mutate the host.
    VerifiedOnly,
    Committed,
}

// The staged transaction pipeline. Every engine handle built here is closed
// before this function returns, success or failure.
pub fn run_pipeline(
    ctx: &mut SessionContext,
    engine: &dyn TransactionEngine,
    info: &TransactionInfo,
) -> Result<PipelineOutcome, SessionError> {
    verify_stage(engine, info)?;

    if !ctx.privileged {
        ctx.operator
            .say(1, "not running as root: transaction verified, not committed");
        return Ok(PipelineOutcome::VerifiedOnly);
    }

    commit_stage(ctx, engine, info)?;
    Ok(PipelineOutcome::Committed)
}

// Stage one: a throwaway handle verifies the set against the installed
// state without touching the host. A failed dry run always aborts; nothing
// softens it, and no commit-mode handle exists until it has passed.
fn verify_stage(
    engine: &dyn TransactionEngine,
    info: &TransactionInfo,
) -> Result<(), SessionError> {
    let mut handle = engine
        .build(info)
        .map_err(|err| SessionError::Fatal(format!("cannot prepare transaction: {err}")))?;

    let outcome = handle.verify();
    let close = handle.close();

    let problems =
        outcome.map_err(|err| SessionError::Fatal(format!("transaction verification: {err}")))?;
    close.map_err(|err| SessionError::Fatal(format!("cannot close transaction: {err}")))?;

    if problems.is_empty() {
        Ok(())
    } else {
        Err(SessionError::Verification(problems))
    }
}

// Stage two: the commit-mode handle, checked and ordered before commit.
// The disk-space filter is suppressed on this handle only. Commit errors
// are collected, not unwound; whatever mutated stays mutated.
fn commit_stage(
    ctx: &mut SessionContext,
    engine: &dyn TransactionEngine,
    info: &TransactionInfo,
) -> Result<(), SessionError> {
    let mut handle = engine
        .build(info)
        .map_err(|err| SessionError::Fatal(format!("cannot prepare transaction: {err}")))?;

    if !ctx.config.disk_space_check {
        handle.set_problem_filter(ProblemFilter::SkipDiskSpace);
    }

    let staged = handle.check().and_then(|()| handle.order());
    if let Err(err) = staged {
        let _ = handle.close();
        return Err(SessionError::Fatal(format!(
            "cannot stage transaction: {err}"
        )));
    }

    let meter = ctx.config.progress;
    let mut bar: Option<ProgressHandle> = None;
    let outcome = handle.commit(&mut |event| match event {
        CommitEvent::Start { total } => {
            if let Some(meter) = &meter {
                bar = Some(meter.start("commit", total as u64));
            }
        }
        CommitEvent::Package { .. } => {
            if let Some(bar) = &mut bar {
                bar.advance();
            }
        }
        CommitEvent::Done => {
            if let Some(bar) = bar.take() {
                bar.finish();
            }
        }
    });
    let close = handle.close();

    let errors =
        outcome.map_err(|err| SessionError::Fatal(format!("transaction commit: {err}")))?;
    close.map_err(|err| SessionError::Fatal(format!("cannot close transaction: {err}")))?;

    if errors.is_empty() {
        Ok(())
    } else {
        Err(SessionError::Commit(errors))
    }
}
