use depot_core::{ActionLists, ActionState, PackageId, TransactionInfo};
use depot_engine::BootConfigHook;
use serde_json::json;

use crate::errors::SessionError;
use crate::session::SessionContext;

fn is_kernel_package(id: &PackageId) -> bool {
    id.name == "kernel" || id.name.starts_with("kernel-")
}

// After a committed transaction: reconcile boot configuration if a kernel
// package changed, then write the classified lists to the operator and
// audit streams.
pub fn run_post_actions(
    ctx: &mut SessionContext,
    info: &TransactionInfo,
    boot: &dyn BootConfigHook,
) -> Result<(), SessionError> {
    let kernels: Vec<PackageId> = info
        .iter()
        .filter(|(_, action)| action.state.mutates() && action.state != ActionState::Erase)
        .map(|(id, _)| id.clone())
        .filter(is_kernel_package)
        .collect();
    if !kernels.is_empty() {
        boot.sync_kernel_entries(&kernels)
            .map_err(|err| SessionError::Fatal(format!("cannot update boot config: {err}")))?;
    }

    let lists = info.classify();
    log_action_lists(ctx, &lists)?;
    Ok(())
}

fn log_action_lists(ctx: &mut SessionContext, lists: &ActionLists) -> Result<(), SessionError> {
    for (label, entries) in [
        ("installed", &lists.install),
        ("updated", &lists.update),
        ("erased", &lists.erase),
    ] {
        for (id, evr) in entries {
            ctx.operator.say(2, &format!("{label}: {id} {evr}"));
        }
    }
    for id in lists
        .update_displaced
        .iter()
        .chain(lists.erase_displaced.iter())
    {
        ctx.operator.say(2, &format!("displaced: {id}"));
    }

    if let Some(audit) = &mut ctx.audit {
        let entry = |entries: &[(PackageId, depot_core::Evr)]| -> Vec<String> {
            entries
                .iter()
                .map(|(id, evr)| format!("{id} {evr}"))
                .collect()
        };
        audit
            .record(
                "commit",
                json!({
                    "installed": entry(&lists.install),
                    "updated": entry(&lists.update),
                    "erased": entry(&lists.erase),
                    "displaced": lists
                        .update_displaced
                        .iter()
                        .chain(lists.erase_displaced.iter())
                        .map(|id| id.to_string())
                        .collect::<Vec<String>>(),
                }),
            )
            .map_err(|err| SessionError::Fatal(format!("cannot write audit log: {err}")))?;
    }

    Ok(())
}
