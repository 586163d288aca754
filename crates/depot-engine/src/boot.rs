use anyhow::Result;
use depot_core::PackageId;

// Post-commit boot-loader reconciliation is delegated; this seam exists so
// the pipeline can trigger it after a kernel package changes.
pub trait BootConfigHook {
    fn sync_kernel_entries(&self, kernels: &[PackageId]) -> Result<()>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopBootHook;

impl BootConfigHook for NoopBootHook {
    fn sync_kernel_entries(&self, _kernels: &[PackageId]) -> Result<()> {
        Ok(())
    }
}
