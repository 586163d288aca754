mod boot;
mod engine;
mod layout;
mod lock;
mod receipts;

pub use boot::{BootConfigHook, NoopBootHook};
pub use engine::{
    CommitEvent, EngineTransaction, LocalEngine, ProblemFilter, TransactionEngine,
};
pub use layout::HostLayout;
pub use lock::{HostProbe, LockAcquire, ProcessProbe, SessionLock};
pub use receipts::{
    installed_index, parse_receipt, read_installed, remove_receipt, serialize_receipt,
    write_receipt, InstalledPackage,
};
