mod evr;
mod groups;
mod package;
mod pattern;
mod txinfo;

pub use evr::Evr;
pub use groups::{merge_group_catalogs, GroupCatalog, PackageGroup};
pub use package::{Candidate, CandidateSet, PackageId, RepoPackage};
pub use pattern::{is_excluded, wildcard_match};
pub use txinfo::{
    ActionLists, ActionState, DependencySolver, InstalledIndex, PendingAction, Resolution,
    TransactionInfo,
};

#[cfg(test)]
mod tests;
