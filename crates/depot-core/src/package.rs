use std::fmt;

use crate::evr::Evr;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PackageId {
    pub name: String,
    pub arch: String,
}

impl PackageId {
    pub fn new(name: impl Into<String>, arch: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arch: arch.into(),
        }
    }
}

impl fmt::Display for PackageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.name, self.arch)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoPackage {
    pub name: String,
    pub arch: String,
    pub evr: Evr,
    pub size: u64,
    pub summary: String,
    pub provides: Vec<String>,
    pub requires: Vec<String>,
    pub repo: String,
}

impl RepoPackage {
    pub fn id(&self) -> PackageId {
        PackageId::new(self.name.clone(), self.arch.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub package: RepoPackage,
    pub installed: bool,
}

impl Candidate {
    pub fn id(&self) -> PackageId {
        self.package.id()
    }

    pub fn evr(&self) -> &Evr {
        &self.package.evr
    }
}

// Candidates split the way the operator sees them: packages with a newer
// version than the installed one, packages the host has never seen, and the
// remaining available pool.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidateSet {
    pub updates: Vec<Candidate>,
    pub fresh: Vec<Candidate>,
    pub available: Vec<Candidate>,
}

impl CandidateSet {
    pub fn is_empty(&self) -> bool {
        self.updates.is_empty() && self.fresh.is_empty() && self.available.is_empty()
    }

    pub fn len(&self) -> usize {
        self.updates.len() + self.fresh.len() + self.available.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Candidate> {
        self.updates
            .iter()
            .chain(self.fresh.iter())
            .chain(self.available.iter())
    }
}
