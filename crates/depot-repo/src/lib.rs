use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use depot_core::{Evr, GroupCatalog, PackageGroup, RepoPackage};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoConfig {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub path: PathBuf,
    #[serde(default = "enabled_default")]
    pub enabled: bool,
    #[serde(default)]
    pub enable_groups: bool,
}

fn enabled_default() -> bool {
    true
}

const PACKAGES_FILE: &str = "packages.toml";
const GROUPS_FILE: &str = "groups.toml";

// Local repository metadata store. Metadata lives in each repo's directory;
// a per-repo copy is kept under the cache directory so cache-only sessions
// can run without touching the repos at all.
#[derive(Debug, Clone)]
pub struct RepoStore {
    repos: Vec<RepoConfig>,
    cache_dir: PathBuf,
    cache_only: bool,
}

impl RepoStore {
    pub fn new(repos: Vec<RepoConfig>, cache_dir: impl Into<PathBuf>, cache_only: bool) -> Self {
        Self {
            repos,
            cache_dir: cache_dir.into(),
            cache_only,
        }
    }

    pub fn apply_overrides(&mut self, enable: &[String], disable: &[String]) {
        for repo in &mut self.repos {
            if disable.iter().any(|id| id == &repo.id) {
                repo.enabled = false;
            }
            if enable.iter().any(|id| id == &repo.id) {
                repo.enabled = true;
            }
        }
    }

    pub fn list_enabled(&self) -> Vec<&RepoConfig> {
        let mut enabled: Vec<&RepoConfig> =
            self.repos.iter().filter(|repo| repo.enabled).collect();
        enabled.sort_by(|left, right| left.id.cmp(&right.id));
        enabled
    }

    pub fn load_packages(&self) -> Result<Vec<RepoPackage>> {
        let mut packages = Vec::new();
        for repo in self.list_enabled() {
            let raw = self.read_metadata(repo, PACKAGES_FILE)?;
            let file: PackagesFile = toml::from_str(&raw)
                .with_context(|| format!("failed parsing package metadata for '{}'", repo.id))?;
            for record in file.packages {
                packages.push(record.into_repo_package(&repo.id)?);
            }
        }
        Ok(packages)
    }

    // Group catalogs come only from repos that advertise group support. A
    // repo with groups enabled but no catalog file contributes nothing.
    pub fn group_catalogs(&self) -> Result<Vec<(String, GroupCatalog)>> {
        let mut catalogs = Vec::new();
        for repo in self.list_enabled() {
            if !repo.enable_groups {
                continue;
            }
            let path = self.metadata_path(repo, GROUPS_FILE);
            if !path.exists() {
                continue;
            }
            let raw = self.read_metadata(repo, GROUPS_FILE)?;
            let file: GroupsFile = toml::from_str(&raw)
                .with_context(|| format!("failed parsing group catalog for '{}'", repo.id))?;

            let mut catalog = GroupCatalog::new();
            for record in file.groups {
                catalog.insert(PackageGroup {
                    id: record.id,
                    name: record.name,
                    packages: record.packages,
                    repo: repo.id.clone(),
                });
            }
            catalogs.push((repo.id.clone(), catalog));
        }
        Ok(catalogs)
    }

    pub fn clean_cache(&self) -> Result<()> {
        if self.cache_dir.exists() {
            fs::remove_dir_all(&self.cache_dir).with_context(|| {
                format!("failed removing cache dir: {}", self.cache_dir.display())
            })?;
        }
        Ok(())
    }

    fn repo_cache_dir(&self, repo: &RepoConfig) -> PathBuf {
        self.cache_dir.join(&repo.id)
    }

    fn metadata_path(&self, repo: &RepoConfig, file: &str) -> PathBuf {
        if self.cache_only {
            self.repo_cache_dir(repo).join(file)
        } else {
            repo.path.join(file)
        }
    }

    fn read_metadata(&self, repo: &RepoConfig, file: &str) -> Result<String> {
        let path = self.metadata_path(repo, file);
        let raw = fs::read_to_string(&path).with_context(|| {
            format!(
                "failed reading metadata for repo '{}': {}",
                repo.id,
                path.display()
            )
        })?;
        if !self.cache_only {
            self.cache_copy(repo, file, &raw)?;
        }
        Ok(raw)
    }

    fn cache_copy(&self, repo: &RepoConfig, file: &str, raw: &str) -> Result<()> {
        let dir = self.repo_cache_dir(repo);
        fs::create_dir_all(&dir)
            .with_context(|| format!("failed creating cache dir: {}", dir.display()))?;
        let path = dir.join(file);
        fs::write(&path, raw)
            .with_context(|| format!("failed writing cache copy: {}", path.display()))
    }
}

#[derive(Debug, Deserialize)]
struct PackagesFile {
    #[serde(default)]
    packages: Vec<PackageRecord>,
}

#[derive(Debug, Deserialize)]
struct PackageRecord {
    name: String,
    arch: String,
    version: String,
    #[serde(default)]
    size: u64,
    #[serde(default)]
    summary: String,
    #[serde(default)]
    provides: Vec<String>,
    #[serde(default)]
    requires: Vec<String>,
}

impl PackageRecord {
    fn into_repo_package(self, repo_id: &str) -> Result<RepoPackage> {
        let evr = Evr::parse(&self.version)
            .with_context(|| format!("invalid version for package '{}'", self.name))?;
        Ok(RepoPackage {
            name: self.name,
            arch: self.arch,
            evr,
            size: self.size,
            summary: self.summary,
            provides: self.provides,
            requires: self.requires,
            repo: repo_id.to_string(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct GroupsFile {
    #[serde(default)]
    groups: Vec<GroupRecord>,
}

#[derive(Debug, Deserialize)]
struct GroupRecord {
    id: String,
    name: String,
    #[serde(default)]
    packages: Vec<String>,
}

pub fn write_packages_file(dir: &Path, raw: &str) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .with_context(|| format!("failed creating repo dir: {}", dir.display()))?;
    let path = dir.join(PACKAGES_FILE);
    fs::write(&path, raw).with_context(|| format!("failed writing {}", path.display()))?;
    Ok(path)
}

pub fn write_groups_file(dir: &Path, raw: &str) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .with_context(|| format!("failed creating repo dir: {}", dir.display()))?;
    let path = dir.join(GROUPS_FILE);
    fs::write(&path, raw).with_context(|| format!("failed writing {}", path.display()))?;
    Ok(path)
}
