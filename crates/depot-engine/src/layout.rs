use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

// All host paths derive from a single install root so --installroot
// relocates the whole footprint, config file included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostLayout {
    root: PathBuf,
}

impl HostLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> PathBuf {
        self.root.join("etc").join("depot.toml")
    }

    pub fn lock_path(&self) -> PathBuf {
        self.root.join("run").join("depot.pid")
    }

    pub fn log_path(&self) -> PathBuf {
        self.root.join("var").join("log").join("depot.log")
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.root.join("var").join("cache").join("depot")
    }

    pub fn state_dir(&self) -> PathBuf {
        self.root.join("var").join("lib").join("depot")
    }

    pub fn installed_state_dir(&self) -> PathBuf {
        self.state_dir().join("installed")
    }

    pub fn receipt_path(&self, name: &str, arch: &str) -> PathBuf {
        self.installed_state_dir()
            .join(format!("{name}.{arch}.receipt"))
    }

    pub fn ensure_base_dirs(&self) -> Result<()> {
        for dir in [
            self.root.join("run"),
            self.root.join("var").join("log"),
            self.cache_dir(),
            self.installed_state_dir(),
        ] {
            fs::create_dir_all(&dir)
                .with_context(|| format!("failed to create {}", dir.display()))?;
        }
        Ok(())
    }
}
