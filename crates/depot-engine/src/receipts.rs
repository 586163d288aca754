use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{anyhow, Context, Result};
use depot_core::{Evr, InstalledIndex, PackageId};

use crate::layout::HostLayout;

// One receipt file per installed package; the set of receipts is the
// installed-package database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledPackage {
    pub name: String,
    pub arch: String,
    pub evr: Evr,
    pub size: u64,
    pub installed_at_unix: u64,
}

impl InstalledPackage {
    pub fn id(&self) -> PackageId {
        PackageId::new(self.name.clone(), self.arch.clone())
    }
}

pub fn serialize_receipt(package: &InstalledPackage) -> String {
    format!(
        "name={}\narch={}\nevr={}\nsize={}\ninstalled_at_unix={}\n",
        package.name, package.arch, package.evr, package.size, package.installed_at_unix
    )
}

pub fn parse_receipt(raw: &str) -> Result<InstalledPackage> {
    let mut fields = BTreeMap::new();
    for line in raw.lines().map(str::trim).filter(|line| !line.is_empty()) {
        let (key, value) = line
            .split_once('=')
            .ok_or_else(|| anyhow!("invalid receipt line: {line}"))?;
        fields.insert(key.to_string(), value.to_string());
    }

    let take = |key: &str| -> Result<String> {
        fields
            .get(key)
            .cloned()
            .ok_or_else(|| anyhow!("missing receipt field: {key}"))
    };

    Ok(InstalledPackage {
        name: take("name")?,
        arch: take("arch")?,
        evr: Evr::parse(&take("evr")?)?,
        size: take("size")?
            .parse::<u64>()
            .context("invalid receipt field: size")?,
        installed_at_unix: take("installed_at_unix")?
            .parse::<u64>()
            .context("invalid receipt field: installed_at_unix")?,
    })
}

pub fn write_receipt(layout: &HostLayout, package: &InstalledPackage) -> Result<()> {
    let path = layout.receipt_path(&package.name, &package.arch);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(&path, serialize_receipt(package))
        .with_context(|| format!("failed to write receipt: {}", path.display()))
}

// Returns false when no receipt existed.
pub fn remove_receipt(layout: &HostLayout, name: &str, arch: &str) -> Result<bool> {
    let path = layout.receipt_path(name, arch);
    match fs::remove_file(&path) {
        Ok(()) => Ok(true),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(err) => {
            Err(err).with_context(|| format!("failed to remove receipt: {}", path.display()))
        }
    }
}

pub fn read_installed(layout: &HostLayout) -> Result<BTreeMap<PackageId, InstalledPackage>> {
    let dir = layout.installed_state_dir();
    let mut installed = BTreeMap::new();
    let entries = match fs::read_dir(&dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(installed),
        Err(err) => {
            return Err(err)
                .with_context(|| format!("failed to read installed state: {}", dir.display()));
        }
    };

    for entry in entries {
        let entry =
            entry.with_context(|| format!("failed to read installed state: {}", dir.display()))?;
        let path = entry.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some("receipt") {
            continue;
        }
        let raw = fs::read_to_string(&path)
            .with_context(|| format!("failed to read receipt: {}", path.display()))?;
        let package = parse_receipt(&raw)
            .with_context(|| format!("failed to parse receipt: {}", path.display()))?;
        installed.insert(package.id(), package);
    }
    Ok(installed)
}

pub fn installed_index(layout: &HostLayout) -> Result<InstalledIndex> {
    Ok(read_installed(layout)?
        .into_iter()
        .map(|(id, package)| (id, package.evr))
        .collect())
}

pub(crate) fn current_unix_timestamp() -> Result<u64> {
    Ok(SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .context("system time is before unix epoch")?
        .as_secs())
}
