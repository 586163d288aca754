use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageGroup {
    pub id: String,
    pub name: String,
    pub packages: Vec<String>,
    pub repo: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupCatalog {
    groups: BTreeMap<String, PackageGroup>,
}

impl GroupCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, group: PackageGroup) {
        self.groups.entry(group.id.clone()).or_insert(group);
    }

    pub fn get(&self, id: &str) -> Option<&PackageGroup> {
        self.groups.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PackageGroup> {
        self.groups.values()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

// Merge order is a declared tie-break: catalogs are taken in ascending
// repository-id order and the first catalog to define a group id wins.
pub fn merge_group_catalogs(mut catalogs: Vec<(String, GroupCatalog)>) -> GroupCatalog {
    catalogs.sort_by(|left, right| left.0.cmp(&right.0));

    let mut merged = GroupCatalog::new();
    for (_, catalog) in catalogs {
        for group in catalog.iter() {
            merged.insert(group.clone());
        }
    }
    merged
}
