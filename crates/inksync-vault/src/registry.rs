//! Name-indexed set of vaults served by one process.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::{Result, VaultError};
use crate::vault::Vault;

/// Maps wire names to vaults. Built once at startup, then shared read-only.
#[derive(Debug, Default, Clone)]
pub struct VaultRegistry {
    vaults: BTreeMap<String, Arc<Vault>>,
}

impl VaultRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a vault under its own name.
    pub fn insert(&mut self, vault: Vault) -> Result<Arc<Vault>> {
        let name = vault.name().to_string();
        if self.vaults.contains_key(&name) {
            return Err(VaultError::DuplicateVault(name));
        }
        let vault = Arc::new(vault);
        self.vaults.insert(name, vault.clone());
        Ok(vault)
    }

    /// Look up a vault by name.
    pub fn get(&self, name: &str) -> Result<Arc<Vault>> {
        self.vaults
            .get(name)
            .cloned()
            .ok_or_else(|| VaultError::UnknownVault(name.to_string()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.vaults.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.vaults.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vaults.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inksync_store::{MemoryFilesystem, MemoryStore};

    fn vault(name: &str) -> Vault {
        Vault::new(name, MemoryStore::new(), MemoryFilesystem::new())
    }

    #[test]
    fn test_insert_and_get() {
        let mut registry = VaultRegistry::new();
        registry.insert(vault("notes")).unwrap();
        registry.insert(vault("journal")).unwrap();

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get("notes").unwrap().name(), "notes");
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["journal", "notes"]);
        assert!(matches!(registry.get("other"), Err(VaultError::UnknownVault(_))));
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let mut registry = VaultRegistry::new();
        registry.insert(vault("notes")).unwrap();
        assert!(matches!(
            registry.insert(vault("notes")),
            Err(VaultError::DuplicateVault(_))
        ));
    }
}
