//! Client handle and document helpers shared by the entity operations

use serde::de::DeserializeOwned;
use serde::Serialize;

use pcfg_patch::{find_entity, remove_entity, remove_entry, set_entry, upsert_entity};
use pcfg_store::{ConfigStore, StoreConfig, Transaction};
use pcfg_tree::{find, find_mut, FindOptions, Key, Node, NodePath};

use crate::error::ConfigResult;

/// Entry point for context, server and client option operations
///
/// Every method is one locked operation against the store: the document
/// is loaded fresh, changed in memory and written back once, only if
/// something changed.
#[derive(Debug, Clone)]
pub struct ConfigClient {
    store: ConfigStore,
}

impl ConfigClient {
    /// Create client over a store
    #[inline]
    #[must_use]
    pub fn new(store: ConfigStore) -> Self {
        Self { store }
    }

    /// Create client for a store configuration
    #[inline]
    #[must_use]
    pub fn from_config(config: StoreConfig) -> Self {
        Self::new(ConfigStore::new(config))
    }

    /// Create client configured from the environment
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(ConfigStore::from_env())
    }

    /// Underlying store
    #[inline]
    #[must_use]
    pub fn store(&self) -> &ConfigStore {
        &self.store
    }
}

/// Whether a top-level section is missing or empty
pub(crate) fn is_unset(root: &Node, section: &str) -> bool {
    root.get(section).map_or(true, Node::is_null)
}

/// Entities stored under `section`
pub(crate) fn collection<'a>(root: &'a Node, section: &str) -> ConfigResult<&'a [Node]> {
    if is_unset(root, section) {
        return Ok(&[]);
    }
    let node = find(root, &[Key::sequence(section)])?;
    Ok(node.as_sequence().map_or(&[][..], Vec::as_slice))
}

/// Entity `name` under `section`, converted to its typed form
pub(crate) fn entity<T: DeserializeOwned>(
    root: &Node,
    section: &str,
    name: &str,
) -> ConfigResult<Option<T>> {
    if is_unset(root, section) {
        return Ok(None);
    }
    let node = find(root, &[Key::sequence(section)])?;
    find_entity(node, name)
        .map(|found| found.deserialize_into::<T>().map_err(Into::into))
        .transpose()
}

/// Every entity under `section`, converted to its typed form
pub(crate) fn entities<T: DeserializeOwned>(root: &Node, section: &str) -> ConfigResult<Vec<T>> {
    collection(root, section)?
        .iter()
        .map(|node| node.deserialize_into::<T>().map_err(Into::into))
        .collect()
}

/// Insert or update an entity under `section`, recording the change
pub(crate) fn upsert<T: Serialize>(
    tx: &mut Transaction,
    section: &str,
    value: &T,
) -> ConfigResult<bool> {
    let incoming = Node::from_serialize(value)?;
    let (root, strategies) = tx.parts_mut();
    let items = find_mut(root, &[Key::sequence(section)], FindOptions::force_create())?;
    let changed = upsert_entity(items, &incoming, &NodePath::single(section), strategies)?;
    Ok(tx.record(changed))
}

/// Remove entity `name` from `section`, recording the change
pub(crate) fn remove(tx: &mut Transaction, section: &str, name: &str) -> ConfigResult<bool> {
    if is_unset(tx.root(), section) {
        return Ok(false);
    }
    let items = find_mut(tx.root_mut(), &[Key::sequence(section)], FindOptions::new())?;
    let removed = remove_entity(items, name);
    Ok(tx.record(removed))
}

/// Write a string entry under `parent`, recording the change
pub(crate) fn set_string(
    tx: &mut Transaction,
    parent: &[Key],
    key: &str,
    value: &str,
) -> ConfigResult<bool> {
    let changed = set_entry(tx.root_mut(), parent, key, Node::string(value))?;
    Ok(tx.record(changed))
}

/// Delete an entry under `parent`, recording the change
pub(crate) fn delete(tx: &mut Transaction, parent: &[Key], key: &str) -> ConfigResult<bool> {
    let removed = remove_entry(tx.root_mut(), parent, key)?;
    Ok(tx.record(removed))
}

/// Text of the scalar at `keys`, if any
pub(crate) fn scalar_text<'a>(root: &'a Node, keys: &[Key]) -> Option<&'a str> {
    find(root, keys).ok()?.as_scalar().map(pcfg_tree::Scalar::text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pcfg_tree::Document;

    #[test]
    fn unset_sections_read_as_empty() {
        let doc = Document::parse("contexts:\nservers: []\n").unwrap();
        assert!(is_unset(doc.root(), "contexts"));
        assert!(is_unset(doc.root(), "missing"));
        assert!(!is_unset(doc.root(), "servers"));
        assert!(collection(doc.root(), "contexts").unwrap().is_empty());
    }

    #[test]
    fn wrong_section_kind_is_reported() {
        let doc = Document::parse("contexts: oops\n").unwrap();
        let err = collection(doc.root(), "contexts").unwrap_err();
        assert!(err.is_schema_mismatch());
    }

    #[test]
    fn scalar_text_reads_nested_values() {
        let doc = Document::parse("clientOptions:\n  env:\n    A: '1'\n").unwrap();
        let keys = [Key::any("clientOptions"), Key::any("env"), Key::any("A")];
        assert_eq!(scalar_text(doc.root(), &keys), Some("1"));
        assert_eq!(scalar_text(doc.root(), &keys[..2]), None);
    }
}
