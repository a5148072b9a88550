//! Locked read-modify-write access to the shared document
//!
//! Every operation runs as: acquire lock → resolve layout and strategies →
//! load → apply → persist if changed → release lock.

use pcfg_patch::PatchStrategies;
use pcfg_tree::{Document, Node};

use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};
use crate::layout::{Layout, StoredDocument};
use crate::lock::LockGuard;
use crate::metadata::Metadata;

/// Entry point for document access
#[derive(Debug, Clone)]
pub struct ConfigStore {
    config: StoreConfig,
}

impl ConfigStore {
    /// Create store for a configuration
    #[inline]
    #[must_use]
    pub fn new(config: StoreConfig) -> Self {
        Self { config }
    }

    /// Store configured from the environment
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(StoreConfig::from_env())
    }

    /// Store configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Current metadata, defaults when unavailable
    #[must_use]
    pub fn metadata(&self) -> Metadata {
        Metadata::load_or_default(&self.config.metadata_path())
    }

    /// Layout to use given `metadata`
    ///
    /// The configured override wins, then the metadata setting, then
    /// [`Layout::Legacy`].
    #[must_use]
    pub fn resolve_layout(&self, metadata: &Metadata) -> Layout {
        self.config
            .layout
            .or_else(|| metadata.use_unified_config().map(Layout::from_next_gen_flag))
            .unwrap_or_default()
    }

    /// Acquire the store lock
    ///
    /// # Errors
    /// Returns [`StoreError::LockTimeout`] if the lock stays held past the
    /// configured timeout
    pub fn lock(&self) -> StoreResult<LockGuard> {
        LockGuard::acquire(
            &self.config.lock_path(),
            self.config.lock_timeout,
            self.config.lock_poll_interval,
        )
    }

    /// Load the document without taking the lock
    ///
    /// Callers that go on to persist must hold [`ConfigStore::lock`] for
    /// the whole load-modify-persist sequence.
    ///
    /// # Errors
    /// Returns [`StoreError::Io`] if a backing file cannot be read
    pub fn load(&self) -> StoreResult<Transaction> {
        let metadata = self.metadata();
        let layout = self.resolve_layout(&metadata);
        let stored = layout.load(&self.config.dir)?;
        tracing::debug!(dir = %self.config.dir.display(), %layout, "loaded document");
        Ok(Transaction {
            stored,
            strategies: metadata.strategies().clone(),
            changed: false,
        })
    }

    /// Run a read-only operation against a consistent snapshot
    ///
    /// The lock is held while loading so both legacy files are read from
    /// the same state.
    ///
    /// # Errors
    /// Returns the operation's error, or a store error converted into it
    pub fn read<T, E>(&self, op: impl FnOnce(&Transaction) -> Result<T, E>) -> Result<T, E>
    where
        E: From<StoreError>,
    {
        let tx = {
            let _guard = self.lock()?;
            self.load()?
        };
        op(&tx)
    }

    /// Run a mutation under the lock, persisting once if it recorded a change
    ///
    /// When `op` fails nothing is written.
    ///
    /// # Errors
    /// Returns the operation's error, or a store error converted into it
    pub fn update<T, E>(&self, op: impl FnOnce(&mut Transaction) -> Result<T, E>) -> Result<T, E>
    where
        E: From<StoreError>,
    {
        let _guard = self.lock()?;
        let mut tx = self.load()?;
        let out = op(&mut tx)?;
        if tx.changed {
            let written = tx.stored.persist()?;
            tracing::debug!(layout = %tx.layout(), files = written, "persisted changes");
        } else {
            tracing::debug!(layout = %tx.layout(), "no changes to persist");
        }
        Ok(out)
    }
}

/// One loaded document plus the strategies in effect for this operation
#[derive(Debug, Clone)]
pub struct Transaction {
    stored: StoredDocument,
    strategies: PatchStrategies,
    changed: bool,
}

impl Transaction {
    /// Loaded document
    #[inline]
    #[must_use]
    pub fn document(&self) -> &Document {
        self.stored.document()
    }

    /// Mutable loaded document
    ///
    /// Changes are only persisted once recorded with
    /// [`Transaction::record`].
    #[inline]
    pub fn document_mut(&mut self) -> &mut Document {
        self.stored.document_mut()
    }

    /// Root node
    #[inline]
    #[must_use]
    pub fn root(&self) -> &Node {
        self.stored.document().root()
    }

    /// Mutable root node
    #[inline]
    pub fn root_mut(&mut self) -> &mut Node {
        self.stored.document_mut().root_mut()
    }

    /// Patch strategies loaded for this operation
    #[inline]
    #[must_use]
    pub fn strategies(&self) -> &PatchStrategies {
        &self.strategies
    }

    /// Root node and strategies at once, for patch calls
    #[inline]
    pub fn parts_mut(&mut self) -> (&mut Node, &PatchStrategies) {
        (self.stored.document_mut().root_mut(), &self.strategies)
    }

    /// Layout the document was loaded with
    #[inline]
    #[must_use]
    pub fn layout(&self) -> Layout {
        self.stored.layout()
    }

    /// Record the outcome of a mutation, returning it
    #[inline]
    pub fn record(&mut self, changed: bool) -> bool {
        self.changed |= changed;
        changed
    }

    /// Whether any recorded mutation changed the document
    #[inline]
    #[must_use]
    pub fn is_changed(&self) -> bool {
        self.changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{METADATA_FILE, NEXT_GEN_FILE};
    use std::fs;
    use std::time::Duration;
    use tempfile::TempDir;

    fn store(dir: &TempDir) -> ConfigStore {
        ConfigStore::new(
            StoreConfig::new(dir.path()).with_lock_poll_interval(Duration::from_millis(5)),
        )
    }

    #[test]
    fn layout_resolution_order() {
        let dir = TempDir::new().unwrap();
        let plain = store(&dir);
        assert_eq!(plain.resolve_layout(&Metadata::default()), Layout::Legacy);
        let unified = Metadata::default().with_unified_config(true);
        assert_eq!(plain.resolve_layout(&unified), Layout::NextGen);
        let pinned = ConfigStore::new(StoreConfig::new(dir.path()).with_layout(Layout::Legacy));
        assert_eq!(pinned.resolve_layout(&unified), Layout::Legacy);
    }

    #[test]
    fn metadata_file_selects_layout() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(METADATA_FILE),
            "configMetadata:\n  settings:\n    useUnifiedConfig: true\n",
        )
        .unwrap();
        let tx = store(&dir).load().unwrap();
        assert_eq!(tx.layout(), Layout::NextGen);
    }

    #[test]
    fn unrecorded_changes_are_not_persisted() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        store
            .update(|tx| -> StoreResult<()> {
                tx.root_mut()
                    .as_mapping_mut()
                    .unwrap()
                    .insert("contexts".into(), Node::sequence(Vec::new()));
                Ok(())
            })
            .unwrap();
        assert!(!dir.path().join(NEXT_GEN_FILE).exists());
    }

    #[test]
    fn recorded_changes_are_persisted() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        store
            .update(|tx| -> StoreResult<()> {
                tx.root_mut()
                    .as_mapping_mut()
                    .unwrap()
                    .insert("contexts".into(), Node::sequence(Vec::new()));
                tx.record(true);
                Ok(())
            })
            .unwrap();
        assert_eq!(
            fs::read_to_string(dir.path().join(NEXT_GEN_FILE)).unwrap(),
            "contexts: []\n"
        );
    }

    #[test]
    fn failed_update_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let result = store.update(|tx| -> StoreResult<()> {
            tx.record(true);
            Err(StoreError::Serialization("abort".into()))
        });
        assert!(result.is_err());
        assert!(!dir.path().join(NEXT_GEN_FILE).exists());
    }

    #[test]
    fn read_sees_persisted_state() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(NEXT_GEN_FILE), "currentContext:\n  kubernetes: a\n").unwrap();
        let name = store(&dir)
            .read(|tx| -> StoreResult<Option<String>> {
                Ok(tx
                    .root()
                    .get("currentContext")
                    .and_then(|c| c.get_str("kubernetes"))
                    .map(str::to_string))
            })
            .unwrap();
        assert_eq!(name.as_deref(), Some("a"));
    }
}
