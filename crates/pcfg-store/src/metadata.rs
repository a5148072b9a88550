//! Patch strategy and layout metadata
//!
//! ```yaml
//! configMetadata:
//!   patchStrategy:
//!     contexts.discoverySources: replace
//!   settings:
//!     useUnifiedConfig: "true"
//! ```

use std::fs;
use std::io;
use std::path::Path;

use pcfg_patch::PatchStrategies;
use pcfg_tree::{find, Document, Key, Node};

use crate::config::parse_flag;
use crate::error::{StoreError, StoreResult};

/// Parsed metadata document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    strategies: PatchStrategies,
    use_unified_config: Option<bool>,
}

impl Metadata {
    /// Metadata with the given strategies and no layout setting
    #[inline]
    #[must_use]
    pub fn new(strategies: PatchStrategies) -> Self {
        Self {
            strategies,
            use_unified_config: None,
        }
    }

    /// Read metadata from `path`
    ///
    /// # Errors
    /// Returns [`StoreError::MetadataUnavailable`] if the file is missing,
    /// unreadable or not valid YAML
    pub fn load(path: &Path) -> StoreResult<Self> {
        let unavailable = |reason: String| StoreError::MetadataUnavailable {
            path: path.to_path_buf(),
            reason,
        };
        let text = fs::read_to_string(path).map_err(|err| match err.kind() {
            io::ErrorKind::NotFound => unavailable("file not found".to_string()),
            _ => unavailable(err.to_string()),
        })?;
        let doc = Document::parse(&text).map_err(|err| unavailable(err.to_string()))?;
        Ok(Self::from_document(&doc))
    }

    /// Read metadata from `path`, falling back to defaults
    ///
    /// A missing file is expected and logged at debug level; any other
    /// failure is logged as a warning.
    #[must_use]
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(metadata) => metadata,
            Err(err) => {
                if path.exists() {
                    tracing::warn!(error = %err, "using default patch strategies");
                } else {
                    tracing::debug!(error = %err, "using default patch strategies");
                }
                Self::default()
            }
        }
    }

    /// Extract metadata from a parsed document
    ///
    /// Missing sections are treated as empty.
    #[must_use]
    pub fn from_document(doc: &Document) -> Self {
        let section = |name: &str| {
            find(doc.root(), &[Key::mapping("configMetadata"), Key::any(name)]).ok()
        };
        let strategies = section("patchStrategy")
            .map(PatchStrategies::from_node)
            .unwrap_or_default();
        let use_unified_config = section("settings")
            .and_then(|settings| settings.get("useUnifiedConfig"))
            .and_then(flag_value);
        Self {
            strategies,
            use_unified_config,
        }
    }

    /// Configured patch strategies
    #[inline]
    #[must_use]
    pub fn strategies(&self) -> &PatchStrategies {
        &self.strategies
    }

    /// `useUnifiedConfig` setting, if present and valid
    #[inline]
    #[must_use]
    pub fn use_unified_config(&self) -> Option<bool> {
        self.use_unified_config
    }

    /// With `useUnifiedConfig` setting
    #[inline]
    #[must_use]
    pub fn with_unified_config(mut self, unified: bool) -> Self {
        self.use_unified_config = Some(unified);
        self
    }
}

fn flag_value(node: &Node) -> Option<bool> {
    let scalar = node.as_scalar()?;
    if let Some(b) = scalar.as_bool() {
        return Some(b);
    }
    let parsed = parse_flag(scalar.text());
    if parsed.is_none() {
        tracing::warn!(value = scalar.text(), "ignoring invalid useUnifiedConfig setting");
    }
    parsed
}

#[cfg(test)]
mod tests {
    use super::*;
    use pcfg_patch::PatchStrategy;
    use tempfile::TempDir;

    const SAMPLE: &str = "\
configMetadata:
  patchStrategy:
    contexts.discoverySources: replace
    servers.discoverySources: Replace
  settings:
    useUnifiedConfig: 'true'
";

    #[test]
    fn parses_strategies_and_settings() {
        let metadata = Metadata::from_document(&Document::parse(SAMPLE).unwrap());
        assert_eq!(metadata.strategies().len(), 2);
        assert_eq!(
            metadata
                .strategies()
                .strategy_for(&"contexts.discoverySources".parse().unwrap()),
            PatchStrategy::Replace
        );
        assert_eq!(metadata.use_unified_config(), Some(true));
    }

    #[test]
    fn missing_sections_are_empty() {
        let metadata = Metadata::from_document(&Document::parse("other: 1\n").unwrap());
        assert_eq!(metadata, Metadata::default());
    }

    #[test]
    fn invalid_setting_is_ignored() {
        let doc = Document::parse("configMetadata:\n  settings:\n    useUnifiedConfig: sometimes\n")
            .unwrap();
        assert_eq!(Metadata::from_document(&doc).use_unified_config(), None);
    }

    #[test]
    fn missing_file_is_unavailable_and_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".config-metadata.yaml");
        assert!(matches!(
            Metadata::load(&path),
            Err(StoreError::MetadataUnavailable { .. })
        ));
        assert_eq!(Metadata::load_or_default(&path), Metadata::default());
    }

    #[test]
    fn malformed_file_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".config-metadata.yaml");
        fs::write(&path, "configMetadata: [oops\n").unwrap();
        assert!(Metadata::load(&path).is_err());
        assert!(Metadata::load_or_default(&path).strategies().is_empty());
    }
}
