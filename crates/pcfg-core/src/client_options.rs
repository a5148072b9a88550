//! Feature flags and environment overrides under `clientOptions`

use std::collections::BTreeMap;

use pcfg_tree::{Key, NodeValue};

use crate::client::{self, ConfigClient};
use crate::error::{ConfigError, ConfigResult};
use crate::types::keys;

impl ConfigClient {
    /// Whether the feature at `path` (`features.<plugin>.<flag>`) is on
    ///
    /// An unset or empty flag is off.
    ///
    /// # Errors
    /// - [`ConfigError::InvalidFeaturePath`] for a malformed path
    /// - [`ConfigError::InvalidFeatureValue`] if the stored value is not a boolean
    pub fn is_feature_activated(&self, path: &str) -> ConfigResult<bool> {
        let (plugin, flag) = split_feature_path(path)?;
        self.store().read(|tx| -> ConfigResult<bool> {
            let value = client::scalar_text(tx.root(), &feature_key(plugin, flag)).unwrap_or("");
            if value.is_empty() {
                return Ok(false);
            }
            parse_bool(value).ok_or_else(|| ConfigError::InvalidFeatureValue {
                path: path.to_string(),
                value: value.to_string(),
            })
        })
    }

    /// Set feature `key` of `plugin` to `value`
    ///
    /// # Errors
    /// Returns error if the document cannot be loaded or persisted
    pub fn set_feature(&self, plugin: &str, key: &str, value: &str) -> ConfigResult<()> {
        self.store()
            .update(|tx| client::set_string(tx, &features_of(plugin), key, value).map(drop))
    }

    /// Delete feature `key` of `plugin`
    ///
    /// # Errors
    /// Returns error if the document cannot be loaded or persisted
    pub fn delete_feature(&self, plugin: &str, key: &str) -> ConfigResult<()> {
        self.store()
            .update(|tx| client::delete(tx, &features_of(plugin), key).map(drop))
    }

    /// Environment overrides; empty when none are configured
    ///
    /// Entries whose value is not a scalar are skipped.
    ///
    /// # Errors
    /// Returns error if the document cannot be loaded
    pub fn get_env_configurations(&self) -> ConfigResult<BTreeMap<String, String>> {
        self.store().read(|tx| -> ConfigResult<BTreeMap<String, String>> {
            let env = pcfg_tree::find(
                tx.root(),
                &[Key::any(keys::CLIENT_OPTIONS), Key::any(keys::ENV)],
            )
            .ok()
            .and_then(|node| node.as_mapping());
            let mut vars = BTreeMap::new();
            for (name, value) in env.into_iter().flatten() {
                match value.value() {
                    NodeValue::Scalar(scalar) if !scalar.is_null() => {
                        vars.insert(name.clone(), scalar.text().to_string());
                    }
                    NodeValue::Scalar(_) => {
                        vars.insert(name.clone(), String::new());
                    }
                    _ => tracing::warn!(variable = %name, "skipping non-scalar env value"),
                }
            }
            Ok(vars)
        })
    }

    /// Set environment override `key`
    ///
    /// # Errors
    /// Returns error if the document cannot be loaded or persisted
    pub fn set_env(&self, key: &str, value: &str) -> ConfigResult<()> {
        self.store()
            .update(|tx| client::set_string(tx, &env_section(), key, value).map(drop))
    }

    /// Delete environment override `key`
    ///
    /// # Errors
    /// Returns error if the document cannot be loaded or persisted
    pub fn delete_env(&self, key: &str) -> ConfigResult<()> {
        self.store()
            .update(|tx| client::delete(tx, &env_section(), key).map(drop))
    }
}

/// Split `features.<plugin>.<flag>` into plugin and flag
///
/// # Errors
/// Returns [`ConfigError::InvalidFeaturePath`] unless the path has exactly
/// three non-empty segments, the first being `features`
pub fn split_feature_path(path: &str) -> ConfigResult<(&str, &str)> {
    let mut parts = path.split('.');
    match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(keys::FEATURES), Some(plugin), Some(flag), None)
            if !plugin.is_empty() && !flag.is_empty() =>
        {
            Ok((plugin, flag))
        }
        _ => Err(ConfigError::InvalidFeaturePath(path.to_string())),
    }
}

fn features_of(plugin: &str) -> [Key; 3] {
    [
        Key::mapping(keys::CLIENT_OPTIONS),
        Key::mapping(keys::FEATURES),
        Key::mapping(plugin),
    ]
}

fn feature_key(plugin: &str, flag: &str) -> [Key; 4] {
    [
        Key::any(keys::CLIENT_OPTIONS),
        Key::any(keys::FEATURES),
        Key::any(plugin),
        Key::any(flag),
    ]
}

fn env_section() -> [Key; 2] {
    [Key::mapping(keys::CLIENT_OPTIONS), Key::mapping(keys::ENV)]
}

fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}
