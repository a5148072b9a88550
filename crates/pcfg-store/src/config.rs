//! Store configuration

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::layout::Layout;

/// Legacy main document
pub const CONFIG_FILE: &str = "config.yaml";
/// Next-gen document (also holds the context sections under the legacy layout)
pub const NEXT_GEN_FILE: &str = "config-ng.yaml";
/// Patch strategy and layout metadata
pub const METADATA_FILE: &str = ".config-metadata.yaml";
/// Lock file guarding both documents
pub const LOCK_FILE: &str = ".config.lock";

/// Environment variable naming the configuration directory
pub const ENV_CONFIG_DIR: &str = "PCFG_CONFIG_DIR";
/// Environment variable selecting the next-gen layout
pub const ENV_USE_NEXT_GEN: &str = "PCFG_USE_NEXT_GEN_CONFIG";

/// Where and how the store reads and writes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Directory holding the documents, metadata and lock file
    pub dir: PathBuf,
    /// Longest wait for the lock before failing
    pub lock_timeout: Duration,
    /// Delay between lock attempts
    pub lock_poll_interval: Duration,
    /// Fixed layout; `None` defers to metadata, then legacy
    pub layout: Option<Layout>,
}

impl StoreConfig {
    /// Configuration rooted at `dir` with default timings
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            ..Self::default()
        }
    }

    /// Configuration from `PCFG_CONFIG_DIR` and `PCFG_USE_NEXT_GEN_CONFIG`
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Configuration from an arbitrary variable source
    ///
    /// An unparsable layout flag is logged and ignored.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(dir) = lookup(ENV_CONFIG_DIR).filter(|d| !d.trim().is_empty()) {
            config.dir = PathBuf::from(dir);
        }
        if let Some(raw) = lookup(ENV_USE_NEXT_GEN) {
            match parse_flag(&raw) {
                Some(next_gen) => config.layout = Some(Layout::from_next_gen_flag(next_gen)),
                None => tracing::warn!(
                    variable = ENV_USE_NEXT_GEN,
                    value = %raw,
                    "ignoring unparsable layout flag"
                ),
            }
        }
        config
    }

    /// With lock timeout
    #[inline]
    #[must_use]
    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    /// With lock poll interval
    #[inline]
    #[must_use]
    pub fn with_lock_poll_interval(mut self, interval: Duration) -> Self {
        self.lock_poll_interval = interval;
        self
    }

    /// With fixed layout
    #[inline]
    #[must_use]
    pub fn with_layout(mut self, layout: Layout) -> Self {
        self.layout = Some(layout);
        self
    }

    /// Path of a file inside the configuration directory
    #[inline]
    #[must_use]
    pub fn file(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    /// Path of the metadata document
    #[inline]
    #[must_use]
    pub fn metadata_path(&self) -> PathBuf {
        self.file(METADATA_FILE)
    }

    /// Path of the lock file
    #[inline]
    #[must_use]
    pub fn lock_path(&self) -> PathBuf {
        self.file(LOCK_FILE)
    }

    /// Configuration directory
    #[inline]
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            dir: default_dir(),
            lock_timeout: Duration::from_secs(10),
            lock_poll_interval: Duration::from_millis(50),
            layout: None,
        }
    }
}

/// `$HOME/.config/pcfg`, or `.pcfg` in the working directory without a home
fn default_dir() -> PathBuf {
    std::env::var_os("HOME").map_or_else(
        || PathBuf::from(".pcfg"),
        |home| PathBuf::from(home).join(".config").join("pcfg"),
    )
}

/// Lenient boolean parse for flags
///
/// Accepts `true`/`false`, `1`/`0`, `yes`/`no` and `on`/`off` in any case.
#[must_use]
pub fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}
