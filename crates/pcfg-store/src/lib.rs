//! Shared Configuration Store
//!
//! Persists the configuration document so that concurrent processes can
//! read and modify it safely.
//!
//! # Core Concepts
//!
//! - [`ConfigStore`]: Lock → load → apply → persist-if-changed → unlock
//! - [`Transaction`]: The loaded document plus the strategies in effect
//! - [`Layout`]: Legacy two-file or next-gen single-file on-disk schema
//! - [`LockGuard`]: Cross-process exclusive lock, released on drop
//! - [`Metadata`]: Patch strategies and the layout setting
//!
//! Writes are atomic per file: the full text is written to a temporary
//! sibling and renamed over the target.
//!
//! # Example
//!
//! ```rust,ignore
//! use pcfg_store::{ConfigStore, StoreConfig, StoreResult};
//!
//! let store = ConfigStore::new(StoreConfig::new("/home/me/.config/pcfg"));
//! store.update(|tx| -> StoreResult<()> {
//!     let changed = edit(tx.root_mut());
//!     tx.record(changed);
//!     Ok(())
//! })?;
//! ```

#![warn(unreachable_pub)]
#![warn(missing_docs)]

mod config;
mod error;
mod layout;
mod lock;
mod metadata;
mod store;

pub use config::{
    parse_flag, StoreConfig, CONFIG_FILE, ENV_CONFIG_DIR, ENV_USE_NEXT_GEN, LOCK_FILE,
    METADATA_FILE, NEXT_GEN_FILE,
};
pub use error::{StoreError, StoreResult};
pub use layout::{Layout, StoredDocument, NEXT_GEN_SECTIONS};
pub use lock::LockGuard;
pub use metadata::Metadata;
pub use store::{ConfigStore, Transaction};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
