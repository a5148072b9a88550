//! Configuration Patch Engine
//!
//! Reconciles incoming subtrees with an existing document under a
//! path-driven merge/replace policy.
//!
//! # Core Concepts
//!
//! - [`PatchStrategies`]: Path → [`PatchStrategy`] table, most specific prefix wins
//! - [`reconcile_for_replace`]: Clears replace-strategy subtrees the incoming data supersedes
//! - [`merge`]: Key-wise union of an incoming subtree into a target
//! - [`upsert_entity`] / [`remove_entity`]: Named entities inside sequences
//! - [`set_entry`] / [`remove_entry`]: Single entries at a path
//!
//! Every mutating operation reports whether the tree changed, so callers
//! persist only when needed.
//!
//! # Example
//!
//! ```rust,ignore
//! use pcfg_patch::{upsert_entity, PatchStrategies};
//!
//! let changed = upsert_entity(contexts, &incoming, &"contexts".parse()?, &strategies)?;
//! if changed {
//!     stored.persist()?;
//! }
//! ```

#![warn(unreachable_pub)]
#![warn(missing_docs)]

mod edit;
mod entity;
mod error;
mod merge;
mod reconcile;
mod strategy;

pub use edit::{remove_entry, set_entry};
pub use entity::{entity_name, find_entity, position, remove_entity, upsert_entity};
pub use error::{PatchError, PatchResult};
pub use merge::merge;
pub use reconcile::reconcile_for_replace;
pub use strategy::{PatchStrategies, PatchStrategy};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
