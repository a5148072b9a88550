//! Context operations
//!
//! Contexts are the primary entities. Writing one also keeps the legacy
//! server mirror and both kinds of current pointer in step, all inside the
//! same locked operation.

use std::collections::BTreeMap;

use pcfg_store::Transaction;
use pcfg_tree::{Key, Node};

use crate::client::{self, ConfigClient};
use crate::error::{ConfigError, ConfigResult};
use crate::servers;
use crate::types::{keys, Context, Target};

impl ConfigClient {
    /// Context called `name`
    ///
    /// # Errors
    /// Returns [`ConfigError::NotFound`] if no such context exists
    pub fn get_context(&self, name: &str) -> ConfigResult<Context> {
        self.store().read(|tx| context_in(tx.root(), name))
    }

    /// Check whether a context called `name` exists
    ///
    /// # Errors
    /// Returns error if the document cannot be loaded
    pub fn context_exists(&self, name: &str) -> ConfigResult<bool> {
        self.store().read(|tx| {
            client::entity::<Context>(tx.root(), keys::CONTEXTS, name).map(|ctx| ctx.is_some())
        })
    }

    /// All stored contexts, in document order
    ///
    /// # Errors
    /// Returns error if the document cannot be loaded or a context is malformed
    pub fn list_contexts(&self) -> ConfigResult<Vec<Context>> {
        self.store().read(|tx| client::entities(tx.root(), keys::CONTEXTS))
    }

    /// Add or update a context, optionally making it current
    ///
    /// An existing context of the same name is updated in place under the
    /// configured patch strategies. The legacy server mirror is written
    /// alongside, and with `make_current` the current pointers follow.
    ///
    /// # Errors
    /// - [`ConfigError::TargetImmutable`] if the update changes a known target
    /// - [`ConfigError::Store`] if locking or persisting fails
    pub fn set_context(&self, ctx: &Context, make_current: bool) -> ConfigResult<()> {
        self.store().update(|tx| write_context(tx, ctx, make_current).map(drop))
    }

    /// Same as [`ConfigClient::set_context`]
    ///
    /// # Errors
    /// See [`ConfigClient::set_context`]
    #[inline]
    pub fn add_context(&self, ctx: &Context, make_current: bool) -> ConfigResult<()> {
        self.set_context(ctx, make_current)
    }

    /// Remove a context together with its mirror and any pointers to it
    ///
    /// # Errors
    /// Returns [`ConfigError::NotFound`] if no such context exists
    pub fn remove_context(&self, name: &str) -> ConfigResult<()> {
        self.store().update(|tx| -> ConfigResult<()> {
            let ctx = context_in(tx.root(), name)?;
            clear_current_context(tx, ctx.target, Some(name))?;
            client::remove(tx, keys::CONTEXTS, name)?;
            client::remove(tx, keys::SERVERS, name)?;
            servers::clear_current_server(tx, name)?;
            tracing::info!(name, target = %ctx.target, "removed context");
            Ok(())
        })
    }

    /// Same as [`ConfigClient::remove_context`]
    ///
    /// # Errors
    /// See [`ConfigClient::remove_context`]
    #[inline]
    pub fn delete_context(&self, name: &str) -> ConfigResult<()> {
        self.remove_context(name)
    }

    /// Current context for `target`
    ///
    /// # Errors
    /// Returns [`ConfigError::NotFound`] if no current context is set for
    /// the target or the pointer names a missing context
    pub fn get_current_context(&self, target: Target) -> ConfigResult<Context> {
        self.store().read(|tx| current_context_in(tx.root(), target))
    }

    /// Make the context called `name` current for its target
    ///
    /// For kubernetes contexts the legacy current server follows.
    ///
    /// # Errors
    /// Returns [`ConfigError::NotFound`] if no such context exists
    pub fn set_current_context(&self, name: &str) -> ConfigResult<()> {
        self.store().update(|tx| -> ConfigResult<()> {
            let ctx = context_in(tx.root(), name)?;
            point_current_context(tx, ctx.target, name)?;
            if ctx.target == Target::Kubernetes {
                servers::point_current_server(tx, name)?;
            }
            Ok(())
        })
    }

    /// Clear the current context for `target`
    ///
    /// The legacy current server is cleared too if it named that context.
    ///
    /// # Errors
    /// Returns [`ConfigError::NotFound`] if no current context is set for
    /// the target
    pub fn remove_current_context(&self, target: Target) -> ConfigResult<()> {
        self.store().update(|tx| -> ConfigResult<()> {
            let name = current_context_name(tx.root(), target)
                .map(str::to_string)
                .ok_or_else(|| no_current_context(target))?;
            clear_current_context(tx, target, None)?;
            servers::clear_current_server(tx, &name)?;
            Ok(())
        })
    }

    /// Current context of every supported target that has one
    ///
    /// # Errors
    /// Returns error if the document cannot be loaded
    pub fn get_all_current_contexts(&self) -> ConfigResult<BTreeMap<Target, Context>> {
        self.store().read(|tx| {
            let mut current = BTreeMap::new();
            for target in Target::SUPPORTED {
                match current_context_in(tx.root(), target) {
                    Ok(ctx) => {
                        current.insert(target, ctx);
                    }
                    Err(err) if err.is_not_found() => {}
                    Err(err) => return Err(err),
                }
            }
            Ok(current)
        })
    }

    /// Names of the current contexts of all supported targets
    ///
    /// # Errors
    /// Returns error if the document cannot be loaded
    pub fn get_all_current_context_names(&self) -> ConfigResult<Vec<String>> {
        Ok(self
            .get_all_current_contexts()?
            .into_values()
            .map(|ctx| ctx.name)
            .collect())
    }
}

pub(crate) fn context_in(root: &Node, name: &str) -> ConfigResult<Context> {
    client::entity(root, keys::CONTEXTS, name)?
        .ok_or_else(|| ConfigError::not_found(format!("context {name:?} not found")))
}

fn current_context_in(root: &Node, target: Target) -> ConfigResult<Context> {
    let name = current_context_name(root, target).ok_or_else(|| no_current_context(target))?;
    context_in(root, name)
}

fn no_current_context(target: Target) -> ConfigError {
    ConfigError::not_found(format!(
        "no current context set for target {:?}",
        target.as_str()
    ))
}

/// Name the current pointer for `target` holds, if set and non-empty
pub(crate) fn current_context_name(root: &Node, target: Target) -> Option<&str> {
    client::scalar_text(
        root,
        &[Key::any(keys::CURRENT_CONTEXT), Key::any(target.as_str())],
    )
    .filter(|name| !name.is_empty())
}

/// Add or update a context, its server mirror and, optionally, the pointers
pub(crate) fn write_context(
    tx: &mut Transaction,
    ctx: &Context,
    make_current: bool,
) -> ConfigResult<bool> {
    let mut changed = store_context(tx, ctx)?;
    if make_current {
        changed |= point_current_context(tx, ctx.target, &ctx.name)?;
    }
    if let Some(server) = ctx.to_server() {
        changed |= servers::store_server(tx, &server)?;
        if make_current && server.is_management_cluster() {
            changed |= servers::point_current_server(tx, &server.name)?;
        }
    }
    tracing::debug!(name = %ctx.name, target = %ctx.target, make_current, changed, "set context");
    Ok(changed)
}

/// Upsert the context entity only
///
/// A context whose stored target is known keeps it; an update naming a
/// different target is refused before anything changes.
pub(crate) fn store_context(tx: &mut Transaction, ctx: &Context) -> ConfigResult<bool> {
    let existing = client::entity::<Context>(tx.root(), keys::CONTEXTS, &ctx.name)?;
    if let Some(existing) = &existing {
        if !existing.target.is_unknown() && existing.target != ctx.target {
            return Err(ConfigError::TargetImmutable {
                name: ctx.name.clone(),
                existing: existing.target,
                requested: ctx.target,
            });
        }
    }
    let changed = client::upsert(tx, keys::CONTEXTS, ctx)?;
    if existing.is_none() {
        tracing::info!(name = %ctx.name, target = %ctx.target, "added context");
    }
    Ok(changed)
}

/// Point the current context for `target` at `name`
///
/// Contexts of unknown target have no pointer slot.
pub(crate) fn point_current_context(
    tx: &mut Transaction,
    target: Target,
    name: &str,
) -> ConfigResult<bool> {
    if target.is_unknown() {
        tracing::debug!(name, "context has no target, current pointer left alone");
        return Ok(false);
    }
    client::set_string(tx, &[Key::mapping(keys::CURRENT_CONTEXT)], target.as_str(), name)
}

/// Clear the current pointer for `target` if it names `name`
///
/// With `name` of `None`, or a pointer holding an empty name, the pointer
/// is cleared whatever it holds.
pub(crate) fn clear_current_context(
    tx: &mut Transaction,
    target: Target,
    name: Option<&str>,
) -> ConfigResult<bool> {
    let slot = [Key::any(keys::CURRENT_CONTEXT), Key::any(target.as_str())];
    let Some(stored) = client::scalar_text(tx.root(), &slot) else {
        return Ok(false);
    };
    if name.is_some_and(|name| !stored.is_empty() && stored != name) {
        return Ok(false);
    }
    client::delete(tx, &[Key::mapping(keys::CURRENT_CONTEXT)], target.as_str())
}
