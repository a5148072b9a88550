//! Legacy server operations
//!
//! Servers predate contexts and are kept for consumers that still read
//! them. Writing a server back-fills the matching context, so both views
//! stay consistent whichever API a caller uses.

use pcfg_store::Transaction;
use pcfg_tree::{Key, Node};

use crate::client::{self, ConfigClient};
use crate::contexts;
use crate::error::{ConfigError, ConfigResult};
use crate::types::{keys, Context, Server};

impl ConfigClient {
    /// Server called `name`
    ///
    /// # Errors
    /// Returns [`ConfigError::NotFound`] if no such server exists
    pub fn get_server(&self, name: &str) -> ConfigResult<Server> {
        self.store().read(|tx| server_in(tx.root(), name))
    }

    /// Check whether a server called `name` exists
    ///
    /// # Errors
    /// Returns error if the document cannot be loaded
    pub fn server_exists(&self, name: &str) -> ConfigResult<bool> {
        self.store().read(|tx| {
            client::entity::<Server>(tx.root(), keys::SERVERS, name).map(|s| s.is_some())
        })
    }

    /// All stored servers, in document order
    ///
    /// # Errors
    /// Returns error if the document cannot be loaded or a server is malformed
    pub fn list_servers(&self) -> ConfigResult<Vec<Server>> {
        self.store().read(|tx| client::entities(tx.root(), keys::SERVERS))
    }

    /// Add or update a server and back-fill its context
    ///
    /// With `make_current`, the legacy current server and the current
    /// context for the mirrored target both point at it.
    ///
    /// # Errors
    /// - [`ConfigError::TargetImmutable`] if the back-filled context would
    ///   change a stored context's target
    /// - [`ConfigError::Store`] if locking or persisting fails
    pub fn set_server(&self, server: &Server, make_current: bool) -> ConfigResult<()> {
        self.store().update(|tx| -> ConfigResult<()> {
            let ctx = server.to_context();
            let mut changed = store_server(tx, server)?;
            if make_current {
                changed |= point_current_server(tx, &server.name)?;
            }
            changed |= contexts::store_context(tx, &ctx)?;
            if make_current {
                changed |= contexts::point_current_context(tx, ctx.target, &ctx.name)?;
            }
            tracing::debug!(name = %server.name, make_current, changed, "set server");
            Ok(())
        })
    }

    /// Remove a server together with its context and any pointers to them
    ///
    /// # Errors
    /// Returns [`ConfigError::NotFound`] if no such server exists
    pub fn remove_server(&self, name: &str) -> ConfigResult<()> {
        self.store().update(|tx| -> ConfigResult<()> {
            server_in(tx.root(), name)?;
            let ctx: Option<Context> = client::entity(tx.root(), keys::CONTEXTS, name)?;
            clear_current_server(tx, name)?;
            if let Some(ctx) = &ctx {
                contexts::clear_current_context(tx, ctx.target, Some(name))?;
            }
            client::remove(tx, keys::SERVERS, name)?;
            client::remove(tx, keys::CONTEXTS, name)?;
            tracing::info!(name, "removed server");
            Ok(())
        })
    }

    /// Make the server called `name` current
    ///
    /// The current context follows when a context of the same name exists.
    ///
    /// # Errors
    /// Returns [`ConfigError::NotFound`] if no such server exists
    pub fn set_current_server(&self, name: &str) -> ConfigResult<()> {
        self.store().update(|tx| -> ConfigResult<()> {
            server_in(tx.root(), name)?;
            point_current_server(tx, name)?;
            if let Some(ctx) = client::entity::<Context>(tx.root(), keys::CONTEXTS, name)? {
                contexts::point_current_context(tx, ctx.target, name)?;
            }
            Ok(())
        })
    }

    /// Current server
    ///
    /// # Errors
    /// Returns [`ConfigError::NotFound`] if no current server is set or it
    /// names a missing server
    pub fn get_current_server(&self) -> ConfigResult<Server> {
        self.store().read(|tx| -> ConfigResult<Server> {
            let name = current_server_name(tx.root())
                .ok_or_else(|| ConfigError::not_found("current server not set"))?;
            server_in(tx.root(), name)
                .map_err(|_| ConfigError::not_found(format!("current server {name:?} not found")))
        })
    }

    /// Clear the current server if it is `name`
    ///
    /// The current context pointing at the context of the same name is
    /// cleared as well.
    ///
    /// # Errors
    /// Returns error if the document cannot be loaded or persisted
    pub fn remove_current_server(&self, name: &str) -> ConfigResult<()> {
        self.store().update(|tx| -> ConfigResult<()> {
            clear_current_server(tx, name)?;
            if let Some(ctx) = client::entity::<Context>(tx.root(), keys::CONTEXTS, name)? {
                contexts::clear_current_context(tx, ctx.target, Some(name))?;
            }
            Ok(())
        })
    }
}

fn server_in(root: &Node, name: &str) -> ConfigResult<Server> {
    client::entity(root, keys::SERVERS, name)?
        .ok_or_else(|| ConfigError::not_found(format!("server {name:?} not found")))
}

fn current_server_name(root: &Node) -> Option<&str> {
    client::scalar_text(root, &[Key::any(keys::CURRENT_SERVER)]).filter(|name| !name.is_empty())
}

/// Upsert the server entity only
pub(crate) fn store_server(tx: &mut Transaction, server: &Server) -> ConfigResult<bool> {
    let added = client::entity::<Server>(tx.root(), keys::SERVERS, &server.name)?.is_none();
    let changed = client::upsert(tx, keys::SERVERS, server)?;
    if added {
        tracing::info!(name = %server.name, "added server");
    }
    Ok(changed)
}

/// Point the legacy current server at `name`
pub(crate) fn point_current_server(tx: &mut Transaction, name: &str) -> ConfigResult<bool> {
    client::set_string(tx, &[], keys::CURRENT_SERVER, name)
}

/// Clear the legacy current server if it is `name`
pub(crate) fn clear_current_server(tx: &mut Transaction, name: &str) -> ConfigResult<bool> {
    if current_server_name(tx.root()) != Some(name) {
        return Ok(false);
    }
    client::delete(tx, &[], keys::CURRENT_SERVER)
}
