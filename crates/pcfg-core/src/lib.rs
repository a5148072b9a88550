//! PCFG Core - context and server management
//!
//! The domain layer over the shared configuration store:
//! - Adds, updates and removes contexts by name
//! - Keeps one current context per target, never dangling
//! - Back-fills a legacy server record for each cluster or global context
//! - Reads and writes feature flags and environment overrides
//!
//! Every operation is a single locked read-modify-write; the document is
//! only rewritten when the operation actually changed it.
//!
//! # Example
//!
//! ```rust,ignore
//! use pcfg_core::{ClusterOpts, ConfigClient, Context, Target};
//!
//! let client = ConfigClient::from_env();
//! let ctx = Context::new("dev", Target::Kubernetes)
//!     .with_cluster_opts(ClusterOpts::new("https://dev.example.com"));
//! client.set_context(&ctx, true)?;
//!
//! assert_eq!(client.get_current_context(Target::Kubernetes)?.name, "dev");
//! ```

#![warn(unreachable_pub)]
#![warn(missing_docs)]

mod client;
mod client_options;
mod contexts;
mod error;
mod servers;
mod types;

pub use client::ConfigClient;
pub use client_options::split_feature_path;
pub use error::{ConfigError, ConfigResult};
pub use types::{
    keys, ClusterOpts, Context, DiscoverySource, GlobalOpts, ManagementClusterOpts, Server,
    ServerType, SourceKind, Target,
};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with contexts and servers
    pub use crate::{
        ClusterOpts, ConfigClient, ConfigError, ConfigResult, Context, GlobalOpts, Server,
        ServerType, Target,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
