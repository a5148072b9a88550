//! Testing utilities for the PCFG workspace
//!
//! Temporary stores, sample entities and test tracing.

#![allow(missing_docs)]

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use once_cell::sync::Lazy;
use pcfg_core::{
    ClusterOpts, ConfigClient, Context, DiscoverySource, GlobalOpts, ManagementClusterOpts,
    Server, ServerType, SourceKind, Target,
};
use pcfg_store::{ConfigStore, Layout, StoreConfig, METADATA_FILE};
use tempfile::TempDir;
use tracing_subscriber::EnvFilter;

static TRACING: Lazy<()> = Lazy::new(|| {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
});

/// Install a test-writer subscriber once per process; `RUST_LOG` overrides
/// the default `warn` level
pub fn init_test_tracing() {
    Lazy::force(&TRACING);
}

/// Store rooted in a fresh temporary directory
pub struct TestStore {
    dir: TempDir,
    config: StoreConfig,
}

impl TestStore {
    /// Store whose layout is resolved from metadata, like a real one
    pub fn new() -> Self {
        init_test_tracing();
        let dir = TempDir::new().unwrap();
        let config = StoreConfig::new(dir.path())
            .with_lock_timeout(Duration::from_secs(10))
            .with_lock_poll_interval(Duration::from_millis(5));
        Self { dir, config }
    }

    /// Store pinned to `layout`
    pub fn with_layout(layout: Layout) -> Self {
        let mut store = Self::new();
        store.config = store.config.with_layout(layout);
        store
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn config(&self) -> StoreConfig {
        self.config.clone()
    }

    pub fn store(&self) -> ConfigStore {
        ConfigStore::new(self.config())
    }

    pub fn client(&self) -> ConfigClient {
        ConfigClient::from_config(self.config())
    }

    pub fn file(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// File contents, `None` if it does not exist
    pub fn read(&self, name: &str) -> Option<String> {
        fs::read_to_string(self.file(name)).ok()
    }

    pub fn write(&self, name: &str, text: &str) {
        fs::write(self.file(name), text).unwrap();
    }

    /// Declare `path` as a replace-strategy path
    pub fn replace_strategy(&self, path: &str) {
        self.write(
            METADATA_FILE,
            &format!("configMetadata:\n  patchStrategy:\n    {path}: replace\n"),
        );
    }

    /// Identity of the file on disk; changes whenever it is rewritten
    #[cfg(unix)]
    pub fn inode(&self, name: &str) -> Option<u64> {
        use std::os::unix::fs::MetadataExt;
        fs::metadata(self.file(name)).ok().map(|m| m.ino())
    }
}

impl Default for TestStore {
    fn default() -> Self {
        Self::new()
    }
}

pub fn k8s_context(name: &str, endpoint: &str) -> Context {
    Context::new(name, Target::Kubernetes).with_cluster_opts(ClusterOpts::new(endpoint))
}

pub fn management_context(name: &str, endpoint: &str) -> Context {
    Context::new(name, Target::Kubernetes)
        .with_cluster_opts(ClusterOpts::new(endpoint).management_cluster())
}

pub fn tmc_context(name: &str, endpoint: &str) -> Context {
    Context::new(name, Target::MissionControl).with_global_opts(GlobalOpts::new(endpoint))
}

pub fn oci_source(name: &str, image: &str) -> DiscoverySource {
    DiscoverySource::new(name, SourceKind::Oci, image)
}

pub fn management_server(name: &str, endpoint: &str) -> Server {
    let mut server = Server::new(name, ServerType::ManagementCluster);
    server.management_cluster_opts = Some(ManagementClusterOpts {
        endpoint: endpoint.to_string(),
        ..ManagementClusterOpts::default()
    });
    server
}

pub fn global_server(name: &str, endpoint: &str) -> Server {
    let mut server = Server::new(name, ServerType::Global);
    server.global_opts = Some(GlobalOpts::new(endpoint));
    server
}
