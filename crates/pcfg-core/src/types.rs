//! Typed configuration entities
//!
//! Field names follow the stored document (`clusterOpts`,
//! `isManagementCluster`, ...). Empty optional fields are omitted when
//! written so that an update only touches what it carries.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{ConfigError, ConfigResult};

/// Top-level document keys
pub mod keys {
    /// Context entities
    pub const CONTEXTS: &str = "contexts";
    /// Current context per target
    pub const CURRENT_CONTEXT: &str = "currentContext";
    /// Legacy server entities
    pub const SERVERS: &str = "servers";
    /// Legacy current server name
    pub const CURRENT_SERVER: &str = "current";
    /// Client options subtree
    pub const CLIENT_OPTIONS: &str = "clientOptions";
    /// Feature flags under client options
    pub const FEATURES: &str = "features";
    /// Environment overrides under client options
    pub const ENV: &str = "env";
}

/// Kind of endpoint a context talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum Target {
    /// Kubernetes cluster
    Kubernetes,
    /// Mission control endpoint
    MissionControl,
    /// Not tied to any endpoint
    Global,
    /// Not yet known
    #[default]
    Unknown,
}

impl Target {
    /// Targets that can have a current context
    pub const SUPPORTED: [Target; 2] = [Target::Kubernetes, Target::MissionControl];

    /// Stored name; empty for [`Target::Unknown`]
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Kubernetes => "kubernetes",
            Self::MissionControl => "mission-control",
            Self::Global => "global",
            Self::Unknown => "",
        }
    }

    /// Check for [`Target::Unknown`]
    #[inline]
    #[must_use]
    pub fn is_unknown(&self) -> bool {
        *self == Self::Unknown
    }
}

impl Display for Target {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown => f.write_str("unknown"),
            known => f.write_str(known.as_str()),
        }
    }
}

impl FromStr for Target {
    type Err = ConfigError;

    /// Accepts the stored names plus the `k8s` and `tmc` aliases,
    /// case-insensitively
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "kubernetes" | "k8s" => Ok(Self::Kubernetes),
            "mission-control" | "tmc" => Ok(Self::MissionControl),
            "global" => Ok(Self::Global),
            "" | "unknown" => Ok(Self::Unknown),
            _ => Err(ConfigError::InvalidTarget(s.to_string())),
        }
    }
}

impl Serialize for Target {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Target {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Kubernetes cluster connection options
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterOpts {
    /// API server endpoint
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub endpoint: String,
    /// Kubeconfig path
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub path: String,
    /// Kubeconfig context
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub context: String,
    /// Whether the cluster is a management cluster
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_management_cluster: bool,
}

impl ClusterOpts {
    /// Options for `endpoint`
    #[must_use]
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Self::default()
        }
    }

    /// Mark as management cluster
    #[inline]
    #[must_use]
    pub fn management_cluster(mut self) -> Self {
        self.is_management_cluster = true;
        self
    }
}

/// Global (non-cluster) endpoint options
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalOpts {
    /// Service endpoint
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub endpoint: String,
}

impl GlobalOpts {
    /// Options for `endpoint`
    #[must_use]
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
        }
    }
}

/// Where plugin discovery looks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// OCI image
    Oci,
    /// Local directory
    Local,
    /// REST endpoint
    Rest,
    /// Cluster resources
    Kubernetes,
}

/// Plugin discovery source, identified by name within its context
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoverySource {
    /// Source name
    pub name: String,
    /// Source kind
    #[serde(rename = "type")]
    pub kind: SourceKind,
    /// Image, path or URL, depending on kind
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub location: String,
}

impl DiscoverySource {
    /// Create discovery source
    #[must_use]
    pub fn new(name: impl Into<String>, kind: SourceKind, location: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            location: location.into(),
        }
    }
}

/// Named connection context
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Context {
    /// Unique name
    pub name: String,
    /// Target kind
    #[serde(default, skip_serializing_if = "Target::is_unknown")]
    pub target: Target,
    /// Cluster options, for kubernetes targets
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_opts: Option<ClusterOpts>,
    /// Global options, for mission-control targets
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global_opts: Option<GlobalOpts>,
    /// Discovery sources
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub discovery_sources: Vec<DiscoverySource>,
}

impl Context {
    /// Create context with no options
    #[must_use]
    pub fn new(name: impl Into<String>, target: Target) -> Self {
        Self {
            name: name.into(),
            target,
            ..Self::default()
        }
    }

    /// With cluster options
    #[inline]
    #[must_use]
    pub fn with_cluster_opts(mut self, opts: ClusterOpts) -> Self {
        self.cluster_opts = Some(opts);
        self
    }

    /// With global options
    #[inline]
    #[must_use]
    pub fn with_global_opts(mut self, opts: GlobalOpts) -> Self {
        self.global_opts = Some(opts);
        self
    }

    /// With an additional discovery source
    #[inline]
    #[must_use]
    pub fn with_discovery_source(mut self, source: DiscoverySource) -> Self {
        self.discovery_sources.push(source);
        self
    }

    /// Check for a kubernetes management cluster
    #[must_use]
    pub fn is_management_cluster(&self) -> bool {
        self.target == Target::Kubernetes
            && self
                .cluster_opts
                .as_ref()
                .is_some_and(|opts| opts.is_management_cluster)
    }

    /// Endpoint for the context's target
    ///
    /// # Errors
    /// Returns [`ConfigError::NoEndpoint`] for targets without endpoint
    /// options
    pub fn endpoint(&self) -> ConfigResult<&str> {
        let endpoint = match self.target {
            Target::Kubernetes => self.cluster_opts.as_ref().map(|o| o.endpoint.as_str()),
            Target::MissionControl => self.global_opts.as_ref().map(|o| o.endpoint.as_str()),
            Target::Global | Target::Unknown => None,
        };
        endpoint.ok_or(ConfigError::NoEndpoint(self.target))
    }

    /// Legacy server mirroring this context
    ///
    /// Kubernetes contexts mirror to management-cluster servers and
    /// mission-control contexts to global servers; other targets have no
    /// mirror.
    #[must_use]
    pub fn to_server(&self) -> Option<Server> {
        let mut server = match self.target {
            Target::Kubernetes => {
                let mut server = Server::new(&self.name, ServerType::ManagementCluster);
                server.management_cluster_opts =
                    self.cluster_opts.as_ref().map(|opts| ManagementClusterOpts {
                        endpoint: opts.endpoint.clone(),
                        path: opts.path.clone(),
                        context: opts.context.clone(),
                    });
                server
            }
            Target::MissionControl => {
                let mut server = Server::new(&self.name, ServerType::Global);
                server.global_opts.clone_from(&self.global_opts);
                server
            }
            Target::Global | Target::Unknown => return None,
        };
        server.discovery_sources.clone_from(&self.discovery_sources);
        Some(server)
    }
}

/// Legacy server kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ServerType {
    /// Kubernetes management cluster
    #[serde(rename = "managementcluster")]
    ManagementCluster,
    /// Global service endpoint
    #[serde(rename = "global")]
    Global,
}

impl ServerType {
    /// Target of the context mirroring a server of this type
    #[inline]
    #[must_use]
    pub fn target(&self) -> Target {
        match self {
            Self::ManagementCluster => Target::Kubernetes,
            Self::Global => Target::MissionControl,
        }
    }
}

/// Management cluster options of a legacy server
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagementClusterOpts {
    /// API server endpoint
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub endpoint: String,
    /// Kubeconfig path
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub path: String,
    /// Kubeconfig context
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub context: String,
}

/// Legacy server record, kept in step with its context
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Server {
    /// Unique name, shared with the mirrored context
    pub name: String,
    /// Server kind
    #[serde(rename = "type")]
    pub server_type: ServerType,
    /// Options for management clusters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub management_cluster_opts: Option<ManagementClusterOpts>,
    /// Options for global servers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global_opts: Option<GlobalOpts>,
    /// Discovery sources
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub discovery_sources: Vec<DiscoverySource>,
}

impl Server {
    /// Create server with no options
    #[must_use]
    pub fn new(name: impl Into<String>, server_type: ServerType) -> Self {
        Self {
            name: name.into(),
            server_type,
            management_cluster_opts: None,
            global_opts: None,
            discovery_sources: Vec::new(),
        }
    }

    /// Check for a management cluster server
    #[inline]
    #[must_use]
    pub fn is_management_cluster(&self) -> bool {
        self.server_type == ServerType::ManagementCluster
    }

    /// Check for a global server
    #[inline]
    #[must_use]
    pub fn is_global(&self) -> bool {
        self.server_type == ServerType::Global
    }

    /// Context mirroring this server
    #[must_use]
    pub fn to_context(&self) -> Context {
        let mut context = Context::new(&self.name, self.server_type.target());
        match self.server_type {
            ServerType::ManagementCluster => {
                let opts = self.management_cluster_opts.clone().unwrap_or_default();
                context.cluster_opts = Some(ClusterOpts {
                    endpoint: opts.endpoint,
                    path: opts.path,
                    context: opts.context,
                    is_management_cluster: true,
                });
            }
            ServerType::Global => context.global_opts.clone_from(&self.global_opts),
        }
        context.discovery_sources.clone_from(&self.discovery_sources);
        context
    }
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_false(value: &bool) -> bool {
    !*value
}
