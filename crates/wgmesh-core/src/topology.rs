//! Declarative topology documents.
//!
//! A [`NetworkTopology`] names a mesh and lists its local-area groups; each
//! [`LocalAreaNetwork`] carries a [`VisibilityMode`] describing how its hosts
//! can be reached from outside, and an ordered list of [`NetworkNode`]s.
//! [`NetDefaults`] holds network-wide fallbacks for hosts that leave settings
//! blank.
//!
//! Documents are JSON with `snake_case` keys. Unknown keys are ignored.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// How the hosts of a group are reachable from outside the group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VisibilityMode {
    /// Every host is independently reachable on the public address.
    #[serde(alias = "OPEN_NAT")]
    Open,
    /// Only the first host (the relay) is publicly reachable; the others are
    /// reached on group-local addresses.
    #[serde(alias = "BRIDGE_NAT")]
    Relayed,
    /// Every host has a public address and a usable private address.
    Cloud,
    /// One host per group on the open internet.
    Wan,
}

impl VisibilityMode {
    /// Returns true if the first host of a group in this mode acts as the
    /// group's relay.
    #[must_use]
    pub const fn elects_relay(self) -> bool {
        match self {
            Self::Relayed => true,
            Self::Open | Self::Cloud | Self::Wan => false,
        }
    }
}

impl fmt::Display for VisibilityMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => write!(f, "OPEN"),
            Self::Relayed => write!(f, "RELAYED"),
            Self::Cloud => write!(f, "CLOUD"),
            Self::Wan => write!(f, "WAN"),
        }
    }
}

/// Physical host metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerNode {
    /// Mesh-wide unique hostname.
    pub hostname: String,
    /// Address reachable from anywhere.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_address: Option<String>,
    /// Address reachable only from inside the host's group.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private_address: Option<String>,
}

impl ServerNode {
    /// Creates host metadata with only a hostname.
    #[must_use]
    pub fn new(hostname: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            ..Self::default()
        }
    }

    /// Sets the public address.
    #[must_use]
    pub fn with_public_address(mut self, address: impl Into<String>) -> Self {
        self.public_address = Some(address.into());
        self
    }

    /// Sets the private address.
    #[must_use]
    pub fn with_private_address(mut self, address: impl Into<String>) -> Self {
        self.private_address = Some(address.into());
        self
    }
}

/// A host's tunnel settings inside the mesh.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkNode {
    /// The physical host.
    #[serde(alias = "server_node")]
    pub server: ServerNode,
    /// Virtual address inside the mesh subnet.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// Base64 public key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_key: Option<String>,
    /// Base64 private key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private_key: Option<String>,
    /// UDP listen port.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub listen_port: Option<u16>,
    /// DNS servers announced on the interface.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub dns: Vec<String>,
    /// Routing table (`off`, `auto` or a table number).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
    /// Interface MTU.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mtu: Option<u32>,
    /// Commands run before the interface comes up.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub pre_up: Vec<String>,
    /// Commands run after the interface comes up.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub post_up: Vec<String>,
    /// Commands run before the interface goes down.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub pre_down: Vec<String>,
    /// Commands run after the interface goes down.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub post_down: Vec<String>,
    /// Opts the host out of defaults, address allocation and key generation.
    pub ignore_default: bool,
}

impl NetworkNode {
    /// Creates a node for the given host with every setting left blank.
    #[must_use]
    pub fn new(server: ServerNode) -> Self {
        Self {
            server,
            ..Self::default()
        }
    }

    /// Returns the host's hostname.
    #[must_use]
    pub fn hostname(&self) -> &str {
        &self.server.hostname
    }

    /// Sets the virtual address.
    #[must_use]
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    /// Sets both keys.
    #[must_use]
    pub fn with_keys(mut self, private_key: impl Into<String>, public_key: impl Into<String>) -> Self {
        self.private_key = Some(private_key.into());
        self.public_key = Some(public_key.into());
        self
    }

    /// Sets the listen port.
    #[must_use]
    pub fn with_listen_port(mut self, port: u16) -> Self {
        self.listen_port = Some(port);
        self
    }

    /// Marks the host as opted out of defaults.
    #[must_use]
    pub fn ignoring_defaults(mut self) -> Self {
        self.ignore_default = true;
        self
    }
}

/// A named group of hosts sharing one visibility mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalAreaNetwork {
    /// Group name.
    #[serde(default)]
    pub name: String,
    /// How the group's hosts are reached from outside.
    #[serde(alias = "network_type")]
    pub visibility: VisibilityMode,
    /// Hosts in declaration order. For relayed groups the first is the relay.
    #[serde(default, alias = "network_nodes")]
    pub hosts: Vec<NetworkNode>,
}

impl LocalAreaNetwork {
    /// Creates an empty group.
    #[must_use]
    pub fn new(name: impl Into<String>, visibility: VisibilityMode) -> Self {
        Self {
            name: name.into(),
            visibility,
            hosts: Vec::new(),
        }
    }

    /// Appends a host.
    #[must_use]
    pub fn with_host(mut self, host: NetworkNode) -> Self {
        self.hosts.push(host);
        self
    }
}

/// A whole mesh: its subnet and its groups.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkTopology {
    /// Network name.
    pub name: String,
    /// Subnet address, or a CIDR when `netmask` is absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// Dotted subnet mask.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub netmask: Option<String>,
    /// Groups in declaration order.
    #[serde(alias = "local_area_networks")]
    pub groups: Vec<LocalAreaNetwork>,
}

impl NetworkTopology {
    /// Creates an empty topology.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Sets the subnet from CIDR notation.
    #[must_use]
    pub fn with_subnet(mut self, cidr: impl Into<String>) -> Self {
        self.address = Some(cidr.into());
        self.netmask = None;
        self
    }

    /// Appends a group.
    #[must_use]
    pub fn with_group(mut self, group: LocalAreaNetwork) -> Self {
        self.groups.push(group);
        self
    }

    /// Parses a topology from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed.
    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Loads a topology from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&content)
    }

    /// Iterates over every host in group order.
    pub fn network_nodes(&self) -> impl Iterator<Item = &NetworkNode> {
        self.groups.iter().flat_map(|group| group.hosts.iter())
    }

    /// Iterates over every host's physical metadata in group order.
    pub fn server_nodes(&self) -> impl Iterator<Item = &ServerNode> {
        self.network_nodes().map(|node| &node.server)
    }
}

/// Network-wide fallback settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetDefaults {
    /// Subnet address, or a CIDR when `netmask` is absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// Dotted subnet mask.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub netmask: Option<String>,
    /// Listen port for hosts without one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub listen_port: Option<u16>,
    /// DNS servers for hosts without any.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub dns: Vec<String>,
    /// Routing table for hosts without one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
    /// MTU for hosts without one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mtu: Option<u32>,
    /// `PreUp` commands for hosts without any.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub pre_up: Vec<String>,
    /// `PostUp` commands for hosts without any.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub post_up: Vec<String>,
    /// `PreDown` commands for hosts without any.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub pre_down: Vec<String>,
    /// `PostDown` commands for hosts without any.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub post_down: Vec<String>,
    /// Keepalive interval written on every peer entry.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub persistent_keepalive: Option<u16>,
}

impl NetDefaults {
    /// Parses defaults from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed.
    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Loads defaults from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&content)
    }
}
