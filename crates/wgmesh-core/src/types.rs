//! Compiled configuration records.

use std::fmt;
use std::net::Ipv6Addr;

use serde::{Serialize, Serializer};

/// How a requester reaches a peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EndpointCategory {
    /// Through the peer's public address.
    Public,
    /// Through the peer's group-local address.
    Private,
    /// No direct route; the peer is the requester's own relay.
    Unknown,
}

impl fmt::Display for EndpointCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Public => write!(f, "PUBLIC"),
            Self::Private => write!(f, "PRIVATE"),
            Self::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

/// A peer endpoint: host and UDP port.
///
/// The host is kept as written so DNS names survive; IPv6 literals are
/// bracketed on display.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    host: String,
    port: u16,
}

impl Endpoint {
    /// Creates an endpoint.
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Returns the host part.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Returns the port.
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.parse::<Ipv6Addr>().is_ok() {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

impl Serialize for Endpoint {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

/// The `[Interface]` section of a host's configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WgInterface {
    /// Hostname, written as a comment.
    pub name: String,
    /// Virtual address.
    pub address: Option<String>,
    /// UDP listen port.
    pub listen_port: Option<u16>,
    /// Base64 private key.
    pub private_key: Option<String>,
    /// DNS servers.
    pub dns: Vec<String>,
    /// Routing table.
    pub table: Option<String>,
    /// Interface MTU.
    pub mtu: Option<u32>,
    /// `PreUp` commands.
    pub pre_up: Vec<String>,
    /// `PostUp` commands.
    pub post_up: Vec<String>,
    /// `PreDown` commands.
    pub pre_down: Vec<String>,
    /// `PostDown` commands.
    pub post_down: Vec<String>,
}

/// A `[Peer]` section of a host's configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WgPeer {
    /// Peer hostname, written as a comment.
    pub name: String,
    /// Where to reach the peer, if known.
    pub endpoint: Option<Endpoint>,
    /// Base64 public key.
    pub public_key: Option<String>,
    /// Addresses routed to the peer.
    pub allowed_ips: Vec<String>,
    /// Keepalive interval in seconds.
    pub persistent_keepalive: Option<u16>,
}

/// One host's complete configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompiledConfig {
    /// Name of the network the host belongs to.
    pub network: String,
    /// The host's own interface.
    pub interface: WgInterface,
    /// Every host in the mesh, the owner included, in topology order.
    pub peers: Vec<WgPeer>,
}

impl CompiledConfig {
    /// Returns the owning host's name.
    #[must_use]
    pub fn hostname(&self) -> &str {
        &self.interface.name
    }

    /// Renders the configuration as `wg-quick` INI text.
    #[must_use]
    pub fn to_ini_string(&self) -> String {
        crate::config::render_config(self)
    }
}

impl fmt::Display for CompiledConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_ini_string())
    }
}
