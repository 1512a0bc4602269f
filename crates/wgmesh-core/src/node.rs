//! Per-host view of the mesh.
//!
//! A [`HostWrapper`] pairs a resolved [`NetworkNode`] with the group it was
//! declared in, which is all that is needed to decide how any other host
//! reaches it.

use crate::keys;
use crate::topology::{LocalAreaNetwork, NetworkNode, VisibilityMode};
use crate::types::{Endpoint, EndpointCategory, WgInterface, WgPeer};

fn non_blank(value: Option<&String>) -> Option<&str> {
    value.map(|v| v.trim()).filter(|v| !v.is_empty())
}

/// A host together with its group membership.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostWrapper {
    node: NetworkNode,
    group_index: usize,
    group_name: String,
    visibility: VisibilityMode,
    is_relay: bool,
}

impl HostWrapper {
    /// Wraps the host at `position` of `group`, the `group_index`-th group of
    /// the topology.
    #[must_use]
    pub fn new(node: NetworkNode, group_index: usize, group: &LocalAreaNetwork, position: usize) -> Self {
        Self {
            node,
            group_index,
            group_name: group.name.clone(),
            visibility: group.visibility,
            is_relay: position == 0 && group.visibility.elects_relay(),
        }
    }

    /// Returns the host's hostname.
    #[must_use]
    pub fn hostname(&self) -> &str {
        self.node.hostname()
    }

    /// Returns the resolved host.
    #[must_use]
    pub const fn node(&self) -> &NetworkNode {
        &self.node
    }

    /// Returns the position of the host's group in the topology.
    #[must_use]
    pub const fn group_index(&self) -> usize {
        self.group_index
    }

    /// Returns the host's group name.
    #[must_use]
    pub fn group_name(&self) -> &str {
        &self.group_name
    }

    /// Returns the visibility mode of the host's group.
    #[must_use]
    pub const fn visibility(&self) -> VisibilityMode {
        self.visibility
    }

    /// Returns true if the host relays for the rest of its group.
    #[must_use]
    pub const fn is_relay(&self) -> bool {
        self.is_relay
    }

    /// Classifies how `requester` reaches this host.
    ///
    /// Hosts in other groups are reached publicly. Inside a group, ordinary
    /// hosts are reached on their private address, while the group's relay
    /// has no endpoint from its own members. Groups are told apart by name,
    /// so groups declared twice under one name share a LAN.
    #[must_use]
    pub fn endpoint_category(&self, requester: &Self) -> EndpointCategory {
        if self.group_name != requester.group_name {
            EndpointCategory::Public
        } else if self.is_relay {
            EndpointCategory::Unknown
        } else {
            EndpointCategory::Private
        }
    }

    /// Returns where `requester` should send packets for this host, if both
    /// an address and a listen port are known.
    #[must_use]
    pub fn endpoint_for(&self, requester: &Self) -> Option<Endpoint> {
        let server = &self.node.server;
        let address = match self.endpoint_category(requester) {
            EndpointCategory::Public => non_blank(server.public_address.as_ref())?,
            EndpointCategory::Private => non_blank(server.private_address.as_ref())?,
            EndpointCategory::Unknown => return None,
        };
        let port = self.node.listen_port?;
        Some(Endpoint::new(address, port))
    }

    /// Builds the `[Peer]` entry describing this host to `requester`.
    ///
    /// The public key is always derived from the host's private key; a
    /// stored public key is never trusted.
    #[must_use]
    pub fn to_peer(&self, requester: &Self, persistent_keepalive: Option<u16>) -> WgPeer {
        WgPeer {
            name: self.hostname().to_string(),
            endpoint: self.endpoint_for(requester),
            public_key: non_blank(self.node.private_key.as_ref())
                .and_then(|private| keys::public_key_for(private).ok()),
            allowed_ips: non_blank(self.node.address.as_ref())
                .map(|address| vec![address.to_string()])
                .unwrap_or_default(),
            persistent_keepalive,
        }
    }

    /// Builds this host's own `[Interface]` section.
    #[must_use]
    pub fn to_interface(&self) -> WgInterface {
        let node = &self.node;
        WgInterface {
            name: self.hostname().to_string(),
            address: node.address.clone(),
            listen_port: node.listen_port,
            private_key: node.private_key.clone(),
            dns: node.dns.clone(),
            table: node.table.clone(),
            mtu: node.mtu,
            pre_up: node.pre_up.clone(),
            post_up: node.post_up.clone(),
            pre_down: node.pre_down.clone(),
            post_down: node.post_down.clone(),
        }
    }
}
