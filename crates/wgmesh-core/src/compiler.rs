//! Topology to mesh compilation.
//!
//! [`MeshCompiler::new`] resolves a topology against network defaults: it
//! merges the subnet, claims every address already in use, fills missing
//! addresses and keys, copies defaults into unset host settings and indexes
//! the hosts by name. The caller's topology is never modified; the filled-in
//! copy is available from [`MeshCompiler::resolved_topology`].
//!
//! Every host's configuration lists all hosts of the mesh as peers, itself
//! included, in topology order.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::net::Ipv4Addr;

use ipnet::Ipv4Net;
use tracing::{debug, info, warn};

use crate::allocation::{SubnetAllocator, parse_host_address};
use crate::error::{MeshError, Result};
use crate::keys::{self, KeyPair};
use crate::node::HostWrapper;
use crate::topology::{NetDefaults, NetworkNode, NetworkTopology};
use crate::types::CompiledConfig;

/// Why a host received a fresh key pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RekeyReason {
    /// No private key was set.
    MissingPrivateKey,
    /// The private key is not base64 for 32 bytes.
    InvalidPrivateKey,
    /// No public key was set.
    MissingPublicKey,
    /// The public key is not base64 for 32 bytes.
    InvalidPublicKey,
    /// The public key does not belong to the private key.
    MismatchedPair,
}

impl fmt::Display for RekeyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingPrivateKey => write!(f, "missing private key"),
            Self::InvalidPrivateKey => write!(f, "invalid private key"),
            Self::MissingPublicKey => write!(f, "missing public key"),
            Self::InvalidPublicKey => write!(f, "invalid public key"),
            Self::MismatchedPair => write!(f, "public key does not match private key"),
        }
    }
}

/// A key regeneration performed during resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyRotation {
    /// The host that was re-keyed.
    pub hostname: String,
    /// What was wrong with its previous keys.
    pub reason: RekeyReason,
}

fn is_blank(value: Option<&String>) -> bool {
    value.is_none_or(|v| v.trim().is_empty())
}

/// Returns why `node` needs new keys, or `None` if its pair is usable.
fn rekey_reason(node: &NetworkNode) -> Option<RekeyReason> {
    let private = node.private_key.as_deref().map(str::trim).unwrap_or_default();
    if private.is_empty() {
        return Some(RekeyReason::MissingPrivateKey);
    }
    if !keys::format_valid(private) {
        return Some(RekeyReason::InvalidPrivateKey);
    }
    let public = node.public_key.as_deref().map(str::trim).unwrap_or_default();
    if public.is_empty() {
        return Some(RekeyReason::MissingPublicKey);
    }
    if !keys::format_valid(public) {
        return Some(RekeyReason::InvalidPublicKey);
    }
    if !keys::verify_pairing(private, public) {
        return Some(RekeyReason::MismatchedPair);
    }
    None
}

/// Fills the topology's subnet from the defaults where it is unset.
fn merge_subnet(topology: &mut NetworkTopology, defaults: &NetDefaults) {
    if is_blank(topology.address.as_ref()) && !is_blank(defaults.address.as_ref()) {
        info!(
            network = %topology.name,
            address = ?defaults.address,
            "using default subnet address"
        );
        topology.address.clone_from(&defaults.address);
    }
    if is_blank(topology.netmask.as_ref()) && !is_blank(defaults.netmask.as_ref()) {
        topology.netmask.clone_from(&defaults.netmask);
    }
}

/// Builds the allocator for the merged subnet. An address containing `/` is
/// taken as CIDR and any netmask is ignored.
fn subnet_allocator(topology: &NetworkTopology) -> Result<SubnetAllocator> {
    let address = topology
        .address
        .as_deref()
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .ok_or(MeshError::MissingSubnet)?;
    if address.contains('/') {
        return SubnetAllocator::from_cidr(address);
    }
    match topology.netmask.as_deref().map(str::trim).filter(|m| !m.is_empty()) {
        Some(netmask) => SubnetAllocator::from_address_and_netmask(address, netmask),
        None => Err(MeshError::InvalidSubnet(format!("{address}: no netmask given"))),
    }
}

fn trim_in_place(value: &mut Option<String>) {
    if let Some(v) = value.as_mut() {
        *v = v.trim().to_string();
    }
}

/// Strips surrounding whitespace from every single-line value that ends up
/// in a configuration file or a file name.
fn normalize_node(node: &mut NetworkNode) {
    node.server.hostname = node.server.hostname.trim().to_string();
    for value in [
        &mut node.server.public_address,
        &mut node.server.private_address,
        &mut node.address,
        &mut node.public_key,
        &mut node.private_key,
        &mut node.table,
    ] {
        trim_in_place(value);
    }
}

/// Claims every parseable address already set in the topology and returns
/// the hosts whose address was claimed by an earlier host.
fn claim_existing_addresses(topology: &NetworkTopology, allocator: &mut SubnetAllocator) -> Vec<(String, Ipv4Addr)> {
    let mut shared = Vec::new();
    for node in topology.network_nodes() {
        let Some(ip) = node.address.as_deref().and_then(parse_host_address) else {
            continue;
        };
        if allocator.is_allocated(ip) {
            warn!(
                hostname = %node.hostname(),
                address = %ip,
                "address already used by another host"
            );
            shared.push((node.hostname().to_string(), ip));
        }
        allocator.register_allocated_ip(ip);
    }
    shared
}

fn validate_hostnames(topology: &NetworkTopology) -> Result<()> {
    let mut seen = HashSet::new();
    for group in &topology.groups {
        for node in &group.hosts {
            let hostname = node.hostname();
            if hostname.is_empty() {
                return Err(MeshError::MissingHostname {
                    group: group.name.clone(),
                });
            }
            if !seen.insert(hostname) {
                return Err(MeshError::DuplicateHostname(hostname.to_string()));
            }
        }
    }
    Ok(())
}

fn fill_list(target: &mut Vec<String>, fallback: &[String]) {
    if target.iter().all(|v| v.trim().is_empty()) && !fallback.is_empty() {
        *target = fallback.to_vec();
    }
}

/// Copies defaults into every unset setting of `node`.
fn apply_defaults(node: &mut NetworkNode, defaults: &NetDefaults) {
    if node.listen_port.is_none() {
        node.listen_port = defaults.listen_port;
    }
    fill_list(&mut node.dns, &defaults.dns);
    if is_blank(node.table.as_ref()) && !is_blank(defaults.table.as_ref()) {
        node.table.clone_from(&defaults.table);
    }
    if node.mtu.is_none() {
        node.mtu = defaults.mtu;
    }
    fill_list(&mut node.pre_up, &defaults.pre_up);
    fill_list(&mut node.post_up, &defaults.post_up);
    fill_list(&mut node.pre_down, &defaults.pre_down);
    fill_list(&mut node.post_down, &defaults.post_down);
}

/// Compiles a topology into per-host configurations.
#[derive(Debug, Clone)]
pub struct MeshCompiler {
    topology: NetworkTopology,
    subnet: Ipv4Net,
    hosts: Vec<HostWrapper>,
    index: HashMap<String, usize>,
    persistent_keepalive: Option<u16>,
    rotations: Vec<KeyRotation>,
}

impl MeshCompiler {
    /// Resolves `topology` against `defaults`.
    ///
    /// # Errors
    ///
    /// Returns an error if no valid subnet is configured, a hostname is
    /// missing or duplicated, or the subnet runs out of addresses.
    pub fn new(topology: &NetworkTopology, defaults: &NetDefaults) -> Result<Self> {
        let mut resolved = topology.clone();
        merge_subnet(&mut resolved, defaults);
        let mut allocator = subnet_allocator(&resolved)?;
        resolved
            .groups
            .iter_mut()
            .flat_map(|g| g.hosts.iter_mut())
            .for_each(normalize_node);
        validate_hostnames(&resolved)?;

        claim_existing_addresses(&resolved, &mut allocator);
        debug!(
            network = %resolved.name,
            subnet = %allocator.subnet(),
            claimed = allocator.allocated_count(),
            "registered existing addresses"
        );

        let mut rotations = Vec::new();
        for node in resolved.groups.iter_mut().flat_map(|g| g.hosts.iter_mut()) {
            if node.ignore_default {
                if keys::public_key_for(node.private_key.as_deref().unwrap_or_default()).is_err() {
                    warn!(
                        hostname = %node.hostname(),
                        "host ignores defaults and has no usable private key; peers will omit its public key"
                    );
                }
                continue;
            }
            Self::assign_address(node, &mut allocator)?;
            if let Some(reason) = rekey_reason(node) {
                let pair = KeyPair::generate();
                node.private_key = Some(pair.private_key().to_base64());
                node.public_key = Some(pair.public_key().to_base64());
                info!(hostname = %node.hostname(), reason = %reason, "generated new key pair");
                rotations.push(KeyRotation {
                    hostname: node.hostname().to_string(),
                    reason,
                });
            }
            apply_defaults(node, defaults);
        }

        let mut hosts = Vec::new();
        let mut index = HashMap::new();
        for (group_index, group) in resolved.groups.iter().enumerate() {
            for (position, node) in group.hosts.iter().enumerate() {
                let host = HostWrapper::new(node.clone(), group_index, group, position);
                debug!(
                    hostname = %host.hostname(),
                    group = %host.group_name(),
                    visibility = %host.visibility(),
                    relay = host.is_relay(),
                    "indexed host"
                );
                index.insert(host.hostname().to_string(), hosts.len());
                hosts.push(host);
            }
        }

        Ok(Self {
            subnet: allocator.subnet(),
            topology: resolved,
            hosts,
            index,
            persistent_keepalive: defaults.persistent_keepalive,
            rotations,
        })
    }

    fn assign_address(node: &mut NetworkNode, allocator: &mut SubnetAllocator) -> Result<()> {
        let current = node.address.as_deref().and_then(parse_host_address);
        if current.is_some_and(|ip| allocator.is_in_subnet(ip)) {
            return Ok(());
        }
        if !is_blank(node.address.as_ref()) {
            warn!(
                hostname = %node.hostname(),
                address = ?node.address,
                subnet = %allocator.subnet(),
                "address outside subnet, allocating a new one"
            );
        }
        let ip = allocator.allocate_ip().ok_or_else(|| MeshError::SubnetExhausted {
            hostname: node.hostname().to_string(),
            subnet: allocator.subnet().to_string(),
        })?;
        debug!(hostname = %node.hostname(), address = %ip, "allocated address");
        node.address = Some(ip.to_string());
        Ok(())
    }

    /// Returns the topology with every gap filled.
    #[must_use]
    pub const fn resolved_topology(&self) -> &NetworkTopology {
        &self.topology
    }

    /// Returns the mesh subnet.
    #[must_use]
    pub const fn subnet(&self) -> Ipv4Net {
        self.subnet
    }

    /// Returns the key regenerations performed during resolution.
    #[must_use]
    pub fn key_rotations(&self) -> &[KeyRotation] {
        &self.rotations
    }

    /// Returns the hostnames of every re-keyed host.
    #[must_use]
    pub fn rekeyed_hosts(&self) -> Vec<&str> {
        self.rotations.iter().map(|r| r.hostname.as_str()).collect()
    }

    /// Iterates over hostnames in topology order.
    pub fn hostnames(&self) -> impl Iterator<Item = &str> {
        self.hosts.iter().map(HostWrapper::hostname)
    }

    /// Looks up a host by name.
    #[must_use]
    pub fn host(&self, hostname: &str) -> Option<&HostWrapper> {
        self.index.get(hostname).and_then(|&i| self.hosts.get(i))
    }

    fn compile_host(&self, host: &HostWrapper) -> CompiledConfig {
        CompiledConfig {
            network: self.topology.name.clone(),
            interface: host.to_interface(),
            peers: self
                .hosts
                .iter()
                .map(|peer| peer.to_peer(host, self.persistent_keepalive))
                .collect(),
        }
    }

    /// Compiles the configuration of one host, or `None` if it is not part
    /// of the mesh.
    #[must_use]
    pub fn config_for(&self, hostname: &str) -> Option<CompiledConfig> {
        self.host(hostname).map(|host| self.compile_host(host))
    }

    /// Compiles every host's configuration, in topology order.
    #[must_use]
    pub fn compile_all(&self) -> Vec<(String, CompiledConfig)> {
        self.hosts
            .iter()
            .map(|host| (host.hostname().to_string(), self.compile_host(host)))
            .collect()
    }

    /// Compiles every host's configuration, keyed by hostname.
    #[must_use]
    pub fn compile_map(&self) -> BTreeMap<String, CompiledConfig> {
        self.compile_all().into_iter().collect()
    }
}
