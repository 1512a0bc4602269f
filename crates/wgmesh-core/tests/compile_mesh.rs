//! End-to-end mesh compilation tests.
//!
//! A three-group topology (cloud, relayed office, open home network) is
//! compiled and the resulting per-host configurations are checked for
//! address uniqueness, endpoint selection, key repair and stable output.

use std::collections::HashSet;

use wgmesh_core::{
    EndpointCategory, KeyPair, LocalAreaNetwork, MeshCompiler, MeshError, NetDefaults, NetworkNode,
    NetworkTopology, RekeyReason, ServerNode, VisibilityMode, WgPeer, verify_pairing,
};

fn host(name: &str, public: &str, private: &str) -> NetworkNode {
    NetworkNode::new(
        ServerNode::new(name)
            .with_public_address(public)
            .with_private_address(private),
    )
}

fn defaults() -> NetDefaults {
    NetDefaults {
        address: Some("10.20.0.0".into()),
        netmask: Some("255.255.255.0".into()),
        listen_port: Some(51820),
        dns: vec!["1.1.1.1".into()],
        persistent_keepalive: Some(25),
        ..NetDefaults::default()
    }
}

fn mesh() -> NetworkTopology {
    NetworkTopology::new("corp")
        .with_group(
            LocalAreaNetwork::new("cloud", VisibilityMode::Cloud)
                .with_host(host("c1", "181.1.1.1", "172.31.0.1"))
                .with_host(host("c2", "181.1.1.2", "172.31.0.2")),
        )
        .with_group(
            LocalAreaNetwork::new("office", VisibilityMode::Relayed)
                .with_host(host("relay", "203.0.113.10", "192.168.1.1"))
                .with_host(host("o1", "", "192.168.1.2"))
                .with_host(host("o2", "", "192.168.1.3")),
        )
        .with_group(
            LocalAreaNetwork::new("home", VisibilityMode::Open)
                .with_host(host("h1", "198.51.100.7", "192.168.0.10")),
        )
}

fn peer<'a>(peers: &'a [WgPeer], name: &str) -> &'a WgPeer {
    peers
        .iter()
        .find(|p| p.name == name)
        .expect("peer listed")
}

fn endpoint(peers: &[WgPeer], name: &str) -> Option<String> {
    peer(peers, name).endpoint.as_ref().map(ToString::to_string)
}

// ============================================================================
// Addressing
// ============================================================================

#[test]
fn test_every_host_gets_a_unique_address_in_subnet() {
    let compiler = MeshCompiler::new(&mesh(), &defaults()).expect("compiles");
    let mut seen = HashSet::new();
    for node in compiler.resolved_topology().network_nodes() {
        let address = node.address.clone().expect("address assigned");
        assert!(address.starts_with("10.20.0."), "{address} outside subnet");
        assert!(seen.insert(address), "address reused");
    }
    assert_eq!(seen.len(), 6);
}

#[test]
fn test_first_allocation_and_preregistered_address() {
    let topo = NetworkTopology {
        name: "n".into(),
        address: Some("10.2.1.0".into()),
        netmask: Some("255.255.0.0".into()),
        groups: vec![LocalAreaNetwork::new("g", VisibilityMode::Open).with_host(host("a", "1.1.1.1", ""))],
    };
    let compiler = MeshCompiler::new(&topo, &NetDefaults::default()).expect("compiles");
    assert_eq!(compiler.host("a").expect("a").node().address.as_deref(), Some("10.2.0.1"));

    let topo = NetworkTopology {
        groups: vec![
            LocalAreaNetwork::new("g", VisibilityMode::Open)
                .with_host(host("a", "1.1.1.1", ""))
                .with_host(host("b", "1.1.1.2", "").with_address("10.2.0.1")),
        ],
        ..topo
    };
    let compiler = MeshCompiler::new(&topo, &NetDefaults::default()).expect("compiles");
    assert_eq!(compiler.host("a").expect("a").node().address.as_deref(), Some("10.2.0.2"));
    assert_eq!(compiler.host("b").expect("b").node().address.as_deref(), Some("10.2.0.1"));
}

#[test]
fn test_valid_addresses_are_kept_and_foreign_ones_replaced() {
    let topo = NetworkTopology::new("n").with_subnet("10.9.0.0/24").with_group(
        LocalAreaNetwork::new("g", VisibilityMode::Open)
            .with_host(host("foreign", "", "").with_address("192.168.5.5"))
            .with_host(host("kept", "", "").with_address("10.9.0.1/32"))
            .with_host(host("garbage", "", "").with_address("not-an-ip")),
    );
    let compiler = MeshCompiler::new(&topo, &NetDefaults::default()).expect("compiles");
    let address = |name: &str| compiler.host(name).expect("host").node().address.clone();
    assert_eq!(address("kept").as_deref(), Some("10.9.0.1/32"));
    assert_eq!(address("foreign").as_deref(), Some("10.9.0.2"));
    assert_eq!(address("garbage").as_deref(), Some("10.9.0.3"));
}

#[test]
fn test_exhausted_subnet_aborts_compilation() {
    let topo = NetworkTopology::new("n").with_subnet("10.9.0.0/30").with_group(
        LocalAreaNetwork::new("g", VisibilityMode::Open)
            .with_host(host("a", "", ""))
            .with_host(host("b", "", ""))
            .with_host(host("c", "", "")),
    );
    let err = MeshCompiler::new(&topo, &NetDefaults::default()).expect_err("exhausted");
    assert!(matches!(err, MeshError::SubnetExhausted { .. }));
}

// ============================================================================
// Endpoint Resolution
// ============================================================================

#[test]
fn test_relay_member_view() {
    let compiler = MeshCompiler::new(&mesh(), &defaults()).expect("compiles");
    let config = compiler.config_for("o1").expect("o1");

    assert_eq!(endpoint(&config.peers, "relay"), None);
    assert_eq!(endpoint(&config.peers, "o2").as_deref(), Some("192.168.1.3:51820"));
    assert_eq!(endpoint(&config.peers, "o1").as_deref(), Some("192.168.1.2:51820"));
    assert_eq!(endpoint(&config.peers, "c1").as_deref(), Some("181.1.1.1:51820"));
    assert_eq!(endpoint(&config.peers, "h1").as_deref(), Some("198.51.100.7:51820"));
}

#[test]
fn test_relay_view() {
    let compiler = MeshCompiler::new(&mesh(), &defaults()).expect("compiles");
    let config = compiler.config_for("relay").expect("relay");

    assert_eq!(endpoint(&config.peers, "relay"), None);
    assert_eq!(endpoint(&config.peers, "o1").as_deref(), Some("192.168.1.2:51820"));
    assert_eq!(endpoint(&config.peers, "c2").as_deref(), Some("181.1.1.2:51820"));
}

#[test]
fn test_outside_view_of_relayed_group() {
    let compiler = MeshCompiler::new(&mesh(), &defaults()).expect("compiles");
    let config = compiler.config_for("h1").expect("h1");

    assert_eq!(endpoint(&config.peers, "relay").as_deref(), Some("203.0.113.10:51820"));
    // members of a relayed group have no public address to offer
    assert_eq!(endpoint(&config.peers, "o1"), None);
    assert_eq!(endpoint(&config.peers, "c1").as_deref(), Some("181.1.1.1:51820"));
}

#[test]
fn test_endpoint_categories_match_group_membership() {
    let compiler = MeshCompiler::new(&mesh(), &defaults()).expect("compiles");
    let relay = compiler.host("relay").expect("relay");
    let o1 = compiler.host("o1").expect("o1");
    let c1 = compiler.host("c1").expect("c1");
    let c2 = compiler.host("c2").expect("c2");

    assert_eq!(relay.endpoint_category(o1), EndpointCategory::Unknown);
    assert_eq!(o1.endpoint_category(relay), EndpointCategory::Private);
    assert_eq!(c2.endpoint_category(c1), EndpointCategory::Private);
    assert_eq!(c1.endpoint_category(o1), EndpointCategory::Public);
    assert_eq!(relay.endpoint_category(c1), EndpointCategory::Public);
}

#[test]
fn test_every_config_lists_all_hosts_in_order() {
    let compiler = MeshCompiler::new(&mesh(), &defaults()).expect("compiles");
    let expected: Vec<&str> = compiler.hostnames().collect();
    for (hostname, config) in compiler.compile_all() {
        assert_eq!(config.hostname(), hostname);
        assert_eq!(config.network, "corp");
        let names: Vec<&str> = config.peers.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, expected);
        assert!(config.peers.iter().all(|p| p.persistent_keepalive == Some(25)));
    }
}

// ============================================================================
// Key Material
// ============================================================================

#[test]
fn test_keys_are_repaired_and_valid_pairs_kept() {
    let good = KeyPair::generate();
    let stray = KeyPair::generate();
    let topo = NetworkTopology::new("n").with_subnet("10.9.0.0/24").with_group(
        LocalAreaNetwork::new("g", VisibilityMode::Open)
            .with_host(host("good", "", "").with_keys(good.private_key().to_base64(), good.public_key().to_base64()))
            .with_host(
                host("mismatch", "", "")
                    .with_keys(good.private_key().to_base64(), stray.public_key().to_base64()),
            )
            .with_host(host("empty", "", "")),
    );
    let compiler = MeshCompiler::new(&topo, &NetDefaults::default()).expect("compiles");

    let good_node = compiler.host("good").expect("good").node();
    assert_eq!(good_node.private_key, Some(good.private_key().to_base64()));

    let mismatch = compiler.host("mismatch").expect("mismatch").node();
    assert_ne!(mismatch.private_key, Some(good.private_key().to_base64()));
    assert!(verify_pairing(
        mismatch.private_key.as_deref().expect("private"),
        mismatch.public_key.as_deref().expect("public"),
    ));

    let reasons: Vec<(&str, RekeyReason)> = compiler
        .key_rotations()
        .iter()
        .map(|r| (r.hostname.as_str(), r.reason))
        .collect();
    assert_eq!(
        reasons,
        [
            ("mismatch", RekeyReason::MismatchedPair),
            ("empty", RekeyReason::MissingPrivateKey)
        ]
    );
}

#[test]
fn test_peer_public_keys_derive_from_private_keys() {
    let compiler = MeshCompiler::new(&mesh(), &defaults()).expect("compiles");
    let config = compiler.config_for("c1").expect("c1");
    for node in compiler.resolved_topology().network_nodes() {
        let entry = peer(&config.peers, node.hostname());
        assert_eq!(entry.public_key, node.public_key);
        assert_eq!(entry.allowed_ips, [node.address.clone().expect("address")]);
    }
}

// ============================================================================
// Stability
// ============================================================================

#[test]
fn test_recompiling_resolved_topology_is_identical() {
    let first = MeshCompiler::new(&mesh(), &defaults()).expect("compiles");
    let second = MeshCompiler::new(first.resolved_topology(), &defaults()).expect("recompiles");

    assert!(second.key_rotations().is_empty());
    assert_eq!(first.resolved_topology(), second.resolved_topology());
    assert_eq!(first.compile_map(), second.compile_map());
}

#[test]
fn test_input_topology_is_not_modified() {
    let topo = mesh();
    let before = topo.clone();
    let _ = MeshCompiler::new(&topo, &defaults()).expect("compiles");
    assert_eq!(topo, before);
}

// ============================================================================
// Defaults Opt-out
// ============================================================================

#[test]
fn test_ignore_default_host_is_left_alone() {
    let topo = mesh().with_group(
        LocalAreaNetwork::new("manual", VisibilityMode::Wan)
            .with_host(host("bare", "192.0.2.50", "").ignoring_defaults()),
    );
    let compiler = MeshCompiler::new(&topo, &defaults()).expect("compiles");
    let bare = compiler.host("bare").expect("bare").node();
    assert!(bare.address.is_none());
    assert!(bare.private_key.is_none());
    assert!(bare.listen_port.is_none());
    assert!(bare.dns.is_empty());
    assert!(!compiler.rekeyed_hosts().contains(&"bare"));

    let own = compiler.config_for("bare").expect("bare").to_ini_string();
    assert_eq!(own.lines().take(2).collect::<Vec<_>>(), ["[Interface]", "# Name = bare"]);
    assert!(!own.lines().nth(2).unwrap_or_default().starts_with("Address"));

    let seen_by_c1 = compiler.config_for("c1").expect("c1");
    let entry = peer(&seen_by_c1.peers, "bare");
    assert!(entry.public_key.is_none());
    assert!(entry.allowed_ips.is_empty());
    assert!(entry.endpoint.is_none());
}

// ============================================================================
// Documents And Rendering
// ============================================================================

#[test]
fn test_legacy_document_compiles_to_ini() {
    let json = r#"{
        "name": "legacy",
        "address": "10.201.1.0",
        "netmask": "255.255.255.0",
        "local_area_networks": [
            { "name": "bridge", "network_type": "BRIDGE_NAT", "network_nodes": [
                { "server_node": { "hostname": "gw", "public_address": "181.1.1.1", "private_address": "10.0.4.1" } },
                { "server_node": { "hostname": "pc", "private_address": "10.0.4.2" } }
            ] }
        ]
    }"#;
    let topo = NetworkTopology::from_json(json).expect("valid document");
    let defaults = NetDefaults {
        listen_port: Some(51820),
        ..NetDefaults::default()
    };
    let compiler = MeshCompiler::new(&topo, &defaults).expect("compiles");
    let text = compiler.config_for("pc").expect("pc").to_string();

    assert!(text.starts_with("[Interface]\n# Name = pc\nAddress = 10.201.1.2\nListenPort = 51820\nPrivateKey = "));
    assert!(text.contains("\n\n[Peer]\n# Name = gw\nPublicKey = "));
    assert!(text.contains("\n\n[Peer]\n# Name = pc\nEndpoint = 10.0.4.2:51820\nPublicKey = "));
    assert!(text.contains("AllowedIPs = 10.201.1.1\n"));
    assert!(!text.contains("PersistentKeepalive"));
    assert!(text.ends_with('\n'));
    assert!(!text.contains("\n\n\n"));
}
