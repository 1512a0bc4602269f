//! `wg-quick` configuration text generation.
//!
//! Each section is rendered from a static table of fields. A field whose
//! value is absent or blank produces no line at all, so partially filled
//! hosts still yield valid files.

use crate::types::{CompiledConfig, WgInterface, WgPeer};

/// A single-line `Label = value` field.
struct Field<T> {
    label: &'static str,
    value: fn(&T) -> Option<String>,
}

/// A field written once per entry, e.g. `PostUp`.
struct RepeatedField<T> {
    label: &'static str,
    lines: fn(&T) -> &[String],
}

fn text(value: Option<&String>) -> Option<String> {
    value.map(|v| v.trim()).filter(|v| !v.is_empty()).map(str::to_string)
}

fn joined(values: &[String]) -> Option<String> {
    let parts: Vec<&str> = values
        .iter()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .collect();
    (!parts.is_empty()).then(|| parts.join(","))
}

fn name_of(name: &str) -> Option<String> {
    let name = name.trim();
    (!name.is_empty()).then(|| name.to_string())
}

const INTERFACE_FIELDS: &[Field<WgInterface>] = &[
    Field {
        label: "# Name",
        value: |i| name_of(&i.name),
    },
    Field {
        label: "Address",
        value: |i| text(i.address.as_ref()),
    },
    Field {
        label: "ListenPort",
        value: |i| i.listen_port.map(|p| p.to_string()),
    },
    Field {
        label: "PrivateKey",
        value: |i| text(i.private_key.as_ref()),
    },
    Field {
        label: "DNS",
        value: |i| joined(&i.dns),
    },
    Field {
        label: "Table",
        value: |i| text(i.table.as_ref()),
    },
    Field {
        label: "MTU",
        value: |i| i.mtu.map(|m| m.to_string()),
    },
];

const INTERFACE_HOOKS: &[RepeatedField<WgInterface>] = &[
    RepeatedField {
        label: "PreUp",
        lines: |i| i.pre_up.as_slice(),
    },
    RepeatedField {
        label: "PostUp",
        lines: |i| i.post_up.as_slice(),
    },
    RepeatedField {
        label: "PreDown",
        lines: |i| i.pre_down.as_slice(),
    },
    RepeatedField {
        label: "PostDown",
        lines: |i| i.post_down.as_slice(),
    },
];

const PEER_FIELDS: &[Field<WgPeer>] = &[
    Field {
        label: "# Name",
        value: |p| name_of(&p.name),
    },
    Field {
        label: "Endpoint",
        value: |p| p.endpoint.as_ref().map(ToString::to_string),
    },
    Field {
        label: "PublicKey",
        value: |p| text(p.public_key.as_ref()),
    },
    Field {
        label: "AllowedIPs",
        value: |p| joined(&p.allowed_ips),
    },
    Field {
        label: "PersistentKeepalive",
        value: |p| p.persistent_keepalive.map(|k| k.to_string()),
    },
];

fn render_section<T>(header: &str, item: &T, fields: &[Field<T>], hooks: &[RepeatedField<T>]) -> String {
    let mut lines = vec![header.to_string()];
    for field in fields {
        if let Some(value) = (field.value)(item) {
            lines.push(format!("{} = {value}", field.label));
        }
    }
    for hook in hooks {
        for line in (hook.lines)(item) {
            let line = line.trim();
            if !line.is_empty() {
                lines.push(format!("{} = {line}", hook.label));
            }
        }
    }
    lines.join("\n")
}

/// Renders an `[Interface]` section without a trailing newline.
#[must_use]
pub fn render_interface(interface: &WgInterface) -> String {
    render_section("[Interface]", interface, INTERFACE_FIELDS, INTERFACE_HOOKS)
}

/// Renders a `[Peer]` section without a trailing newline.
#[must_use]
pub fn render_peer(peer: &WgPeer) -> String {
    render_section("[Peer]", peer, PEER_FIELDS, &[])
}

/// Renders a whole configuration: the interface, then each peer, sections
/// separated by one blank line and the text terminated by a newline.
#[must_use]
pub fn render_config(config: &CompiledConfig) -> String {
    let mut sections = Vec::with_capacity(config.peers.len() + 1);
    sections.push(render_interface(&config.interface));
    sections.extend(config.peers.iter().map(render_peer));
    let mut output = sections.join("\n\n");
    output.push('\n');
    output
}
