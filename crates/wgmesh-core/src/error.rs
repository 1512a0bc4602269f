//! Error types for mesh compilation.

use thiserror::Error;

/// Result type for mesh operations.
pub type Result<T> = std::result::Result<T, MeshError>;

/// Errors that can occur while loading a topology or compiling a mesh.
#[derive(Debug, Error)]
pub enum MeshError {
    /// The topology or defaults document could not be parsed.
    #[error("invalid document: {0}")]
    Json(#[from] serde_json::Error),

    /// A document could not be read from disk.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Neither the topology nor the defaults declare a subnet.
    #[error("no subnet configured: topology and defaults both lack an address")]
    MissingSubnet,

    /// The subnet address or netmask is malformed.
    #[error("invalid subnet: {0}")]
    InvalidSubnet(String),

    /// A host in the given group has no hostname.
    #[error("host in group '{group}' has an empty hostname")]
    MissingHostname {
        /// Name of the group the host was declared in.
        group: String,
    },

    /// Two hosts share the same hostname.
    #[error("hostname '{0}' is declared more than once")]
    DuplicateHostname(String),

    /// The subnet has no free addresses left for a host.
    #[error("subnet {subnet} has no free address left for host '{hostname}'")]
    SubnetExhausted {
        /// Host that needed an address.
        hostname: String,
        /// The exhausted subnet.
        subnet: String,
    },

    /// Invalid base64 encoding.
    #[error("invalid base64 encoding: {0}")]
    InvalidBase64(String),

    /// Invalid key length.
    #[error("invalid key length: expected 32, got {0}")]
    InvalidKeyLength(usize),
}
