//! CLI error types.

use std::fmt;

use wgmesh_core::MeshError;

/// CLI-specific errors.
#[derive(Debug)]
pub enum CliError {
    /// Invalid configuration.
    Config(String),
    /// Loading or compiling the mesh failed.
    Mesh(MeshError),
    /// Host not found in the topology.
    HostNotFound(String),
    /// Output formatting error.
    Format(String),
    /// Invalid argument.
    InvalidArgument(String),
    /// IO error.
    Io(std::io::Error),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "configuration error: {msg}"),
            Self::Mesh(e) => write!(f, "mesh error: {e}"),
            Self::HostNotFound(name) => write!(f, "host not found: {name}"),
            Self::Format(msg) => write!(f, "format error: {msg}"),
            Self::InvalidArgument(msg) => write!(f, "invalid argument: {msg}"),
            Self::Io(e) => write!(f, "IO error: {e}"),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Mesh(e) => Some(e),
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<MeshError> for CliError {
    fn from(err: MeshError) -> Self {
        Self::Mesh(err)
    }
}
