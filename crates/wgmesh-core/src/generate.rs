//! One-call generation envelope for registries and other callers that hold
//! the topology and defaults together as a single document.

use serde::{Deserialize, Serialize};

use crate::compiler::MeshCompiler;
use crate::error::Result;
use crate::topology::{NetDefaults, NetworkTopology};

/// Defaults and topology submitted together.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateRequest {
    /// Network-wide defaults.
    #[serde(default)]
    pub properties: NetDefaults,
    /// The topology to compile.
    #[serde(rename = "struct")]
    pub topology: NetworkTopology,
}

/// One host's rendered configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateResult {
    /// Host the configuration belongs to.
    pub hostname: String,
    /// `wg-quick` INI text.
    pub config: String,
}

impl GenerateRequest {
    /// Parses a request from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed.
    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }
}

/// Compiles `request` and renders every host's configuration, in topology
/// order.
///
/// # Errors
///
/// Returns any error raised while resolving the topology.
pub fn generate(request: &GenerateRequest) -> Result<Vec<GenerateResult>> {
    let compiler = MeshCompiler::new(&request.topology, &request.properties)?;
    Ok(compiler
        .compile_all()
        .into_iter()
        .map(|(hostname, config)| GenerateResult {
            hostname,
            config: config.to_ini_string(),
        })
        .collect())
}
