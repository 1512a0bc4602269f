//! Show command implementation.

use std::io::Write;

use tracing::debug;
use wgmesh_core::{CompiledConfig, MeshCompiler, NetDefaults, NetworkTopology};

use crate::cli::ShowArgs;
use crate::error::CliError;
use crate::output::OutputFormat;

/// Show command executor.
pub struct ShowCommand {
    defaults: NetDefaults,
}

impl ShowCommand {
    /// Create a new show command with the given network defaults.
    #[must_use]
    pub const fn new(defaults: NetDefaults) -> Self {
        Self { defaults }
    }

    /// Execute the show command.
    ///
    /// # Errors
    ///
    /// Returns an error if the topology cannot be compiled or the host is
    /// not part of it.
    pub fn execute<W: Write>(&self, writer: &mut W, format: &OutputFormat, args: &ShowArgs) -> Result<(), CliError> {
        let config = self.compile(args)?;
        format.write(writer, &config)
    }

    /// Compile the requested host's configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the topology cannot be compiled or the host is
    /// not part of it.
    pub fn compile(&self, args: &ShowArgs) -> Result<CompiledConfig, CliError> {
        let topology = NetworkTopology::from_file(&args.topology)?;
        let compiler = MeshCompiler::new(&topology, &self.defaults)?;
        debug!(hostname = %args.hostname, "compiling single host");
        compiler
            .config_for(&args.hostname)
            .ok_or_else(|| CliError::HostNotFound(args.hostname.clone()))
    }
}
