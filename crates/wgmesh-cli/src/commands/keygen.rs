//! Keygen command implementation.

use std::io::Write;

use wgmesh_core::KeyPair;

use crate::error::CliError;
use crate::output::{KeyPairInfo, OutputFormat};

/// Keygen command executor.
#[derive(Debug, Default)]
pub struct KeygenCommand;

impl KeygenCommand {
    /// Create a new keygen command.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Execute the keygen command.
    ///
    /// # Errors
    ///
    /// Returns an error if output fails.
    pub fn execute<W: Write>(&self, writer: &mut W, format: &OutputFormat) -> Result<(), CliError> {
        let pair = KeyPair::generate();
        let info = KeyPairInfo {
            private_key: pair.private_key().to_base64(),
            public_key: pair.public_key().to_base64(),
        };
        format.write(writer, &info)
    }
}
