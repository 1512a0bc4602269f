//! Pubkey command implementation.

use std::io::Write;

use crate::cli::PubkeyArgs;
use crate::error::CliError;
use crate::output::{OutputFormat, PublicKeyInfo};

/// Pubkey command executor.
#[derive(Debug, Default)]
pub struct PubkeyCommand;

impl PubkeyCommand {
    /// Create a new pubkey command.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Execute the pubkey command.
    ///
    /// # Errors
    ///
    /// Returns an error if the private key is malformed or output fails.
    pub fn execute<W: Write>(&self, writer: &mut W, format: &OutputFormat, args: &PubkeyArgs) -> Result<(), CliError> {
        let public_key = wgmesh_core::public_key_for(&args.private_key)
            .map_err(|e| CliError::InvalidArgument(format!("private key: {e}")))?;
        format.write(writer, &PublicKeyInfo { public_key })
    }
}
