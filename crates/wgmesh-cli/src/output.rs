//! Output formatting for CLI commands.
//!
//! Supports plain text (human-readable) and JSON output formats.

use std::io::Write;
use std::path::PathBuf;

use serde::Serialize;
use wgmesh_core::CompiledConfig;

use crate::cli::Format;
use crate::error::CliError;

/// Output formatter that handles both text and JSON output.
#[derive(Debug, Clone)]
pub struct OutputFormat {
    format: Format,
}

impl OutputFormat {
    /// Create a new output formatter.
    #[must_use]
    pub const fn new(format: Format) -> Self {
        Self { format }
    }

    /// Get the current format.
    #[must_use]
    pub const fn format(&self) -> Format {
        self.format
    }

    /// Write a serializable value to the output.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write<W, T>(&self, writer: &mut W, value: &T) -> Result<(), CliError>
    where
        W: Write,
        T: Serialize + TextDisplay,
    {
        match self.format {
            Format::Json => {
                serde_json::to_writer_pretty(&mut *writer, value)
                    .map_err(|e| CliError::Format(format!("JSON serialization failed: {e}")))?;
                writeln!(writer)?;
            }
            Format::Text => {
                value.write_text(writer)?;
            }
        }
        Ok(())
    }

    /// Write a serializable value to a string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_string<T>(&self, value: &T) -> Result<String, CliError>
    where
        T: Serialize + TextDisplay,
    {
        let mut buf = Vec::new();
        self.write(&mut buf, value)?;
        String::from_utf8(buf).map_err(|e| CliError::Format(format!("UTF-8 error: {e}")))
    }
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::new(Format::Text)
    }
}

/// Trait for types that can be displayed as plain text.
pub trait TextDisplay {
    /// Write the value as human-readable text.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    fn write_text<W: Write>(&self, writer: &mut W) -> Result<(), CliError>;
}

/// A configuration file written by `generate`.
#[derive(Debug, Clone, Serialize)]
pub struct WrittenConfig {
    /// Host the file belongs to.
    pub hostname: String,
    /// Where the file was written.
    pub path: PathBuf,
}

/// Result of a `generate` run.
#[derive(Debug, Clone, Serialize)]
pub struct GenerateSummary {
    /// Network name.
    pub network: String,
    /// Mesh subnet in CIDR notation.
    pub subnet: String,
    /// Files written, in topology order.
    pub files: Vec<WrittenConfig>,
    /// Hosts that received new keys.
    pub rekeyed: Vec<String>,
    /// Where the filled-in topology was saved, if requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved: Option<PathBuf>,
}

impl TextDisplay for GenerateSummary {
    fn write_text<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(
            writer,
            "Network {} ({}): {} configuration(s)",
            self.network,
            self.subnet,
            self.files.len()
        )?;
        for file in &self.files {
            writeln!(writer, "  {:<24} {}", file.hostname, file.path.display())?;
        }
        if !self.rekeyed.is_empty() {
            writeln!(writer, "New keys: {}", self.rekeyed.join(", "))?;
        }
        if let Some(path) = &self.resolved {
            writeln!(writer, "Resolved topology: {}", path.display())?;
        }
        Ok(())
    }
}

impl TextDisplay for CompiledConfig {
    fn write_text<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writer.write_all(self.to_ini_string().as_bytes())?;
        Ok(())
    }
}

/// A generated key pair.
#[derive(Debug, Clone, Serialize)]
pub struct KeyPairInfo {
    /// Base64 private key.
    pub private_key: String,
    /// Base64 public key.
    pub public_key: String,
}

impl TextDisplay for KeyPairInfo {
    fn write_text<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(writer, "PrivateKey = {}", self.private_key)?;
        writeln!(writer, "PublicKey = {}", self.public_key)?;
        Ok(())
    }
}

/// A derived public key.
#[derive(Debug, Clone, Serialize)]
pub struct PublicKeyInfo {
    /// Base64 public key.
    pub public_key: String,
}

impl TextDisplay for PublicKeyInfo {
    fn write_text<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(writer, "{}", self.public_key)?;
        Ok(())
    }
}
