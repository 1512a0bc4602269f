//! # wgmesh-cli
//!
//! Command-line front end for `wgmesh-core`.
//!
//! Provides commands for:
//! - Compiling a topology into one `wg-quick` file per host
//! - Printing a single host's configuration
//! - Generating and inspecting key material
//!
//! Network defaults come from an optional JSON file (`--defaults` or
//! `WGMESH_DEFAULTS`) with individual flags layered on top.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cli;
pub mod commands;
pub mod defaults;
pub mod error;
pub mod output;

pub use cli::{Cli, Commands, DefaultsArgs, Format, GenerateArgs, PubkeyArgs, ShowArgs};
pub use error::CliError;
pub use output::OutputFormat;
