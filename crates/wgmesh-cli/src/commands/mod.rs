//! CLI command implementations.
//!
//! Each submodule implements a specific CLI command:
//! - [`generate`] - Compile a topology into configuration files
//! - [`show`] - Print one host's configuration
//! - [`keygen`] - Generate a key pair
//! - [`pubkey`] - Derive a public key

pub mod generate;
pub mod keygen;
pub mod pubkey;
pub mod show;

pub use generate::GenerateCommand;
pub use keygen::KeygenCommand;
pub use pubkey::PubkeyCommand;
pub use show::ShowCommand;
