//! `WireGuard` mesh compilation.
//!
//! Turns a declarative [`NetworkTopology`] (hosts grouped into local networks,
//! each with a [`VisibilityMode`]) into one `wg-quick` configuration per host.
//! The compiler assigns conflict-free addresses from the mesh subnet, repairs
//! missing or mismatched key pairs, and decides for every pair of hosts how
//! one reaches the other.
//!
//! ```no_run
//! use wgmesh_core::{MeshCompiler, NetDefaults, NetworkTopology};
//!
//! # fn main() -> wgmesh_core::Result<()> {
//! let topology = NetworkTopology::from_file("mesh.json")?;
//! let compiler = MeshCompiler::new(&topology, &NetDefaults::default())?;
//! for (hostname, config) in compiler.compile_all() {
//!     println!("# {hostname}\n{config}");
//! }
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

pub mod allocation;
pub mod compiler;
pub mod config;
pub mod error;
pub mod generate;
pub mod keys;
pub mod node;
pub mod signature;
pub mod topology;
pub mod types;

pub use allocation::SubnetAllocator;
pub use compiler::{KeyRotation, MeshCompiler, RekeyReason};
pub use error::{MeshError, Result};
pub use generate::{GenerateRequest, GenerateResult, generate};
pub use keys::{KEY_SIZE, KeyPair, PrivateKey, PublicKey, format_valid, generate_private_key, public_key_for, verify_pairing};
pub use node::HostWrapper;
pub use topology::{LocalAreaNetwork, NetDefaults, NetworkNode, NetworkTopology, ServerNode, VisibilityMode};
pub use types::{CompiledConfig, Endpoint, EndpointCategory, WgInterface, WgPeer};
