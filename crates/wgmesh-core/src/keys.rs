//! `WireGuard` key material.
//!
//! Keys are 32-byte Curve25519 values that travel through topology documents
//! and configuration files as standard base64. The free functions at the
//! bottom of this module work directly on those strings and are what the
//! compiler uses; the typed keys back them.

use std::fmt;
use std::str::FromStr;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use rand_core::{OsRng, RngCore};
use subtle::ConstantTimeEq;
use x25519_dalek::StaticSecret;

use crate::error::{MeshError, Result};
use crate::signature;

/// Size of a Curve25519 key in bytes.
pub const KEY_SIZE: usize = 32;

/// Size of the random message signed by [`verify_pairing`].
const PAIRING_PROBE_SIZE: usize = 64;

fn decode_key(encoded: &str) -> Result<[u8; KEY_SIZE]> {
    let bytes = STANDARD
        .decode(encoded.trim())
        .map_err(|e| MeshError::InvalidBase64(e.to_string()))?;
    <[u8; KEY_SIZE]>::try_from(bytes.as_slice()).map_err(|_| MeshError::InvalidKeyLength(bytes.len()))
}

/// A peer's public key.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PublicKey([u8; KEY_SIZE]);

impl PublicKey {
    /// Wraps raw key bytes.
    #[must_use]
    pub const fn from_bytes_array(bytes: [u8; KEY_SIZE]) -> Self {
        Self(bytes)
    }

    /// Raw key bytes (the Montgomery `u` coordinate).
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }

    /// Base64 form, as written after `PublicKey =`.
    #[must_use]
    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.0)
    }
}

impl FromStr for PublicKey {
    type Err = MeshError;

    fn from_str(s: &str) -> Result<Self> {
        decode_key(s).map(Self)
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let encoded = self.to_base64();
        write!(f, "PublicKey({}..)", &encoded[..8])
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_base64())
    }
}

/// A host's private key. Never printed by `Debug`.
#[derive(Clone)]
pub struct PrivateKey([u8; KEY_SIZE]);

impl PrivateKey {
    /// Draws a fresh key from the operating system RNG.
    #[must_use]
    pub fn generate() -> Self {
        Self(StaticSecret::random_from_rng(OsRng).to_bytes())
    }

    /// Wraps raw key bytes.
    #[must_use]
    pub const fn from_bytes_array(bytes: [u8; KEY_SIZE]) -> Self {
        Self(bytes)
    }

    /// Raw key bytes, unclamped.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }

    /// Computes the X25519 public key, identical to `wg pubkey`.
    #[must_use]
    pub fn public_key(&self) -> PublicKey {
        let public = x25519_dalek::PublicKey::from(&StaticSecret::from(self.0));
        PublicKey(public.to_bytes())
    }

    /// Base64 form, as written after `PrivateKey =`.
    #[must_use]
    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.0)
    }
}

impl FromStr for PrivateKey {
    type Err = MeshError;

    fn from_str(s: &str) -> Result<Self> {
        decode_key(s).map(Self)
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PrivateKey([REDACTED])")
    }
}

impl PartialEq for PrivateKey {
    fn eq(&self, other: &Self) -> bool {
        self.0.ct_eq(&other.0).into()
    }
}

impl Eq for PrivateKey {}

/// A private key with its derived public key.
#[derive(Debug, Clone)]
pub struct KeyPair {
    private: PrivateKey,
    public: PublicKey,
}

impl KeyPair {
    /// Generates a new pair.
    #[must_use]
    pub fn generate() -> Self {
        Self::from_private_key(PrivateKey::generate())
    }

    /// Completes a pair from its private half.
    #[must_use]
    pub fn from_private_key(private: PrivateKey) -> Self {
        let public = private.public_key();
        Self { private, public }
    }

    /// The private half.
    #[must_use]
    pub const fn private_key(&self) -> &PrivateKey {
        &self.private
    }

    /// The public half.
    #[must_use]
    pub const fn public_key(&self) -> &PublicKey {
        &self.public
    }
}

/// Generates a fresh private key, base64 encoded.
#[must_use]
pub fn generate_private_key() -> String {
    PrivateKey::generate().to_base64()
}

/// Derives the base64 public key for a base64 private key.
///
/// # Errors
///
/// Returns an error if `private_key` is not a base64 encoded 32-byte key.
pub fn public_key_for(private_key: &str) -> Result<String> {
    let private: PrivateKey = private_key.parse()?;
    Ok(private.public_key().to_base64())
}

/// Returns true if `key` is base64 that decodes to exactly 32 bytes.
#[must_use]
pub fn format_valid(key: &str) -> bool {
    decode_key(key).is_ok()
}

/// Checks that `public_key` is the counterpart of `private_key`.
///
/// A random probe is signed with the private key and the signature is
/// verified against the public key. Malformed input of any kind yields
/// `false`.
#[must_use]
pub fn verify_pairing(private_key: &str, public_key: &str) -> bool {
    let (Ok(private), Ok(public)) = (private_key.parse::<PrivateKey>(), public_key.parse::<PublicKey>()) else {
        return false;
    };
    let mut probe = [0u8; PAIRING_PROBE_SIZE];
    OsRng.fill_bytes(&mut probe);
    let sig = signature::sign(&private, &probe);
    signature::verify(&public, &probe, &sig)
}
