//! XEdDSA signatures over Curve25519 key pairs.
//!
//! `WireGuard` keys are Montgomery-form X25519 keys. XEdDSA signs with such a
//! key by mapping it onto the birationally equivalent Edwards curve and
//! forcing the sign bit of the Edwards public point to zero, so a verifier
//! only needs the Montgomery `u` coordinate.

use curve25519_dalek::edwards::{CompressedEdwardsY, EdwardsPoint};
use curve25519_dalek::montgomery::MontgomeryPoint;
use curve25519_dalek::scalar::{Scalar, clamp_integer};
use rand_core::{OsRng, RngCore};
use sha2::{Digest, Sha512};

use crate::keys::{PrivateKey, PublicKey};

/// Length of an XEdDSA signature (`R || s`).
pub const SIGNATURE_SIZE: usize = 64;

/// Domain separator for the nonce hash: `2^256 - 2` in little-endian.
const NONCE_PREFIX: [u8; 32] = {
    let mut prefix = [0xFF; 32];
    prefix[0] = 0xFE;
    prefix
};

fn hash_to_scalar(parts: &[&[u8]]) -> Scalar {
    let mut hasher = Sha512::new();
    for part in parts {
        hasher.update(part);
    }
    let mut wide = [0u8; 64];
    wide.copy_from_slice(&hasher.finalize());
    Scalar::from_bytes_mod_order_wide(&wide)
}

/// Signs `message` with `private`, mixing 64 bytes of fresh randomness into
/// the nonce.
pub fn sign(private: &PrivateKey, message: &[u8]) -> [u8; SIGNATURE_SIZE] {
    let k = Scalar::from_bytes_mod_order(clamp_integer(*private.as_bytes()));
    let mut public = EdwardsPoint::mul_base(&k).compress().to_bytes();
    let negative = public[31] & 0x80 != 0;
    public[31] &= 0x7F;
    let a = if negative { -k } else { k };

    let mut random = [0u8; 64];
    OsRng.fill_bytes(&mut random);

    let r = hash_to_scalar(&[&NONCE_PREFIX[..], a.as_bytes(), message, &random]);
    let big_r = EdwardsPoint::mul_base(&r).compress();
    let h = hash_to_scalar(&[&big_r.as_bytes()[..], &public, message]);
    let s = r + h * a;

    let mut signature = [0u8; SIGNATURE_SIZE];
    signature[..32].copy_from_slice(big_r.as_bytes());
    signature[32..].copy_from_slice(s.as_bytes());
    signature
}

/// Verifies an XEdDSA signature against a Montgomery public key.
pub fn verify(public: &PublicKey, message: &[u8], signature: &[u8; SIGNATURE_SIZE]) -> bool {
    let Some(a_point) = MontgomeryPoint(*public.as_bytes()).to_edwards(0) else {
        return false;
    };
    let a_bytes = a_point.compress();

    let mut r_bytes = [0u8; 32];
    r_bytes.copy_from_slice(&signature[..32]);
    let mut s_bytes = [0u8; 32];
    s_bytes.copy_from_slice(&signature[32..]);

    let Some(s) = Option::<Scalar>::from(Scalar::from_canonical_bytes(s_bytes)) else {
        return false;
    };
    if CompressedEdwardsY(r_bytes).decompress().is_none() {
        return false;
    }

    let h = hash_to_scalar(&[&r_bytes[..], a_bytes.as_bytes(), message]);
    // R' = sB - hA
    let check = EdwardsPoint::vartime_double_scalar_mul_basepoint(&h, &(-a_point), &s);
    check.compress().to_bytes() == r_bytes
}
