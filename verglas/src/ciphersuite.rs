//! FROST(Ed25519, SHA-512) ciphersuite
//!
//! Ciphersuite fixes the curve, the hash function and the encodings used everywhere in the
//! protocol. Encodings follow [RFC 8032]: a point is its 32-byte compressed Edwards form, a scalar
//! is 32 bytes little-endian. Both are decoded strictly: non-canonical encodings are rejected, and
//! so are points outside of the prime-order subgroup.
//!
//! [RFC 8032]: https://www.rfc-editor.org/rfc/rfc8032

use digest::Digest;
use generic_ec::{Point, Scalar, SecretScalar};
use rand_core::{CryptoRng, RngCore};
use zeroize::Zeroize;

/// Curve on which signatures are produced
pub type Curve = generic_ec::curves::Ed25519;

/// Size of serialized point in bytes
pub const POINT_SIZE: usize = 32;
/// Size of serialized scalar in bytes
pub const SCALAR_SIZE: usize = 32;

/// Domain separator prepended to the binding factor preimage
pub const BINDING_CONTEXT: &[u8] = b"FROST-SHA512";

/// Compressed encoding of the Ed25519 base point
pub const GENERATOR_BYTES: [u8; POINT_SIZE] = [
    0x58, 0x66, 0x66, 0x66, 0x66, 0x66, 0x66, 0x66, 0x66, 0x66, 0x66, 0x66, 0x66, 0x66, 0x66, 0x66,
    0x66, 0x66, 0x66, 0x66, 0x66, 0x66, 0x66, 0x66, 0x66, 0x66, 0x66, 0x66, 0x66, 0x66, 0x66, 0x66,
];

/// Binding factor derivation
///
/// Two variants of the protocol exist. They differ only in how the binding factor $\rho$ is
/// derived; signers that use different versions cannot produce a signature together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ProtocolVersion {
    /// Each signer $j$ gets its own binding factor $\rho_j = H(\text{buf} \| j)$
    Frost1,
    /// All signers share a single binding factor $\rho = H(\text{buf})$
    #[default]
    Frost2,
}

/// Encoding is not a valid point or scalar
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum InvalidEncoding {
    /// Bytes don't encode a point of the prime-order subgroup in canonical form
    #[error("invalid point encoding")]
    Point,
    /// Bytes don't encode a scalar in canonical form
    #[error("invalid scalar encoding")]
    Scalar,
}

/// Samples a uniformly random scalar
///
/// Reads 64 bytes from `rng` and reduces them modulo the group order, so the bias is negligible.
pub fn random_scalar(rng: &mut (impl RngCore + CryptoRng)) -> SecretScalar<Curve> {
    let mut bytes = [0u8; 64];
    rng.fill_bytes(&mut bytes);
    let mut scalar = Scalar::from_le_bytes_mod_order(bytes);
    bytes.zeroize();
    SecretScalar::new(&mut scalar)
}

/// Maps a small integer into the scalar field
///
/// The integer is written little-endian into the low bytes of the 32-byte scalar encoding. Party
/// identifiers rely on this mapping for interpolation, so it must never change.
pub fn scalar_from_u32(n: u32) -> Scalar<Curve> {
    let mut bytes = [0u8; SCALAR_SIZE];
    bytes[..4].copy_from_slice(&n.to_le_bytes());
    Scalar::from_le_bytes_mod_order(bytes)
}

/// Returns the group generator as a regular point
pub fn generator() -> Point<Curve> {
    Point::generator() * Scalar::<Curve>::one()
}

/// Serializes point
pub fn serialize_point(point: &Point<Curve>) -> [u8; POINT_SIZE] {
    let encoded = point.to_bytes(true);
    let mut bytes = [0u8; POINT_SIZE];
    bytes.copy_from_slice(encoded.as_ref());
    bytes
}

/// Deserializes point
///
/// Rejects non-canonical encodings and points with a torsion component. The identity point is
/// accepted: callers that can't handle it must check on their own.
pub fn deserialize_point(bytes: &[u8]) -> Result<Point<Curve>, InvalidEncoding> {
    if bytes.len() != POINT_SIZE {
        return Err(InvalidEncoding::Point);
    }
    let point = Point::<Curve>::from_bytes(bytes).map_err(|_| InvalidEncoding::Point)?;
    if point.to_bytes(true).as_ref() != bytes {
        return Err(InvalidEncoding::Point);
    }
    Ok(point)
}

/// Serializes scalar
pub fn serialize_scalar(scalar: &Scalar<Curve>) -> [u8; SCALAR_SIZE] {
    let encoded = scalar.to_le_bytes();
    let mut bytes = [0u8; SCALAR_SIZE];
    bytes.copy_from_slice(encoded.as_ref());
    bytes
}

/// Deserializes scalar, rejecting encodings of integers not less than the group order
pub fn deserialize_scalar(bytes: &[u8]) -> Result<Scalar<Curve>, InvalidEncoding> {
    if bytes.len() != SCALAR_SIZE {
        return Err(InvalidEncoding::Scalar);
    }
    let scalar = Scalar::<Curve>::from_le_bytes(bytes).map_err(|_| InvalidEncoding::Scalar)?;
    if scalar.to_le_bytes().as_ref() != bytes {
        return Err(InvalidEncoding::Scalar);
    }
    Ok(scalar)
}

/// Deserializes secret scalar
pub fn deserialize_secret_scalar(bytes: &[u8]) -> Result<SecretScalar<Curve>, InvalidEncoding> {
    let mut scalar = deserialize_scalar(bytes)?;
    Ok(SecretScalar::new(&mut scalar))
}

/// Hashes concatenation of `parts` with SHA-512 and reduces the digest to a scalar
pub fn hash_to_scalar(parts: &[&[u8]]) -> Scalar<Curve> {
    let mut hash = sha2::Sha512::new();
    for part in parts {
        hash.update(part);
    }
    Scalar::from_le_bytes_mod_order(hash.finalize())
}

/// Hashes the message with plain SHA-512
pub fn hash_message(msg: &[u8]) -> [u8; 64] {
    sha2::Sha512::digest(msg).into()
}

/// Computes the Schnorr challenge $c = H(R \| A \| m)$ exactly as Ed25519 does
pub fn compute_challenge(
    group_commitment: &Point<Curve>,
    group_public_key: &Point<Curve>,
    msg: &[u8],
) -> Scalar<Curve> {
    let hash = sha2::Sha512::new()
        .chain_update(serialize_point(group_commitment))
        .chain_update(serialize_point(group_public_key))
        .chain_update(msg)
        .finalize();

    Scalar::from_le_bytes_mod_order(hash)
}
