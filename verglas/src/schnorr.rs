//! Schnorr proof of knowledge of discrete logarithm
//!
//! Prover shows it knows $x$ such that $A = x G$. The proof is bound to the prover's identifier and
//! to a 32-byte context chosen by the caller, so it can't be replayed by another party or in
//! another protocol:
//!
//! * $R' = v G$ for random $v$
//! * $c = H(G \| R' \| A \| \text{id} \| \text{ctx})$
//! * $s = v - c x$
//!
//! Verifier accepts iff $R' = s G + c A$.

use generic_ec::{Point, Scalar, SecretScalar};
use rand_core::{CryptoRng, RngCore};

use crate::{
    ciphersuite::{
        deserialize_point, deserialize_scalar, hash_to_scalar, random_scalar, serialize_point,
        serialize_scalar, Curve, InvalidEncoding, GENERATOR_BYTES, POINT_SIZE, SCALAR_SIZE,
    },
    PartyId,
};

/// Context string of a proof
pub type Context = [u8; 32];

/// Schnorr proof of knowledge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchnorrProof {
    /// Commitment $R' = v G$
    pub commitment: Point<Curve>,
    /// Response $s = v - c x$
    pub response: Scalar<Curve>,
}

impl SchnorrProof {
    /// Size of serialized proof in bytes
    pub const SIZE: usize = POINT_SIZE + SCALAR_SIZE;

    /// Proves knowledge of `secret` on behalf of party `id`
    pub fn prove(
        rng: &mut (impl RngCore + CryptoRng),
        id: PartyId,
        secret: &SecretScalar<Curve>,
        ctx: &Context,
    ) -> Self {
        let public = Point::generator() * secret;
        let nonce = random_scalar(rng);
        let commitment = Point::generator() * &nonce;

        let challenge = challenge(id, &public, &commitment, ctx);
        let response = *nonce.as_ref() - challenge * secret.as_ref();

        Self {
            commitment,
            response,
        }
    }

    /// Verifies that party `id` knows discrete logarithm of `public`
    pub fn verify(&self, id: PartyId, public: &Point<Curve>, ctx: &Context) -> Result<(), InvalidProof> {
        if public.is_zero() {
            return Err(InvalidProof::IdentityPublicKey);
        }
        let challenge = challenge(id, public, &self.commitment, ctx);
        let expected = Point::generator() * self.response + *public * challenge;
        if expected == self.commitment {
            Ok(())
        } else {
            Err(InvalidProof::Mismatch)
        }
    }

    /// Serializes proof as $R' \| s$
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        bytes[..POINT_SIZE].copy_from_slice(&serialize_point(&self.commitment));
        bytes[POINT_SIZE..].copy_from_slice(&serialize_scalar(&self.response));
        bytes
    }

    /// Deserializes proof
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, InvalidEncoding> {
        if bytes.len() != Self::SIZE {
            return Err(InvalidEncoding::Point);
        }
        Ok(Self {
            commitment: deserialize_point(&bytes[..POINT_SIZE])?,
            response: deserialize_scalar(&bytes[POINT_SIZE..])?,
        })
    }
}

fn challenge(
    id: PartyId,
    public: &Point<Curve>,
    commitment: &Point<Curve>,
    ctx: &Context,
) -> Scalar<Curve> {
    hash_to_scalar(&[
        GENERATOR_BYTES.as_slice(),
        &serialize_point(commitment),
        &serialize_point(public),
        &id.to_bytes(),
        ctx,
    ])
}

/// Schnorr proof is invalid
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum InvalidProof {
    /// Proof is made for the identity point
    #[error("public key is the identity point")]
    IdentityPublicKey,
    /// Verification equation doesn't hold
    #[error("proof doesn't match the public key")]
    Mismatch,
}
