//! Keys and signatures
//!
//! [`Signature`] produced by the protocol is a regular Ed25519 signature: its 64-byte form is
//! interchangeable with [RFC 8032], so any conforming verifier accepts it under
//! [group key](Public::group_key).
//!
//! [RFC 8032]: https://www.rfc-editor.org/rfc/rfc8032

use alloc::{collections::BTreeMap, vec::Vec};
use core::fmt;

use generic_ec::{Point, Scalar, SecretScalar};

use crate::{
    ciphersuite::{
        compute_challenge, deserialize_point, deserialize_scalar, scalar_from_u32,
        serialize_point, serialize_scalar, Curve, InvalidEncoding, POINT_SIZE, SCALAR_SIZE,
    },
    party::LagrangeError,
    PartyId, PartyIdList,
};

/// Secret share of the group key owned by a single party
///
/// Secret is zeroized on drop.
#[derive(Clone)]
pub struct SecretShare {
    id: PartyId,
    secret: SecretScalar<Curve>,
}

impl SecretShare {
    /// Constructs a secret share
    pub fn new(id: PartyId, secret: SecretScalar<Curve>) -> Self {
        Self { id, secret }
    }

    /// Owner of the share
    pub fn id(&self) -> PartyId {
        self.id
    }

    /// Secret scalar
    pub fn secret(&self) -> &SecretScalar<Curve> {
        &self.secret
    }

    /// Public counterpart of the share: `secret * G`
    pub fn public_share(&self) -> Point<Curve> {
        Point::generator() * &self.secret
    }
}

impl fmt::Debug for SecretShare {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretShare")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

/// Public key bundle
///
/// Contains everything public that is known after key generation: list of participants,
/// threshold, public share of every participant, and the group public key.
///
/// Invariants:
/// * $1 \le t$ and $t + 1 \le n$
/// * there's exactly one public share per participant
/// * public shares lie on a polynomial of degree $t$, and the group key is its value at zero
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "PublicParts", into = "PublicParts")
)]
pub struct Public {
    participants: PartyIdList,
    threshold: u16,
    shares: BTreeMap<PartyId, Point<Curve>>,
    group_key: Point<Curve>,
}

impl Public {
    /// Constructs a bundle from public shares, deriving the group key by interpolation
    pub fn new(
        participants: PartyIdList,
        threshold: u16,
        shares: BTreeMap<PartyId, Point<Curve>>,
    ) -> Result<Self, InvalidPublic> {
        validate_threshold(threshold, participants.len())?;
        if let Some(id) = participants.iter().find(|id| !shares.contains_key(id)) {
            return Err(InvalidPublic::MissingShare(id));
        }
        if let Some(id) = shares.keys().find(|id| !participants.contains(**id)) {
            return Err(InvalidPublic::UnknownShare(*id));
        }

        let group_key = interpolate(&participants, &shares)?;

        // Shares lie on a single polynomial of degree t iff the first t shares together with
        // any other one interpolate to the same key
        let t = usize::from(threshold);
        let base = participants.iter().take(t).collect::<Vec<_>>();
        for j in participants.iter().skip(t) {
            let quorum = PartyIdList::new(base.iter().copied().chain([j]))
                .map_err(|_| InvalidPublic::Inconsistent)?;
            if interpolate(&quorum, &shares)? != group_key {
                return Err(InvalidPublic::Inconsistent);
            }
        }

        Ok(Self {
            participants,
            threshold,
            shares,
            group_key,
        })
    }

    /// Constructs a bundle and checks that provided `group_key` matches the public shares
    pub fn from_parts(
        participants: PartyIdList,
        threshold: u16,
        shares: BTreeMap<PartyId, Point<Curve>>,
        group_key: Point<Curve>,
    ) -> Result<Self, InvalidPublic> {
        let public = Self::new(participants, threshold, shares)?;
        if public.group_key != group_key {
            return Err(InvalidPublic::GroupKeyMismatch);
        }
        Ok(public)
    }

    /// Constructs a bundle without validation
    ///
    /// Caller guarantees that `shares` lie on a polynomial of degree `threshold` whose
    /// constant term is `group_key`.
    pub(crate) fn new_unchecked(
        participants: PartyIdList,
        threshold: u16,
        shares: BTreeMap<PartyId, Point<Curve>>,
        group_key: Point<Curve>,
    ) -> Self {
        Self {
            participants,
            threshold,
            shares,
            group_key,
        }
    }

    /// Participants of key generation
    pub fn participants(&self) -> &PartyIdList {
        &self.participants
    }

    /// Threshold $t$: at least $t + 1$ parties are needed to sign
    pub fn threshold(&self) -> u16 {
        self.threshold
    }

    /// Public shares of all participants
    pub fn shares(&self) -> &BTreeMap<PartyId, Point<Curve>> {
        &self.shares
    }

    /// Public share of party `id`
    pub fn public_share(&self, id: PartyId) -> Option<Point<Curve>> {
        self.shares.get(&id).copied()
    }

    /// Group public key
    pub fn group_key(&self) -> Point<Curve> {
        self.group_key
    }

    /// Group public key in RFC 8032 encoding
    pub fn group_key_bytes(&self) -> [u8; POINT_SIZE] {
        serialize_point(&self.group_key)
    }
}

fn validate_threshold(t: u16, n: usize) -> Result<(), InvalidPublic> {
    if t == 0 || usize::from(t) + 1 > n {
        return Err(InvalidPublic::Threshold { t, n });
    }
    Ok(())
}

fn interpolate(
    set: &PartyIdList,
    shares: &BTreeMap<PartyId, Point<Curve>>,
) -> Result<Point<Curve>, InvalidPublic> {
    set.iter().try_fold(Point::zero(), |acc, j| -> Result<_, InvalidPublic> {
        let lambda_j = set.lagrange_coefficient(j)?;
        let share = shares.get(&j).ok_or(InvalidPublic::MissingShare(j))?;
        Ok(acc + *share * lambda_j)
    })
}

/// Public key bundle is invalid
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum InvalidPublic {
    /// Threshold out of range
    #[error("threshold {t} is invalid for {n} parties")]
    Threshold {
        /// Threshold
        t: u16,
        /// Number of participants
        n: usize,
    },
    /// Participant has no public share
    #[error("public share of party {0} is missing")]
    MissingShare(PartyId),
    /// Public share belongs to a non-participant
    #[error("public share of unknown party {0}")]
    UnknownShare(PartyId),
    /// Public shares don't lie on a polynomial of degree $t$
    #[error("public shares are inconsistent")]
    Inconsistent,
    /// Group key doesn't match public shares
    #[error("group key doesn't match public shares")]
    GroupKeyMismatch,
    /// Public share is not a valid point
    #[error(transparent)]
    Encoding(#[from] InvalidEncoding),
    /// Lagrange interpolation failed
    #[error(transparent)]
    Interpolation(#[from] LagrangeError),
}

/// Serialized form of [`Public`]
///
/// Points are kept as raw bytes so that they're decoded with canonicity checks.
#[cfg(feature = "serde")]
#[derive(serde::Serialize, serde::Deserialize)]
struct PublicParts {
    participants: PartyIdList,
    threshold: u16,
    shares: Vec<(PartyId, [u8; POINT_SIZE])>,
    group_key: [u8; POINT_SIZE],
}

#[cfg(feature = "serde")]
impl TryFrom<PublicParts> for Public {
    type Error = InvalidPublic;
    fn try_from(parts: PublicParts) -> Result<Self, Self::Error> {
        let shares = parts
            .shares
            .iter()
            .map(|(id, bytes)| Ok::<_, InvalidEncoding>((*id, deserialize_point(bytes)?)))
            .collect::<Result<BTreeMap<_, _>, InvalidEncoding>>()?;
        let group_key = deserialize_point(&parts.group_key)?;
        Public::from_parts(parts.participants, parts.threshold, shares, group_key)
    }
}

#[cfg(feature = "serde")]
impl From<Public> for PublicParts {
    fn from(public: Public) -> Self {
        Self {
            shares: public
                .shares
                .iter()
                .map(|(id, share)| (*id, serialize_point(share)))
                .collect(),
            group_key: serialize_point(&public.group_key),
            participants: public.participants,
            threshold: public.threshold,
        }
    }
}

/// Ed25519 signature
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "SignatureParts", into = "SignatureParts")
)]
pub struct Signature {
    /// $R$ component of the signature
    pub r: Point<Curve>,
    /// $S$ component of the signature
    pub s: Scalar<Curve>,
}

impl Signature {
    /// Size of serialized signature in bytes
    pub const SIZE: usize = 64;

    /// Serializes signature as $R \| S$ (RFC 8032 format)
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        bytes[..POINT_SIZE].copy_from_slice(&serialize_point(&self.r));
        bytes[POINT_SIZE..].copy_from_slice(&serialize_scalar(&self.s));
        bytes
    }

    /// Deserializes signature
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, InvalidEncoding> {
        if bytes.len() != Self::SIZE {
            return Err(InvalidEncoding::Point);
        }
        Ok(Self {
            r: deserialize_point(&bytes[..POINT_SIZE])?,
            s: deserialize_scalar(&bytes[POINT_SIZE..])?,
        })
    }

    /// Verifies signature against a public key and a message
    ///
    /// Uses the cofactored Ed25519 equation: $8 (R - (s G - c A)) = O$ where
    /// $c = H(R \| A \| m)$.
    pub fn verify(&self, public_key: &Point<Curve>, msg: &[u8]) -> Result<(), InvalidSignature> {
        let challenge = compute_challenge(&self.r, public_key, msg);
        let recomputed_r = Point::generator() * self.s - *public_key * challenge;
        let cofactor = scalar_from_u32(8);
        if ((self.r - recomputed_r) * cofactor).is_zero() {
            Ok(())
        } else {
            Err(InvalidSignature)
        }
    }
}

#[cfg(feature = "serde")]
#[derive(serde::Serialize, serde::Deserialize)]
struct SignatureParts {
    r: [u8; POINT_SIZE],
    s: [u8; SCALAR_SIZE],
}

#[cfg(feature = "serde")]
impl TryFrom<SignatureParts> for Signature {
    type Error = InvalidEncoding;
    fn try_from(parts: SignatureParts) -> Result<Self, Self::Error> {
        Ok(Self {
            r: deserialize_point(&parts.r)?,
            s: deserialize_scalar(&parts.s)?,
        })
    }
}

#[cfg(feature = "serde")]
impl From<Signature> for SignatureParts {
    fn from(sig: Signature) -> Self {
        Self {
            r: serialize_point(&sig.r),
            s: serialize_scalar(&sig.s),
        }
    }
}

/// Verifies signature given in the RFC 8032 wire format
pub fn verify(public_key: &[u8], msg: &[u8], signature: &[u8]) -> Result<(), InvalidSignature> {
    let public_key = deserialize_point(public_key).map_err(|_| InvalidSignature)?;
    let signature = Signature::from_bytes(signature).map_err(|_| InvalidSignature)?;
    signature.verify(&public_key, msg)
}

/// Signature verification failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid signature")]
pub struct InvalidSignature;
