//! Protocol messages and their binary encoding
//!
//! Every message starts with a 5-byte header:
//!
//! | bytes | field                                     |
//! |-------|-------------------------------------------|
//! | 1     | message type                              |
//! | 2     | sender identifier, big-endian             |
//! | 2     | recipient identifier, big-endian, 0 = all |
//!
//! followed by the body:
//!
//! | type        | recipient | body                                                 |
//! |-------------|-----------|------------------------------------------------------|
//! | 1 `KeyGen1` | broadcast | Schnorr proof (64) ‖ degree (2) ‖ (degree + 1) × 32   |
//! | 2 `KeyGen2` | one party | secret share (32)                                    |
//! | 3 `Sign1`   | broadcast | $D$ (32) ‖ $E$ (32)                                  |
//! | 4 `Sign2`   | broadcast | signature share $z$ (32)                             |
//!
//! Decoding is strict: any length mismatch, non-canonical scalar or point, or recipient
//! inconsistent with the message type is rejected.

use core::fmt;

use generic_ec::{Point, Scalar, SecretScalar};

use crate::{
    ciphersuite::{
        deserialize_point, deserialize_scalar, deserialize_secret_scalar, serialize_point,
        serialize_scalar, Curve, InvalidEncoding, POINT_SIZE, SCALAR_SIZE,
    },
    polynomial::ExponentPolynomial,
    schnorr::SchnorrProof,
    PartyId,
};

/// Size of message header in bytes
pub const HEADER_SIZE: usize = 5;

/// Type of the message
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum MessageType {
    /// Commitment to the polynomial and proof of knowledge of its secret
    KeyGen1 = 1,
    /// Secret share sent to one party
    KeyGen2 = 2,
    /// Nonce commitments
    Sign1 = 3,
    /// Signature share
    Sign2 = 4,
}

impl MessageType {
    /// Indicates whether message of this type is sent to all parties
    pub fn is_broadcast(self) -> bool {
        !matches!(self, Self::KeyGen2)
    }
}

impl TryFrom<u8> for MessageType {
    type Error = DecodeError;
    fn try_from(tag: u8) -> Result<Self, Self::Error> {
        match tag {
            1 => Ok(Self::KeyGen1),
            2 => Ok(Self::KeyGen2),
            3 => Ok(Self::Sign1),
            4 => Ok(Self::Sign2),
            _ => Err(DecodeError::UnknownType(tag)),
        }
    }
}

/// Message header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    /// Type of the message
    pub ty: MessageType,
    /// Sender
    pub from: PartyId,
    /// Recipient, `None` if the message is broadcast
    pub to: Option<PartyId>,
}

impl Header {
    /// Serializes header
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut bytes = [0u8; HEADER_SIZE];
        bytes[0] = self.ty as u8;
        bytes[1..3].copy_from_slice(&self.from.to_bytes());
        bytes[3..5].copy_from_slice(&self.to.map_or([0, 0], PartyId::to_bytes));
        bytes
    }

    /// Parses and validates header
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DecodeError> {
        let bytes: &[u8; HEADER_SIZE] = bytes
            .get(..HEADER_SIZE)
            .and_then(|b| b.try_into().ok())
            .ok_or(DecodeError::TooShort)?;
        let ty = MessageType::try_from(bytes[0])?;
        let from = PartyId::from_bytes([bytes[1], bytes[2]]).ok_or(DecodeError::ZeroSender)?;
        let to = PartyId::from_bytes([bytes[3], bytes[4]]);
        match (ty.is_broadcast(), to) {
            (true, Some(_)) => return Err(DecodeError::UnexpectedRecipient(ty)),
            (false, None) => return Err(DecodeError::MissingRecipient(ty)),
            _ => (),
        }
        Ok(Self { ty, from, to })
    }
}

/// First message of key generation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyGen1 {
    /// Proof of knowledge of the constant term of sender's polynomial
    pub proof: SchnorrProof,
    /// Commitment to sender's polynomial
    pub commitments: ExponentPolynomial,
}

/// Second message of key generation
#[derive(Clone)]
pub struct KeyGen2 {
    /// Sender's polynomial evaluated at recipient's identifier
    pub share: SecretScalar<Curve>,
}

impl fmt::Debug for KeyGen2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("KeyGen2 { share: <secret> }")
    }
}

/// First message of signing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sign1 {
    /// Hiding nonce commitment $D = d G$
    pub d: Point<Curve>,
    /// Binding nonce commitment $E = e G$
    pub e: Point<Curve>,
}

/// Second message of signing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sign2 {
    /// Signature share $z$
    pub z: Scalar<Curve>,
}

/// Message body
#[derive(Debug, Clone)]
pub enum Body {
    /// Key generation, round 1
    KeyGen1(KeyGen1),
    /// Key generation, round 2
    KeyGen2(KeyGen2),
    /// Signing, round 1
    Sign1(Sign1),
    /// Signing, round 2
    Sign2(Sign2),
}

impl Body {
    /// Type of the message carrying this body
    pub fn ty(&self) -> MessageType {
        match self {
            Self::KeyGen1(_) => MessageType::KeyGen1,
            Self::KeyGen2(_) => MessageType::KeyGen2,
            Self::Sign1(_) => MessageType::Sign1,
            Self::Sign2(_) => MessageType::Sign2,
        }
    }

    fn size(&self) -> usize {
        match self {
            Self::KeyGen1(body) => SchnorrProof::SIZE + 2 + body.commitments.len() * POINT_SIZE,
            Self::KeyGen2(_) => SCALAR_SIZE,
            Self::Sign1(_) => 2 * POINT_SIZE,
            Self::Sign2(_) => SCALAR_SIZE,
        }
    }
}

/// Protocol message
#[derive(Debug, Clone)]
pub struct Message {
    /// Sender
    pub from: PartyId,
    /// Recipient, `None` if the message is broadcast
    pub to: Option<PartyId>,
    /// Message content
    pub body: Body,
}

impl Message {
    /// Constructs a broadcast message
    pub fn broadcast(from: PartyId, body: Body) -> Self {
        Self {
            from,
            to: None,
            body,
        }
    }

    /// Constructs a message addressed to a single party
    pub fn p2p(from: PartyId, to: PartyId, body: Body) -> Self {
        Self {
            from,
            to: Some(to),
            body,
        }
    }

    /// Type of the message
    pub fn ty(&self) -> MessageType {
        self.body.ty()
    }

    /// Message header
    pub fn header(&self) -> Header {
        Header {
            ty: self.ty(),
            from: self.from,
            to: self.to,
        }
    }

    /// Indicates whether message is sent to all parties
    pub fn is_broadcast(&self) -> bool {
        self.to.is_none()
    }

    /// Size of serialized message in bytes
    pub fn size(&self) -> usize {
        HEADER_SIZE + self.body.size()
    }

    /// Serializes message
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.size());
        self.encode_into(&mut bytes);
        bytes
    }

    /// Appends serialized message to `buffer`
    pub fn encode_into(&self, buffer: &mut Vec<u8>) {
        buffer.extend_from_slice(&self.header().to_bytes());
        match &self.body {
            Body::KeyGen1(body) => {
                buffer.extend_from_slice(&body.proof.to_bytes());
                // Degree always fits: the decoder only accepts `u16` degrees, and the encoder
                // is only fed polynomials of degree `t: u16`
                let degree = u16::try_from(body.commitments.degree()).unwrap_or(u16::MAX);
                buffer.extend_from_slice(&degree.to_be_bytes());
                for point in body.commitments.coefficients() {
                    buffer.extend_from_slice(&serialize_point(point));
                }
            }
            Body::KeyGen2(body) => {
                buffer.extend_from_slice(&serialize_scalar(body.share.as_ref()));
            }
            Body::Sign1(body) => {
                buffer.extend_from_slice(&serialize_point(&body.d));
                buffer.extend_from_slice(&serialize_point(&body.e));
            }
            Body::Sign2(body) => {
                buffer.extend_from_slice(&serialize_scalar(&body.z));
            }
        }
    }

    /// Parses and validates message
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DecodeError> {
        let header = Header::from_bytes(bytes)?;
        let body = &bytes[HEADER_SIZE..];

        let body = match header.ty {
            MessageType::KeyGen1 => {
                if body.len() < SchnorrProof::SIZE + 2 {
                    return Err(DecodeError::WrongLength(header.ty));
                }
                let (proof, rest) = body.split_at(SchnorrProof::SIZE);
                let proof = SchnorrProof::from_bytes(proof)?;
                let degree = usize::from(u16::from_be_bytes([rest[0], rest[1]]));
                let points = &rest[2..];
                if points.len() != (degree + 1) * POINT_SIZE {
                    return Err(DecodeError::WrongLength(header.ty));
                }
                let coefficients = points
                    .chunks_exact(POINT_SIZE)
                    .map(deserialize_point)
                    .collect::<Result<Vec<_>, _>>()?;
                let commitments = ExponentPolynomial::new(coefficients)
                    .map_err(|_| DecodeError::WrongLength(header.ty))?;
                Body::KeyGen1(KeyGen1 { proof, commitments })
            }
            MessageType::KeyGen2 => {
                expect_length(header.ty, body, SCALAR_SIZE)?;
                Body::KeyGen2(KeyGen2 {
                    share: deserialize_secret_scalar(body)?,
                })
            }
            MessageType::Sign1 => {
                expect_length(header.ty, body, 2 * POINT_SIZE)?;
                Body::Sign1(Sign1 {
                    d: deserialize_point(&body[..POINT_SIZE])?,
                    e: deserialize_point(&body[POINT_SIZE..])?,
                })
            }
            MessageType::Sign2 => {
                expect_length(header.ty, body, SCALAR_SIZE)?;
                Body::Sign2(Sign2 {
                    z: deserialize_scalar(body)?,
                })
            }
        };

        Ok(Self {
            from: header.from,
            to: header.to,
            body,
        })
    }
}

fn expect_length(ty: MessageType, body: &[u8], len: usize) -> Result<(), DecodeError> {
    if body.len() == len {
        Ok(())
    } else {
        Err(DecodeError::WrongLength(ty))
    }
}

/// Message can't be decoded
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// Message is shorter than the header
    #[error("message is too short")]
    TooShort,
    /// Unknown message type tag
    #[error("unknown message type {0}")]
    UnknownType(u8),
    /// Sender identifier is zero
    #[error("sender identifier is zero")]
    ZeroSender,
    /// Broadcast message specifies recipient
    #[error("{0:?} message must be broadcast")]
    UnexpectedRecipient(MessageType),
    /// Point-to-point message doesn't specify recipient
    #[error("{0:?} message must have a recipient")]
    MissingRecipient(MessageType),
    /// Body has wrong length
    #[error("{0:?} message has wrong length")]
    WrongLength(MessageType),
    /// Body contains invalid point
    #[error("invalid point")]
    InvalidPoint,
    /// Body contains invalid scalar
    #[error("invalid scalar")]
    InvalidScalar,
}

impl From<InvalidEncoding> for DecodeError {
    fn from(err: InvalidEncoding) -> Self {
        match err {
            InvalidEncoding::Point => Self::InvalidPoint,
            InvalidEncoding::Scalar => Self::InvalidScalar,
        }
    }
}
