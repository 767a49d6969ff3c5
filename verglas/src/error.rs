//! Errors of the protocol engine
//!
//! Errors returned by [`State::handle_message`](crate::State::handle_message) are local
//! rejections: the offending message is dropped and the protocol carries on. Errors raised while
//! processing a round are fatal: they terminate the protocol and are reported to every
//! [waiter](crate::State::wait_for_error).

use crate::{
    eddsa::InvalidPublic,
    messages::{DecodeError, MessageType},
    party::InvalidPartyIdList,
    schnorr::InvalidProof,
    PartyId,
};

/// Protocol error
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Protocol can't be started with given parameters
    #[error("invalid parameters: {0}")]
    InvalidParameters(#[from] InvalidParameters),
    /// Message failed to decode
    #[error("malformed message: {0}")]
    MalformedMessage(#[from] DecodeError),
    /// Message is well-formed, but can't be accepted in the current state
    #[error("unexpected message: {0}")]
    UnexpectedMessage(#[from] UnexpectedMessage),
    /// A party deviated from the protocol
    ///
    /// `culprit` is `None` when misbehavior can't be attributed to any party.
    #[error("party {} violated the protocol: {reason}", .culprit.map_or(0, PartyId::get))]
    ProtocolViolation {
        /// Party that deviated from the protocol
        culprit: Option<PartyId>,
        /// What exactly went wrong
        reason: Violation,
    },
    /// Protocol did not complete in time
    #[error("message timeout")]
    Timeout,
    /// Protocol is already terminated
    #[error("protocol already finished")]
    AlreadyFinished,
    /// Protocol was cancelled by the caller
    #[error("protocol cancelled")]
    Cancelled,
}

impl Error {
    pub(crate) fn violation(culprit: PartyId, reason: Violation) -> Self {
        Self::ProtocolViolation {
            culprit: Some(culprit),
            reason,
        }
    }

    /// Returns the party responsible for the error, if the error is attributable
    pub fn culprit(&self) -> Option<PartyId> {
        match self {
            Self::ProtocolViolation { culprit, .. } => *culprit,
            _ => None,
        }
    }

    /// Indicates whether the error terminates the protocol
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::ProtocolViolation { .. } | Self::Timeout | Self::Cancelled
        )
    }
}

/// Protocol parameters are invalid
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidParameters {
    /// Threshold out of range
    #[error("threshold {t} is invalid for {n} parties: it must satisfy 1 <= t and t + 1 <= n")]
    Threshold {
        /// Provided threshold
        t: u16,
        /// Number of parties
        n: usize,
    },
    /// Invalid list of parties
    #[error(transparent)]
    PartyList(#[from] InvalidPartyIdList),
    /// Party is not in the list of participants
    #[error("party {0} is not in the list of participants")]
    NotAParticipant(PartyId),
    /// Not enough signers
    #[error("signer set too small: {n} signers, at least {required} required")]
    TooFewSigners {
        /// Number of signers
        n: usize,
        /// Minimal number of signers
        required: usize,
    },
    /// Signer did not take part in key generation
    #[error("signer {0} did not take part in key generation")]
    UnknownSigner(PartyId),
    /// Secret share is not consistent with public key bundle
    #[error("secret share doesn't match public share of party {0}")]
    SecretShareMismatch(PartyId),
    /// Public key bundle is inconsistent
    #[error(transparent)]
    Public(#[from] InvalidPublic),
    /// Non-zero timeout was requested outside of tokio runtime
    #[error("timeout requires a tokio runtime")]
    NoRuntime,
}

/// Message can't be accepted
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UnexpectedMessage {
    /// Sender is not a participant of the protocol
    #[error("sender {0} is not a participant")]
    UnknownSender(PartyId),
    /// Sender already sent a message of that type
    #[error("party {from} already sent {ty:?} message")]
    Duplicate {
        /// Sender
        from: PartyId,
        /// Type of the message
        ty: MessageType,
    },
    /// Message belongs to another protocol
    #[error("{0:?} message doesn't belong to this protocol")]
    WrongProtocol(MessageType),
}

/// Kind of protocol deviation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Violation {
    /// Proof of knowledge of the secret doesn't verify
    #[error("schnorr proof is invalid")]
    InvalidProof(#[source] InvalidProof),
    /// Commitment to the polynomial has wrong degree
    #[error("commitment has {actual} coefficients, expected {expected}")]
    CommitmentLength {
        /// Expected number of coefficients
        expected: usize,
        /// Received number of coefficients
        actual: usize,
    },
    /// Secret share doesn't match sender's commitment
    #[error("VSS failed to validate")]
    VssFailed,
    /// Nonce commitment is the identity point
    #[error("nonce commitment is the identity point")]
    IdentityNonce,
    /// Partial signature doesn't verify
    #[error("signature share is invalid")]
    InvalidSignatureShare,
    /// Aggregated signature doesn't verify
    #[error("full signature is invalid")]
    InvalidSignature,
    /// Round received a message it doesn't handle
    #[error("bug: round received {0:?} message")]
    WrongRound(MessageType),
}
