//! FROST threshold signatures producing standard Ed25519 signatures
//!
//! FROST is a Schnorr threshold signature scheme: a key is shared among $n$ parties such that any
//! $t + 1$ of them can sign, while $t$ or fewer learn nothing about the key. Signatures produced
//! by this crate are regular [RFC 8032] Ed25519 signatures, so they're verified by any Ed25519
//! library under the group public key.
//!
//! This crate provides:
//! * [Distributed key generation](keygen): no trusted dealer is needed, each party ends up with
//!   a [secret share](SecretShare) and the common [public key bundle](Public)
//! * [Threshold signing](signing) with any $t + 1$ of the key holders
//! * [Round state machine](State) that buffers out-of-order messages, enforces one message per
//!   peer per round, and supports timeouts and cancellation
//! * [Binary wire format](messages) and a [driver] that runs the protocol over a byte transport
//!
//! Misbehaving parties are detected: invalid proofs, shares and nonces abort the protocol with a
//! [`ProtocolViolation`](Error::ProtocolViolation) naming the first offender.
//!
//! This crate doesn't support (currently):
//! * Key resharing and refresh
//! * Signing with a coordinator that doesn't hold a key share
//!
//! ## Example
//! ```rust,no_run
//! # async fn __doc(
//! #     incoming: impl futures::Stream<Item = Vec<u8>> + Unpin,
//! #     outgoing: impl futures::Sink<verglas::driver::Outgoing, Error = std::io::Error> + Unpin,
//! #     incoming2: impl futures::Stream<Item = Vec<u8>> + Unpin,
//! #     outgoing2: impl futures::Sink<verglas::driver::Outgoing, Error = std::io::Error> + Unpin,
//! # ) -> Result<(), Box<dyn std::error::Error>> {
//! use core::time::Duration;
//! use verglas::{PartyId, PartyIdList};
//!
//! let mut rng = rand_core::OsRng;
//! let i = PartyId::new(1).unwrap();
//! let participants = PartyIdList::from_u16s(&[1, 2, 3])?;
//!
//! let (state, _) =
//!     verglas::new_keygen_state(i, participants.clone(), 1, Duration::from_secs(30), &mut rng)?;
//! let key = verglas::driver::run(state, incoming, outgoing).await?;
//!
//! let signers = PartyIdList::from_u16s(&[1, 3])?;
//! let (state, _) = verglas::new_sign_state(
//!     &signers,
//!     &key.secret,
//!     &key.public,
//!     b"Hello, TSS World!",
//!     Duration::from_secs(30),
//!     &mut rng,
//! )?;
//! let signature = verglas::driver::run(state, incoming2, outgoing2).await?;
//! signature.verify(&key.public.group_key(), b"Hello, TSS World!")?;
//! # Ok(()) }
//! ```
//!
//! [RFC 8032]: https://www.rfc-editor.org/rfc/rfc8032

#![forbid(unsafe_code)]
#![cfg_attr(not(test), deny(clippy::expect_used, clippy::unwrap_used, clippy::panic))]
#![deny(missing_docs)]
#![allow(clippy::type_complexity)]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub use generic_ec;

pub mod ciphersuite;
pub mod driver;
pub mod eddsa;
pub mod error;
pub mod keygen;
pub mod messages;
pub mod party;
pub mod polynomial;
pub mod schnorr;
pub mod signing;
mod state;

pub use self::{
    ciphersuite::ProtocolVersion,
    eddsa::{verify, Public, SecretShare, Signature},
    error::Error,
    keygen::{new_keygen_state, KeygenBuilder, KeygenOutput, KeygenResult, KeygenState},
    party::{PartyId, PartyIdList},
    signing::{new_sign_state, SignOutput, SignState, SigningBuilder},
    state::{Output, State},
};
