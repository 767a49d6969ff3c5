//! Distributed key generation
//!
//! Every participant deals a random secret with Feldman VSS; the group secret is the sum of all
//! dealt secrets and is never known to anyone. Nobody needs to be trusted: each dealer proves
//! knowledge of its secret with a Schnorr proof, and each share is checked against the dealer's
//! commitment.
//!
//! The protocol takes three rounds:
//! 1. Sample polynomial $f_i$ of degree $t$, broadcast its commitment $F_i$ together with proof of
//!    knowledge of $f_i(0)$ ([`MessageType::KeyGen1`])
//! 2. Verify proofs of other parties, send $f_i(j)$ to every other party $j$
//!    ([`MessageType::KeyGen2`])
//! 3. Verify received shares against commitments, output
//!    * secret share $s_i = \sum_j f_j(i)$
//!    * public share of every party $k$: $\sum_j F_j(k)$
//!    * group key $\sum_j F_j(0)$
//!
//! ## Example
//! ```rust,no_run
//! # fn main() -> Result<(), verglas::Error> {
//! use verglas::{keygen::KeygenBuilder, PartyId, PartyIdList};
//!
//! let i = PartyId::new(1).unwrap();
//! let participants = PartyIdList::from_u16s(&[1, 2, 3]).unwrap();
//! let mut rng = rand_core::OsRng;
//! let (mut state, output) = KeygenBuilder::new(i, participants, 1).start(&mut rng)?;
//! let to_send = state.process_all()?;
//! // deliver `to_send`, feed received messages into `state.handle_message`, call
//! // `state.process_all` until `output.public()` becomes available
//! # Ok(()) }
//! ```
//!
//! [`MessageType::KeyGen1`]: crate::messages::MessageType::KeyGen1
//! [`MessageType::KeyGen2`]: crate::messages::MessageType::KeyGen2

use alloc::boxed::Box;
use core::time::Duration;

use rand_core::{CryptoRng, RngCore};

use crate::{
    eddsa::{Public, SecretShare},
    error::{Error, InvalidParameters},
    messages::MessageType,
    state::{Output, State},
    PartyId, PartyIdList,
};

mod round0;
mod round1;
mod round2;

/// Message types consumed by key generation, in order
pub const PROTOCOL: &[MessageType] = &[MessageType::KeyGen1, MessageType::KeyGen2];

/// Context of Schnorr proofs in key generation
const PROOF_CONTEXT: crate::schnorr::Context = [0u8; 32];

/// Key generation running on behalf of one party
pub type KeygenState = State<KeygenResult>;

/// Handle to the output of key generation
pub type KeygenOutput = Output<KeygenResult>;

/// Output of key generation
#[derive(Debug, Clone)]
pub struct KeygenResult {
    /// Public key bundle, the same at every party
    pub public: Public,
    /// Secret share of this party
    pub secret: SecretShare,
}

impl Output<KeygenResult> {
    /// Public key bundle, available once key generation completed successfully
    pub fn public(&self) -> Option<Public> {
        self.get().map(|out| out.public)
    }

    /// Secret share, available once key generation completed successfully
    pub fn secret_key(&self) -> Option<SecretShare> {
        self.get().map(|out| out.secret)
    }
}

/// Builder for key generation
pub struct KeygenBuilder {
    i: PartyId,
    participants: PartyIdList,
    t: u16,
    timeout: Duration,
}

impl KeygenBuilder {
    /// Constructs a builder
    ///
    /// * `i` is the identifier of this party, it must be in `participants`
    /// * `t` is the threshold: any `t + 1` participants will be able to sign. It must satisfy
    ///   `1 <= t` and `t + 1 <= participants.len()`
    pub fn new(i: PartyId, participants: PartyIdList, t: u16) -> Self {
        Self {
            i,
            participants,
            t,
            timeout: Duration::ZERO,
        }
    }

    /// Aborts the protocol with [`Error::Timeout`] if it doesn't complete within `timeout`
    ///
    /// Zero disables the timeout (default). Non-zero timeout requires [`start`](Self::start) to
    /// be called within a tokio runtime.
    pub fn set_timeout(self, timeout: Duration) -> Self {
        Self { timeout, ..self }
    }

    /// Validates parameters, samples all randomness and constructs the state
    pub fn start<R: RngCore + CryptoRng>(
        self,
        rng: &mut R,
    ) -> Result<(KeygenState, KeygenOutput), Error> {
        let n = self.participants.len();
        if self.t == 0 || usize::from(self.t) + 1 > n {
            return Err(InvalidParameters::Threshold { t: self.t, n }.into());
        }
        if !self.participants.contains(self.i) {
            return Err(InvalidParameters::NotAParticipant(self.i).into());
        }

        tracing::debug!(party = %self.i, n, t = self.t, "starting key generation");
        let round = round0::Round0::new(rng, self.i, self.participants.clone(), self.t);
        let (state, output) = State::new(
            self.i,
            self.participants,
            PROTOCOL,
            Box::new(round),
            self.timeout,
        )?;
        Ok((state, output))
    }
}

/// Constructs a key generation state
///
/// Shortcut for [`KeygenBuilder`].
pub fn new_keygen_state<R: RngCore + CryptoRng>(
    i: PartyId,
    participants: PartyIdList,
    t: u16,
    timeout: Duration,
    rng: &mut R,
) -> Result<(KeygenState, KeygenOutput), Error> {
    KeygenBuilder::new(i, participants, t)
        .set_timeout(timeout)
        .start(rng)
}
