//! Round 0 - Commitment
//!
//! Each party samples its polynomial, proves knowledge of the constant term and broadcasts the
//! proof along with the commitment to the polynomial.

use alloc::{boxed::Box, vec, vec::Vec};

use rand_core::{CryptoRng, RngCore};

use crate::{
    ciphersuite::random_scalar,
    error::{Error, Violation},
    messages::{Body, KeyGen1, Message},
    polynomial::{ExponentPolynomial, Polynomial},
    schnorr::SchnorrProof,
    state::{NextRound, Round},
    PartyId, PartyIdList,
};

use super::{round1::Round1, KeygenResult, PROOF_CONTEXT};

/// Samples the polynomial and commits to it
pub struct Round0 {
    i: PartyId,
    participants: PartyIdList,
    t: u16,
    polynomial: Polynomial,
    commitment: ExponentPolynomial,
    proof: SchnorrProof,
}

impl Round0 {
    pub fn new(
        rng: &mut (impl RngCore + CryptoRng),
        i: PartyId,
        participants: PartyIdList,
        t: u16,
    ) -> Self {
        let secret = random_scalar(rng);
        let proof = SchnorrProof::prove(rng, i, &secret, &PROOF_CONTEXT);
        let polynomial = Polynomial::sample(rng, t, secret);
        let commitment = polynomial.commit();
        Self {
            i,
            participants,
            t,
            polynomial,
            commitment,
            proof,
        }
    }
}

impl Round<KeygenResult> for Round0 {
    fn process_message(&mut self, msg: Message) -> Result<(), Error> {
        Err(Error::violation(msg.from, Violation::WrongRound(msg.ty())))
    }

    fn generate_messages(&mut self) -> Result<Vec<Message>, Error> {
        Ok(vec![Message::broadcast(
            self.i,
            Body::KeyGen1(KeyGen1 {
                proof: self.proof,
                commitments: self.commitment.clone(),
            }),
        )])
    }

    fn next_round(self: Box<Self>) -> Result<NextRound<KeygenResult>, Error> {
        let Round0 {
            i,
            participants,
            t,
            polynomial,
            commitment,
            proof: _,
        } = *self;
        Ok(NextRound::Continue(Box::new(Round1::new(
            i,
            participants,
            t,
            polynomial,
            commitment,
        ))))
    }
}
