//! Round 1 - Share distribution
//!
//! Commitments and proofs of all parties are checked and summed, then every party privately
//! receives its share of our polynomial.

use alloc::{boxed::Box, collections::BTreeMap, vec::Vec};

use generic_ec::SecretScalar;

use crate::{
    ciphersuite::Curve,
    error::{Error, Violation},
    messages::{Body, KeyGen1, KeyGen2, Message},
    polynomial::{ExponentPolynomial, Polynomial},
    state::{NextRound, Round},
    PartyId, PartyIdList,
};

use super::{round2::Round2, KeygenResult, PROOF_CONTEXT};

/// Verifies commitments of other parties and deals shares
pub struct Round1 {
    i: PartyId,
    participants: PartyIdList,
    t: u16,
    polynomial: Polynomial,
    commitments: BTreeMap<PartyId, ExponentPolynomial>,
    sum: ExponentPolynomial,
    share: SecretScalar<Curve>,
}

impl Round1 {
    pub fn new(
        i: PartyId,
        participants: PartyIdList,
        t: u16,
        polynomial: Polynomial,
        commitment: ExponentPolynomial,
    ) -> Self {
        let share = polynomial.evaluate(i);
        let sum = commitment.clone();
        Self {
            i,
            participants,
            t,
            polynomial,
            commitments: BTreeMap::from([(i, commitment)]),
            sum,
            share,
        }
    }
}

impl Round<KeygenResult> for Round1 {
    fn process_message(&mut self, msg: Message) -> Result<(), Error> {
        let from = msg.from;
        let KeyGen1 { proof, commitments } = match msg.body {
            Body::KeyGen1(body) => body,
            body => return Err(Error::violation(from, Violation::WrongRound(body.ty()))),
        };

        let expected = usize::from(self.t) + 1;
        if commitments.len() != expected {
            return Err(Error::violation(
                from,
                Violation::CommitmentLength {
                    expected,
                    actual: commitments.len(),
                },
            ));
        }
        proof
            .verify(from, &commitments.constant(), &PROOF_CONTEXT)
            .map_err(|err| Error::violation(from, Violation::InvalidProof(err)))?;

        self.sum.add_assign(&commitments).map_err(|_| {
            Error::violation(
                from,
                Violation::CommitmentLength {
                    expected,
                    actual: commitments.len(),
                },
            )
        })?;
        tracing::trace!(party = %self.i, %from, "commitment verified");
        self.commitments.insert(from, commitments);
        Ok(())
    }

    fn generate_messages(&mut self) -> Result<Vec<Message>, Error> {
        Ok(self
            .participants
            .others(self.i)
            .map(|j| {
                Message::p2p(
                    self.i,
                    j,
                    Body::KeyGen2(KeyGen2 {
                        share: self.polynomial.evaluate(j),
                    }),
                )
            })
            .collect())
    }

    fn next_round(self: Box<Self>) -> Result<NextRound<KeygenResult>, Error> {
        // `polynomial` is dropped here, its coefficients are zeroized
        let Round1 {
            i,
            participants,
            t,
            polynomial: _,
            commitments,
            sum,
            share,
        } = *self;
        Ok(NextRound::Continue(Box::new(Round2::new(
            i,
            participants,
            t,
            commitments,
            sum,
            share,
        ))))
    }
}
