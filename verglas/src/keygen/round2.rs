//! Round 2 - Share verification
//!
//! Received shares are checked against commitments of their senders and summed into the
//! secret share.

use alloc::{boxed::Box, collections::BTreeMap, vec::Vec};

use generic_ec::{Point, SecretScalar};

use crate::{
    ciphersuite::Curve,
    eddsa::{Public, SecretShare},
    error::{Error, Violation},
    messages::{Body, KeyGen2, Message},
    polynomial::ExponentPolynomial,
    state::{NextRound, Round},
    PartyId, PartyIdList,
};

use super::KeygenResult;

/// Verifies received shares and derives the key
pub struct Round2 {
    i: PartyId,
    participants: PartyIdList,
    t: u16,
    commitments: BTreeMap<PartyId, ExponentPolynomial>,
    sum: ExponentPolynomial,
    share: SecretScalar<Curve>,
}

impl Round2 {
    pub fn new(
        i: PartyId,
        participants: PartyIdList,
        t: u16,
        commitments: BTreeMap<PartyId, ExponentPolynomial>,
        sum: ExponentPolynomial,
        share: SecretScalar<Curve>,
    ) -> Self {
        Self {
            i,
            participants,
            t,
            commitments,
            sum,
            share,
        }
    }
}

impl Round<KeygenResult> for Round2 {
    fn process_message(&mut self, msg: Message) -> Result<(), Error> {
        let from = msg.from;
        let KeyGen2 { share } = match msg.body {
            Body::KeyGen2(body) => body,
            body => return Err(Error::violation(from, Violation::WrongRound(body.ty()))),
        };

        let commitment = self
            .commitments
            .get(&from)
            .ok_or(Error::violation(from, Violation::VssFailed))?;
        if Point::generator() * &share != commitment.evaluate(self.i) {
            return Err(Error::violation(from, Violation::VssFailed));
        }
        tracing::trace!(party = %self.i, %from, "share verified");

        let mut sum = *self.share.as_ref() + share.as_ref();
        self.share = SecretScalar::new(&mut sum);
        Ok(())
    }

    fn generate_messages(&mut self) -> Result<Vec<Message>, Error> {
        Ok(Vec::new())
    }

    fn next_round(self: Box<Self>) -> Result<NextRound<KeygenResult>, Error> {
        let Round2 {
            i,
            participants,
            t,
            commitments: _,
            sum,
            share,
        } = *self;
        let shares = participants.iter().map(|j| (j, sum.evaluate(j))).collect();
        let public = Public::new_unchecked(participants, t, shares, sum.constant());
        Ok(NextRound::Finish(KeygenResult {
            public,
            secret: SecretShare::new(i, share),
        }))
    }
}
