//! Round 2 - Aggregation
//!
//! Each signer verifies the shares of others and aggregates them into a regular signature.

use alloc::{boxed::Box, vec::Vec};

use generic_ec::{Point, Scalar};

use crate::{
    ciphersuite::Curve,
    eddsa::Signature,
    error::{Error, Violation},
    messages::{Body, Message, Sign2},
    state::{NextRound, Round},
};

use super::Session;

/// Verifies signature shares and aggregates them
pub struct Round2 {
    session: Session,
    group_commitment: Point<Curve>,
    challenge: Scalar<Curve>,
}

impl Round2 {
    pub fn new(session: Session, group_commitment: Point<Curve>, challenge: Scalar<Curve>) -> Self {
        Self {
            session,
            group_commitment,
            challenge,
        }
    }
}

impl Round<Signature> for Round2 {
    fn process_message(&mut self, msg: Message) -> Result<(), Error> {
        let from = msg.from;
        let Sign2 { z } = match msg.body {
            Body::Sign2(body) => body,
            body => return Err(Error::violation(from, Violation::WrongRound(body.ty()))),
        };

        let signer = self
            .session
            .signers
            .get_mut(&from)
            .ok_or(Error::violation(from, Violation::InvalidSignatureShare))?;
        // z_j G = R_j + c A'_j
        if Point::generator() * z != signer.r + signer.public * self.challenge {
            return Err(Error::violation(from, Violation::InvalidSignatureShare));
        }
        signer.z = z;
        tracing::trace!(party = %self.session.i, %from, "signature share verified");
        Ok(())
    }

    fn generate_messages(&mut self) -> Result<Vec<Message>, Error> {
        Ok(Vec::new())
    }

    fn next_round(self: Box<Self>) -> Result<NextRound<Signature>, Error> {
        let s = self.session.signers.values().map(|signer| signer.z).sum();
        let signature = Signature {
            r: self.group_commitment,
            s,
        };
        signature
            .verify(&self.session.group_key, &self.session.msg)
            .map_err(|_| Error::ProtocolViolation {
                culprit: None,
                reason: Violation::InvalidSignature,
            })?;
        Ok(NextRound::Finish(signature))
    }
}
