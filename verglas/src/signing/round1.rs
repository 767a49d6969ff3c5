//! Round 1 - Signing
//!
//! Once all nonce commitments are known, each signer computes binding factors, the group
//! commitment and the challenge, and broadcasts its signature share.

use alloc::{boxed::Box, vec, vec::Vec};

use generic_ec::{Point, Scalar, SecretScalar};

use crate::{
    ciphersuite::{compute_challenge, Curve},
    eddsa::Signature,
    error::{Error, Violation},
    messages::{Body, Message, MessageType, Sign1, Sign2},
    state::{NextRound, Round},
};

use super::{
    round2::Round2,
    utils::{self, Commitments},
    Session,
};

/// Computes binding factors, group commitment and signature share
pub struct Round1 {
    session: Session,
    secret: SecretScalar<Curve>,
    d: SecretScalar<Curve>,
    e: SecretScalar<Curve>,
    group_commitment: Point<Curve>,
    challenge: Scalar<Curve>,
}

impl Round1 {
    pub fn new(
        session: Session,
        secret: SecretScalar<Curve>,
        d: SecretScalar<Curve>,
        e: SecretScalar<Curve>,
    ) -> Self {
        Self {
            session,
            secret,
            d,
            e,
            group_commitment: Point::zero(),
            challenge: Scalar::zero(),
        }
    }
}

impl Round<Signature> for Round1 {
    fn process_message(&mut self, msg: Message) -> Result<(), Error> {
        let from = msg.from;
        let Sign1 { d, e } = match msg.body {
            Body::Sign1(body) => body,
            body => return Err(Error::violation(from, Violation::WrongRound(body.ty()))),
        };
        if d.is_zero() || e.is_zero() {
            return Err(Error::violation(from, Violation::IdentityNonce));
        }

        let signer = self
            .session
            .signers
            .get_mut(&from)
            .ok_or(Error::violation(from, Violation::WrongRound(MessageType::Sign1)))?;
        signer.d = d;
        signer.e = e;
        tracing::trace!(party = %self.session.i, %from, "nonce commitments received");
        Ok(())
    }

    fn generate_messages(&mut self) -> Result<Vec<Message>, Error> {
        let session = &mut self.session;
        let commitment_list = session
            .signers
            .iter()
            .map(|(j, signer)| {
                (
                    *j,
                    Commitments {
                        hiding: signer.d,
                        binding: signer.e,
                    },
                )
            })
            .collect::<Vec<_>>();
        let binding_factors =
            utils::compute_binding_factors(session.version, &session.msg, &commitment_list);

        for ((j, comm), (_j, rho)) in commitment_list.iter().zip(&binding_factors) {
            debug_assert_eq!(j, _j);
            if let Some(signer) = session.signers.get_mut(j) {
                signer.rho = *rho;
                signer.r = utils::signer_commitment(comm, rho);
            }
        }
        let group_commitment = utils::compute_group_commitment(&commitment_list, &binding_factors);
        let challenge = compute_challenge(&group_commitment, &session.group_key, &session.msg);

        let rho_i = session
            .signers
            .get(&session.i)
            .map(|me| me.rho)
            .unwrap_or_else(Scalar::zero);
        let z = *self.d.as_ref() + rho_i * self.e.as_ref() + challenge * self.secret.as_ref();
        if let Some(me) = session.signers.get_mut(&session.i) {
            me.z = z;
        }

        self.group_commitment = group_commitment;
        self.challenge = challenge;
        Ok(vec![Message::broadcast(
            session.i,
            Body::Sign2(Sign2 { z }),
        )])
    }

    fn next_round(self: Box<Self>) -> Result<NextRound<Signature>, Error> {
        // nonces and the secret are zeroized on drop
        let Round1 {
            session,
            group_commitment,
            challenge,
            ..
        } = *self;
        Ok(NextRound::Continue(Box::new(Round2::new(
            session,
            group_commitment,
            challenge,
        ))))
    }
}
