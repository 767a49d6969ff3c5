//! Round 0 - Nonce commitments

use alloc::{boxed::Box, vec, vec::Vec};

use generic_ec::{Point, SecretScalar};

use crate::{
    ciphersuite::Curve,
    eddsa::Signature,
    error::{Error, Violation},
    messages::{Body, Message, Sign1},
    state::{NextRound, Round},
};

use super::{round1::Round1, Session};

/// Commits to the nonces
pub struct Round0 {
    session: Session,
    secret: SecretScalar<Curve>,
    d: SecretScalar<Curve>,
    e: SecretScalar<Curve>,
}

impl Round0 {
    pub fn new(
        mut session: Session,
        secret: SecretScalar<Curve>,
        d: SecretScalar<Curve>,
        e: SecretScalar<Curve>,
    ) -> Self {
        if let Some(me) = session.signers.get_mut(&session.i) {
            me.d = Point::generator() * &d;
            me.e = Point::generator() * &e;
        }
        Self {
            session,
            secret,
            d,
            e,
        }
    }
}

impl Round<Signature> for Round0 {
    fn process_message(&mut self, msg: Message) -> Result<(), Error> {
        Err(Error::violation(msg.from, Violation::WrongRound(msg.ty())))
    }

    fn generate_messages(&mut self) -> Result<Vec<Message>, Error> {
        Ok(vec![Message::broadcast(
            self.session.i,
            Body::Sign1(Sign1 {
                d: Point::generator() * &self.d,
                e: Point::generator() * &self.e,
            }),
        )])
    }

    fn next_round(self: Box<Self>) -> Result<NextRound<Signature>, Error> {
        let Round0 {
            session,
            secret,
            d,
            e,
        } = *self;
        Ok(NextRound::Continue(Box::new(Round1::new(
            session, secret, d, e,
        ))))
    }
}
