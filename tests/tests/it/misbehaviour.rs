use verglas::{
    ciphersuite::generator,
    error::Violation,
    generic_ec::Point,
    messages::{Body, Message, MessageType, Sign1},
    Error, PartyIdList, SigningBuilder,
};
use verglas_tests::{id, ids, keygen, Envelope, Simulation};

fn error_of<O: Clone>(result: &Option<Result<O, Error>>) -> Option<Error> {
    result.clone().and_then(Result::err)
}

fn violation(culprit: u16, reason: Violation) -> Error {
    Error::ProtocolViolation {
        culprit: Some(id(culprit)),
        reason,
    }
}

/// Runs key generation where `t` can differ among parties, tampering messages with `tamper`
fn tampered_keygen(
    participants: &PartyIdList,
    thresholds: &[u16],
    tamper: impl FnMut(&mut Envelope),
) -> std::collections::BTreeMap<verglas::PartyId, Option<Result<verglas::KeygenResult, Error>>> {
    let mut rng = rand_dev::DevRng::new();
    let mut simulation = Simulation::new();
    for (i, t) in participants.iter().zip(thresholds) {
        let (state, _) = verglas::KeygenBuilder::new(i, participants.clone(), *t)
            .start(&mut rng)
            .unwrap();
        simulation.add_party(state);
    }
    simulation.run_with(&mut rng, tamper)
}

#[test]
fn wrong_share_is_attributed_to_sender() {
    verglas_tests::init_tracing();
    let participants = ids(&[1, 2, 3]);
    let results = tampered_keygen(&participants, &[2, 2, 2], |envelope| {
        if envelope.bytes[0] == MessageType::KeyGen2 as u8
            && envelope.from == id(1)
            && envelope.to == id(2)
        {
            // least significant bit of the share
            envelope.bytes[5] ^= 1;
        }
    });

    assert_eq!(
        error_of(&results[&id(2)]),
        Some(violation(1, Violation::VssFailed))
    );
    assert!(matches!(results[&id(1)], Some(Ok(_))));
    assert!(matches!(results[&id(3)], Some(Ok(_))));
}

#[test]
fn invalid_proof_is_attributed_to_sender() {
    let participants = ids(&[1, 2, 3]);
    let results = tampered_keygen(&participants, &[1, 1, 1], |envelope| {
        if envelope.bytes[0] == MessageType::KeyGen1 as u8
            && envelope.from == id(3)
            && envelope.to == id(1)
        {
            // least significant bit of the proof response
            envelope.bytes[5 + 32] ^= 1;
        }
    });

    assert!(matches!(
        &results[&id(1)],
        Some(Err(Error::ProtocolViolation {
            culprit: Some(culprit),
            reason: Violation::InvalidProof(_),
        })) if *culprit == id(3)
    ));
    // party 1 never sends shares, so the others can't complete
    assert!(results[&id(2)].is_none());
    assert!(results[&id(3)].is_none());
}

#[test]
fn wrong_commitment_length_is_attributed_to_sender() {
    let participants = ids(&[1, 2, 3]);
    let results = tampered_keygen(&participants, &[1, 2, 2], |_| ());

    assert_eq!(
        error_of(&results[&id(2)]),
        Some(violation(
            1,
            Violation::CommitmentLength {
                expected: 3,
                actual: 2
            }
        ))
    );
    assert_eq!(
        error_of(&results[&id(3)]),
        Some(violation(
            1,
            Violation::CommitmentLength {
                expected: 3,
                actual: 2
            }
        ))
    );
}

#[test]
fn identity_nonce_is_rejected() {
    let mut rng = rand_dev::DevRng::new();
    let participants = ids(&[1, 2]);
    let keys = keygen(&mut rng, &participants, 1);

    let (mut state, output) =
        SigningBuilder::new(&participants, &keys[1].secret, &keys[1].public, b"hello")
            .start(&mut rng)
            .unwrap();
    assert_eq!(state.process_all().unwrap().len(), 1);

    let msg = Message::broadcast(
        id(1),
        Body::Sign1(Sign1 {
            d: Point::zero(),
            e: generator(),
        }),
    );
    state.handle_message(msg).unwrap();

    let expected = violation(1, Violation::IdentityNonce);
    assert_eq!(state.process_all().unwrap_err(), expected);
    assert_eq!(output.try_get(), Some(Err(expected.clone())));
    assert!(state.is_finished());
    assert_eq!(
        state.handle_message(Message::broadcast(
            id(1),
            Body::Sign1(Sign1 {
                d: generator(),
                e: generator(),
            }),
        )),
        Err(Error::AlreadyFinished)
    );
}

#[test]
fn identity_nonce_on_the_wire_is_rejected() {
    let mut rng = rand_dev::DevRng::new();
    let participants = ids(&[1, 2]);
    let keys = keygen(&mut rng, &participants, 1);

    let mut simulation = Simulation::new();
    for key in &keys {
        let (state, _) = SigningBuilder::new(&participants, &key.secret, &key.public, b"hello")
            .start(&mut rng)
            .unwrap();
        simulation.add_party(state);
    }
    let results = simulation.run_with(&mut rng, |envelope| {
        if envelope.bytes[0] == MessageType::Sign1 as u8 && envelope.from == id(1) {
            // encoding of the identity point
            let mut identity = [0u8; 32];
            identity[0] = 1;
            envelope.bytes[5..37].copy_from_slice(&identity);
        }
    });

    assert_eq!(
        error_of(&results[&id(2)]),
        Some(violation(1, Violation::IdentityNonce))
    );
    assert!(results[&id(1)].is_none());
}

#[test]
fn wrong_signature_share_is_attributed_to_sender() {
    let mut rng = rand_dev::DevRng::new();
    let participants = ids(&[1, 2, 3]);
    let keys = keygen(&mut rng, &participants, 1);
    let signers = ids(&[2, 3]);

    let mut simulation = Simulation::new();
    for key in &keys[1..] {
        let (state, _) = SigningBuilder::new(&signers, &key.secret, &key.public, b"hello")
            .start(&mut rng)
            .unwrap();
        simulation.add_party(state);
    }
    let results = simulation.run_with(&mut rng, |envelope| {
        if envelope.bytes[0] == MessageType::Sign2 as u8 && envelope.from == id(3) {
            envelope.bytes[5] ^= 1;
        }
    });

    assert_eq!(
        error_of(&results[&id(2)]),
        Some(violation(3, Violation::InvalidSignatureShare))
    );
    assert!(matches!(results[&id(3)], Some(Ok(_))));
}
