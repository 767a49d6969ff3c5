use verglas::{
    messages::{DecodeError, Message, MessageType, HEADER_SIZE},
    Error, KeygenBuilder, SigningBuilder, State,
};
use verglas_tests::{id, ids};

/// Delivers messages between `states` until all of them terminate, returns all sent messages
fn exchange<O>(mut states: Vec<State<O>>) -> Vec<Message>
where
    O: Clone + Send + Sync + 'static,
{
    let mut all = vec![];
    let mut pending = states
        .iter_mut()
        .flat_map(|s| s.process_all().unwrap())
        .collect::<Vec<_>>();
    while !pending.is_empty() {
        all.extend(pending.iter().cloned());
        let mut next = vec![];
        for msg in pending {
            for state in states.iter_mut().filter(|s| s.id() != msg.from) {
                if msg.to.is_some_and(|to| to != state.id()) {
                    continue;
                }
                state.handle_message(msg.clone()).unwrap();
                next.extend(state.process_all().unwrap());
            }
        }
        pending = next;
    }
    assert!(states.iter().all(|s| s.is_finished()));
    all
}

/// Collects messages of every round of 2-out-of-3 key generation and signing
fn protocol_messages() -> Vec<Message> {
    let mut rng = rand_dev::DevRng::new();
    let participants = ids(&[1, 2, 3]);
    let (states, outputs): (Vec<_>, Vec<_>) = participants
        .iter()
        .map(|i| {
            KeygenBuilder::new(i, participants.clone(), 1)
                .start(&mut rng)
                .unwrap()
        })
        .unzip();
    let mut all = exchange(states);

    let keys = outputs
        .iter()
        .map(|out| out.get().unwrap())
        .collect::<Vec<_>>();
    let signers = ids(&[1, 2]);
    let states = keys[..2]
        .iter()
        .map(|key| {
            SigningBuilder::new(&signers, &key.secret, &key.public, b"wire")
                .start(&mut rng)
                .unwrap()
                .0
        })
        .collect();
    all.extend(exchange(states));
    all
}

#[test]
fn sizes_match_wire_format() {
    let msgs = protocol_messages();
    for msg in &msgs {
        let bytes = msg.to_bytes();
        assert_eq!(bytes.len(), msg.size());
        let expected = match msg.ty() {
            MessageType::KeyGen1 => 5 + 64 + 2 + 32 * 2,
            MessageType::KeyGen2 => 5 + 32,
            MessageType::Sign1 => 5 + 64,
            MessageType::Sign2 => 5 + 32,
        };
        assert_eq!(bytes.len(), expected);

        let decoded = Message::from_bytes(&bytes).unwrap();
        assert_eq!(decoded.header(), msg.header());
        assert_eq!(decoded.to_bytes(), bytes);
    }
    assert_eq!(
        msgs.iter()
            .filter(|m| m.ty() == MessageType::KeyGen1)
            .count(),
        3
    );
    assert_eq!(
        msgs.iter()
            .filter(|m| m.ty() == MessageType::KeyGen2)
            .count(),
        6
    );
    assert_eq!(
        msgs.iter().filter(|m| m.ty() == MessageType::Sign2).count(),
        2
    );
}

#[test]
fn broadcast_flag_must_match_type() {
    for msg in protocol_messages() {
        let mut bytes = msg.to_bytes();
        if msg.is_broadcast() {
            assert_eq!(&bytes[3..5], &[0, 0]);
            bytes[4] = 1;
            assert_eq!(
                Message::from_bytes(&bytes).unwrap_err(),
                DecodeError::UnexpectedRecipient(msg.ty())
            );
        } else {
            assert_ne!(&bytes[3..5], &[0, 0]);
            bytes[3..5].copy_from_slice(&[0, 0]);
            assert_eq!(
                Message::from_bytes(&bytes).unwrap_err(),
                DecodeError::MissingRecipient(msg.ty())
            );
        }
    }
}

#[test]
fn header_is_validated() {
    let msg = &protocol_messages()[0];
    let bytes = msg.to_bytes();

    for tag in [0, 5, 0xff] {
        let mut bytes = bytes.clone();
        bytes[0] = tag;
        assert_eq!(
            Message::from_bytes(&bytes).unwrap_err(),
            DecodeError::UnknownType(tag)
        );
    }

    let mut zero_sender = bytes.clone();
    zero_sender[1..3].copy_from_slice(&[0, 0]);
    assert_eq!(
        Message::from_bytes(&zero_sender).unwrap_err(),
        DecodeError::ZeroSender
    );

    for len in 0..HEADER_SIZE {
        assert_eq!(
            Message::from_bytes(&bytes[..len]).unwrap_err(),
            DecodeError::TooShort
        );
    }
}

#[test]
fn commitment_degree_must_match_length() {
    let msg = &protocol_messages()[0];
    assert_eq!(msg.ty(), MessageType::KeyGen1);
    let mut bytes = msg.to_bytes();
    // degree field follows the proof
    bytes[HEADER_SIZE + 64..HEADER_SIZE + 66].copy_from_slice(&2u16.to_be_bytes());
    assert_eq!(
        Message::from_bytes(&bytes).unwrap_err(),
        DecodeError::WrongLength(MessageType::KeyGen1)
    );
}

#[test]
fn messages_of_other_protocol_are_rejected() {
    let mut rng = rand_dev::DevRng::new();
    let participants = ids(&[1, 2]);
    let (mut state, _) = KeygenBuilder::new(id(1), participants, 1)
        .start(&mut rng)
        .unwrap();
    state.process_all().unwrap();

    let sign2 = Message::broadcast(
        id(2),
        verglas::messages::Body::Sign2(verglas::messages::Sign2 {
            z: verglas::generic_ec::Scalar::one(),
        }),
    );
    assert_eq!(
        state.handle_message(sign2),
        Err(Error::UnexpectedMessage(
            verglas::error::UnexpectedMessage::WrongProtocol(MessageType::Sign2)
        ))
    );
}
