use rand::seq::SliceRandom;
use test_case::test_case;
use verglas::{generic_ec::Point, PartyIdList, ProtocolVersion};
use verglas_tests::{ids, keygen, sign, verify_sig};

#[test_case(1, &[1, 2], &[1, 2], b"hello"; "t1n2")]
#[test_case(2, &[1, 2, 3], &[1, 2, 3], b"Hello Everybody"; "t2n3")]
#[test_case(5, &[1, 2, 3, 4, 5, 6, 7, 8, 9, 10], &[1, 2, 3, 4, 5, 6], b"hello"; "t5n10 minimum quorum")]
#[test_case(2, &[3, 17, 42, 1000, 65535], &[17, 42, 65535], b"sparse ids"; "t2n5 sparse")]
#[test_case(2, &[1, 2, 3, 4], &[1, 2, 3, 4], b""; "t2n4 empty message")]
fn keygen_then_sign(t: u16, participants: &[u16], signers: &[u16], msg: &[u8]) {
    verglas_tests::init_tracing();
    let mut rng = rand_dev::DevRng::new();
    let participants = ids(participants);
    let signers = ids(signers);

    let keys = keygen(&mut rng, &participants, t);
    assert_eq!(keys.len(), participants.len());
    let public = &keys[0].public;
    for key in &keys {
        assert_eq!(&key.public, public);
    }

    for version in [ProtocolVersion::Frost2, ProtocolVersion::Frost1] {
        let sigs = sign(&mut rng, &keys, &signers, version, msg);
        assert_eq!(sigs.len(), signers.len());
        for sig in &sigs {
            assert_eq!(sig, &sigs[0]);
        }

        sigs[0].verify(&public.group_key(), msg).unwrap();
        verglas::verify(&public.group_key_bytes(), msg, &sigs[0].to_bytes()).unwrap();
        verify_sig(&public.group_key_bytes(), &sigs[0], msg)
            .expect("external verifier: invalid signature");
    }
}

#[test]
fn any_quorum_can_sign() {
    let mut rng = rand_dev::DevRng::new();
    let participants = ids(&[1, 2, 3, 4, 5]);
    let keys = keygen(&mut rng, &participants, 2);
    let group_key = keys[0].public.group_key_bytes();

    let all = participants.iter().collect::<Vec<_>>();
    for size in 3..=5 {
        let signers = PartyIdList::new(all.choose_multiple(&mut rng, size).copied()).unwrap();
        let msg = format!("signed by {size} parties");
        let sigs = sign(
            &mut rng,
            &keys,
            &signers,
            ProtocolVersion::default(),
            msg.as_bytes(),
        );
        verify_sig(&group_key, &sigs[0], msg.as_bytes()).unwrap();
    }
}

#[test]
fn quorum_below_threshold_is_rejected() {
    let mut rng = rand_dev::DevRng::new();
    let participants = ids(&[1, 2, 3, 4, 5, 6, 7, 8, 9, 10]);
    let keys = keygen(&mut rng, &participants, 5);

    let signers = ids(&[1, 2, 3, 4, 5]);
    for key in &keys[..5] {
        let err = verglas::SigningBuilder::new(&signers, &key.secret, &key.public, b"hello")
            .start(&mut rng)
            .err()
            .unwrap();
        assert_eq!(
            err,
            verglas::error::InvalidParameters::TooFewSigners { n: 5, required: 6 }.into()
        );
        assert!(err.to_string().contains("signer set too small"));
    }
}

#[test]
fn shares_are_consistent() {
    let mut rng = rand_dev::DevRng::new();
    let participants = ids(&[1, 2, 3, 4]);
    let keys = keygen(&mut rng, &participants, 2);
    let public = &keys[0].public;

    // public/secret agreement
    for key in &keys {
        assert_eq!(
            public.public_share(key.secret.id()),
            Some(key.secret.public_share())
        );
    }

    // group key interpolates from secret shares over the whole set, and over any t+1 subset
    for set in [participants.clone(), ids(&[1, 2, 3]), ids(&[2, 3, 4]), ids(&[1, 4, 3])] {
        let group_key = keys
            .iter()
            .filter(|key| set.contains(key.secret.id()))
            .fold(Point::zero(), |acc, key| {
                let lambda = set.lagrange_coefficient(key.secret.id()).unwrap();
                acc + key.secret.public_share() * lambda
            });
        assert_eq!(group_key, public.group_key());
    }
}

#[test]
fn output_handles_expose_results() {
    let mut rng = rand_dev::DevRng::new();
    let participants = ids(&[1, 2]);
    let mut simulation = verglas_tests::Simulation::new();
    let mut outputs = vec![];
    for i in &participants {
        let (state, output) = verglas::KeygenBuilder::new(i, participants.clone(), 1)
            .start(&mut rng)
            .unwrap();
        assert!(output.public().is_none());
        simulation.add_party(state);
        outputs.push(output);
    }
    simulation.run(&mut rng);

    let public = outputs[0].public().unwrap();
    for (i, output) in participants.iter().zip(&outputs) {
        assert_eq!(output.public().as_ref(), Some(&public));
        assert_eq!(output.secret_key().unwrap().id(), i);
    }
}
