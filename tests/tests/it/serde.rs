use verglas::{PartyId, PartyIdList, ProtocolVersion, Public, Signature};
use verglas_tests::{ids, keygen, sign};

#[test]
fn public_key_bundle_survives_json() {
    let mut rng = rand_dev::DevRng::new();
    let keys = keygen(&mut rng, &ids(&[1, 2, 3]), 1);
    let public = &keys[0].public;

    let json = serde_json::to_string(public).unwrap();
    let decoded: Public = serde_json::from_str(&json).unwrap();
    assert_eq!(&decoded, public);
}

#[test]
fn tampered_bundle_is_rejected() {
    let mut rng = rand_dev::DevRng::new();
    let keys = keygen(&mut rng, &ids(&[1, 2, 3]), 1);
    let mut json = serde_json::to_value(&keys[0].public).unwrap();

    // swap public shares of two parties
    let shares = json["shares"].as_array_mut().unwrap();
    let first = shares[0][1].clone();
    shares[0][1] = shares[1][1].clone();
    shares[1][1] = first;

    assert!(serde_json::from_value::<Public>(json).is_err());
}

#[test]
fn party_ids_are_validated() {
    assert_eq!(serde_json::to_string(&PartyId::new(7).unwrap()).unwrap(), "7");
    assert!(serde_json::from_str::<PartyId>("0").is_err());

    let list: PartyIdList = serde_json::from_str("[3, 1, 2]").unwrap();
    assert_eq!(list, ids(&[1, 2, 3]));
    assert!(serde_json::from_str::<PartyIdList>("[1, 1]").is_err());
    assert!(serde_json::from_str::<PartyIdList>("[]").is_err());
}

#[test]
fn signature_survives_json() {
    let mut rng = rand_dev::DevRng::new();
    let participants = ids(&[1, 2]);
    let keys = keygen(&mut rng, &participants, 1);
    let sigs = sign(&mut rng, &keys, &participants, ProtocolVersion::Frost2, b"json");

    let json = serde_json::to_value(sigs[0]).unwrap();
    let decoded: Signature = serde_json::from_value(json.clone()).unwrap();
    assert_eq!(decoded, sigs[0]);

    // scalar >= group order
    let mut tampered = json;
    tampered["s"] = serde_json::to_value([0xffu8; 32]).unwrap();
    assert!(serde_json::from_value::<Signature>(tampered).is_err());
}
