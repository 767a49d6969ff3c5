use std::collections::BTreeMap;

use futures::{channel::mpsc, SinkExt, StreamExt};
use verglas::{
    driver::{self, Outgoing},
    Error, KeygenResult, PartyId, PartyIdList, Signature, State,
};
use verglas_tests::{id, ids, verify_sig};

/// Runs every party in its own task, connected by in-memory channels
async fn run_over_channels<O>(states: Vec<State<O>>) -> Vec<Result<O, driver::RunError>>
where
    O: Clone + Send + Sync + 'static,
{
    let parties = states.iter().map(|s| s.id()).collect::<Vec<_>>();
    let mut inboxes = BTreeMap::new();
    let mut receivers = vec![];
    for &i in &parties {
        let (tx, rx) = mpsc::unbounded::<Vec<u8>>();
        inboxes.insert(i, tx);
        receivers.push(rx);
    }

    let mut tasks = vec![];
    for (state, incoming) in states.into_iter().zip(receivers) {
        let me = state.id();
        let inboxes = inboxes.clone();
        let (outgoing, mut sent) = mpsc::unbounded::<Outgoing>();

        // delivers sent messages into inboxes of recipients
        let router = async move {
            while let Some(msg) = sent.next().await {
                let recipients: Vec<PartyId> = match msg.to {
                    Some(to) => vec![to],
                    None => inboxes.keys().copied().filter(|j| *j != me).collect(),
                };
                for to in recipients {
                    let _ = inboxes[&to].unbounded_send(msg.bytes.clone());
                }
            }
        };
        tokio::spawn(router);
        tasks.push(tokio::spawn(driver::run(state, incoming, outgoing)));
    }
    drop(inboxes);

    let mut results = vec![];
    for task in tasks {
        results.push(task.await.unwrap());
    }
    results
}

#[tokio::test]
async fn keygen_and_sign_over_channels() {
    verglas_tests::init_tracing();
    let mut rng = rand_dev::DevRng::new();
    let participants = ids(&[1, 2, 3]);

    let states = participants
        .iter()
        .map(|i| {
            verglas::KeygenBuilder::new(i, participants.clone(), 1)
                .start(&mut rng)
                .unwrap()
                .0
        })
        .collect();
    let keys: Vec<KeygenResult> = run_over_channels(states)
        .await
        .into_iter()
        .collect::<Result<_, _>>()
        .unwrap();

    let signers = ids(&[1, 3]);
    let msg = b"Hello, TSS World!";
    let states = keys
        .iter()
        .filter(|key| signers.contains(key.secret.id()))
        .map(|key| {
            verglas::new_sign_state(
                &signers,
                &key.secret,
                &key.public,
                msg,
                std::time::Duration::from_secs(10),
                &mut rng,
            )
            .unwrap()
            .0
        })
        .collect();
    let sigs: Vec<Signature> = run_over_channels(states)
        .await
        .into_iter()
        .collect::<Result<_, _>>()
        .unwrap();

    assert_eq!(sigs[0], sigs[1]);
    verify_sig(&keys[0].public.group_key_bytes(), &sigs[0], msg).unwrap();
}

#[tokio::test]
async fn closed_incoming_cancels_protocol() {
    let mut rng = rand_dev::DevRng::new();
    let (state, output) = verglas::KeygenBuilder::new(id(1), PartyIdList::from_u16s(&[1, 2]).unwrap(), 1)
        .start(&mut rng)
        .unwrap();

    let incoming = futures::stream::iter(vec![vec![0xff; 3], vec![1, 0, 7, 0, 0]]);
    let (outgoing, mut sent) = mpsc::unbounded::<Outgoing>();
    let result = driver::run(state, incoming, outgoing).await;

    assert!(matches!(
        result,
        Err(driver::RunError::Protocol(Error::Cancelled))
    ));
    assert_eq!(output.wait_for_error().await, Some(Error::Cancelled));

    // the first round was sent regardless
    let first = sent.next().await.unwrap();
    assert!(first.is_broadcast());
    assert_eq!(first.bytes[0], 1);
}

#[tokio::test]
async fn failed_send_is_reported() {
    let mut rng = rand_dev::DevRng::new();
    let (state, _output) = verglas::KeygenBuilder::new(id(1), ids(&[1, 2]), 1)
        .start(&mut rng)
        .unwrap();

    let (mut outgoing, sent) = mpsc::unbounded::<Outgoing>();
    drop(sent);
    outgoing.close().await.unwrap();
    let result = driver::run(state, futures::stream::pending(), outgoing).await;
    assert!(matches!(result, Err(driver::RunError::Send(_))));
}
