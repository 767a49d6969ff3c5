use std::time::Duration;

use verglas::{Error, KeygenBuilder, SigningBuilder};
use verglas_tests::{ids, keygen};

#[tokio::test]
async fn signing_times_out_without_messages() {
    let mut rng = rand_dev::DevRng::new();
    let participants = ids(&[1, 2]);
    let keys = keygen(&mut rng, &participants, 1);

    let (mut state, output) =
        SigningBuilder::new(&participants, &keys[0].secret, &keys[0].public, b"hello")
            .set_timeout(Duration::from_millis(100))
            .start(&mut rng)
            .unwrap();
    assert_eq!(state.process_all().unwrap().len(), 1);

    assert_eq!(state.wait_for_error().await, Some(Error::Timeout));
    assert_eq!(output.wait_for_error().await, Some(Error::Timeout));
    assert!(output.signature().is_none());
    assert!(state.is_finished());
    assert!(state.process_all().unwrap().is_empty());
}

#[tokio::test]
async fn completed_protocol_is_not_timed_out() {
    let mut rng = rand_dev::DevRng::new();
    let participants = ids(&[1, 2]);

    let mut simulation = verglas_tests::Simulation::new();
    let mut outputs = vec![];
    for i in &participants {
        let (state, output) = KeygenBuilder::new(i, participants.clone(), 1)
            .set_timeout(Duration::from_millis(50))
            .start(&mut rng)
            .unwrap();
        simulation.add_party(state);
        outputs.push(output);
    }
    let results = simulation.run(&mut rng);
    assert!(results.values().all(|r| matches!(r, Some(Ok(_)))));

    tokio::time::sleep(Duration::from_millis(100)).await;
    for output in &outputs {
        assert_eq!(output.wait_for_error().await, None);
        assert!(output.public().is_some());
    }
}

#[tokio::test]
async fn cancel_wakes_up_waiters() {
    let mut rng = rand_dev::DevRng::new();
    let (mut state, output) = KeygenBuilder::new(verglas_tests::id(1), ids(&[1, 2, 3]), 2)
        .start(&mut rng)
        .unwrap();

    let waiter = tokio::spawn(async move { output.wait_for_error().await });
    tokio::task::yield_now().await;
    state.cancel();
    assert_eq!(waiter.await.unwrap(), Some(Error::Cancelled));
}
