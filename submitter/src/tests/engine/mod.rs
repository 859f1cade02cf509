use std::str::FromStr;
use std::time::Duration;

use assert_matches::assert_matches;
use bigdecimal::BigDecimal;
use color_eyre::eyre::eyre;
use rstest::*;
use submitter_chain_client_interface::MockChainClient;
use tempfile::{tempdir, TempDir};
use tokio_util::sync::CancellationToken;

use crate::core::client::source::{MockRecordSource, SourceError};
use crate::core::run_submission;
use crate::core::waiter::ConfirmationPolicy;
use crate::error::SubmitterError;
use crate::tests::common::*;
use crate::types::{BatchOutcome, UsageRecord};

fn artifact_dir() -> (TempDir, std::path::PathBuf) {
    let dir = tempdir().unwrap();
    let path = dir.path().join("failed_batches.json");
    (dir, path)
}

#[rstest]
#[tokio::test]
async fn all_batches_confirm_with_consecutive_nonces(cancellation: CancellationToken) {
    let (_dir, artifact) = artifact_dir();
    let chain = scripted_chain(ChainScript::default());
    let signed = chain.signed.clone();
    let engine = engine_with(chain.client, 50, ConfirmationPolicy::default(), &artifact, cancellation);

    let report = engine.submit(chain_records(120)).await.unwrap();

    assert_eq!(report.total_records, 120);
    assert_eq!(report.total_batches, 3);
    assert_eq!(report.confirmed_batches(), 3);
    assert!(report.is_fully_confirmed());
    assert_eq!(report.start_nonce, Some(START_NONCE));
    assert_eq!(report.next_nonce, Some(START_NONCE + 3));
    assert_eq!(report.failure_artifact, None);
    assert!(!artifact.exists());

    let signed = signed.lock().unwrap();
    assert_eq!(signed.iter().map(|batch| batch.params.nonce).collect::<Vec<_>>(), vec![40, 41, 42]);
    assert_eq!(signed.iter().map(|batch| batch.records.len()).collect::<Vec<_>>(), vec![50, 50, 20]);
    for batch in signed.iter() {
        assert_eq!(batch.params.gas_price, GAS_PRICE);
        assert_eq!(batch.params.chain_id, CHAIN_ID);
        assert_eq!(batch.params.gas_limit, 30_000_000);
    }
    let flattened: Vec<_> = signed.iter().flat_map(|batch| batch.records.clone()).collect();
    assert_eq!(flattened, chain_records(120));
}

#[rstest]
#[tokio::test]
async fn send_error_records_the_batch_and_keeps_the_nonce(cancellation: CancellationToken) {
    let (_dir, artifact) = artifact_dir();
    let chain = scripted_chain(ChainScript { sends: vec![SendBehavior::Reject], ..Default::default() });
    let engine = engine_with(chain.client, 50, ConfirmationPolicy::default(), &artifact, cancellation);
    let records = chain_records(50);

    let report = engine.submit(records.clone()).await.unwrap();

    assert_eq!(report.attempts.len(), 1);
    assert_eq!(report.attempts[0].outcome, BatchOutcome::SendFailed);
    assert_eq!(report.attempts[0].tx_hash, None);
    assert_matches!(&report.attempts[0].reason, Some(reason) if reason.contains("replacement transaction underpriced"));
    assert_eq!(report.next_nonce, Some(START_NONCE));
    assert_eq!(report.failed_records, 50);
    assert_eq!(report.failure_artifact.as_deref(), Some(artifact.as_path()));
    assert_eq!(artifact_user_ids(&artifact), user_ids(&records));
}

#[rstest]
#[case::rejected(SendBehavior::Reject)]
#[case::no_hash_returned(SendBehavior::NoHash)]
#[tokio::test]
async fn nonce_is_reused_after_a_batch_that_never_left(
    #[case] failure: SendBehavior,
    cancellation: CancellationToken,
) {
    let (_dir, artifact) = artifact_dir();
    let chain = scripted_chain(ChainScript {
        sends: vec![SendBehavior::Accept, failure, SendBehavior::Accept],
        ..Default::default()
    });
    let signed = chain.signed.clone();
    let engine = engine_with(chain.client, 2, ConfirmationPolicy::default(), &artifact, cancellation);
    let records = chain_records(6);

    let report = engine.submit(records.clone()).await.unwrap();

    assert_eq!(ScriptedChain::signed_nonces(&signed), vec![40, 41, 41]);
    assert_eq!(
        report.attempts.iter().map(|attempt| attempt.outcome).collect::<Vec<_>>(),
        vec![BatchOutcome::Confirmed, BatchOutcome::SendFailed, BatchOutcome::Confirmed]
    );
    assert_eq!(report.next_nonce, Some(42));
    assert_eq!(report.failed_batches(), 1);
    assert_eq!(artifact_user_ids(&artifact), user_ids(&records[2..4]));
}

#[rstest]
#[tokio::test]
async fn sign_error_is_a_send_failure(cancellation: CancellationToken) {
    let (_dir, artifact) = artifact_dir();
    let mut client = MockChainClient::new();
    client.expect_get_nonce().times(1).returning(|| Ok(START_NONCE));
    client.expect_get_gas_price().returning(|| Ok(GAS_PRICE));
    client.expect_get_chain_id().returning(|| Ok(CHAIN_ID));
    client.expect_sign_transaction().times(1).returning(|_, _| Err(eyre!("signer unavailable")));
    client.expect_send_transaction().never();
    let engine = engine_with(client, 50, ConfirmationPolicy::default(), &artifact, cancellation);

    let report = engine.submit(chain_records(3)).await.unwrap();

    assert_eq!(report.attempts[0].outcome, BatchOutcome::SendFailed);
    assert_matches!(&report.attempts[0].reason, Some(reason) if reason.contains("signer unavailable"));
    assert_eq!(report.next_nonce, Some(START_NONCE));
    assert_eq!(artifact_user_ids(&artifact).len(), 3);
}

#[rstest]
#[tokio::test]
async fn reverted_batch_is_recorded_and_consumes_its_nonce(cancellation: CancellationToken) {
    let (_dir, artifact) = artifact_dir();
    let chain = scripted_chain(ChainScript {
        receipts: vec![ReceiptBehavior::Failure, ReceiptBehavior::Success],
        ..Default::default()
    });
    let signed = chain.signed.clone();
    let engine = engine_with(chain.client, 3, ConfirmationPolicy::default(), &artifact, cancellation);
    let records = chain_records(5);

    let report = engine.submit(records.clone()).await.unwrap();

    assert_eq!(ScriptedChain::signed_nonces(&signed), vec![40, 41]);
    assert_eq!(report.attempts[0].outcome, BatchOutcome::Reverted);
    assert!(report.attempts[0].tx_hash.is_some());
    assert_eq!(report.attempts[1].outcome, BatchOutcome::Confirmed);
    assert_eq!(report.next_nonce, Some(42));
    assert_eq!(artifact_user_ids(&artifact), user_ids(&records[..3]));
}

#[rstest]
#[tokio::test]
async fn wait_failure_resyncs_the_nonce_from_the_chain(cancellation: CancellationToken) {
    let (_dir, artifact) = artifact_dir();
    let chain = scripted_chain(ChainScript {
        receipts: vec![ReceiptBehavior::TransportError],
        nonce_queries: vec![Some(START_NONCE), Some(START_NONCE + 1)],
        ..Default::default()
    });
    let signed = chain.signed.clone();
    let nonce_queries = chain.nonce_queries.clone();
    let engine = engine_with(chain.client, 2, ConfirmationPolicy::default(), &artifact, cancellation);

    let report = engine.submit(chain_records(4)).await.unwrap();

    assert_eq!(report.attempts[0].outcome, BatchOutcome::WaitFailed);
    assert_matches!(&report.attempts[0].reason, Some(reason) if reason.contains("connection refused"));
    assert_eq!(ScriptedChain::signed_nonces(&signed), vec![40, 41]);
    assert_eq!(nonce_queries.load(std::sync::atomic::Ordering::SeqCst), 2);
    assert_eq!(report.next_nonce, Some(42));
    assert_eq!(artifact_user_ids(&artifact), vec!["user-0", "user-1"]);
}

#[rstest]
#[tokio::test]
async fn wait_failure_keeps_the_local_nonce_when_requery_fails(cancellation: CancellationToken) {
    let (_dir, artifact) = artifact_dir();
    let chain = scripted_chain(ChainScript {
        receipts: vec![ReceiptBehavior::TransportError],
        nonce_queries: vec![Some(START_NONCE), None],
        ..Default::default()
    });
    let signed = chain.signed.clone();
    let engine = engine_with(chain.client, 2, ConfirmationPolicy::default(), &artifact, cancellation);

    let report = engine.submit(chain_records(4)).await.unwrap();

    assert_eq!(ScriptedChain::signed_nonces(&signed), vec![40, 40]);
    assert_eq!(report.attempts[1].outcome, BatchOutcome::Confirmed);
    assert_eq!(report.next_nonce, Some(41));
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn timed_out_batch_is_recorded_and_the_run_moves_on(cancellation: CancellationToken) {
    let (_dir, artifact) = artifact_dir();
    let chain = scripted_chain(ChainScript {
        receipts: vec![ReceiptBehavior::Pending],
        nonce_queries: vec![Some(START_NONCE), Some(START_NONCE + 1)],
        ..Default::default()
    });
    let signed = chain.signed.clone();
    let policy = ConfirmationPolicy { max_attempts: Some(3), ..Default::default() };
    let engine = engine_with(chain.client, 2, policy, &artifact, cancellation);

    let report = engine.submit(chain_records(4)).await.unwrap();

    assert_eq!(report.attempts[0].outcome, BatchOutcome::TimedOut);
    assert_matches!(&report.attempts[0].reason, Some(reason) if reason.contains("3 polls"));
    assert_eq!(report.attempts[1].outcome, BatchOutcome::Confirmed);
    assert_eq!(ScriptedChain::signed_nonces(&signed), vec![40, 41]);
    assert_eq!(artifact_user_ids(&artifact), vec!["user-0", "user-1"]);
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn cancellation_while_waiting_skips_the_remaining_batches(cancellation: CancellationToken) {
    let (_dir, artifact) = artifact_dir();
    let chain = scripted_chain(ChainScript {
        receipts: vec![ReceiptBehavior::Success, ReceiptBehavior::Pending],
        ..Default::default()
    });
    let signed = chain.signed.clone();
    let engine = engine_with(chain.client, 2, ConfirmationPolicy::default(), &artifact, cancellation.clone());
    let records = chain_records(8);

    let token = cancellation.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(7)).await;
        token.cancel();
    });
    let report = engine.submit(records.clone()).await.unwrap();

    assert_eq!(
        report.attempts.iter().map(|attempt| attempt.outcome).collect::<Vec<_>>(),
        vec![BatchOutcome::Confirmed, BatchOutcome::Cancelled]
    );
    assert_eq!(report.skipped_batches, 2);
    assert_eq!(report.failed_batches(), 3);
    assert_eq!(ScriptedChain::signed_nonces(&signed).len(), 2);
    assert_eq!(report.failed_records, 6);
    assert_eq!(artifact_user_ids(&artifact), user_ids(&records[2..]));
}

#[rstest]
#[tokio::test]
async fn cancelled_run_attempts_nothing(cancellation: CancellationToken) {
    let (_dir, artifact) = artifact_dir();
    let chain = scripted_chain(ChainScript::default());
    let signed = chain.signed.clone();
    let engine = engine_with(chain.client, 2, ConfirmationPolicy::default(), &artifact, cancellation.clone());
    cancellation.cancel();

    let report = engine.submit(chain_records(5)).await.unwrap();

    assert!(report.attempts.is_empty());
    assert!(signed.lock().unwrap().is_empty());
    assert_eq!(report.skipped_batches, 3);
    assert_eq!(report.next_nonce, Some(START_NONCE));
    assert_eq!(artifact_user_ids(&artifact).len(), 5);
}

#[rstest]
#[case::nonce("initial nonce")]
#[case::gas_price("gas price")]
#[case::chain_id("chain id")]
#[tokio::test]
async fn run_aborts_when_run_values_cannot_be_resolved(#[case] failing_step: &'static str, cancellation: CancellationToken) {
    let (_dir, artifact) = artifact_dir();
    let mut client = MockChainClient::new();
    client
        .expect_get_nonce()
        .returning(move || if failing_step == "initial nonce" { Err(eyre!("node down")) } else { Ok(START_NONCE) });
    client
        .expect_get_gas_price()
        .returning(move || if failing_step == "gas price" { Err(eyre!("node down")) } else { Ok(GAS_PRICE) });
    client
        .expect_get_chain_id()
        .returning(move || if failing_step == "chain id" { Err(eyre!("node down")) } else { Ok(CHAIN_ID) });
    client.expect_sign_transaction().never();
    let engine = engine_with(client, 50, ConfirmationPolicy::default(), &artifact, cancellation);

    let result = engine.submit(chain_records(10)).await;

    assert_matches!(
        result,
        Err(SubmitterError::ChainSetupError { step, reason }) if step == failing_step && reason.contains("node down")
    );
    assert!(!artifact.exists());
}

#[rstest]
#[tokio::test]
async fn empty_run_completes_without_touching_the_chain(cancellation: CancellationToken) {
    let (_dir, artifact) = artifact_dir();
    // No expectations: any chain call fails the test.
    let engine = engine_with(MockChainClient::new(), 50, ConfirmationPolicy::default(), &artifact, cancellation);

    let report = engine.submit(Vec::new()).await.unwrap();

    assert_eq!(report.total_batches, 0);
    assert!(report.attempts.is_empty());
    assert!(report.is_fully_confirmed());
    assert_eq!(report.start_nonce, None);
    assert_eq!(report.failure_artifact, None);
    assert!(!artifact.exists());
}

#[rstest]
#[tokio::test]
async fn artifact_collects_every_failed_batch_in_order(cancellation: CancellationToken) {
    let (_dir, artifact) = artifact_dir();
    let chain = scripted_chain(ChainScript {
        sends: vec![SendBehavior::Reject, SendBehavior::Accept, SendBehavior::Accept],
        receipts: vec![ReceiptBehavior::Success, ReceiptBehavior::Failure],
        ..Default::default()
    });
    let engine = engine_with(chain.client, 2, ConfirmationPolicy::default(), &artifact, cancellation);
    let records = chain_records(5);

    let report = engine.submit(records.clone()).await.unwrap();

    assert_eq!(report.failed_batches(), 2);
    assert!(!report.is_fully_confirmed());
    assert_eq!(artifact_user_ids(&artifact), vec!["user-0", "user-1", "user-4"]);

    let entries: Vec<serde_json::Value> = serde_json::from_str(&std::fs::read_to_string(&artifact).unwrap()).unwrap();
    assert_eq!(entries[2]["jobId"], "job-4");
    assert_eq!(entries[2]["durationSeconds"], 64);
    assert_eq!(entries[2]["consumerRewardFixed"], "4000000000000000000");
    assert_eq!(entries[2]["ownerRewardFixed"], "4");
}

fn usage(user: &str, consumer: &str, owner: &str) -> UsageRecord {
    UsageRecord::new(user, format!("{user}-job"), 120, BigDecimal::from_str(consumer).unwrap(), BigDecimal::from_str(owner).unwrap())
}

#[rstest]
#[tokio::test]
async fn run_submission_transforms_and_submits_source_records(cancellation: CancellationToken) {
    let (_dir, artifact) = artifact_dir();
    let mut source = MockRecordSource::new();
    source
        .expect_fetch_records()
        .times(1)
        .returning(|| Ok(vec![usage("alice", "1.5", "0.5"), usage("bob", "0", "0.000000000000000001")]));
    let chain = scripted_chain(ChainScript::default());
    let signed = chain.signed.clone();
    let engine = engine_with(chain.client, 50, ConfirmationPolicy::default(), &artifact, cancellation);

    let report = run_submission(&source, &engine).await.unwrap();

    assert!(report.is_fully_confirmed());
    let signed = signed.lock().unwrap();
    let records = &signed[0].records;
    assert_eq!(user_ids(records), vec!["alice", "bob"]);
    assert_eq!(records[0].consumer_reward_fixed.to_string(), "1500000000000000000");
    assert_eq!(records[0].owner_reward_fixed.to_string(), "500000000000000000");
    assert_eq!(records[1].owner_reward_fixed.to_string(), "1");
}

#[rstest]
#[tokio::test]
async fn run_submission_aborts_on_unrepresentable_rewards(cancellation: CancellationToken) {
    let (_dir, artifact) = artifact_dir();
    let mut source = MockRecordSource::new();
    source.expect_fetch_records().returning(|| Ok(vec![usage("alice", "1", "1"), usage("bob", "-2", "0")]));
    let engine = engine_with(MockChainClient::new(), 50, ConfirmationPolicy::default(), &artifact, cancellation);

    let result = run_submission(&source, &engine).await;

    assert_matches!(result, Err(SubmitterError::TransformError(err)) if err.user_id == "bob");
}

#[rstest]
#[tokio::test]
async fn run_submission_aborts_when_the_source_fails(cancellation: CancellationToken) {
    let (_dir, artifact) = artifact_dir();
    let mut source = MockRecordSource::new();
    source.expect_fetch_records().returning(|| {
        Err(SourceError::ReadError {
            path: "usage.json".into(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
        })
    });
    let engine = engine_with(MockChainClient::new(), 50, ConfirmationPolicy::default(), &artifact, cancellation);

    assert_matches!(run_submission(&source, &engine).await, Err(SubmitterError::SourceError(_)));
}
