//! End-to-end scan flows over mock engines.

mod common;

use common::{
    Harness, assert_single_outcome, bookkeeping_messages, chip_payload, optical_with_can,
    optical_with_mrz,
};
use docscan_core::{
    AccessCredential, CompletionEvent, DocReaderAction, FailureKind, PasswordType, ScanOutcome,
};
use docscan_engine::EngineError;
use docscan_engine::mock::EngineCall;
use docscan_session::{CredentialPolicy, ScanPhase, SessionConfig};

#[tokio::test]
async fn test_optical_only_scan_succeeds_on_first_complete() {
    let mut h = Harness::new();
    let first = optical_with_mrz(DocReaderAction::Complete, "P<UTO");
    h.optical
        .script_session(vec![
            CompletionEvent::new(DocReaderAction::Process),
            CompletionEvent::new(DocReaderAction::Notification),
            first.clone(),
            optical_with_mrz(DocReaderAction::Complete, "SECOND"),
        ])
        .await;

    let outcome = h.orchestrator.run_scan(false).await;

    assert_eq!(outcome, ScanOutcome::Success(first));
    assert_eq!(h.orchestrator.phase(), ScanPhase::Done);
    assert_eq!(h.count(&EngineCall::StartChip), 0);
    assert!(h.chip.configured_credentials().await.is_empty());
    assert_single_outcome(&mut h);
}

#[tokio::test]
async fn test_more_pages_without_rfid_keeps_scanning() {
    let mut h = Harness::new();
    h.optical
        .script_session(vec![
            CompletionEvent::new(DocReaderAction::MorePagesAvailable),
            CompletionEvent::new(DocReaderAction::Complete),
        ])
        .await;

    let outcome = h.orchestrator.run_scan(false).await;

    assert!(outcome.is_success());
    assert_eq!(h.count(&EngineCall::StartChip), 0);
}

#[tokio::test]
async fn test_rfid_pivot_configures_chip_stops_optical_starts_chip() {
    let mut h = Harness::new();
    h.optical
        .script_session(vec![optical_with_mrz(DocReaderAction::Complete, "M1<<\n")])
        .await;

    assert!(h.orchestrator.start_scan(true).await.is_none());
    assert!(h.orchestrator.step().await.is_none());

    let credential = AccessCredential::new("M1<<", PasswordType::FromMrz).unwrap();
    assert_eq!(
        h.journal.calls(),
        vec![
            EngineCall::StartOptical,
            EngineCall::ConfigureScenario(credential.clone()),
            EngineCall::StopOptical,
            EngineCall::StartChip,
        ]
    );
    assert_eq!(h.chip.configured_credentials().await, vec![credential]);
    assert_eq!(h.orchestrator.phase(), ScanPhase::RfidActive);
    assert!(!h.optical.is_streaming().await);
    assert!(h.chip.is_streaming().await);
}

#[tokio::test]
async fn test_full_rfid_scan_succeeds_with_chip_result() {
    let mut h = Harness::new();
    h.optical
        .script_session(vec![optical_with_can(DocReaderAction::Complete, "123456")])
        .await;
    let mut chip_messages = bookkeeping_messages();
    chip_messages.push(chip_payload(1));
    h.chip.script_session(chip_messages).await;

    let outcome = h.orchestrator.run_scan(true).await;

    match &outcome {
        ScanOutcome::Success(event) => {
            assert_eq!(event.action, DocReaderAction::Complete);
            assert_eq!(event.field(1), Some("ERIKSSON"));
        }
        other => panic!("expected success, got {other:?}"),
    }
    assert_eq!(h.count(&EngineCall::StartChip), 1);
    assert!(h.orchestrator.session().state().rfid_concluded);
    assert_eq!(assert_single_outcome(&mut h), outcome);
}

#[tokio::test]
async fn test_chip_error_payload_fails_exactly_once() {
    let mut h = Harness::new();
    h.optical
        .script_session(vec![optical_with_mrz(DocReaderAction::Complete, "M1<<")])
        .await;
    h.chip
        .script_session(vec![
            "rfidNotificationCompletionEvent".to_string(),
            chip_payload(3),
            chip_payload(1),
        ])
        .await;

    let outcome = h.orchestrator.run_scan(true).await;

    assert_eq!(h.orchestrator.phase(), ScanPhase::Failed);
    match outcome {
        ScanOutcome::Failure(failure) => {
            assert_eq!(failure.kind, FailureKind::Engine);
            assert_eq!(failure.reason, "scan failed");
        }
        other => panic!("expected failure, got {other:?}"),
    }
    assert!(h.orchestrator.step().await.is_none());
    assert_single_outcome(&mut h);
}

#[tokio::test]
async fn test_unparseable_chip_payload_is_a_parse_failure() {
    let mut h = Harness::new();
    h.optical
        .script_session(vec![optical_with_mrz(DocReaderAction::Complete, "M1<<")])
        .await;
    h.chip.script_session(vec!["{\"results\":"]).await;

    let outcome = h.orchestrator.run_scan(true).await;

    match outcome {
        ScanOutcome::Failure(failure) => assert_eq!(failure.kind, FailureKind::Parse),
        other => panic!("expected parse failure, got {other:?}"),
    }
}

#[tokio::test]
async fn test_chip_stream_error_fails_scan() {
    let mut h = Harness::new();
    h.optical
        .script_session(vec![optical_with_mrz(DocReaderAction::Complete, "M1<<")])
        .await;
    h.chip
        .script_stream(vec![
            Ok("paCertificateCompletionEvent".to_string()),
            Err(EngineError::scan_failed("chip lost")),
        ])
        .await;

    let outcome = h.orchestrator.run_scan(true).await;

    match outcome {
        ScanOutcome::Failure(failure) => {
            assert_eq!(failure.kind, FailureKind::Engine);
            assert!(failure.detail.unwrap().contains("chip lost"));
        }
        other => panic!("expected failure, got {other:?}"),
    }
    assert_single_outcome(&mut h);
}

#[tokio::test]
async fn test_optical_error_fails_without_chip() {
    let mut h = Harness::new();
    h.optical
        .script_session(vec![CompletionEvent::new(DocReaderAction::Error)])
        .await;

    let outcome = h.orchestrator.run_scan(true).await;

    assert_eq!(outcome, ScanOutcome::failure(FailureKind::Engine));
    assert_eq!(h.count(&EngineCall::StartChip), 0);
}

#[tokio::test]
async fn test_chip_more_pages_waits_for_next_payload() {
    let mut h = Harness::new();
    h.optical
        .script_session(vec![optical_with_mrz(
            DocReaderAction::MorePagesAvailable,
            "M1<<",
        )])
        .await;
    h.chip
        .script_session(vec![chip_payload(8), chip_payload(1)])
        .await;

    let outcome = h.orchestrator.run_scan(true).await;

    assert!(outcome.is_success());
    assert_eq!(h.count(&EngineCall::StartChip), 1);
    assert_eq!(h.count(&EngineCall::StopOptical), 1);
}

#[tokio::test]
async fn test_bookkeeping_after_conclusion_changes_nothing() {
    let mut h = Harness::new();
    h.optical
        .script_session(vec![optical_with_mrz(DocReaderAction::Complete, "M1<<")])
        .await;
    h.chip.script_session(vec![chip_payload(8)]).await;

    h.orchestrator.start_scan(true).await;
    h.orchestrator.step().await;
    h.orchestrator.step().await;
    let concluded = h.orchestrator.session().state();
    assert!(concluded.rfid_concluded);
    let history_len = h.orchestrator.session().history().len();

    for message in bookkeeping_messages() {
        h.chip.emit(message).await.unwrap();
        assert!(h.orchestrator.step().await.is_none());
    }

    assert_eq!(h.orchestrator.session().state(), concluded);
    assert_eq!(h.orchestrator.session().history().len(), history_len);
    assert!(h.outcomes().is_empty());
}

#[tokio::test]
async fn test_missing_credential_proceeds_by_default() {
    let mut h = Harness::new();
    h.optical
        .script_session(vec![CompletionEvent::new(DocReaderAction::Complete)])
        .await;
    h.chip.script_session(vec![chip_payload(1)]).await;

    let outcome = h.orchestrator.run_scan(true).await;

    assert!(outcome.is_success());
    assert!(h.chip.configured_credentials().await.is_empty());
    assert_eq!(h.count(&EngineCall::StartChip), 1);
}

#[tokio::test]
async fn test_missing_credential_aborts_under_abort_policy() {
    let mut h = Harness::with_config(SessionConfig {
        credential_policy: CredentialPolicy::Abort,
        ..SessionConfig::default()
    });
    h.optical
        .script_session(vec![CompletionEvent::new(DocReaderAction::Complete)])
        .await;

    let outcome = h.orchestrator.run_scan(true).await;

    assert_eq!(outcome, ScanOutcome::failure(FailureKind::CredentialAbsent));
    assert_eq!(h.count(&EngineCall::StopOptical), 1);
    assert_eq!(h.count(&EngineCall::StartChip), 0);
}

#[tokio::test]
async fn test_late_optical_events_are_discarded_after_done() {
    let mut h = Harness::new();
    h.optical
        .script_session(vec![CompletionEvent::new(DocReaderAction::Complete)])
        .await;

    h.orchestrator.run_scan(false).await;

    assert!(
        h.optical
            .emit(CompletionEvent::new(DocReaderAction::Error))
            .await
            .is_err()
    );
    assert!(h.orchestrator.step().await.is_none());
    assert_eq!(h.orchestrator.phase(), ScanPhase::Done);
    assert_single_outcome(&mut h);
}

#[tokio::test]
async fn test_consecutive_scans_get_fresh_sessions() {
    let mut h = Harness::new();
    h.optical
        .script_session(vec![CompletionEvent::new(DocReaderAction::Complete)])
        .await;
    h.optical
        .script_session(vec![CompletionEvent::new(DocReaderAction::Error)])
        .await;

    let first = h.orchestrator.run_scan(false).await;
    let first_id = h.orchestrator.session().id();
    let second = h.orchestrator.run_scan(false).await;

    assert!(first.is_success());
    assert!(second.is_failure());
    assert_ne!(h.orchestrator.session().id(), first_id);
    assert_eq!(h.outcomes().len(), 2);
}

#[tokio::test]
async fn test_chip_stream_ending_without_result_fails_once() {
    let mut h = Harness::new();
    h.optical
        .script_session(vec![optical_with_mrz(DocReaderAction::Complete, "M1<<")])
        .await;
    h.chip.script_session(bookkeeping_messages()).await;

    assert!(h.orchestrator.start_scan(true).await.is_none());
    assert!(h.orchestrator.step().await.is_none());
    assert_eq!(h.orchestrator.phase(), ScanPhase::RfidActive);

    for _ in bookkeeping_messages() {
        assert!(h.orchestrator.step().await.is_none());
    }
    h.chip.close().await;

    let outcome = h.orchestrator.step().await.unwrap();
    match &outcome {
        ScanOutcome::Failure(failure) => {
            assert_eq!(failure.kind, FailureKind::Engine);
            assert!(failure.detail.as_deref().unwrap().contains("without a result"));
        }
        other => panic!("expected failure, got {other:?}"),
    }
    assert_eq!(h.orchestrator.phase(), ScanPhase::Failed);
    assert!(h.orchestrator.step().await.is_none());
    assert_eq!(assert_single_outcome(&mut h), outcome);
}
