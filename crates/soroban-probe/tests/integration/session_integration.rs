//! End-to-end `DebugSession` flows against an in-memory gateway.

use std::sync::Arc;

use soroban_probe::*;
use tokio_test::{assert_err, assert_ok};

use crate::support::{self, MockGateway};

async fn wait_until_loading(session: &DebugSession) {
    while !session.is_loading() {
        tokio::task::yield_now().await;
    }
}

// =============================================================================
// Setup
// =============================================================================

#[tokio::test]
async fn test_phases_follow_prerequisites() {
    support::init_tracing();
    let mock = Arc::new(MockGateway::new());
    let session =
        DebugSession::with_connector(SessionConfig::default(), support::connector(vec![mock]));
    assert_eq!(session.phase(), SessionPhase::Disconnected);

    session.select_network(TESTNET.clone());
    assert_eq!(session.phase(), SessionPhase::NetworkReady);

    assert_ok!(session.set_contract(&support::contract_hex()).await);
    assert_eq!(session.phase(), SessionPhase::ContractReady);

    assert_ok!(session.set_account(&support::account()).await);
    assert_eq!(session.phase(), SessionPhase::ReadyToExecute);
    assert!(!session.is_loading());
}

#[tokio::test]
async fn test_set_contract_loads_details_and_storage() {
    let mock = Arc::new(MockGateway::new().with_ledger_entries(support::instance_entries(vec![
        (WireValue::Symbol("name".into()), WireValue::String("Token".into())),
    ])));
    let session = support::session_with(mock);

    assert_ok!(session.set_contract(&support::contract_hex()).await);

    let details = session.contract_details().expect("details loaded");
    assert_eq!(details.code.code_size, Some(2048));
    assert_eq!(session.storage().len(), 1);

    // One request/response pair per fetch
    let network_logs = session.network_logs();
    assert_eq!(network_logs.len(), 4);
    assert_eq!(network_logs.iter().filter(|log| log.is_request()).count(), 2);

    let last = session.debug_logs().pop().expect("summary entry");
    assert_eq!(last.kind, DebugLogKind::Success);
    assert_eq!(
        last.message,
        format!("Contract {} connected (1 storage entries)", support::contract_hex())
    );
}

#[tokio::test]
async fn test_set_contract_keeps_contract_when_fetches_fail() {
    let mock = Arc::new(
        MockGateway::new()
            .failing_contract_code("contract not found")
            .failing_ledger_entries("contract not found"),
    );
    let session = support::session_with(mock);

    assert_ok!(session.set_contract(&support::contract_hex()).await);

    assert_eq!(session.phase(), SessionPhase::ContractReady);
    assert_eq!(session.contract_id(), Some(support::contract_hex()));
    assert!(session.contract_details().is_none());
    assert!(session.storage().is_empty());

    let errors = session
        .debug_logs()
        .into_iter()
        .filter(|log| log.kind == DebugLogKind::Error)
        .collect::<Vec<_>>();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].message.contains("connected with errors"));
}

#[tokio::test]
async fn test_account_balance_is_formatted() {
    let mock = Arc::new(MockGateway::new());
    let session = support::session_with(mock);
    assert_eq!(session.account_balance(), "0.0000000");

    assert_ok!(session.set_account(&support::account()).await);

    assert_eq!(session.account_balance(), "12.5000000");
    let last = session.debug_logs().pop().expect("account entry");
    assert_eq!(
        last.message,
        format!("Account {} connected (balance 12.5000000 XLM)", support::account())
    );
}

#[tokio::test]
async fn test_account_fetch_failure_keeps_account() {
    let mock = Arc::new(MockGateway::new().failing_account("account not found"));
    let session = support::session_with(mock);

    assert_ok!(session.set_account(&support::account()).await);

    assert_eq!(session.account(), Some(support::account()));
    assert_eq!(session.account_balance(), "0.0000000");
    let last = session.debug_logs().pop().expect("error entry");
    assert_eq!(last.kind, DebugLogKind::Error);
    assert!(last.message.starts_with("Error fetching account balance:"));
}

// =============================================================================
// Execution
// =============================================================================

#[tokio::test]
async fn test_execute_logs_one_exchange() {
    let mock = Arc::new(MockGateway::new());
    let session = support::ready_session(mock).await;

    let outcome = assert_ok!(
        session
            .execute("balance_of", &["0x4a".into()], MethodKind::Read)
            .await
    );
    assert!(outcome.is_success());
    assert_eq!(session.last_outcome(), Some(outcome));

    let network_logs = session.network_logs();
    assert_eq!(network_logs.len(), 2);
    assert!(network_logs[0].is_request());
    assert_eq!(network_logs[0].message, "Reading: balance_of(0x4a)");
    assert_eq!(network_logs[1].message, "Success: balance_of executed");
    assert_eq!(network_logs[1].status.as_deref(), Some("Success (200)"));

    let debug_logs = session.debug_logs();
    assert_eq!(debug_logs.len(), 2);
    assert_eq!(debug_logs[0].message, "Logs cleared");
    assert_eq!(debug_logs[1].kind, DebugLogKind::Success);
    assert_eq!(debug_logs[1].message, "Method balance_of executed successfully");
}

#[tokio::test]
async fn test_write_method_failure_is_logged() {
    let mock = Arc::new(MockGateway::new());
    let session = support::ready_session(mock.clone()).await;
    *mock.simulation.lock().unwrap() = Err("insufficient balance".to_string());

    let outcome = assert_ok!(
        session
            .execute(
                "transfer",
                &["0x4a".into(), "0x4b".into(), "100".into()],
                MethodKind::Write,
            )
            .await
    );
    assert!(outcome.is_failure());

    let network_logs = session.network_logs();
    assert_eq!(network_logs[0].message, "Writing: transfer(0x4a, 0x4b, 100)");
    assert!(network_logs[1].message.starts_with("Error: "));
    assert_eq!(network_logs[1].status.as_deref(), Some("Error (400)"));

    let last = session.debug_logs().pop().expect("error entry");
    assert_eq!(last.kind, DebugLogKind::Error);
    assert!(last.message.starts_with("Error executing transfer:"));
}

#[tokio::test]
async fn test_execute_without_account_is_rejected() {
    let mock = Arc::new(MockGateway::new());
    let session = support::session_with(mock.clone());
    assert_ok!(session.set_contract(&support::contract_hex()).await);
    session.clear_logs();

    let err = assert_err!(session.execute("name", &[], MethodKind::Read).await);

    assert!(matches!(
        err,
        Error::Invocation(InvocationError::MissingAccount)
    ));
    assert!(session.network_logs().is_empty());
    assert_eq!(mock.simulate_calls(), 0);
    let last = session.debug_logs().pop().expect("error entry");
    assert!(last.message.starts_with("missing prerequisite"));
}

#[tokio::test]
async fn test_encoding_error_sends_nothing() {
    let mock = Arc::new(MockGateway::new());
    let session = support::ready_session(mock.clone()).await;

    let err = assert_err!(
        session
            .execute("transfer", &["0x4a".into(), "2.5".into()], MethodKind::Write)
            .await
    );

    assert!(matches!(err, Error::Encoding { index: 1, .. }));
    assert!(session.network_logs().is_empty());
    assert_eq!(mock.simulate_calls(), 0);
}

// =============================================================================
// Concurrency
// =============================================================================

#[tokio::test]
async fn test_overlapping_operation_is_busy() {
    let (mock, gate) = MockGateway::gated();
    let session = Arc::new(support::ready_session(Arc::new(mock)).await);

    let running = {
        let session = session.clone();
        tokio::spawn(async move {
            session
                .execute("balance_of", &["0x4a".into()], MethodKind::Read)
                .await
        })
    };
    wait_until_loading(&session).await;

    let err = assert_err!(session.refresh_storage().await);
    assert!(matches!(err, Error::Invocation(InvocationError::Busy)));

    gate.notify_one();
    let outcome = assert_ok!(running.await.expect("task panicked"));
    assert!(outcome.is_success());
    assert!(!session.is_loading());
}

#[tokio::test]
async fn test_network_switch_discards_late_result() {
    let (slow, gate) = MockGateway::gated();
    let fresh = Arc::new(MockGateway::new());
    let session = Arc::new(DebugSession::with_connector(
        SessionConfig::default(),
        support::connector(vec![Arc::new(slow), fresh.clone()]),
    ));
    session.select_network(TESTNET.clone());
    assert_ok!(session.set_contract(&support::contract_hex()).await);
    assert_ok!(session.set_account(&support::account()).await);

    let running = {
        let session = session.clone();
        tokio::spawn(async move {
            session
                .execute("balance_of", &["0x4a".into()], MethodKind::Read)
                .await
        })
    };
    wait_until_loading(&session).await;

    session.select_network(FUTURENET.clone());
    gate.notify_one();

    // The call itself completed; the session just ignores it.
    let outcome = assert_ok!(running.await.expect("task panicked"));
    assert!(outcome.is_success());

    assert_eq!(session.phase(), SessionPhase::NetworkReady);
    assert_eq!(session.network().map(|n| n.kind()), Some(NetworkKind::Futurenet));
    assert!(session.last_outcome().is_none());
    assert!(session.contract_id().is_none());
    assert!(session.network_logs().is_empty());

    let debug_logs = session.debug_logs();
    assert_eq!(debug_logs.len(), 1);
    assert_eq!(debug_logs[0].message, "Connected to FUTURENET");
    assert_eq!(fresh.total_calls(), 0);
}

// =============================================================================
// Logs
// =============================================================================

#[tokio::test]
async fn test_clear_network_logs_keeps_debug_history() {
    let mock = Arc::new(MockGateway::new());
    let session = support::ready_session(mock).await;
    assert_ok!(session.execute("name", &[], MethodKind::Read).await);
    let before = session.debug_logs().len();

    session.clear_network_logs();

    assert!(session.network_logs().is_empty());
    let debug_logs = session.debug_logs();
    assert_eq!(debug_logs.len(), before + 1);
    assert_eq!(
        debug_logs.last().map(|log| log.message.as_str()),
        Some("Network logs cleared")
    );
}
