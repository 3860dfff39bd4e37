//! Dry-run invocations through `CallSimulator`.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use soroban_probe::*;
use tokio_test::{assert_err, assert_ok};

use crate::support::{self, MockGateway};

fn simulator(mock: &Arc<MockGateway>) -> CallSimulator {
    support::init_tracing();
    CallSimulator::new(mock.clone())
}

// =============================================================================
// Successful calls
// =============================================================================

#[tokio::test]
async fn test_balance_of_returns_decoded_result() {
    let mock = Arc::new(MockGateway::new());

    let outcome = assert_ok!(
        simulator(&mock)
            .simulate("0xAA", "balance_of", &["0x4a".into()], &support::account(), Some(&TESTNET))
            .await
    );

    match &outcome {
        SimulationOutcome::Success { result, cost, .. } => {
            assert_eq!(result, &json!(500));
            assert_eq!(cost.as_ref().map(|c| c.cpu_instructions), Some(1_000_000));
        }
        other => panic!("Expected Success, got: {other:?}"),
    }
    assert_eq!(mock.simulate_calls(), 1);
}

#[tokio::test]
async fn test_envelope_carries_call_details() {
    let mock = Arc::new(MockGateway::new());

    assert_ok!(
        simulator(&mock)
            .fee(250)
            .simulate(
                "0xAA",
                "transfer",
                &["0x4a".into(), "0x4b".into(), "100".into()],
                &support::account(),
                Some(&TESTNET),
            )
            .await
    );

    let envelope = mock.last_envelope().expect("simulate was called");
    assert_eq!(envelope.method, "transfer");
    assert_eq!(envelope.contract.as_bytes(), &[0xaa]);
    assert_eq!(
        envelope.args,
        vec![
            WireValue::contract(vec![0x4a]),
            WireValue::contract(vec![0x4b]),
            WireValue::from(100i128),
        ]
    );
    // Next sequence after the account's current one
    assert_eq!(envelope.sequence, 101);
    assert_eq!(envelope.fee, 250);
    assert_eq!(envelope.network_passphrase, TESTNET.passphrase());
}

#[tokio::test]
async fn test_structured_result_is_decoded() {
    let mock = Arc::new(MockGateway::new().with_simulation(support::success_response(
        WireValue::Map(vec![
            (WireValue::Symbol("name".into()), WireValue::String("Token".into())),
            (WireValue::Symbol("decimals".into()), WireValue::U32(7)),
        ]),
    )));

    let outcome = assert_ok!(
        simulator(&mock)
            .simulate("0xAA", "metadata", &[], &support::account(), Some(&TESTNET))
            .await
    );
    assert_eq!(
        outcome.result(),
        Some(&json!({ "name": "Token", "decimals": 7 }))
    );
}

#[tokio::test]
async fn test_large_result_is_exact_decimal_string() {
    let big = i128::MAX;
    let mock = Arc::new(
        MockGateway::new().with_simulation(support::success_response(WireValue::from(big))),
    );

    let outcome = assert_ok!(
        simulator(&mock)
            .simulate("0xAA", "total_supply", &[], &support::account(), Some(&TESTNET))
            .await
    );
    assert_eq!(outcome.result(), Some(&json!(big.to_string())));
}

// =============================================================================
// Authorization
// =============================================================================

#[tokio::test]
async fn test_auth_required_withholds_result() {
    let mock = Arc::new(MockGateway::new().with_simulation(support::auth_response()));

    let outcome = assert_ok!(
        simulator(&mock)
            .simulate(
                "0xAA",
                "transfer",
                &["0x4a".into(), "0x4b".into(), "100".into()],
                &support::account(),
                Some(&TESTNET),
            )
            .await
    );

    assert!(
        matches!(outcome, SimulationOutcome::RequiresAuth { .. }),
        "Expected RequiresAuth, got: {outcome:?}"
    );
    assert_eq!(outcome.result(), None);
    assert!(!outcome.is_failure());
}

// =============================================================================
// Rejected before submission
// =============================================================================

#[tokio::test]
async fn test_missing_account_makes_no_calls() {
    let mock = Arc::new(MockGateway::new());

    let err = assert_err!(
        simulator(&mock)
            .simulate("0xAA", "balance_of", &["0x4a".into()], "", Some(&TESTNET))
            .await
    );

    assert!(matches!(
        err,
        Error::Invocation(InvocationError::MissingAccount)
    ));
    assert_eq!(mock.total_calls(), 0);
}

#[tokio::test]
async fn test_prerequisites_checked_in_order() {
    let mock = Arc::new(MockGateway::new());
    let simulator = simulator(&mock);

    let err = assert_err!(simulator.simulate("", "name", &[], "", None).await);
    assert!(matches!(
        err,
        Error::Invocation(InvocationError::MissingNetwork)
    ));

    let err = assert_err!(simulator.simulate("", "name", &[], "", Some(&TESTNET)).await);
    assert!(matches!(
        err,
        Error::Invocation(InvocationError::MissingContract)
    ));

    assert_eq!(mock.total_calls(), 0);
}

#[tokio::test]
async fn test_malformed_literal_reports_argument_index() {
    let mock = Arc::new(MockGateway::new());

    let err = assert_err!(
        simulator(&mock)
            .simulate("0xAA", "set", &["{bad}".into()], &support::account(), Some(&TESTNET))
            .await
    );

    match err {
        Error::Encoding { index, source } => {
            assert_eq!(index, 0);
            assert!(
                matches!(source, EncodingError::MalformedStructuredLiteral { .. }),
                "Expected MalformedStructuredLiteral, got: {source:?}"
            );
        }
        other => panic!("Expected Encoding error, got: {other:?}"),
    }
    assert_eq!(mock.total_calls(), 0);
}

#[tokio::test]
async fn test_unclosed_literal_is_not_sent_as_text() {
    let mock = Arc::new(MockGateway::new());

    for literal in ["{bad json", "[1, 2"] {
        let err = assert_err!(
            simulator(&mock)
                .simulate(
                    "0xAA",
                    "set",
                    &["0x4a".into(), literal.into()],
                    &support::account(),
                    Some(&TESTNET),
                )
                .await
        );
        assert!(
            matches!(
                err,
                Error::Encoding {
                    index: 1,
                    source: EncodingError::MalformedStructuredLiteral { .. }
                }
            ),
            "Expected MalformedStructuredLiteral for {literal:?}, got: {err:?}"
        );
    }
    assert_eq!(mock.total_calls(), 0);
    assert!(mock.last_envelope().is_none());
}

#[tokio::test]
async fn test_fractional_amount_is_rejected() {
    let mock = Arc::new(MockGateway::new());

    let err = assert_err!(
        simulator(&mock)
            .simulate(
                "0xAA",
                "transfer",
                &["0x4a".into(), "1.5".into()],
                &support::account(),
                Some(&TESTNET),
            )
            .await
    );

    assert!(matches!(
        err,
        Error::Encoding {
            index: 1,
            source: EncodingError::FractionalAmount(_)
        }
    ));
    assert_eq!(mock.total_calls(), 0);
}

#[tokio::test]
async fn test_bad_contract_id_is_rejected() {
    let mock = Arc::new(MockGateway::new());

    let err = assert_err!(
        simulator(&mock)
            .simulate("token", "name", &[], &support::account(), Some(&TESTNET))
            .await
    );
    assert!(matches!(
        err.encoding(),
        Some(EncodingError::InvalidContractId(_))
    ));
    assert_eq!(mock.total_calls(), 0);
}

// =============================================================================
// Failures after submission
// =============================================================================

#[tokio::test]
async fn test_transport_failure_becomes_failure_outcome() {
    let mock = Arc::new(MockGateway::new().failing_simulation("connection reset"));

    let outcome = assert_ok!(
        simulator(&mock)
            .simulate("0xAA", "name", &[], &support::account(), Some(&TESTNET))
            .await
    );

    match outcome {
        SimulationOutcome::Failure { reason } => {
            assert!(reason.contains("connection reset"), "reason: {reason}");
        }
        other => panic!("Expected Failure, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_account_failure_skips_simulation() {
    let mock = Arc::new(MockGateway::new().failing_account("account not found"));

    let outcome = assert_ok!(
        simulator(&mock)
            .simulate("0xAA", "name", &[], &support::account(), Some(&TESTNET))
            .await
    );

    assert!(outcome.is_failure());
    assert_eq!(mock.simulate_calls(), 0);
}

#[tokio::test]
async fn test_node_error_without_results() {
    let response = SimulateTransactionResponse {
        latest_ledger: 1234,
        error: Some("HostError: Error(WasmVm, MissingValue)".to_string()),
        ..Default::default()
    };
    let mock = Arc::new(MockGateway::new().with_simulation(response));

    let outcome = assert_ok!(
        simulator(&mock)
            .simulate("0xAA", "missing", &[], &support::account(), Some(&TESTNET))
            .await
    );

    assert_eq!(
        outcome,
        SimulationOutcome::Failure {
            reason: "no results returned: HostError: Error(WasmVm, MissingValue)".to_string()
        }
    );
}

#[tokio::test]
async fn test_hung_simulation_times_out() {
    let mock = Arc::new(MockGateway::new().hanging());

    let outcome = assert_ok!(
        simulator(&mock)
            .call_timeout(Duration::from_millis(50))
            .simulate("0xAA", "name", &[], &support::account(), Some(&TESTNET))
            .await
    );

    match outcome {
        SimulationOutcome::Failure { reason } => {
            assert!(reason.contains("timed out"), "reason: {reason}");
        }
        other => panic!("Expected Failure, got: {other:?}"),
    }
}
