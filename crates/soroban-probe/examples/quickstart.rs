//! Quickstart - Inspect a contract and dry-run calls against it
//!
//! Covers: network selection, contract details, storage, simulation, logs
//!
//! Run: cargo run --example quickstart
//!
//! Optional environment variables:
//!   SOROBAN_NETWORK=testnet
//!   SOROBAN_CONTRACT_ID=C...
//!   SOROBAN_ACCOUNT=G...

use soroban_probe::*;

/// Native XLM asset contract on testnet.
const NATIVE_ASSET: &str = "CDLZFC3SYJYDZT7K67VZ75HPJVIEUVNIXF47ZG2FB2RMQQVU2HHGCYSC";

// ============================================================================
// 1. Encode arguments (offline)
// ============================================================================

fn encoding_example() -> Result<(), Error> {
    println!("=== Encoding Example ===\n");

    for input in ["500", "true", "0x4a", "alice", r#"{"to": "bob", "amount": 5}"#] {
        let value = codec::encode(&input.into())?;
        println!("  {input:<32} -> {}", value.tag());
    }

    // Fractional amounts are rejected rather than rounded
    if let Err(e) = codec::encode(&"1.5".into()) {
        println!("  1.5 rejected: {e}");
    }

    Ok(())
}

// ============================================================================
// 2. Inspect a contract
// ============================================================================

async fn inspect_example(session: &DebugSession, contract_id: &str) -> Result<(), Error> {
    println!("\n=== Inspect Example ===\n");

    session.set_contract(contract_id).await?;

    match session.contract_details() {
        Some(details) => {
            println!("Contract: {}", details.id);
            println!("Wasm hash: {:?}", details.wasm_hash());
            println!("Live until ledger: {:?}", details.code.live_until_ledger);
        }
        None => println!("Details unavailable"),
    }

    for entry in session.storage() {
        println!("  {} = {}", entry.key, entry.value);
    }

    Ok(())
}

// ============================================================================
// 3. Simulate calls
// ============================================================================

async fn simulate_example(session: &DebugSession, account: &str) -> Result<(), Error> {
    println!("\n=== Simulate Example ===\n");

    session.set_account(account).await?;
    println!("Balance: {} XLM", session.account_balance());

    let outcome = session.execute("decimals", &[], MethodKind::Read).await?;
    println!("decimals: {:?}", outcome.result());

    let outcome = session
        .execute("balance", &[account.into()], MethodKind::Read)
        .await?;
    match outcome {
        SimulationOutcome::Success { result, cost, .. } => {
            println!("balance: {result}");
            if let Some(cost) = cost {
                println!("cost: {} instructions", cost.cpu_instructions);
            }
        }
        SimulationOutcome::RequiresAuth { .. } => println!("balance requires authorization"),
        SimulationOutcome::Failure { reason } => println!("balance failed: {reason}"),
    }

    Ok(())
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    println!("soroban-probe Quickstart Examples\n");

    encoding_example()?;

    let session = DebugSession::new(SessionConfig::from_env()?);
    session.select_network(NetworkConfig::from_env()?);

    let contract_id =
        std::env::var("SOROBAN_CONTRACT_ID").unwrap_or_else(|_| NATIVE_ASSET.to_string());
    inspect_example(&session, &contract_id).await?;

    match std::env::var("SOROBAN_ACCOUNT") {
        Ok(account) => simulate_example(&session, &account).await?,
        Err(_) => {
            println!("\n=== Skipping simulation ===");
            println!("Set SOROBAN_ACCOUNT to a funded G... address to simulate calls.");
        }
    }

    println!("\n=== Logs ===\n");
    for log in session.debug_logs() {
        println!("{log}");
    }

    Ok(())
}
