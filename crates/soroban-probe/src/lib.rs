//! Inspect deployed Soroban contracts and dry-run calls against them.
//!
//! **soroban-probe** reads contract metadata and storage through Soroban RPC,
//! encodes loosely-typed arguments into network values, and simulates
//! invocations without submitting anything.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use soroban_probe::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), soroban_probe::Error> {
//!     let session = DebugSession::new(SessionConfig::default());
//!     session.select_network(TESTNET.clone());
//!     session.set_contract("CDLZFC3SYJYDZT7K67VZ75HPJVIEUVNIXF47ZG2FB2RMQQVU2HHGCYSC").await?;
//!
//!     let account = "GBZXN7PIRZGNMHGA7MUUUF4GWPY5AYPV6LY4UV2GL6VJGIQRXFDNMADI";
//!     session.set_account(account).await?;
//!
//!     let outcome = session
//!         .execute("balance", &[account.into()], MethodKind::Read)
//!         .await?;
//!     println!("{:?}", outcome.result());
//!
//!     Ok(())
//! }
//! ```
//!
//! # Layers
//!
//! - [`codec`] - Caller input to wire values, wire values to display JSON
//! - [`LedgerGateway`] - The network seam, implemented by [`SorobanRpcClient`]
//! - [`ContractQueryService`] - Contract details and instance storage
//! - [`CallSimulator`] - Dry-run invocations
//! - [`DebugSession`] - Ties it together and keeps debug/network logs
//!
//! # Argument Encoding
//!
//! Text arguments are classified, so the same string can mean different
//! things:
//!
//! ```
//! use soroban_probe::{ParamInput, WireValue, codec};
//!
//! assert_eq!(codec::encode(&"true".into()).unwrap(), WireValue::Bool(true));
//! assert_eq!(codec::encode(&"500".into()).unwrap(), WireValue::from(500i128));
//! assert_eq!(
//!     codec::encode(&"alice".into()).unwrap(),
//!     WireValue::String("alice".to_string())
//! );
//! assert!(codec::encode(&ParamInput::from("1.5")).is_err());
//! ```

pub mod client;
pub mod codec;
pub mod error;
pub mod session;
pub mod types;

// Re-exports for convenience
pub use client::{
    CallSimulator, ContractQueryService, DetailsQuery, GatewayFuture, InvocationEnvelope,
    LedgerGateway, PreparedCall, SimulationEvent, SimulationOutcome, SorobanRpcClient,
    StorageQuery,
};
pub use error::{EncodingError, Error, InvocationError, RpcError};
pub use session::{DebugSession, GatewayConnector, SessionConfig, SessionPhase};
pub use types::*;
