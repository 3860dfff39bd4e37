//! Client module for talking to Soroban RPC.
//!
//! This module provides the network-facing services:
//!
//! - [`LedgerGateway`] - The seam to the network; swap it out in tests
//! - [`SorobanRpcClient`] - JSON-RPC implementation of the gateway
//! - [`ContractQueryService`] - Contract metadata and storage queries
//! - [`CallSimulator`] - Dry-run contract invocations
//!
//! # Query Builders
//!
//! - [`DetailsQuery`] - Contract executable, code size and ledger bounds
//! - [`StorageQuery`] - Decoded instance storage

mod gateway;
mod query;
mod rpc;
mod simulate;

pub use gateway::{GatewayFuture, LedgerGateway};
pub(crate) use gateway::with_deadline;
pub use query::{ContractQueryService, DetailsQuery, StorageQuery};
pub use rpc::SorobanRpcClient;
pub use simulate::{
    CallSimulator, DEFAULT_FEE, DEFAULT_VALIDITY_WINDOW, InvocationEnvelope, PreparedCall,
    SimulationEvent, SimulationOutcome,
};
