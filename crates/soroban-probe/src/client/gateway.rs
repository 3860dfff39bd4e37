//! The seam between contract inspection and the network.
//!
//! Everything above this trait works with domain values; everything below it
//! speaks JSON-RPC. Tests substitute their own implementation.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use stellar_xdr::curr::LedgerKey;

use crate::client::simulate::InvocationEnvelope;
use crate::error::RpcError;
use crate::types::{
    AccountSnapshot, ContractCodeInfo, ContractId, LedgerEntriesResponse,
    SimulateTransactionResponse,
};

/// Future returned by [`LedgerGateway`] methods.
pub type GatewayFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, RpcError>> + Send + 'a>>;

/// Read access to ledger state and transaction simulation.
///
/// Implementations report transport problems as [`RpcError`]. A simulation
/// the node answered, including one carrying an `error` field, is a
/// successful response.
pub trait LedgerGateway: Send + Sync {
    /// Endpoint this gateway talks to, for logs.
    fn endpoint(&self) -> &str;

    /// Fetch raw ledger entries by key.
    fn ledger_entries<'a>(
        &'a self,
        keys: &'a [LedgerKey],
    ) -> GatewayFuture<'a, LedgerEntriesResponse>;

    /// Fetch the sequence number and balance of an account (`G...`).
    fn account<'a>(&'a self, public_key: &'a str) -> GatewayFuture<'a, AccountSnapshot>;

    /// Fetch the instance and code facts of a deployed contract.
    fn contract_code<'a>(
        &'a self,
        contract: &'a ContractId,
    ) -> GatewayFuture<'a, ContractCodeInfo>;

    /// Simulate an invocation without submitting it.
    fn simulate<'a>(
        &'a self,
        envelope: &'a InvocationEnvelope,
    ) -> GatewayFuture<'a, SimulateTransactionResponse>;
}

/// Implement `LedgerGateway` for `Arc<dyn LedgerGateway>` for convenience.
impl LedgerGateway for Arc<dyn LedgerGateway> {
    fn endpoint(&self) -> &str {
        (**self).endpoint()
    }

    fn ledger_entries<'a>(
        &'a self,
        keys: &'a [LedgerKey],
    ) -> GatewayFuture<'a, LedgerEntriesResponse> {
        (**self).ledger_entries(keys)
    }

    fn account<'a>(&'a self, public_key: &'a str) -> GatewayFuture<'a, AccountSnapshot> {
        (**self).account(public_key)
    }

    fn contract_code<'a>(
        &'a self,
        contract: &'a ContractId,
    ) -> GatewayFuture<'a, ContractCodeInfo> {
        (**self).contract_code(contract)
    }

    fn simulate<'a>(
        &'a self,
        envelope: &'a InvocationEnvelope,
    ) -> GatewayFuture<'a, SimulateTransactionResponse> {
        (**self).simulate(envelope)
    }
}

/// Await a gateway call, giving up after `deadline` if one is set.
pub(crate) async fn with_deadline<T>(
    deadline: Option<Duration>,
    call: GatewayFuture<'_, T>,
) -> Result<T, RpcError> {
    match deadline {
        Some(limit) => tokio::time::timeout(limit, call)
            .await
            .map_err(|_| RpcError::Timeout(limit))?,
        None => call.await,
    }
}
