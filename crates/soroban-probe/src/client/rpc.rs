//! Low-level JSON-RPC client for Soroban RPC.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use stellar_xdr::curr::{ContractExecutable, LedgerEntryData, LedgerKey, ScVal};

use crate::client::gateway::{GatewayFuture, LedgerGateway};
use crate::client::simulate::InvocationEnvelope;
use crate::codec::xdr;
use crate::error::{EncodingError, RpcError};
use crate::types::{
    AccountSnapshot, ContractCodeInfo, ContractExecutable as Executable, ContractId,
    LedgerEntriesResponse, LedgerEntryResult, NetworkConfig, SimulateTransactionResponse,
};

/// JSON-RPC request structure.
#[derive(Serialize)]
struct JsonRpcRequest<'a, P: Serialize> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: P,
}

/// JSON-RPC response structure.
#[derive(Deserialize)]
struct JsonRpcResponse<T> {
    #[allow(dead_code)]
    jsonrpc: String,
    #[allow(dead_code)]
    id: u64,
    result: Option<T>,
    error: Option<JsonRpcError>,
}

/// JSON-RPC error structure.
#[derive(Debug, Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
    #[serde(default)]
    data: Option<serde_json::Value>,
}

#[derive(Serialize)]
struct LedgerEntriesParams {
    keys: Vec<String>,
}

#[derive(Serialize)]
struct SimulateParams<'a> {
    transaction: &'a str,
}

/// Low-level JSON-RPC client for Soroban RPC.
///
/// Each call is a single attempt. Deadlines are applied by callers.
pub struct SorobanRpcClient {
    url: String,
    client: reqwest::Client,
    request_id: AtomicU64,
}

impl SorobanRpcClient {
    /// Create a new RPC client with the given URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_http_client(url, reqwest::Client::new())
    }

    /// Create a client for a network's RPC endpoint.
    pub fn for_network(network: &NetworkConfig) -> Self {
        Self::new(network.rpc_url())
    }

    /// Create a client that reuses an existing HTTP client.
    pub fn with_http_client(url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            url: url.into(),
            client,
            request_id: AtomicU64::new(0),
        }
    }

    /// Get the RPC URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Make a raw RPC call.
    pub async fn call<P: Serialize, R: DeserializeOwned>(
        &self,
        method: &str,
        params: P,
    ) -> Result<R, RpcError> {
        let request_id = self.request_id.fetch_add(1, Ordering::Relaxed);
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            id: request_id,
            method,
            params: &params,
        };

        tracing::debug!(method, id = request_id, url = %self.url, "sending JSON-RPC request");
        self.try_call(&request).await
    }

    async fn try_call<R: DeserializeOwned>(
        &self,
        request: &JsonRpcRequest<'_, impl Serialize>,
    ) -> Result<R, RpcError> {
        let response = self
            .client
            .post(&self.url)
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(RpcError::network(
                format!("HTTP {}: {}", status, body),
                Some(status.as_u16()),
            ));
        }

        let rpc_response: JsonRpcResponse<R> =
            serde_json::from_str(&body).map_err(RpcError::Json)?;

        if let Some(error) = rpc_response.error {
            return Err(RpcError::Rpc {
                code: error.code,
                message: error.message,
                data: error.data,
            });
        }

        rpc_response
            .result
            .ok_or_else(|| RpcError::InvalidResponse("Missing result in response".to_string()))
    }

    // ========================================================================
    // Ledger methods
    // ========================================================================

    /// `getLedgerEntries` for the given keys.
    pub async fn get_ledger_entries(
        &self,
        keys: &[LedgerKey],
    ) -> Result<LedgerEntriesResponse, RpcError> {
        let keys = keys
            .iter()
            .map(xdr::to_base64)
            .collect::<Result<Vec<_>, _>>()
            .map_err(xdr_error)?;
        self.call("getLedgerEntries", LedgerEntriesParams { keys })
            .await
    }

    /// Fetch a single entry, or `NotFound` naming `what`.
    async fn get_single_entry(
        &self,
        key: LedgerKey,
        what: impl FnOnce() -> String,
    ) -> Result<(LedgerEntryData, LedgerEntryResult), RpcError> {
        let response = self.get_ledger_entries(std::slice::from_ref(&key)).await?;
        let entry = response
            .entries
            .into_iter()
            .next()
            .ok_or_else(|| RpcError::NotFound(what()))?;
        let data = xdr::from_base64::<LedgerEntryData>(&entry.xdr).map_err(xdr_error)?;
        Ok((data, entry))
    }

    /// Sequence number and balance of an account.
    pub async fn get_account(&self, public_key: &str) -> Result<AccountSnapshot, RpcError> {
        let key = xdr::account_key(public_key)
            .map_err(|_| RpcError::InvalidAccount(public_key.to_string()))?;
        let (data, _) = self
            .get_single_entry(key, || format!("account {public_key}"))
            .await?;

        match data {
            LedgerEntryData::Account(account) => Ok(AccountSnapshot {
                account_id: public_key.to_string(),
                sequence: account.seq_num.0,
                balance: account.balance,
            }),
            other => Err(RpcError::InvalidResponse(format!(
                "expected an account entry, got {}",
                other.name()
            ))),
        }
    }

    /// Instance executable, wasm size and ledger bounds of a contract.
    pub async fn get_contract_code(
        &self,
        contract: &ContractId,
    ) -> Result<ContractCodeInfo, RpcError> {
        let key = xdr::contract_instance_key(contract).map_err(xdr_error)?;
        let (data, entry) = self
            .get_single_entry(key, || format!("contract instance {contract}"))
            .await?;

        let executable = match data {
            LedgerEntryData::ContractData(data) => match data.val {
                ScVal::ContractInstance(instance) => instance.executable,
                other => {
                    return Err(RpcError::InvalidResponse(format!(
                        "expected a contract instance, got {}",
                        other.name()
                    )));
                }
            },
            other => {
                return Err(RpcError::InvalidResponse(format!(
                    "expected contract data, got {}",
                    other.name()
                )));
            }
        };

        let (executable, code_size) = match executable {
            ContractExecutable::Wasm(hash) => {
                let code_size = self.get_code_size(hash.0).await?;
                (
                    Executable::Wasm {
                        hash: hex::encode(hash.0),
                    },
                    code_size,
                )
            }
            ContractExecutable::StellarAsset => (Executable::StellarAsset, None),
        };

        Ok(ContractCodeInfo {
            executable,
            code_size,
            last_modified_ledger: entry.last_modified_ledger_seq,
            live_until_ledger: entry.live_until_ledger_seq,
        })
    }

    /// Size of an uploaded wasm; `None` if the code entry has been archived.
    async fn get_code_size(&self, hash: [u8; 32]) -> Result<Option<usize>, RpcError> {
        match self
            .get_single_entry(xdr::contract_code_key(hash), || {
                format!("contract code {}", hex::encode(hash))
            })
            .await
        {
            Ok((LedgerEntryData::ContractCode(code), _)) => Ok(Some(code.code.as_slice().len())),
            Ok(_) => Ok(None),
            Err(RpcError::NotFound(what)) => {
                tracing::debug!(%what, "wasm entry not live");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    // ========================================================================
    // Simulation
    // ========================================================================

    /// `simulateTransaction` for a base64 transaction envelope.
    pub async fn simulate_transaction(
        &self,
        envelope_xdr: &str,
    ) -> Result<SimulateTransactionResponse, RpcError> {
        self.call(
            "simulateTransaction",
            SimulateParams {
                transaction: envelope_xdr,
            },
        )
        .await
    }
}

impl LedgerGateway for SorobanRpcClient {
    fn endpoint(&self) -> &str {
        &self.url
    }

    fn ledger_entries<'a>(
        &'a self,
        keys: &'a [LedgerKey],
    ) -> GatewayFuture<'a, LedgerEntriesResponse> {
        Box::pin(self.get_ledger_entries(keys))
    }

    fn account<'a>(&'a self, public_key: &'a str) -> GatewayFuture<'a, AccountSnapshot> {
        Box::pin(self.get_account(public_key))
    }

    fn contract_code<'a>(
        &'a self,
        contract: &'a ContractId,
    ) -> GatewayFuture<'a, ContractCodeInfo> {
        Box::pin(self.get_contract_code(contract))
    }

    fn simulate<'a>(
        &'a self,
        envelope: &'a InvocationEnvelope,
    ) -> GatewayFuture<'a, SimulateTransactionResponse> {
        Box::pin(async move {
            let transaction = envelope.to_xdr_base64().map_err(xdr_error)?;
            self.simulate_transaction(&transaction).await
        })
    }
}

impl Clone for SorobanRpcClient {
    fn clone(&self) -> Self {
        Self {
            url: self.url.clone(),
            client: self.client.clone(),
            request_id: AtomicU64::new(0),
        }
    }
}

impl std::fmt::Debug for SorobanRpcClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SorobanRpcClient")
            .field("url", &self.url)
            .finish()
    }
}

// ============================================================================
// Helper functions
// ============================================================================

fn xdr_error(e: EncodingError) -> RpcError {
    match e {
        EncodingError::Xdr(message) => RpcError::Xdr(message),
        other => RpcError::Xdr(other.to_string()),
    }
}
