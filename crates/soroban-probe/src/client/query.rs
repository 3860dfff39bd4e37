//! Query builders for contract metadata and storage.
//!
//! Builders implement [`IntoFuture`], so they can be awaited directly or
//! configured first:
//!
//! ```rust,no_run
//! # use std::sync::Arc;
//! # use std::time::Duration;
//! # use soroban_probe::*;
//! # async fn example() -> Result<(), soroban_probe::Error> {
//! let queries = ContractQueryService::new(Arc::new(SorobanRpcClient::for_network(&TESTNET)));
//! let id = "CDLZFC3SYJYDZT7K67VZ75HPJVIEUVNIXF47ZG2FB2RMQQVU2HHGCYSC";
//!
//! let details = queries.details(id).await?;
//! let storage = queries.storage(id).timeout(Duration::from_secs(5)).await?;
//! println!("{} entries in {:?}", storage.len(), details.wasm_hash());
//! # Ok(())
//! # }
//! ```

use std::future::{Future, IntoFuture};
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use stellar_xdr::curr::{ContractDataEntry, LedgerEntryData, ScVal};

use crate::client::gateway::{LedgerGateway, with_deadline};
use crate::codec::{self, xdr};
use crate::error::{Error, RpcError};
use crate::types::{ContractDetails, ContractId, StorageEntry};

// ============================================================================
// ContractQueryService
// ============================================================================

/// Read-only queries about a deployed contract.
#[derive(Clone)]
pub struct ContractQueryService {
    gateway: Arc<dyn LedgerGateway>,
    call_timeout: Option<Duration>,
}

impl ContractQueryService {
    pub fn new(gateway: Arc<dyn LedgerGateway>) -> Self {
        Self {
            gateway,
            call_timeout: None,
        }
    }

    /// Default deadline for every query built from this service.
    pub fn call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = Some(timeout);
        self
    }

    /// Query contract metadata.
    pub fn details(&self, contract_id: impl Into<String>) -> DetailsQuery {
        DetailsQuery {
            gateway: self.gateway.clone(),
            contract_id: contract_id.into(),
            timeout: self.call_timeout,
        }
    }

    /// Query instance storage.
    pub fn storage(&self, contract_id: impl Into<String>) -> StorageQuery {
        StorageQuery {
            gateway: self.gateway.clone(),
            contract_id: contract_id.into(),
            timeout: self.call_timeout,
        }
    }

    /// Contract metadata, or `None` if it could not be fetched.
    pub async fn fetch_details(&self, contract_id: &str) -> Option<ContractDetails> {
        match self.details(contract_id).await {
            Ok(details) => Some(details),
            Err(e) => {
                tracing::warn!(
                    contract = contract_id,
                    error = %e,
                    "failed to fetch contract details"
                );
                None
            }
        }
    }

    /// Decoded instance storage. An empty list means the contract stores nothing.
    pub async fn fetch_storage(&self, contract_id: &str) -> Result<Vec<StorageEntry>, Error> {
        self.storage(contract_id).await
    }
}

impl std::fmt::Debug for ContractQueryService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContractQueryService")
            .field("endpoint", &self.gateway.endpoint())
            .field("call_timeout", &self.call_timeout)
            .finish()
    }
}

// ============================================================================
// DetailsQuery
// ============================================================================

/// Query builder for contract metadata.
pub struct DetailsQuery {
    gateway: Arc<dyn LedgerGateway>,
    contract_id: String,
    timeout: Option<Duration>,
}

impl DetailsQuery {
    /// Give up after `timeout`.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

impl IntoFuture for DetailsQuery {
    type Output = Result<ContractDetails, Error>;
    type IntoFuture = Pin<Box<dyn Future<Output = Self::Output> + Send>>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(async move {
            let contract: ContractId = self.contract_id.parse()?;
            let code =
                with_deadline(self.timeout, self.gateway.contract_code(&contract)).await?;
            Ok(ContractDetails {
                id: contract.to_string(),
                strkey: contract.to_strkey(),
                code,
            })
        })
    }
}

// ============================================================================
// StorageQuery
// ============================================================================

/// Query builder for instance storage.
pub struct StorageQuery {
    gateway: Arc<dyn LedgerGateway>,
    contract_id: String,
    timeout: Option<Duration>,
}

impl StorageQuery {
    /// Give up after `timeout`.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

impl IntoFuture for StorageQuery {
    type Output = Result<Vec<StorageEntry>, Error>;
    type IntoFuture = Pin<Box<dyn Future<Output = Self::Output> + Send>>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(async move {
            let contract: ContractId = self.contract_id.parse()?;
            let key = xdr::contract_instance_key(&contract)?;
            let response = with_deadline(
                self.timeout,
                self.gateway.ledger_entries(std::slice::from_ref(&key)),
            )
            .await?;

            let mut entries = Vec::new();
            for raw in &response.entries {
                let data = xdr::from_base64::<LedgerEntryData>(&raw.xdr)
                    .map_err(|e| RpcError::Xdr(e.to_string()))?;
                match data {
                    LedgerEntryData::ContractData(entry) => {
                        entries.extend(storage_entries(&entry))
                    }
                    other => {
                        tracing::debug!(kind = other.name(), "skipping non contract-data entry")
                    }
                }
            }
            Ok(entries)
        })
    }
}

/// One entry per stored pair. The instance entry is expanded into its map.
fn storage_entries(entry: &ContractDataEntry) -> Vec<StorageEntry> {
    match &entry.val {
        ScVal::ContractInstance(instance) => instance
            .storage
            .iter()
            .flat_map(|map| map.0.iter())
            .map(|pair| storage_entry(&pair.key, &pair.val))
            .collect(),
        val => vec![storage_entry(&entry.key, val)],
    }
}

fn storage_entry(key: &ScVal, value: &ScVal) -> StorageEntry {
    StorageEntry {
        key: codec::render(&codec::decode(&xdr::from_sc_val(key))),
        value: codec::render(&codec::decode(&xdr::from_sc_val(value))),
    }
}
