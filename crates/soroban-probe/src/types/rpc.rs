//! Soroban RPC response types and the ledger snapshots built from them.

use serde::{Deserialize, Deserializer, Serialize};
use serde_with::{DisplayFromStr, serde_as};

/// Stroops per lumen.
pub const STROOPS_PER_XLM: i64 = 10_000_000;

// ============================================================================
// getLedgerEntries
// ============================================================================

/// One raw entry from `getLedgerEntries`. `key` and `xdr` are base64 XDR.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntryResult {
    pub key: String,
    pub xdr: String,
    pub last_modified_ledger_seq: u32,
    #[serde(default)]
    pub live_until_ledger_seq: Option<u32>,
}

/// Response from `getLedgerEntries`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntriesResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub entries: Vec<LedgerEntryResult>,
    #[serde(default)]
    pub latest_ledger: u32,
}

// ============================================================================
// simulateTransaction
// ============================================================================

/// Resources a simulated call consumed.
#[serde_as]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceCost {
    #[serde(rename = "cpuInsns")]
    #[serde_as(as = "DisplayFromStr")]
    pub cpu_instructions: u64,
    #[serde(rename = "memBytes")]
    #[serde_as(as = "DisplayFromStr")]
    pub memory_bytes: u64,
}

/// Result of one simulated host function.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct SimulateHostFunctionResult {
    /// Base64 authorization entries the call would need signed.
    #[serde(default, deserialize_with = "null_as_default")]
    pub auth: Vec<String>,
    /// Base64 return value.
    #[serde(default)]
    pub xdr: Option<String>,
}

/// Response from `simulateTransaction`.
#[serde_as]
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulateTransactionResponse {
    #[serde(default)]
    pub latest_ledger: u32,
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub min_resource_fee: Option<u64>,
    #[serde(default)]
    pub cost: Option<ResourceCost>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub results: Vec<SimulateHostFunctionResult>,
    /// Base64 diagnostic events.
    #[serde(default, deserialize_with = "null_as_default")]
    pub events: Vec<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub transaction_data: Option<String>,
}

// ============================================================================
// Ledger snapshots
// ============================================================================

/// The parts of an account entry a debugging session cares about.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AccountSnapshot {
    pub account_id: String,
    pub sequence: i64,
    /// Native balance in stroops.
    pub balance: i64,
}

impl AccountSnapshot {
    /// Native balance in lumens with seven decimals, e.g. `"12.5000000"`.
    pub fn balance_xlm(&self) -> String {
        format_stroops(self.balance)
    }
}

/// Formats a stroop amount as lumens with seven decimals.
pub fn format_stroops(stroops: i64) -> String {
    let sign = if stroops < 0 { "-" } else { "" };
    let abs = stroops.unsigned_abs();
    let per = STROOPS_PER_XLM as u64;
    format!("{sign}{}.{:07}", abs / per, abs % per)
}

/// What a contract instance executes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContractExecutable {
    /// Uploaded wasm, identified by its hex hash.
    Wasm { hash: String },
    /// The built-in Stellar asset contract.
    StellarAsset,
}

/// Instance and code facts for a deployed contract.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ContractCodeInfo {
    pub executable: ContractExecutable,
    /// Size of the wasm in bytes; `None` for built-in executables.
    pub code_size: Option<usize>,
    pub last_modified_ledger: u32,
    pub live_until_ledger: Option<u32>,
}

/// Contract metadata shown once a contract is selected.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ContractDetails {
    /// The id the details were requested for, as `0x` hex.
    pub id: String,
    /// The `C...` strkey form of the id.
    pub strkey: Option<String>,
    #[serde(flatten)]
    pub code: ContractCodeInfo,
}

impl ContractDetails {
    /// Hex hash of the wasm, if the contract runs uploaded code.
    pub fn wasm_hash(&self) -> Option<&str> {
        match &self.code.executable {
            ContractExecutable::Wasm { hash } => Some(hash),
            ContractExecutable::StellarAsset => None,
        }
    }
}

/// One decoded key/value pair from contract storage.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StorageEntry {
    pub key: String,
    pub value: String,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
