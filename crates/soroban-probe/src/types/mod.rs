//! Core types for inspecting Soroban contracts.
//!
//! Plain data shared by the codec, the gateway and the session: wire values,
//! network descriptors, RPC payloads and log entries.

mod log;
mod method;
mod network;
mod rpc;
mod value;

pub use log::{DebugLog, DebugLogKind, Direction, NetworkLog, ResponseStatus};
pub use method::{ContractMethod, MethodKind, default_read_methods, default_write_methods};
pub use network::{
    FUTURENET, FUTURENET_PASSPHRASE, LOCALNET, LOCALNET_PASSPHRASE, NetworkConfig, NetworkKind,
    TESTNET, TESTNET_PASSPHRASE,
};
pub use rpc::{
    AccountSnapshot, ContractCodeInfo, ContractDetails, ContractExecutable, LedgerEntriesResponse,
    LedgerEntryResult, ResourceCost, STROOPS_PER_XLM, SimulateHostFunctionResult,
    SimulateTransactionResponse, StorageEntry, format_stroops,
};
pub use value::{AddressKind, ContractId, I128Parts, ParamInput, U128Parts, WireValue};
