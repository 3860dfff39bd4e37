//! Dry-run contract invocations.
//!
//! A call is assembled in two steps so that callers can log between them:
//! [`CallSimulator::prepare`] checks prerequisites and encodes arguments
//! without touching the network, and [`CallSimulator::submit`] fetches the
//! source account, builds the envelope and asks the node to simulate it.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use soroban_probe::*;
//!
//! # async fn example() -> Result<(), soroban_probe::Error> {
//! let gateway = Arc::new(SorobanRpcClient::for_network(&TESTNET));
//! let simulator = CallSimulator::new(gateway);
//!
//! let outcome = simulator
//!     .simulate(
//!         "CDLZFC3SYJYDZT7K67VZ75HPJVIEUVNIXF47ZG2FB2RMQQVU2HHGCYSC",
//!         "balance",
//!         &["GBZXN7PIRZGNMHGA7MUUUF4GWPY5AYPV6LY4UV2GL6VJGIQRXFDNMADI".into()],
//!         "GBZXN7PIRZGNMHGA7MUUUF4GWPY5AYPV6LY4UV2GL6VJGIQRXFDNMADI",
//!         Some(&TESTNET),
//!     )
//!     .await?;
//!
//! if let SimulationOutcome::Success { result, .. } = outcome {
//!     println!("balance: {result}");
//! }
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use stellar_xdr::curr::{
    ContractEventBody, DiagnosticEvent, Hash, HostFunction, InvokeContractArgs,
    InvokeHostFunctionOp, Memo, MuxedAccount, Operation, OperationBody, Preconditions, ScAddress,
    ScSymbol, SequenceNumber, TimeBounds, TimePoint, Transaction, TransactionEnvelope,
    TransactionExt, TransactionV1Envelope, Uint256, VecM,
};

use crate::client::gateway::{LedgerGateway, with_deadline};
use crate::codec::{self, xdr};
use crate::error::{EncodingError, Error, InvocationError, RpcError};
use crate::types::{
    ContractId, NetworkConfig, ParamInput, ResourceCost, SimulateTransactionResponse, WireValue,
};

/// Base fee in stroops attached to simulated transactions.
pub const DEFAULT_FEE: u32 = 100;
/// Seconds a simulated transaction stays valid.
pub const DEFAULT_VALIDITY_WINDOW: Duration = Duration::from_secs(30);

// ============================================================================
// InvocationEnvelope
// ============================================================================

/// An unsigned single-operation transaction invoking a contract method.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InvocationEnvelope {
    pub contract: ContractId,
    pub method: String,
    pub args: Vec<WireValue>,
    /// `G...` strkey of the source account.
    pub source_account: String,
    /// Sequence number the transaction would consume.
    pub sequence: i64,
    pub fee: u32,
    pub network_passphrase: String,
    /// Unix time after which the transaction is invalid.
    pub valid_until: u64,
}

impl InvocationEnvelope {
    /// Build the network transaction envelope, with no signatures.
    pub fn to_transaction_envelope(&self) -> Result<TransactionEnvelope, EncodingError> {
        let source = stellar_strkey::ed25519::PublicKey::from_string(&self.source_account)
            .map_err(|_| {
                EncodingError::Xdr(format!("invalid source account '{}'", self.source_account))
            })?;

        let args = self
            .args
            .iter()
            .map(xdr::to_sc_val)
            .collect::<Result<Vec<_>, _>>()?;

        let invoke = InvokeContractArgs {
            contract_address: ScAddress::Contract(Hash(self.contract.to_hash()?)),
            function_name: ScSymbol(self.method.as_str().try_into().map_err(xdr_error)?),
            args: args.try_into().map_err(xdr_error)?,
        };

        let operation = Operation {
            source_account: None,
            body: OperationBody::InvokeHostFunction(InvokeHostFunctionOp {
                host_function: HostFunction::InvokeContract(invoke),
                auth: VecM::default(),
            }),
        };

        let tx = Transaction {
            source_account: MuxedAccount::Ed25519(Uint256(source.0)),
            fee: self.fee,
            seq_num: SequenceNumber(self.sequence),
            cond: Preconditions::Time(TimeBounds {
                min_time: TimePoint(0),
                max_time: TimePoint(self.valid_until),
            }),
            memo: Memo::None,
            operations: vec![operation].try_into().map_err(xdr_error)?,
            ext: TransactionExt::V0,
        };

        Ok(TransactionEnvelope::Tx(TransactionV1Envelope {
            tx,
            signatures: VecM::default(),
        }))
    }

    /// The envelope as base64 XDR, as `simulateTransaction` expects it.
    pub fn to_xdr_base64(&self) -> Result<String, EncodingError> {
        xdr::to_base64(&self.to_transaction_envelope()?)
    }
}

fn xdr_error(e: stellar_xdr::curr::Error) -> EncodingError {
    EncodingError::Xdr(e.to_string())
}

// ============================================================================
// Outcomes
// ============================================================================

/// A diagnostic event emitted during simulation.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SimulationEvent {
    /// Emitting contract as `0x` hex, if any.
    pub contract_id: Option<String>,
    pub topics: Vec<Value>,
    pub data: Value,
    pub in_successful_call: bool,
    /// The event as received, base64 XDR.
    pub raw: String,
}

impl SimulationEvent {
    /// Decode a base64 diagnostic event. Undecodable events keep only `raw`.
    pub fn decode(raw: &str) -> Self {
        let mut event = Self {
            contract_id: None,
            topics: Vec::new(),
            data: Value::Null,
            in_successful_call: false,
            raw: raw.to_string(),
        };

        match xdr::from_base64::<DiagnosticEvent>(raw) {
            Ok(diagnostic) => {
                event.in_successful_call = diagnostic.in_successful_contract_call;
                event.contract_id = diagnostic
                    .event
                    .contract_id
                    .map(|hash| format!("0x{}", hex::encode(hash.0)));
                let ContractEventBody::V0(body) = diagnostic.event.body;
                event.topics = body
                    .topics
                    .iter()
                    .map(|topic| codec::decode(&xdr::from_sc_val(topic)))
                    .collect();
                event.data = codec::decode(&xdr::from_sc_val(&body.data));
            }
            Err(e) => tracing::debug!(error = %e, "keeping undecodable event as raw"),
        }

        event
    }
}

/// Result of simulating one invocation.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SimulationOutcome {
    /// The call ran and returned a value.
    Success {
        result: Value,
        events: Vec<SimulationEvent>,
        cost: Option<ResourceCost>,
    },
    /// The call would need signatures; its return value is withheld.
    RequiresAuth {
        events: Vec<SimulationEvent>,
        cost: Option<ResourceCost>,
    },
    /// The call could not be simulated.
    Failure { reason: String },
}

impl SimulationOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, SimulationOutcome::Success { .. })
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, SimulationOutcome::Failure { .. })
    }

    /// The decoded return value, for successful calls.
    pub fn result(&self) -> Option<&Value> {
        match self {
            SimulationOutcome::Success { result, .. } => Some(result),
            _ => None,
        }
    }

    /// Events emitted during the call.
    pub fn events(&self) -> &[SimulationEvent] {
        match self {
            SimulationOutcome::Success { events, .. }
            | SimulationOutcome::RequiresAuth { events, .. } => events,
            SimulationOutcome::Failure { .. } => &[],
        }
    }

    fn failure(reason: impl Into<String>) -> Self {
        SimulationOutcome::Failure {
            reason: reason.into(),
        }
    }

    /// Classify a simulation response: no results, then auth, then success.
    pub fn from_response(response: SimulateTransactionResponse) -> Self {
        let Some(first) = response.results.into_iter().next() else {
            return match response.error {
                Some(error) => Self::failure(format!("no results returned: {error}")),
                None => Self::failure("no results returned"),
            };
        };

        let events = response
            .events
            .iter()
            .map(|raw| SimulationEvent::decode(raw))
            .collect();

        if !first.auth.is_empty() {
            return SimulationOutcome::RequiresAuth {
                events,
                cost: response.cost,
            };
        }

        let Some(result_xdr) = first.xdr else {
            return Self::failure("no results returned");
        };

        match xdr::decode_value(&result_xdr) {
            Ok(value) => SimulationOutcome::Success {
                result: codec::decode(&value),
                events,
                cost: response.cost,
            },
            Err(e) => Self::failure(format!("undecodable result: {e}")),
        }
    }
}

impl From<RpcError> for SimulationOutcome {
    fn from(e: RpcError) -> Self {
        SimulationOutcome::failure(e.to_string())
    }
}

// ============================================================================
// CallSimulator
// ============================================================================

/// A call whose prerequisites have been checked and arguments encoded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PreparedCall {
    pub contract: ContractId,
    pub method: String,
    pub args: Vec<WireValue>,
    pub source_account: String,
    pub network_passphrase: String,
}

/// Simulates contract invocations through a [`LedgerGateway`].
#[derive(Clone)]
pub struct CallSimulator {
    gateway: Arc<dyn LedgerGateway>,
    fee: u32,
    validity_window: Duration,
    call_timeout: Option<Duration>,
}

impl CallSimulator {
    pub fn new(gateway: Arc<dyn LedgerGateway>) -> Self {
        Self {
            gateway,
            fee: DEFAULT_FEE,
            validity_window: DEFAULT_VALIDITY_WINDOW,
            call_timeout: None,
        }
    }

    /// Set the base fee in stroops.
    pub fn fee(mut self, fee: u32) -> Self {
        self.fee = fee;
        self
    }

    /// Set how long the simulated transaction stays valid.
    pub fn validity_window(mut self, window: Duration) -> Self {
        self.validity_window = window;
        self
    }

    /// Give up on each gateway call after `timeout`.
    pub fn call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = Some(timeout);
        self
    }

    /// Check prerequisites and encode arguments. Never touches the network.
    pub fn prepare(
        &self,
        contract_id: &str,
        method: &str,
        args: &[ParamInput],
        source_account: &str,
        network: Option<&NetworkConfig>,
    ) -> Result<PreparedCall, Error> {
        let network = network.ok_or(InvocationError::MissingNetwork)?;
        if contract_id.trim().is_empty() {
            return Err(InvocationError::MissingContract.into());
        }
        if source_account.trim().is_empty() {
            return Err(InvocationError::MissingAccount.into());
        }

        let contract: ContractId = contract_id.parse()?;
        let args = args
            .iter()
            .enumerate()
            .map(|(index, arg)| {
                codec::encode(arg).map_err(|source| Error::Encoding { index, source })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(PreparedCall {
            contract,
            method: method.to_string(),
            args,
            source_account: source_account.trim().to_string(),
            network_passphrase: network.passphrase().to_string(),
        })
    }

    /// Simulate a prepared call. Transport problems become a `Failure` outcome.
    pub async fn submit(&self, call: PreparedCall) -> SimulationOutcome {
        let account = match with_deadline(
            self.call_timeout,
            self.gateway.account(&call.source_account),
        )
        .await
        {
            Ok(account) => account,
            Err(e) => return e.into(),
        };

        let envelope = InvocationEnvelope {
            contract: call.contract,
            method: call.method,
            args: call.args,
            source_account: call.source_account,
            sequence: account.sequence + 1,
            fee: self.fee,
            network_passphrase: call.network_passphrase,
            valid_until: Utc::now().timestamp().max(0) as u64 + self.validity_window.as_secs(),
        };

        tracing::debug!(
            method = %envelope.method,
            contract = %envelope.contract,
            args = envelope.args.len(),
            "simulating invocation"
        );

        match with_deadline(self.call_timeout, self.gateway.simulate(&envelope)).await {
            Ok(response) => SimulationOutcome::from_response(response),
            Err(e) => e.into(),
        }
    }

    /// Prepare and submit in one step.
    pub async fn simulate(
        &self,
        contract_id: &str,
        method: &str,
        args: &[ParamInput],
        source_account: &str,
        network: Option<&NetworkConfig>,
    ) -> Result<SimulationOutcome, Error> {
        let call = self.prepare(contract_id, method, args, source_account, network)?;
        Ok(self.submit(call).await)
    }
}

impl std::fmt::Debug for CallSimulator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallSimulator")
            .field("endpoint", &self.gateway.endpoint())
            .field("fee", &self.fee)
            .field("validity_window", &self.validity_window)
            .field("call_timeout", &self.call_timeout)
            .finish()
    }
}
