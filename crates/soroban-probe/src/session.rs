//! Stateful debugging session.
//!
//! A [`DebugSession`] ties a network, a contract and a source account together
//! and keeps the history of what happened in two logs: debug entries (one per
//! user-visible action) and network entries (a request/response pair per
//! network call).
//!
//! Phases advance as prerequisites are set:
//!
//! ```text
//! Disconnected -> NetworkReady -> ContractReady -> ReadyToExecute
//! ```
//!
//! Selecting a network always returns to `NetworkReady` with every derived
//! value cleared. Operations that were in flight when that happened finish
//! quietly; their results are discarded.
//!
//! # Example
//!
//! ```rust,no_run
//! use soroban_probe::*;
//!
//! # async fn example() -> Result<(), soroban_probe::Error> {
//! let session = DebugSession::new(SessionConfig::from_env()?);
//! session.select_network(TESTNET.clone());
//! session.set_contract("CDLZFC3SYJYDZT7K67VZ75HPJVIEUVNIXF47ZG2FB2RMQQVU2HHGCYSC").await?;
//! session.set_account("GBZXN7PIRZGNMHGA7MUUUF4GWPY5AYPV6LY4UV2GL6VJGIQRXFDNMADI").await?;
//!
//! let outcome = session.execute("decimals", &[], MethodKind::Read).await?;
//! println!("{outcome:?}");
//! for log in session.debug_logs() {
//!     println!("{log}");
//! }
//! # Ok(())
//! # }
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::client::{
    CallSimulator, ContractQueryService, DEFAULT_FEE, DEFAULT_VALIDITY_WINDOW, LedgerGateway,
    SimulationOutcome, SorobanRpcClient, with_deadline,
};
use crate::error::{Error, InvocationError};
use crate::types::{
    ContractDetails, ContractId, ContractMethod, DebugLog, MethodKind, NetworkConfig, NetworkLog,
    ParamInput, ResponseStatus, StorageEntry, default_read_methods, default_write_methods,
    format_stroops,
};

// ============================================================================
// Configuration
// ============================================================================

/// Tunables shared by every operation a session runs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionConfig {
    /// Deadline for each gateway call. `None` waits indefinitely.
    pub call_timeout: Option<Duration>,
    /// Base fee in stroops attached to simulated transactions.
    pub fee: u32,
    /// How long simulated transactions stay valid.
    pub validity_window: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            call_timeout: Some(Duration::from_secs(30)),
            fee: DEFAULT_FEE,
            validity_window: DEFAULT_VALIDITY_WINDOW,
        }
    }
}

impl SessionConfig {
    /// Defaults, with `SOROBAN_CALL_TIMEOUT_SECS` overriding the deadline.
    /// A value of `0` disables it.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_timeout_var(std::env::var("SOROBAN_CALL_TIMEOUT_SECS").ok().as_deref())
    }

    fn from_timeout_var(value: Option<&str>) -> Result<Self, Error> {
        let mut config = Self::default();
        if let Some(value) = value {
            let secs: u64 = value.trim().parse().map_err(|_| {
                Error::Config(format!(
                    "SOROBAN_CALL_TIMEOUT_SECS must be whole seconds, got '{value}'"
                ))
            })?;
            config.call_timeout = (secs > 0).then(|| Duration::from_secs(secs));
        }
        Ok(config)
    }
}

/// Builds a gateway for a network. Called on every network selection.
pub type GatewayConnector = Arc<dyn Fn(&NetworkConfig) -> Arc<dyn LedgerGateway> + Send + Sync>;

// ============================================================================
// State
// ============================================================================

/// How far a session has been set up.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SessionPhase {
    Disconnected,
    NetworkReady,
    ContractReady,
    ReadyToExecute,
}

#[derive(Default)]
struct SessionState {
    epoch: u64,
    network: Option<Arc<NetworkConfig>>,
    gateway: Option<Arc<dyn LedgerGateway>>,
    contract_id: Option<String>,
    contract_details: Option<ContractDetails>,
    account: Option<String>,
    account_balance: Option<String>,
    storage: Vec<StorageEntry>,
    last_outcome: Option<SimulationOutcome>,
    debug_logs: Vec<DebugLog>,
    network_logs: Vec<NetworkLog>,
    read_methods: Vec<ContractMethod>,
    write_methods: Vec<ContractMethod>,
}

/// What an operation needs from the state, copied out under the lock.
struct Snapshot {
    epoch: u64,
    network: Arc<NetworkConfig>,
    gateway: Arc<dyn LedgerGateway>,
    contract_id: Option<String>,
    account: Option<String>,
}

/// Clears the loading flag when an operation ends, however it ends.
struct LoadingGuard<'a>(&'a AtomicBool);

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

// ============================================================================
// DebugSession
// ============================================================================

/// An interactive session against one network, contract and account.
///
/// All methods take `&self`; share the session behind an `Arc` to drive it
/// from several tasks. Only one network operation runs at a time; others are
/// rejected with [`InvocationError::Busy`].
pub struct DebugSession {
    config: SessionConfig,
    connector: GatewayConnector,
    state: Mutex<SessionState>,
    loading: AtomicBool,
}

impl DebugSession {
    /// A session that talks to each network through [`SorobanRpcClient`].
    pub fn new(config: SessionConfig) -> Self {
        Self::with_connector(
            config,
            Arc::new(|network: &NetworkConfig| {
                Arc::new(SorobanRpcClient::for_network(network)) as Arc<dyn LedgerGateway>
            }),
        )
    }

    /// A session with a custom gateway factory.
    pub fn with_connector(config: SessionConfig, connector: GatewayConnector) -> Self {
        let state = SessionState {
            read_methods: default_read_methods(),
            write_methods: default_write_methods(),
            ..SessionState::default()
        };
        Self {
            config,
            connector,
            state: Mutex::new(state),
            loading: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    // ========================================================================
    // Actions
    // ========================================================================

    /// Switch to `network`, resetting everything derived from the previous one.
    pub fn select_network(&self, network: impl Into<Arc<NetworkConfig>>) {
        let network = network.into();
        let gateway = (self.connector)(network.as_ref());

        let mut state = self.state();
        let read_methods = std::mem::take(&mut state.read_methods);
        let write_methods = std::mem::take(&mut state.write_methods);
        *state = SessionState {
            epoch: state.epoch + 1,
            network: Some(network.clone()),
            gateway: Some(gateway),
            read_methods,
            write_methods,
            ..SessionState::default()
        };
        state
            .debug_logs
            .push(DebugLog::info(format!("Connected to {}", network.name())));

        tracing::info!(network = network.name(), rpc_url = network.rpc_url(), "network selected");
    }

    /// Select a contract, then fetch its details and storage concurrently.
    ///
    /// Fetch failures are recorded in the logs; the contract stays selected.
    pub async fn set_contract(&self, contract_id: &str) -> Result<(), Error> {
        let _guard = self.begin()?;
        let snapshot = self.snapshot()?;

        let contract_id = contract_id.trim().to_string();
        if contract_id.is_empty() {
            return Err(self.reject(InvocationError::MissingContract));
        }
        if let Err(e) = contract_id.parse::<ContractId>() {
            return Err(self.reject(e));
        }

        self.commit(snapshot.epoch, |state| {
            state.contract_id = Some(contract_id.clone());
            state.contract_details = None;
            state.storage.clear();
            state.last_outcome = None;
        });
        tracing::info!(contract = %contract_id, "contract selected");

        let queries = self.queries(&snapshot);
        let (details, storage) = futures::join!(
            self.load_details(&queries, snapshot.epoch, &contract_id),
            self.load_storage(&queries, snapshot.epoch, &contract_id),
        );

        let mut problems = Vec::new();
        if let Err(e) = &details {
            problems.push(format!("failed to fetch contract details: {e}"));
        }
        if let Err(e) = &storage {
            problems.push(format!("error fetching contract storage: {e}"));
        }

        let summary = match (problems.is_empty(), storage) {
            (true, Ok(count)) => DebugLog::success(format!(
                "Contract {contract_id} connected ({count} storage entries)"
            )),
            _ => DebugLog::error(format!(
                "Contract {contract_id} connected with errors: {}",
                problems.join("; ")
            )),
        };
        self.commit(snapshot.epoch, |state| state.debug_logs.push(summary));
        Ok(())
    }

    /// Select the source account and fetch its balance.
    ///
    /// A failed balance fetch is logged; the account stays selected.
    pub async fn set_account(&self, public_key: &str) -> Result<(), Error> {
        let _guard = self.begin()?;
        let snapshot = self.snapshot()?;

        let public_key = public_key.trim().to_string();
        if public_key.is_empty() {
            return Err(self.reject(InvocationError::MissingAccount));
        }

        self.commit(snapshot.epoch, |state| {
            state.account = Some(public_key.clone());
            state.account_balance = None;
            state.last_outcome = None;
            state
                .network_logs
                .push(NetworkLog::request(format!("Fetching account {public_key}")));
        });

        let result = with_deadline(
            self.config.call_timeout,
            snapshot.gateway.account(&public_key),
        )
        .await;

        self.commit(snapshot.epoch, |state| match result {
            Ok(account) => {
                let balance = account.balance_xlm();
                state.network_logs.push(NetworkLog::response(
                    "Account fetched",
                    ResponseStatus::Success,
                ));
                state.debug_logs.push(DebugLog::success(format!(
                    "Account {public_key} connected (balance {balance} XLM)"
                )));
                state.account_balance = Some(balance);
            }
            Err(e) => {
                tracing::warn!(account = %public_key, error = %e, "failed to fetch account");
                state.network_logs.push(NetworkLog::response(
                    "Error fetching account",
                    ResponseStatus::Failed,
                ));
                state
                    .debug_logs
                    .push(DebugLog::error(format!("Error fetching account balance: {e}")));
            }
        });
        Ok(())
    }

    /// Refetch storage for the selected contract. Returns the entry count.
    pub async fn refresh_storage(&self) -> Result<usize, Error> {
        let _guard = self.begin()?;
        let snapshot = self.snapshot()?;
        let Some(contract_id) = snapshot.contract_id.clone() else {
            return Err(self.reject(InvocationError::MissingContract));
        };

        let queries = self.queries(&snapshot);
        let result = self
            .load_storage(&queries, snapshot.epoch, &contract_id)
            .await;

        let log = match &result {
            Ok(count) => DebugLog::info(format!("Contract storage fetched ({count} entries)")),
            Err(e) => DebugLog::error(format!("Error fetching contract storage: {e}")),
        };
        self.commit(snapshot.epoch, |state| state.debug_logs.push(log));
        result
    }

    /// Simulate `method` on the selected contract from the selected account.
    ///
    /// Missing prerequisites and argument encoding problems are returned as
    /// errors before anything is sent. Everything after that is reported in
    /// the returned outcome.
    pub async fn execute(
        &self,
        method: &str,
        args: &[ParamInput],
        kind: MethodKind,
    ) -> Result<SimulationOutcome, Error> {
        let _guard = self.begin()?;
        let snapshot = self.snapshot()?;

        let simulator = self.simulator(&snapshot);
        let call = simulator
            .prepare(
                snapshot.contract_id.as_deref().unwrap_or_default(),
                method,
                args,
                snapshot.account.as_deref().unwrap_or_default(),
                Some(&*snapshot.network),
            )
            .map_err(|e| self.reject(e))?;

        let rendered = args
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        self.commit(snapshot.epoch, |state| {
            state.last_outcome = None;
            state.network_logs.push(NetworkLog::request(format!(
                "{}: {method}({rendered})",
                kind.verb()
            )));
        });

        let outcome = simulator.submit(call).await;

        self.commit(snapshot.epoch, |state| {
            let (response, log) = match &outcome {
                SimulationOutcome::Success { .. } => (
                    NetworkLog::response(
                        format!("Success: {method} executed"),
                        ResponseStatus::Success,
                    ),
                    DebugLog::success(format!("Method {method} executed successfully")),
                ),
                SimulationOutcome::RequiresAuth { .. } => (
                    NetworkLog::response(
                        format!("Success: {method} requires authorization"),
                        ResponseStatus::Success,
                    ),
                    DebugLog::success(format!(
                        "Method {method} simulated; submitting it requires authorization"
                    )),
                ),
                SimulationOutcome::Failure { reason } => (
                    NetworkLog::response(format!("Error: {reason}"), ResponseStatus::Rejected),
                    DebugLog::error(format!("Error executing {method}: {reason}")),
                ),
            };
            state.network_logs.push(response);
            state.debug_logs.push(log);
            state.last_outcome = Some(outcome.clone());
        });

        Ok(outcome)
    }

    /// Clear both logs.
    pub fn clear_logs(&self) {
        let mut state = self.state();
        state.network_logs.clear();
        state.debug_logs.clear();
        state.debug_logs.push(DebugLog::info("Logs cleared"));
    }

    /// Clear only the network log.
    pub fn clear_network_logs(&self) {
        let mut state = self.state();
        state.network_logs.clear();
        state.debug_logs.push(DebugLog::info("Network logs cleared"));
    }

    /// Replace the method registry.
    pub fn set_contract_methods(
        &self,
        read_methods: Vec<ContractMethod>,
        write_methods: Vec<ContractMethod>,
    ) {
        let mut state = self.state();
        state.read_methods = read_methods;
        state.write_methods = write_methods;
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn phase(&self) -> SessionPhase {
        let state = self.state();
        match (&state.network, &state.contract_id, &state.account) {
            (None, _, _) => SessionPhase::Disconnected,
            (Some(_), None, _) => SessionPhase::NetworkReady,
            (Some(_), Some(_), None) => SessionPhase::ContractReady,
            (Some(_), Some(_), Some(_)) => SessionPhase::ReadyToExecute,
        }
    }

    /// True while a network operation is running.
    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::Acquire)
    }

    pub fn network(&self) -> Option<Arc<NetworkConfig>> {
        self.state().network.clone()
    }

    pub fn contract_id(&self) -> Option<String> {
        self.state().contract_id.clone()
    }

    pub fn contract_details(&self) -> Option<ContractDetails> {
        self.state().contract_details.clone()
    }

    pub fn account(&self) -> Option<String> {
        self.state().account.clone()
    }

    /// Native balance of the selected account, `"0.0000000"` until fetched.
    pub fn account_balance(&self) -> String {
        self.state()
            .account_balance
            .clone()
            .unwrap_or_else(|| format_stroops(0))
    }

    pub fn storage(&self) -> Vec<StorageEntry> {
        self.state().storage.clone()
    }

    pub fn last_outcome(&self) -> Option<SimulationOutcome> {
        self.state().last_outcome.clone()
    }

    pub fn debug_logs(&self) -> Vec<DebugLog> {
        self.state().debug_logs.clone()
    }

    pub fn network_logs(&self) -> Vec<NetworkLog> {
        self.state().network_logs.clone()
    }

    pub fn read_methods(&self) -> Vec<ContractMethod> {
        self.state().read_methods.clone()
    }

    pub fn write_methods(&self) -> Vec<ContractMethod> {
        self.state().write_methods.clone()
    }

    /// Look up a registered method by name.
    pub fn find_method(&self, name: &str) -> Option<ContractMethod> {
        let state = self.state();
        state
            .read_methods
            .iter()
            .chain(&state.write_methods)
            .find(|method| method.name == name)
            .cloned()
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn begin(&self) -> Result<LoadingGuard<'_>, Error> {
        self.loading
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| LoadingGuard(&self.loading))
            .map_err(|_| self.reject(InvocationError::Busy))
    }

    fn snapshot(&self) -> Result<Snapshot, Error> {
        let snapshot = {
            let state = self.state();
            match (&state.network, &state.gateway) {
                (Some(network), Some(gateway)) => Some(Snapshot {
                    epoch: state.epoch,
                    network: network.clone(),
                    gateway: gateway.clone(),
                    contract_id: state.contract_id.clone(),
                    account: state.account.clone(),
                }),
                _ => None,
            }
        };
        snapshot.ok_or_else(|| self.reject(InvocationError::MissingNetwork))
    }

    /// Record a rejected action and hand the error back.
    fn reject(&self, error: impl Into<Error>) -> Error {
        let error = error.into();
        tracing::warn!(error = %error, "action rejected");
        self.state()
            .debug_logs
            .push(DebugLog::error(error.to_string()));
        error
    }

    /// Apply `update` unless the session was reset after `epoch`.
    fn commit(&self, epoch: u64, update: impl FnOnce(&mut SessionState)) -> bool {
        let mut state = self.state();
        if state.epoch != epoch {
            tracing::debug!(started = epoch, current = state.epoch, "discarding stale result");
            return false;
        }
        update(&mut state);
        true
    }

    fn queries(&self, snapshot: &Snapshot) -> ContractQueryService {
        let queries = ContractQueryService::new(snapshot.gateway.clone());
        match self.config.call_timeout {
            Some(timeout) => queries.call_timeout(timeout),
            None => queries,
        }
    }

    fn simulator(&self, snapshot: &Snapshot) -> CallSimulator {
        let simulator = CallSimulator::new(snapshot.gateway.clone())
            .fee(self.config.fee)
            .validity_window(self.config.validity_window);
        match self.config.call_timeout {
            Some(timeout) => simulator.call_timeout(timeout),
            None => simulator,
        }
    }

    async fn load_details(
        &self,
        queries: &ContractQueryService,
        epoch: u64,
        contract_id: &str,
    ) -> Result<(), Error> {
        self.commit(epoch, |state| {
            state.network_logs.push(NetworkLog::request(format!(
                "Fetching contract details for: {contract_id}"
            )))
        });

        let result = queries.details(contract_id).await;

        self.commit(epoch, |state| match &result {
            Ok(details) => {
                state.contract_details = Some(details.clone());
                state.network_logs.push(NetworkLog::response(
                    "Contract details fetched",
                    ResponseStatus::Success,
                ));
            }
            Err(_) => state.network_logs.push(NetworkLog::response(
                "Error fetching contract details",
                ResponseStatus::Failed,
            )),
        });
        result.map(|_| ())
    }

    async fn load_storage(
        &self,
        queries: &ContractQueryService,
        epoch: u64,
        contract_id: &str,
    ) -> Result<usize, Error> {
        self.commit(epoch, |state| {
            state.network_logs.push(NetworkLog::request(format!(
                "Fetching contract storage for: {contract_id}"
            )))
        });

        let result = queries.fetch_storage(contract_id).await;

        self.commit(epoch, |state| match &result {
            Ok(entries) => {
                state.storage = entries.clone();
                state.network_logs.push(NetworkLog::response(
                    "Contract storage fetched",
                    ResponseStatus::Success,
                ));
            }
            Err(_) => {
                state.storage.clear();
                state.network_logs.push(NetworkLog::response(
                    "Error fetching contract storage",
                    ResponseStatus::Failed,
                ));
            }
        });
        result.map(|entries| entries.len())
    }
}

impl std::fmt::Debug for DebugSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state();
        f.debug_struct("DebugSession")
            .field("config", &self.config)
            .field("network", &state.network.as_ref().map(|n| n.name().to_string()))
            .field("contract_id", &state.contract_id)
            .field("account", &state.account)
            .field("loading", &self.is_loading())
            .finish()
    }
}
