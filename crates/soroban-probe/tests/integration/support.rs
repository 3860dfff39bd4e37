//! Shared test doubles and fixtures.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};

use soroban_probe::codec::xdr;
use soroban_probe::*;
use stellar_xdr::curr::{
    ContractDataDurability, ContractDataEntry, ExtensionPoint, Hash, LedgerEntryData, LedgerKey,
    ScAddress, ScContractInstance, ScMap, ScMapEntry, ScVal,
};
use tokio::sync::Notify;

/// Install a test subscriber once. Honors `RUST_LOG`.
pub fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

// =============================================================================
// Fixtures
// =============================================================================

/// A 32-byte contract id in `0x` form.
pub fn contract_hex() -> String {
    format!("0x{}", "aa".repeat(32))
}

/// A valid `G...` account.
pub fn account() -> String {
    stellar_strkey::ed25519::PublicKey([4u8; 32]).to_string()
}

/// Account snapshot with sequence 100 and 12.5 XLM.
pub fn account_snapshot() -> AccountSnapshot {
    AccountSnapshot {
        account_id: account(),
        sequence: 100,
        balance: 125_000_000,
    }
}

pub fn wasm_code_info() -> ContractCodeInfo {
    ContractCodeInfo {
        executable: ContractExecutable::Wasm {
            hash: "cd".repeat(32),
        },
        code_size: Some(2048),
        last_modified_ledger: 77,
        live_until_ledger: Some(5000),
    }
}

/// A simulation that returned `value` with no auth required.
pub fn success_response(value: WireValue) -> SimulateTransactionResponse {
    SimulateTransactionResponse {
        latest_ledger: 1234,
        min_resource_fee: Some(5000),
        cost: Some(ResourceCost {
            cpu_instructions: 1_000_000,
            memory_bytes: 2_000,
        }),
        results: vec![SimulateHostFunctionResult {
            auth: Vec::new(),
            xdr: Some(xdr::encode_value(&value).unwrap()),
        }],
        ..Default::default()
    }
}

/// A simulation whose first result needs signatures.
pub fn auth_response() -> SimulateTransactionResponse {
    let mut response = success_response(WireValue::Void);
    response.results[0].auth = vec!["AAAAAQ==".to_string()];
    response
}

/// A `getLedgerEntries` answer holding one contract instance with `pairs` in
/// its storage.
pub fn instance_entries(pairs: Vec<(WireValue, WireValue)>) -> LedgerEntriesResponse {
    let storage = pairs
        .into_iter()
        .map(|(key, val)| ScMapEntry {
            key: xdr::to_sc_val(&key).unwrap(),
            val: xdr::to_sc_val(&val).unwrap(),
        })
        .collect::<Vec<_>>();
    let data = LedgerEntryData::ContractData(ContractDataEntry {
        ext: ExtensionPoint::V0,
        contract: ScAddress::Contract(Hash([0xaa; 32])),
        key: ScVal::LedgerKeyContractInstance,
        durability: ContractDataDurability::Persistent,
        val: ScVal::ContractInstance(ScContractInstance {
            executable: stellar_xdr::curr::ContractExecutable::Wasm(Hash([0xcd; 32])),
            storage: Some(ScMap(storage.try_into().unwrap())),
        }),
    });

    LedgerEntriesResponse {
        entries: vec![LedgerEntryResult {
            key: "AAAABg==".to_string(),
            xdr: xdr::to_base64(&data).unwrap(),
            last_modified_ledger_seq: 77,
            live_until_ledger_seq: Some(5000),
        }],
        latest_ledger: 1234,
    }
}

// =============================================================================
// MockGateway
// =============================================================================

/// In-memory gateway that records calls and answers with canned results.
///
/// A canned `Err(message)` is returned as a transport error.
pub struct MockGateway {
    pub account: Mutex<Result<AccountSnapshot, String>>,
    pub contract_code: Mutex<Result<ContractCodeInfo, String>>,
    pub ledger_entries: Mutex<Result<LedgerEntriesResponse, String>>,
    pub simulation: Mutex<Result<SimulateTransactionResponse, String>>,

    pub account_calls: AtomicUsize,
    pub code_calls: AtomicUsize,
    pub entry_calls: AtomicUsize,
    pub simulate_calls: AtomicUsize,

    /// Every envelope passed to `simulate`, in order.
    pub envelopes: Mutex<Vec<InvocationEnvelope>>,
    /// Keys passed to `ledger_entries`, in order.
    pub requested_keys: Mutex<Vec<LedgerKey>>,

    /// When set, `simulate` waits for a notification before answering.
    gate: Option<Arc<Notify>>,
    /// When true, `simulate` never answers.
    hang: AtomicBool,
}

impl MockGateway {
    pub fn new() -> Self {
        Self {
            account: Mutex::new(Ok(account_snapshot())),
            contract_code: Mutex::new(Ok(wasm_code_info())),
            ledger_entries: Mutex::new(Ok(LedgerEntriesResponse::default())),
            simulation: Mutex::new(Ok(success_response(WireValue::from(500i128)))),
            account_calls: AtomicUsize::new(0),
            code_calls: AtomicUsize::new(0),
            entry_calls: AtomicUsize::new(0),
            simulate_calls: AtomicUsize::new(0),
            envelopes: Mutex::new(Vec::new()),
            requested_keys: Mutex::new(Vec::new()),
            gate: None,
            hang: AtomicBool::new(false),
        }
    }

    /// A gateway whose simulations wait on the returned handle.
    pub fn gated() -> (Self, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        let mock = Self {
            gate: Some(gate.clone()),
            ..Self::new()
        };
        (mock, gate)
    }

    pub fn with_simulation(self, response: SimulateTransactionResponse) -> Self {
        *self.simulation.lock().unwrap() = Ok(response);
        self
    }

    pub fn with_ledger_entries(self, response: LedgerEntriesResponse) -> Self {
        *self.ledger_entries.lock().unwrap() = Ok(response);
        self
    }

    pub fn failing_simulation(self, message: &str) -> Self {
        *self.simulation.lock().unwrap() = Err(message.to_string());
        self
    }

    pub fn failing_account(self, message: &str) -> Self {
        *self.account.lock().unwrap() = Err(message.to_string());
        self
    }

    pub fn failing_contract_code(self, message: &str) -> Self {
        *self.contract_code.lock().unwrap() = Err(message.to_string());
        self
    }

    pub fn failing_ledger_entries(self, message: &str) -> Self {
        *self.ledger_entries.lock().unwrap() = Err(message.to_string());
        self
    }

    pub fn hanging(self) -> Self {
        self.hang.store(true, Ordering::SeqCst);
        self
    }

    /// Total calls across all gateway methods.
    pub fn total_calls(&self) -> usize {
        self.account_calls.load(Ordering::SeqCst)
            + self.code_calls.load(Ordering::SeqCst)
            + self.entry_calls.load(Ordering::SeqCst)
            + self.simulate_calls.load(Ordering::SeqCst)
    }

    pub fn simulate_calls(&self) -> usize {
        self.simulate_calls.load(Ordering::SeqCst)
    }

    pub fn last_envelope(&self) -> Option<InvocationEnvelope> {
        self.envelopes.lock().unwrap().last().cloned()
    }
}

fn reply<T: Clone>(slot: &Mutex<Result<T, String>>) -> Result<T, RpcError> {
    slot.lock()
        .unwrap()
        .clone()
        .map_err(|message| RpcError::network(message, None))
}

impl LedgerGateway for MockGateway {
    fn endpoint(&self) -> &str {
        "mock://ledger"
    }

    fn ledger_entries<'a>(
        &'a self,
        keys: &'a [LedgerKey],
    ) -> GatewayFuture<'a, LedgerEntriesResponse> {
        self.entry_calls.fetch_add(1, Ordering::SeqCst);
        self.requested_keys.lock().unwrap().extend_from_slice(keys);
        let result = reply(&self.ledger_entries);
        Box::pin(async move { result })
    }

    fn account<'a>(&'a self, _public_key: &'a str) -> GatewayFuture<'a, AccountSnapshot> {
        self.account_calls.fetch_add(1, Ordering::SeqCst);
        let result = reply(&self.account);
        Box::pin(async move { result })
    }

    fn contract_code<'a>(
        &'a self,
        _contract: &'a ContractId,
    ) -> GatewayFuture<'a, ContractCodeInfo> {
        self.code_calls.fetch_add(1, Ordering::SeqCst);
        let result = reply(&self.contract_code);
        Box::pin(async move { result })
    }

    fn simulate<'a>(
        &'a self,
        envelope: &'a InvocationEnvelope,
    ) -> GatewayFuture<'a, SimulateTransactionResponse> {
        self.simulate_calls.fetch_add(1, Ordering::SeqCst);
        self.envelopes.lock().unwrap().push(envelope.clone());
        Box::pin(async move {
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            if self.hang.load(Ordering::SeqCst) {
                futures::future::pending::<()>().await;
            }
            reply(&self.simulation)
        })
    }
}

/// A connector that hands out `mocks` in order, reusing the last one.
pub fn connector(mocks: Vec<Arc<MockGateway>>) -> GatewayConnector {
    let handed_out = AtomicUsize::new(0);
    Arc::new(move |_network: &NetworkConfig| {
        let index = handed_out.fetch_add(1, Ordering::SeqCst).min(mocks.len() - 1);
        mocks[index].clone() as Arc<dyn LedgerGateway>
    })
}

/// A session on TESTNET backed by `mock`.
pub fn session_with(mock: Arc<MockGateway>) -> DebugSession {
    init_tracing();
    let session = DebugSession::with_connector(SessionConfig::default(), connector(vec![mock]));
    session.select_network(TESTNET.clone());
    session
}

/// A session with contract and account set, logs cleared.
pub async fn ready_session(mock: Arc<MockGateway>) -> DebugSession {
    let session = session_with(mock);
    session.set_contract(&contract_hex()).await.unwrap();
    session.set_account(&account()).await.unwrap();
    session.clear_logs();
    session
}
