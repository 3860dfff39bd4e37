//! Contract method descriptors offered to a debugging session.

use serde::{Deserialize, Serialize};

/// Whether a method only reads state or would change it if submitted.
///
/// Both kinds are only ever simulated; the distinction drives how calls are
/// labelled in logs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MethodKind {
    #[default]
    Read,
    Write,
}

impl MethodKind {
    /// Verb used in request logs.
    pub fn verb(&self) -> &'static str {
        match self {
            MethodKind::Read => "Reading",
            MethodKind::Write => "Writing",
        }
    }
}

/// A named contract method and the names of its parameters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractMethod {
    pub name: String,
    pub params: Vec<String>,
    #[serde(default)]
    pub kind: MethodKind,
}

impl ContractMethod {
    pub fn new<I, S>(name: impl Into<String>, params: I, kind: MethodKind) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            params: params.into_iter().map(Into::into).collect(),
            kind,
        }
    }

    pub fn read<I, S>(name: impl Into<String>, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(name, params, MethodKind::Read)
    }

    pub fn write<I, S>(name: impl Into<String>, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(name, params, MethodKind::Write)
    }

    /// Renders a call of this method with the given argument text.
    pub fn signature(&self) -> String {
        format!("{}({})", self.name, self.params.join(", "))
    }
}

/// Read methods of a token-style contract.
pub fn default_read_methods() -> Vec<ContractMethod> {
    vec![
        ContractMethod::read("balance_of", ["account"]),
        ContractMethod::read("allowance", ["owner", "spender"]),
        ContractMethod::read("name", Vec::<String>::new()),
        ContractMethod::read("symbol", Vec::<String>::new()),
        ContractMethod::read("decimals", Vec::<String>::new()),
        ContractMethod::read("total_supply", Vec::<String>::new()),
    ]
}

/// Write methods of a token-style contract.
pub fn default_write_methods() -> Vec<ContractMethod> {
    vec![
        ContractMethod::write("transfer", ["to", "amount"]),
        ContractMethod::write("approve", ["spender", "amount"]),
        ContractMethod::write("transfer_from", ["from", "to", "amount"]),
    ]
}
