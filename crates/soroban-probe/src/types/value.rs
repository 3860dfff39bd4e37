//! Wire values, loosely-typed call parameters and contract identifiers.

use std::fmt;
use std::str::FromStr;

use serde_json::Value;

use crate::error::EncodingError;

// ============================================================================
// 128-bit integer halves
// ============================================================================

/// A signed 128-bit integer split into high and low 64-bit halves.
///
/// `hi` carries the sign, so `hi * 2^64 + lo` is the represented value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct I128Parts {
    pub hi: i64,
    pub lo: u64,
}

impl From<i128> for I128Parts {
    fn from(value: i128) -> Self {
        Self {
            hi: (value >> 64) as i64,
            lo: value as u64,
        }
    }
}

impl From<I128Parts> for i128 {
    fn from(parts: I128Parts) -> Self {
        ((parts.hi as i128) << 64) | parts.lo as i128
    }
}

/// An unsigned 128-bit integer split into high and low 64-bit halves.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct U128Parts {
    pub hi: u64,
    pub lo: u64,
}

impl From<u128> for U128Parts {
    fn from(value: u128) -> Self {
        Self {
            hi: (value >> 64) as u64,
            lo: value as u64,
        }
    }
}

impl From<U128Parts> for u128 {
    fn from(parts: U128Parts) -> Self {
        ((parts.hi as u128) << 64) | parts.lo as u128
    }
}

// ============================================================================
// WireValue
// ============================================================================

/// Which kind of principal an address names.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AddressKind {
    /// An ed25519 account (`G...`).
    Account,
    /// A deployed contract (`C...` or `0x` hex).
    Contract,
}

/// A typed value as exchanged with the network.
///
/// Maps keep insertion order. Values the network can produce but this crate
/// does not model are carried as [`WireValue::Unknown`] with their tag name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WireValue {
    Void,
    Bool(bool),
    U32(u32),
    I32(i32),
    U64(u64),
    I64(i64),
    I128(I128Parts),
    U128(U128Parts),
    String(String),
    Symbol(String),
    Bytes(Vec<u8>),
    Address { kind: AddressKind, bytes: Vec<u8> },
    Vec(Vec<WireValue>),
    Map(Vec<(WireValue, WireValue)>),
    Unknown(String),
}

impl WireValue {
    /// A contract address from raw id bytes.
    pub fn contract(bytes: impl Into<Vec<u8>>) -> Self {
        WireValue::Address {
            kind: AddressKind::Contract,
            bytes: bytes.into(),
        }
    }

    /// An account address from a raw ed25519 public key.
    pub fn account(bytes: impl Into<Vec<u8>>) -> Self {
        WireValue::Address {
            kind: AddressKind::Account,
            bytes: bytes.into(),
        }
    }

    /// Tag name of this value, matching the network's type names.
    pub fn tag(&self) -> &str {
        match self {
            WireValue::Void => "Void",
            WireValue::Bool(_) => "Bool",
            WireValue::U32(_) => "U32",
            WireValue::I32(_) => "I32",
            WireValue::U64(_) => "U64",
            WireValue::I64(_) => "I64",
            WireValue::I128(_) => "I128",
            WireValue::U128(_) => "U128",
            WireValue::String(_) => "String",
            WireValue::Symbol(_) => "Symbol",
            WireValue::Bytes(_) => "Bytes",
            WireValue::Address { .. } => "Address",
            WireValue::Vec(_) => "Vec",
            WireValue::Map(_) => "Map",
            WireValue::Unknown(tag) => tag,
        }
    }
}

impl From<i128> for WireValue {
    fn from(value: i128) -> Self {
        WireValue::I128(value.into())
    }
}

impl From<u128> for WireValue {
    fn from(value: u128) -> Self {
        WireValue::U128(value.into())
    }
}

impl From<bool> for WireValue {
    fn from(value: bool) -> Self {
        WireValue::Bool(value)
    }
}

impl From<&str> for WireValue {
    fn from(value: &str) -> Self {
        WireValue::String(value.to_string())
    }
}

// ============================================================================
// ParamInput
// ============================================================================

/// A loosely-typed argument as supplied by a caller.
///
/// Text is classified by the codec: it may turn into an address, a boolean,
/// an integer, a structured literal, or stay a string.
#[derive(Clone, Debug, PartialEq)]
pub enum ParamInput {
    Text(String),
    Number(f64),
    Bool(bool),
    Int(i64),
    /// An integer given as decimal digits, for values beyond 64 bits.
    BigInt(String),
    List(Vec<ParamInput>),
    Map(Vec<(ParamInput, ParamInput)>),
}

impl ParamInput {
    /// Short name of the input kind, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            ParamInput::Text(_) => "text",
            ParamInput::Number(_) => "number",
            ParamInput::Bool(_) => "boolean",
            ParamInput::Int(_) => "integer",
            ParamInput::BigInt(_) => "big integer",
            ParamInput::List(_) => "list",
            ParamInput::Map(_) => "map",
        }
    }

    /// JSON rendering of this input, as shown in request logs.
    pub fn to_json(&self) -> Value {
        match self {
            ParamInput::Text(s) => Value::String(s.clone()),
            ParamInput::Number(n) => serde_json::Number::from_f64(*n)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            ParamInput::Bool(b) => Value::Bool(*b),
            ParamInput::Int(i) => Value::from(*i),
            ParamInput::BigInt(digits) => Value::String(digits.clone()),
            ParamInput::List(items) => Value::Array(items.iter().map(Self::to_json).collect()),
            ParamInput::Map(pairs) => Value::Object(
                pairs
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_json()))
                    .collect(),
            ),
        }
    }
}

impl fmt::Display for ParamInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamInput::Text(s) => f.write_str(s),
            ParamInput::Number(n) => write!(f, "{n}"),
            ParamInput::Bool(b) => write!(f, "{b}"),
            ParamInput::Int(i) => write!(f, "{i}"),
            ParamInput::BigInt(digits) => f.write_str(digits),
            ParamInput::List(_) | ParamInput::Map(_) => write!(f, "{}", self.to_json()),
        }
    }
}

/// Converts parsed JSON into parameter input.
///
/// JSON has no null parameter and no way to express fractional amounts that
/// the network accepts; both are rejected here or later by the codec.
impl TryFrom<Value> for ParamInput {
    type Error = EncodingError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Null => Err(EncodingError::UnsupportedValue("null".to_string())),
            Value::Bool(b) => Ok(ParamInput::Bool(b)),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(ParamInput::Int(i))
                } else if let Some(u) = n.as_u64() {
                    Ok(ParamInput::BigInt(u.to_string()))
                } else if is_integral(&n) {
                    // Wider than 64 bits; keep the exact digits
                    Ok(ParamInput::BigInt(n.to_string()))
                } else {
                    Ok(ParamInput::Number(n.as_f64().unwrap_or(f64::NAN)))
                }
            }
            Value::String(s) => Ok(ParamInput::Text(s)),
            Value::Array(items) => items
                .into_iter()
                .map(ParamInput::try_from)
                .collect::<Result<Vec<_>, _>>()
                .map(ParamInput::List),
            Value::Object(fields) => fields
                .into_iter()
                .map(|(k, v)| Ok((ParamInput::Text(k), ParamInput::try_from(v)?)))
                .collect::<Result<Vec<_>, EncodingError>>()
                .map(ParamInput::Map),
        }
    }
}

/// Optional `-` followed by digits only, as written in the source JSON.
fn is_integral(n: &serde_json::Number) -> bool {
    let text = n.to_string();
    let digits = text.strip_prefix('-').unwrap_or(&text);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

impl From<&str> for ParamInput {
    fn from(value: &str) -> Self {
        ParamInput::Text(value.to_string())
    }
}

impl From<String> for ParamInput {
    fn from(value: String) -> Self {
        ParamInput::Text(value)
    }
}

impl From<bool> for ParamInput {
    fn from(value: bool) -> Self {
        ParamInput::Bool(value)
    }
}

impl From<i64> for ParamInput {
    fn from(value: i64) -> Self {
        ParamInput::Int(value)
    }
}

impl From<f64> for ParamInput {
    fn from(value: f64) -> Self {
        ParamInput::Number(value)
    }
}

impl From<Vec<ParamInput>> for ParamInput {
    fn from(value: Vec<ParamInput>) -> Self {
        ParamInput::List(value)
    }
}

// ============================================================================
// ContractId
// ============================================================================

/// Identifier of a deployed contract.
///
/// Accepts `0x`-prefixed hex or a `C...` strkey. Displays as lowercase
/// `0x` hex, which is also the form the codec decodes contract addresses to.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ContractId(Vec<u8>);

impl ContractId {
    /// Wrap raw id bytes.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Raw id bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// The id as a 32-byte hash, which is what ledger keys require.
    pub fn to_hash(&self) -> Result<[u8; 32], EncodingError> {
        <[u8; 32]>::try_from(self.0.as_slice()).map_err(|_| {
            EncodingError::Xdr(format!(
                "contract id must be 32 bytes, got {}",
                self.0.len()
            ))
        })
    }

    /// The `C...` strkey form, when the id is 32 bytes.
    pub fn to_strkey(&self) -> Option<String> {
        self.to_hash()
            .ok()
            .map(|hash| stellar_strkey::Contract(hash).to_string())
    }
}

impl FromStr for ContractId {
    type Err = EncodingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(digits) = s.strip_prefix("0x") {
            return match hex::decode(digits) {
                Ok(bytes) if !bytes.is_empty() => Ok(Self(bytes)),
                _ => Err(EncodingError::InvalidContractId(s.to_string())),
            };
        }
        if s.starts_with('C') {
            return stellar_strkey::Contract::from_string(s)
                .map(|contract| Self(contract.0.to_vec()))
                .map_err(|_| EncodingError::InvalidContractId(s.to_string()));
        }
        Err(EncodingError::InvalidContractId(s.to_string()))
    }
}

impl fmt::Display for ContractId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(&self.0))
    }
}

impl fmt::Debug for ContractId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContractId({self})")
    }
}
