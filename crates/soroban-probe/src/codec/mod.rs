//! Conversion between caller input, wire values and display values.
//!
//! [`encode`] turns a [`ParamInput`] into a [`WireValue`]. Text input is
//! classified in a fixed order, first match wins:
//!
//! 1. `0x...` is a contract address (invalid hex is an error)
//! 2. exactly `true` / `false` is a boolean
//! 3. a decimal number is a 128-bit integer (a `.` is an error)
//! 4. text starting with `{` or `[` is parsed as JSON and encoded recursively
//! 5. anything else is a string
//!
//! [`decode`] turns a [`WireValue`] into a JSON display value. It never fails:
//! unmodelled values become `"<Unknown: Tag>"`.
//!
//! The [`xdr`] submodule maps wire values to and from network XDR.

pub mod xdr;

use std::num::IntErrorKind;

use serde_json::{Map, Value};

use crate::error::EncodingError;
use crate::types::{AddressKind, I128Parts, ParamInput, U128Parts, WireValue};

/// Largest integer an `f64` represents exactly.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

// ============================================================================
// Encoding
// ============================================================================

/// Encode caller input as a wire value.
pub fn encode(input: &ParamInput) -> Result<WireValue, EncodingError> {
    match input {
        ParamInput::Text(text) => encode_text(text),
        ParamInput::Bool(b) => Ok(WireValue::Bool(*b)),
        ParamInput::Int(i) => Ok(WireValue::from(*i as i128)),
        ParamInput::Number(n) => encode_number(*n),
        ParamInput::BigInt(digits) => encode_integer(digits.trim()),
        ParamInput::List(items) => items
            .iter()
            .map(encode)
            .collect::<Result<Vec<_>, _>>()
            .map(WireValue::Vec),
        ParamInput::Map(pairs) => pairs
            .iter()
            .map(|(key, value)| Ok((encode_key(key)?, encode(value)?)))
            .collect::<Result<Vec<_>, EncodingError>>()
            .map(WireValue::Map),
    }
}

/// Encode free-form text using the classification order above.
pub fn encode_text(text: &str) -> Result<WireValue, EncodingError> {
    if let Some(digits) = text.strip_prefix("0x") {
        return match hex::decode(digits) {
            Ok(bytes) if !bytes.is_empty() => Ok(WireValue::contract(bytes)),
            _ => Err(EncodingError::InvalidHex(text.to_string())),
        };
    }

    match text {
        "true" => return Ok(WireValue::Bool(true)),
        "false" => return Ok(WireValue::Bool(false)),
        _ => {}
    }

    if is_numeric_literal(text) {
        if text.contains('.') {
            return Err(EncodingError::FractionalAmount(text.to_string()));
        }
        return encode_integer(text);
    }

    if is_structured_literal(text) {
        let parsed: Value = serde_json::from_str(text).map_err(|e| {
            EncodingError::MalformedStructuredLiteral {
                literal: text.to_string(),
                message: e.to_string(),
            }
        })?;
        return encode(&ParamInput::try_from(parsed)?);
    }

    Ok(WireValue::String(text.to_string()))
}

fn encode_key(key: &ParamInput) -> Result<WireValue, EncodingError> {
    match key {
        ParamInput::Text(text) => Ok(WireValue::String(text.clone())),
        other => Err(EncodingError::UnsupportedKeyType(other.kind().to_string())),
    }
}

fn encode_number(n: f64) -> Result<WireValue, EncodingError> {
    if !n.is_finite() || n.fract() != 0.0 {
        return Err(EncodingError::FractionalAmount(n.to_string()));
    }
    if n.abs() > MAX_SAFE_INTEGER {
        return Err(EncodingError::IntegerOutOfRange(format!(
            "{n} (pass large integers as text)"
        )));
    }
    Ok(WireValue::from(n as i64 as i128))
}

/// Encode decimal digits, preferring the signed form when it fits.
fn encode_integer(digits: &str) -> Result<WireValue, EncodingError> {
    match digits.parse::<i128>() {
        Ok(value) => Ok(WireValue::I128(I128Parts::from(value))),
        Err(e) if *e.kind() == IntErrorKind::PosOverflow => digits
            .parse::<u128>()
            .map(|value| WireValue::U128(U128Parts::from(value)))
            .map_err(|_| EncodingError::IntegerOutOfRange(digits.to_string())),
        Err(e) if *e.kind() == IntErrorKind::NegOverflow => {
            Err(EncodingError::IntegerOutOfRange(digits.to_string()))
        }
        Err(_) => Err(EncodingError::UnsupportedValue(format!(
            "'{digits}' is not an integer"
        ))),
    }
}

/// Optional `-`, digits, at most one `.`, at least one digit.
fn is_numeric_literal(text: &str) -> bool {
    let body = text.strip_prefix('-').unwrap_or(text);
    let mut seen_digit = false;
    let mut seen_dot = false;
    for c in body.chars() {
        match c {
            '0'..='9' => seen_digit = true,
            '.' if !seen_dot => seen_dot = true,
            _ => return false,
        }
    }
    seen_digit
}

/// An opening brace or bracket commits to JSON; unbalanced text is malformed.
fn is_structured_literal(text: &str) -> bool {
    text.starts_with('{') || text.starts_with('[')
}

// ============================================================================
// Decoding
// ============================================================================

/// Decode a wire value into a JSON display value.
///
/// 128-bit integers become JSON numbers when they fit in 64 bits and exact
/// decimal strings otherwise.
pub fn decode(value: &WireValue) -> Value {
    match value {
        WireValue::Void => Value::Null,
        WireValue::Bool(b) => Value::Bool(*b),
        WireValue::U32(n) => Value::from(*n),
        WireValue::I32(n) => Value::from(*n),
        WireValue::U64(n) => Value::from(*n),
        WireValue::I64(n) => Value::from(*n),
        WireValue::I128(parts) => {
            let n = i128::from(*parts);
            if let Ok(small) = i64::try_from(n) {
                Value::from(small)
            } else if let Ok(small) = u64::try_from(n) {
                Value::from(small)
            } else {
                Value::String(n.to_string())
            }
        }
        WireValue::U128(parts) => {
            let n = u128::from(*parts);
            match u64::try_from(n) {
                Ok(small) => Value::from(small),
                Err(_) => Value::String(n.to_string()),
            }
        }
        WireValue::String(s) | WireValue::Symbol(s) => Value::String(s.clone()),
        WireValue::Bytes(bytes) => Value::String(format!("0x{}", hex::encode(bytes))),
        WireValue::Address { kind, bytes } => Value::String(address_text(*kind, bytes)),
        WireValue::Vec(items) => Value::Array(items.iter().map(decode).collect()),
        WireValue::Map(pairs) => {
            let mut object = Map::with_capacity(pairs.len());
            for (key, value) in pairs {
                object.insert(render(&decode(key)), decode(value));
            }
            Value::Object(object)
        }
        WireValue::Unknown(tag) => Value::String(format!("<Unknown: {tag}>")),
    }
}

/// Text form of an address: `G...` for accounts, lowercase `0x` hex for
/// contracts.
fn address_text(kind: AddressKind, bytes: &[u8]) -> String {
    match (kind, <[u8; 32]>::try_from(bytes)) {
        (AddressKind::Account, Ok(key)) => stellar_strkey::ed25519::PublicKey(key).to_string(),
        _ => format!("0x{}", hex::encode(bytes)),
    }
}

/// Flatten a display value to text: strings as-is, everything else as JSON.
pub fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
