//! Mapping between [`WireValue`] and the network's XDR types.

use base64::{Engine as _, engine::general_purpose::STANDARD};
use stellar_xdr::curr::{
    AccountId, ContractDataDurability, Hash, Int128Parts, LedgerKey, LedgerKeyAccount,
    LedgerKeyContractCode, LedgerKeyContractData, Limits, PublicKey, ReadXdr, ScAddress, ScBytes,
    ScMap, ScMapEntry, ScString, ScSymbol, ScVal, ScVec, UInt128Parts, Uint256, WriteXdr,
};

use crate::error::EncodingError;
use crate::types::{AddressKind, ContractId, I128Parts, U128Parts, WireValue};

// ============================================================================
// WireValue <-> ScVal
// ============================================================================

/// Convert a wire value to an `ScVal`.
///
/// Fails when a value exceeds an XDR bound: addresses that are not 32 bytes,
/// oversized strings or symbols, or [`WireValue::Unknown`].
pub fn to_sc_val(value: &WireValue) -> Result<ScVal, EncodingError> {
    Ok(match value {
        WireValue::Void => ScVal::Void,
        WireValue::Bool(b) => ScVal::Bool(*b),
        WireValue::U32(n) => ScVal::U32(*n),
        WireValue::I32(n) => ScVal::I32(*n),
        WireValue::U64(n) => ScVal::U64(*n),
        WireValue::I64(n) => ScVal::I64(*n),
        WireValue::I128(parts) => ScVal::I128(Int128Parts {
            hi: parts.hi,
            lo: parts.lo,
        }),
        WireValue::U128(parts) => ScVal::U128(UInt128Parts {
            hi: parts.hi,
            lo: parts.lo,
        }),
        WireValue::String(s) => {
            ScVal::String(ScString(s.as_str().try_into().map_err(xdr_error)?))
        }
        WireValue::Symbol(s) => {
            ScVal::Symbol(ScSymbol(s.as_str().try_into().map_err(xdr_error)?))
        }
        WireValue::Bytes(bytes) => {
            ScVal::Bytes(ScBytes(bytes.clone().try_into().map_err(xdr_error)?))
        }
        WireValue::Address { kind, bytes } => ScVal::Address(to_sc_address(*kind, bytes)?),
        WireValue::Vec(items) => {
            let items = items.iter().map(to_sc_val).collect::<Result<Vec<_>, _>>()?;
            ScVal::Vec(Some(ScVec(items.try_into().map_err(xdr_error)?)))
        }
        WireValue::Map(pairs) => {
            let entries = pairs
                .iter()
                .map(|(key, val)| {
                    Ok(ScMapEntry {
                        key: to_sc_val(key)?,
                        val: to_sc_val(val)?,
                    })
                })
                .collect::<Result<Vec<_>, EncodingError>>()?;
            ScVal::Map(Some(ScMap(entries.try_into().map_err(xdr_error)?)))
        }
        WireValue::Unknown(tag) => {
            return Err(EncodingError::Xdr(format!("cannot encode a value of type {tag}")));
        }
    })
}

/// Convert an `ScVal` to a wire value. Unmodelled variants keep their tag.
pub fn from_sc_val(value: &ScVal) -> WireValue {
    match value {
        ScVal::Void => WireValue::Void,
        ScVal::Bool(b) => WireValue::Bool(*b),
        ScVal::U32(n) => WireValue::U32(*n),
        ScVal::I32(n) => WireValue::I32(*n),
        ScVal::U64(n) => WireValue::U64(*n),
        ScVal::I64(n) => WireValue::I64(*n),
        ScVal::I128(parts) => WireValue::I128(I128Parts {
            hi: parts.hi,
            lo: parts.lo,
        }),
        ScVal::U128(parts) => WireValue::U128(U128Parts {
            hi: parts.hi,
            lo: parts.lo,
        }),
        ScVal::String(s) => WireValue::String(lossy(s.0.as_slice())),
        ScVal::Symbol(s) => WireValue::Symbol(lossy(s.0.as_slice())),
        ScVal::Bytes(b) => WireValue::Bytes(b.0.as_slice().to_vec()),
        ScVal::Address(address) => from_sc_address(address),
        ScVal::Vec(items) => WireValue::Vec(
            items
                .iter()
                .flat_map(|items| items.0.iter())
                .map(from_sc_val)
                .collect(),
        ),
        ScVal::Map(map) => WireValue::Map(
            map.iter()
                .flat_map(|map| map.0.iter())
                .map(|entry| (from_sc_val(&entry.key), from_sc_val(&entry.val)))
                .collect(),
        ),
        other => WireValue::Unknown(other.name().to_string()),
    }
}

fn to_sc_address(kind: AddressKind, bytes: &[u8]) -> Result<ScAddress, EncodingError> {
    let key = <[u8; 32]>::try_from(bytes).map_err(|_| {
        EncodingError::Xdr(format!("address must be 32 bytes, got {}", bytes.len()))
    })?;
    Ok(match kind {
        AddressKind::Contract => ScAddress::Contract(Hash(key)),
        AddressKind::Account => ScAddress::Account(account_id(key)),
    })
}

fn from_sc_address(address: &ScAddress) -> WireValue {
    match address {
        ScAddress::Contract(Hash(bytes)) => WireValue::contract(bytes.to_vec()),
        ScAddress::Account(AccountId(PublicKey::PublicKeyTypeEd25519(Uint256(bytes)))) => {
            WireValue::account(bytes.to_vec())
        }
    }
}

fn lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

fn account_id(key: [u8; 32]) -> AccountId {
    AccountId(PublicKey::PublicKeyTypeEd25519(Uint256(key)))
}

fn xdr_error(e: stellar_xdr::curr::Error) -> EncodingError {
    EncodingError::Xdr(e.to_string())
}

// ============================================================================
// Ledger keys
// ============================================================================

/// Key of a contract's instance entry, which holds instance storage.
pub fn contract_instance_key(contract: &ContractId) -> Result<LedgerKey, EncodingError> {
    Ok(LedgerKey::ContractData(LedgerKeyContractData {
        contract: ScAddress::Contract(Hash(contract.to_hash()?)),
        key: ScVal::LedgerKeyContractInstance,
        durability: ContractDataDurability::Persistent,
    }))
}

/// Key of an uploaded wasm blob.
pub fn contract_code_key(hash: [u8; 32]) -> LedgerKey {
    LedgerKey::ContractCode(LedgerKeyContractCode { hash: Hash(hash) })
}

/// Key of an account entry, from a `G...` strkey.
pub fn account_key(public_key: &str) -> Result<LedgerKey, EncodingError> {
    let key = stellar_strkey::ed25519::PublicKey::from_string(public_key)
        .map_err(|_| EncodingError::Xdr(format!("invalid account public key '{public_key}'")))?;
    Ok(LedgerKey::Account(LedgerKeyAccount {
        account_id: account_id(key.0),
    }))
}

// ============================================================================
// Base64 helpers
// ============================================================================

/// Serialize any XDR type to base64.
pub fn to_base64<T: WriteXdr>(value: &T) -> Result<String, EncodingError> {
    let bytes = value.to_xdr(Limits::none()).map_err(xdr_error)?;
    Ok(STANDARD.encode(bytes))
}

/// Parse any XDR type from base64.
pub fn from_base64<T: ReadXdr>(encoded: &str) -> Result<T, EncodingError> {
    let bytes = STANDARD
        .decode(encoded.trim())
        .map_err(|e| EncodingError::Xdr(format!("invalid base64: {e}")))?;
    T::from_xdr(bytes, Limits::none()).map_err(xdr_error)
}

/// Serialize a wire value as base64 `ScVal` XDR.
pub fn encode_value(value: &WireValue) -> Result<String, EncodingError> {
    to_base64(&to_sc_val(value)?)
}

/// Parse base64 `ScVal` XDR into a wire value.
pub fn decode_value(encoded: &str) -> Result<WireValue, EncodingError> {
    from_base64::<ScVal>(encoded).map(|value| from_sc_val(&value))
}
