//! Node response types and hex quantity decoding.

use serde::Deserialize;
use serde_json::Value;

use crate::error::{RpcError, RpcResult};

/// Sync state reported by `eth_syncing` while the node is catching up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncProgress {
    pub current_block: u64,
    pub highest_block: u64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSyncProgress {
    current_block: String,
    highest_block: String,
}

impl SyncProgress {
    /// Blocks the node still has to import. Never negative.
    pub fn remaining_blocks(&self) -> u64 {
        self.highest_block.saturating_sub(self.current_block)
    }

    /// Interpret an `eth_syncing` result: `false` or a progress object.
    pub fn from_value(value: Value) -> RpcResult<Option<Self>> {
        match value {
            Value::Bool(false) => Ok(None),
            Value::Object(_) => {
                let raw: RawSyncProgress = serde_json::from_value(value)
                    .map_err(|e| RpcError::Decode(format!("eth_syncing: {e}")))?;
                Ok(Some(Self {
                    current_block: parse_quantity(&raw.current_block)?,
                    highest_block: parse_quantity(&raw.highest_block)?,
                }))
            }
            other => Err(RpcError::Decode(format!(
                "eth_syncing: unexpected result {other}"
            ))),
        }
    }
}

/// Result of the extended `parity_chainStatus` method.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChainStatus {
    /// `[low, high]` range skipped by warp sync, if the node reports one.
    pub block_gap: Option<Vec<u64>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawChainStatus {
    #[serde(default)]
    block_gap: Option<Vec<String>>,
}

impl ChainStatus {
    /// Interpret a `parity_chainStatus` result. A `null` result is no gap.
    pub fn from_value(value: Value) -> RpcResult<Self> {
        if value.is_null() {
            return Ok(Self::default());
        }

        let raw: RawChainStatus = serde_json::from_value(value)
            .map_err(|e| RpcError::Decode(format!("parity_chainStatus: {e}")))?;

        let block_gap = raw
            .block_gap
            .map(|gap| {
                gap.iter()
                    .map(|s| parse_quantity(s))
                    .collect::<RpcResult<Vec<u64>>>()
            })
            .transpose()?;

        Ok(Self { block_gap })
    }

    /// Size of the reported gap; `0` unless exactly two bounds are present.
    pub fn gap_size(&self) -> u64 {
        match self.block_gap.as_deref() {
            Some([low, high]) => high.saturating_sub(*low),
            _ => 0,
        }
    }
}

/// Decode a JSON value holding a hex quantity such as `"0x1a"`.
pub fn decode_quantity(value: &Value) -> RpcResult<u64> {
    match value.as_str() {
        Some(s) => parse_quantity(s),
        None => Err(RpcError::Decode(format!(
            "expected hex quantity string, got {value}"
        ))),
    }
}

/// Parse a hex quantity: `0x` prefix, 1-16 digits, no leading zeros.
pub fn parse_quantity(s: &str) -> RpcResult<u64> {
    let digits = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .ok_or_else(|| RpcError::Decode(format!("hex quantity {s:?} lacks 0x prefix")))?;

    if digits.is_empty() {
        return Err(RpcError::Decode("empty hex quantity".to_string()));
    }
    if digits.len() > 1 && digits.starts_with('0') {
        return Err(RpcError::Decode(format!(
            "hex quantity {s:?} has leading zero digits"
        )));
    }
    if digits.len() > 16 {
        return Err(RpcError::Decode(format!("hex quantity {s:?} exceeds 64 bits")));
    }
    if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(RpcError::Decode(format!("invalid hex quantity {s:?}")));
    }

    u64::from_str_radix(digits, 16)
        .map_err(|e| RpcError::Decode(format!("invalid hex quantity {s:?}: {e}")))
}
