//! # Contract Event Payloads
//!
//! Wire records for the events the IVS contract emits around a decryption
//! request.
//!
//! ## Design Rules
//!
//! - Records mirror the on-chain event fields one to one.
//! - `data_type` stays a raw string here; it is validated when the record is
//!   decoded into a completion notification, so an unknown tag is a
//!   per-record error and never a stream error.

use crate::entities::*;
use serde::{Deserialize, Serialize};

// =============================================================================
// DECRYPTION REQUEST LIFECYCLE
// =============================================================================

/// Emitted when the contract accepts a decryption request.
/// Sender: ledger | Receiver: relayer, diagnostics
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecryptionRequested {
    /// Correlation token for the request.
    pub request_id: RequestId,
    /// Subject whose field is being decrypted.
    pub user_id: UserId,
    /// Which field.
    pub kind: DataKind,
}

/// Emitted by the relayer callback once the plaintext is available.
/// Sender: relayer | Receiver: event correlator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecryptionCompleted {
    /// Correlation token of the originating request.
    pub request_id: RequestId,
    /// Subject the plaintext belongs to.
    pub user_id: UserId,
    /// Decrypted integer.
    pub decrypted_value: u64,
    /// Wire tag: `"ivs"` or `"health"`.
    pub data_type: String,
    /// Display-only per-mille value as computed by the contract.
    pub scaled_value: u64,
}

impl DecryptionCompleted {
    /// Build a well-formed record for `kind`.
    ///
    /// Scores carry the contract's per-mille `scaled_value`; health flags
    /// carry the raw flag.
    pub fn new(request_id: RequestId, user_id: UserId, kind: DataKind, decrypted_value: u64) -> Self {
        let scaled_value = match kind {
            DataKind::Score => decrypted_value / 10,
            DataKind::HealthStatus => decrypted_value,
        };
        Self {
            request_id,
            user_id,
            decrypted_value,
            data_type: kind.wire_tag().to_string(),
            scaled_value,
        }
    }
}
