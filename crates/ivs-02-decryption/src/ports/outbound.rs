//! Driven Ports (SPI - Outbound Dependencies)
//!
//! The encrypted-computation engine and its ledger, seen from the relay.

use crate::error::EngineResult;
use async_trait::async_trait;
use shared_types::entities::{CiphertextHandle, DataKind, RequestId, UserId};

/// Decrypt-and-notify interface of the external engine.
///
/// Completion notifications for accepted requests arrive out of band on the
/// engine's event stream, never as a return value of these calls.
#[async_trait]
pub trait DecryptionEngine: Send + Sync {
    /// Ask the engine to decrypt `kind` for `subject`.
    ///
    /// Resolves once the submitting transaction is confirmed.
    async fn submit_decryption_request(
        &self,
        subject: UserId,
        kind: DataKind,
    ) -> EngineResult<RequestId>;

    /// Users currently registered on the ledger.
    async fn registered_subjects(&self) -> EngineResult<Vec<UserId>>;

    /// Opaque handle of the stored ciphertext. Empty if nothing is stored.
    async fn ciphertext_handle(
        &self,
        subject: UserId,
        kind: DataKind,
    ) -> EngineResult<CiphertextHandle>;
}
