//! Ports module for the decryption relay

pub mod inbound;
pub mod outbound;

pub use inbound::DecryptionApi;
pub use outbound::DecryptionEngine;
