//! # Shared Types Crate
//!
//! This crate contains the identifiers and wire records that cross the
//! boundary between the IVS client and the external ledger/FHE engine.
//!
//! ## Design Principles
//!
//! - **Opaque Correlation**: `RequestId` is issued by the engine and is only
//!   ever compared and displayed, never interpreted.
//! - **Closed Data Kinds**: every decrypted payload is tagged `Score` or
//!   `HealthStatus`; unknown wire tags are rejected at decode time.
//! - **Wire Fidelity**: `ipc` records mirror the contract events field for
//!   field, including the legacy `scaled_value`.

pub mod entities;
pub mod errors;
pub mod ipc;

pub use entities::*;
pub use errors::*;
pub use ipc::*;
