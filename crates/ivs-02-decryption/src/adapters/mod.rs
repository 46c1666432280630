//! Adapters for the relay's ports.
//!
//! - `bus`: correlator source backed by the shared event bus
//! - `simulated`: in-process ledger and relayer implementing `DecryptionEngine`

pub mod bus;
pub mod simulated;

pub use bus::completion_stream;
pub use simulated::{SimulatedEngine, SimulatedEngineConfig};
