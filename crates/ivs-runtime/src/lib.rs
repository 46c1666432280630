//! # IVS Runtime Library
//!
//! Configuration, logging, wiring and reporting behind the `ivs-runtime`
//! binary. Exposed as a library so integration tests can drive the same
//! wiring the binary uses.

pub mod cli;
pub mod config;
pub mod logging;
pub mod report;
pub mod scenario;

pub use config::{EngineConfig, RuntimeConfig, ScoreConfig};
pub use scenario::{Relay, RunReport, REFERENCE_CONTACTS, REFERENCE_INFECTED, REFERENCE_USERS};
