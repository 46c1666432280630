//! # IVS Relay Test Suite
//!
//! Cross-crate scenarios that need more than one crate to exercise.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── correlation.rs   # sessions + correlator against a hand-driven relayer
//!     ├── decrypt_flow.rs  # full protocol over the bus with the simulated engine
//!     └── score_model.rs   # reference graph scenarios and CLI rendering
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p ivs-tests
//! cargo test -p ivs-tests integration::correlation::
//! ```

pub mod integration;
