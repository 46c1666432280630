//! Cross-crate integration scenarios.

pub mod correlation;
pub mod decrypt_flow;
pub mod score_model;
