//! Domain module for the score model
//!
//! Contains the graph inputs, score value objects, and errors.

pub mod errors;
pub mod graph;
pub mod infection;
pub mod score;

pub use errors::*;
pub use graph::ContactGraph;
pub use infection::InfectionSet;
pub use score::*;
