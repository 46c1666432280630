//! Algorithms module for the score model
//!
//! Contains:
//! - Pruned multi-source BFS
//! - Score sheet computation

pub mod propagation;

pub use propagation::{compute_scores, hop_distances, nearest_other_infected};
