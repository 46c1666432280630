//! # IVS-01: Score Model
//!
//! Plaintext reference of the Infection Vulnerability Score propagation.
//! The production computation runs inside the encrypted engine; this crate
//! defines the numeric contract that decrypted values are rendered against.
//!
//! ## Model
//!
//! ```text
//! score(v) = max { decay(dist(u, v)) : u infected, dist(u, v) <= d_max }
//! decay(d) = 2^-d               (scaled: round(2^-d * 10000))
//! score(v) = 0                  when no infected node is within d_max hops
//! ```
//!
//! The distance-0 contribution of an infected node to itself is not fixed by
//! the model. Callers choose it explicitly through [`SelfScorePolicy`].
//!
//! ## Architecture
//!
//! - **Domain**: ContactGraph, InfectionSet, ScaledScore, ScoreSheet
//! - **Algorithms**: pruned multi-source BFS, score computation

pub mod algorithms;
pub mod domain;

pub use algorithms::propagation::{compute_scores, hop_distances, nearest_other_infected};
pub use domain::errors::{ScoreModelError, ScoreModelResult};
pub use domain::graph::ContactGraph;
pub use domain::infection::InfectionSet;
pub use domain::score::{decay, ScaledScore, ScoreParams, ScoreSheet, SelfScorePolicy};
