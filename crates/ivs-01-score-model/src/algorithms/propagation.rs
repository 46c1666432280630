//! Breadth-first risk propagation.
//!
//! O(V + E) per multi-source pass. Traversal stops expanding at `d_max`, so
//! nodes beyond the propagation radius are never visited.

use crate::domain::errors::{ScoreModelError, ScoreModelResult};
use crate::domain::graph::ContactGraph;
use crate::domain::infection::InfectionSet;
use crate::domain::score::{decay, ScaledScore, ScoreParams, ScoreSheet, SelfScorePolicy};
use shared_types::entities::UserId;
use std::collections::{BTreeMap, VecDeque};
use tracing::debug;

/// Hop distance from the nearest source for every node within `d_max`.
///
/// Sources themselves are at distance 0. Unknown sources are ignored.
pub fn hop_distances<I>(graph: &ContactGraph, sources: I, d_max: u32) -> BTreeMap<UserId, u32>
where
    I: IntoIterator<Item = UserId>,
{
    let mut distances = BTreeMap::new();
    let mut queue = VecDeque::new();

    for source in sources {
        if graph.contains(source) && !distances.contains_key(&source) {
            distances.insert(source, 0);
            queue.push_back(source);
        }
    }

    while let Some(node) = queue.pop_front() {
        let Some(&depth) = distances.get(&node) else {
            continue;
        };
        if depth >= d_max {
            continue;
        }
        for neighbor in graph.neighbors(node) {
            if !distances.contains_key(&neighbor) {
                distances.insert(neighbor, depth + 1);
                queue.push_back(neighbor);
            }
        }
    }

    distances
}

/// Distance from `user` to the closest infected node other than itself,
/// if one lies within `d_max`.
pub fn nearest_other_infected(
    graph: &ContactGraph,
    infected: &InfectionSet,
    user: UserId,
    d_max: u32,
) -> Option<u32> {
    let mut seen = BTreeMap::from([(user, 0u32)]);
    let mut queue = VecDeque::from([user]);

    while let Some(node) = queue.pop_front() {
        let depth = seen.get(&node).copied()?;
        if depth >= d_max {
            continue;
        }
        for neighbor in graph.neighbors(node) {
            if seen.contains_key(&neighbor) {
                continue;
            }
            // BFS order: the first infected hit is the closest
            if infected.is_infected(neighbor) {
                return Some(depth + 1);
            }
            seen.insert(neighbor, depth + 1);
            queue.push_back(neighbor);
        }
    }

    None
}

/// Compute the score of every registered user from scratch.
///
/// Deterministic and stateless: the same inputs always yield the same sheet.
pub fn compute_scores(
    graph: &ContactGraph,
    infected: &InfectionSet,
    params: ScoreParams,
) -> ScoreModelResult<ScoreSheet> {
    if let Some(unknown) = infected.iter().find(|user| !graph.contains(*user)) {
        return Err(ScoreModelError::UnknownUser(unknown));
    }

    let distances = hop_distances(graph, infected.iter(), params.d_max);
    let mut scores = BTreeMap::new();

    for user in graph.users() {
        if !infected.is_infected(user) {
            let score = distances
                .get(&user)
                .map_or(ScaledScore::ZERO, |&distance| decay(distance));
            scores.insert(user, score);
            continue;
        }

        let own = match params.self_policy {
            SelfScorePolicy::Excluded => continue,
            SelfScorePolicy::Zero => ScaledScore::ZERO,
            SelfScorePolicy::Fixed(score) => score,
        };
        let from_others = nearest_other_infected(graph, infected, user, params.d_max)
            .map_or(ScaledScore::ZERO, decay);
        scores.insert(user, own.max(from_others));
    }

    debug!(
        users = scores.len(),
        infected = infected.len(),
        d_max = params.d_max,
        "Scores computed"
    );

    Ok(ScoreSheet::new(scores, params))
}
