//! Score value objects.
//!
//! Scores travel as integers scaled by [`SCORE_SCALE`]: 0.5 is 5000,
//! 0.25 is 2500, 0.125 is 1250.

use super::errors::{ScoreModelError, ScoreModelResult};
use serde::{Deserialize, Serialize};
use shared_types::entities::{UserId, SCORE_SCALE};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Largest hop count whose decay still rounds to a non-zero scaled value.
const MAX_NONZERO_DECAY_DEPTH: u32 = 14;

/// A score in [0, 1] scaled to an integer in [0, 10000].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScaledScore(u32);

impl ScaledScore {
    pub const ZERO: Self = Self(0);
    pub const ONE: Self = Self(SCORE_SCALE);

    pub fn new(raw: u64) -> ScoreModelResult<Self> {
        if raw > u64::from(SCORE_SCALE) {
            return Err(ScoreModelError::ScoreOutOfRange(raw));
        }
        // Bounded by SCORE_SCALE above
        Ok(Self(raw as u32))
    }

    /// Round a fraction in [0, 1] to the scaled representation.
    pub fn from_fraction(fraction: f64) -> Option<Self> {
        if !fraction.is_finite() || !(0.0..=1.0).contains(&fraction) {
            return None;
        }
        Some(Self((fraction * f64::from(SCORE_SCALE)).round() as u32))
    }

    pub fn raw(self) -> u32 {
        self.0
    }

    pub fn as_fraction(self) -> f64 {
        f64::from(self.0) / f64::from(SCORE_SCALE)
    }
}

impl fmt::Display for ScaledScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:04}", self.0 / SCORE_SCALE, self.0 % SCORE_SCALE)
    }
}

/// Scaled decay for a hop distance: `round(2^-d * 10000)`.
///
/// Distance 0 yields the full scale; the model never applies it on its own,
/// see [`SelfScorePolicy`].
pub fn decay(distance: u32) -> ScaledScore {
    if distance > MAX_NONZERO_DECAY_DEPTH {
        return ScaledScore::ZERO;
    }
    let half_step = (1u32 << distance) >> 1;
    ScaledScore((SCORE_SCALE + half_step) >> distance)
}

/// Score assigned to an infected user for its own infection.
///
/// Contributions from other infected users within `d_max` still apply on top
/// of `Zero` and `Fixed`; `Excluded` leaves infected users out of the sheet.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SelfScorePolicy {
    Zero,
    Fixed(ScaledScore),
    Excluded,
}

impl fmt::Display for SelfScorePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Zero => f.write_str("zero"),
            Self::Fixed(score) => write!(f, "{score}"),
            Self::Excluded => f.write_str("excluded"),
        }
    }
}

impl FromStr for SelfScorePolicy {
    type Err = ScoreModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "zero" => Ok(Self::Zero),
            "excluded" | "exclude" => Ok(Self::Excluded),
            other => other
                .parse::<f64>()
                .ok()
                .and_then(ScaledScore::from_fraction)
                .map(Self::Fixed)
                .ok_or_else(|| ScoreModelError::InvalidSelfScorePolicy(s.to_string())),
        }
    }
}

/// Inputs to one compute cycle besides the graph itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScoreParams {
    /// Maximum hop distance that contributes risk.
    pub d_max: u32,
    pub self_policy: SelfScorePolicy,
}

impl ScoreParams {
    pub fn new(d_max: u32, self_policy: SelfScorePolicy) -> Self {
        Self { d_max, self_policy }
    }
}

/// Result of a full compute cycle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScoreSheet {
    scores: BTreeMap<UserId, ScaledScore>,
    params: ScoreParams,
}

impl ScoreSheet {
    pub(crate) fn new(scores: BTreeMap<UserId, ScaledScore>, params: ScoreParams) -> Self {
        Self { scores, params }
    }

    /// `None` for unknown users and for infected users under `Excluded`.
    pub fn get(&self, user: UserId) -> Option<ScaledScore> {
        self.scores.get(&user).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (UserId, ScaledScore)> + '_ {
        self.scores.iter().map(|(user, score)| (*user, *score))
    }

    pub fn params(&self) -> ScoreParams {
        self.params
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}
