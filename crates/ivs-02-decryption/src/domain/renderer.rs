//! Result rendering: raw decrypted integer to display value and risk tier.
//!
//! Pure and total over the valid input range. Tier boundaries are compared on
//! the integer scale, so 1250 is exactly LOW and never subject to float error.

use crate::error::RenderError;
use serde::{Deserialize, Serialize};
use shared_types::entities::{DataKind, HealthStatus, SCORE_SCALE};
use std::fmt;

/// Lower bounds of each tier on the 10000 scale.
const HIGH_FLOOR: u64 = 5_000;
const MEDIUM_FLOOR: u64 = 2_500;
const LOW_FLOOR: u64 = 1_250;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RiskTier {
    Minimal,
    Low,
    Medium,
    High,
}

impl RiskTier {
    /// Tier for a scaled score. Each bound is inclusive from below.
    pub fn classify(scaled: u64) -> Self {
        match scaled {
            s if s >= HIGH_FLOOR => Self::High,
            s if s >= MEDIUM_FLOOR => Self::Medium,
            s if s >= LOW_FLOOR => Self::Low,
            _ => Self::Minimal,
        }
    }
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::High => "HIGH",
            Self::Medium => "MEDIUM",
            Self::Low => "LOW",
            Self::Minimal => "MINIMAL",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RenderedResult {
    Score {
        /// Raw value on the 10000 scale
        scaled: u64,
        decimal: f64,
        tier: RiskTier,
    },
    Health(HealthStatus),
}

impl RenderedResult {
    pub fn tier(&self) -> Option<RiskTier> {
        match self {
            Self::Score { tier, .. } => Some(*tier),
            Self::Health(_) => None,
        }
    }

    pub fn health(&self) -> Option<HealthStatus> {
        match self {
            Self::Health(status) => Some(*status),
            Self::Score { .. } => None,
        }
    }

    /// Decimal truncated to three places, e.g. `0.125`.
    pub fn display_value(&self) -> String {
        match self {
            Self::Score { scaled, .. } => format_decimal(*scaled),
            Self::Health(status) => status.to_string(),
        }
    }
}

impl fmt::Display for RenderedResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Score { scaled, tier, .. } => write!(f, "{} ({tier})", format_decimal(*scaled)),
            Self::Health(status) => write!(f, "{status}"),
        }
    }
}

fn format_decimal(scaled: u64) -> String {
    let scale = u64::from(SCORE_SCALE);
    format!("{}.{:03}", scaled / scale, (scaled % scale) / 10)
}

/// Render a raw decrypted value for its data kind.
pub fn render(raw: u64, kind: DataKind) -> Result<RenderedResult, RenderError> {
    match kind {
        DataKind::Score => {
            if raw > u64::from(SCORE_SCALE) {
                return Err(RenderError::ScoreOutOfRange(raw));
            }
            Ok(RenderedResult::Score {
                scaled: raw,
                decimal: raw as f64 / f64::from(SCORE_SCALE),
                tier: RiskTier::classify(raw),
            })
        }
        DataKind::HealthStatus => HealthStatus::from_raw(raw)
            .map(RenderedResult::Health)
            .ok_or(RenderError::HealthOutOfRange(raw)),
    }
}
