//! Plain-text reports printed by the CLI.

use ivs_01_score_model::ScoreSheet;
use ivs_02_decryption::domain::RegistryStatsSnapshot;
use ivs_02_decryption::{CorrelatorSnapshot, DecryptionOutcome, PendingSummary};
use shared_types::entities::UserId;
use std::collections::BTreeMap;
use std::fmt::Write;
use tracing::warn;

/// Shown whenever a session times out.
pub const RELAYER_DELAY_HINT: &str = "The relayer may still be processing the request, \
the decryption callback may have failed, or the network may be congested. \
Decryption has been observed to take up to 150 seconds.";

/// One line of the `simulate` summary.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRow {
    pub user: UserId,
    pub score: DecryptionOutcome,
    pub health: DecryptionOutcome,
}

impl SummaryRow {
    pub fn timed_out(&self) -> bool {
        self.score.is_timeout() || self.health.is_timeout()
    }
}

/// Pair score and health outcomes by user, ordered by user id.
///
/// Users missing from either list are logged and left out.
pub fn summary_rows(
    scores: Vec<(UserId, DecryptionOutcome)>,
    health: Vec<(UserId, DecryptionOutcome)>,
) -> Vec<SummaryRow> {
    let mut health: BTreeMap<UserId, DecryptionOutcome> = health.into_iter().collect();
    let mut rows: Vec<SummaryRow> = scores
        .into_iter()
        .filter_map(|(user, score)| match health.remove(&user) {
            Some(health) => Some(SummaryRow {
                user,
                score,
                health,
            }),
            None => {
                warn!(user = %user, "No health result for user, leaving it out of the summary");
                None
            }
        })
        .collect();
    for user in health.keys() {
        warn!(user = %user, "No score result for user, leaving it out of the summary");
    }
    rows.sort_by_key(|row| row.user);
    rows
}

pub fn score_sheet(sheet: &ScoreSheet) -> String {
    let params = sheet.params();
    let mut out = format!(
        "IVS scores (d_max = {}, self score = {})\n{:<6} {:>8}\n",
        params.d_max, params.self_policy, "USER", "SCORE"
    );
    for (user, score) in sheet.iter() {
        let _ = writeln!(out, "{:<6} {:>8}", user.to_string(), score.to_string());
    }
    out
}

pub fn summary(rows: &[SummaryRow]) -> String {
    let mut out = format!("{:<6} {:<28} {}\n", "USER", "SCORE", "HEALTH");
    for row in rows {
        let _ = writeln!(
            out,
            "{:<6} {:<28} {}",
            row.user.to_string(),
            row.score.to_string(),
            row.health
        );
    }
    out
}

/// Outstanding requests plus the relayer-delay hint.
pub fn outstanding(pending: &[PendingSummary]) -> String {
    let mut out = String::new();
    if pending.is_empty() {
        out.push_str("No decryption requests outstanding.\n");
    } else {
        let _ = writeln!(out, "{} decryption request(s) outstanding:", pending.len());
        for entry in pending {
            let _ = writeln!(
                out,
                "  request {} user {} {} age {}s remaining {}s",
                entry.request_id,
                entry.subject,
                entry.kind,
                entry.age.as_secs(),
                entry.remaining.as_secs()
            );
        }
    }
    out.push_str(RELAYER_DELAY_HINT);
    out.push('\n');
    out
}

pub fn stats(registry: &RegistryStatsSnapshot, correlator: &CorrelatorSnapshot) -> String {
    format!(
        "requests: {} registered, {} resolved, {} timed out, {} cancelled\n\
         notifications: {} received, {} duplicate, {} buffered, {} discarded, {} malformed, {} mismatched\n",
        registry.registered,
        registry.resolved,
        registry.timeouts,
        registry.cancelled,
        correlator.received,
        correlator.duplicates,
        correlator.buffered,
        correlator.discarded,
        correlator.malformed,
        correlator.mismatched,
    )
}
