//! # IVS Runtime
//!
//! Operator entry point for the IVS decryption relay.
//!
//! ## Startup Sequence
//!
//! 1. Install logging (`IVS_LOG_LEVEL`, `RUST_LOG`, `IVS_JSON_LOGS`)
//! 2. Load configuration (file, then environment)
//! 3. Start the relay: bus, simulated engine, correlator, expiry sweep
//! 4. Run the requested command, racing it against Ctrl+C
//! 5. Stop the correlator and print diagnostics

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use ivs_01_score_model::{compute_scores, ContactGraph, InfectionSet};
use ivs_02_decryption::DecryptionApi;
use ivs_runtime::cli::{Cli, Command, Contacts};
use ivs_runtime::report::{self, SummaryRow};
use ivs_runtime::{logging, Relay, RuntimeConfig};
use shared_types::entities::{DataKind, HealthStatus, UserId};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init()?;

    let config = RuntimeConfig::load(cli.config.as_deref()).context("Invalid configuration")?;

    match cli.command {
        Command::Scores {
            contacts,
            infected,
            dmax,
            self_score,
        } => run_scores(&config, contacts, infected, dmax, self_score),
        Command::Simulate => run_relay(&config, None).await,
        Command::Decrypt { user, kind } => run_relay(&config, Some((user, kind))).await,
    }
}

fn run_scores(
    config: &RuntimeConfig,
    contacts: Contacts,
    infected: Vec<UserId>,
    dmax: Option<u32>,
    self_score: Option<String>,
) -> Result<()> {
    let mut score_config = config.score.clone();
    if let Some(d_max) = dmax {
        score_config.d_max = d_max;
    }
    if let Some(policy) = self_score {
        score_config.self_score = policy;
    }
    let params = score_config.params()?;

    let mut graph = ContactGraph::from_edges(contacts.0)?;
    for user in &infected {
        if !graph.contains(*user) {
            graph.register_user(*user)?;
        }
    }

    let infection: InfectionSet = infected.into_iter().collect();
    let sheet = compute_scores(&graph, &infection, params)?;
    print!("{}", report::score_sheet(&sheet));
    Ok(())
}

/// Run the reference scenario against the simulated engine.
///
/// With `single` set, performs one request; otherwise decrypts every user's
/// score and health.
async fn run_relay(config: &RuntimeConfig, single: Option<(UserId, DataKind)>) -> Result<()> {
    let params = config.score.params()?;
    let relay = Relay::start(config);
    relay
        .seed_reference(params)
        .await
        .context("Failed to seed the reference scenario")?;

    let interrupt = async {
        if tokio::signal::ctrl_c().await.is_err() {
            // No signal handler: run to completion
            std::future::pending::<()>().await;
        }
        info!("Shutdown signal received");
    };

    let service = relay.service().clone();
    let work = async move {
        match single {
            Some((user, kind)) => {
                let outcome = service.request_and_await(user, kind).await;
                println!("user {user} {kind}: {outcome}");
                Ok(outcome.is_timeout())
            }
            None => decrypt_everything(service.as_ref()).await,
        }
    };

    let run = relay.run_until(work, interrupt).await?;
    if run.needs_outstanding_report() {
        print!("{}", report::outstanding(&run.outstanding));
    }

    let registry_stats = relay.service().registry().stats().snapshot();
    let correlator_stats = relay.shutdown().await?;
    print!("{}", report::stats(&registry_stats, &correlator_stats));
    Ok(())
}

/// Returns whether any session timed out.
async fn decrypt_everything<A: DecryptionApi + ?Sized>(api: &A) -> Result<bool> {
    let (scores, health) = tokio::join!(
        api.request_all(DataKind::Score),
        api.request_all(DataKind::HealthStatus)
    );
    let scores = scores.context("Failed to list registered users")?;
    let health = health.context("Failed to list registered users")?;

    let rows = report::summary_rows(scores, health);

    let infected = rows
        .iter()
        .filter(|row| {
            row.health
                .rendered()
                .and_then(|rendered| rendered.health())
                .map_or(false, HealthStatus::is_infected)
        })
        .count();
    info!(users = rows.len(), infected, "Decryption sweep finished");

    print!("{}", report::summary(&rows));
    Ok(rows.iter().any(SummaryRow::timed_out))
}
