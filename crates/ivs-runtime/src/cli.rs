//! Command-line interface.

use clap::{Parser, Subcommand};
use shared_types::entities::{DataKind, UserId};
use std::path::PathBuf;

/// IVS decryption relay
#[derive(Parser, Debug)]
#[command(name = "ivs-runtime")]
#[command(about = "Infection Vulnerability Score relay: scores and correlated decryption")]
pub struct Cli {
    /// TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the score sheet of a contact graph using the plaintext model
    Scores {
        /// Contact edges, e.g. `1-2,1-3`
        #[arg(long, value_parser = parse_contacts, default_value = "")]
        contacts: Contacts,

        /// Infected users, e.g. `1,4`
        #[arg(long, value_delimiter = ',')]
        infected: Vec<UserId>,

        /// Maximum hop distance (overrides the config)
        #[arg(long)]
        dmax: Option<u32>,

        /// `zero`, `excluded` or a fraction (overrides the config)
        #[arg(long)]
        self_score: Option<String>,
    },

    /// Run the reference scenario and decrypt every user's score and health
    Simulate,

    /// Run the reference scenario and perform a single decryption
    Decrypt {
        #[arg(long)]
        user: UserId,

        /// `score` or `health`
        #[arg(long, default_value = "score")]
        kind: DataKind,
    },
}

/// Parsed `--contacts` value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Contacts(pub Vec<(UserId, UserId)>);

pub fn parse_contacts(raw: &str) -> Result<Contacts, String> {
    raw.split(',')
        .map(str::trim)
        .filter(|edge| !edge.is_empty())
        .map(|edge| {
            let (a, b) = edge
                .split_once('-')
                .ok_or_else(|| format!("contact {edge:?} is not of the form A-B"))?;
            let a = a.parse::<UserId>().map_err(|err| err.to_string())?;
            let b = b.parse::<UserId>().map_err(|err| err.to_string())?;
            Ok((a, b))
        })
        .collect::<Result<Vec<_>, String>>()
        .map(Contacts)
}
