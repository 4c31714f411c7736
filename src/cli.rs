// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::path::PathBuf;

use clap::Parser;
use clap::Subcommand;

use crate::cmd::analytics::print_analytics;
use crate::cmd::deck::add_deck;
use crate::cmd::deck::print_decks;
use crate::cmd::history::print_history;
use crate::cmd::review::review;
use crate::cmd::session::print_session;
use crate::cmd::stats::print_selection_stats;
use crate::context::Context;
use crate::error::Fallible;

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the data directory. Defaults to the current directory.
    #[arg(long, global = true)]
    directory: Option<String>,
    /// Tenant to act as. Overrides the config file.
    #[arg(long, global = true)]
    tenant: Option<String>,
    /// Deck language. Overrides the config file.
    #[arg(long, global = true)]
    language: Option<String>,
    /// Accuracy at which a card counts as mastered. Overrides the config file.
    #[arg(long, global = true)]
    mastery_threshold: Option<f64>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create a deck from a TOML file.
    AddDeck {
        /// Path to the deck file.
        file: PathBuf,
    },
    /// List decks with their progress.
    Decks,
    /// Build a study session.
    Session {
        /// Selection policy: all, by_decks, unfamiliar, or newly_added.
        policy: String,
        /// Restrict to this deck. May be repeated.
        #[arg(long = "deck")]
        decks: Vec<i64>,
        /// Maximum number of cards.
        #[arg(long)]
        limit: Option<usize>,
        /// Accuracy threshold for the unfamiliar policy.
        #[arg(long)]
        threshold: Option<f64>,
    },
    /// Show how many cards each policy would draw from.
    Stats {
        /// Selection policy. Defaults to all of them.
        policy: Option<String>,
        /// Restrict to this deck. May be repeated.
        #[arg(long = "deck")]
        decks: Vec<i64>,
        /// Accuracy threshold for the unfamiliar count.
        #[arg(long)]
        threshold: Option<f64>,
    },
    /// Record the results of a study session.
    Review {
        /// JSON file of outcomes, or `-` for standard input.
        #[arg(long)]
        file: Option<String>,
        /// Id of a card that was remembered. May be repeated.
        #[arg(long)]
        remembered: Vec<i64>,
        /// Id of a card that was forgotten. May be repeated.
        #[arg(long)]
        forgot: Vec<i64>,
        /// The deck the session was started from.
        #[arg(long)]
        deck: Option<i64>,
    },
    /// Show completed sessions, most recent first.
    History,
    /// Show progress analytics.
    Analytics {
        /// Compute a fresh snapshot instead of showing the latest one.
        #[arg(long)]
        recompute: bool,
    },
}

pub fn entrypoint() -> Fallible<()> {
    let cli: Cli = Cli::parse();
    let ctx = Context::new(
        cli.directory,
        cli.tenant,
        cli.language,
        cli.mastery_threshold,
    )?;
    match cli.command {
        Command::AddDeck { file } => add_deck(&ctx, &file),
        Command::Decks => print_decks(&ctx),
        Command::Session {
            policy,
            decks,
            limit,
            threshold,
        } => print_session(&ctx, &policy, decks, limit, threshold),
        Command::Stats {
            policy,
            decks,
            threshold,
        } => print_selection_stats(&ctx, policy, decks, threshold),
        Command::Review {
            file,
            remembered,
            forgot,
            deck,
        } => review(&ctx, file, remembered, forgot, deck),
        Command::History => print_history(&ctx),
        Command::Analytics { recompute } => print_analytics(&ctx, recompute),
    }
}
