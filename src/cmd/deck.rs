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

use std::collections::HashMap;
use std::fs::read_to_string;
use std::path::Path;

use serde::Deserialize;
use serde::Serialize;

use crate::context::Context;
use crate::db::NewCard;
use crate::error::Fallible;
use crate::error::fail;
use crate::types::deck_id::DeckId;
use crate::types::timestamp::Timestamp;

/// A deck definition file.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct DeckFile {
    name: String,
    #[serde(default)]
    cards: Vec<NewCard>,
}

fn parse_deck_file(content: &str) -> Fallible<DeckFile> {
    let deck: DeckFile = toml::from_str(content)?;
    if deck.name.trim().is_empty() {
        return fail("deck name is empty.");
    }
    Ok(deck)
}

/// Create a deck from a TOML file.
pub fn add_deck(ctx: &Context, path: &Path) -> Fallible<()> {
    if !path.exists() {
        return fail("deck file does not exist.");
    }
    let deck = parse_deck_file(&read_to_string(path)?)?;
    let deck_id = ctx
        .engine
        .store()
        .create_deck(&ctx.scope, &deck.name, &deck.cards, Timestamp::now())?;
    println!(
        "Created deck {deck_id} ({}) with {} cards.",
        deck.name,
        deck.cards.len()
    );
    Ok(())
}

#[derive(Serialize)]
struct DeckSummary {
    deck_id: DeckId,
    name: String,
    card_count: usize,
    progress: f64,
}

/// Print every deck in scope with its progress.
pub fn print_decks(ctx: &Context) -> Fallible<()> {
    let progress: HashMap<DeckId, (usize, f64)> = ctx
        .engine
        .deck_progress(&ctx.scope)?
        .into_iter()
        .map(|p| (p.deck_id, (p.card_count, p.progress)))
        .collect();
    let decks: Vec<DeckSummary> = ctx
        .engine
        .store()
        .deck_names(&ctx.scope)?
        .into_iter()
        .map(|(deck_id, name)| {
            let (card_count, progress) = progress.get(&deck_id).copied().unwrap_or((0, 0.0));
            DeckSummary {
                deck_id,
                name,
                card_count,
                progress,
            }
        })
        .collect();
    let json = serde_json::to_string_pretty(&decks)?;
    println!("{json}");
    Ok(())
}
