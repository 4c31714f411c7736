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

use std::fs::read_to_string;
use std::io::Read;
use std::io::stdin;

use crate::context::Context;
use crate::error::Fallible;
use crate::error::fail;
use crate::stats::Outcome;
use crate::types::card_id::CardId;
use crate::types::deck_id::DeckId;

/// Apply review outcomes, refresh the analytics, and print the session
/// summary.
///
/// Outcomes come from a JSON file (`-` for standard input) and from the
/// `remembered`/`forgot` id lists, in that order.
pub fn review(
    ctx: &Context,
    file: Option<String>,
    remembered: Vec<i64>,
    forgot: Vec<i64>,
    deck: Option<i64>,
) -> Fallible<()> {
    let mut outcomes: Vec<Outcome> = match file {
        Some(path) => parse_outcomes(&read_input(&path)?)?,
        None => Vec::new(),
    };
    outcomes.extend(
        remembered
            .into_iter()
            .map(|id| Outcome::new(CardId::new(id), true)),
    );
    outcomes.extend(
        forgot
            .into_iter()
            .map(|id| Outcome::new(CardId::new(id), false)),
    );
    if outcomes.is_empty() {
        return fail("no outcomes given.");
    }
    let deck_id = deck.map(DeckId::new).unwrap_or(DeckId::NONE);
    let summary = ctx.engine.apply_outcomes(&ctx.scope, deck_id, &outcomes)?;
    ctx.engine.compute_analytics(&ctx.scope)?;
    let json = serde_json::to_string_pretty(&summary)?;
    println!("{json}");
    Ok(())
}

fn read_input(path: &str) -> Fallible<String> {
    if path == "-" {
        let mut content = String::new();
        stdin().read_to_string(&mut content)?;
        Ok(content)
    } else {
        Ok(read_to_string(path)?)
    }
}

fn parse_outcomes(content: &str) -> Fallible<Vec<Outcome>> {
    let outcomes: Vec<Outcome> = serde_json::from_str(content)?;
    Ok(outcomes)
}
