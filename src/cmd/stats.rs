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

use serde::Serialize;

use crate::context::Context;
use crate::error::Fallible;
use crate::selection::SelectionCounts;
use crate::selection::SelectionParams;
use crate::types::deck_id::DeckId;
use crate::types::policy::Policy;

/// Print the selection counts for one policy, or for every policy when none
/// is given.
pub fn print_selection_stats(
    ctx: &Context,
    policy: Option<String>,
    decks: Vec<i64>,
    threshold: Option<f64>,
) -> Fallible<()> {
    let params = SelectionParams {
        deck_ids: Some(decks.into_iter().map(DeckId::new).collect()),
        limit: ctx.config.default_limit,
        threshold: Some(threshold.unwrap_or(ctx.config.unfamiliar_threshold)),
    };
    let names: Vec<String> = match policy {
        Some(name) => vec![name],
        None => Policy::ALL
            .iter()
            .map(|policy| policy.as_str().to_string())
            .collect(),
    };
    let mut stats = Vec::new();
    for name in names {
        let counts = ctx.engine.get_selection_stats(&name, &ctx.scope, &params)?;
        stats.push(PolicyStats {
            policy: name,
            counts,
        });
    }
    let stats_json = serde_json::to_string_pretty(&stats)?;
    println!("{stats_json}");
    Ok(())
}

#[derive(Serialize)]
struct PolicyStats {
    policy: String,
    #[serde(flatten)]
    counts: SelectionCounts,
}
