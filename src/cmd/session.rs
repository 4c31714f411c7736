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

use crate::context::Context;
use crate::error::Fallible;
use crate::selection::SelectionParams;
use crate::types::deck_id::DeckId;

/// Build a study session and print it as JSON.
pub fn print_session(
    ctx: &Context,
    policy: &str,
    decks: Vec<i64>,
    limit: Option<usize>,
    threshold: Option<f64>,
) -> Fallible<()> {
    let params = SelectionParams {
        deck_ids: Some(decks.into_iter().map(DeckId::new).collect()),
        limit: limit.unwrap_or(ctx.config.default_limit),
        threshold: Some(threshold.unwrap_or(ctx.config.unfamiliar_threshold)),
    };
    match ctx.engine.build_session(policy, &ctx.scope, &params) {
        Ok(session) => {
            let json = serde_json::to_string_pretty(&session)?;
            println!("{json}");
            Ok(())
        }
        Err(e) if e.engine_error().is_some_and(|kind| kind.is_not_found()) => {
            println!("No cards found for the specified criteria.");
            Ok(())
        }
        Err(e) => Err(e),
    }
}
