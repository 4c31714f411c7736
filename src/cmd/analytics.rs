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
use crate::engine::CardStore;
use crate::error::Fallible;

/// Print the latest analytics snapshot, computing one if asked to or if none
/// exists yet.
pub fn print_analytics(ctx: &Context, recompute: bool) -> Fallible<()> {
    let latest = if recompute {
        None
    } else {
        ctx.engine.store().latest_analytics(&ctx.scope)?
    };
    let analytics = match latest {
        Some(analytics) => analytics,
        None => {
            log::debug!(
                "Computing analytics for {} with mastery threshold {}",
                ctx.scope,
                ctx.engine.mastery_threshold()
            );
            ctx.engine.compute_analytics(&ctx.scope)?
        }
    };
    let json = serde_json::to_string_pretty(&analytics)?;
    println!("{json}");
    Ok(())
}
