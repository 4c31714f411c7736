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

use rand::Rng;

use crate::analytics::Analytics;
use crate::analytics::DeckProgress;
use crate::analytics::compute_analytics;
use crate::analytics::deck_progress;
use crate::error::Fallible;
use crate::selection::SelectionCounts;
use crate::selection::SelectionParams;
use crate::selection::selection_counts;
use crate::session::SessionRecord;
use crate::session::build_session;
use crate::stats::Outcome;
use crate::stats::SessionHistoryEntry;
use crate::stats::SessionSummary;
use crate::stats::apply_outcome;
use crate::types::card_id::CardId;
use crate::types::card_stats::CardPool;
use crate::types::card_stats::CardStats;
use crate::types::deck_id::DeckId;
use crate::types::policy::Policy;
use crate::types::scope::Scope;
use crate::types::timestamp::Timestamp;

/// Storage the engine reads pools from and writes results to.
pub trait CardStore {
    /// Cards in `scope`, optionally restricted to `deck_ids`.
    fn fetch_scoped_pool(&self, scope: &Scope, deck_ids: Option<&[DeckId]>) -> Fallible<CardPool>;

    /// Stats of a card in `scope`, or `None` if there is no such card.
    fn get_card_stats(&self, scope: &Scope, card_id: CardId) -> Fallible<Option<CardStats>>;

    fn persist_card_stats(&self, stats: &CardStats) -> Fallible<()>;

    /// Read, update and write back one card's stats.
    ///
    /// Returns `None` if the card is not in `scope`. Implementations that can
    /// be shared between threads must make the read and write atomic.
    fn update_card_stats(
        &self,
        scope: &Scope,
        card_id: CardId,
        update: &dyn Fn(&CardStats) -> CardStats,
    ) -> Fallible<Option<CardStats>> {
        match self.get_card_stats(scope, card_id)? {
            Some(stats) => {
                let updated = update(&stats);
                self.persist_card_stats(&updated)?;
                Ok(Some(updated))
            }
            None => Ok(None),
        }
    }

    fn persist_analytics_snapshot(&self, scope: &Scope, analytics: &Analytics) -> Fallible<()>;

    /// The most recent analytics snapshot for `scope`.
    fn latest_analytics(&self, scope: &Scope) -> Fallible<Option<Analytics>>;

    /// Store a completed session in the history.
    fn record_session(
        &self,
        scope: &Scope,
        deck_id: DeckId,
        summary: &SessionSummary,
        completed_at: Timestamp,
    ) -> Fallible<()>;

    /// Completed sessions in `scope`, most recent first.
    fn session_history(&self, scope: &Scope) -> Fallible<Vec<SessionHistoryEntry>>;

    /// Number of decks in `scope`, including empty ones.
    fn count_decks(&self, scope: &Scope) -> Fallible<usize>;
}

/// The operations offered to callers, on top of a [`CardStore`].
pub struct Engine<S: CardStore> {
    store: S,
    mastery_threshold: f64,
}

impl<S: CardStore> Engine<S> {
    pub fn new(store: S, mastery_threshold: f64) -> Self {
        Self {
            store,
            mastery_threshold,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn mastery_threshold(&self) -> f64 {
        self.mastery_threshold
    }

    /// Build a study session using the process-wide random generator.
    pub fn build_session(
        &self,
        policy_name: &str,
        scope: &Scope,
        params: &SelectionParams,
    ) -> Fallible<SessionRecord> {
        self.build_session_with(policy_name, scope, params, &mut rand::rng())
    }

    pub fn build_session_with<R: Rng + ?Sized>(
        &self,
        policy_name: &str,
        scope: &Scope,
        params: &SelectionParams,
        rng: &mut R,
    ) -> Fallible<SessionRecord> {
        // Resolve before touching the store.
        Policy::resolve(policy_name)?;
        let pool = self.store.fetch_scoped_pool(scope, params.deck_ids())?;
        log::debug!("Fetched {} cards for {scope}", pool.len());
        let mut session = build_session(policy_name, &pool, params, Timestamp::now(), rng)?;
        if session.policy == Policy::All {
            session.counts.total_decks = Some(self.store.count_decks(scope)?);
        }
        Ok(session)
    }

    /// Apply review outcomes one card at a time and record the session.
    ///
    /// Outcomes for cards outside `scope` are skipped. Each card is
    /// committed on its own, so a store error stops the batch with the
    /// earlier cards already updated and no session recorded.
    pub fn apply_outcomes(
        &self,
        scope: &Scope,
        deck_id: DeckId,
        outcomes: &[Outcome],
    ) -> Fallible<SessionSummary> {
        let now = Timestamp::now();
        let mut summary = SessionSummary::default();
        for outcome in outcomes {
            let remembered = outcome.remembered;
            let updated = self.store.update_card_stats(scope, outcome.card_id, &|stats| {
                apply_outcome(stats, remembered, now)
            })?;
            match updated {
                Some(_) => summary.record(outcome.card_id, remembered),
                None => summary.record_skipped(outcome.card_id),
            }
        }
        self.store.record_session(scope, deck_id, &summary, now)?;
        log::info!(
            "Session completed: {} passed, {} missed, {} skipped",
            summary.passed_count,
            summary.missed_count,
            summary.skipped_count
        );
        Ok(summary)
    }

    /// Compute a fresh analytics snapshot for `scope` and store it.
    pub fn compute_analytics(&self, scope: &Scope) -> Fallible<Analytics> {
        let pool = self.store.fetch_scoped_pool(scope, None)?;
        let analytics = compute_analytics(&pool, self.mastery_threshold, Timestamp::now());
        self.store.persist_analytics_snapshot(scope, &analytics)?;
        Ok(analytics)
    }

    pub fn get_selection_stats(
        &self,
        policy_name: &str,
        scope: &Scope,
        params: &SelectionParams,
    ) -> Fallible<SelectionCounts> {
        let policy = Policy::resolve(policy_name)?;
        let pool = self.store.fetch_scoped_pool(scope, params.deck_ids())?;
        let mut counts = selection_counts(policy, &pool, params)?;
        if policy == Policy::All {
            counts.total_decks = Some(self.store.count_decks(scope)?);
        }
        Ok(counts)
    }

    pub fn deck_progress(&self, scope: &Scope) -> Fallible<Vec<DeckProgress>> {
        let pool = self.store.fetch_scoped_pool(scope, None)?;
        Ok(deck_progress(&pool))
    }
}
