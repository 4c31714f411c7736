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

use serde::Deserialize;
use serde::Serialize;

use crate::types::card_id::CardId;
use crate::types::card_stats::CardStats;
use crate::types::card_stats::correct_from_accuracy;
use crate::types::deck_id::DeckId;
use crate::types::timestamp::Timestamp;

/// The result of reviewing one card.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Deserialize)]
pub struct Outcome {
    pub card_id: CardId,
    pub remembered: bool,
}

impl Outcome {
    pub fn new(card_id: CardId, remembered: bool) -> Self {
        Self {
            card_id,
            remembered,
        }
    }
}

/// Apply one review outcome to a card's stats.
///
/// The prior correct count is reconstructed from the stored accuracy with
/// the same rounding rule the analytics use, then accuracy is recomputed
/// from the new integer counts.
pub fn apply_outcome(stats: &CardStats, remembered: bool, now: Timestamp) -> CardStats {
    let prior_correct = correct_from_accuracy(stats.accuracy(), stats.total_attempts());
    debug_assert_eq!(prior_correct, stats.correct_answers());
    let new_total = stats.total_attempts().saturating_add(1);
    let new_correct = prior_correct.saturating_add(u32::from(remembered));
    CardStats::from_counts(stats.id(), new_total, new_correct, Some(now))
}

/// Tally of a completed batch of outcomes.
#[derive(Clone, Default, PartialEq, Debug, Serialize)]
pub struct SessionSummary {
    /// Outcomes that matched a known card.
    pub total_cards: usize,
    pub passed_count: usize,
    pub missed_count: usize,
    /// Outcomes referencing cards that no longer exist.
    pub skipped_count: usize,
    /// Percentage of matched outcomes that were remembered, to two decimals.
    pub accuracy_percentage: f64,
    pub passed_cards: Vec<CardId>,
    pub missed_cards: Vec<CardId>,
}

impl SessionSummary {
    pub fn record(&mut self, card_id: CardId, remembered: bool) {
        if remembered {
            self.passed_count += 1;
            self.passed_cards.push(card_id);
        } else {
            self.missed_count += 1;
            self.missed_cards.push(card_id);
        }
        self.total_cards += 1;
        let ratio = self.passed_count as f64 / self.total_cards as f64;
        self.accuracy_percentage = (ratio * 100.0 * 100.0).round() / 100.0;
    }

    pub fn record_skipped(&mut self, card_id: CardId) {
        log::debug!("Skipping outcome for unknown card {card_id}");
        self.skipped_count += 1;
    }
}

/// A completed session, as kept in the history.
#[derive(Clone, PartialEq, Debug, Serialize)]
pub struct SessionHistoryEntry {
    pub deck_id: DeckId,
    pub completed_at: Timestamp,
    #[serde(flatten)]
    pub summary: SessionSummary,
}
