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

use std::collections::BTreeMap;

use serde::Serialize;

use crate::types::card_stats::CardPool;
use crate::types::card_stats::correct_from_accuracy;
use crate::types::deck_id::DeckId;
use crate::types::timestamp::Timestamp;

/// Accuracy at or above which a card counts as mastered.
pub const DEFAULT_MASTERY_THRESHOLD: f64 = 0.9;

/// A snapshot of progress over a whole pool.
#[derive(Clone, PartialEq, Debug, Serialize)]
pub struct Analytics {
    /// Cards reviewed at least once.
    pub total_cards_studied: usize,
    pub total_correct_answers: u64,
    pub cards_mastered: usize,
    /// Unweighted mean accuracy over every card, reviewed or not.
    pub overall_average_progress: f64,
    pub updated_at: Timestamp,
}

/// Reduce a pool to an analytics snapshot.
pub fn compute_analytics(pool: &CardPool, mastery_threshold: f64, now: Timestamp) -> Analytics {
    let mut total_cards_studied = 0;
    let mut total_correct_answers: u64 = 0;
    let mut cards_mastered = 0;
    let mut accuracy_sum = 0.0;
    for card in pool.cards() {
        let stats = &card.stats;
        if stats.total_attempts() > 0 {
            total_cards_studied += 1;
        }
        total_correct_answers +=
            u64::from(correct_from_accuracy(stats.accuracy(), stats.total_attempts()));
        if stats.accuracy() >= mastery_threshold {
            cards_mastered += 1;
        }
        accuracy_sum += stats.accuracy();
    }
    let overall_average_progress = if pool.is_empty() {
        0.0
    } else {
        accuracy_sum / pool.len() as f64
    };
    Analytics {
        total_cards_studied,
        total_correct_answers,
        cards_mastered,
        overall_average_progress,
        updated_at: now,
    }
}

/// Progress of a single deck.
#[derive(Clone, PartialEq, Debug, Serialize)]
pub struct DeckProgress {
    pub deck_id: DeckId,
    pub card_count: usize,
    /// Mean accuracy of the deck's cards.
    pub progress: f64,
}

/// Per-deck progress, ordered by deck id.
pub fn deck_progress(pool: &CardPool) -> Vec<DeckProgress> {
    let mut decks: BTreeMap<DeckId, (usize, f64)> = BTreeMap::new();
    for card in pool.cards() {
        let entry = decks.entry(card.deck_id).or_insert((0, 0.0));
        entry.0 += 1;
        entry.1 += card.stats.accuracy();
    }
    decks
        .into_iter()
        .map(|(deck_id, (card_count, sum))| DeckProgress {
            deck_id,
            card_count,
            progress: sum / card_count as f64,
        })
        .collect()
}
