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

use crate::types::card_id::CardId;
use crate::types::deck_id::DeckId;
use crate::types::timestamp::Timestamp;

/// Reconstruct the number of correct answers from an accuracy ratio.
///
/// This is the single rounding rule shared by the stats updater and the
/// analytics aggregator.
pub fn correct_from_accuracy(accuracy: f64, total_attempts: u32) -> u32 {
    let correct = (accuracy * f64::from(total_attempts)).round();
    if correct <= 0.0 {
        0
    } else {
        (correct as u32).min(total_attempts)
    }
}

/// A card's learning state.
///
/// Values are immutable: the stats updater returns a new value for every
/// review, and `accuracy` is always derived from the integer counts.
#[derive(Clone, PartialEq, Debug, Serialize)]
pub struct CardStats {
    id: CardId,
    accuracy: f64,
    total_attempts: u32,
    correct_answers: u32,
    last_reviewed_at: Option<Timestamp>,
}

impl CardStats {
    /// Stats for a card that has never been reviewed.
    #[cfg(test)]
    pub fn new(id: CardId) -> Self {
        Self {
            id,
            accuracy: 0.0,
            total_attempts: 0,
            correct_answers: 0,
            last_reviewed_at: None,
        }
    }

    /// Build stats from integer counts. `correct_answers` is clamped to
    /// `total_attempts`.
    pub fn from_counts(
        id: CardId,
        total_attempts: u32,
        correct_answers: u32,
        last_reviewed_at: Option<Timestamp>,
    ) -> Self {
        let correct_answers = correct_answers.min(total_attempts);
        let accuracy = if total_attempts > 0 {
            f64::from(correct_answers) / f64::from(total_attempts)
        } else {
            0.0
        };
        Self {
            id,
            accuracy,
            total_attempts,
            correct_answers,
            last_reviewed_at,
        }
    }

    /// Rebuild stats from persisted columns.
    ///
    /// The stored accuracy is authoritative: rows written by older clients
    /// never maintained `correct_answers`, so the count is reconstructed from
    /// `accuracy * total_attempts` and a mismatch is only logged.
    pub fn restore(
        id: CardId,
        accuracy: f64,
        total_attempts: u32,
        correct_answers: u32,
        last_reviewed_at: Option<Timestamp>,
    ) -> Self {
        let accuracy = if accuracy.is_finite() {
            accuracy.clamp(0.0, 1.0)
        } else {
            0.0
        };
        let reconstructed = correct_from_accuracy(accuracy, total_attempts);
        if reconstructed != correct_answers {
            log::warn!(
                "card {id}: stored correct_answers={correct_answers} disagrees with accuracy {accuracy:.4} over {total_attempts} attempts, using {reconstructed}"
            );
        }
        Self::from_counts(id, total_attempts, reconstructed, last_reviewed_at)
    }

    pub fn id(&self) -> CardId {
        self.id
    }

    pub fn accuracy(&self) -> f64 {
        self.accuracy
    }

    pub fn total_attempts(&self) -> u32 {
        self.total_attempts
    }

    pub fn correct_answers(&self) -> u32 {
        self.correct_answers
    }

    pub fn last_reviewed_at(&self) -> Option<Timestamp> {
        self.last_reviewed_at
    }

    pub fn is_new(&self) -> bool {
        self.total_attempts == 0
    }
}

/// A card as it appears in a pool: its stats, its owning deck, and the text
/// shown during a session.
#[derive(Clone, PartialEq, Debug, Serialize)]
pub struct Card {
    pub deck_id: DeckId,
    pub front: String,
    pub back: String,
    #[serde(flatten)]
    pub stats: CardStats,
}

impl Card {
    pub fn id(&self) -> CardId {
        self.stats.id()
    }
}

/// The candidate cards visible to one selection or aggregation call.
///
/// Pools are already scoped to one tenant and language by whoever builds
/// them.
#[derive(Clone, Default, Debug)]
pub struct CardPool {
    cards: Vec<Card>,
}

impl CardPool {
    pub fn new(cards: Vec<Card>) -> Self {
        Self { cards }
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn get(&self, id: CardId) -> Option<&Card> {
        self.cards.iter().find(|card| card.id() == id)
    }

    /// Cards owned by one of `deck_ids`. An absent or empty list means no
    /// restriction.
    pub fn in_decks<'a>(
        &'a self,
        deck_ids: Option<&'a [DeckId]>,
    ) -> impl Iterator<Item = &'a Card> + 'a {
        self.cards.iter().filter(move |card| match deck_ids {
            Some(ids) if !ids.is_empty() => ids.contains(&card.deck_id),
            _ => true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(id: i64, deck: i64) -> Card {
        Card {
            deck_id: DeckId::new(deck),
            front: format!("front {id}"),
            back: format!("back {id}"),
            stats: CardStats::new(CardId::new(id)),
        }
    }

    #[test]
    fn test_new_stats_are_zeroed() {
        let stats = CardStats::new(CardId::new(1));
        assert_eq!(stats.total_attempts(), 0);
        assert_eq!(stats.correct_answers(), 0);
        assert_eq!(stats.accuracy(), 0.0);
        assert!(stats.last_reviewed_at().is_none());
        assert!(stats.is_new());
    }

    #[test]
    fn test_accuracy_invariant() {
        for total in 1..50u32 {
            for correct in 0..=total {
                let stats = CardStats::from_counts(CardId::new(1), total, correct, None);
                assert_eq!(
                    correct_from_accuracy(stats.accuracy(), stats.total_attempts()),
                    stats.correct_answers()
                );
            }
        }
    }

    #[test]
    fn test_from_counts_clamps_correct() {
        let stats = CardStats::from_counts(CardId::new(1), 3, 7, None);
        assert_eq!(stats.correct_answers(), 3);
        assert_eq!(stats.accuracy(), 1.0);
    }

    #[test]
    fn test_restore_trusts_accuracy() {
        // Legacy row: correct_answers was never written.
        let stats = CardStats::restore(CardId::new(1), 0.75, 4, 0, None);
        assert_eq!(stats.correct_answers(), 3);
        assert_eq!(stats.accuracy(), 0.75);
    }

    #[test]
    fn test_restore_with_garbage_accuracy() {
        let stats = CardStats::restore(CardId::new(1), f64::NAN, 4, 2, None);
        assert_eq!(stats.correct_answers(), 0);
        let stats = CardStats::restore(CardId::new(1), 7.0, 4, 2, None);
        assert_eq!(stats.correct_answers(), 4);
    }

    #[test]
    fn test_pool_deck_restriction() {
        let pool = CardPool::new(vec![card(1, 10), card(2, 20), card(3, 10)]);
        let decks = [DeckId::new(10)];
        let ids: Vec<CardId> = pool.in_decks(Some(&decks)).map(Card::id).collect();
        assert_eq!(ids, vec![CardId::new(1), CardId::new(3)]);
        assert_eq!(pool.in_decks(Some(&[])).count(), 3);
        assert_eq!(pool.in_decks(None).count(), 3);
        assert!(pool.get(CardId::new(2)).is_some());
        assert!(pool.get(CardId::new(4)).is_none());
    }
}
