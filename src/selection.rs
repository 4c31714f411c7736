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
use rand::seq::SliceRandom;
use serde::Serialize;

use crate::error::EngineError;
use crate::types::card_id::CardId;
use crate::types::card_stats::Card;
use crate::types::card_stats::CardPool;
use crate::types::deck_id::DeckId;
use crate::types::policy::Policy;

/// Cards per session when the caller does not say otherwise.
pub const DEFAULT_LIMIT: usize = 20;

/// Accuracy below which a card counts as unfamiliar.
pub const DEFAULT_UNFAMILIAR_THRESHOLD: f64 = 0.5;

/// Parameters shared by every policy.
#[derive(Clone, Debug, PartialEq)]
pub struct SelectionParams {
    /// Restrict the pool to these decks. Applies to every policy.
    pub deck_ids: Option<Vec<DeckId>>,
    /// Upper bound on the number of selected cards.
    pub limit: usize,
    /// Accuracy cutoff for [`Policy::Unfamiliar`].
    pub threshold: Option<f64>,
}

impl Default for SelectionParams {
    fn default() -> Self {
        Self {
            deck_ids: None,
            limit: DEFAULT_LIMIT,
            threshold: None,
        }
    }
}

impl SelectionParams {
    /// The deck restriction, if a non-empty one was given.
    pub fn deck_ids(&self) -> Option<&[DeckId]> {
        match &self.deck_ids {
            Some(ids) if !ids.is_empty() => Some(ids.as_slice()),
            _ => None,
        }
    }

    fn threshold(&self) -> Result<f64, EngineError> {
        match self.threshold {
            None => Ok(DEFAULT_UNFAMILIAR_THRESHOLD),
            Some(t) if (0.0..=1.0).contains(&t) => Ok(t),
            Some(t) => Err(EngineError::InvalidThreshold(t)),
        }
    }
}

/// Pool statistics for display next to a policy.
///
/// Every count is taken over the deck-restricted pool, so the numbers are
/// comparable with each other.
#[derive(Clone, Default, PartialEq, Eq, Debug, Serialize)]
pub struct SelectionCounts {
    /// Cards the policy would draw from.
    pub available_cards: usize,
    pub newly_added_count: usize,
    pub unfamiliar_count: usize,
    pub total_cards: usize,
    /// Number of decks in scope. Only reported for [`Policy::All`], and
    /// filled in by the engine since pools do not carry empty decks.
    pub total_decks: Option<usize>,
}

#[derive(Clone, Default, PartialEq, Eq, Debug, Serialize)]
pub struct SelectionResult {
    /// Selected cards, in random order.
    pub card_ids: Vec<CardId>,
    pub counts: SelectionCounts,
}

impl SelectionResult {
    pub fn is_empty(&self) -> bool {
        self.card_ids.is_empty()
    }
}

/// Whether `card` is eligible under `policy`.
fn admits(policy: Policy, card: &Card, threshold: f64) -> bool {
    match policy {
        Policy::All | Policy::ByDecks => true,
        Policy::Unfamiliar => card.stats.accuracy() < threshold,
        Policy::NewlyAdded => card.stats.is_new(),
    }
}

/// A `by_decks` request without decks selects nothing. This is an empty
/// result rather than [`EngineError::NoCandidates`].
fn missing_decks(policy: Policy, params: &SelectionParams) -> bool {
    policy == Policy::ByDecks && params.deck_ids().is_none()
}

fn tally(policy: Policy, scoped: &[&Card], threshold: f64) -> SelectionCounts {
    let mut counts = SelectionCounts {
        total_cards: scoped.len(),
        ..SelectionCounts::default()
    };
    for card in scoped {
        if admits(policy, card, threshold) {
            counts.available_cards += 1;
        }
        if card.stats.is_new() {
            counts.newly_added_count += 1;
        }
        if card.stats.accuracy() < threshold {
            counts.unfamiliar_count += 1;
        }
    }
    counts
}

/// Compute the counts `select` would report, without sampling.
pub fn selection_counts(
    policy: Policy,
    pool: &CardPool,
    params: &SelectionParams,
) -> Result<SelectionCounts, EngineError> {
    let threshold = params.threshold()?;
    if missing_decks(policy, params) {
        return Ok(SelectionCounts::default());
    }
    let scoped: Vec<&Card> = pool.in_decks(params.deck_ids()).collect();
    Ok(tally(policy, &scoped, threshold))
}

/// Select up to `params.limit` cards from `pool` under `policy`.
///
/// The eligible cards are shuffled uniformly with `rng` and the first
/// `limit` are kept.
pub fn select<R: Rng + ?Sized>(
    policy: Policy,
    pool: &CardPool,
    params: &SelectionParams,
    rng: &mut R,
) -> Result<SelectionResult, EngineError> {
    let threshold = params.threshold()?;
    if params.limit == 0 {
        return Err(EngineError::InvalidLimit);
    }
    if missing_decks(policy, params) {
        log::debug!("No decks given for {policy}, selecting nothing");
        return Ok(SelectionResult::default());
    }
    let scoped: Vec<&Card> = pool.in_decks(params.deck_ids()).collect();
    let counts = tally(policy, &scoped, threshold);
    let mut card_ids: Vec<CardId> = scoped
        .iter()
        .filter(|card| admits(policy, card, threshold))
        .map(|card| card.id())
        .collect();
    if card_ids.is_empty() {
        return Err(EngineError::NoCandidates);
    }
    card_ids.shuffle(rng);
    card_ids.truncate(params.limit);
    log::debug!(
        "Selected {} of {} {policy} candidates",
        card_ids.len(),
        counts.available_cards
    );
    Ok(SelectionResult { card_ids, counts })
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::types::card_stats::CardStats;

    fn card(id: i64, deck: i64, total: u32, correct: u32) -> Card {
        Card {
            deck_id: DeckId::new(deck),
            front: format!("front {id}"),
            back: format!("back {id}"),
            stats: CardStats::from_counts(CardId::new(id), total, correct, None),
        }
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    fn ids(values: &[i64]) -> Vec<CardId> {
        values.iter().copied().map(CardId::new).collect()
    }

    /// Accuracies 0.1, 0.4 and 0.6 over ten attempts each.
    fn accuracy_pool() -> CardPool {
        CardPool::new(vec![card(1, 1, 10, 1), card(2, 1, 10, 4), card(3, 1, 10, 6)])
    }

    fn mixed_pool() -> CardPool {
        CardPool::new(vec![
            card(1, 1, 0, 0),
            card(2, 1, 10, 9),
            card(3, 2, 4, 1),
            card(4, 2, 0, 0),
            card(5, 3, 2, 2),
        ])
    }

    #[test]
    fn test_all_selects_whole_pool() {
        let result = select(Policy::All, &mixed_pool(), &SelectionParams::default(), &mut rng());
        let result = result.unwrap();
        let selected: HashSet<CardId> = result.card_ids.iter().copied().collect();
        assert_eq!(selected, ids(&[1, 2, 3, 4, 5]).into_iter().collect());
        assert_eq!(result.counts.total_cards, 5);
        assert_eq!(result.counts.available_cards, 5);
        assert_eq!(result.counts.newly_added_count, 2);
        assert_eq!(result.counts.unfamiliar_count, 3);
    }

    #[test]
    fn test_by_decks_without_decks_is_empty() {
        for deck_ids in [None, Some(vec![])] {
            let params = SelectionParams {
                deck_ids,
                ..SelectionParams::default()
            };
            let result = select(Policy::ByDecks, &mixed_pool(), &params, &mut rng());
            assert_eq!(result, Ok(SelectionResult::default()));
            let counts = selection_counts(Policy::ByDecks, &mixed_pool(), &params);
            assert_eq!(counts, Ok(SelectionCounts::default()));
        }
    }

    #[test]
    fn test_by_decks_filters_decks() {
        let params = SelectionParams {
            deck_ids: Some(vec![DeckId::new(2), DeckId::new(3)]),
            ..SelectionParams::default()
        };
        let result = select(Policy::ByDecks, &mixed_pool(), &params, &mut rng()).unwrap();
        let mut selected = result.card_ids.clone();
        selected.sort();
        assert_eq!(selected, ids(&[3, 4, 5]));
        assert_eq!(result.counts.total_cards, 3);
        assert_eq!(result.counts.available_cards, 3);
        assert_eq!(result.counts.newly_added_count, 1);
    }

    #[test]
    fn test_by_decks_unknown_deck_has_no_candidates() {
        let params = SelectionParams {
            deck_ids: Some(vec![DeckId::new(77)]),
            ..SelectionParams::default()
        };
        let result = select(Policy::ByDecks, &mixed_pool(), &params, &mut rng());
        assert_eq!(result, Err(EngineError::NoCandidates));
    }

    #[test]
    fn test_unfamiliar_with_explicit_threshold() {
        let params = SelectionParams {
            threshold: Some(0.3),
            ..SelectionParams::default()
        };
        let result = select(Policy::Unfamiliar, &accuracy_pool(), &params, &mut rng()).unwrap();
        assert_eq!(result.card_ids, ids(&[1]));
        assert_eq!(result.counts.available_cards, 1);
        assert_eq!(result.counts.unfamiliar_count, 1);
        assert_eq!(result.counts.total_cards, 3);
    }

    #[test]
    fn test_unfamiliar_default_threshold() {
        let result = select(
            Policy::Unfamiliar,
            &accuracy_pool(),
            &SelectionParams::default(),
            &mut rng(),
        )
        .unwrap();
        let mut selected = result.card_ids.clone();
        selected.sort();
        assert_eq!(selected, ids(&[1, 2]));
    }

    #[test]
    fn test_unfamiliar_includes_new_cards() {
        // New cards have accuracy 0.0, which is below any positive threshold.
        let result = select(
            Policy::Unfamiliar,
            &mixed_pool(),
            &SelectionParams::default(),
            &mut rng(),
        )
        .unwrap();
        let mut selected = result.card_ids.clone();
        selected.sort();
        assert_eq!(selected, ids(&[1, 3, 4]));
    }

    #[test]
    fn test_unfamiliar_zero_threshold_has_no_candidates() {
        let params = SelectionParams {
            threshold: Some(0.0),
            ..SelectionParams::default()
        };
        let result = select(Policy::Unfamiliar, &mixed_pool(), &params, &mut rng());
        assert_eq!(result, Err(EngineError::NoCandidates));
    }

    #[test]
    fn test_newly_added_ignores_accuracy() {
        let pool = CardPool::new(vec![
            card(1, 1, 0, 0),
            card(2, 1, 1, 0),
            card(3, 1, 5, 5),
            card(4, 1, 0, 0),
        ]);
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let result =
                select(Policy::NewlyAdded, &pool, &SelectionParams::default(), &mut rng).unwrap();
            for id in &result.card_ids {
                let card = pool.get(*id).unwrap();
                assert_eq!(card.stats.total_attempts(), 0);
            }
            assert_eq!(result.card_ids.len(), 2);
        }
    }

    #[test]
    fn test_deck_restriction_applies_to_every_policy() {
        let params = SelectionParams {
            deck_ids: Some(vec![DeckId::new(2)]),
            ..SelectionParams::default()
        };
        let result = select(Policy::NewlyAdded, &mixed_pool(), &params, &mut rng()).unwrap();
        assert_eq!(result.card_ids, ids(&[4]));
        assert_eq!(result.counts.total_cards, 2);
        let result = select(Policy::All, &mixed_pool(), &params, &mut rng()).unwrap();
        assert_eq!(result.card_ids.len(), 2);
    }

    #[test]
    fn test_limit_bounds_selection() {
        let cards = (1..=20).map(|id| card(id, 1, 0, 0)).collect();
        let pool = CardPool::new(cards);
        let params = SelectionParams {
            limit: 5,
            ..SelectionParams::default()
        };
        let result = select(Policy::All, &pool, &params, &mut rng()).unwrap();
        assert_eq!(result.card_ids.len(), 5);
        let distinct: HashSet<CardId> = result.card_ids.iter().copied().collect();
        assert_eq!(distinct.len(), 5);
        for id in &result.card_ids {
            assert!(pool.get(*id).is_some());
        }
        assert_eq!(result.counts.available_cards, 20);
    }

    #[test]
    fn test_same_seed_same_selection() {
        let cards = (1..=30).map(|id| card(id, 1, 0, 0)).collect();
        let pool = CardPool::new(cards);
        let params = SelectionParams {
            limit: 10,
            ..SelectionParams::default()
        };
        let a = select(Policy::All, &pool, &params, &mut rng()).unwrap();
        let b = select(Policy::All, &pool, &params, &mut rng()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_selection_is_shuffled() {
        let cards = (1..=30).map(|id| card(id, 1, 0, 0)).collect();
        let pool = CardPool::new(cards);
        let in_order = ids(&(1..=30).collect::<Vec<i64>>());
        let shuffled = (0..10).any(|seed| {
            let mut rng = StdRng::seed_from_u64(seed);
            let result = select(Policy::All, &pool, &SelectionParams::default(), &mut rng);
            result.unwrap().card_ids != in_order[..20]
        });
        assert!(shuffled);
    }

    #[test]
    fn test_empty_pool_has_no_candidates() {
        for policy in [Policy::All, Policy::Unfamiliar, Policy::NewlyAdded] {
            let result = select(
                policy,
                &CardPool::default(),
                &SelectionParams::default(),
                &mut rng(),
            );
            assert_eq!(result, Err(EngineError::NoCandidates));
        }
    }

    #[test]
    fn test_invalid_parameters() {
        let params = SelectionParams {
            limit: 0,
            ..SelectionParams::default()
        };
        let result = select(Policy::All, &mixed_pool(), &params, &mut rng());
        assert_eq!(result, Err(EngineError::InvalidLimit));
        let params = SelectionParams {
            threshold: Some(1.5),
            ..SelectionParams::default()
        };
        let result = select(Policy::Unfamiliar, &mixed_pool(), &params, &mut rng());
        assert_eq!(result, Err(EngineError::InvalidThreshold(1.5)));
        let counts = selection_counts(Policy::Unfamiliar, &mixed_pool(), &params);
        assert_eq!(counts, Err(EngineError::InvalidThreshold(1.5)));
    }

    #[test]
    fn test_nan_threshold_is_rejected() {
        let params = SelectionParams {
            threshold: Some(f64::NAN),
            ..SelectionParams::default()
        };
        for policy in Policy::ALL {
            let result = select(policy, &mixed_pool(), &params, &mut rng());
            assert!(matches!(result, Err(EngineError::InvalidThreshold(t)) if t.is_nan()));
            let counts = selection_counts(policy, &mixed_pool(), &params);
            assert!(matches!(counts, Err(EngineError::InvalidThreshold(t)) if t.is_nan()));
        }
    }

    #[test]
    fn test_counts_match_selection() -> Result<(), EngineError> {
        let params = SelectionParams {
            deck_ids: Some(vec![DeckId::new(1), DeckId::new(2)]),
            threshold: Some(0.3),
            ..SelectionParams::default()
        };
        for policy in Policy::ALL {
            let counts = selection_counts(policy, &mixed_pool(), &params)?;
            let result = select(policy, &mixed_pool(), &params, &mut rng())?;
            assert_eq!(counts, result.counts);
        }
        Ok(())
    }
}
