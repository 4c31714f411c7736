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
use serde::Serialize;

use crate::error::EngineError;
use crate::selection::SelectionCounts;
use crate::selection::SelectionParams;
use crate::selection::select;
use crate::types::card_stats::Card;
use crate::types::card_stats::CardPool;
use crate::types::deck_id::DeckId;
use crate::types::policy::Policy;
use crate::types::timestamp::Timestamp;

/// A study session ready to be handed to the user.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SessionRecord {
    pub policy: Policy,
    /// The first requested deck, or [`DeckId::NONE`].
    pub deck_id: DeckId,
    pub started_at: Timestamp,
    /// The selected cards, in session order.
    pub cards: Vec<Card>,
    pub counts: SelectionCounts,
}

/// Build a session from `pool` under the policy named `policy_name`.
///
/// An empty selection, including a `by_decks` request without decks, is
/// reported as [`EngineError::NoCandidates`].
pub fn build_session<R: Rng + ?Sized>(
    policy_name: &str,
    pool: &CardPool,
    params: &SelectionParams,
    now: Timestamp,
    rng: &mut R,
) -> Result<SessionRecord, EngineError> {
    let policy = Policy::resolve(policy_name)?;
    let selection = select(policy, pool, params, rng)?;
    if selection.is_empty() {
        return Err(EngineError::NoCandidates);
    }
    let cards: Vec<Card> = selection
        .card_ids
        .iter()
        .filter_map(|id| pool.get(*id).cloned())
        .collect();
    let deck_id = params
        .deck_ids()
        .and_then(|ids| ids.first().copied())
        .unwrap_or(DeckId::NONE);
    log::debug!(
        "Built {policy} session with {} cards for deck {deck_id}",
        cards.len()
    );
    Ok(SessionRecord {
        policy,
        deck_id,
        started_at: now,
        cards,
        counts: selection.counts,
    })
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::types::card_id::CardId;
    use crate::types::card_stats::CardStats;

    fn pool() -> CardPool {
        let card = |id: i64, deck: i64, total: u32| Card {
            deck_id: DeckId::new(deck),
            front: format!("front {id}"),
            back: format!("back {id}"),
            stats: CardStats::from_counts(CardId::new(id), total, 0, None),
        };
        CardPool::new(vec![card(1, 5, 0), card(2, 5, 3), card(3, 6, 0)])
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    #[test]
    fn test_session_carries_full_cards() -> Result<(), EngineError> {
        let now = Timestamp::now();
        let session = build_session("all", &pool(), &SelectionParams::default(), now, &mut rng())?;
        assert_eq!(session.policy, Policy::All);
        assert_eq!(session.deck_id, DeckId::NONE);
        assert_eq!(session.started_at, now);
        assert_eq!(session.cards.len(), 3);
        for card in &session.cards {
            assert_eq!(card.front, format!("front {}", card.id()));
        }
        Ok(())
    }

    #[test]
    fn test_session_order_follows_selection() -> Result<(), EngineError> {
        let params = SelectionParams::default();
        let now = Timestamp::now();
        let expected = select(Policy::All, &pool(), &params, &mut rng())?;
        let session = build_session("test_all", &pool(), &params, now, &mut rng())?;
        let order: Vec<CardId> = session.cards.iter().map(Card::id).collect();
        assert_eq!(order, expected.card_ids);
        Ok(())
    }

    #[test]
    fn test_session_deck_is_first_requested() -> Result<(), EngineError> {
        let params = SelectionParams {
            deck_ids: Some(vec![DeckId::new(6), DeckId::new(5)]),
            ..SelectionParams::default()
        };
        let session = build_session("by_decks", &pool(), &params, Timestamp::now(), &mut rng())?;
        assert_eq!(session.deck_id, DeckId::new(6));
        assert_eq!(session.cards.len(), 3);
        Ok(())
    }

    #[test]
    fn test_unknown_policy() {
        let result = build_session(
            "hardest_first",
            &pool(),
            &SelectionParams::default(),
            Timestamp::now(),
            &mut rng(),
        );
        assert_eq!(
            result,
            Err(EngineError::InvalidPolicy("hardest_first".to_string()))
        );
    }

    #[test]
    fn test_by_decks_without_decks_has_no_candidates() {
        let result = build_session(
            "by_decks",
            &pool(),
            &SelectionParams::default(),
            Timestamp::now(),
            &mut rng(),
        );
        assert_eq!(result, Err(EngineError::NoCandidates));
    }

    #[test]
    fn test_session_does_not_touch_stats() -> Result<(), EngineError> {
        let before = pool();
        let session = build_session(
            "newly_added",
            &before,
            &SelectionParams::default(),
            Timestamp::now(),
            &mut rng(),
        )?;
        for card in &session.cards {
            assert_eq!(Some(card), before.get(card.id()));
            assert!(card.stats.is_new());
        }
        Ok(())
    }

    #[test]
    fn test_session_serializes_card_stats() -> Result<(), serde_json::Error> {
        let session = build_session(
            "newly_added",
            &pool(),
            &SelectionParams {
                deck_ids: Some(vec![DeckId::new(6)]),
                ..SelectionParams::default()
            },
            Timestamp::now(),
            &mut rng(),
        )
        .unwrap();
        let json = serde_json::to_value(&session)?;
        assert_eq!(json["policy"], "newly_added");
        assert_eq!(json["deck_id"], 6);
        assert_eq!(json["cards"][0]["id"], 3);
        assert_eq!(json["cards"][0]["front"], "front 3");
        assert_eq!(json["cards"][0]["total_attempts"], 0);
        assert_eq!(json["counts"]["total_cards"], 1);
        Ok(())
    }
}
