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

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use rusqlite::Row;
use rusqlite::Transaction;
use rusqlite::config::DbConfig;
use serde::Deserialize;

use crate::analytics::Analytics;
use crate::engine::CardStore;
use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::error::fail;
use crate::stats::SessionHistoryEntry;
use crate::stats::SessionSummary;
use crate::types::card_id::CardId;
use crate::types::card_stats::Card;
use crate::types::card_stats::CardPool;
use crate::types::card_stats::CardStats;
use crate::types::deck_id::DeckId;
use crate::types::scope::Scope;
use crate::types::timestamp::Timestamp;

#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

/// A card to be added to a new deck.
#[derive(Clone, Debug, Deserialize)]
pub struct NewCard {
    pub front: String,
    pub back: String,
}

impl Database {
    pub fn new(database_path: &str) -> Fallible<Self> {
        let mut conn = Connection::open(database_path)?;
        conn.set_db_config(DbConfig::SQLITE_DBCONFIG_ENABLE_FKEY, true)?;
        {
            let tx = conn.transaction()?;
            if !probe_schema_exists(&tx)? {
                log::debug!("Creating database schema.");
                tx.execute_batch(include_str!("schema.sql"))?;
                tx.commit()?;
            }
        }
        let conn = Arc::new(Mutex::new(conn));
        Ok(Self { conn })
    }

    /// Create a deck and its cards, all with zeroed stats.
    pub fn create_deck(
        &self,
        scope: &Scope,
        name: &str,
        cards: &[NewCard],
        created_at: Timestamp,
    ) -> Fallible<DeckId> {
        let mut conn = self.acquire()?;
        let tx = conn.transaction()?;
        let sql = "insert into decks (tenant, language, name, created_at) values (?, ?, ?, ?) returning deck_id;";
        let deck_id: DeckId = tx.query_row(
            sql,
            (&scope.tenant, &scope.language, name, created_at),
            |row| row.get(0),
        )?;
        for card in cards {
            let sql = "insert into cards (deck_id, front, back, created_at) values (?, ?, ?, ?);";
            tx.execute(sql, (deck_id, &card.front, &card.back, created_at))?;
        }
        tx.commit()?;
        log::debug!("Created deck {deck_id} with {} cards", cards.len());
        Ok(deck_id)
    }

    /// Names of the decks in `scope`, ordered by id.
    pub fn deck_names(&self, scope: &Scope) -> Fallible<Vec<(DeckId, String)>> {
        let conn = self.acquire()?;
        let sql = "select deck_id, name from decks where tenant = ? and language = ? order by deck_id;";
        let mut stmt = conn.prepare(sql)?;
        let mut rows = stmt.query((&scope.tenant, &scope.language))?;
        let mut decks = Vec::new();
        while let Some(row) = rows.next()? {
            decks.push((row.get(0)?, row.get(1)?));
        }
        Ok(decks)
    }

    fn acquire(&self) -> Fallible<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| ErrorReport::new("database lock poisoned"))
    }
}

impl CardStore for Database {
    fn fetch_scoped_pool(&self, scope: &Scope, deck_ids: Option<&[DeckId]>) -> Fallible<CardPool> {
        let conn = self.acquire()?;
        let sql = "select c.card_id, c.accuracy, c.total_attempts, c.correct_answers, c.last_reviewed_at, c.deck_id, c.front, c.back from cards c join decks d on d.deck_id = c.deck_id where d.tenant = ? and d.language = ? order by c.card_id;";
        let mut stmt = conn.prepare(sql)?;
        let mut rows = stmt.query((&scope.tenant, &scope.language))?;
        let mut cards = Vec::new();
        while let Some(row) = rows.next()? {
            let card = Card {
                stats: read_stats(row)?,
                deck_id: row.get(5)?,
                front: row.get(6)?,
                back: row.get(7)?,
            };
            let wanted = match deck_ids {
                Some(ids) if !ids.is_empty() => ids.contains(&card.deck_id),
                _ => true,
            };
            if wanted {
                cards.push(card);
            }
        }
        Ok(CardPool::new(cards))
    }

    fn get_card_stats(&self, scope: &Scope, card_id: CardId) -> Fallible<Option<CardStats>> {
        let conn = self.acquire()?;
        select_stats(&conn, scope, card_id)
    }

    fn persist_card_stats(&self, stats: &CardStats) -> Fallible<()> {
        let mut conn = self.acquire()?;
        let tx = conn.transaction()?;
        write_stats(&tx, stats)?;
        tx.commit()?;
        Ok(())
    }

    fn update_card_stats(
        &self,
        scope: &Scope,
        card_id: CardId,
        update: &dyn Fn(&CardStats) -> CardStats,
    ) -> Fallible<Option<CardStats>> {
        let mut conn = self.acquire()?;
        let tx = conn.transaction()?;
        let updated = match select_stats(&tx, scope, card_id)? {
            Some(stats) => {
                let updated = update(&stats);
                write_stats(&tx, &updated)?;
                Some(updated)
            }
            None => None,
        };
        tx.commit()?;
        Ok(updated)
    }

    fn persist_analytics_snapshot(&self, scope: &Scope, analytics: &Analytics) -> Fallible<()> {
        let conn = self.acquire()?;
        let sql = "insert into analytics (tenant, language, total_cards_studied, total_correct_answers, cards_mastered, overall_average_progress, updated_at) values (?, ?, ?, ?, ?, ?, ?);";
        conn.execute(
            sql,
            (
                &scope.tenant,
                &scope.language,
                to_sql_count(analytics.total_cards_studied)?,
                to_sql_count(analytics.total_correct_answers)?,
                to_sql_count(analytics.cards_mastered)?,
                analytics.overall_average_progress,
                analytics.updated_at,
            ),
        )?;
        Ok(())
    }

    fn latest_analytics(&self, scope: &Scope) -> Fallible<Option<Analytics>> {
        let conn = self.acquire()?;
        let sql = "select total_cards_studied, total_correct_answers, cards_mastered, overall_average_progress, updated_at from analytics where tenant = ? and language = ? order by analytics_id desc limit 1;";
        let analytics = conn
            .query_row(sql, (&scope.tenant, &scope.language), |row| {
                Ok(Analytics {
                    total_cards_studied: get_count(row, 0)?,
                    total_correct_answers: get_count(row, 1)?,
                    cards_mastered: get_count(row, 2)?,
                    overall_average_progress: row.get(3)?,
                    updated_at: row.get(4)?,
                })
            })
            .optional()?;
        Ok(analytics)
    }

    fn record_session(
        &self,
        scope: &Scope,
        deck_id: DeckId,
        summary: &SessionSummary,
        completed_at: Timestamp,
    ) -> Fallible<()> {
        let conn = self.acquire()?;
        let sql = "insert into sessions (tenant, language, deck_id, total_cards, passed_count, missed_count, skipped_count, accuracy_percentage, passed_cards, missed_cards, completed_at) values (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?);";
        conn.execute(
            sql,
            (
                &scope.tenant,
                &scope.language,
                deck_id,
                to_sql_count(summary.total_cards)?,
                to_sql_count(summary.passed_count)?,
                to_sql_count(summary.missed_count)?,
                to_sql_count(summary.skipped_count)?,
                summary.accuracy_percentage,
                serde_json::to_string(&summary.passed_cards)?,
                serde_json::to_string(&summary.missed_cards)?,
                completed_at,
            ),
        )?;
        Ok(())
    }

    fn session_history(&self, scope: &Scope) -> Fallible<Vec<SessionHistoryEntry>> {
        let conn = self.acquire()?;
        let sql = "select deck_id, total_cards, passed_count, missed_count, skipped_count, accuracy_percentage, passed_cards, missed_cards, completed_at from sessions where tenant = ? and language = ? order by session_id desc;";
        let mut stmt = conn.prepare(sql)?;
        let mut rows = stmt.query((&scope.tenant, &scope.language))?;
        let mut history = Vec::new();
        while let Some(row) = rows.next()? {
            let passed_cards: String = row.get(6)?;
            let missed_cards: String = row.get(7)?;
            let summary = SessionSummary {
                total_cards: get_count(row, 1)?,
                passed_count: get_count(row, 2)?,
                missed_count: get_count(row, 3)?,
                skipped_count: get_count(row, 4)?,
                accuracy_percentage: row.get(5)?,
                passed_cards: serde_json::from_str(&passed_cards)?,
                missed_cards: serde_json::from_str(&missed_cards)?,
            };
            history.push(SessionHistoryEntry {
                deck_id: row.get(0)?,
                completed_at: row.get(8)?,
                summary,
            });
        }
        Ok(history)
    }

    fn count_decks(&self, scope: &Scope) -> Fallible<usize> {
        let conn = self.acquire()?;
        let sql = "select count(*) from decks where tenant = ? and language = ?;";
        let count: usize =
            conn.query_row(sql, (&scope.tenant, &scope.language), |row| get_count(row, 0))?;
        Ok(count)
    }
}

fn to_sql_count<T: TryInto<i64>>(value: T) -> Fallible<i64> {
    value
        .try_into()
        .map_err(|_| ErrorReport::new("count too large for the database"))
}

fn get_count<T: TryFrom<i64>>(row: &Row, idx: usize) -> rusqlite::Result<T> {
    let value: i64 = row.get(idx)?;
    T::try_from(value).map_err(|_| rusqlite::Error::IntegralValueOutOfRange(idx, value))
}

/// Read stats from the first five columns of `row`.
fn read_stats(row: &Row) -> Fallible<CardStats> {
    let card_id: CardId = row.get(0)?;
    let accuracy: f64 = row.get(1)?;
    let total_attempts: u32 = row.get(2)?;
    let correct_answers: u32 = row.get(3)?;
    let last_reviewed_at: Option<Timestamp> = row.get(4)?;
    Ok(CardStats::restore(
        card_id,
        accuracy,
        total_attempts,
        correct_answers,
        last_reviewed_at,
    ))
}

fn select_stats(conn: &Connection, scope: &Scope, card_id: CardId) -> Fallible<Option<CardStats>> {
    let sql = "select c.card_id, c.accuracy, c.total_attempts, c.correct_answers, c.last_reviewed_at from cards c join decks d on d.deck_id = c.deck_id where c.card_id = ? and d.tenant = ? and d.language = ?;";
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query((card_id, &scope.tenant, &scope.language))?;
    match rows.next()? {
        Some(row) => Ok(Some(read_stats(row)?)),
        None => Ok(None),
    }
}

fn write_stats(tx: &Transaction, stats: &CardStats) -> Fallible<()> {
    let sql = "update cards set accuracy = ?, total_attempts = ?, correct_answers = ?, last_reviewed_at = ? where card_id = ?;";
    let changed = tx.execute(
        sql,
        (
            stats.accuracy(),
            stats.total_attempts(),
            stats.correct_answers(),
            stats.last_reviewed_at(),
            stats.id(),
        ),
    )?;
    if changed == 0 {
        return fail(format!("no card with id {}", stats.id()));
    }
    Ok(())
}

fn probe_schema_exists(tx: &Transaction) -> Fallible<bool> {
    let sql = "select count(*) from sqlite_master where type='table' AND name=?;";
    let count: i64 = tx.query_row(sql, ["cards"], |row| row.get(0))?;
    Ok(count > 0)
}
