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

use rusqlite::Connection;
use rusqlite::Row;
use rusqlite::Transaction;

use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::error::fail;
use crate::store::CardStore;
use crate::types::card::Card;
use crate::types::card_id::CardId;
use crate::types::card_state::CardState;
use crate::types::card_state::DueSource;
use crate::types::card_state::Override;
use crate::types::settings::Settings;
use crate::types::timestamp::Timestamp;

const CARD_COLUMNS: &str = "card_id, user_id, deck_name, front, back, ease_factor, interval_days, repetitions, last_rating, next_review_at, override_reason, override_previous_review_at";

pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (or create) the database at the given path. `:memory:` opens a
    /// private in-memory database.
    pub fn new(database_path: &str) -> Fallible<Self> {
        let mut conn = Connection::open(database_path)?;
        {
            let tx = conn.transaction()?;
            if !probe_schema_exists(&tx)? {
                log::debug!("Creating schema in {database_path}");
                tx.execute_batch(include_str!("schema.sql"))?;
                tx.commit()?;
            }
        }
        Ok(Self { conn })
    }

    /// Insert a new card.
    ///
    /// If a card with the same id exists, returns an error.
    pub fn add_card(&self, card: &Card, created_at: Timestamp) -> Fallible<()> {
        if self.card_exists(card.id)? {
            return fail(format!("card already exists: {}", card.id));
        }
        log::debug!("Adding new card: {}", card.id);
        let (reason, previous) = override_columns(&card.state.due_source);
        let sql = "insert into cards (card_id, user_id, deck_name, front, back, created_at, ease_factor, interval_days, repetitions, last_rating, next_review_at, override_reason, override_previous_review_at) values (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?);";
        self.conn.execute(
            sql,
            (
                card.id,
                &card.user,
                &card.deck,
                &card.front,
                &card.back,
                created_at,
                card.state.ease_factor,
                card.state.interval_days,
                card.state.repetitions,
                card.state.last_rating,
                card.state.next_review_at,
                reason,
                previous,
            ),
        )?;
        Ok(())
    }

    /// Store a user's settings, replacing any previous ones.
    pub fn put_settings(&self, user: &str, settings: &Settings) -> Fallible<()> {
        let sql = "insert into settings (user_id, again_minutes, hard_days, good_days, easy_days) values (?, ?, ?, ?, ?) on conflict (user_id) do update set again_minutes = excluded.again_minutes, hard_days = excluded.hard_days, good_days = excluded.good_days, easy_days = excluded.easy_days;";
        self.conn.execute(
            sql,
            (
                user,
                settings.again_minutes.filter(|v| *v > 0),
                settings.hard_days.filter(|v| *v > 0),
                settings.good_days.filter(|v| *v > 0),
                settings.easy_days.filter(|v| *v > 0),
            ),
        )?;
        Ok(())
    }

    /// The number of cards a user owns.
    pub fn card_count(&self, user: &str) -> Fallible<usize> {
        let sql = "select count(*) from cards where user_id = ?;";
        let count: i64 = self.conn.query_row(sql, [user], |row| row.get(0))?;
        Ok(count as usize)
    }

    fn card_exists(&self, id: CardId) -> Fallible<bool> {
        let sql = "select count(*) from cards where card_id = ?;";
        let count: i64 = self.conn.query_row(sql, [id], |row| row.get(0))?;
        Ok(count > 0)
    }

    fn query_cards(&self, sql: &str, params: impl rusqlite::Params) -> Fallible<Vec<Card>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params)?;
        let mut cards = Vec::new();
        while let Some(row) = rows.next()? {
            cards.push(read_card(row)?);
        }
        Ok(cards)
    }
}

impl CardStore for Database {
    fn get_card(&self, id: CardId, user: &str) -> Fallible<Option<Card>> {
        let sql = format!("select {CARD_COLUMNS} from cards where card_id = ? and user_id = ?;");
        let mut cards = self.query_cards(&sql, (id, user))?;
        Ok(cards.pop())
    }

    fn get_settings(&self, user: &str) -> Fallible<Settings> {
        let sql = "select again_minutes, hard_days, good_days, easy_days from settings where user_id = ?;";
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query([user])?;
        if let Some(row) = rows.next()? {
            Ok(Settings {
                again_minutes: row.get(0)?,
                hard_days: row.get(1)?,
                good_days: row.get(2)?,
                easy_days: row.get(3)?,
            })
        } else {
            Ok(Settings::default())
        }
    }

    fn write_card(&self, card: &Card) -> Fallible<()> {
        let (reason, previous) = override_columns(&card.state.due_source);
        let sql = "update cards set ease_factor = ?, interval_days = ?, repetitions = ?, last_rating = ?, next_review_at = ?, override_reason = ?, override_previous_review_at = ? where card_id = ? and user_id = ?;";
        let changed = self
            .conn
            .execute(
                sql,
                (
                    card.state.ease_factor,
                    card.state.interval_days,
                    card.state.repetitions,
                    card.state.last_rating,
                    card.state.next_review_at,
                    reason,
                    previous,
                    card.id,
                    &card.user,
                ),
            )
            .map_err(|e| ErrorReport::retryable(format!("failed to write card {}: {e}", card.id)))?;
        if changed == 0 {
            return fail(format!("no such card: {}", card.id));
        }
        Ok(())
    }

    fn find_due_cards(
        &self,
        user: &str,
        deck: Option<&str>,
        now: Timestamp,
    ) -> Fallible<Vec<Card>> {
        let sql = format!(
            "select {CARD_COLUMNS} from cards where user_id = ?1 and (?2 is null or deck_name = ?2) and next_review_at <= ?3 order by next_review_at, rowid;"
        );
        self.query_cards(&sql, (user, deck, now))
    }

    fn find_all_cards(&self, user: &str, deck: Option<&str>) -> Fallible<Vec<Card>> {
        let sql = format!(
            "select {CARD_COLUMNS} from cards where user_id = ?1 and (?2 is null or deck_name = ?2) order by rowid;"
        );
        self.query_cards(&sql, (user, deck))
    }
}

fn override_columns(source: &DueSource) -> (Option<&str>, Option<Timestamp>) {
    match source {
        DueSource::Algorithm => (None, None),
        DueSource::Oracle(o) => (Some(o.reason.as_str()), Some(o.previous_review_at)),
    }
}

fn read_card(row: &Row) -> rusqlite::Result<Card> {
    let reason: Option<String> = row.get(10)?;
    let previous: Option<Timestamp> = row.get(11)?;
    let due_source = match (reason, previous) {
        (Some(reason), Some(previous_review_at)) => DueSource::Oracle(Override {
            reason,
            previous_review_at,
        }),
        _ => DueSource::Algorithm,
    };
    Ok(Card {
        id: row.get(0)?,
        user: row.get(1)?,
        deck: row.get(2)?,
        front: row.get(3)?,
        back: row.get(4)?,
        state: CardState {
            ease_factor: row.get(5)?,
            interval_days: row.get(6)?,
            repetitions: row.get(7)?,
            last_rating: row.get(8)?,
            next_review_at: row.get(9)?,
            due_source,
        },
    })
}

fn probe_schema_exists(tx: &Transaction) -> Fallible<bool> {
    let sql = "select count(*) from sqlite_master where type='table' AND name=?;";
    let count: i64 = tx.query_row(sql, ["cards"], |row| row.get(0))?;
    Ok(count > 0)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use chrono::Utc;
    use tempfile::tempdir;

    use super::*;
    use crate::scheduler::next_state;
    use crate::types::rating::Rating;

    fn at(day: u32) -> Timestamp {
        Timestamp::new(Utc.with_ymd_and_hms(2025, 4, day, 12, 0, 0).unwrap())
    }

    fn add(db: &Database, user: &str, deck: &str, front: &str, due: Timestamp) -> Fallible<Card> {
        let card = Card::new(user, deck, front, format!("{front}?"), due);
        db.add_card(&card, at(1))?;
        Ok(card)
    }

    #[test]
    fn test_add_and_get() -> Fallible<()> {
        let db = Database::new(":memory:")?;
        let card = add(&db, "alice", "French", "chat", at(1))?;
        assert_eq!(db.get_card(card.id, "alice")?, Some(card.clone()));
        assert_eq!(db.card_count("alice")?, 1);
        Ok(())
    }

    #[test]
    fn test_get_is_scoped_to_user() -> Fallible<()> {
        let db = Database::new(":memory:")?;
        let card = add(&db, "alice", "French", "chat", at(1))?;
        assert_eq!(db.get_card(card.id, "mallory")?, None);
        Ok(())
    }

    #[test]
    fn test_add_duplicate_fails() -> Fallible<()> {
        let db = Database::new(":memory:")?;
        let card = add(&db, "alice", "French", "chat", at(1))?;
        assert!(db.add_card(&card, at(1)).is_err());
        Ok(())
    }

    #[test]
    fn test_write_round_trips_state_and_override() -> Fallible<()> {
        let db = Database::new(":memory:")?;
        let mut card = add(&db, "alice", "French", "chat", at(1))?;
        card.state = CardState {
            ease_factor: 2.22,
            interval_days: 7,
            repetitions: 2,
            last_rating: Some(Rating::Good),
            next_review_at: at(8),
            due_source: DueSource::Oracle(Override {
                reason: "review sooner".to_string(),
                previous_review_at: at(9),
            }),
        };
        db.write_card(&card)?;
        assert_eq!(db.get_card(card.id, "alice")?, Some(card.clone()));

        card.state.due_source = DueSource::Algorithm;
        db.write_card(&card)?;
        let stored = db.get_card(card.id, "alice")?.unwrap();
        assert_eq!(stored.state.due_source, DueSource::Algorithm);
        Ok(())
    }

    #[test]
    fn test_write_missing_card_fails() -> Fallible<()> {
        let db = Database::new(":memory:")?;
        let card = Card::new("alice", "French", "chat", "cat", at(1));
        let err = db.write_card(&card).unwrap_err();
        assert!(err.message().starts_with("no such card"));
        Ok(())
    }

    #[test]
    fn test_write_rejected_by_schema_is_retryable() -> Fallible<()> {
        let db = Database::new(":memory:")?;
        let mut card = add(&db, "alice", "French", "chat", at(1))?;
        card.state.ease_factor = 0.5;
        let err = db.write_card(&card).unwrap_err();
        assert!(err.is_retryable());
        Ok(())
    }

    #[test]
    fn test_find_due_cards() -> Fallible<()> {
        let db = Database::new(":memory:")?;
        let late = add(&db, "alice", "French", "chat", at(5))?;
        let early = add(&db, "alice", "French", "chien", at(2))?;
        let _future = add(&db, "alice", "French", "oiseau", at(20))?;
        let _other_deck = add(&db, "alice", "German", "Hund", at(2))?;
        let _other_user = add(&db, "bob", "French", "chat", at(2))?;

        let due = db.find_due_cards("alice", Some("French"), at(10))?;
        let ids: Vec<CardId> = due.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![early.id, late.id]);

        let due = db.find_due_cards("alice", None, at(10))?;
        assert_eq!(due.len(), 3);

        // Due exactly now counts.
        let due = db.find_due_cards("alice", Some("French"), at(2))?;
        assert_eq!(due.len(), 1);
        Ok(())
    }

    #[test]
    fn test_far_future_cards_are_not_due() -> Fallible<()> {
        let db = Database::new(":memory:")?;
        let mut card = add(&db, "alice", "French", "chat", at(1))?;
        card.state.interval_days = 1_200_000;
        card.state.repetitions = 3;
        card.state = next_state(&card.state, Rating::Easy, &Settings::default(), at(1));
        db.write_card(&card)?;
        let far = add(&db, "alice", "French", "chien", at(1).plus_days(u32::MAX))?;

        assert!(db.find_due_cards("alice", None, at(10))?.is_empty());
        let stored = db.get_card(far.id, "alice")?.unwrap();
        assert_eq!(stored.state.next_review_at, Timestamp::latest());
        Ok(())
    }

    #[test]
    fn test_find_all_cards_keeps_creation_order() -> Fallible<()> {
        let db = Database::new(":memory:")?;
        let a = add(&db, "alice", "French", "chat", at(20))?;
        let b = add(&db, "alice", "French", "chien", at(2))?;
        let _ = add(&db, "alice", "German", "Hund", at(2))?;
        let all = db.find_all_cards("alice", Some("French"))?;
        let ids: Vec<CardId> = all.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![a.id, b.id]);
        assert_eq!(db.find_all_cards("alice", None)?.len(), 3);
        Ok(())
    }

    #[test]
    fn test_settings() -> Fallible<()> {
        let db = Database::new(":memory:")?;
        assert_eq!(db.get_settings("alice")?, Settings::default());
        let settings = Settings {
            again_minutes: Some(5),
            hard_days: None,
            good_days: Some(4),
            easy_days: None,
        };
        db.put_settings("alice", &settings)?;
        assert_eq!(db.get_settings("alice")?, settings);
        assert_eq!(db.get_settings("bob")?, Settings::default());

        let replaced = Settings {
            easy_days: Some(10),
            ..Settings::default()
        };
        db.put_settings("alice", &replaced)?;
        assert_eq!(db.get_settings("alice")?, replaced);
        Ok(())
    }

    #[test]
    fn test_reopen_existing_file() -> Fallible<()> {
        let dir = tempdir()?;
        let path = dir.path().join("cardwise.db");
        let path = path.to_str().unwrap();
        let card = {
            let db = Database::new(path)?;
            add(&db, "alice", "French", "chat", at(1))?
        };
        let db = Database::new(path)?;
        assert_eq!(db.get_card(card.id, "alice")?, Some(card));
        Ok(())
    }
}
