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

use crate::error::Fallible;
use crate::scheduler::preview;
use crate::session::queue::SessionQueue;
use crate::store::CardStore;
use crate::types::card::Card;
use crate::types::rating::Rating;
use crate::types::settings::Settings;
use crate::types::timestamp::Timestamp;

/// How a session traverses its cards. Fixed when the session starts.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ReviewMode {
    /// Due cards only; ratings are scheduled and persisted.
    Study,
    /// Every card in the deck; nothing is scheduled or persisted.
    Practice { shuffle: bool },
}

pub enum Session {
    Study(StudySession),
    Practice(PracticeSession),
}

impl Session {
    pub fn start<S: CardStore, R: Rng + ?Sized>(
        store: &S,
        user: &str,
        deck: Option<&str>,
        mode: ReviewMode,
        now: Timestamp,
        rng: &mut R,
    ) -> Fallible<Self> {
        match mode {
            ReviewMode::Study => {
                let cards = store.find_due_cards(user, deck, now)?;
                let settings = store.get_settings(user)?;
                log::debug!("Starting study session with {} due cards", cards.len());
                Ok(Session::Study(StudySession::new(cards, settings, now)))
            }
            ReviewMode::Practice { shuffle } => {
                let cards = store.find_all_cards(user, deck)?;
                log::debug!("Starting practice session with {} cards", cards.len());
                Ok(Session::Practice(PracticeSession::new(cards, shuffle, rng)))
            }
        }
    }

    pub fn mode(&self) -> ReviewMode {
        match self {
            Session::Study(_) => ReviewMode::Study,
            Session::Practice(p) => ReviewMode::Practice {
                shuffle: p.shuffled,
            },
        }
    }
}

/// A schedule-affecting pass over the due cards.
pub struct StudySession {
    queue: SessionQueue,
    settings: Settings,
}

impl StudySession {
    pub fn new(cards: Vec<Card>, settings: Settings, now: Timestamp) -> Self {
        Self {
            queue: SessionQueue::due(cards, now),
            settings,
        }
    }

    pub fn queue(&self) -> &SessionQueue {
        &self.queue
    }

    pub fn current(&self) -> Option<&Card> {
        self.queue.current()
    }

    /// The due date each rating would give the current card.
    pub fn preview(&self, now: Timestamp) -> Option<[(Rating, Timestamp); 4]> {
        self.current()
            .map(|card| preview(&card.state, &self.settings, now))
    }

    /// Rate the current card and persist the result. If the write fails the
    /// queue is left untouched, so the same rating can be retried.
    pub fn rate<S: CardStore>(
        &mut self,
        store: &S,
        rating: Rating,
        now: Timestamp,
    ) -> Fallible<Card> {
        let rated = self.queue.rated(rating, &self.settings, now)?;
        log::debug!(
            "{} {} I={}d EF={:.2} due={}",
            rated.id.short(),
            rating,
            rated.state.interval_days,
            rated.state.ease_factor,
            rated.state.next_review_at
        );
        store.write_card(&rated)?;
        self.queue.advance(rated.clone(), rating)?;
        Ok(rated)
    }
}

/// A schedule-inert pass over a whole deck, navigable in both directions.
pub struct PracticeSession {
    cards: Vec<Card>,
    cursor: usize,
    shuffled: bool,
}

impl PracticeSession {
    /// The order is fixed here: shuffled once if requested, then never again.
    pub fn new<R: Rng + ?Sized>(mut cards: Vec<Card>, shuffle: bool, rng: &mut R) -> Self {
        if shuffle {
            cards.shuffle(rng);
        }
        Self {
            cards,
            cursor: 0,
            shuffled: shuffle,
        }
    }

    pub fn current(&self) -> Option<&Card> {
        self.cards.get(self.cursor)
    }

    /// Move forward. Returns `false` (and stays put) at the last card.
    pub fn next(&mut self) -> bool {
        if self.cursor + 1 < self.cards.len() {
            self.cursor += 1;
            true
        } else {
            false
        }
    }

    /// Move back. Returns `false` (and stays put) at the first card.
    pub fn previous(&mut self) -> bool {
        if self.cursor > 0 {
            self.cursor -= 1;
            true
        } else {
            false
        }
    }

    /// One-based position of the current card.
    pub fn position(&self) -> usize {
        self.cursor + 1
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}
