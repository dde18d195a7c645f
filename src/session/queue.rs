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

use std::collections::VecDeque;

use crate::error::Fallible;
use crate::error::fail;
use crate::scheduler::next_state;
use crate::types::card::Card;
use crate::types::rating::Rating;
use crate::types::settings::Settings;
use crate::types::timestamp::Timestamp;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SessionStatus {
    /// No card has been rated yet.
    Pending,
    /// At least one card has been rated and cards remain.
    InProgress,
    /// The queue is empty.
    Complete,
}

/// The order in which one study session shows its cards.
///
/// Strict FIFO: the card at the front is the one being shown. Rating a card
/// removes it from the front; a card rated Again goes to the back, carrying
/// its updated state, and is shown again before the session ends. Nothing is
/// ever reordered by priority or due date.
pub struct SessionQueue {
    cards: VecDeque<Card>,
    total: usize,
    reviews: usize,
    finished: usize,
}

impl SessionQueue {
    pub fn new(cards: Vec<Card>) -> Self {
        let total = cards.len();
        Self {
            cards: cards.into(),
            total,
            reviews: 0,
            finished: 0,
        }
    }

    /// A queue of the cards that are due at `now`, in the given order.
    pub fn due(cards: Vec<Card>, now: Timestamp) -> Self {
        let due: Vec<Card> = cards
            .into_iter()
            .filter(|card| card.state.is_due(now))
            .collect();
        Self::new(due)
    }

    pub fn status(&self) -> SessionStatus {
        if self.cards.is_empty() {
            SessionStatus::Complete
        } else if self.reviews == 0 {
            SessionStatus::Pending
        } else {
            SessionStatus::InProgress
        }
    }

    /// The card currently being shown.
    pub fn current(&self) -> Option<&Card> {
        self.cards.front()
    }

    /// Cards left in the queue, counting requeued cards.
    pub fn remaining(&self) -> usize {
        self.cards.len()
    }

    /// The number of cards the session started with.
    pub fn total(&self) -> usize {
        self.total
    }

    /// The number of cards that have left the session for good.
    pub fn finished(&self) -> usize {
        self.finished
    }

    /// The number of ratings applied so far.
    pub fn reviews(&self) -> usize {
        self.reviews
    }

    /// The current card as it would be after `rating`. Nothing moves until
    /// [`SessionQueue::advance`] is called with the result.
    pub fn rated(&self, rating: Rating, settings: &Settings, now: Timestamp) -> Fallible<Card> {
        let Some(card) = self.current() else {
            return fail("session is complete.");
        };
        let mut rated = card.clone();
        rated.state = next_state(&card.state, rating, settings, now);
        Ok(rated)
    }

    /// Remove the current card from the front of the queue, replacing it with
    /// its rated version. A card rated Again goes to the back.
    pub fn advance(&mut self, rated: Card, rating: Rating) -> Fallible<()> {
        match self.cards.front() {
            None => return fail("session is complete."),
            Some(front) if front.id != rated.id => {
                return fail(format!(
                    "rated card {} is not the current card {}",
                    rated.id.short(),
                    front.id.short()
                ));
            }
            Some(_) => {}
        }
        self.cards.pop_front();
        self.reviews += 1;
        if rating == Rating::Again {
            self.cards.push_back(rated);
        } else {
            self.finished += 1;
        }
        Ok(())
    }
}
