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

use crate::types::rating::Rating;
use crate::types::timestamp::Timestamp;

/// The ease factor of a card that has never been studied.
pub const INITIAL_EASE: f64 = 2.5;

/// The ease factor never drops below this.
pub const MIN_EASE: f64 = 1.3;

/// The longest interval the scheduler will produce: a hundred years.
pub const MAX_INTERVAL_DAYS: u32 = 36_500;

/// A card's scheduling state.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardState {
    /// Multiplier for mature intervals. Always at least `MIN_EASE`.
    pub ease_factor: f64,
    /// Days until the next review. Zero for cards that lapsed with Again. At
    /// most `MAX_INTERVAL_DAYS` when computed by the scheduler.
    pub interval_days: u32,
    /// Consecutive Good/Easy ratings since the last lapse.
    pub repetitions: u32,
    /// The most recent rating, if the card has ever been rated.
    pub last_rating: Option<Rating>,
    /// When the card is next due.
    pub next_review_at: Timestamp,
    /// Who chose `next_review_at`.
    pub due_source: DueSource,
}

/// Whether a card's due date was computed by the scheduler or substituted by
/// the reasoning oracle.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum DueSource {
    /// `next_review_at` follows from the previous state, the rating, and the
    /// user's settings.
    Algorithm,
    /// `next_review_at` was chosen by the oracle.
    Oracle(Override),
}

/// The audit trail of an oracle override.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Override {
    pub reason: String,
    pub previous_review_at: Timestamp,
}

impl CardState {
    /// The state of a card that has never been studied.
    pub fn new(now: Timestamp) -> Self {
        Self {
            ease_factor: INITIAL_EASE,
            interval_days: 0,
            repetitions: 0,
            last_rating: None,
            next_review_at: now,
            due_source: DueSource::Algorithm,
        }
    }

    pub fn is_due(&self, now: Timestamp) -> bool {
        self.next_review_at <= now
    }

    pub fn override_info(&self) -> Option<&Override> {
        match &self.due_source {
            DueSource::Algorithm => None,
            DueSource::Oracle(o) => Some(o),
        }
    }

    /// True if this state equals a freshly created card's, ignoring the due
    /// date.
    pub fn is_new(&self) -> bool {
        self.ease_factor == INITIAL_EASE
            && self.interval_days == 0
            && self.repetitions == 0
            && self.last_rating.is_none()
            && self.due_source == DueSource::Algorithm
    }
}
