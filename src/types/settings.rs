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

pub const DEFAULT_AGAIN_MINUTES: u32 = 1;
pub const DEFAULT_HARD_DAYS: u32 = 1;
pub const DEFAULT_GOOD_DAYS: u32 = 3;
pub const DEFAULT_EASY_DAYS: u32 = 7;

/// A user's scheduling preferences. Every field is optional: an absent (or
/// zero) value falls back to its default rather than being an error.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub again_minutes: Option<u32>,
    pub hard_days: Option<u32>,
    pub good_days: Option<u32>,
    pub easy_days: Option<u32>,
}

impl Settings {
    /// Minutes until a card rated Again is shown again.
    pub fn again_minutes(&self) -> u32 {
        positive_or(self.again_minutes, DEFAULT_AGAIN_MINUTES)
    }

    /// Days until a card rated Hard (for the first time in a row) is due.
    pub fn hard_days(&self) -> u32 {
        positive_or(self.hard_days, DEFAULT_HARD_DAYS)
    }

    /// Interval after the first successful review.
    pub fn good_days(&self) -> u32 {
        positive_or(self.good_days, DEFAULT_GOOD_DAYS)
    }

    /// Interval after the second successful review.
    pub fn easy_days(&self) -> u32 {
        positive_or(self.easy_days, DEFAULT_EASY_DAYS)
    }

    /// A one-line description of the effective settings, for prompts.
    pub fn summary(&self) -> String {
        format!(
            "Again: {} minute(s), Hard: {} day(s), Good: {} day(s), Easy: {} day(s)",
            self.again_minutes(),
            self.hard_days(),
            self.good_days(),
            self.easy_days()
        )
    }
}

fn positive_or(value: Option<u32>, default: u32) -> u32 {
    value.filter(|v| *v > 0).unwrap_or(default)
}
