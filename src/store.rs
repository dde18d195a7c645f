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

use crate::error::Fallible;
use crate::types::card::Card;
use crate::types::card_id::CardId;
use crate::types::settings::Settings;
use crate::types::timestamp::Timestamp;

/// What the scheduling core needs from persistence. Every lookup is scoped to
/// a user; a card owned by someone else is indistinguishable from a missing
/// one.
pub trait CardStore {
    /// Look up a card. Returns `None` if no card with this id belongs to
    /// `user`.
    fn get_card(&self, id: CardId, user: &str) -> Fallible<Option<Card>>;

    /// A user's settings. Users with no stored settings get the defaults.
    fn get_settings(&self, user: &str) -> Fallible<Settings>;

    /// Persist a card's state. Failures are retryable.
    fn write_card(&self, card: &Card) -> Fallible<()>;

    /// Cards due at `now`, optionally restricted to one deck, earliest first.
    fn find_due_cards(&self, user: &str, deck: Option<&str>, now: Timestamp)
    -> Fallible<Vec<Card>>;

    /// Every card, optionally restricted to one deck, in creation order.
    fn find_all_cards(&self, user: &str, deck: Option<&str>) -> Fallible<Vec<Card>>;
}
