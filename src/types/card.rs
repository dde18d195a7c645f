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
use crate::types::card_state::CardState;
use crate::types::timestamp::Timestamp;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    /// The card's stable identity.
    pub id: CardId,
    /// The user who owns the card.
    pub user: String,
    /// The name of the deck this card belongs to.
    pub deck: String,
    pub front: String,
    pub back: String,
    /// The card's scheduling state.
    pub state: CardState,
}

impl Card {
    /// Create a card that has never been studied, due at `now`.
    pub fn new(
        user: impl Into<String>,
        deck: impl Into<String>,
        front: impl Into<String>,
        back: impl Into<String>,
        now: Timestamp,
    ) -> Self {
        let user = user.into();
        let deck = deck.into();
        let front = front.into().trim().to_string();
        let back = back.into().trim().to_string();
        let id = CardId::derive(&user, &deck, &front, &back);
        Self {
            id,
            user,
            deck,
            front,
            back,
            state: CardState::new(now),
        }
    }

    /// The card's text, as shown to the reasoning oracle.
    pub fn content(&self) -> String {
        format!("Front: {}\nBack: {}", self.front, self.back)
    }
}
