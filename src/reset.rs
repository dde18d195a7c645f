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
use crate::store::CardStore;
use crate::types::card_id::CardId;
use crate::types::card_state::CardState;
use crate::types::timestamp::Timestamp;

#[derive(Debug, Default, PartialEq)]
pub struct ResetReport {
    pub reset: Vec<CardId>,
    /// Ids that do not belong to the user.
    pub missing: Vec<CardId>,
}

/// Return cards to their never-studied state, due at `now`, clearing any
/// oracle override. The cards keep their identity. Idempotent.
pub fn reset_cards<S: CardStore>(
    store: &S,
    user: &str,
    ids: &[CardId],
    now: Timestamp,
) -> Fallible<ResetReport> {
    let mut report = ResetReport::default();
    for id in ids {
        match store.get_card(*id, user)? {
            Some(mut card) => {
                card.state = CardState::new(now);
                store.write_card(&card)?;
                log::debug!("{} reset", id.short());
                report.reset.push(*id);
            }
            None => {
                log::warn!("Cannot reset unknown card: {id}");
                report.missing.push(*id);
            }
        }
    }
    Ok(report)
}
