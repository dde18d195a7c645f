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

use crate::collection::Collection;
use crate::error::Fallible;
use crate::reset::ResetReport;
use crate::reset::reset_cards;
use crate::types::card_id::CardId;
use crate::types::timestamp::Timestamp;

pub fn reset(coll: &Collection, ids: &[String]) -> Fallible<ResetReport> {
    let ids: Vec<CardId> = ids
        .iter()
        .map(|id| CardId::from_hex(id))
        .collect::<Fallible<_>>()?;
    let report = reset_cards(&coll.db, &coll.user, &ids, Timestamp::now())?;
    println!("Reset {} card(s).", report.reset.len());
    for id in &report.missing {
        eprintln!("No such card: {id}");
    }
    Ok(report)
}
