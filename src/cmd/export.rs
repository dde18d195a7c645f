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

use crate::collection::Collection;
use crate::error::Fallible;
use crate::store::CardStore;
use crate::types::card::Card;
use crate::types::settings::Settings;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Export {
    pub user: String,
    pub settings: Settings,
    pub cards: Vec<Card>,
}

pub fn export(coll: &Collection, deck: Option<&str>) -> Fallible<()> {
    let export = get_export(coll, deck)?;
    println!("{}", serde_json::to_string_pretty(&export)?);
    Ok(())
}

pub fn get_export(coll: &Collection, deck: Option<&str>) -> Fallible<Export> {
    let cards = coll.db.find_all_cards(&coll.user, deck)?;
    Ok(Export {
        user: coll.user.clone(),
        settings: coll.db.get_settings(&coll.user)?,
        cards,
    })
}
