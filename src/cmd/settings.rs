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
use crate::store::CardStore;
use crate::types::settings::Settings;

/// Overwrite the given intervals, leaving the rest alone, and print the
/// result. With no changes this just prints the current settings.
pub fn settings(coll: &Collection, changes: Settings) -> Fallible<Settings> {
    let mut settings = coll.db.get_settings(&coll.user)?;
    let changed = changes != Settings::default();
    if changes.again_minutes.is_some() {
        settings.again_minutes = changes.again_minutes;
    }
    if changes.hard_days.is_some() {
        settings.hard_days = changes.hard_days;
    }
    if changes.good_days.is_some() {
        settings.good_days = changes.good_days;
    }
    if changes.easy_days.is_some() {
        settings.easy_days = changes.easy_days;
    }
    if changed {
        coll.db.put_settings(&coll.user, &settings)?;
    }
    println!("{}", serde_json::to_string_pretty(&settings)?);
    println!("{}", settings.summary());
    Ok(settings)
}
