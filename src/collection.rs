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

use std::path::PathBuf;

use crate::config::Config;
use crate::db::Database;
use crate::error::Fallible;

/// Everything a command needs: the config, the open database, and the user
/// whose cards are being worked on.
pub struct Collection {
    pub config: Config,
    pub db: Database,
    pub user: String,
}

impl Collection {
    pub fn open(config_path: Option<String>, user: Option<String>) -> Fallible<Self> {
        let config_path: Option<PathBuf> = config_path.map(PathBuf::from);
        let config = Config::load(config_path.as_deref())?;
        let user = user.unwrap_or_else(|| config.user.clone());
        log::debug!("Opening {} as {user}", config.database);
        let db = Database::new(&config.database)?;
        Ok(Self { config, db, user })
    }

    /// An in-memory collection, for tests.
    #[cfg(test)]
    pub fn in_memory(user: &str) -> Fallible<Self> {
        Ok(Self {
            config: Config::default(),
            db: Database::new(":memory:")?,
            user: user.to_string(),
        })
    }
}
