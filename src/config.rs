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

use std::fs::read_to_string;
use std::path::Path;

use serde::Deserialize;

use crate::error::Fallible;
use crate::error::fail;
use crate::oracle::OracleConfig;

const DEFAULT_CONFIG_PATH: &str = "cardwise.toml";
const DEFAULT_DATABASE_PATH: &str = "cardwise.db";
const DEFAULT_USER: &str = "default";

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Path to the SQLite database.
    pub database: String,
    /// The user whose cards commands act on.
    pub user: String,
    pub oracle: OracleConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: DEFAULT_DATABASE_PATH.to_string(),
            user: DEFAULT_USER.to_string(),
            oracle: OracleConfig::default(),
        }
    }
}

impl Config {
    /// Load the config. An explicit path must exist; otherwise `cardwise.toml`
    /// in the working directory is used if present, and the defaults if not.
    pub fn load(path: Option<&Path>) -> Fallible<Self> {
        match path {
            Some(path) => {
                if !path.exists() {
                    return fail("config file does not exist.");
                }
                Self::parse(&read_to_string(path)?)
            }
            None => {
                let path = Path::new(DEFAULT_CONFIG_PATH);
                if path.exists() {
                    log::debug!("Loading config from {DEFAULT_CONFIG_PATH}");
                    Self::parse(&read_to_string(path)?)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn parse(text: &str) -> Fallible<Self> {
        Ok(toml::from_str(text)?)
    }
}
