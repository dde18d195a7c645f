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

use std::fmt::Display;
use std::fmt::Formatter;

use chrono::DateTime;
use chrono::Duration;
use chrono::SecondsFormat;
use chrono::SubsecRound;
use chrono::Utc;
use rusqlite::ToSql;
use rusqlite::types::FromSql;
use rusqlite::types::FromSqlError;
use rusqlite::types::FromSqlResult;
use rusqlite::types::ToSqlOutput;
use rusqlite::types::ValueRef;
use serde::Serialize;

use crate::error::Fallible;

/// 9999-12-31T23:59:59Z. Later instants need a signed five-digit year, which
/// breaks the lexical ordering of stored timestamps.
const LATEST_SECS: i64 = 253_402_300_799;

/// An absolute point in time, always in UTC, with microsecond precision.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    pub fn new(ts: DateTime<Utc>) -> Self {
        Self(ts.trunc_subsecs(6))
    }

    /// The latest timestamp that can be stored. Date arithmetic saturates
    /// here.
    pub fn latest() -> Self {
        let ts = DateTime::from_timestamp(LATEST_SECS, 999_999_000);
        Self(ts.unwrap_or(DateTime::<Utc>::MAX_UTC))
    }

    /// The current time, truncated to the microsecond precision it is
    /// stored with.
    pub fn now() -> Self {
        Self(Utc::now().trunc_subsecs(6))
    }

    /// Parse an RFC 3339 timestamp. Any offset is accepted and normalized to
    /// UTC.
    pub fn parse(s: &str) -> Fallible<Self> {
        let ts = DateTime::parse_from_rfc3339(s.trim())?;
        Ok(Self(ts.with_timezone(&Utc).trunc_subsecs(6)))
    }

    pub fn plus_minutes(self, minutes: u32) -> Self {
        self.saturating_add(Duration::minutes(i64::from(minutes)))
    }

    pub fn plus_days(self, days: u32) -> Self {
        self.saturating_add(Duration::days(i64::from(days)))
    }

    fn saturating_add(self, delta: Duration) -> Self {
        let latest = Self::latest();
        match self.0.checked_add_signed(delta) {
            Some(ts) if ts <= latest.0 => Self(ts),
            _ => latest,
        }
    }

    pub fn into_inner(self) -> DateTime<Utc> {
        self.0
    }

    /// Fixed-width rendering, so that stored timestamps sort lexically in
    /// chronological order.
    pub fn to_rfc3339(self) -> String {
        self.0.to_rfc3339_opts(SecondsFormat::Micros, true)
    }
}

impl Display for Timestamp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_rfc3339())
    }
}

impl ToSql for Timestamp {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.to_rfc3339()))
    }
}

impl FromSql for Timestamp {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let string: String = FromSql::column_result(value)?;
        let ts =
            DateTime::parse_from_rfc3339(&string).map_err(|e| FromSqlError::Other(Box::new(e)))?;
        Ok(Timestamp(ts.with_timezone(&Utc)))
    }
}

impl Serialize for Timestamp {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_rfc3339())
    }
}
