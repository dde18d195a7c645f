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

use crate::collection::Collection;
use crate::error::Fallible;
use crate::error::fail;
use crate::oracle::HttpOracle;
use crate::overrides::FailurePolicy;
use crate::overrides::GradedResult;
use crate::overrides::OverrideReport;
use crate::overrides::override_schedules;

/// Read graded test results from a JSON file.
pub fn read_results(path: &Path) -> Fallible<Vec<GradedResult>> {
    if !path.exists() {
        return fail("results file does not exist.");
    }
    let text = read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

pub async fn apply_test_results(
    coll: &Collection,
    path: &Path,
    language: &str,
    policy: FailurePolicy,
) -> Fallible<OverrideReport> {
    let results = read_results(path)?;
    let oracle = HttpOracle::new(coll.config.oracle.clone())?;
    let report = override_schedules(&coll.db, &oracle, &coll.user, &results, language, policy).await?;
    println!(
        "{} rescheduled, {} unanswered, {} unknown, {} failed.",
        report.applied.len(),
        report.unanswered,
        report.unresolved.len(),
        report.failed.len()
    );
    for (id, message) in &report.failed {
        eprintln!("{id}: {message}");
    }
    Ok(report)
}
