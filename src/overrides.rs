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

//! Lets the reasoning oracle reschedule cards after a graded test.
//!
//! Only the due date changes. Ease, interval and repetitions are left alone,
//! and the previous due date is kept alongside the oracle's reason so the
//! change can be audited and reverted.

use serde::Deserialize;

use crate::error::Fallible;
use crate::oracle::Oracle;
use crate::oracle::OracleRequest;
use crate::oracle::Suggestion;
use crate::store::CardStore;
use crate::types::card::Card;
use crate::types::card_id::CardId;
use crate::types::card_state::DueSource;
use crate::types::card_state::Override;
use crate::types::settings::Settings;

/// One graded test question, traced back to the card it was generated from.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradedResult {
    pub question: String,
    #[serde(default)]
    pub user_answer: Option<String>,
    pub correct_answer: String,
    #[serde(alias = "sourceCardIdentifier")]
    pub source_card_id: String,
}

impl GradedResult {
    pub fn is_answered(&self) -> bool {
        self.user_answer
            .as_deref()
            .is_some_and(|answer| !answer.trim().is_empty())
    }

    pub fn is_correct(&self) -> bool {
        self.user_answer.as_deref() == Some(self.correct_answer.as_str())
    }
}

/// What to do when one card in a batch fails.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Log the failure, record it in the report, and carry on.
    #[default]
    Isolate,
    /// Stop at the first failure and return it. Cards already processed keep
    /// their overrides. Unresolvable cards are still skipped silently.
    FailFast,
}

#[derive(Debug, Default, PartialEq)]
pub struct OverrideReport {
    /// Cards whose due date was replaced.
    pub applied: Vec<CardId>,
    /// Results skipped because the question was not answered.
    pub unanswered: usize,
    /// Source identifiers that did not resolve to one of the user's cards.
    pub unresolved: Vec<String>,
    /// Source identifiers whose override failed, with the error message.
    pub failed: Vec<(String, String)>,
}

enum Outcome {
    Applied(CardId),
    Unresolved,
}

/// Replace a card's due date with the oracle's, recording the old one.
pub fn apply_override(card: &Card, suggestion: Suggestion) -> Card {
    let mut card = card.clone();
    card.state.due_source = DueSource::Oracle(Override {
        reason: suggestion.reason,
        previous_review_at: card.state.next_review_at,
    });
    card.state.next_review_at = suggestion.new_review_at;
    card
}

/// Ask the oracle to reschedule the card behind every answered result.
/// Results are processed one at a time, in order.
pub async fn override_schedules<S: CardStore, O: Oracle>(
    store: &S,
    oracle: &O,
    user: &str,
    results: &[GradedResult],
    language: &str,
    policy: FailurePolicy,
) -> Fallible<OverrideReport> {
    let settings = store.get_settings(user)?;
    let mut report = OverrideReport::default();
    for result in results {
        if !result.is_answered() {
            report.unanswered += 1;
            continue;
        }
        match override_one(store, oracle, user, result, &settings, language).await {
            Ok(Outcome::Applied(id)) => report.applied.push(id),
            Ok(Outcome::Unresolved) => {
                log::debug!("Skipping unknown card: {}", result.source_card_id);
                report.unresolved.push(result.source_card_id.clone());
            }
            Err(err) => match policy {
                FailurePolicy::Isolate => {
                    log::warn!("Override failed for {}: {err}", result.source_card_id);
                    report
                        .failed
                        .push((result.source_card_id.clone(), err.message().to_string()));
                }
                FailurePolicy::FailFast => return Err(err),
            },
        }
    }
    log::info!(
        "Overrides: {} applied, {} unanswered, {} unresolved, {} failed",
        report.applied.len(),
        report.unanswered,
        report.unresolved.len(),
        report.failed.len()
    );
    Ok(report)
}

async fn override_one<S: CardStore, O: Oracle>(
    store: &S,
    oracle: &O,
    user: &str,
    result: &GradedResult,
    settings: &Settings,
    language: &str,
) -> Fallible<Outcome> {
    let Ok(id) = CardId::from_hex(&result.source_card_id) else {
        return Ok(Outcome::Unresolved);
    };
    let Some(card) = store.get_card(id, user)? else {
        return Ok(Outcome::Unresolved);
    };
    log::debug!("Asking oracle about {} ({:?})", id.short(), result.question);
    let request = OracleRequest {
        card_content: card.content(),
        current_due_date: card.state.next_review_at,
        correct: result.is_correct(),
        user_settings_summary: settings.summary(),
        target_language: language.to_string(),
    };
    let suggestion = oracle.suggest(&request).await?;
    let updated = apply_override(&card, suggestion);
    store.write_card(&updated)?;
    log::debug!(
        "{} rescheduled by oracle: {} -> {}",
        id.short(),
        card.state.next_review_at,
        updated.state.next_review_at
    );
    Ok(Outcome::Applied(id))
}
