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

//! The external reasoning oracle that may substitute its own due date for
//! the scheduler's.

use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;
use tokio::time::sleep;

use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::error::fail;
use crate::types::timestamp::Timestamp;

const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_TIMEOUT_MS: u64 = 60_000;
const DEFAULT_API_KEY_ENV: &str = "CARDWISE_API_KEY";
const MAX_RETRIES: u32 = 3;
const BASE_BACKOFF_MS: u64 = 200;

const SYSTEM_PROMPT: &str = "You reschedule flashcard reviews after a graded test. \
You receive a JSON object describing one card: its content, its current due date, \
whether the user answered correctly, the user's scheduling settings, and a target language. \
If the answer was incorrect, choose an earlier due date on the scale of the user's Again/Hard settings. \
If the answer was correct, choose a later due date; you may go past the current due date to reflect mastery. \
Reply with only a JSON object of the form \
{\"newReviewAt\": \"<RFC 3339 timestamp in UTC>\", \"reason\": \"<one short sentence in the target language>\"}.";

/// What the oracle is told about one card.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OracleRequest {
    pub card_content: String,
    pub current_due_date: Timestamp,
    pub correct: bool,
    pub user_settings_summary: String,
    pub target_language: String,
}

/// The oracle's raw answer.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OracleResponse {
    #[serde(alias = "newReviewAtIso8601")]
    new_review_at: String,
    reason: String,
}

/// A validated oracle answer.
#[derive(Clone, Debug, PartialEq)]
pub struct Suggestion {
    pub new_review_at: Timestamp,
    pub reason: String,
}

impl OracleResponse {
    fn validate(self) -> Fallible<Suggestion> {
        let new_review_at = Timestamp::parse(&self.new_review_at).map_err(|_| {
            ErrorReport::new(format!(
                "oracle returned an invalid timestamp: {:?}",
                self.new_review_at
            ))
        })?;
        let reason = self.reason.trim().to_string();
        if reason.is_empty() {
            return fail("oracle returned an empty reason.");
        }
        Ok(Suggestion {
            new_review_at,
            reason,
        })
    }
}

#[allow(async_fn_in_trait)]
pub trait Oracle {
    /// Ask for a new due date for one card.
    async fn suggest(&self, request: &OracleRequest) -> Fallible<Suggestion>;
}

/// Extract a suggestion from the oracle's reply text. Tolerates Markdown code
/// fences and prose around the JSON object.
pub fn parse_suggestion(text: &str) -> Fallible<Suggestion> {
    let start = text.find('{');
    let end = text.rfind('}');
    let json = match (start, end) {
        (Some(start), Some(end)) if start < end => &text[start..=end],
        _ => return fail(format!("oracle reply contains no JSON object: {text:?}")),
    };
    let response: OracleResponse = serde_json::from_str(json)?;
    response.validate()
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct OracleConfig {
    /// Base URL of an OpenAI-compatible API.
    pub endpoint: String,
    pub model: String,
    pub timeout_ms: u64,
    /// The environment variable holding the API key.
    pub api_key_env: String,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
        }
    }
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    stream: bool,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    content: String,
}

/// An oracle backed by an OpenAI-compatible chat completions API.
pub struct HttpOracle {
    config: OracleConfig,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl HttpOracle {
    /// Build a client, reading the API key from the environment variable
    /// named in the config.
    pub fn new(config: OracleConfig) -> Fallible<Self> {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty());
        Self::with_api_key(config, api_key)
    }

    pub fn with_api_key(config: OracleConfig, api_key: Option<String>) -> Fallible<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;
        Ok(Self {
            config,
            api_key,
            client,
        })
    }

    fn url(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.endpoint.trim_end_matches('/')
        )
    }

    async fn post_with_retry(&self, api_key: &str, body: &ChatRequest<'_>) -> Fallible<String> {
        let url = self.url();
        let mut retry = 0;
        loop {
            let err = match self
                .client
                .post(&url)
                .bearer_auth(api_key)
                .json(body)
                .send()
                .await
            {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        let chat: ChatResponse = response.json().await?;
                        return match chat.choices.into_iter().next() {
                            Some(choice) => Ok(choice.message.content),
                            None => fail("oracle returned no choices."),
                        };
                    }
                    let text = response.text().await.unwrap_or_default();
                    let err = ErrorReport::new(format!("oracle returned HTTP {status}: {text}"));
                    if !is_retryable(status) {
                        return Err(err);
                    }
                    err
                }
                Err(e) => ErrorReport::from(e),
            };
            if retry >= MAX_RETRIES {
                return Err(err);
            }
            let backoff = Duration::from_millis(BASE_BACKOFF_MS * (1u64 << retry));
            log::warn!("Oracle request failed ({err}), retrying in {backoff:?}");
            sleep(backoff).await;
            retry += 1;
        }
    }
}

impl Oracle for HttpOracle {
    async fn suggest(&self, request: &OracleRequest) -> Fallible<Suggestion> {
        let Some(api_key) = self.api_key.as_deref() else {
            return fail(format!(
                "oracle is not configured: set {}",
                self.config.api_key_env
            ));
        };
        let user = serde_json::to_string(request)?;
        let body = ChatRequest {
            model: &self.config.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: &user,
                },
            ],
            stream: false,
        };
        let reply = self.post_with_retry(api_key, &body).await?;
        parse_suggestion(&reply)
    }
}

fn is_retryable(status: reqwest::StatusCode) -> bool {
    status == reqwest::StatusCode::TOO_MANY_REQUESTS
        || status == reqwest::StatusCode::REQUEST_TIMEOUT
        || status.is_server_error()
}
