use std::time::Duration;

use async_trait::async_trait;
use quiz_core::{Explainer, Symbol};
use serde::{Deserialize, Serialize};

const DEFAULT_URL: &str = "https://api.aimlapi.com/v1/chat/completions";
const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

/// Static rationale used when no service is configured at all.
const DEFAULT_EXPLANATION: &str = "Market momentum continued in the same direction.";

/// Marker glyph distinguishing degraded fallbacks from genuine answers.
const MARKER: &str = "\u{26a0}\u{fe0e}"; // ⚠︎

/// Hard bound on one explanation attempt; past it the in-flight request is
/// dropped and the transport rung of the fallback ladder applies.
const ATTEMPT_TIMEOUT: Duration = Duration::from_secs(15);

/// Body snippet length kept in HTTP-error fallbacks, for operator diagnosis.
const MAX_SNIPPET_CHARS: usize = 60;

const MAX_TOKENS: u32 = 40;
const SYSTEM_PROMPT: &str = "You are a concise crypto-market analyst.";

/// Configuration for the explanation service, read from the environment.
/// An empty API key means the service is unconfigured and no attempt is made.
#[derive(Debug, Clone)]
pub struct ExplainConfig {
    pub url: String,
    pub api_key: String,
    pub model: String,
}

impl Default for ExplainConfig {
    fn default() -> Self {
        Self {
            url: std::env::var("EXPLAIN_API_URL").unwrap_or_else(|_| DEFAULT_URL.to_string()),
            api_key: std::env::var("EXPLAIN_API_KEY").unwrap_or_default(),
            model: std::env::var("EXPLAIN_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
        }
    }
}

/// One attempt against the service, as a tagged union instead of nested
/// conditionals. `render` collapses it into the display string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExplainOutcome {
    /// Non-empty completion, used verbatim (trimmed).
    Answer(String),
    /// Successful response carrying no usable text.
    Empty,
    /// Non-success status, with a truncated body snippet.
    HttpError { status: u16, snippet: String },
    /// Timeout, connection failure, or any other transport-level error.
    Transport(String),
}

impl ExplainOutcome {
    pub fn render(self) -> String {
        match self {
            Self::Answer(text) => text,
            Self::Empty => format!("{MARKER} explain: empty answer"),
            Self::HttpError { status, snippet } => format!("{MARKER} explain {status}: {snippet}"),
            Self::Transport(message) => format!("{MARKER} explain error: {message}"),
        }
    }

    pub fn is_degraded(&self) -> bool {
        !matches!(self, Self::Answer(_))
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: Option<ChatChoiceMessage>,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

/// Client for the chat-style completion service that writes the one-line
/// rationale attached to each score.
#[derive(Clone)]
pub struct ExplainClient {
    client: reqwest::Client,
    config: ExplainConfig,
}

impl ExplainClient {
    pub fn new(config: ExplainConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(ATTEMPT_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self { client, config }
    }

    pub fn from_env() -> Self {
        Self::new(ExplainConfig::default())
    }

    async fn attempt(&self, prompt: &str) -> ExplainOutcome {
        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage { role: "system", content: SYSTEM_PROMPT },
                ChatMessage { role: "user", content: prompt },
            ],
            max_tokens: MAX_TOKENS,
        };

        let sent = self
            .client
            .post(&self.config.url)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send();

        let response = match tokio::time::timeout(ATTEMPT_TIMEOUT, sent).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => return ExplainOutcome::Transport(e.to_string()),
            Err(_) => {
                return ExplainOutcome::Transport(format!(
                    "timed out after {}s",
                    ATTEMPT_TIMEOUT.as_secs()
                ))
            }
        };

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if !status.is_success() {
            return ExplainOutcome::HttpError {
                status: status.as_u16(),
                snippet: truncate(&body, MAX_SNIPPET_CHARS),
            };
        }

        match extract_answer(&body) {
            Some(answer) => ExplainOutcome::Answer(answer),
            None => ExplainOutcome::Empty,
        }
    }
}

/// Pull the completion text out of a successful response body, if any.
fn extract_answer(body: &str) -> Option<String> {
    serde_json::from_str::<ChatResponse>(body)
        .ok()
        .and_then(|parsed| parsed.choices.into_iter().next())
        .and_then(|choice| choice.message)
        .and_then(|message| message.content)
        .map(|content| content.trim().to_string())
        .filter(|content| !content.is_empty())
}

#[async_trait]
impl Explainer for ExplainClient {
    async fn explain(&self, symbol: Symbol, actual: f64, guess: f64) -> String {
        if self.config.api_key.is_empty() {
            tracing::debug!("explanation service unconfigured, using static fallback");
            return DEFAULT_EXPLANATION.to_string();
        }

        let prompt = build_prompt(symbol, actual, guess);
        let outcome = self.attempt(&prompt).await;
        if outcome.is_degraded() {
            tracing::warn!(%symbol, ?outcome, "explanation degraded");
        }
        outcome.render()
    }
}

/// Build the ≤30-word rationale request for one scored round.
pub fn build_prompt(symbol: Symbol, actual: f64, guess: f64) -> String {
    format!(
        "Explain in at most 30 words why the next 1-hour candle for {} \
         closed at ${actual:.2} (user predicted ${guess}). \
         Mention short-term trend or volatility.",
        symbol.base_asset()
    )
}

fn truncate(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}
