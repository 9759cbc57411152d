//! OpenRouter chat completions client.

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::Deserialize;
use serde_json::{Value, json};
use thiserror::Error;
use tracing::{debug, warn};

use super::prompt::{commit_prompt, issue_prompt, pull_request_prompt};
use super::{Generator, PullRequestDraft};
use crate::tracker::{IssueDraft, TrackerContext};

pub const OPENROUTER_API_URL: &str = "https://openrouter.ai/api/v1";

/// Model used when none is configured.
pub const DEFAULT_MODEL: &str = "x-ai/grok-4-fast";

const TEMPERATURE: f64 = 0.7;

/// Generator client errors.
#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("OpenRouter API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Unusable model response: {0}")]
    InvalidResponse(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<GeneratorError> for relay_core::Error {
    fn from(e: GeneratorError) -> Self {
        Self::external("OpenRouter", e.to_string())
    }
}

/// Connection settings for OpenRouter.
#[derive(Debug, Clone)]
pub struct OpenRouterConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
}

impl OpenRouterConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            base_url: OPENROUTER_API_URL.into(),
            api_key: api_key.into(),
            model: DEFAULT_MODEL.into(),
        }
    }
}

/// OpenAI-compatible chat completions client pointed at OpenRouter.
#[derive(Debug)]
pub struct OpenRouterClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

impl OpenRouterClient {
    pub fn new(config: &OpenRouterConfig) -> Result<Self, GeneratorError> {
        if config.base_url.is_empty() {
            return Err(GeneratorError::Config("base_url is empty".into()));
        }
        if config.api_key.is_empty() {
            return Err(GeneratorError::Config("OpenRouter API key is empty".into()));
        }

        let mut headers = HeaderMap::new();
        let token = HeaderValue::from_str(&format!("Bearer {}", config.api_key))
            .map_err(|_| GeneratorError::Config("Invalid API key format".into()))?;
        headers.insert(AUTHORIZATION, token);

        // reqwest is built with rustls-no-provider; Err means already installed.
        let _ = rustls::crypto::ring::default_provider().install_default();

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
        })
    }

    pub(crate) fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    async fn complete(
        &self,
        prompt: &str,
        response_format: Option<Value>,
    ) -> Result<String, GeneratorError> {
        let mut body = json!({
            "model": self.model,
            "temperature": TEMPERATURE,
            "messages": [{ "role": "user", "content": prompt }],
        });
        if let Some(format) = response_format {
            body["response_format"] = format;
        }

        let start = std::time::Instant::now();
        let resp = self.http.post(self.completions_url()).json(&body).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&text)
                .map(|b| b.error.message)
                .unwrap_or_else(|_| status.canonical_reason().unwrap_or("Unknown").into());
            return Err(GeneratorError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: ChatResponse = resp.json().await?;
        debug!(
            model = %self.model,
            elapsed_ms = start.elapsed().as_millis(),
            "openrouter: completion received"
        );
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .ok_or_else(|| GeneratorError::InvalidResponse("empty completion".into()))
    }
}

fn issue_schema() -> Value {
    json!({
        "type": "json_schema",
        "json_schema": {
            "name": "issue",
            "strict": true,
            "schema": {
                "type": "object",
                "properties": {
                    "title": { "type": "string" },
                    "description": { "type": "string" },
                    "projectId": { "type": ["string", "null"] },
                    "labelIds": { "type": "array", "items": { "type": "string" } },
                    "priority": { "type": "integer", "minimum": 0, "maximum": 4 },
                    "assigneeId": { "type": ["string", "null"] }
                },
                "required": ["title", "description", "projectId", "labelIds", "priority", "assigneeId"],
                "additionalProperties": false
            }
        }
    })
}

/// Strip a surrounding markdown code fence, which some models add anyway.
fn strip_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.trim_start_matches("json");
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Drop ids the tracker never offered and reject out-of-range priorities.
pub(crate) fn sanitize_draft(
    mut draft: IssueDraft,
    context: &TrackerContext,
) -> Result<IssueDraft, GeneratorError> {
    if draft.title.trim().is_empty() {
        return Err(GeneratorError::InvalidResponse("draft has an empty title".into()));
    }
    if draft.priority > 4 {
        return Err(GeneratorError::InvalidResponse(format!(
            "priority {} is outside 0-4",
            draft.priority
        )));
    }
    if let Some(project_id) = &draft.project_id {
        if !context.projects.iter().any(|p| &p.id == project_id) {
            warn!(project_id = %project_id, "Dropping unknown project suggested by model");
            draft.project_id = None;
        }
    }
    draft.label_ids.retain(|id| {
        let known = context.labels.iter().any(|l| &l.id == id);
        if !known {
            warn!(label_id = %id, "Dropping unknown label suggested by model");
        }
        known
    });
    Ok(draft)
}

/// Split model output into a title line and a body.
///
/// The title is the first non-blank line that is not a markdown heading, with
/// any `Title:` label removed. Falls back to the first commit subject.
pub(crate) fn parse_pull_request(text: &str, commits: &[String]) -> PullRequestDraft {
    let text = strip_fence(text);
    let lines: Vec<&str> = text.lines().collect();
    let title_idx = lines
        .iter()
        .position(|l| !l.trim().is_empty() && !l.trim_start().starts_with('#'));

    let title = title_idx
        .map(|i| strip_title_label(lines[i].trim()).trim_matches('*').trim())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .or_else(|| commits.first().cloned())
        .unwrap_or_else(|| "Update".into());

    let body = title_idx
        .map(|i| lines[i + 1..].join("\n").trim().to_string())
        .filter(|b| !b.is_empty())
        .unwrap_or_else(|| "See commits for details.".into());

    PullRequestDraft { title, body }
}

fn strip_title_label(line: &str) -> &str {
    let lower = line.to_ascii_lowercase();
    for label in ["pr title:", "title:"] {
        if lower.starts_with(label) {
            return &line[label.len()..];
        }
    }
    line
}

#[async_trait]
impl Generator for OpenRouterClient {
    async fn draft_issue(
        &self,
        task: &str,
        context: &TrackerContext,
    ) -> Result<IssueDraft, GeneratorError> {
        let content = self
            .complete(&issue_prompt(task, context), Some(issue_schema()))
            .await?;
        let draft: IssueDraft = serde_json::from_str(strip_fence(&content))
            .map_err(|e| GeneratorError::InvalidResponse(format!("draft is not valid JSON: {e}")))?;
        sanitize_draft(draft, context)
    }

    async fn commit_message(&self, files: &[String], diff: &str) -> Result<String, GeneratorError> {
        let content = self.complete(&commit_prompt(files, diff), None).await?;
        Ok(strip_fence(&content).to_string())
    }

    async fn pull_request(
        &self,
        commits: &[String],
        files: &[String],
        diff: &str,
    ) -> Result<PullRequestDraft, GeneratorError> {
        let content = self
            .complete(&pull_request_prompt(commits, files, diff), None)
            .await?;
        Ok(parse_pull_request(&content, commits))
    }
}
