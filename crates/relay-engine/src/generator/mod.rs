//! Text generation for issue drafts, commit messages, and pull requests.
//!
//! [`OpenRouterClient`] speaks the OpenAI-compatible chat completions API
//! exposed by OpenRouter.

mod openrouter;
mod prompt;

#[cfg(test)]
mod tests;

use async_trait::async_trait;
use serde::Serialize;

use crate::tracker::{IssueDraft, TrackerContext};

pub use openrouter::{DEFAULT_MODEL, GeneratorError, OpenRouterClient, OpenRouterConfig};

/// Title and description for a pull request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PullRequestDraft {
    pub title: String,
    pub body: String,
}

/// Language-model backed generator.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Turn a free-form task into a structured issue placed within `context`.
    async fn draft_issue(
        &self,
        task: &str,
        context: &TrackerContext,
    ) -> Result<IssueDraft, GeneratorError>;

    /// Conventional-commit message for the staged `files` and `diff`.
    async fn commit_message(&self, files: &[String], diff: &str) -> Result<String, GeneratorError>;

    /// Pull request for the branch's `commits` (subjects), changed `files`, and `diff`.
    async fn pull_request(
        &self,
        commits: &[String],
        files: &[String],
        diff: &str,
    ) -> Result<PullRequestDraft, GeneratorError>;
}
