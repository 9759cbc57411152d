//! Tests for the OpenRouter generator.

#![allow(clippy::unwrap_used, clippy::panic)]

use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::openrouter::sanitize_draft;
use super::prompt::{
    commit_prompt, issue_prompt, pull_request_prompt, truncate_chars, MAX_DIFF_CHARS,
    MAX_PR_DIFF_CHARS,
};
use super::{Generator, GeneratorError, OpenRouterClient, OpenRouterConfig};
use crate::tracker::{IssueDraft, Label, Project, Team, TrackerContext};

fn context() -> TrackerContext {
    TrackerContext {
        teams: vec![Team {
            id: "t1".into(),
            name: "Engineering".into(),
            key: "ENG".into(),
        }],
        projects: vec![Project {
            id: "p1".into(),
            name: "Auth".into(),
            description: Some("Login and sessions".into()),
            team_id: Some("t1".into()),
        }],
        labels: vec![
            Label {
                id: "l1".into(),
                name: "bug".into(),
                description: None,
            },
            Label {
                id: "l2".into(),
                name: "frontend".into(),
                description: None,
            },
        ],
    }
}

fn client_for(server: &MockServer) -> OpenRouterClient {
    OpenRouterClient::new(&OpenRouterConfig {
        base_url: server.uri(),
        api_key: "sk-or-test".into(),
        model: "test/model".into(),
    })
    .unwrap()
}

fn completion(content: &str) -> serde_json::Value {
    json!({ "choices": [{ "message": { "role": "assistant", "content": content } }] })
}

#[test]
fn empty_key_returns_config_error() {
    let err = OpenRouterClient::new(&OpenRouterConfig::new("")).unwrap_err();
    assert!(matches!(err, GeneratorError::Config(_)));
}

#[test]
fn issue_prompt_lists_context_ids() {
    let prompt = issue_prompt("fix login bug", &context());
    assert!(prompt.contains("\"fix login bug\""));
    assert!(prompt.contains("ENG, id t1"));
    assert!(prompt.contains("id p1"));
    assert!(prompt.contains("id l2"));
}

#[test]
fn commit_prompt_truncates_diff() {
    let diff = "x".repeat(MAX_DIFF_CHARS + 500);
    let prompt = commit_prompt(&["src/main.rs".into()], &diff);
    assert!(prompt.contains("src/main.rs"));
    assert!(!prompt.contains(&diff));
}

#[test]
fn truncate_respects_char_boundaries() {
    assert_eq!(truncate_chars("héllo", 2), "hé");
    assert_eq!(truncate_chars("abc", 10), "abc");
}

#[test]
fn sanitize_drops_unknown_ids() {
    let draft = IssueDraft {
        title: "Fix login bug".into(),
        description: "d".into(),
        project_id: Some("nope".into()),
        label_ids: vec!["l1".into(), "ghost".into()],
        priority: 2,
        assignee_id: None,
    };
    let clean = sanitize_draft(draft, &context()).unwrap();
    assert!(clean.project_id.is_none());
    assert_eq!(clean.label_ids, vec!["l1".to_string()]);
}

#[test]
fn sanitize_rejects_bad_priority() {
    let draft = IssueDraft {
        title: "t".into(),
        description: "d".into(),
        project_id: None,
        label_ids: vec![],
        priority: 9,
        assignee_id: None,
    };
    assert!(matches!(
        sanitize_draft(draft, &context()),
        Err(GeneratorError::InvalidResponse(_))
    ));
}

#[tokio::test]
async fn draft_issue_parses_structured_output() {
    let server = MockServer::start().await;
    let draft = json!({
        "title": "Fix login bug",
        "description": "Users cannot log in.\n- [ ] login works",
        "projectId": "p1",
        "labelIds": ["l1", "l2"],
        "priority": 2,
        "assigneeId": null
    });
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer sk-or-test"))
        .and(body_string_contains("json_schema"))
        .and(body_string_contains("test/model"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(&draft.to_string())))
        .expect(1)
        .mount(&server)
        .await;

    let out = client_for(&server)
        .draft_issue("fix login bug", &context())
        .await
        .unwrap();
    assert_eq!(out.title, "Fix login bug");
    assert_eq!(out.project_id.as_deref(), Some("p1"));
    assert_eq!(out.label_ids.len(), 2);
    assert_eq!(out.priority, 2);
}

#[tokio::test]
async fn draft_issue_invalid_json_is_invalid_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("not json at all")))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .draft_issue("x", &context())
        .await
        .unwrap_err();
    assert!(matches!(err, GeneratorError::InvalidResponse(_)));
}

#[tokio::test]
async fn commit_message_is_trimmed_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_string_contains("Changed files"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(completion("\n  fix(auth): handle expired tokens \n")),
        )
        .mount(&server)
        .await;

    let msg = client_for(&server)
        .commit_message(&["src/auth.rs".into()], "diff --git a/src/auth.rs")
        .await
        .unwrap();
    assert_eq!(msg, "fix(auth): handle expired tokens");
}

#[test]
fn pull_request_prompt_lists_commits_and_files() {
    let diff = "y".repeat(MAX_PR_DIFF_CHARS + 1);
    let prompt = pull_request_prompt(
        &["fix(auth): retry".into(), "test: cover retry".into()],
        &["src/auth.rs".into()],
        &diff,
    );
    assert!(prompt.contains("fix(auth): retry\ntest: cover retry"));
    assert!(prompt.contains("src/auth.rs"));
    assert!(prompt.contains(&diff[..MAX_PR_DIFF_CHARS]));
    assert!(!prompt.contains(&diff));
}

#[tokio::test]
async fn pull_request_splits_title_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_string_contains("Commits"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(
            "feat(auth): refresh expired tokens\n\nTokens are refreshed once before failing.",
        )))
        .expect(1)
        .mount(&server)
        .await;

    let draft = client_for(&server)
        .pull_request(&["feat: refresh".into()], &["src/auth.rs".into()], "diff")
        .await
        .unwrap();
    assert_eq!(draft.title, "feat(auth): refresh expired tokens");
    assert_eq!(draft.body, "Tokens are refreshed once before failing.");
}

#[tokio::test]
async fn api_error_surfaces_provider_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(402).set_body_json(json!({
            "error": { "message": "Insufficient credits", "code": 402 }
        })))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .commit_message(&[], "")
        .await
        .unwrap_err();
    match err {
        GeneratorError::Api { status, message } => {
            assert_eq!(status, 402);
            assert_eq!(message, "Insufficient credits");
        }
        other => panic!("Expected Api error, got: {other:?}"),
    }
}

#[tokio::test]
async fn empty_choices_is_invalid_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .commit_message(&[], "")
        .await
        .unwrap_err();
    assert!(matches!(err, GeneratorError::InvalidResponse(_)));
}

#[test]
fn error_converts_to_external_service() {
    let err: relay_core::Error = GeneratorError::InvalidResponse("x".into()).into();
    assert!(matches!(
        err,
        relay_core::Error::ExternalService { service: "OpenRouter", .. }
    ));
}
