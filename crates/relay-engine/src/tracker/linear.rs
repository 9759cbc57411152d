//! Linear GraphQL API client.

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use thiserror::Error;
use tracing::{debug, info};

use super::Tracker;
use super::types::{Label, NewIssue, Project, Team, TrackerContext, TrackerIssue};

/// Production GraphQL endpoint host.
pub const LINEAR_API_URL: &str = "https://api.linear.app";

const ISSUE_FIELDS: &str = "id identifier title branchName url";

/// Linear API client errors.
#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Linear API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Linear GraphQL error: {0}")]
    GraphQl(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<TrackerError> for relay_core::Error {
    fn from(e: TrackerError) -> Self {
        Self::external("Linear", e.to_string())
    }
}

/// Connection settings for Linear.
#[derive(Debug, Clone)]
pub struct LinearConfig {
    /// API host; [`LINEAR_API_URL`] outside tests.
    pub base_url: String,
    /// Personal API key, sent verbatim in `Authorization`.
    pub api_key: String,
}

impl LinearConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            base_url: LINEAR_API_URL.into(),
            api_key: api_key.into(),
        }
    }
}

/// Linear GraphQL client.
#[derive(Debug)]
pub struct LinearClient {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Deserialize)]
struct Connection<T> {
    nodes: Vec<T>,
}

#[derive(Deserialize)]
struct IdNode {
    id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProjectNode {
    id: String,
    name: String,
    #[serde(default)]
    description: Option<String>,
    teams: Option<Connection<IdNode>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContextData {
    teams: Connection<Team>,
    projects: Connection<ProjectNode>,
    issue_labels: Connection<Label>,
}

#[derive(Deserialize)]
struct ViewerData {
    viewer: IdNode,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct IssueCreateData {
    issue_create: IssuePayload,
}

#[derive(Deserialize)]
struct IssuePayload {
    success: bool,
    issue: Option<TrackerIssue>,
}

#[derive(Deserialize)]
struct IssueData {
    issue: Option<TrackerIssue>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AssignedViewer {
    assigned_issues: Connection<TrackerIssue>,
}

#[derive(Deserialize)]
struct AssignedData {
    viewer: AssignedViewer,
}

impl LinearClient {
    pub fn new(config: &LinearConfig) -> Result<Self, TrackerError> {
        if config.base_url.is_empty() {
            return Err(TrackerError::Config("base_url is empty".into()));
        }
        if config.api_key.is_empty() {
            return Err(TrackerError::Config("Linear API key is empty".into()));
        }

        let mut headers = HeaderMap::new();
        let key = HeaderValue::from_str(&config.api_key)
            .map_err(|_| TrackerError::Config("Invalid API key format".into()))?;
        headers.insert(AUTHORIZATION, key);

        // reqwest is built with rustls-no-provider; Err means already installed.
        let _ = rustls::crypto::ring::default_provider().install_default();

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        let base_url = config.base_url.trim_end_matches('/').to_string();
        Ok(Self { http, base_url })
    }

    pub(crate) fn graphql_url(&self) -> String {
        format!("{}/graphql", self.base_url)
    }

    async fn query<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: Value,
    ) -> Result<T, TrackerError> {
        let start = std::time::Instant::now();
        let resp = self
            .http
            .post(self.graphql_url())
            .json(&json!({ "query": query, "variables": variables }))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() && status != reqwest::StatusCode::BAD_REQUEST {
            return Err(TrackerError::Api {
                status: status.as_u16(),
                message: status.canonical_reason().unwrap_or("Unknown").into(),
            });
        }

        let body: GraphQlResponse<T> = resp.json().await?;
        debug!(
            elapsed_ms = start.elapsed().as_millis(),
            errors = body.errors.len(),
            "linear: query completed"
        );

        if !body.errors.is_empty() {
            let message = body
                .errors
                .into_iter()
                .map(|e| e.message)
                .collect::<Vec<_>>()
                .join("; ");
            return Err(TrackerError::GraphQl(message));
        }
        body.data
            .ok_or_else(|| TrackerError::GraphQl("response carried no data".into()))
    }

    async fn viewer_id(&self) -> Result<String, TrackerError> {
        let data: ViewerData = self.query("query { viewer { id } }", json!({})).await?;
        Ok(data.viewer.id)
    }
}

#[async_trait]
impl Tracker for LinearClient {
    async fn fetch_context(&self) -> Result<TrackerContext, TrackerError> {
        let data: ContextData = self
            .query(
                "query { \
                   teams(first: 250) { nodes { id name key } } \
                   projects(first: 250) { nodes { id name description teams { nodes { id } } } } \
                   issueLabels(first: 250) { nodes { id name description } } \
                 }",
                json!({}),
            )
            .await?;

        let projects = data
            .projects
            .nodes
            .into_iter()
            .map(|p| Project {
                team_id: p.teams.and_then(|t| t.nodes.into_iter().next()).map(|n| n.id),
                id: p.id,
                name: p.name,
                description: p.description.filter(|d| !d.is_empty()),
            })
            .collect();

        let context = TrackerContext {
            teams: data.teams.nodes,
            projects,
            labels: data.issue_labels.nodes,
        };
        debug!(
            teams = context.teams.len(),
            projects = context.projects.len(),
            labels = context.labels.len(),
            "Fetched tracker context"
        );
        Ok(context)
    }

    async fn create_issue(&self, issue: &NewIssue) -> Result<TrackerIssue, TrackerError> {
        let assignee = match &issue.draft.assignee_id {
            Some(id) => id.clone(),
            None => self.viewer_id().await?,
        };

        let mut input = json!({
            "teamId": issue.team_id,
            "title": issue.draft.title,
            "description": issue.draft.description,
            "priority": issue.draft.priority,
            "labelIds": issue.draft.label_ids,
            "assigneeId": assignee,
        });
        if let Some(project_id) = &issue.draft.project_id {
            input["projectId"] = json!(project_id);
        }

        let data: IssueCreateData = self
            .query(
                &format!(
                    "mutation IssueCreate($input: IssueCreateInput!) {{ \
                       issueCreate(input: $input) {{ success issue {{ {ISSUE_FIELDS} }} }} \
                     }}"
                ),
                json!({ "input": input }),
            )
            .await?;

        let created = match data.issue_create {
            IssuePayload {
                success: true,
                issue: Some(created),
            } => created,
            _ => return Err(TrackerError::GraphQl("issue creation returned no issue".into())),
        };
        info!(identifier = %created.identifier, branch = %created.branch_name, "Created tracker issue");
        Ok(created)
    }

    async fn get_issue(&self, identifier: &str) -> Result<Option<TrackerIssue>, TrackerError> {
        let result: Result<IssueData, _> = self
            .query(
                &format!("query Issue($id: String!) {{ issue(id: $id) {{ {ISSUE_FIELDS} }} }}"),
                json!({ "id": identifier }),
            )
            .await;

        match result {
            Ok(data) => Ok(data.issue),
            Err(TrackerError::GraphQl(msg)) if msg.to_ascii_lowercase().contains("not found") => {
                debug!(identifier, "Issue not found");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    async fn my_issues(&self) -> Result<Vec<TrackerIssue>, TrackerError> {
        let data: AssignedData = self
            .query(
                &format!(
                    "query {{ viewer {{ assignedIssues(first: 100, orderBy: updatedAt) \
                       {{ nodes {{ {ISSUE_FIELDS} }} }} }} }}"
                ),
                json!({}),
            )
            .await?;
        Ok(data.viewer.assigned_issues.nodes)
    }
}
