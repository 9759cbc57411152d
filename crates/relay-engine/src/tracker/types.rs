//! Tracker data types.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub id: String,
    pub name: String,
    /// Short prefix of the team's issue identifiers (`ENG`).
    pub key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// First team the project belongs to; `None` for workspace-level projects.
    #[serde(default)]
    pub team_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Everything the generator needs to place a new issue.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerContext {
    pub teams: Vec<Team>,
    pub projects: Vec<Project>,
    pub labels: Vec<Label>,
}

impl TrackerContext {
    pub fn team_by_key(&self, key: &str) -> Option<&Team> {
        self.teams.iter().find(|t| t.key.eq_ignore_ascii_case(key))
    }

    pub fn team_by_id(&self, id: &str) -> Option<&Team> {
        self.teams.iter().find(|t| t.id == id)
    }

    /// Comma-separated team keys, for error messages.
    pub fn team_keys(&self) -> String {
        self.teams
            .iter()
            .map(|t| t.key.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Structured issue proposed by the generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueDraft {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub label_ids: Vec<String>,
    /// 0 = none, 1 = urgent, 2 = high, 3 = normal, 4 = low.
    pub priority: u8,
    #[serde(default)]
    pub assignee_id: Option<String>,
}

impl IssueDraft {
    pub const fn priority_label(&self) -> &'static str {
        match self.priority {
            1 => "Urgent",
            2 => "High",
            3 => "Normal",
            4 => "Low",
            _ => "No priority",
        }
    }
}

/// Input for issue creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewIssue {
    pub team_id: String,
    pub draft: IssueDraft,
}

/// An issue as returned by the tracker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackerIssue {
    pub id: String,
    pub identifier: String,
    pub title: String,
    /// Branch name suggested by the tracker; the only source of branch names.
    pub branch_name: String,
    #[serde(default)]
    pub url: Option<String>,
}
