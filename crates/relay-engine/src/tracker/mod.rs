//! Issue tracker integration.
//!
//! The workflows only see the [`Tracker`] trait; [`LinearClient`] talks to
//! Linear's GraphQL API.

mod linear;
pub mod types;


use async_trait::async_trait;

pub use linear::{LinearClient, LinearConfig, TrackerError};
pub use types::{IssueDraft, Label, NewIssue, Project, Team, TrackerContext, TrackerIssue};

/// Remote issue tracker.
#[async_trait]
pub trait Tracker: Send + Sync {
    /// Teams, projects, and labels visible to the API key.
    async fn fetch_context(&self) -> Result<TrackerContext, TrackerError>;

    /// Create an issue. Unassigned drafts are assigned to the key's owner.
    async fn create_issue(&self, issue: &NewIssue) -> Result<TrackerIssue, TrackerError>;

    /// Look up an issue by identifier (`ENG-42`). `None` when it does not exist.
    async fn get_issue(&self, identifier: &str) -> Result<Option<TrackerIssue>, TrackerError>;

    /// Issues assigned to the key's owner.
    async fn my_issues(&self) -> Result<Vec<TrackerIssue>, TrackerError>;
}
