//! `relay pr`: open a pull request with a generated description.

use std::io::{self, Write};

use relay_core::Result;
use relay_engine::workflow::{self, PullRequestOptions, PullRequestOutcome, WorkflowContext};

/// Reviewers printed under the summary.
const SHOWN_REVIEWERS: usize = 3;

pub async fn run(ctx: &WorkflowContext, opts: &PullRequestOptions) -> Result<()> {
    let outcome = workflow::pull_request(ctx, opts).await?;
    write_summary(&mut io::stdout(), &outcome)?;
    Ok(())
}

fn write_summary(w: &mut impl Write, outcome: &PullRequestOutcome) -> io::Result<()> {
    writeln!(w, "✓ Pull request created: {}", outcome.draft.title)?;
    writeln!(w, "  URL:     {}", outcome.url)?;
    writeln!(
        w,
        "  Branch:  {} → {} ({} commit(s))",
        outcome.branch, outcome.base, outcome.commits
    )?;
    if let Some(issue) = &outcome.issue {
        writeln!(w, "  Linked to {issue}")?;
    }
    if !outcome.reviewers.is_empty() {
        writeln!(w, "  Suggested reviewers:")?;
        for reviewer in outcome.reviewers.iter().take(SHOWN_REVIEWERS) {
            writeln!(w, "    • {reviewer}")?;
        }
    }
    Ok(())
}
