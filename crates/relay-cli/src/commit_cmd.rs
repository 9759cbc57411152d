//! `relay commit`: AI commit message with issue and co-author trailers.

use std::io::{self, Write};

use relay_core::Result;
use relay_engine::workflow::{self, CommitOptions, WorkflowContext};

pub async fn run(ctx: &WorkflowContext, opts: &CommitOptions) -> Result<()> {
    let outcome = workflow::commit(ctx, opts).await?;
    let mut out = io::stdout();
    writeln!(out, "✓ Committed: {}", outcome.subject())?;
    if let Some(issue) = &outcome.issue {
        writeln!(out, "  Linked to {issue}")?;
    }
    for author in &outcome.co_authors {
        writeln!(out, "  Co-authored-by: {author}")?;
    }
    Ok(())
}
