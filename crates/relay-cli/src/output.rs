//! User-facing output.
//!
//! Results go to stdout with writeln!; failures go to stderr as a single
//! `✗ message` line followed by an optional hint.

use std::io::{self, Write};

use relay_core::Error;
use relay_engine::workflow::WorktreeOutcome;

/// Write the failure line and, when the error carries one, the hint.
pub fn write_error(w: &mut impl Write, err: &anyhow::Error) -> io::Result<()> {
    let core = err.downcast_ref::<Error>();
    writeln!(w, "✗ {err}")?;
    if let Some(hint) = core.and_then(Error::hint) {
        writeln!(w, "  {hint}")?;
    }
    Ok(())
}

pub fn report_error(err: &anyhow::Error) {
    let _ = write_error(&mut io::stderr(), err);
}

/// Summary after create, open, or switch.
pub fn write_outcome(w: &mut impl Write, outcome: &WorktreeOutcome) -> io::Result<()> {
    let verb = if outcome.reused { "Opened" } else { "Created" };
    writeln!(w, "✓ {verb} {}: {}", outcome.identifier, outcome.title)?;
    writeln!(w, "  Branch:  {}", outcome.branch)?;
    writeln!(w, "  Path:    {}", outcome.path.display())?;
    writeln!(w, "  Editor:  {}", outcome.editor)?;
    if let Some(url) = &outcome.url {
        writeln!(w, "  Issue:   {url}")?;
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::path::PathBuf;

    use relay_core::Editor;

    use super::*;

    fn rendered(err: anyhow::Error) -> String {
        let mut buf = Vec::new();
        write_error(&mut buf, &err).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn error_with_hint() {
        let err = Error::missing("No repositories found", "Add one with: relay repo add");
        assert_eq!(
            rendered(err.into()),
            "✗ No repositories found\n  Add one with: relay repo add\n"
        );
    }

    #[test]
    fn cancelled_has_no_hint() {
        assert_eq!(rendered(Error::Cancelled.into()), "✗ Cancelled\n");
    }

    #[test]
    fn foreign_error_is_one_line() {
        assert_eq!(rendered(anyhow::anyhow!("boom")), "✗ boom\n");
    }

    #[test]
    fn outcome_summary() {
        let outcome = WorktreeOutcome {
            repository: "demo".into(),
            identifier: "ENG-42".into(),
            title: "Fix login bug".into(),
            branch: "eng-42-fix-login-bug".into(),
            path: PathBuf::from("/tmp/demo/../worktrees/eng-42-fix-login-bug"),
            url: None,
            editor: Editor::Zed,
            reused: true,
        };
        let mut buf = Vec::new();
        write_outcome(&mut buf, &outcome).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.starts_with("✓ Opened ENG-42"));
        assert!(text.contains("Path:    /tmp/demo/../worktrees/eng-42-fix-login-bug"));
        assert!(text.contains("Editor:  zed"));
        assert!(!text.contains("Issue:"));
    }
}
