//! Supported editors.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Editor used to open a working tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Editor {
    Vscode,
    Cursor,
    Zed,
}

impl Editor {
    /// All supported editors, in menu order.
    pub const ALL: [Self; 3] = [Self::Cursor, Self::Vscode, Self::Zed];

    /// Editor used when nothing else is configured.
    pub const FALLBACK: Self = Self::Cursor;

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Vscode => "vscode",
            Self::Cursor => "cursor",
            Self::Zed => "zed",
        }
    }

    /// Command-line launcher binary for this editor.
    pub const fn command(&self) -> &'static str {
        match self {
            Self::Vscode => "code",
            Self::Cursor => "cursor",
            Self::Zed => "zed",
        }
    }
}

impl fmt::Display for Editor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Editor {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "vscode" | "code" => Ok(Self::Vscode),
            "cursor" => Ok(Self::Cursor),
            "zed" => Ok(Self::Zed),
            other => Err(Error::Config(format!(
                "Unknown editor '{other}': must be 'vscode', 'cursor', or 'zed'"
            ))),
        }
    }
}
