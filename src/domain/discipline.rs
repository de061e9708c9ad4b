//! The disciplines of the style guide
//!
//! Every rule belongs to exactly one discipline. Disciplines are how users
//! narrow a run (`--category naming`) and how reports group their findings.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::violations::DisciplineError;

/// A named chapter of the style guide grouping related rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Discipline {
    /// Formatting that rustfmt does not settle on its own
    Cosmetic,
    /// Identifier casing and naming idioms
    Naming,
    /// Shape of `use` declarations
    Import,
    /// `match` and `if let` usage
    PatternMatching,
    /// Expression-level idioms
    Code,
    /// Error propagation and panics
    ErrorHandling,
    /// Function signatures
    Function,
    /// Order of items within a module
    Ordering,
    /// Justification of `unsafe`
    Unsafe,
    /// Size and shape of functions and blocks
    Structural,
    /// Comments and documentation
    Comment,
}

impl Discipline {
    /// All disciplines in the order the style guide presents them
    pub const ALL: [Discipline; 11] = [
        Self::Cosmetic,
        Self::Naming,
        Self::Import,
        Self::PatternMatching,
        Self::Code,
        Self::ErrorHandling,
        Self::Function,
        Self::Ordering,
        Self::Unsafe,
        Self::Structural,
        Self::Comment,
    ];

    /// The kebab-case name used on the command line and in configuration
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cosmetic => "cosmetic",
            Self::Naming => "naming",
            Self::Import => "import",
            Self::PatternMatching => "pattern-matching",
            Self::Code => "code",
            Self::ErrorHandling => "error-handling",
            Self::Function => "function",
            Self::Ordering => "ordering",
            Self::Unsafe => "unsafe",
            Self::Structural => "structural",
            Self::Comment => "comment",
        }
    }

    /// Comma-separated list of valid names, for error messages
    pub fn valid_names() -> String {
        Self::ALL.iter().map(|d| d.as_str()).collect::<Vec<_>>().join(", ")
    }
}

impl fmt::Display for Discipline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Discipline {
    type Err = DisciplineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        Self::ALL
            .iter()
            .copied()
            .find(|d| d.as_str() == normalized)
            .ok_or_else(|| DisciplineError::UnknownDiscipline { name: s.to_string() })
    }
}
