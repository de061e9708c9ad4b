//! Rules and their predicates
//!
//! A `Rule` is declarative metadata (id, discipline, severity, message) plus
//! a `RuleCheck` predicate that inspects a whole `SourceUnit` and returns
//! findings. Rules are immutable once built; the registry owns them.

pub mod builtin;
pub mod custom;
pub mod registry;

use crate::domain::{Discipline, InternalRuleError, Location, Severity};
use crate::source::SourceUnit;
use std::fmt;
use std::sync::Arc;

pub use registry::RuleRegistry;

/// What a predicate returns for one file
pub type CheckResult = Result<Vec<Finding>, InternalRuleError>;

/// One place a predicate matched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub location: Location,
    /// Substituted for `{subject}` in the rule's message template
    pub subject: String,
    /// Replaces the rule's generic suggestion for this match
    pub suggestion: Option<String>,
}

impl Finding {
    pub fn new(location: Location, subject: impl Into<String>) -> Self {
        Self { location, subject: subject.into(), suggestion: None }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

/// Predicate half of a rule
pub trait RuleCheck: Send + Sync {
    /// Inspect a parsed file and report every match
    fn check(&self, unit: &SourceUnit) -> CheckResult;
}

impl<F> RuleCheck for F
where
    F: Fn(&SourceUnit) -> CheckResult + Send + Sync,
{
    fn check(&self, unit: &SourceUnit) -> CheckResult {
        self(unit)
    }
}

/// A single convention of the style guide
#[derive(Clone)]
pub struct Rule {
    pub id: String,
    pub discipline: Discipline,
    pub severity: Severity,
    pub enabled: bool,
    /// Message template; `{subject}` is replaced per finding
    pub message: String,
    /// Longer explanation shown by `explain`
    pub description: String,
    pub suggestion: Option<String>,
    check: Arc<dyn RuleCheck>,
}

impl Rule {
    /// Create an enabled rule
    pub fn new(
        id: impl Into<String>,
        discipline: Discipline,
        severity: Severity,
        message: impl Into<String>,
        check: impl RuleCheck + 'static,
    ) -> Self {
        Self {
            id: id.into(),
            discipline,
            severity,
            enabled: true,
            message: message.into(),
            description: String::new(),
            suggestion: None,
            check: Arc::new(check),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Run the predicate
    pub fn check(&self, unit: &SourceUnit) -> CheckResult {
        self.check.check(unit)
    }

    /// Render the message for one finding
    pub fn render_message(&self, finding: &Finding) -> String {
        self.message.replace("{subject}", &finding.subject)
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("id", &self.id)
            .field("discipline", &self.discipline)
            .field("severity", &self.severity)
            .field("enabled", &self.enabled)
            .field("message", &self.message)
            .finish_non_exhaustive()
    }
}
