//! Core domain models for style violations and check results
//!
//! - A `Violation` is one place where a file departs from a rule
//! - A `FileDiagnostic` is a file that could not be checked at all
//! - `CheckReport` aggregates both for a whole run

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::path::PathBuf;

use crate::domain::discipline::Discipline;

/// Severity levels for style violations
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational messages and suggestions
    Info,
    /// Conventions that should be followed
    Warning,
    /// Conventions that must be followed
    Error,
}

impl Severity {
    /// Convert to string for display
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

/// A span of source text, 1-indexed on both axes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    pub line: u32,
    pub column: u32,
    pub end_line: u32,
    pub end_column: u32,
}

impl Location {
    /// A zero-width location at the given position
    pub fn point(line: u32, column: u32) -> Self {
        Self { line, column, end_line: line, end_column: column }
    }

    /// A location covering a whole range
    pub fn span(line: u32, column: u32, end_line: u32, end_column: u32) -> Self {
        Self { line, column, end_line, end_column }
    }

    /// Ordering used for reports: line, then column
    pub fn position_cmp(&self, other: &Self) -> Ordering {
        self.line.cmp(&other.line).then_with(|| self.column.cmp(&other.column))
    }
}

/// Whether a violation came from a rule predicate or from a rule failing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    /// The rule matched the source
    Rule,
    /// The rule itself malfunctioned on this file
    InternalError,
}

/// A style violation detected during evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    /// Identifier of the rule that produced this violation
    pub rule_id: String,
    /// Discipline of that rule
    pub discipline: Discipline,
    /// Severity level of this violation
    pub severity: Severity,
    /// Rule match or internal rule failure
    pub kind: ViolationKind,
    /// File path where the violation was found
    pub file_path: PathBuf,
    /// Where in the file
    pub location: Location,
    /// Rendered, human-readable description
    pub message: String,
    /// The trimmed source line the violation starts on
    pub context: Option<String>,
    /// How to satisfy the rule
    pub suggestion: Option<String>,
}

impl Violation {
    /// Create a new rule violation
    pub fn new(
        rule_id: impl Into<String>,
        discipline: Discipline,
        severity: Severity,
        file_path: PathBuf,
        location: Location,
        message: impl Into<String>,
    ) -> Self {
        Self {
            rule_id: rule_id.into(),
            discipline,
            severity,
            kind: ViolationKind::Rule,
            file_path,
            location,
            message: message.into(),
            context: None,
            suggestion: None,
        }
    }

    /// Create a synthetic violation recording that a rule failed on a file
    pub fn internal_error(
        rule_id: impl Into<String>,
        discipline: Discipline,
        file_path: PathBuf,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind: ViolationKind::InternalError,
            ..Self::new(rule_id, discipline, Severity::Error, file_path, Location::point(1, 1), message)
        }
    }

    /// Add source code context
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Add a suggested fix
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

/// Why a file produced no rule violations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// The file is not valid Rust
    SyntaxError,
    /// The file could not be read
    IoError,
}

impl DiagnosticKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SyntaxError => "syntax_error",
            Self::IoError => "io_error",
        }
    }
}

/// A file-level problem that prevented rule evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileDiagnostic {
    pub kind: DiagnosticKind,
    pub file_path: PathBuf,
    pub location: Option<Location>,
    pub message: String,
}

impl FileDiagnostic {
    /// Diagnostic for a file the parser rejected
    pub fn from_syntax_error(error: &SyntaxError) -> Self {
        Self {
            kind: DiagnosticKind::SyntaxError,
            file_path: error.path.clone(),
            location: Some(Location::point(error.line, error.column)),
            message: error.message.clone(),
        }
    }

    /// Diagnostic for a file that could not be read
    pub fn io(file_path: PathBuf, error: &std::io::Error) -> Self {
        Self {
            kind: DiagnosticKind::IoError,
            file_path,
            location: None,
            message: format!("could not read file: {error}"),
        }
    }

    /// Format diagnostic for display
    pub fn format_display(&self) -> String {
        let location = match self.location {
            Some(loc) => format!(":{}:{}", loc.line, loc.column),
            None => String::new(),
        };
        format!("{}{} [{}] {}", self.file_path.display(), location, self.kind.as_str(), self.message)
    }
}

/// Count of violations by severity level
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ViolationCounts {
    pub error: usize,
    pub warning: usize,
    pub info: usize,
}

impl ViolationCounts {
    /// Total number of violations across all severities
    pub fn total(&self) -> usize {
        self.error + self.warning + self.info
    }

    /// Add a violation to the counts
    pub fn add(&mut self, severity: Severity) {
        match severity {
            Severity::Error => self.error += 1,
            Severity::Warning => self.warning += 1,
            Severity::Info => self.info += 1,
        }
    }
}

/// Summary statistics for a check run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportSummary {
    /// Number of files that were parsed and evaluated
    pub total_files: usize,
    /// Number of files skipped because the run was cancelled
    pub skipped_files: usize,
    /// Number of violations by severity level
    pub violations_by_severity: ViolationCounts,
    /// Total execution time in milliseconds
    pub execution_time_ms: u64,
    /// When the run started
    pub checked_at: DateTime<Utc>,
}

/// Process exit status of a check run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    /// No violations and no file errors
    Clean,
    /// At least one violation or unparseable file
    ViolationsFound,
    /// The tool could not do its job (unreadable file, bad configuration)
    InternalError,
}

impl ExitStatus {
    pub fn code(self) -> i32 {
        match self {
            Self::Clean => 0,
            Self::ViolationsFound => 1,
            Self::InternalError => 2,
        }
    }
}

/// Complete result of a check run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckReport {
    /// All violations, sorted by file then position
    pub violations: Vec<Violation>,
    /// Files that could not be evaluated
    pub diagnostics: Vec<FileDiagnostic>,
    /// Summary statistics
    pub summary: ReportSummary,
    /// Fingerprint of the configuration used for this run
    pub config_fingerprint: Option<String>,
    /// Whether the run stopped before every file was checked
    pub cancelled: bool,
}

impl CheckReport {
    /// Create a new empty report
    pub fn new() -> Self {
        Self {
            violations: Vec::new(),
            diagnostics: Vec::new(),
            summary: ReportSummary { checked_at: Utc::now(), ..Default::default() },
            config_fingerprint: None,
            cancelled: false,
        }
    }

    /// Add a violation to the report
    pub fn add_violation(&mut self, violation: Violation) {
        self.summary.violations_by_severity.add(violation.severity);
        self.violations.push(violation);
    }

    /// Add a file diagnostic to the report
    pub fn add_diagnostic(&mut self, diagnostic: FileDiagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// Whether the report contains any violations
    pub fn has_violations(&self) -> bool {
        !self.violations.is_empty()
    }

    /// Diagnostics of a given kind
    pub fn diagnostics_of(&self, kind: DiagnosticKind) -> impl Iterator<Item = &FileDiagnostic> {
        self.diagnostics.iter().filter(move |d| d.kind == kind)
    }

    pub fn set_files_analyzed(&mut self, count: usize) {
        self.summary.total_files = count;
    }

    pub fn set_files_skipped(&mut self, count: usize) {
        self.summary.skipped_files = count;
    }

    pub fn set_execution_time(&mut self, duration_ms: u64) {
        self.summary.execution_time_ms = duration_ms;
    }

    pub fn set_config_fingerprint(&mut self, fingerprint: impl Into<String>) {
        self.config_fingerprint = Some(fingerprint.into());
    }

    /// Sort by file path, then line and column. The sort is stable, so
    /// violations at the same position keep rule registration order.
    pub fn sort_violations(&mut self) {
        self.violations.sort_by(|a, b| {
            a.file_path.cmp(&b.file_path).then_with(|| a.location.position_cmp(&b.location))
        });
        self.diagnostics.sort_by(|a, b| a.file_path.cmp(&b.file_path));
    }

    /// Exit status counting only violations at or above `min_severity`.
    /// A cancelled run did not check every file and is never clean.
    pub fn exit_status(&self, min_severity: Option<Severity>) -> ExitStatus {
        if self.cancelled || self.diagnostics_of(DiagnosticKind::IoError).next().is_some() {
            return ExitStatus::InternalError;
        }

        let counted = self
            .violations
            .iter()
            .any(|v| min_severity.map_or(true, |min| v.severity >= min));

        if counted || self.diagnostics_of(DiagnosticKind::SyntaxError).next().is_some() {
            ExitStatus::ViolationsFound
        } else {
            ExitStatus::Clean
        }
    }
}

impl Default for CheckReport {
    fn default() -> Self {
        Self::new()
    }
}

/// The parser rejected a file
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{}:{line}:{column}: {message}", path.display())]
pub struct SyntaxError {
    pub path: PathBuf,
    pub line: u32,
    pub column: u32,
    pub message: String,
}

/// A rule predicate could not complete on a file
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{message}")]
pub struct InternalRuleError {
    pub message: String,
}

impl InternalRuleError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

/// Error types that can occur while checking
#[derive(Debug, thiserror::Error)]
pub enum DisciplineError {
    /// Configuration file could not be loaded, parsed or validated
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// A rule with this identifier is already registered
    #[error("Duplicate rule '{id}': a rule with this identifier is already registered")]
    DuplicateRule { id: String },

    /// A discipline name did not match any known discipline
    #[error("Unknown discipline '{name}' (expected one of: {})", Discipline::valid_names())]
    UnknownDiscipline { name: String },

    /// Source text is not valid Rust
    #[error("Syntax error: {0}")]
    Syntax(#[from] SyntaxError),

    /// A rule predicate malfunctioned
    #[error("Rule '{rule_id}' failed: {message}")]
    InternalRule { rule_id: String, message: String },

    /// File could not be read or written
    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Glob or regex compilation failed
    #[error("Pattern error: {message}")]
    Pattern { message: String },

    /// Report could not be rendered or written
    #[error("Report error: {message}")]
    Report { message: String },
}

impl DisciplineError {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration { message: message.into() }
    }

    /// Create a pattern error
    pub fn pattern(message: impl Into<String>) -> Self {
        Self::Pattern { message: message.into() }
    }

    /// Create an I/O error tied to a path
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }

    /// Create a report error
    pub fn report(message: impl Into<String>) -> Self {
        Self::Report { message: message.into() }
    }
}

/// Result type for Rust Discipline operations
pub type DisciplineResult<T> = Result<T, DisciplineError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn violation(path: &str, line: u32, column: u32, rule: &str) -> Violation {
        Violation::new(
            rule,
            Discipline::Naming,
            Severity::Warning,
            PathBuf::from(path),
            Location::point(line, column),
            "message",
        )
    }

    #[test]
    fn test_violation_creation() {
        let violation = Violation::new(
            "fn_name_snake_case",
            Discipline::Naming,
            Severity::Error,
            PathBuf::from("src/lib.rs"),
            Location::point(3, 4),
            "Function name `doThing` is not snake_case",
        )
        .with_context("fn doThing() {}");

        assert_eq!(violation.rule_id, "fn_name_snake_case");
        assert_eq!(violation.file_path, Path::new("src/lib.rs"));
        assert_eq!(violation.kind, ViolationKind::Rule);
        assert_eq!(violation.context.as_deref(), Some("fn doThing() {}"));
        assert_eq!(violation.location, Location::point(3, 4));
    }

    #[test]
    fn test_internal_error_violation() {
        let violation =
            Violation::internal_error("broken", Discipline::Code, PathBuf::from("a.rs"), "boom");
        assert_eq!(violation.kind, ViolationKind::InternalError);
        assert_eq!(violation.severity, Severity::Error);
        assert_eq!(violation.rule_id, "broken");
    }

    #[test]
    fn test_sort_is_by_file_then_position_and_stable() {
        let mut report = CheckReport::new();
        report.add_violation(violation("b.rs", 1, 1, "first"));
        report.add_violation(violation("a.rs", 9, 1, "second"));
        report.add_violation(violation("a.rs", 2, 7, "third"));
        report.add_violation(violation("a.rs", 2, 7, "fourth"));
        report.add_violation(violation("a.rs", 2, 3, "fifth"));
        report.sort_violations();

        let order: Vec<_> = report.violations.iter().map(|v| v.rule_id.as_str()).collect();
        assert_eq!(order, vec!["fifth", "third", "fourth", "second", "first"]);
    }

    #[test]
    fn test_exit_status() {
        let mut report = CheckReport::new();
        assert_eq!(report.exit_status(None), ExitStatus::Clean);

        report.add_violation(violation("a.rs", 1, 1, "rule"));
        assert_eq!(report.exit_status(None), ExitStatus::ViolationsFound);
        assert_eq!(report.exit_status(Some(Severity::Error)), ExitStatus::Clean);

        report.add_diagnostic(FileDiagnostic::io(
            PathBuf::from("missing.rs"),
            &std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        ));
        assert_eq!(report.exit_status(None), ExitStatus::InternalError);
        assert_eq!(ExitStatus::InternalError.code(), 2);
    }

    #[test]
    fn test_cancelled_run_is_not_clean() {
        let mut report = CheckReport::new();
        report.cancelled = true;
        report.set_files_skipped(3);

        assert_eq!(report.exit_status(None), ExitStatus::InternalError);
        assert_eq!(report.exit_status(Some(Severity::Error)).code(), 2);
    }

    #[test]
    fn test_syntax_diagnostic_fails_check() {
        let mut report = CheckReport::new();
        report.add_diagnostic(FileDiagnostic::from_syntax_error(&SyntaxError {
            path: PathBuf::from("bad.rs"),
            line: 2,
            column: 5,
            message: "expected `;`".to_string(),
        }));
        assert_eq!(report.exit_status(None), ExitStatus::ViolationsFound);
        assert_eq!(report.diagnostics[0].format_display(), "bad.rs:2:5 [syntax_error] expected `;`");
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Error > Severity::Warning);
        assert!(Severity::Warning > Severity::Info);
    }
}
