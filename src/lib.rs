//! Rust Discipline - style-guide enforcement for idiomatic Rust
//!
//! The guide is split into disciplines (naming, imports, error handling, ...).
//! Each machine-checkable convention is a rule with a syntactic predicate over
//! one parsed file. This crate provides:
//! - a rule registry with the built-in rules and configured custom rules
//! - a source model (syntax tree plus comments) for every checked file
//! - an evaluator that turns rule findings into violations
//! - a batch checker and reporters for text, JSON, GitHub and SARIF output

pub mod analyzer;
pub mod config;
pub mod domain;
pub mod evaluator;
pub mod report;
pub mod rules;
pub mod source;

// Re-export main types for convenient access
pub use domain::{
    CheckReport, DiagnosticKind, Discipline, DisciplineError, DisciplineResult, ExitStatus,
    FileDiagnostic, Location, ReportSummary, Severity, SyntaxError, Violation, ViolationKind,
};

pub use config::{ConfigBuilder, CustomRuleConfig, DisciplineConfig, Override, RuleSettings};

pub use analyzer::{AnalysisOptions, Analyzer, PathFilter};

pub use report::{OutputFormat, ReportFormatter, ReportOptions};

pub use rules::{Finding, Rule, RuleRegistry};

pub use source::SourceUnit;

use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

/// High-level entry point: configuration, rules, checking and formatting
pub struct DisciplineChecker {
    analyzer: Arc<Analyzer>,
    report_formatter: ReportFormatter,
}

impl DisciplineChecker {
    /// Create a checker for the given configuration
    pub fn new_with_config(config: DisciplineConfig) -> DisciplineResult<Self> {
        let analyzer = Analyzer::new(config)?;
        Ok(Self { analyzer: Arc::new(analyzer), report_formatter: ReportFormatter::default() })
    }

    /// Create a checker with default configuration
    pub fn new() -> DisciplineResult<Self> {
        Self::new_with_config(DisciplineConfig::default())
    }

    /// Create a checker loading configuration from file
    pub fn from_config_file<P: AsRef<Path>>(path: P) -> DisciplineResult<Self> {
        let config = DisciplineConfig::load_from_file(path)?;
        Self::new_with_config(config)
    }

    /// Set custom report formatter
    pub fn with_report_formatter(mut self, formatter: ReportFormatter) -> Self {
        self.report_formatter = formatter;
        self
    }

    pub fn registry(&self) -> &RuleRegistry {
        self.analyzer.registry()
    }

    pub fn config(&self) -> &DisciplineConfig {
        self.analyzer.config()
    }

    /// Check files and directories on the current thread
    pub fn check_paths<P: AsRef<Path>>(
        &self,
        paths: &[P],
        options: &AnalysisOptions,
    ) -> DisciplineResult<CheckReport> {
        self.analyzer.analyze_paths(paths, options)
    }

    /// Check files and directories on tokio's blocking pool.
    ///
    /// Setting `cancel` stops the run between files; the returned report is
    /// then marked cancelled and counts the files it skipped.
    pub async fn check_paths_async(
        &self,
        paths: Vec<PathBuf>,
        options: AnalysisOptions,
        cancel: Arc<AtomicBool>,
    ) -> DisciplineResult<CheckReport> {
        let analyzer = Arc::clone(&self.analyzer);
        let handle = tokio::task::spawn_blocking(move || {
            analyzer.analyze_paths_with_cancel(&paths, &options, &cancel)
        });

        match handle.await {
            Ok(result) => result,
            Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
            Err(e) => Err(DisciplineError::report(format!("Check task was aborted: {e}"))),
        }
    }

    /// Check in-memory source as if it were the file at `path`
    pub fn check_source(
        &self,
        path: impl Into<PathBuf>,
        text: impl Into<String>,
    ) -> DisciplineResult<Vec<Violation>> {
        let violations = self.analyzer.analyze_source(path, text, None)?;
        Ok(violations)
    }

    /// Format a report with this checker's formatter
    pub fn format_report(
        &self,
        report: &CheckReport,
        format: OutputFormat,
    ) -> DisciplineResult<String> {
        self.report_formatter.format_report(report, format)
    }
}

/// Check a directory tree with default settings
pub fn check_directory<P: AsRef<Path>>(directory: P) -> DisciplineResult<CheckReport> {
    let checker = DisciplineChecker::new()?;
    checker.check_paths(&[directory.as_ref()], &AnalysisOptions::default())
}

/// Check files with default settings, off the async runtime's worker threads
pub async fn check_files(files: Vec<PathBuf>) -> DisciplineResult<CheckReport> {
    let checker = DisciplineChecker::new()?;
    checker
        .check_paths_async(files, AnalysisOptions::default(), Arc::new(AtomicBool::new(false)))
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::atomic::Ordering;
    use tempfile::TempDir;

    #[test]
    fn test_empty_file_is_clean() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("empty.rs"), "").unwrap();

        let report = check_directory(temp_dir.path()).unwrap();

        assert!(report.violations.is_empty());
        assert_eq!(report.summary.total_files, 1);
        assert_eq!(report.exit_status(None).code(), 0);
        assert_eq!(report::exit_code(&report.violations), 0);
    }

    #[test]
    fn test_single_match_produces_one_violation() {
        let checker = DisciplineChecker::new().unwrap();
        let violations = checker.check_source("lib.rs", "fn f() {\n    let b = x == true;\n}\n").unwrap();

        assert_eq!(violations.len(), 1);
        let violation = &violations[0];
        assert_eq!(violation.rule_id, "bool_literal_comparison");
        assert_eq!(violation.discipline, Discipline::Cosmetic);
        assert_eq!(violation.location.line, 2);
        assert!(checker.registry().contains(&violation.rule_id));
    }

    #[test]
    fn test_check_source_rejects_invalid_rust() {
        let checker = DisciplineChecker::new().unwrap();
        let err = checker.check_source("inline.rs", "fn (").unwrap_err();

        match err {
            DisciplineError::Syntax(syntax) => {
                assert_eq!(syntax.path, PathBuf::from("inline.rs"));
                assert_eq!(syntax.line, 1);
            }
            other => panic!("expected a syntax error, got {other}"),
        }
    }

    #[test]
    fn test_parse_error_is_diagnostic_and_siblings_run() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("bad.rs"), "struct {").unwrap();
        fs::write(temp_dir.path().join("good.rs"), "fn doThing() {}\n").unwrap();

        let report = check_directory(temp_dir.path()).unwrap();

        assert_eq!(report.diagnostics.len(), 1);
        assert_eq!(report.diagnostics[0].kind, DiagnosticKind::SyntaxError);
        assert!(report.violations.iter().all(|v| v.file_path.ends_with("good.rs")));
        assert!(report.violations.iter().any(|v| v.rule_id == "fn_name_snake_case"));
        assert_eq!(report.exit_status(None), ExitStatus::ViolationsFound);
    }

    #[test]
    fn test_report_formatting() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("lib.rs"), "use std::io::*;\n").unwrap();

        let checker = DisciplineChecker::new()
            .unwrap()
            .with_report_formatter(ReportFormatter::new(ReportOptions::plain()));
        let report = checker.check_paths(&[temp_dir.path()], &AnalysisOptions::default()).unwrap();

        let text = checker.format_report(&report, OutputFormat::Text).unwrap();
        assert!(text.contains("glob_import"));

        let json = checker.format_report(&report, OutputFormat::Json).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!(parsed["violations"].is_array());
    }

    #[tokio::test]
    async fn test_async_check() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("main.rs");
        fs::write(&file, "fn main() {\n    std::env::args().next().unwrap();\n}\n").unwrap();

        let report = check_files(vec![file]).await.unwrap();

        assert!(!report.cancelled);
        assert_eq!(report.violations.len(), 1);
        assert_eq!(report.violations[0].rule_id, "unwrap_call");
    }

    #[tokio::test]
    async fn test_cancelled_async_check() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("a.rs"), "fn a() {}\n").unwrap();

        let cancel = Arc::new(AtomicBool::new(false));
        cancel.store(true, Ordering::SeqCst);

        let checker = DisciplineChecker::new().unwrap();
        let report = checker
            .check_paths_async(vec![temp_dir.path().to_path_buf()], AnalysisOptions::default(), cancel)
            .await
            .unwrap();

        assert!(report.cancelled);
        assert_eq!(report.summary.skipped_files, 1);
    }
}
