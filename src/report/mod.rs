//! Report rendering in text, JSON, GitHub workflow-command and SARIF formats
//!
//! Rendering is pure: the same report and options always give the same text.
//! Filtering by severity and truncation only affect what is shown, never the
//! report itself.

use crate::domain::{
    CheckReport, DisciplineError, DisciplineResult, FileDiagnostic, Severity, Violation,
    ViolationCounts,
};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::fmt;
use std::io::Write;
use std::path::Path;
use std::str::FromStr;

/// Supported output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable, grouped by file
    Text,
    /// JSON document for programmatic consumption
    Json,
    /// GitHub Actions workflow commands
    Github,
    /// SARIF 2.1.0 for code scanning tools
    Sarif,
}

impl OutputFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Json => "json",
            Self::Github => "github",
            Self::Sarif => "sarif",
        }
    }

    /// All format names
    pub fn all_formats() -> &'static [&'static str] {
        &["text", "json", "github", "sarif"]
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = DisciplineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            "github" => Ok(Self::Github),
            "sarif" => Ok(Self::Sarif),
            other => Err(DisciplineError::report(format!(
                "Unknown output format '{other}'. Available: {}",
                Self::all_formats().join(", ")
            ))),
        }
    }
}

/// Options for customizing report output
#[derive(Debug, Clone)]
pub struct ReportOptions {
    /// Colour the text format (needs the `colors` feature)
    pub use_colors: bool,
    /// Show the offending source line under each violation
    pub show_context: bool,
    /// Show rule suggestions
    pub show_suggestions: bool,
    /// Maximum number of violations to show
    pub max_violations: Option<usize>,
    /// Minimum severity to show
    pub min_severity: Option<Severity>,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            use_colors: true,
            show_context: true,
            show_suggestions: true,
            max_violations: None,
            min_severity: None,
        }
    }
}

impl ReportOptions {
    /// Defaults without colours
    pub fn plain() -> Self {
        Self { use_colors: false, ..Self::default() }
    }
}

/// Render a report with plain default options
pub fn render(report: &CheckReport, format: OutputFormat) -> DisciplineResult<String> {
    ReportFormatter::new(ReportOptions::plain()).format_report(report, format)
}

/// Render a report with plain default options into `writer`
pub fn write_report<W: Write>(
    report: &CheckReport,
    format: OutputFormat,
    writer: W,
) -> DisciplineResult<()> {
    ReportFormatter::new(ReportOptions::plain()).write_report(report, format, writer)
}

/// Process exit code for a list of violations: zero only when it is empty
pub fn exit_code(violations: &[Violation]) -> i32 {
    if violations.is_empty() {
        0
    } else {
        1
    }
}

/// Formats reports according to its options
pub struct ReportFormatter {
    options: ReportOptions,
}

impl Default for ReportFormatter {
    fn default() -> Self {
        Self::new(ReportOptions::default())
    }
}

impl ReportFormatter {
    pub fn new(options: ReportOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ReportOptions {
        &self.options
    }

    /// Format a report in the given format
    pub fn format_report(
        &self,
        report: &CheckReport,
        format: OutputFormat,
    ) -> DisciplineResult<String> {
        let shown = self.filter_violations(&report.violations);

        match format {
            OutputFormat::Text => Ok(self.format_text(report, &shown)),
            OutputFormat::Json => self.format_json(report, &shown),
            OutputFormat::Github => Ok(self.format_github(report, &shown)),
            OutputFormat::Sarif => self.format_sarif(report, &shown),
        }
    }

    /// Format a report and write it out
    pub fn write_report<W: Write>(
        &self,
        report: &CheckReport,
        format: OutputFormat,
        mut writer: W,
    ) -> DisciplineResult<()> {
        let formatted = self.format_report(report, format)?;
        writer
            .write_all(formatted.as_bytes())
            .and_then(|()| writer.flush())
            .map_err(|e| DisciplineError::report(format!("Failed to write report: {e}")))
    }

    fn meets_threshold(&self, violation: &Violation) -> bool {
        self.options.min_severity.map_or(true, |min| violation.severity >= min)
    }

    fn filter_violations<'a>(&self, violations: &'a [Violation]) -> Vec<&'a Violation> {
        let mut filtered: Vec<&Violation> =
            violations.iter().filter(|v| self.meets_threshold(v)).collect();

        if let Some(max) = self.options.max_violations {
            filtered.truncate(max);
        }

        filtered
    }

    fn hidden_count(&self, report: &CheckReport, shown: usize) -> usize {
        let eligible = report.violations.iter().filter(|v| self.meets_threshold(v)).count();
        eligible - shown
    }

    /// Per-severity counts of the violations at or above the threshold
    fn counted(&self, report: &CheckReport) -> ViolationCounts {
        let mut counts = ViolationCounts::default();
        for violation in report.violations.iter().filter(|v| self.meets_threshold(v)) {
            counts.add(violation.severity);
        }
        counts
    }

    fn format_text(&self, report: &CheckReport, violations: &[&Violation]) -> String {
        let colors = self.options.use_colors;
        let mut output = String::new();

        if violations.is_empty() && report.diagnostics.is_empty() {
            let message = match self.options.min_severity {
                Some(min) if report.has_violations() => {
                    format!("No style violations at or above {}", min.as_str())
                }
                _ => "No style violations found".to_string(),
            };
            output.push_str(&paint(&message, Style::Success, colors));
            output.push_str("\n\n");
        }

        let mut by_file: BTreeMap<&Path, (Vec<&Violation>, Vec<&FileDiagnostic>)> =
            BTreeMap::new();
        for violation in violations {
            by_file.entry(violation.file_path.as_path()).or_default().0.push(violation);
        }
        for diagnostic in &report.diagnostics {
            by_file.entry(diagnostic.file_path.as_path()).or_default().1.push(diagnostic);
        }

        for (file_path, (file_violations, file_diagnostics)) in by_file {
            output.push_str(&paint(&file_path.display().to_string(), Style::Bold, colors));
            output.push('\n');

            for diagnostic in file_diagnostics {
                let position = diagnostic
                    .location
                    .map(|loc| format!("{}:{}", loc.line, loc.column))
                    .unwrap_or_else(|| "-".to_string());
                output.push_str(&format!(
                    "  {} [{}] {}\n",
                    paint(&position, Style::Dim, colors),
                    paint(diagnostic.kind.as_str(), Style::Error, colors),
                    diagnostic.message
                ));
            }

            for violation in file_violations {
                let position = format!("{}:{}", violation.location.line, violation.location.column);
                output.push_str(&format!(
                    "  {} {} [{}] {}\n",
                    paint(&position, Style::Dim, colors),
                    violation.rule_id,
                    paint(violation.severity.as_str(), Style::from(violation.severity), colors),
                    violation.message
                ));

                if self.options.show_context {
                    if let Some(context) = &violation.context {
                        output.push_str(&format!("    | {}\n", paint(context, Style::Dim, colors)));
                    }
                }
                if self.options.show_suggestions {
                    if let Some(suggestion) = &violation.suggestion {
                        output.push_str(&format!(
                            "    = help: {}\n",
                            paint(suggestion, Style::Success, colors)
                        ));
                    }
                }
            }
            output.push('\n');
        }

        let hidden = self.hidden_count(report, violations.len());
        if hidden > 0 {
            output.push_str(&format!("... and {hidden} more violation(s) not shown\n"));
        }

        output.push_str(&self.format_summary(report));
        output
    }

    fn format_summary(&self, report: &CheckReport) -> String {
        let colors = self.options.use_colors;
        let counts = self.counted(report);
        let execution_time = (report.summary.execution_time_ms as f64) / 1000.0;

        let mut parts = Vec::new();
        if counts.error > 0 {
            let text = format!("{} error{}", counts.error, plural(counts.error));
            parts.push(paint(&text, Style::Error, colors));
        }
        if counts.warning > 0 {
            let text = format!("{} warning{}", counts.warning, plural(counts.warning));
            parts.push(paint(&text, Style::Warning, colors));
        }
        if counts.info > 0 {
            parts.push(paint(&format!("{} info", counts.info), Style::Info, colors));
        }
        if counts.total() == 0 {
            parts.push(paint("0 violations", Style::Success, colors));
        }
        if !report.diagnostics.is_empty() {
            let count = report.diagnostics.len();
            parts.push(paint(
                &format!("{count} file diagnostic{}", plural(count)),
                Style::Error,
                colors,
            ));
        }

        let mut summary = format!(
            "{} {} in {} file{} ({:.1}s)",
            paint("Summary:", Style::Bold, colors),
            parts.join(", "),
            report.summary.total_files,
            plural(report.summary.total_files),
            execution_time
        );
        if report.cancelled {
            summary.push_str(&format!(
                "; cancelled, {} file{} skipped",
                report.summary.skipped_files,
                plural(report.summary.skipped_files)
            ));
        }
        summary.push('\n');
        summary
    }

    fn format_json(
        &self,
        report: &CheckReport,
        violations: &[&Violation],
    ) -> DisciplineResult<String> {
        let json_violations: Vec<JsonValue> = violations
            .iter()
            .map(|v| {
                serde_json::json!({
                    "rule_id": v.rule_id,
                    "discipline": v.discipline.as_str(),
                    "severity": v.severity.as_str(),
                    "kind": v.kind,
                    "file_path": v.file_path.display().to_string(),
                    "line": v.location.line,
                    "column": v.location.column,
                    "end_line": v.location.end_line,
                    "end_column": v.location.end_column,
                    "message": v.message,
                    "context": v.context,
                    "suggestion": v.suggestion,
                })
            })
            .collect();

        let json_diagnostics: Vec<JsonValue> = report
            .diagnostics
            .iter()
            .map(|d| {
                serde_json::json!({
                    "kind": d.kind.as_str(),
                    "file_path": d.file_path.display().to_string(),
                    "line": d.location.map(|loc| loc.line),
                    "column": d.location.map(|loc| loc.column),
                    "message": d.message,
                })
            })
            .collect();

        let counts = &report.summary.violations_by_severity;
        let json_report = serde_json::json!({
            "violations": json_violations,
            "diagnostics": json_diagnostics,
            "summary": {
                "total_files": report.summary.total_files,
                "skipped_files": report.summary.skipped_files,
                "violations_by_severity": {
                    "error": counts.error,
                    "warning": counts.warning,
                    "info": counts.info
                },
                "execution_time_ms": report.summary.execution_time_ms,
                "checked_at": report.summary.checked_at.to_rfc3339()
            },
            "config_fingerprint": report.config_fingerprint,
            "cancelled": report.cancelled
        });

        serde_json::to_string_pretty(&json_report)
            .map_err(|e| DisciplineError::report(format!("JSON serialization failed: {e}")))
    }

    fn format_github(&self, report: &CheckReport, violations: &[&Violation]) -> String {
        let mut output = String::new();

        for diagnostic in &report.diagnostics {
            let position = diagnostic
                .location
                .map(|loc| format!(",line={},col={}", loc.line, loc.column))
                .unwrap_or_default();
            output.push_str(&format!(
                "::error file={}{},title={}::{}\n",
                escape_property(&diagnostic.file_path.display().to_string()),
                position,
                diagnostic.kind.as_str(),
                escape_data(&diagnostic.message)
            ));
        }

        for violation in violations {
            let level = match violation.severity {
                Severity::Error => "error",
                Severity::Warning => "warning",
                Severity::Info => "notice",
            };
            let loc = violation.location;
            output.push_str(&format!(
                "::{} file={},line={},col={},endLine={},endColumn={},title={}::{}\n",
                level,
                escape_property(&violation.file_path.display().to_string()),
                loc.line,
                loc.column,
                loc.end_line,
                loc.end_column,
                escape_property(&violation.rule_id),
                escape_data(&violation.message)
            ));
        }

        output
    }

    fn format_sarif(
        &self,
        report: &CheckReport,
        violations: &[&Violation],
    ) -> DisciplineResult<String> {
        let sarif_results: Vec<JsonValue> = violations
            .iter()
            .map(|v| {
                let level = match v.severity {
                    Severity::Error => "error",
                    Severity::Warning => "warning",
                    Severity::Info => "note",
                };

                serde_json::json!({
                    "ruleId": v.rule_id,
                    "level": level,
                    "message": { "text": v.message },
                    "locations": [{
                        "physicalLocation": {
                            "artifactLocation": {
                                "uri": v.file_path.display().to_string()
                            },
                            "region": {
                                "startLine": v.location.line,
                                "startColumn": v.location.column,
                                "endLine": v.location.end_line,
                                "endColumn": v.location.end_column,
                                "snippet": v.context.as_ref().map(|c| serde_json::json!({ "text": c }))
                            }
                        }
                    }]
                })
            })
            .collect();

        // Rule metadata for the ids that appear, in first-seen order
        let mut rule_ids: Vec<&str> = Vec::new();
        for violation in violations {
            if !rule_ids.contains(&violation.rule_id.as_str()) {
                rule_ids.push(&violation.rule_id);
            }
        }
        let rules: Vec<JsonValue> = rule_ids
            .iter()
            .map(|id| serde_json::json!({ "id": id }))
            .collect();

        let notifications: Vec<JsonValue> = report
            .diagnostics
            .iter()
            .map(|d| {
                serde_json::json!({
                    "level": "error",
                    "descriptor": { "id": d.kind.as_str() },
                    "message": { "text": d.message },
                    "locations": [{
                        "physicalLocation": {
                            "artifactLocation": { "uri": d.file_path.display().to_string() },
                            "region": d.location.map(|loc| serde_json::json!({
                                "startLine": loc.line,
                                "startColumn": loc.column
                            }))
                        }
                    }]
                })
            })
            .collect();

        let sarif_report = serde_json::json!({
            "version": "2.1.0",
            "$schema": "https://json.schemastore.org/sarif-2.1.0.json",
            "runs": [{
                "tool": {
                    "driver": {
                        "name": env!("CARGO_PKG_NAME"),
                        "version": env!("CARGO_PKG_VERSION"),
                        "rules": rules
                    }
                },
                "invocations": [{
                    "executionSuccessful": !report.cancelled,
                    "toolExecutionNotifications": notifications
                }],
                "results": sarif_results
            }]
        });

        serde_json::to_string_pretty(&sarif_report)
            .map_err(|e| DisciplineError::report(format!("SARIF serialization failed: {e}")))
    }
}

fn plural(count: usize) -> &'static str {
    if count == 1 {
        ""
    } else {
        "s"
    }
}

/// Workflow command message escaping
fn escape_data(s: &str) -> String {
    s.replace('%', "%25").replace('\r', "%0D").replace('\n', "%0A")
}

/// Workflow command property escaping
fn escape_property(s: &str) -> String {
    escape_data(s).replace(':', "%3A").replace(',', "%2C")
}

#[derive(Debug, Clone, Copy)]
enum Style {
    Error,
    Warning,
    Info,
    Success,
    Dim,
    Bold,
}

impl From<Severity> for Style {
    fn from(severity: Severity) -> Self {
        match severity {
            Severity::Error => Self::Error,
            Severity::Warning => Self::Warning,
            Severity::Info => Self::Info,
        }
    }
}

#[cfg(feature = "colors")]
fn paint(text: &str, style: Style, enabled: bool) -> String {
    use colored::Colorize;

    if !enabled {
        return text.to_string();
    }
    match style {
        Style::Error => text.red().to_string(),
        Style::Warning => text.yellow().to_string(),
        Style::Info => text.cyan().to_string(),
        Style::Success => text.green().to_string(),
        Style::Dim => text.dimmed().to_string(),
        Style::Bold => text.bold().to_string(),
    }
}

#[cfg(not(feature = "colors"))]
fn paint(text: &str, _style: Style, _enabled: bool) -> String {
    text.to_string()
}
