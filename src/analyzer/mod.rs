//! Batch checking of files and directory trees
//!
//! - Discovers `.rs` files and filters them through `PathFilter`
//! - Runs read, parse and evaluate per file, in parallel unless disabled
//! - Turns unreadable and unparsable files into diagnostics so siblings still run
//! - Stops picking up new files once the cancel flag is set

pub mod path_filter;

pub use path_filter::PathFilter;

use crate::config::DisciplineConfig;
use crate::domain::{
    CheckReport, Discipline, DisciplineError, DisciplineResult, FileDiagnostic, SyntaxError,
    Violation,
};
use crate::evaluator;
use crate::rules::{Rule, RuleRegistry};
use crate::source::SourceUnit;
use rayon::prelude::*;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Orchestrates a check run over many files
pub struct Analyzer {
    config: DisciplineConfig,
    registry: Arc<RuleRegistry>,
    path_filter: PathFilter,
}

/// Options for one check run
#[derive(Debug, Clone)]
pub struct AnalysisOptions {
    /// Whether to check files on the rayon pool
    pub parallel: bool,
    /// Maximum number of files to check
    pub max_files: Option<usize>,
    /// Extra exclude patterns for this run only
    pub exclude_patterns: Vec<String>,
    /// Only evaluate rules of this discipline
    pub discipline: Option<Discipline>,
    /// Whether to skip `.disciplineignore` lookups
    pub ignore_ignore_files: bool,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            parallel: true,
            max_files: None,
            exclude_patterns: Vec::new(),
            discipline: None,
            ignore_ignore_files: false,
        }
    }
}

/// What happened to one file
#[derive(Debug)]
enum FileOutcome {
    Checked(Vec<Violation>),
    Failed(FileDiagnostic),
    Skipped,
}

impl Analyzer {
    /// Create an analyzer, building the rule registry from `config`
    pub fn new(config: DisciplineConfig) -> DisciplineResult<Self> {
        let registry = Arc::new(RuleRegistry::from_config(&config)?);
        Self::with_registry(config, registry)
    }

    /// Create an analyzer around an already built registry
    pub fn with_registry(
        config: DisciplineConfig,
        registry: Arc<RuleRegistry>,
    ) -> DisciplineResult<Self> {
        let path_filter =
            PathFilter::new(config.paths.patterns.clone(), config.paths.ignore_file.clone())
                .map_err(|e| DisciplineError::config(format!("Failed to create path filter: {e}")))?;

        Ok(Self { config, registry, path_filter })
    }

    /// Analyzer with default configuration and built-in rules
    pub fn with_defaults() -> DisciplineResult<Self> {
        Self::new(DisciplineConfig::default())
    }

    pub fn registry(&self) -> &Arc<RuleRegistry> {
        &self.registry
    }

    pub fn config(&self) -> &DisciplineConfig {
        &self.config
    }

    /// Evaluate in-memory source as if it were the file at `path`
    pub fn analyze_source(
        &self,
        path: impl Into<PathBuf>,
        text: impl Into<String>,
        discipline: Option<Discipline>,
    ) -> Result<Vec<Violation>, SyntaxError> {
        let unit = SourceUnit::parse(path, text)?;
        Ok(evaluator::evaluate(&unit, &self.registry.selection(discipline)))
    }

    /// Check files and directories, producing a complete report
    pub fn analyze_paths<P: AsRef<Path>>(
        &self,
        paths: &[P],
        options: &AnalysisOptions,
    ) -> DisciplineResult<CheckReport> {
        self.analyze_paths_with_cancel(paths, options, &AtomicBool::new(false))
    }

    /// Same as `analyze_paths`, but files not yet started when `cancel`
    /// becomes true are skipped and the report is marked cancelled
    pub fn analyze_paths_with_cancel<P: AsRef<Path>>(
        &self,
        paths: &[P],
        options: &AnalysisOptions,
        cancel: &AtomicBool,
    ) -> DisciplineResult<CheckReport> {
        let start_time = Instant::now();
        let mut report = CheckReport::new();

        let (files, unreadable) = self.collect_files(paths, options)?;
        for diagnostic in unreadable {
            report.add_diagnostic(diagnostic);
        }

        let rules = self.registry.selection(options.discipline);
        tracing::debug!("Checking {} file(s) against {} rule(s)", files.len(), rules.len());

        let outcomes: Vec<FileOutcome> = if options.parallel && files.len() > 1 {
            files.par_iter().map(|file| self.check_file(file, &rules, cancel)).collect()
        } else {
            files.iter().map(|file| self.check_file(file, &rules, cancel)).collect()
        };

        let mut checked = 0;
        let mut skipped = 0;
        let mut rule_failures = 0;
        for outcome in outcomes {
            match outcome {
                FileOutcome::Checked(violations) => {
                    checked += 1;
                    rule_failures += evaluator::internal_errors(&violations);
                    for violation in violations {
                        report.add_violation(violation);
                    }
                }
                FileOutcome::Failed(diagnostic) => {
                    checked += 1;
                    report.add_diagnostic(diagnostic);
                }
                FileOutcome::Skipped => skipped += 1,
            }
        }

        report.cancelled = skipped > 0;
        report.set_files_analyzed(checked);
        report.set_files_skipped(skipped);
        report.set_execution_time(start_time.elapsed().as_millis() as u64);
        report.set_config_fingerprint(self.config.fingerprint());
        report.sort_violations();

        tracing::info!(
            "Checked {} file(s): {} violation(s), {} diagnostic(s), {} rule failure(s){}",
            checked,
            report.violations.len(),
            report.diagnostics.len(),
            rule_failures,
            if report.cancelled { ", cancelled" } else { "" }
        );

        Ok(report)
    }

    /// Expand the inputs into the list of files to check, in discovery order.
    /// Inputs that do not exist come back as I/O diagnostics.
    fn collect_files<P: AsRef<Path>>(
        &self,
        paths: &[P],
        options: &AnalysisOptions,
    ) -> DisciplineResult<(Vec<PathBuf>, Vec<FileDiagnostic>)> {
        let mut filter = if options.ignore_ignore_files {
            PathFilter::new(self.config.paths.patterns.clone(), None)?
        } else {
            self.path_filter.clone()
        };
        for pattern in &options.exclude_patterns {
            filter.add_pattern(pattern)?;
        }

        let mut files = Vec::new();
        let mut unreadable = Vec::new();
        let cwd = std::env::current_dir().ok();

        for path in paths {
            let path = path.as_ref();
            if path.is_file() {
                let included = match &cwd {
                    Some(cwd) => filter.should_analyze_in(cwd, path),
                    None => filter.should_analyze(path),
                };
                if included {
                    files.push(path.to_path_buf());
                }
            } else if path.is_dir() {
                let (found, errors) = filter.find_files(path);
                files.extend(found);
                unreadable.extend(errors);
            } else {
                let error = io::Error::new(io::ErrorKind::NotFound, "no such file or directory");
                tracing::warn!("Cannot check {}: {}", path.display(), error);
                unreadable.push(FileDiagnostic::io(path.to_path_buf(), &error));
            }
        }

        if let Some(max_files) = options.max_files {
            files.truncate(max_files);
        }

        Ok((files, unreadable))
    }

    fn check_file(&self, path: &Path, rules: &[Rule], cancel: &AtomicBool) -> FileOutcome {
        if cancel.load(Ordering::Relaxed) {
            return FileOutcome::Skipped;
        }

        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) => {
                let diagnostic = FileDiagnostic::io(path.to_path_buf(), &e);
                tracing::warn!("{}", diagnostic.format_display());
                return FileOutcome::Failed(diagnostic);
            }
        };

        let outcome = match SourceUnit::parse(path, text) {
            Ok(unit) => {
                let violations = evaluator::evaluate(&unit, rules);
                tracing::debug!("{}: {} violation(s)", path.display(), violations.len());
                FileOutcome::Checked(violations)
            }
            Err(e) => {
                let diagnostic = FileDiagnostic::from_syntax_error(&e);
                tracing::warn!("{}", diagnostic.format_display());
                FileOutcome::Failed(diagnostic)
            }
        };

        // The unit and its spans are gone; release this thread's source map
        proc_macro2::extra::invalidate_current_thread_spans();
        outcome
    }
}
