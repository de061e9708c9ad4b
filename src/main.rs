//! Rust Discipline CLI
//!
//! Exit codes: 0 when clean, 1 when violations or syntax errors were found,
//! 2 for internal errors (bad configuration, unreadable files, usage errors).

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use rust_discipline::{
    AnalysisOptions, Discipline, DisciplineChecker, DisciplineConfig, ExitStatus, OutputFormat,
    ReportFormatter, ReportOptions, RuleRegistry, Severity,
};
use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Rust Discipline - style-guide enforcement for idiomatic Rust
#[derive(Parser)]
#[command(name = "rust-discipline")]
#[command(version)]
#[command(about = "Checks Rust sources against the disciplines of a best-practices style guide")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Check files for style violations
    Check(CheckArgs),

    /// List available rules
    Rules {
        /// Only rules of this discipline
        #[arg(long)]
        category: Option<Discipline>,

        /// Show only enabled rules
        #[arg(long)]
        enabled_only: bool,
    },

    /// Explain what a specific rule checks
    Explain {
        /// Rule ID to explain
        rule_id: String,
    },

    /// Validate a configuration file
    ValidateConfig {
        /// Configuration file to validate
        config_file: Option<PathBuf>,
    },
}

#[derive(Args)]
struct CheckArgs {
    /// Paths to check (files or directories)
    paths: Vec<PathBuf>,

    /// Only evaluate rules of this discipline
    #[arg(long)]
    category: Option<Discipline>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Minimum severity to report and to fail on
    #[arg(short, long, value_enum)]
    severity: Option<SeverityArg>,

    /// Maximum number of violations to report
    #[arg(long)]
    max_violations: Option<usize>,

    /// Additional exclude patterns
    #[arg(long, action = clap::ArgAction::Append)]
    exclude: Vec<String>,

    /// Ignore .disciplineignore files
    #[arg(long)]
    no_ignore: bool,

    /// Disable parallel processing
    #[arg(long)]
    no_parallel: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum SeverityArg {
    Info,
    Warning,
    Error,
}

impl From<SeverityArg> for Severity {
    fn from(arg: SeverityArg) -> Self {
        match arg {
            SeverityArg::Info => Severity::Info,
            SeverityArg::Warning => Severity::Warning,
            SeverityArg::Error => Severity::Error,
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    match run_command(cli).await {
        Ok(exit_code) => process::exit(exit_code),
        Err(e) => {
            eprintln!("Error: {e:#}");
            process::exit(ExitStatus::InternalError.code());
        }
    }
}

async fn run_command(cli: Cli) -> anyhow::Result<i32> {
    let use_colors = !cli.no_color && io::stdout().is_terminal();

    match cli.command {
        Commands::Check(args) => run_check(cli.config.as_deref(), args, use_colors).await,
        Commands::Rules { category, enabled_only } => {
            run_list_rules(cli.config.as_deref(), category, enabled_only)
        }
        Commands::Explain { rule_id } => run_explain(cli.config.as_deref(), &rule_id),
        Commands::ValidateConfig { config_file } => {
            run_validate_config(config_file.as_deref().or(cli.config.as_deref()))
        }
    }
}

fn load_config(config_path: Option<&Path>) -> anyhow::Result<DisciplineConfig> {
    let cwd = std::env::current_dir().context("Cannot determine the working directory")?;
    let config = DisciplineConfig::resolve(config_path, &cwd)
        .context("Failed to load configuration")?;
    Ok(config)
}

async fn run_check(
    config_path: Option<&Path>,
    args: CheckArgs,
    use_colors: bool,
) -> anyhow::Result<i32> {
    let config = load_config(config_path)?;
    let min_severity = args.severity.map(Severity::from);

    let formatter = ReportFormatter::new(ReportOptions {
        use_colors,
        max_violations: args.max_violations,
        min_severity,
        ..Default::default()
    });
    let checker = DisciplineChecker::new_with_config(config)?;

    let paths = if args.paths.is_empty() { vec![PathBuf::from(".")] } else { args.paths };

    let options = AnalysisOptions {
        parallel: !args.no_parallel,
        exclude_patterns: args.exclude,
        discipline: args.category,
        ignore_ignore_files: args.no_ignore,
        ..Default::default()
    };

    let cancel = Arc::new(AtomicBool::new(false));
    let check = checker.check_paths_async(paths, options, Arc::clone(&cancel));
    tokio::pin!(check);

    let report = tokio::select! {
        result = &mut check => result?,
        _ = tokio::signal::ctrl_c() => {
            tracing::warn!("Interrupted; finishing files already in progress");
            cancel.store(true, Ordering::SeqCst);
            check.await?
        }
    };

    formatter.write_report(&report, args.format, io::stdout().lock())?;

    Ok(report.exit_status(min_severity).code())
}

fn run_list_rules(
    config_path: Option<&Path>,
    category: Option<Discipline>,
    enabled_only: bool,
) -> anyhow::Result<i32> {
    let registry = RuleRegistry::from_config(&load_config(config_path)?)?;

    println!("Available rules\n");

    for discipline in Discipline::ALL {
        if category.map_or(false, |c| c != discipline) {
            continue;
        }

        let rules: Vec<_> =
            registry.in_discipline(discipline).filter(|r| r.enabled || !enabled_only).collect();
        if rules.is_empty() {
            continue;
        }

        println!("{discipline}");
        for rule in rules {
            let status = if rule.enabled { "on " } else { "off" };
            println!("  [{}] {} ({}) - {}", status, rule.id, rule.severity.as_str(), rule.message);
        }
        println!();
    }

    let stats = registry.stats();
    println!("{} rules, {} enabled", stats.total, stats.enabled);
    Ok(0)
}

fn run_explain(config_path: Option<&Path>, rule_id: &str) -> anyhow::Result<i32> {
    let registry = RuleRegistry::from_config(&load_config(config_path)?)?;

    let Some(rule) = registry.get(rule_id) else {
        eprintln!("Rule '{rule_id}' not found");
        eprintln!();
        eprintln!("Available rules:");
        for rule in registry.all() {
            eprintln!("  - {}", rule.id);
        }
        return Ok(ExitStatus::InternalError.code());
    };

    println!("Rule:       {}", rule.id);
    println!("Discipline: {}", rule.discipline);
    println!("Severity:   {}", rule.severity.as_str());
    println!("Enabled:    {}", rule.enabled);
    println!();
    println!("Message:");
    println!("  {}", rule.message);
    if !rule.description.is_empty() {
        println!();
        println!("Description:");
        println!("  {}", rule.description);
    }
    if let Some(suggestion) = &rule.suggestion {
        println!();
        println!("Suggestion:");
        println!("  {suggestion}");
    }

    Ok(0)
}

fn run_validate_config(config_path: Option<&Path>) -> anyhow::Result<i32> {
    let config_path = match config_path {
        Some(path) => path.to_path_buf(),
        None => {
            let cwd = std::env::current_dir().context("Cannot determine the working directory")?;
            match DisciplineConfig::discover(&cwd) {
                Some(path) => path,
                None => {
                    println!("No configuration file found; built-in defaults apply");
                    return Ok(0);
                }
            }
        }
    };

    println!("Validating configuration: {}", config_path.display());

    let result = DisciplineConfig::load_from_file(&config_path)
        .and_then(|config| RuleRegistry::from_config(&config).map(|registry| (config, registry)));

    match result {
        Ok((config, registry)) => {
            let stats = registry.stats();
            println!("Configuration is valid");
            println!("  Rules: {} total, {} enabled", stats.total, stats.enabled);
            println!("  Custom rules: {}", config.custom_rules.len());
            println!("  Path patterns: {}", config.paths.patterns.len());
            println!("  Fingerprint: {}", config.fingerprint());
            Ok(0)
        }
        Err(e) => {
            eprintln!("Configuration validation failed: {e}");
            Ok(ExitStatus::InternalError.code())
        }
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn check_args(paths: Vec<PathBuf>) -> CheckArgs {
        CheckArgs {
            paths,
            category: None,
            format: OutputFormat::Json,
            severity: None,
            max_violations: None,
            exclude: Vec::new(),
            no_ignore: false,
            no_parallel: false,
        }
    }

    fn default_config(dir: &TempDir) -> PathBuf {
        let path = dir.path().join("rust_discipline.yaml");
        fs::write(&path, DisciplineConfig::default().to_yaml().unwrap()).unwrap();
        path
    }

    #[tokio::test]
    async fn test_check_command_exit_codes() {
        let temp_dir = TempDir::new().unwrap();
        let config = default_config(&temp_dir);
        let dirty = temp_dir.path().join("dirty.rs");
        let clean = temp_dir.path().join("clean.rs");
        fs::write(&dirty, "fn main() {\n    let v = std::env::var(\"X\").unwrap();\n}\n").unwrap();
        fs::write(&clean, "fn main() {}\n").unwrap();

        let code = run_check(Some(&config), check_args(vec![dirty.clone()]), false).await.unwrap();
        assert_eq!(code, 1);

        let code = run_check(Some(&config), check_args(vec![clean]), false).await.unwrap();
        assert_eq!(code, 0);

        let mut args = check_args(vec![dirty]);
        args.severity = Some(SeverityArg::Error);
        let code = run_check(Some(&config), args, false).await.unwrap();
        assert_eq!(code, 0);
    }

    #[tokio::test]
    async fn test_check_missing_path_is_internal_error() {
        let temp_dir = TempDir::new().unwrap();
        let config = default_config(&temp_dir);

        let args = check_args(vec![temp_dir.path().join("absent.rs")]);
        let code = run_check(Some(&config), args, false).await.unwrap();
        assert_eq!(code, 2);
    }

    #[test]
    fn test_validate_config() {
        let temp_dir = TempDir::new().unwrap();
        let config = default_config(&temp_dir);
        assert_eq!(run_validate_config(Some(&config)).unwrap(), 0);

        let broken = temp_dir.path().join("broken.yaml");
        fs::write(&broken, "version: \"1.0\"\nrules:\n  no_such_rule: { enabled: false }\n").unwrap();
        assert_eq!(run_validate_config(Some(&broken)).unwrap(), 2);
    }

    #[test]
    fn test_explain_rule() {
        let temp_dir = TempDir::new().unwrap();
        let config = default_config(&temp_dir);

        assert_eq!(run_explain(Some(&config), "unwrap_call").unwrap(), 0);
        assert_eq!(run_explain(Some(&config), "nonexistent_rule").unwrap(), 2);
    }

    #[test]
    fn test_list_rules() {
        let temp_dir = TempDir::new().unwrap();
        let config = default_config(&temp_dir);

        assert_eq!(run_list_rules(Some(&config), None, false).unwrap(), 0);
        assert_eq!(run_list_rules(Some(&config), Some(Discipline::Naming), true).unwrap(), 0);
    }

    #[test]
    fn test_unknown_category_is_usage_error() {
        let result = Cli::try_parse_from(["rust-discipline", "check", "--category", "nonsense"]);
        let err = result.err().unwrap();
        assert_eq!(err.exit_code(), 2);

        let cli = Cli::try_parse_from([
            "rust-discipline",
            "check",
            "--category",
            "error-handling",
            "--format",
            "sarif",
        ])
        .unwrap();
        match cli.command {
            Commands::Check(args) => {
                assert_eq!(args.category, Some(Discipline::ErrorHandling));
                assert_eq!(args.format, OutputFormat::Sarif);
            }
            _ => panic!("expected check"),
        }
    }
}
