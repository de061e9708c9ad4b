//! Configuration loading and management for Rust Discipline
//!
//! - Raw YAML is deserialized into plain structures and validated once
//! - Defaults live here, so a run without any config file is fully specified
//! - The registry reads thresholds and overrides from this module; nothing
//!   else in the crate touches the file format

use crate::domain::{Discipline, DisciplineError, DisciplineResult, Severity};
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

/// File names looked up in the working directory when no `--config` is given
pub const DEFAULT_CONFIG_FILES: [&str; 3] =
    ["rust_discipline.yaml", "rust_discipline.yml", ".rust_discipline.yaml"];

const SUPPORTED_VERSIONS: [&str; 1] = ["1.0"];

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisciplineConfig {
    /// Configuration format version
    pub version: String,
    /// Path filtering configuration
    #[serde(default)]
    pub paths: PathConfig,
    /// Thresholds used by the built-in rules
    #[serde(default)]
    pub settings: RuleSettings,
    /// Per-discipline overrides
    #[serde(default)]
    pub disciplines: BTreeMap<Discipline, Override>,
    /// Per-rule overrides, keyed by rule id
    #[serde(default)]
    pub rules: BTreeMap<String, Override>,
    /// Additional regex rules
    #[serde(default)]
    pub custom_rules: Vec<CustomRuleConfig>,
}

/// Path filtering configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathConfig {
    /// Exclude patterns (gitignore-style, `!` re-includes)
    #[serde(default)]
    pub patterns: Vec<String>,
    /// Optional ignore file name looked up in parent directories
    pub ignore_file: Option<String>,
}

impl Default for PathConfig {
    fn default() -> Self {
        Self {
            patterns: vec![
                "target/**".to_string(),
                "**/target/**".to_string(),
                "**/.git/**".to_string(),
                "**/*.generated.rs".to_string(),
            ],
            ignore_file: Some(".disciplineignore".to_string()),
        }
    }
}

/// Thresholds for the structural and function rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleSettings {
    pub max_line_length: usize,
    pub max_function_args: usize,
    pub max_nesting_depth: usize,
    pub max_function_lines: usize,
    /// Skip `#[test]` functions and `#[cfg(test)]` modules in rules that
    /// only make sense for production code
    pub skip_tests: bool,
}

impl Default for RuleSettings {
    fn default() -> Self {
        Self {
            max_line_length: 100,
            max_function_args: 5,
            max_nesting_depth: 4,
            max_function_lines: 80,
            skip_tests: true,
        }
    }
}

/// Enable/disable or re-severity a rule or a whole discipline
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Override {
    pub enabled: Option<bool>,
    pub severity: Option<Severity>,
}

/// A user-defined rule matching a regex line by line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomRuleConfig {
    pub id: String,
    pub discipline: Discipline,
    pub pattern: String,
    /// Message template; `{subject}` is replaced with the matched text
    pub message: String,
    #[serde(default = "default_severity")]
    pub severity: Severity,
    #[serde(default = "default_true")]
    pub case_sensitive: bool,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub suggestion: Option<String>,
}

impl DisciplineConfig {
    /// Load configuration from a YAML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> DisciplineResult<Self> {
        let contents = fs::read_to_string(&path).map_err(|e| {
            DisciplineError::config(format!(
                "Failed to read config file '{}': {}",
                path.as_ref().display(),
                e
            ))
        })?;

        let config: Self = serde_yaml::from_str(&contents).map_err(|e| {
            DisciplineError::config(format!(
                "Failed to parse config file '{}': {}",
                path.as_ref().display(),
                e
            ))
        })?;

        config.validate()?;
        tracing::debug!("Loaded configuration from {}", path.as_ref().display());
        Ok(config)
    }

    /// Load configuration from string content
    pub fn load_from_str(content: &str) -> DisciplineResult<Self> {
        let config: Self = serde_yaml::from_str(content)
            .map_err(|e| DisciplineError::config(format!("Failed to parse config: {e}")))?;

        config.validate()?;
        Ok(config)
    }

    /// Explicit path if given, else the first default file found in `dir`,
    /// else built-in defaults
    pub fn resolve(explicit: Option<&Path>, dir: &Path) -> DisciplineResult<Self> {
        if let Some(path) = explicit {
            return Self::load_from_file(path);
        }

        match Self::discover(dir) {
            Some(path) => Self::load_from_file(path),
            None => Ok(Self::default()),
        }
    }

    /// Find a default configuration file in `dir`
    pub fn discover(dir: &Path) -> Option<PathBuf> {
        DEFAULT_CONFIG_FILES.iter().map(|name| dir.join(name)).find(|path| path.is_file())
    }

    /// Default configuration
    pub fn with_defaults() -> Self {
        Self {
            version: "1.0".to_string(),
            paths: PathConfig::default(),
            settings: RuleSettings::default(),
            disciplines: BTreeMap::new(),
            rules: BTreeMap::new(),
            custom_rules: Vec::new(),
        }
    }

    /// Validate the configuration for consistency and correctness
    pub fn validate(&self) -> DisciplineResult<()> {
        if !SUPPORTED_VERSIONS.contains(&self.version.as_str()) {
            return Err(DisciplineError::config(format!(
                "Unsupported configuration version: {}. Supported versions: {}",
                self.version,
                SUPPORTED_VERSIONS.join(", ")
            )));
        }

        let thresholds = [
            ("max_line_length", self.settings.max_line_length),
            ("max_function_args", self.settings.max_function_args),
            ("max_nesting_depth", self.settings.max_nesting_depth),
            ("max_function_lines", self.settings.max_function_lines),
        ];
        for (name, value) in thresholds {
            if value == 0 {
                return Err(DisciplineError::config(format!(
                    "Setting '{name}' must be greater than zero"
                )));
            }
        }

        for pattern in &self.paths.patterns {
            let pattern = pattern.strip_prefix('!').unwrap_or(pattern);
            glob::Pattern::new(pattern.trim_end_matches('/')).map_err(|e| {
                DisciplineError::config(format!("Invalid path pattern '{pattern}': {e}"))
            })?;
        }

        let mut seen = HashSet::new();
        for rule in &self.custom_rules {
            if rule.id.trim().is_empty() {
                return Err(DisciplineError::config("Custom rule with an empty id"));
            }
            if !seen.insert(rule.id.as_str()) {
                return Err(DisciplineError::config(format!(
                    "Custom rule '{}' is defined more than once",
                    rule.id
                )));
            }

            regex::RegexBuilder::new(&rule.pattern)
                .case_insensitive(!rule.case_sensitive)
                .build()
                .map_err(|e| {
                    DisciplineError::config(format!(
                        "Invalid regex pattern in custom rule '{}': {}",
                        rule.id, e
                    ))
                })?;
        }

        Ok(())
    }

    /// Effective enabled flag and severity for a rule, given its defaults
    pub fn effective(
        &self,
        rule_id: &str,
        discipline: Discipline,
        enabled: bool,
        severity: Severity,
    ) -> (bool, Severity) {
        let mut enabled = enabled;
        let mut severity = severity;

        for layer in [self.disciplines.get(&discipline), self.rules.get(rule_id)].into_iter().flatten()
        {
            if let Some(flag) = layer.enabled {
                enabled = flag;
            }
            if let Some(level) = layer.severity {
                severity = level;
            }
        }

        (enabled, severity)
    }

    /// Serialize to YAML
    pub fn to_yaml(&self) -> DisciplineResult<String> {
        serde_yaml::to_string(self)
            .map_err(|e| DisciplineError::config(format!("Failed to serialize config: {e}")))
    }

    /// Stable fingerprint of the configuration, recorded in reports
    pub fn fingerprint(&self) -> String {
        let mut hasher = DefaultHasher::new();
        // BTreeMaps keep the serialized form in a stable order
        match serde_json::to_string(self) {
            Ok(json) => json.hash(&mut hasher),
            Err(_) => self.version.hash(&mut hasher),
        }
        format!("{:016x}", hasher.finish())
    }
}

impl Default for DisciplineConfig {
    fn default() -> Self {
        Self::with_defaults()
    }
}

fn default_true() -> bool {
    true
}

fn default_severity() -> Severity {
    Severity::Warning
}

/// Configuration builder for programmatic construction
pub struct ConfigBuilder {
    config: DisciplineConfig,
}

impl ConfigBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self { config: DisciplineConfig::default() }
    }

    /// Add a path pattern
    pub fn add_path_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.config.paths.patterns.push(pattern.into());
        self
    }

    /// Replace the rule thresholds
    pub fn settings(mut self, settings: RuleSettings) -> Self {
        self.config.settings = settings;
        self
    }

    /// Override a whole discipline
    pub fn discipline(mut self, discipline: Discipline, value: Override) -> Self {
        self.config.disciplines.insert(discipline, value);
        self
    }

    /// Override a single rule
    pub fn rule(mut self, rule_id: impl Into<String>, value: Override) -> Self {
        self.config.rules.insert(rule_id.into(), value);
        self
    }

    /// Add a custom regex rule
    pub fn custom_rule(mut self, rule: CustomRuleConfig) -> Self {
        self.config.custom_rules.push(rule);
        self
    }

    /// Build the final configuration
    pub fn build(self) -> DisciplineResult<DisciplineConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn custom(id: &str, pattern: &str) -> CustomRuleConfig {
        CustomRuleConfig {
            id: id.to_string(),
            discipline: Discipline::Code,
            pattern: pattern.to_string(),
            message: "found {subject}".to_string(),
            severity: Severity::Warning,
            case_sensitive: true,
            enabled: true,
            suggestion: None,
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = DisciplineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.settings.max_function_args, 5);
    }

    #[test]
    fn test_load_from_str() {
        let yaml = r#"
version: "1.0"
settings:
  max_line_length: 120
disciplines:
  naming:
    severity: error
  pattern-matching:
    enabled: false
rules:
  unwrap_call:
    enabled: false
custom_rules:
  - id: no_dbg
    discipline: code
    pattern: 'dbg!\('
    message: "Leftover debug macro: {subject}"
"#;
        let config = DisciplineConfig::load_from_str(yaml).unwrap();

        assert_eq!(config.settings.max_line_length, 120);
        assert_eq!(config.settings.max_function_args, 5);
        assert_eq!(config.disciplines[&Discipline::Naming].severity, Some(Severity::Error));
        assert_eq!(config.custom_rules[0].severity, Severity::Warning);
        assert!(config.custom_rules[0].case_sensitive);
        assert!(config.paths.ignore_file.is_some());
    }

    #[test]
    fn test_effective_layers_rule_over_discipline() {
        let config = ConfigBuilder::new()
            .discipline(
                Discipline::Naming,
                Override { enabled: Some(false), severity: Some(Severity::Error) },
            )
            .rule("fn_name_snake_case", Override { enabled: Some(true), severity: None })
            .build()
            .unwrap();

        assert_eq!(
            config.effective("fn_name_snake_case", Discipline::Naming, true, Severity::Warning),
            (true, Severity::Error)
        );
        assert_eq!(
            config.effective("type_name_camel_case", Discipline::Naming, true, Severity::Warning),
            (false, Severity::Error)
        );
        assert_eq!(
            config.effective("unwrap_call", Discipline::ErrorHandling, true, Severity::Warning),
            (true, Severity::Warning)
        );
    }

    #[test]
    fn test_rejects_bad_version() {
        let err = DisciplineConfig::load_from_str("version: \"2.0\"\n").unwrap_err();
        assert!(err.to_string().contains("Unsupported configuration version"));
    }

    #[test]
    fn test_rejects_zero_threshold() {
        let settings = RuleSettings { max_nesting_depth: 0, ..Default::default() };
        let err = ConfigBuilder::new().settings(settings).build().unwrap_err();
        assert!(err.to_string().contains("max_nesting_depth"));
    }

    #[test]
    fn test_rejects_invalid_custom_regex() {
        let err = ConfigBuilder::new().custom_rule(custom("broken", "(unclosed")).build().unwrap_err();
        assert!(err.to_string().contains("broken"));
    }

    #[test]
    fn test_rejects_duplicate_custom_ids() {
        let err = ConfigBuilder::new()
            .custom_rule(custom("twice", "a"))
            .custom_rule(custom("twice", "b"))
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn test_yaml_round_trip_and_fingerprint() {
        let config = ConfigBuilder::new().custom_rule(custom("no_dbg", "dbg!")).build().unwrap();
        let yaml = config.to_yaml().unwrap();
        let reloaded = DisciplineConfig::load_from_str(&yaml).unwrap();

        assert_eq!(config, reloaded);
        assert_eq!(config.fingerprint(), reloaded.fingerprint());
        assert_ne!(config.fingerprint(), DisciplineConfig::default().fingerprint());
    }

    #[test]
    fn test_resolve_discovers_default_file() {
        let temp_dir = TempDir::new().unwrap();
        assert_eq!(
            DisciplineConfig::resolve(None, temp_dir.path()).unwrap(),
            DisciplineConfig::default()
        );

        fs::write(
            temp_dir.path().join("rust_discipline.yaml"),
            "version: \"1.0\"\nsettings:\n  max_function_args: 3\n",
        )
        .unwrap();
        let config = DisciplineConfig::resolve(None, temp_dir.path()).unwrap();
        assert_eq!(config.settings.max_function_args, 3);
    }
}
