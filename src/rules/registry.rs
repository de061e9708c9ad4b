//! Rule registry
//!
//! Populated once before analysis starts and read-only afterwards. Callers
//! that share it across worker threads wrap it in an `Arc`.

use super::{builtin, custom, Rule};
use crate::config::DisciplineConfig;
use crate::domain::{Discipline, DisciplineError, DisciplineResult};
use std::collections::{BTreeMap, HashMap};

/// Ordered collection of rules with unique identifiers
#[derive(Debug, Default)]
pub struct RuleRegistry {
    rules: Vec<Rule>,
    index: HashMap<String, usize>,
}

/// Counts of registered rules
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistryStats {
    pub total: usize,
    pub enabled: usize,
    pub by_discipline: BTreeMap<Discipline, usize>,
}

impl RuleRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Built-in rules with default settings
    pub fn with_builtin_rules() -> DisciplineResult<Self> {
        Self::from_config(&DisciplineConfig::default())
    }

    /// Build the registry described by a configuration: built-in rules with
    /// the configured thresholds and overrides, followed by custom rules
    pub fn from_config(config: &DisciplineConfig) -> DisciplineResult<Self> {
        let mut registry = Self::new();

        for rule in builtin::rules(&config.settings) {
            let (enabled, severity) =
                config.effective(&rule.id, rule.discipline, rule.enabled, rule.severity);
            registry.register(rule.with_enabled(enabled).with_severity(severity))?;
        }

        // Overrides may only target built-in rules; custom rules carry their own settings
        if let Some(unknown) = config.rules.keys().find(|id| !registry.contains(id)) {
            return Err(DisciplineError::config(format!(
                "Override for unknown rule '{unknown}'"
            )));
        }

        for rule_config in &config.custom_rules {
            registry.register(custom::build(rule_config)?)?;
        }

        tracing::debug!(
            "Registry built with {} rules ({} enabled)",
            registry.len(),
            registry.enabled().count()
        );
        Ok(registry)
    }

    /// Add a rule. Fails without modifying the registry if the id is taken.
    pub fn register(&mut self, rule: Rule) -> DisciplineResult<()> {
        if self.index.contains_key(&rule.id) {
            return Err(DisciplineError::DuplicateRule { id: rule.id });
        }

        self.index.insert(rule.id.clone(), self.rules.len());
        self.rules.push(rule);
        Ok(())
    }

    /// All rules in registration order
    pub fn all(&self) -> &[Rule] {
        &self.rules
    }

    pub fn get(&self, id: &str) -> Option<&Rule> {
        self.index.get(id).map(|&i| &self.rules[i])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Rules belonging to one discipline, in registration order
    pub fn in_discipline(&self, discipline: Discipline) -> impl Iterator<Item = &Rule> {
        self.rules.iter().filter(move |rule| rule.discipline == discipline)
    }

    /// Enabled rules, in registration order
    pub fn enabled(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter().filter(|rule| rule.enabled)
    }

    /// The rules a check run evaluates: enabled, optionally restricted to one discipline
    pub fn selection(&self, discipline: Option<Discipline>) -> Vec<Rule> {
        self.enabled()
            .filter(|rule| discipline.map_or(true, |d| rule.discipline == d))
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn stats(&self) -> RegistryStats {
        let mut stats = RegistryStats { total: self.rules.len(), ..Default::default() };
        for rule in &self.rules {
            if rule.enabled {
                stats.enabled += 1;
            }
            *stats.by_discipline.entry(rule.discipline).or_default() += 1;
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConfigBuilder, CustomRuleConfig, Override};
    use crate::domain::Severity;
    use crate::rules::CheckResult;
    use crate::source::SourceUnit;

    fn noop_rule(id: &str, discipline: Discipline) -> Rule {
        Rule::new(id, discipline, Severity::Warning, "msg", |_: &SourceUnit| -> CheckResult {
            Ok(Vec::new())
        })
    }

    #[test]
    fn test_duplicate_registration_leaves_registry_unchanged() {
        let mut registry = RuleRegistry::new();
        registry.register(noop_rule("foo", Discipline::Code)).unwrap();

        let err = registry.register(noop_rule("foo", Discipline::Naming)).unwrap_err();
        assert!(matches!(err, DisciplineError::DuplicateRule { ref id } if id == "foo"));

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("foo").map(|r| r.discipline), Some(Discipline::Code));
    }

    #[test]
    fn test_registration_order_is_preserved() {
        let mut registry = RuleRegistry::new();
        for id in ["zeta", "alpha", "mid"] {
            registry.register(noop_rule(id, Discipline::Code)).unwrap();
        }

        let ids: Vec<_> = registry.all().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_builtin_registry_covers_every_discipline() {
        let registry = RuleRegistry::with_builtin_rules().unwrap();
        let stats = registry.stats();

        assert!(!registry.is_empty());
        for discipline in Discipline::ALL {
            assert!(
                registry.in_discipline(discipline).next().is_some(),
                "no rules for {discipline}"
            );
        }
        assert_eq!(stats.by_discipline.values().sum::<usize>(), stats.total);
        assert!(registry.all().iter().all(|r| !r.description.is_empty()));
    }

    #[test]
    fn test_overrides_apply() {
        let config = ConfigBuilder::new()
            .discipline(Discipline::Naming, Override { enabled: Some(false), severity: None })
            .rule("unwrap_call", Override { enabled: None, severity: Some(Severity::Error) })
            .build()
            .unwrap();
        let registry = RuleRegistry::from_config(&config).unwrap();

        assert!(registry.in_discipline(Discipline::Naming).all(|r| !r.enabled));
        assert_eq!(registry.get("unwrap_call").map(|r| r.severity), Some(Severity::Error));
        assert!(registry.selection(None).iter().all(|r| r.discipline != Discipline::Naming));
    }

    #[test]
    fn test_override_for_unknown_rule_is_rejected() {
        let config = ConfigBuilder::new()
            .rule("no_such_rule", Override::default())
            .build()
            .unwrap();
        let err = RuleRegistry::from_config(&config).unwrap_err();
        assert!(err.to_string().contains("no_such_rule"));
    }

    #[test]
    fn test_custom_rule_colliding_with_builtin_fails() {
        let config = ConfigBuilder::new()
            .custom_rule(CustomRuleConfig {
                id: "unwrap_call".to_string(),
                discipline: Discipline::ErrorHandling,
                pattern: "unwrap".to_string(),
                message: "no".to_string(),
                severity: Severity::Warning,
                case_sensitive: true,
                enabled: true,
                suggestion: None,
            })
            .build()
            .unwrap();

        let err = RuleRegistry::from_config(&config).unwrap_err();
        assert!(matches!(err, DisciplineError::DuplicateRule { .. }));
    }

    #[test]
    fn test_selection_by_discipline() {
        let registry = RuleRegistry::with_builtin_rules().unwrap();
        let selected = registry.selection(Some(Discipline::Unsafe));

        assert!(!selected.is_empty());
        assert!(selected.iter().all(|r| r.discipline == Discipline::Unsafe));
    }
}
