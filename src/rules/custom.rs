//! Rules declared in configuration
//!
//! A custom rule is a regex applied to each source line. Lines inside
//! comments are included; the pattern decides what it wants to match.

use super::{CheckResult, Finding, Rule};
use crate::config::CustomRuleConfig;
use crate::domain::{DisciplineError, DisciplineResult, Location};
use crate::source::SourceUnit;
use regex::{Regex, RegexBuilder};

/// Compile a configured rule into a registry rule
pub fn build(config: &CustomRuleConfig) -> DisciplineResult<Rule> {
    let regex = RegexBuilder::new(&config.pattern)
        .case_insensitive(!config.case_sensitive)
        .build()
        .map_err(|e| {
            DisciplineError::pattern(format!(
                "Invalid regex pattern in custom rule '{}': {}",
                config.id, e
            ))
        })?;

    let mut rule = Rule::new(
        config.id.clone(),
        config.discipline,
        config.severity,
        config.message.clone(),
        move |unit: &SourceUnit| -> CheckResult { Ok(line_matches(unit, &regex)) },
    )
    .with_description(format!("Custom rule matching `{}`", config.pattern))
    .with_enabled(config.enabled);

    if let Some(suggestion) = &config.suggestion {
        rule = rule.with_suggestion(suggestion.clone());
    }
    Ok(rule)
}

fn line_matches(unit: &SourceUnit, regex: &Regex) -> Vec<Finding> {
    unit.lines()
        .flat_map(|(line, text)| {
            regex.find_iter(text).map(move |m| {
                let column = text[..m.start()].chars().count() as u32 + 1;
                let end_column = column + m.as_str().chars().count() as u32;
                Finding::new(Location::span(line, column, line, end_column), m.as_str())
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Discipline, Severity};

    fn config(pattern: &str, case_sensitive: bool) -> CustomRuleConfig {
        CustomRuleConfig {
            id: "no_dbg".to_string(),
            discipline: Discipline::Code,
            pattern: pattern.to_string(),
            message: "Leftover debug macro: {subject}".to_string(),
            severity: Severity::Error,
            case_sensitive,
            enabled: true,
            suggestion: Some("Remove it".to_string()),
        }
    }

    #[test]
    fn test_custom_rule_matches_lines() {
        let rule = build(&config(r"dbg!\(", true)).unwrap();
        let unit = SourceUnit::parse("a.rs", "fn f() {\n    let x = dbg!(1) + dbg!(2);\n}\n").unwrap();
        let findings = rule.check(&unit).unwrap();

        assert_eq!(findings.len(), 2);
        assert_eq!(findings[0].location, Location::span(2, 13, 2, 18));
        assert_eq!(rule.render_message(&findings[0]), "Leftover debug macro: dbg!(");
        assert_eq!(rule.severity, Severity::Error);
        assert_eq!(rule.suggestion.as_deref(), Some("Remove it"));
    }

    #[test]
    fn test_case_insensitive_pattern() {
        let rule = build(&config("hack", false)).unwrap();
        let unit = SourceUnit::parse("a.rs", "// HACK around a bug\nfn f() {}\n").unwrap();
        assert_eq!(rule.check(&unit).unwrap().len(), 1);

        let strict = build(&config("hack", true)).unwrap();
        assert!(strict.check(&unit).unwrap().is_empty());
    }

    #[test]
    fn test_invalid_pattern_is_rejected() {
        let err = build(&config("(", true)).unwrap_err();
        assert!(matches!(err, DisciplineError::Pattern { .. }));
    }
}
