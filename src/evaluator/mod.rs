//! Rule evaluator
//!
//! Runs each rule's predicate once over a `SourceUnit` and turns findings into
//! violations. A rule that fails, or reports a location outside the file,
//! yields one `internal_error` violation carrying its id; the remaining rules
//! still run.

use crate::domain::{DisciplineError, Violation, ViolationKind};
use crate::rules::Rule;
use crate::source::SourceUnit;

/// Evaluate `rules` against one parsed file
///
/// The result is sorted by (line, column). The sort is stable, so violations
/// at the same position keep rule order.
pub fn evaluate(unit: &SourceUnit, rules: &[Rule]) -> Vec<Violation> {
    let mut violations = Vec::new();

    for rule in rules {
        match rule.check(unit) {
            Ok(findings) => {
                tracing::trace!(
                    "{}: {} finding(s) in {}",
                    rule.id,
                    findings.len(),
                    unit.path().display()
                );

                if let Some(bad) = findings.iter().find(|f| !unit.contains(&f.location)) {
                    tracing::warn!(
                        "Rule '{}' reported {}:{} outside {}",
                        rule.id,
                        bad.location.line,
                        bad.location.column,
                        unit.path().display()
                    );
                    violations.push(internal_error(
                        rule,
                        unit,
                        format!(
                            "reported a location outside the file ({}:{})",
                            bad.location.line, bad.location.column
                        ),
                    ));
                    continue;
                }

                violations.extend(findings.iter().map(|finding| {
                    let mut violation = Violation::new(
                        rule.id.clone(),
                        rule.discipline,
                        rule.severity,
                        unit.path().to_path_buf(),
                        finding.location,
                        rule.render_message(finding),
                    );
                    if let Some(context) = unit.context_for(&finding.location) {
                        violation = violation.with_context(context);
                    }
                    if let Some(suggestion) =
                        finding.suggestion.as_ref().or(rule.suggestion.as_ref())
                    {
                        violation = violation.with_suggestion(suggestion.clone());
                    }
                    violation
                }));
            }
            Err(error) => {
                tracing::warn!("Rule '{}' failed on {}: {}", rule.id, unit.path().display(), error);
                violations.push(internal_error(rule, unit, error.to_string()));
            }
        }
    }

    violations.sort_by(|a, b| a.location.position_cmp(&b.location));
    violations
}

fn internal_error(rule: &Rule, unit: &SourceUnit, detail: String) -> Violation {
    let error = DisciplineError::InternalRule { rule_id: rule.id.clone(), message: detail };
    Violation::internal_error(
        rule.id.clone(),
        rule.discipline,
        unit.path().to_path_buf(),
        error.to_string(),
    )
}

/// Count of internal-error violations, for logging
pub fn internal_errors(violations: &[Violation]) -> usize {
    violations.iter().filter(|v| v.kind == ViolationKind::InternalError).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Discipline, InternalRuleError, Location, Severity};
    use crate::rules::{CheckResult, Finding, RuleRegistry};

    fn rule_at(id: &str, points: &'static [(u32, u32)]) -> Rule {
        let check = move |_: &SourceUnit| -> CheckResult {
            Ok(points
                .iter()
                .map(|&(line, column)| {
                    Finding::new(Location::point(line, column), format!("line {line}"))
                })
                .collect())
        };
        Rule::new(id, Discipline::Code, Severity::Warning, "hit {subject}", check)
    }

    fn unit(text: &str) -> SourceUnit {
        SourceUnit::parse("sample.rs", text).unwrap()
    }

    #[test]
    fn test_empty_file_has_no_violations() {
        let registry = RuleRegistry::with_builtin_rules().unwrap();
        let violations = evaluate(&unit(""), &registry.selection(None));
        assert!(violations.is_empty());
    }

    #[test]
    fn test_violations_sorted_by_position_then_rule_order() {
        let rules = vec![rule_at("late", &[(3, 1), (1, 5)]), rule_at("early", &[(1, 5), (1, 2)])];
        let violations = evaluate(&unit("fn a() {}\nfn b() {}\nfn c() {}\n"), &rules);

        let order: Vec<_> = violations
            .iter()
            .map(|v| (v.rule_id.as_str(), v.location.line, v.location.column))
            .collect();
        assert_eq!(order, vec![("early", 1, 2), ("late", 1, 5), ("early", 1, 5), ("late", 3, 1)]);
        assert_eq!(violations[0].message, "hit line 1");
        assert_eq!(violations[0].context.as_deref(), Some("fn a() {}"));
    }

    #[test]
    fn test_failing_rule_is_isolated() {
        let failing = Rule::new(
            "broken",
            Discipline::Code,
            Severity::Info,
            "never",
            |_: &SourceUnit| -> CheckResult { Err(InternalRuleError::new("visitor gave up")) },
        );
        let rules = vec![failing, rule_at("fine", &[(1, 1)])];
        let violations = evaluate(&unit("fn a() {}\n"), &rules);

        assert_eq!(violations.len(), 2);
        let broken = violations.iter().find(|v| v.rule_id == "broken").unwrap();
        assert_eq!(broken.kind, ViolationKind::InternalError);
        assert_eq!(broken.severity, Severity::Error);
        assert_eq!(broken.message, "Rule 'broken' failed: visitor gave up");
        assert_eq!(internal_errors(&violations), 1);
    }

    #[test]
    fn test_out_of_range_finding_becomes_internal_error() {
        let rules = vec![rule_at("wild", &[(1, 1), (99, 1)])];
        let violations = evaluate(&unit("fn a() {}\n"), &rules);

        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].kind, ViolationKind::InternalError);
        assert_eq!(violations[0].rule_id, "wild");
    }

    #[test]
    fn test_evaluation_is_deterministic() {
        let registry = RuleRegistry::with_builtin_rules().unwrap();
        let source = "use std::collections::*;\nfn doThing(x: Option<u8>) -> u8 {\n    return x.unwrap();\n}\n";
        let first = evaluate(&unit(source), &registry.selection(None));
        let second = evaluate(&unit(source), &registry.selection(None));

        assert!(!first.is_empty());
        assert_eq!(first, second);
    }

    #[test]
    fn test_suggestion_is_attached() {
        let registry = RuleRegistry::with_builtin_rules().unwrap();
        let rules: Vec<_> =
            registry.selection(None).into_iter().filter(|r| r.id == "unwrap_call").collect();
        let violations = evaluate(&unit("fn f(x: Option<u8>) -> u8 { x.unwrap() }\n"), &rules);

        assert_eq!(violations.len(), 1);
        assert!(violations[0].suggestion.is_some());
    }

    #[test]
    fn test_finding_suggestion_overrides_rule_suggestion() {
        let registry = RuleRegistry::with_builtin_rules().unwrap();
        let rules: Vec<_> = registry
            .selection(None)
            .into_iter()
            .filter(|r| r.id == "fn_name_snake_case" || r.id == "getter_get_prefix")
            .collect();
        let source = "struct S;\nimpl S {\n    fn get_id(&self) -> u8 { 0 }\n    fn readAll(&self) {}\n}\n";
        let violations = evaluate(&unit(source), &rules);

        let suggestions: Vec<_> = violations.iter().map(|v| v.suggestion.as_deref()).collect();
        assert_eq!(
            suggestions,
            vec![Some("Drop the `get_` prefix"), Some("Rename to `read_all`")]
        );
    }
}
