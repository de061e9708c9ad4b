//! Pattern-matching discipline: `match` where something simpler fits

use super::support;
use crate::config::RuleSettings;
use crate::domain::{Discipline, InternalRuleError, Severity};
use crate::rules::{Finding, Rule};
use crate::source::SourceUnit;
use syn::visit::Visit;

pub fn rules(_settings: &RuleSettings) -> Vec<Rule> {
    vec![
        Rule::new(
            "bool_match",
            Discipline::PatternMatching,
            Severity::Warning,
            "`match` on a boolean",
            |unit: &SourceUnit| matches_where(unit, is_bool_match),
        )
        .with_description("Matching on `true` and `false` is an `if`/`else` written the long way.")
        .with_suggestion("Use `if`/`else`"),
        Rule::new(
            "single_arm_match",
            Discipline::PatternMatching,
            Severity::Warning,
            "`match` with one meaningful arm",
            |unit: &SourceUnit| matches_where(unit, is_single_arm_match),
        )
        .with_description(
            "A `match` whose second arm is `_ => {}` only cares about one pattern; \
             `if let` says that directly.",
        )
        .with_suggestion("Use `if let`"),
        Rule::new(
            "matches_macro_candidate",
            Discipline::PatternMatching,
            Severity::Info,
            "`match` that only produces `true` or `false`",
            |unit: &SourceUnit| matches_where(unit, is_matches_candidate),
        )
        .with_description(
            "A `match` whose arms all evaluate to boolean literals is a pattern test; \
             the `matches!` macro expresses it in one line.",
        )
        .with_suggestion("Use `matches!(value, Pattern)`"),
    ]
}

/// Findings for every `match` accepted by `predicate`, located at the `match` keyword
fn matches_where(
    unit: &SourceUnit,
    predicate: fn(&syn::ExprMatch) -> bool,
) -> Result<Vec<Finding>, InternalRuleError> {
    struct MatchVisitor<'u> {
        unit: &'u SourceUnit,
        predicate: fn(&syn::ExprMatch) -> bool,
        findings: Vec<Finding>,
    }

    impl<'ast> Visit<'ast> for MatchVisitor<'_> {
        fn visit_expr_match(&mut self, expr: &'ast syn::ExprMatch) {
            if (self.predicate)(expr) {
                let subject = quote::ToTokens::to_token_stream(&expr.expr).to_string();
                self.findings.push(support::finding(self.unit, &expr.match_token, subject));
            }
            syn::visit::visit_expr_match(self, expr);
        }
    }

    let mut visitor = MatchVisitor { unit, predicate, findings: Vec::new() };
    visitor.visit_file(unit.syntax());
    Ok(visitor.findings)
}

fn bool_literal_pattern(pat: &syn::Pat) -> Option<bool> {
    match pat {
        syn::Pat::Lit(syn::PatLit { lit: syn::Lit::Bool(value), .. }) => Some(value.value),
        _ => None,
    }
}

fn is_wildcard(pat: &syn::Pat) -> bool {
    matches!(pat, syn::Pat::Wild(_))
}

/// `{}`, `()` or `{ () }`
fn is_unit_body(body: &syn::Expr) -> bool {
    match body {
        syn::Expr::Tuple(tuple) => tuple.elems.is_empty(),
        syn::Expr::Block(block) => match block.block.stmts.as_slice() {
            [] => true,
            [syn::Stmt::Expr(inner, None)] => is_unit_body(inner),
            _ => false,
        },
        _ => false,
    }
}

/// `true`, `false`, `{ true }`
fn bool_literal_body(body: &syn::Expr) -> Option<bool> {
    match body {
        syn::Expr::Lit(syn::ExprLit { lit: syn::Lit::Bool(value), .. }) => Some(value.value),
        syn::Expr::Block(block) => match block.block.stmts.as_slice() {
            [syn::Stmt::Expr(inner, None)] => bool_literal_body(inner),
            _ => None,
        },
        _ => None,
    }
}

fn is_bool_match(expr: &syn::ExprMatch) -> bool {
    !expr.arms.is_empty()
        && expr.arms.iter().all(|arm| arm.guard.is_none())
        && expr.arms.iter().any(|arm| bool_literal_pattern(&arm.pat).is_some())
        && expr
            .arms
            .iter()
            .all(|arm| bool_literal_pattern(&arm.pat).is_some() || is_wildcard(&arm.pat))
}

fn is_single_arm_match(expr: &syn::ExprMatch) -> bool {
    match expr.arms.as_slice() {
        [first, second] => {
            first.guard.is_none()
                && !is_wildcard(&first.pat)
                && bool_literal_pattern(&first.pat).is_none()
                && is_wildcard(&second.pat)
                && is_unit_body(&second.body)
        }
        _ => false,
    }
}

fn is_matches_candidate(expr: &syn::ExprMatch) -> bool {
    let bodies: Option<Vec<bool>> =
        expr.arms.iter().map(|arm| bool_literal_body(&arm.body)).collect();

    match bodies {
        Some(values) if values.len() >= 2 => {
            values.contains(&true) && values.contains(&false) && !is_bool_match(expr)
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::check;

    #[test]
    fn test_bool_match() {
        let source = r#"
fn f(flag: bool) -> u8 {
    match flag {
        true => 1,
        false => 0,
    }
}
"#;
        let findings = check("bool_match", source);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].location.line, 3);
        assert_eq!(findings[0].location.column, 5);
        assert_eq!(findings[0].subject, "flag");
    }

    #[test]
    fn test_match_on_enum_is_not_bool_match() {
        let source = "fn f(x: Option<u8>) -> u8 { match x { Some(v) => v, None => 0 } }";
        assert!(check("bool_match", source).is_empty());
    }

    #[test]
    fn test_single_arm_match() {
        let source = r#"
fn f(x: Option<u8>) {
    match x {
        Some(v) => println!("{v}"),
        _ => {}
    }
    match x {
        Some(v) => println!("{v}"),
        _ => (),
    }
}
"#;
        assert_eq!(check("single_arm_match", source).len(), 2);
    }

    #[test]
    fn test_match_with_two_real_arms_is_fine() {
        let source = "fn f(x: Option<u8>) { match x { Some(_) => g(), _ => h() } }";
        assert!(check("single_arm_match", source).is_empty());
    }

    #[test]
    fn test_matches_macro_candidate() {
        let source = r#"
fn is_digit(c: char) -> bool {
    match c {
        '0'..='9' => true,
        _ => false,
    }
}
"#;
        let findings = check("matches_macro_candidate", source);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].subject, "c");
    }

    #[test]
    fn test_matches_candidate_excludes_bool_scrutinee_and_mixed_arms() {
        let source = r#"
fn f(b: bool, x: Option<u8>) -> bool {
    let _ = match b { true => false, false => true };
    match x { Some(0) => true, Some(_) => is_odd(), None => false }
}
"#;
        assert!(check("matches_macro_candidate", source).is_empty());
    }
}
