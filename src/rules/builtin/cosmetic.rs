//! Cosmetic discipline: layout details rustfmt leaves alone

use super::support;
use crate::config::RuleSettings;
use crate::domain::{Discipline, InternalRuleError, Location, Severity};
use crate::rules::{Finding, Rule};
use crate::source::SourceUnit;
use syn::visit::Visit;

pub fn rules(settings: &RuleSettings) -> Vec<Rule> {
    let max_line_length = settings.max_line_length;

    vec![
        Rule::new(
            "bool_literal_comparison",
            Discipline::Cosmetic,
            Severity::Warning,
            "Comparison against the literal `{subject}`",
            bool_literal_comparisons,
        )
        .with_description(
            "Comparing a boolean with `true` or `false` adds noise. Use the expression \
             itself, or negate it with `!`.",
        )
        .with_suggestion("Write `if flag` or `if !flag` instead of comparing with a literal"),
        Rule::new(
            "line_too_long",
            Discipline::Cosmetic,
            Severity::Info,
            format!("Line is {{subject}} characters long (limit {max_line_length})"),
            move |unit: &SourceUnit| long_lines(unit, max_line_length),
        )
        .with_description(
            "Long lines are hard to read side by side. rustfmt does not break string \
             literals or comments, so those need manual wrapping.",
        ),
        Rule::new(
            "trailing_whitespace",
            Discipline::Cosmetic,
            Severity::Info,
            "Trailing whitespace",
            trailing_whitespace,
        )
        .with_description("Lines should not end in spaces or tabs."),
    ]
}

fn bool_literal_comparisons(unit: &SourceUnit) -> Result<Vec<Finding>, InternalRuleError> {
    struct ComparisonVisitor<'u> {
        unit: &'u SourceUnit,
        findings: Vec<Finding>,
    }

    impl<'ast> Visit<'ast> for ComparisonVisitor<'_> {
        fn visit_expr_binary(&mut self, expr: &'ast syn::ExprBinary) {
            if matches!(expr.op, syn::BinOp::Eq(_) | syn::BinOp::Ne(_)) {
                let literal = [expr.left.as_ref(), expr.right.as_ref()].into_iter().find_map(
                    |side| match side {
                        syn::Expr::Lit(syn::ExprLit { lit: syn::Lit::Bool(value), .. }) => {
                            Some(value.value)
                        }
                        _ => None,
                    },
                );

                if let Some(value) = literal {
                    self.findings.push(support::finding(self.unit, expr, value.to_string()));
                }
            }
            syn::visit::visit_expr_binary(self, expr);
        }
    }

    let mut visitor = ComparisonVisitor { unit, findings: Vec::new() };
    visitor.visit_file(unit.syntax());
    Ok(visitor.findings)
}

fn long_lines(unit: &SourceUnit, limit: usize) -> Result<Vec<Finding>, InternalRuleError> {
    Ok(unit
        .lines()
        .filter_map(|(line, text)| {
            let width = text.chars().count();
            (width > limit).then(|| {
                Finding::new(
                    Location::span(line, limit as u32 + 1, line, width as u32 + 1),
                    width.to_string(),
                )
            })
        })
        .collect())
}

fn trailing_whitespace(unit: &SourceUnit) -> Result<Vec<Finding>, InternalRuleError> {
    Ok(unit
        .lines()
        .filter_map(|(line, text)| {
            let trimmed = text.trim_end_matches([' ', '\t']);
            (trimmed.len() < text.len()).then(|| {
                let start = trimmed.chars().count() as u32 + 1;
                let end = text.chars().count() as u32 + 1;
                Finding::new(Location::span(line, start, line, end), "")
            })
        })
        .collect())
}
