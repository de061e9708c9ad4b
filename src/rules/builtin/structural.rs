//! Structural discipline: size and shape of function bodies

use super::support;
use crate::config::RuleSettings;
use crate::domain::{Discipline, Severity};
use crate::rules::{CheckResult, Finding, Rule};
use crate::source::SourceUnit;
use proc_macro2::Span;
use syn::spanned::Spanned;
use syn::visit::Visit;

pub fn rules(settings: &RuleSettings) -> Vec<Rule> {
    let max_depth = settings.max_nesting_depth;
    let max_lines = settings.max_function_lines;

    vec![
        Rule::new(
            "deep_nesting",
            Discipline::Structural,
            Severity::Warning,
            format!("`{{subject}}` nests blocks more than {max_depth} levels deep"),
            move |unit: &SourceUnit| -> CheckResult { Ok(deep_nesting(unit, max_depth)) },
        )
        .with_description(
            "Deeply nested control flow is hard to follow. Return early, use `?`, or \
             extract the inner part into its own function.",
        )
        .with_suggestion("Flatten with early returns or extract a function"),
        Rule::new(
            "long_function",
            Discipline::Structural,
            Severity::Info,
            format!("`{{subject}}` is longer than {max_lines} lines"),
            move |unit: &SourceUnit| -> CheckResult { Ok(long_functions(unit, max_lines)) },
        )
        .with_description(
            "Long functions usually do several things. Split them along those lines.",
        ),
    ]
}

fn deep_nesting(unit: &SourceUnit, max_depth: usize) -> Vec<Finding> {
    struct NestingVisitor<'u> {
        unit: &'u SourceUnit,
        max_depth: usize,
        depth: usize,
        /// Innermost function name, and whether it was already reported
        function: Option<(String, bool)>,
        findings: Vec<Finding>,
    }

    impl NestingVisitor<'_> {
        fn enter_fn(&mut self, name: &syn::Ident, body: &syn::Block) {
            let outer_depth = std::mem::replace(&mut self.depth, 0);
            let outer_fn = self.function.replace((name.to_string(), false));
            self.visit_block(body);
            self.depth = outer_depth;
            self.function = outer_fn;
        }

        fn nested(&mut self, span: Span, visit: impl FnOnce(&mut Self)) {
            self.depth += 1;
            if self.depth > self.max_depth {
                if let Some((name, reported)) = &mut self.function {
                    if !*reported {
                        *reported = true;
                        let location = self.unit.location_of(span);
                        self.findings.push(Finding::new(location, name.clone()));
                    }
                }
            }
            visit(self);
            self.depth -= 1;
        }
    }

    impl<'ast> Visit<'ast> for NestingVisitor<'_> {
        fn visit_item_fn(&mut self, func: &'ast syn::ItemFn) {
            self.enter_fn(&func.sig.ident, &func.block);
        }

        fn visit_impl_item_fn(&mut self, func: &'ast syn::ImplItemFn) {
            self.enter_fn(&func.sig.ident, &func.block);
        }

        fn visit_trait_item_fn(&mut self, func: &'ast syn::TraitItemFn) {
            if let Some(body) = &func.default {
                self.enter_fn(&func.sig.ident, body);
            }
        }

        fn visit_expr_if(&mut self, expr: &'ast syn::ExprIf) {
            self.visit_expr(&expr.cond);
            self.nested(expr.if_token.span, |v| v.visit_block(&expr.then_branch));
            if let Some((else_token, branch)) = &expr.else_branch {
                match branch.as_ref() {
                    // `else if` continues the chain at the same depth
                    syn::Expr::If(chained) => self.visit_expr_if(chained),
                    syn::Expr::Block(block) => {
                        self.nested(else_token.span, |v| v.visit_block(&block.block))
                    }
                    other => self.visit_expr(other),
                }
            }
        }

        fn visit_expr_match(&mut self, expr: &'ast syn::ExprMatch) {
            self.visit_expr(&expr.expr);
            self.nested(expr.match_token.span, |v| {
                for arm in &expr.arms {
                    v.visit_arm(arm);
                }
            });
        }

        fn visit_expr_for_loop(&mut self, expr: &'ast syn::ExprForLoop) {
            self.visit_expr(&expr.expr);
            self.nested(expr.for_token.span, |v| v.visit_block(&expr.body));
        }

        fn visit_expr_while(&mut self, expr: &'ast syn::ExprWhile) {
            self.visit_expr(&expr.cond);
            self.nested(expr.while_token.span, |v| v.visit_block(&expr.body));
        }

        fn visit_expr_loop(&mut self, expr: &'ast syn::ExprLoop) {
            self.nested(expr.loop_token.span, |v| v.visit_block(&expr.body));
        }

        fn visit_expr_closure(&mut self, closure: &'ast syn::ExprClosure) {
            self.nested(closure.or1_token.span(), |v| v.visit_expr(&closure.body));
        }
    }

    let mut visitor =
        NestingVisitor { unit, max_depth, depth: 0, function: None, findings: Vec::new() };
    visitor.visit_file(unit.syntax());
    visitor.findings
}

fn long_functions(unit: &SourceUnit, max_lines: usize) -> Vec<Finding> {
    struct LengthVisitor<'u> {
        unit: &'u SourceUnit,
        max_lines: usize,
        findings: Vec<Finding>,
    }

    impl LengthVisitor<'_> {
        fn check(&mut self, name: &syn::Ident, body: &syn::Block) {
            let span = self.unit.location_of(body.span());
            // Lines strictly between the braces
            let body_lines = span.end_line.saturating_sub(span.line).saturating_sub(1) as usize;
            if body_lines > self.max_lines {
                self.findings.push(support::finding(self.unit, name, name.to_string()));
            }
        }
    }

    impl<'ast> Visit<'ast> for LengthVisitor<'_> {
        fn visit_item_fn(&mut self, func: &'ast syn::ItemFn) {
            self.check(&func.sig.ident, &func.block);
            syn::visit::visit_item_fn(self, func);
        }

        fn visit_impl_item_fn(&mut self, func: &'ast syn::ImplItemFn) {
            self.check(&func.sig.ident, &func.block);
            syn::visit::visit_impl_item_fn(self, func);
        }

        fn visit_trait_item_fn(&mut self, func: &'ast syn::TraitItemFn) {
            if let Some(body) = &func.default {
                self.check(&func.sig.ident, body);
            }
            syn::visit::visit_trait_item_fn(self, func);
        }
    }

    let mut visitor = LengthVisitor { unit, max_lines, findings: Vec::new() };
    visitor.visit_file(unit.syntax());
    visitor.findings
}

#[cfg(test)]
mod tests {
    use super::super::testing::{check, check_with};
    use crate::config::RuleSettings;

    #[test]
    fn test_deep_nesting_reported_once_per_function() {
        let source = r#"
fn deep(items: &[Vec<u8>]) {
    for item in items {
        if !item.is_empty() {
            for byte in item {
                match byte {
                    0 => {
                        if true {
                            loop {}
                        }
                    }
                    _ => {}
                }
            }
        }
    }
}
"#;
        let findings = check("deep_nesting", source);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].subject, "deep");
        assert_eq!(findings[0].location.line, 8);
    }

    #[test]
    fn test_else_if_chain_is_flat() {
        let source = r#"
fn classify(n: i32) -> &'static str {
    if n < 0 {
        "negative"
    } else if n == 0 {
        "zero"
    } else if n < 10 {
        "small"
    } else if n < 100 {
        "medium"
    } else if n < 1000 {
        "large"
    } else {
        "huge"
    }
}
"#;
        let settings = RuleSettings { max_nesting_depth: 1, ..Default::default() };
        assert!(check_with(&settings, "deep_nesting", source).is_empty());
    }

    #[test]
    fn test_long_function() {
        let settings = RuleSettings { max_function_lines: 3, ..Default::default() };
        let source = r#"
fn short() {
    let a = 1;
}

fn long() {
    let a = 1;
    let b = 2;
    let c = 3;
    let d = 4;
}
"#;
        let findings = check_with(&settings, "long_function", source);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].subject, "long");
        assert_eq!(findings[0].location.line, 6);
    }

    #[test]
    fn test_trait_default_methods_are_checked() {
        let settings =
            RuleSettings { max_nesting_depth: 1, max_function_lines: 1, ..Default::default() };
        let source = r#"
trait Walk {
    fn required(&self);

    fn walk(&self, items: &[u8]) {
        for item in items {
            if *item > 0 {
                self.required();
            }
        }
    }
}
"#;
        let nesting = check_with(&settings, "deep_nesting", source);
        assert_eq!(nesting.len(), 1);
        assert_eq!(nesting[0].subject, "walk");
        assert_eq!(nesting[0].location.line, 7);

        let long = check_with(&settings, "long_function", source);
        assert_eq!(long.len(), 1);
        assert_eq!(long[0].subject, "walk");
        assert_eq!(long[0].location.line, 5);
    }

    #[test]
    fn test_short_functions_pass_default_limit() {
        assert!(check("long_function", "fn f() {\n    g();\n}\n").is_empty());
    }
}
