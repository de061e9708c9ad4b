//! Code discipline: expression-level idioms

use super::support;
use crate::config::RuleSettings;
use crate::domain::{Discipline, InternalRuleError, Severity};
use crate::rules::{Finding, Rule};
use crate::source::SourceUnit;
use syn::visit::Visit;

pub fn rules(_settings: &RuleSettings) -> Vec<Rule> {
    vec![
        Rule::new(
            "needless_return",
            Discipline::Code,
            Severity::Warning,
            "Needless `return` at the end of `{subject}`",
            needless_returns,
        )
        .with_description(
            "The last expression of a block is its value. An explicit `return` in tail \
             position is noise; keep `return` for early exits.",
        )
        .with_suggestion("Drop `return` and the trailing semicolon"),
        Rule::new(
            "collect_then_len",
            Discipline::Code,
            Severity::Warning,
            "Collecting only to call `.len()`",
            collect_then_len,
        )
        .with_description(
            "`.collect::<Vec<_>>().len()` allocates a collection just to count it. \
             `.count()` consumes the iterator without allocating.",
        )
        .with_suggestion("Use `.count()`"),
    ]
}

fn needless_returns(unit: &SourceUnit) -> Result<Vec<Finding>, InternalRuleError> {
    struct ReturnVisitor<'u> {
        unit: &'u SourceUnit,
        findings: Vec<Finding>,
    }

    impl ReturnVisitor<'_> {
        fn check_body(&mut self, name: &syn::Ident, body: &syn::Block) {
            if let Some(syn::Stmt::Expr(syn::Expr::Return(ret), _)) = body.stmts.last() {
                self.findings.push(support::finding(self.unit, ret, name.to_string()));
            }
        }
    }

    impl<'ast> Visit<'ast> for ReturnVisitor<'_> {
        fn visit_item_fn(&mut self, func: &'ast syn::ItemFn) {
            self.check_body(&func.sig.ident, &func.block);
            syn::visit::visit_item_fn(self, func);
        }

        fn visit_impl_item_fn(&mut self, func: &'ast syn::ImplItemFn) {
            self.check_body(&func.sig.ident, &func.block);
            syn::visit::visit_impl_item_fn(self, func);
        }

        fn visit_trait_item_fn(&mut self, func: &'ast syn::TraitItemFn) {
            if let Some(block) = &func.default {
                self.check_body(&func.sig.ident, block);
            }
            syn::visit::visit_trait_item_fn(self, func);
        }
    }

    let mut visitor = ReturnVisitor { unit, findings: Vec::new() };
    visitor.visit_file(unit.syntax());
    Ok(visitor.findings)
}

fn collect_then_len(unit: &SourceUnit) -> Result<Vec<Finding>, InternalRuleError> {
    struct CollectVisitor<'u> {
        unit: &'u SourceUnit,
        findings: Vec<Finding>,
    }

    impl<'ast> Visit<'ast> for CollectVisitor<'_> {
        fn visit_expr_method_call(&mut self, call: &'ast syn::ExprMethodCall) {
            if call.method == "len" && call.args.is_empty() {
                if let syn::Expr::MethodCall(inner) = call.receiver.as_ref() {
                    if inner.method == "collect" && inner.args.is_empty() {
                        self.findings.push(support::finding(self.unit, &inner.method, "collect"));
                    }
                }
            }
            syn::visit::visit_expr_method_call(self, call);
        }
    }

    let mut visitor = CollectVisitor { unit, findings: Vec::new() };
    visitor.visit_file(unit.syntax());
    Ok(visitor.findings)
}

#[cfg(test)]
mod tests {
    use super::super::testing::check;

    #[test]
    fn test_needless_return() {
        let source = r#"
fn add(a: u8, b: u8) -> u8 {
    return a + b;
}

struct S;
impl S {
    fn unit(&self) {
        return;
    }
}
"#;
        let findings = check("needless_return", source);
        let subjects: Vec<_> = findings.iter().map(|f| f.subject.as_str()).collect();

        assert_eq!(subjects, vec!["add", "unit"]);
        assert_eq!(findings[0].location.line, 3);
    }

    #[test]
    fn test_early_return_is_fine() {
        let source = r#"
fn first(v: &[u8]) -> Option<u8> {
    if v.is_empty() {
        return None;
    }
    Some(v[0])
}
"#;
        assert!(check("needless_return", source).is_empty());
    }

    #[test]
    fn test_collect_then_len() {
        let source = "fn f(v: &[u8]) -> usize {\n    v.iter().filter(|x| **x > 1).collect::<Vec<_>>().len()\n}\n";
        let findings = check("collect_then_len", source);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].location.line, 2);
    }

    #[test]
    fn test_count_is_fine() {
        let source = "fn f(v: &[u8]) -> usize { let all: Vec<_> = v.to_vec(); all.len() + v.iter().count() }";
        assert!(check("collect_then_len", source).is_empty());
    }
}
