//! Unsafe discipline: every `unsafe` states why it is sound

use super::support;
use crate::config::RuleSettings;
use crate::domain::{Discipline, Severity};
use crate::rules::{CheckResult, Finding, Rule};
use crate::source::{CommentKind, SourceUnit};
use syn::visit::Visit;

const SAFETY_MARKER: &str = "SAFETY:";

pub fn rules(_settings: &RuleSettings) -> Vec<Rule> {
    vec![
        Rule::new(
            "undocumented_unsafe_block",
            Discipline::Unsafe,
            Severity::Error,
            "`unsafe {subject}` without a `// SAFETY:` comment",
            |unit: &SourceUnit| -> CheckResult { Ok(undocumented_unsafe(unit)) },
        )
        .with_description(
            "Each `unsafe` block and `unsafe impl` is preceded by a `// SAFETY:` comment \
             explaining why the invariants the compiler cannot check hold here.",
        )
        .with_suggestion("Add a `// SAFETY:` comment directly above"),
        Rule::new(
            "unsafe_fn_missing_safety_doc",
            Discipline::Unsafe,
            Severity::Warning,
            "Public `unsafe fn {subject}` has no `# Safety` section",
            |unit: &SourceUnit| -> CheckResult { Ok(unsafe_fns_without_safety_doc(unit)) },
        )
        .with_description(
            "Callers of a public `unsafe fn` need to know the contract they must \
             uphold. Document it under a `# Safety` heading.",
        ),
    ]
}

/// A `SAFETY:` comment on `line`, or in the run of comment and attribute
/// lines directly above it
fn has_safety_comment(unit: &SourceUnit, line: u32) -> bool {
    let mut current = line;
    loop {
        let marked = unit
            .comments()
            .iter()
            .any(|c| c.location.end_line == current && c.text.contains(SAFETY_MARKER));
        if marked {
            return true;
        }
        if current <= 1 {
            return false;
        }

        current -= 1;
        let above = unit.line(current).unwrap_or_default().trim_start();
        let continues = above.starts_with("//")
            || above.starts_with("#[")
            || in_block_comment(unit, current);
        if !continues {
            return false;
        }
    }
}

/// Whether a `/* */` comment spans `line`
fn in_block_comment(unit: &SourceUnit, line: u32) -> bool {
    unit.comments_between(1, line)
        .any(|c| c.kind == CommentKind::Block && c.location.end_line >= line)
}

fn undocumented_unsafe(unit: &SourceUnit) -> Vec<Finding> {
    struct UnsafeVisitor<'u> {
        unit: &'u SourceUnit,
        findings: Vec<Finding>,
    }

    impl UnsafeVisitor<'_> {
        fn check(&mut self, token: &syn::token::Unsafe, what: &str) {
            let finding = support::finding(self.unit, token, what);
            if !has_safety_comment(self.unit, finding.location.line) {
                self.findings.push(finding);
            }
        }
    }

    impl<'ast> Visit<'ast> for UnsafeVisitor<'_> {
        fn visit_expr_unsafe(&mut self, expr: &'ast syn::ExprUnsafe) {
            self.check(&expr.unsafe_token, "block");
            syn::visit::visit_expr_unsafe(self, expr);
        }

        fn visit_item_impl(&mut self, item: &'ast syn::ItemImpl) {
            if let Some(token) = &item.unsafety {
                self.check(token, "impl");
            }
            syn::visit::visit_item_impl(self, item);
        }
    }

    let mut visitor = UnsafeVisitor { unit, findings: Vec::new() };
    visitor.visit_file(unit.syntax());
    visitor.findings
}

fn unsafe_fns_without_safety_doc(unit: &SourceUnit) -> Vec<Finding> {
    struct SafetyDocVisitor<'u> {
        unit: &'u SourceUnit,
        findings: Vec<Finding>,
    }

    impl SafetyDocVisitor<'_> {
        fn check(&mut self, attrs: &[syn::Attribute], vis: &syn::Visibility, sig: &syn::Signature) {
            if sig.unsafety.is_some()
                && support::is_public(vis)
                && !support::doc_text(attrs).contains("# Safety")
            {
                self.findings.push(support::finding(self.unit, &sig.ident, sig.ident.to_string()));
            }
        }
    }

    impl<'ast> Visit<'ast> for SafetyDocVisitor<'_> {
        fn visit_item_fn(&mut self, func: &'ast syn::ItemFn) {
            self.check(&func.attrs, &func.vis, &func.sig);
            syn::visit::visit_item_fn(self, func);
        }

        fn visit_impl_item_fn(&mut self, func: &'ast syn::ImplItemFn) {
            self.check(&func.attrs, &func.vis, &func.sig);
            syn::visit::visit_impl_item_fn(self, func);
        }
    }

    let mut visitor = SafetyDocVisitor { unit, findings: Vec::new() };
    visitor.visit_file(unit.syntax());
    visitor.findings
}
