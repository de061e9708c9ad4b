//! Error-handling discipline: propagate, don't panic

use super::support;
use crate::config::RuleSettings;
use crate::domain::{Discipline, Severity};
use crate::rules::{CheckResult, Finding, Rule};
use crate::source::SourceUnit;
use syn::visit::Visit;

const PANICKING_MACROS: [&str; 4] = ["panic", "unreachable", "todo", "unimplemented"];

pub fn rules(settings: &RuleSettings) -> Vec<Rule> {
    let skip_tests = settings.skip_tests;

    vec![
        Rule::new(
            "unwrap_call",
            Discipline::ErrorHandling,
            Severity::Warning,
            "Call to `.unwrap()`",
            move |unit: &SourceUnit| -> CheckResult {
                Ok(support::outside_tests(unit, unwrap_calls(unit), skip_tests))
            },
        )
        .with_description(
            "`.unwrap()` turns a recoverable error into a panic without saying why. \
             Propagate with `?`, or use `.expect()` with a message stating the invariant.",
        )
        .with_suggestion("Propagate the error with `?`"),
        Rule::new(
            "panic_in_result_fn",
            Discipline::ErrorHandling,
            Severity::Warning,
            "`{subject}!` in a function that returns `Result`",
            move |unit: &SourceUnit| -> CheckResult {
                Ok(support::outside_tests(unit, panics_in_result_fns(unit), skip_tests))
            },
        )
        .with_description(
            "A function that already returns `Result` has a channel for failure. \
             Panicking there bypasses the caller's error handling.",
        )
        .with_suggestion("Return an error instead"),
        Rule::new(
            "boxed_dyn_error",
            Discipline::ErrorHandling,
            Severity::Info,
            "Public function `{subject}` exposes `Box<dyn Error>`",
            move |unit: &SourceUnit| -> CheckResult {
                Ok(support::outside_tests(unit, boxed_dyn_errors(unit), skip_tests))
            },
        )
        .with_description(
            "Libraries should give callers a concrete error type they can match on. \
             `Box<dyn Error>` is fine in binaries and tests, not in public APIs.",
        )
        .with_suggestion("Define an error enum (for example with `thiserror`)"),
    ]
}

fn unwrap_calls(unit: &SourceUnit) -> Vec<Finding> {
    struct UnwrapVisitor<'u> {
        unit: &'u SourceUnit,
        findings: Vec<Finding>,
    }

    impl<'ast> Visit<'ast> for UnwrapVisitor<'_> {
        fn visit_expr_method_call(&mut self, call: &'ast syn::ExprMethodCall) {
            if call.method == "unwrap" && call.args.is_empty() {
                self.findings.push(support::finding(self.unit, &call.method, "unwrap"));
            }
            syn::visit::visit_expr_method_call(self, call);
        }
    }

    let mut visitor = UnwrapVisitor { unit, findings: Vec::new() };
    visitor.visit_file(unit.syntax());
    visitor.findings
}

fn panics_in_result_fns(unit: &SourceUnit) -> Vec<Finding> {
    struct PanicVisitor<'u> {
        unit: &'u SourceUnit,
        /// Whether each enclosing function returns `Result`; closures push `false`
        scopes: Vec<bool>,
        findings: Vec<Finding>,
    }

    impl<'ast> Visit<'ast> for PanicVisitor<'_> {
        fn visit_item_fn(&mut self, func: &'ast syn::ItemFn) {
            self.scopes.push(support::returns_result(&func.sig));
            syn::visit::visit_item_fn(self, func);
            self.scopes.pop();
        }

        fn visit_impl_item_fn(&mut self, func: &'ast syn::ImplItemFn) {
            self.scopes.push(support::returns_result(&func.sig));
            syn::visit::visit_impl_item_fn(self, func);
            self.scopes.pop();
        }

        fn visit_trait_item_fn(&mut self, func: &'ast syn::TraitItemFn) {
            self.scopes.push(support::returns_result(&func.sig));
            syn::visit::visit_trait_item_fn(self, func);
            self.scopes.pop();
        }

        fn visit_expr_closure(&mut self, closure: &'ast syn::ExprClosure) {
            self.scopes.push(false);
            syn::visit::visit_expr_closure(self, closure);
            self.scopes.pop();
        }

        fn visit_macro(&mut self, mac: &'ast syn::Macro) {
            if self.scopes.last().copied().unwrap_or(false) {
                if let Some(segment) = mac.path.segments.last() {
                    let name = segment.ident.to_string();
                    if PANICKING_MACROS.contains(&name.as_str()) {
                        self.findings.push(support::finding(self.unit, &mac.path, name));
                    }
                }
            }
            syn::visit::visit_macro(self, mac);
        }
    }

    let mut visitor = PanicVisitor { unit, scopes: Vec::new(), findings: Vec::new() };
    visitor.visit_file(unit.syntax());
    visitor.findings
}

fn boxed_dyn_errors(unit: &SourceUnit) -> Vec<Finding> {
    struct BoxedErrorSearch {
        found: bool,
    }

    impl<'ast> Visit<'ast> for BoxedErrorSearch {
        fn visit_type_path(&mut self, ty: &'ast syn::TypePath) {
            if let Some(segment) = ty.path.segments.last() {
                if segment.ident == "Box" {
                    if let syn::PathArguments::AngleBracketed(args) = &segment.arguments {
                        self.found |= args.args.iter().any(is_dyn_error);
                    }
                }
            }
            syn::visit::visit_type_path(self, ty);
        }
    }

    fn is_dyn_error(arg: &syn::GenericArgument) -> bool {
        let syn::GenericArgument::Type(syn::Type::TraitObject(object)) = arg else {
            return false;
        };
        object.bounds.iter().any(|bound| match bound {
            syn::TypeParamBound::Trait(trait_bound) => trait_bound
                .path
                .segments
                .last()
                .map_or(false, |segment| segment.ident == "Error"),
            _ => false,
        })
    }

    struct SignatureVisitor<'u> {
        unit: &'u SourceUnit,
        findings: Vec<Finding>,
    }

    impl SignatureVisitor<'_> {
        fn check(&mut self, vis: &syn::Visibility, sig: &syn::Signature) {
            if !support::is_public(vis) {
                return;
            }
            let mut search = BoxedErrorSearch { found: false };
            search.visit_signature(sig);
            if search.found {
                self.findings.push(support::finding(self.unit, &sig.ident, sig.ident.to_string()));
            }
        }
    }

    impl<'ast> Visit<'ast> for SignatureVisitor<'_> {
        fn visit_item_fn(&mut self, func: &'ast syn::ItemFn) {
            self.check(&func.vis, &func.sig);
            syn::visit::visit_item_fn(self, func);
        }

        fn visit_impl_item_fn(&mut self, func: &'ast syn::ImplItemFn) {
            self.check(&func.vis, &func.sig);
            syn::visit::visit_impl_item_fn(self, func);
        }
    }

    let mut visitor = SignatureVisitor { unit, findings: Vec::new() };
    visitor.visit_file(unit.syntax());
    visitor.findings
}
