//! Function discipline: signatures that stay readable at the call site

use super::support;
use crate::config::RuleSettings;
use crate::domain::{Discipline, Severity};
use crate::rules::{CheckResult, Finding, Rule};
use crate::source::SourceUnit;
use syn::visit::Visit;

pub fn rules(settings: &RuleSettings) -> Vec<Rule> {
    let skip_tests = settings.skip_tests;
    let max_args = settings.max_function_args;

    vec![
        Rule::new(
            "too_many_arguments",
            Discipline::Function,
            Severity::Warning,
            format!("Function `{{subject}}` takes more than {max_args} arguments"),
            move |unit: &SourceUnit| -> CheckResult {
                Ok(support::outside_tests(unit, too_many_arguments(unit, max_args), skip_tests))
            },
        )
        .with_description(
            "Long parameter lists are easy to call in the wrong order. Group related \
             parameters into a struct or use a builder.",
        )
        .with_suggestion("Group parameters into a struct"),
        Rule::new(
            "bool_parameter",
            Discipline::Function,
            Severity::Info,
            "Public function takes a `bool` parameter `{subject}`",
            move |unit: &SourceUnit| -> CheckResult {
                Ok(support::outside_tests(unit, bool_parameters(unit), skip_tests))
            },
        )
        .with_description(
            "`render(true)` says nothing at the call site. A two-variant enum names \
             the choice.",
        )
        .with_suggestion("Replace the flag with an enum"),
    ]
}

/// Calls `check` with the visibility and signature of every function.
///
/// Trait methods take the visibility of their trait.
struct SignatureWalker<'ast, F> {
    check: F,
    trait_vis: Option<&'ast syn::Visibility>,
}

impl<'ast, F> SignatureWalker<'ast, F>
where
    F: FnMut(&'ast syn::Visibility, &'ast syn::Signature),
{
    fn new(check: F) -> Self {
        Self { check, trait_vis: None }
    }
}

impl<'ast, F> Visit<'ast> for SignatureWalker<'ast, F>
where
    F: FnMut(&'ast syn::Visibility, &'ast syn::Signature),
{
    fn visit_item_fn(&mut self, func: &'ast syn::ItemFn) {
        (self.check)(&func.vis, &func.sig);
        syn::visit::visit_item_fn(self, func);
    }

    fn visit_impl_item_fn(&mut self, func: &'ast syn::ImplItemFn) {
        (self.check)(&func.vis, &func.sig);
        syn::visit::visit_impl_item_fn(self, func);
    }

    fn visit_item_trait(&mut self, item: &'ast syn::ItemTrait) {
        let outer = self.trait_vis.replace(&item.vis);
        syn::visit::visit_item_trait(self, item);
        self.trait_vis = outer;
    }

    fn visit_trait_item_fn(&mut self, func: &'ast syn::TraitItemFn) {
        if let Some(vis) = self.trait_vis {
            (self.check)(vis, &func.sig);
        }
        syn::visit::visit_trait_item_fn(self, func);
    }
}

fn too_many_arguments(unit: &SourceUnit, max_args: usize) -> Vec<Finding> {
    let mut findings = Vec::new();
    let mut walker = SignatureWalker::new(|_: &syn::Visibility, sig: &syn::Signature| {
        if sig.inputs.len() > max_args {
            findings.push(support::finding(unit, &sig.ident, sig.ident.to_string()));
        }
    });
    walker.visit_file(unit.syntax());
    findings
}

fn bool_parameters(unit: &SourceUnit) -> Vec<Finding> {
    let mut findings = Vec::new();
    let mut walker = SignatureWalker::new(|vis: &syn::Visibility, sig: &syn::Signature| {
        if !support::is_public(vis) {
            return;
        }
        for param in support::typed_params(sig) {
            if matches!(param.ty.as_ref(), syn::Type::Path(path) if path.path.is_ident("bool")) {
                let name = quote::ToTokens::to_token_stream(&param.pat).to_string();
                findings.push(support::finding(unit, param, name));
            }
        }
    });
    walker.visit_file(unit.syntax());
    findings
}

#[cfg(test)]
mod tests {
    use super::super::testing::{check, check_with};
    use crate::config::RuleSettings;

    #[test]
    fn test_too_many_arguments() {
        let source = r#"
fn wide(a: u8, b: u8, c: u8, d: u8, e: u8, f: u8) {}
fn narrow(a: u8, b: u8) {}
struct S;
impl S {
    fn method(&self, a: u8, b: u8, c: u8, d: u8, e: u8) {}
}
"#;
        let findings = check("too_many_arguments", source);
        let subjects: Vec<_> = findings.iter().map(|f| f.subject.as_str()).collect();
        assert_eq!(subjects, vec!["wide", "method"]);
    }

    #[test]
    fn test_argument_limit_is_configurable() {
        let settings = RuleSettings { max_function_args: 2, ..Default::default() };
        let source = "fn three(a: u8, b: u8, c: u8) {}\nfn two(a: u8, b: u8) {}\n";
        let findings = check_with(&settings, "too_many_arguments", source);

        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].subject, "three");
    }

    #[test]
    fn test_bool_parameter() {
        let source = r#"
pub fn render(verbose: bool, width: usize) {}
fn private(flag: bool) {}
pub struct View;
impl View {
    pub fn show(&self, animated: bool) {}
}
"#;
        let findings = check("bool_parameter", source);
        let subjects: Vec<_> = findings.iter().map(|f| f.subject.as_str()).collect();

        assert_eq!(subjects, vec!["verbose", "animated"]);
        assert_eq!(findings[0].location.line, 2);
    }

    #[test]
    fn test_trait_methods_are_checked() {
        let source = r#"
pub trait Store {
    fn put(&mut self, a: u8, b: u8, c: u8, d: u8, e: u8);
    fn flush(&mut self, sync: bool) {}
}
trait Hidden {
    fn toggle(&self, on: bool);
}
"#;
        let wide = check("too_many_arguments", source);
        assert_eq!(wide.len(), 1);
        assert_eq!(wide[0].subject, "put");
        assert_eq!(wide[0].location.line, 3);

        let flags = check("bool_parameter", source);
        let subjects: Vec<_> = flags.iter().map(|f| f.subject.as_str()).collect();
        assert_eq!(subjects, vec!["sync"]);
    }

    #[test]
    fn test_bool_parameter_skips_tests() {
        let source = "#[cfg(test)]\nmod tests {\n    pub fn helper(flag: bool) {}\n}\n";
        assert!(check("bool_parameter", source).is_empty());
    }
}
