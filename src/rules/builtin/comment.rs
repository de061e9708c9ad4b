//! Comment discipline

use super::support;
use crate::config::RuleSettings;
use crate::domain::{Discipline, Location, Severity};
use crate::rules::{CheckResult, Finding, Rule};
use crate::source::SourceUnit;
use lazy_static::lazy_static;
use regex::Regex;
use syn::visit::Visit;

lazy_static! {
    static ref TODO_MARKER: Regex =
        Regex::new(r"\b(TODO|FIXME|XXX)\b").expect("todo marker pattern is valid");
    /// `#123`, `GH-42`, `PROJ-7` or a URL
    static ref ISSUE_REFERENCE: Regex =
        Regex::new(r"#\d+|\b[A-Z][A-Z0-9]+-\d+\b|https?://").expect("issue pattern is valid");
}

pub fn rules(_settings: &RuleSettings) -> Vec<Rule> {
    vec![
        Rule::new(
            "todo_without_reference",
            Discipline::Comment,
            Severity::Info,
            "`{subject}` comment without an issue reference",
            |unit: &SourceUnit| -> CheckResult { Ok(unreferenced_todos(unit)) },
        )
        .with_description(
            "A TODO nobody tracks is never done. Link it to an issue (`TODO(#123)`) \
             or a URL.",
        )
        .with_suggestion("Reference an issue, e.g. `TODO(#123): ...`"),
        Rule::new(
            "missing_pub_doc",
            Discipline::Comment,
            Severity::Info,
            "Public item `{subject}` is not documented",
            |unit: &SourceUnit| -> CheckResult { Ok(undocumented_public_items(unit)) },
        )
        .with_description(
            "Every public item carries a doc comment stating what it is for; rustdoc \
             output is the first thing users of a crate read.",
        ),
    ]
}

fn unreferenced_todos(unit: &SourceUnit) -> Vec<Finding> {
    unit.comments()
        .iter()
        .filter_map(|comment| {
            let marker = TODO_MARKER.find(&comment.text)?;
            if ISSUE_REFERENCE.is_match(&comment.text) {
                return None;
            }
            // Point at the marker when it sits on the comment's first line
            let location = if comment.text[..marker.start()].contains('\n') {
                comment.location
            } else {
                let prefix = if comment.is_doc { 3 } else { 2 };
                let offset = comment.text[..marker.start()].chars().count() as u32 + prefix;
                let column = comment.location.column + offset;
                Location::point(comment.location.line, column)
            };
            Some(Finding::new(location, marker.as_str()))
        })
        .collect()
}

fn undocumented_public_items(unit: &SourceUnit) -> Vec<Finding> {
    struct PublicDocsVisitor<'u> {
        unit: &'u SourceUnit,
        findings: Vec<Finding>,
    }

    impl PublicDocsVisitor<'_> {
        fn check(
            &mut self,
            attrs: &[syn::Attribute],
            vis: &syn::Visibility,
            kind: &str,
            ident: &syn::Ident,
        ) {
            if support::is_public(vis) && !support::has_doc(attrs) {
                self.findings.push(support::finding(self.unit, ident, format!("{kind} {ident}")));
            }
        }
    }

    impl<'ast> Visit<'ast> for PublicDocsVisitor<'_> {
        fn visit_item_fn(&mut self, item: &'ast syn::ItemFn) {
            self.check(&item.attrs, &item.vis, "fn", &item.sig.ident);
            syn::visit::visit_item_fn(self, item);
        }

        fn visit_item_struct(&mut self, item: &'ast syn::ItemStruct) {
            self.check(&item.attrs, &item.vis, "struct", &item.ident);
            syn::visit::visit_item_struct(self, item);
        }

        fn visit_item_enum(&mut self, item: &'ast syn::ItemEnum) {
            self.check(&item.attrs, &item.vis, "enum", &item.ident);
            syn::visit::visit_item_enum(self, item);
        }

        fn visit_item_trait(&mut self, item: &'ast syn::ItemTrait) {
            self.check(&item.attrs, &item.vis, "trait", &item.ident);
            syn::visit::visit_item_trait(self, item);
        }

        fn visit_item_type(&mut self, item: &'ast syn::ItemType) {
            self.check(&item.attrs, &item.vis, "type", &item.ident);
            syn::visit::visit_item_type(self, item);
        }

        fn visit_item_const(&mut self, item: &'ast syn::ItemConst) {
            self.check(&item.attrs, &item.vis, "const", &item.ident);
            syn::visit::visit_item_const(self, item);
        }

        fn visit_item_static(&mut self, item: &'ast syn::ItemStatic) {
            self.check(&item.attrs, &item.vis, "static", &item.ident);
            syn::visit::visit_item_static(self, item);
        }

        fn visit_item_mod(&mut self, item: &'ast syn::ItemMod) {
            // `pub mod foo;` is documented with `//!` inside its own file
            if item.content.is_some() {
                self.check(&item.attrs, &item.vis, "mod", &item.ident);
            }
            syn::visit::visit_item_mod(self, item);
        }

        fn visit_item_impl(&mut self, item: &'ast syn::ItemImpl) {
            // Methods of trait impls inherit the trait's docs
            if item.trait_.is_none() {
                syn::visit::visit_item_impl(self, item);
            }
        }

        fn visit_impl_item_fn(&mut self, item: &'ast syn::ImplItemFn) {
            self.check(&item.attrs, &item.vis, "fn", &item.sig.ident);
            syn::visit::visit_impl_item_fn(self, item);
        }
    }

    let mut visitor = PublicDocsVisitor { unit, findings: Vec::new() };
    visitor.visit_file(unit.syntax());
    visitor.findings
}
