//! Ordering discipline: layout of items inside a module

use super::support;
use crate::config::RuleSettings;
use crate::domain::{Discipline, Severity};
use crate::rules::{CheckResult, Finding, Rule};
use crate::source::SourceUnit;
use std::collections::HashMap;

pub fn rules(_settings: &RuleSettings) -> Vec<Rule> {
    vec![
        Rule::new(
            "use_after_items",
            Discipline::Ordering,
            Severity::Warning,
            "`use` declaration after other items",
            |unit: &SourceUnit| -> CheckResult { Ok(per_module(unit, late_uses)) },
        )
        .with_description(
            "Imports belong at the top of a module, after `mod` declarations, so a \
             reader sees dependencies before code.",
        )
        .with_suggestion("Move the `use` to the top of the module"),
        Rule::new(
            "impl_before_type",
            Discipline::Ordering,
            Severity::Info,
            "`impl {subject}` appears before the definition of `{subject}`",
            |unit: &SourceUnit| -> CheckResult { Ok(per_module(unit, early_impls)) },
        )
        .with_description(
            "A type's definition should come before its inherent `impl` block in the \
             same module.",
        ),
    ]
}

/// Apply `check` to the item list of the file and of every inline module
fn per_module(
    unit: &SourceUnit,
    check: fn(&SourceUnit, &[syn::Item], &mut Vec<Finding>),
) -> Vec<Finding> {
    fn walk(
        unit: &SourceUnit,
        items: &[syn::Item],
        check: fn(&SourceUnit, &[syn::Item], &mut Vec<Finding>),
        findings: &mut Vec<Finding>,
    ) {
        check(unit, items, findings);
        for item in items {
            if let syn::Item::Mod(syn::ItemMod { content: Some((_, inner)), .. }) = item {
                walk(unit, inner, check, findings);
            }
        }
    }

    let mut findings = Vec::new();
    walk(unit, &unit.syntax().items, check, &mut findings);
    findings
}

fn late_uses(unit: &SourceUnit, items: &[syn::Item], findings: &mut Vec<Finding>) {
    let mut seen_item = false;

    for item in items {
        match item {
            syn::Item::Use(item_use) => {
                if seen_item {
                    findings.push(support::finding(unit, item_use, ""));
                }
            }
            // `extern crate` and `mod foo;` declarations may precede imports
            syn::Item::ExternCrate(_) => {}
            syn::Item::Mod(module) if module.content.is_none() => {}
            _ => seen_item = true,
        }
    }
}

fn early_impls(unit: &SourceUnit, items: &[syn::Item], findings: &mut Vec<Finding>) {
    let definitions: HashMap<String, usize> = items
        .iter()
        .enumerate()
        .filter_map(|(position, item)| {
            let ident = match item {
                syn::Item::Struct(item) => &item.ident,
                syn::Item::Enum(item) => &item.ident,
                syn::Item::Union(item) => &item.ident,
                _ => return None,
            };
            Some((ident.to_string(), position))
        })
        .collect();

    for (position, item) in items.iter().enumerate() {
        let syn::Item::Impl(item_impl) = item else { continue };
        if item_impl.trait_.is_some() {
            continue;
        }
        let syn::Type::Path(self_ty) = item_impl.self_ty.as_ref() else { continue };
        let Some(ident) = self_ty.path.get_ident() else { continue };

        let name = ident.to_string();
        if definitions.get(&name).map_or(false, |&defined| defined > position) {
            findings.push(support::finding(unit, &item_impl.self_ty, name));
        }
    }
}
