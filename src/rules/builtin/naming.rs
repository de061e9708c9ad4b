//! Naming discipline

use super::support;
use crate::config::RuleSettings;
use crate::domain::{Discipline, InternalRuleError, Severity};
use crate::rules::{Finding, Rule};
use crate::source::SourceUnit;
use syn::ext::IdentExt;
use syn::visit::Visit;

pub fn rules(_settings: &RuleSettings) -> Vec<Rule> {
    vec![
        Rule::new(
            "type_name_camel_case",
            Discipline::Naming,
            Severity::Warning,
            "Type name `{subject}` is not UpperCamelCase",
            type_names,
        )
        .with_description(
            "Structs, enums, unions, traits and type aliases use UpperCamelCase. \
             Acronyms count as one word: `Uuid`, not `UUID`.",
        ),
        Rule::new(
            "fn_name_snake_case",
            Discipline::Naming,
            Severity::Warning,
            "Function name `{subject}` is not snake_case",
            fn_names,
        )
        .with_description("Functions and methods use snake_case."),
        Rule::new(
            "const_name_screaming_case",
            Discipline::Naming,
            Severity::Warning,
            "Constant `{subject}` is not SCREAMING_SNAKE_CASE",
            const_names,
        )
        .with_description("Constants and statics use SCREAMING_SNAKE_CASE."),
        Rule::new(
            "getter_get_prefix",
            Discipline::Naming,
            Severity::Info,
            "Getter `{subject}` uses a `get_` prefix",
            get_prefixed_getters,
        )
        .with_description(
            "Getters are named after the field they expose: `fn name(&self)` rather than \
             `fn get_name(&self)`. `get` alone is fine for indexed lookups.",
        )
        .with_suggestion("Drop the `get_` prefix"),
    ]
}

struct NameVisitor<'u> {
    unit: &'u SourceUnit,
    accept: fn(&str) -> bool,
    /// Spelling of a rejected name in the expected case
    convert: fn(&str) -> String,
    findings: Vec<Finding>,
}

impl<'u> NameVisitor<'u> {
    fn new(unit: &'u SourceUnit, accept: fn(&str) -> bool, convert: fn(&str) -> String) -> Self {
        Self { unit, accept, convert, findings: Vec::new() }
    }

    fn check(&mut self, ident: &syn::Ident) {
        let name = ident.unraw().to_string();
        if !(self.accept)(&name) {
            let suggestion = format!("Rename to `{}`", (self.convert)(&name));
            let finding = support::finding(self.unit, ident, name).with_suggestion(suggestion);
            self.findings.push(finding);
        }
    }
}

fn type_names(unit: &SourceUnit) -> Result<Vec<Finding>, InternalRuleError> {
    struct TypeVisitor<'u>(NameVisitor<'u>);

    impl<'ast> Visit<'ast> for TypeVisitor<'_> {
        fn visit_item_struct(&mut self, item: &'ast syn::ItemStruct) {
            self.0.check(&item.ident);
            syn::visit::visit_item_struct(self, item);
        }

        fn visit_item_enum(&mut self, item: &'ast syn::ItemEnum) {
            self.0.check(&item.ident);
            syn::visit::visit_item_enum(self, item);
        }

        fn visit_item_union(&mut self, item: &'ast syn::ItemUnion) {
            self.0.check(&item.ident);
            syn::visit::visit_item_union(self, item);
        }

        fn visit_item_trait(&mut self, item: &'ast syn::ItemTrait) {
            self.0.check(&item.ident);
            syn::visit::visit_item_trait(self, item);
        }

        fn visit_item_type(&mut self, item: &'ast syn::ItemType) {
            self.0.check(&item.ident);
            syn::visit::visit_item_type(self, item);
        }
    }

    let names = NameVisitor::new(unit, support::is_camel_case, support::to_camel_case);
    let mut visitor = TypeVisitor(names);
    visitor.visit_file(unit.syntax());
    Ok(visitor.0.findings)
}

fn fn_names(unit: &SourceUnit) -> Result<Vec<Finding>, InternalRuleError> {
    struct FnVisitor<'u>(NameVisitor<'u>);

    fn exported(attrs: &[syn::Attribute]) -> bool {
        attrs
            .iter()
            .any(|attr| attr.path().is_ident("no_mangle") || attr.path().is_ident("export_name"))
    }

    impl<'ast> Visit<'ast> for FnVisitor<'_> {
        fn visit_item_fn(&mut self, func: &'ast syn::ItemFn) {
            if !exported(&func.attrs) {
                self.0.check(&func.sig.ident);
            }
            syn::visit::visit_item_fn(self, func);
        }

        fn visit_impl_item_fn(&mut self, func: &'ast syn::ImplItemFn) {
            self.0.check(&func.sig.ident);
            syn::visit::visit_impl_item_fn(self, func);
        }

        fn visit_trait_item_fn(&mut self, func: &'ast syn::TraitItemFn) {
            self.0.check(&func.sig.ident);
            syn::visit::visit_trait_item_fn(self, func);
        }
    }

    let names = NameVisitor::new(unit, support::is_snake_case, support::to_snake_case);
    let mut visitor = FnVisitor(names);
    visitor.visit_file(unit.syntax());
    Ok(visitor.0.findings)
}

fn const_names(unit: &SourceUnit) -> Result<Vec<Finding>, InternalRuleError> {
    struct ConstVisitor<'u>(NameVisitor<'u>);

    impl<'ast> Visit<'ast> for ConstVisitor<'_> {
        fn visit_item_const(&mut self, item: &'ast syn::ItemConst) {
            self.0.check(&item.ident);
            syn::visit::visit_item_const(self, item);
        }

        fn visit_item_static(&mut self, item: &'ast syn::ItemStatic) {
            self.0.check(&item.ident);
            syn::visit::visit_item_static(self, item);
        }

        fn visit_impl_item_const(&mut self, item: &'ast syn::ImplItemConst) {
            self.0.check(&item.ident);
            syn::visit::visit_impl_item_const(self, item);
        }

        fn visit_trait_item_const(&mut self, item: &'ast syn::TraitItemConst) {
            self.0.check(&item.ident);
            syn::visit::visit_trait_item_const(self, item);
        }
    }

    let names = NameVisitor::new(unit, support::is_screaming_case, support::to_screaming_case);
    let mut visitor = ConstVisitor(names);
    visitor.visit_file(unit.syntax());
    Ok(visitor.0.findings)
}

fn get_prefixed_getters(unit: &SourceUnit) -> Result<Vec<Finding>, InternalRuleError> {
    struct GetterVisitor<'u> {
        unit: &'u SourceUnit,
        findings: Vec<Finding>,
    }

    impl GetterVisitor<'_> {
        fn check(&mut self, sig: &syn::Signature) {
            let name = sig.ident.unraw().to_string();
            let by_ref_self = matches!(
                sig.inputs.first(),
                Some(syn::FnArg::Receiver(receiver)) if receiver.reference.is_some()
            );

            if name.len() > "get_".len()
                && name.starts_with("get_")
                && by_ref_self
                && sig.inputs.len() == 1
                && !matches!(sig.output, syn::ReturnType::Default)
            {
                self.findings.push(support::finding(self.unit, &sig.ident, name));
            }
        }
    }

    impl<'ast> Visit<'ast> for GetterVisitor<'_> {
        fn visit_impl_item_fn(&mut self, func: &'ast syn::ImplItemFn) {
            self.check(&func.sig);
            syn::visit::visit_impl_item_fn(self, func);
        }

        fn visit_trait_item_fn(&mut self, func: &'ast syn::TraitItemFn) {
            self.check(&func.sig);
            syn::visit::visit_trait_item_fn(self, func);
        }
    }

    let mut visitor = GetterVisitor { unit, findings: Vec::new() };
    visitor.visit_file(unit.syntax());
    Ok(visitor.findings)
}
