//! Import discipline: what `use` declarations bring into scope

use super::support;
use crate::config::RuleSettings;
use crate::domain::{Discipline, InternalRuleError, Severity};
use crate::rules::{Finding, Rule};
use crate::source::SourceUnit;
use syn::visit::Visit;

pub fn rules(_settings: &RuleSettings) -> Vec<Rule> {
    vec![
        Rule::new(
            "glob_import",
            Discipline::Import,
            Severity::Warning,
            "Glob import of `{subject}::*`",
            glob_imports,
        )
        .with_description(
            "Glob imports hide where names come from and can silently change meaning \
             when the source module grows. Preludes and `use super::*` inside a test \
             module are accepted.",
        )
        .with_suggestion("Import the names you use explicitly"),
        Rule::new(
            "enum_variant_import",
            Discipline::Import,
            Severity::Info,
            "Enum variant `{subject}` imported directly",
            enum_variant_imports,
        )
        .with_description(
            "Importing variants lets `Less` read like a local binding. Refer to them \
             through their enum (`Ordering::Less`) so patterns stay unambiguous.",
        ),
    ]
}

/// Every leaf of a use tree with the path leading to it
fn walk_use_tree<'a>(
    tree: &'a syn::UseTree,
    prefix: &mut Vec<String>,
    visit: &mut dyn FnMut(&[String], &'a syn::UseTree),
) {
    match tree {
        syn::UseTree::Path(path) => {
            prefix.push(path.ident.to_string());
            walk_use_tree(&path.tree, prefix, visit);
            prefix.pop();
        }
        syn::UseTree::Group(group) => {
            for item in &group.items {
                walk_use_tree(item, prefix, visit);
            }
        }
        leaf => visit(prefix, leaf),
    }
}

fn glob_imports(unit: &SourceUnit) -> Result<Vec<Finding>, InternalRuleError> {
    struct GlobVisitor<'u> {
        unit: &'u SourceUnit,
        in_test_module: bool,
        findings: Vec<Finding>,
    }

    impl<'ast> Visit<'ast> for GlobVisitor<'_> {
        fn visit_item_mod(&mut self, module: &'ast syn::ItemMod) {
            let outer = self.in_test_module;
            self.in_test_module |= support::is_test_attrs(&module.attrs);
            syn::visit::visit_item_mod(self, module);
            self.in_test_module = outer;
        }

        fn visit_item_use(&mut self, item: &'ast syn::ItemUse) {
            let mut globs = Vec::new();
            walk_use_tree(&item.tree, &mut Vec::new(), &mut |path, leaf| {
                if let syn::UseTree::Glob(glob) = leaf {
                    globs.push((path.join("::"), glob.star_token));
                }
            });

            for (path, star) in globs {
                let prelude = path.rsplit("::").next() == Some("prelude");
                let test_super = self.in_test_module && path == "super";
                if !prelude && !test_super {
                    self.findings.push(support::finding(self.unit, &star, path));
                }
            }
        }
    }

    let mut visitor = GlobVisitor { unit, in_test_module: false, findings: Vec::new() };
    visitor.visit_file(unit.syntax());
    Ok(visitor.findings)
}

fn enum_variant_imports(unit: &SourceUnit) -> Result<Vec<Finding>, InternalRuleError> {
    struct VariantVisitor<'u> {
        unit: &'u SourceUnit,
        findings: Vec<Finding>,
    }

    impl<'ast> Visit<'ast> for VariantVisitor<'_> {
        fn visit_item_use(&mut self, item: &'ast syn::ItemUse) {
            let mut variants = Vec::new();
            walk_use_tree(&item.tree, &mut Vec::new(), &mut |path, leaf| {
                let ident = match leaf {
                    syn::UseTree::Name(name) => &name.ident,
                    syn::UseTree::Rename(rename) => &rename.ident,
                    _ => return,
                };
                // Modules are snake_case, so a CamelCase parent of a CamelCase leaf is a type
                let Some(parent) = path.last() else { return };
                let leaf_name = ident.to_string();
                if parent != "Self"
                    && support::is_camel_case(parent)
                    && support::is_camel_case(&leaf_name)
                {
                    variants.push((format!("{parent}::{leaf_name}"), ident.clone()));
                }
            });

            for (subject, ident) in variants {
                self.findings.push(support::finding(self.unit, &ident, subject));
            }
        }
    }

    let mut visitor = VariantVisitor { unit, findings: Vec::new() };
    visitor.visit_file(unit.syntax());
    Ok(visitor.findings)
}

#[cfg(test)]
mod tests {
    use super::super::testing::check;

    #[test]
    fn test_glob_import() {
        let source = "use std::collections::*;\nuse std::io::{self, prelude::*};\nuse crate::{a, b::*};\n";
        let findings = check("glob_import", source);
        let subjects: Vec<_> = findings.iter().map(|f| f.subject.as_str()).collect();

        assert_eq!(subjects, vec!["std::collections", "crate::b"]);
        assert_eq!(findings[1].location.line, 3);
    }

    #[test]
    fn test_super_glob_allowed_only_in_tests() {
        let source = r#"
mod inner {
    use super::*;
}

#[cfg(test)]
mod tests {
    use super::*;
}
"#;
        let findings = check("glob_import", source);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].location.line, 3);
    }

    #[test]
    fn test_enum_variant_import() {
        let source = "use std::cmp::Ordering::{self, Less, Greater};\nuse std::collections::HashMap;\n";
        let findings = check("enum_variant_import", source);
        let subjects: Vec<_> = findings.iter().map(|f| f.subject.as_str()).collect();

        assert_eq!(subjects, vec!["Ordering::Less", "Ordering::Greater"]);
    }

    #[test]
    fn test_type_imports_are_not_variants() {
        let source = "use std::sync::Arc;\nuse std::io::Result as IoResult;\nuse self::Kind;\n";
        assert!(check("enum_variant_import", source).is_empty());
    }
}
