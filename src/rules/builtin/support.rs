//! Helpers shared by the built-in rules

use crate::rules::Finding;
use crate::source::SourceUnit;
use lazy_static::lazy_static;
use regex::Regex;
use syn::spanned::Spanned;
use syn::visit::Visit;

lazy_static! {
    static ref SNAKE_CASE: Regex =
        Regex::new(r"^_*[a-z0-9]+(?:_[a-z0-9]+)*_*$").expect("snake case pattern is valid");
    static ref CAMEL_CASE: Regex =
        Regex::new(r"^_*[A-Z][A-Za-z0-9]*$").expect("camel case pattern is valid");
    static ref SCREAMING_CASE: Regex =
        Regex::new(r"^_*[A-Z0-9]+(?:_[A-Z0-9]+)*_*$").expect("screaming case pattern is valid");
}

/// Finding covering a syntax node
pub fn finding(unit: &SourceUnit, node: &impl Spanned, subject: impl Into<String>) -> Finding {
    Finding::new(unit.location_of(node.span()), subject)
}

pub fn is_snake_case(name: &str) -> bool {
    name.trim_matches('_').is_empty() || SNAKE_CASE.is_match(name)
}

pub fn is_camel_case(name: &str) -> bool {
    CAMEL_CASE.is_match(name)
}

pub fn is_screaming_case(name: &str) -> bool {
    name.trim_matches('_').is_empty() || SCREAMING_CASE.is_match(name)
}

/// `parseHTTPResponse` -> `parse_http_response`
pub fn to_snake_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);

    for (i, &ch) in chars.iter().enumerate() {
        if ch.is_uppercase() && i > 0 {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).map_or(false, |c| c.is_lowercase());
            if prev != '_' && (prev.is_lowercase() || prev.is_ascii_digit() || next_is_lower) {
                out.push('_');
            }
        }
        out.extend(ch.to_lowercase());
    }

    out
}

/// `http_client` -> `HttpClient`
pub fn to_camel_case(name: &str) -> String {
    name.split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect()
                }
                None => String::new(),
            }
        })
        .collect()
}

pub fn to_screaming_case(name: &str) -> String {
    to_snake_case(name).to_uppercase()
}

/// `#[test]`, `#[tokio::test]`, `#[rstest]` or `#[cfg(test)]`
pub fn is_test_attrs(attrs: &[syn::Attribute]) -> bool {
    attrs.iter().any(|attr| {
        let path = attr.path();
        if path.is_ident("cfg") {
            return match &attr.meta {
                syn::Meta::List(list) => {
                    let tokens = list.tokens.to_string();
                    let words: Vec<&str> = tokens
                        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
                        .filter(|w| !w.is_empty())
                        .collect();
                    words.contains(&"test") && !words.contains(&"not")
                }
                _ => false,
            };
        }
        path.segments
            .last()
            .map_or(false, |segment| segment.ident == "test" || segment.ident == "rstest")
    })
}

pub fn has_doc(attrs: &[syn::Attribute]) -> bool {
    attrs.iter().any(|attr| attr.path().is_ident("doc"))
}

/// Concatenated `///` lines of an item
pub fn doc_text(attrs: &[syn::Attribute]) -> String {
    attrs
        .iter()
        .filter(|attr| attr.path().is_ident("doc"))
        .filter_map(|attr| match &attr.meta {
            syn::Meta::NameValue(syn::MetaNameValue {
                value: syn::Expr::Lit(syn::ExprLit { lit: syn::Lit::Str(text), .. }),
                ..
            }) => Some(text.value()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Plain `pub`; restricted visibility such as `pub(crate)` does not count
pub fn is_public(vis: &syn::Visibility) -> bool {
    matches!(vis, syn::Visibility::Public(_))
}

/// Whether a signature returns some `Result` (including aliases like `io::Result`)
pub fn returns_result(sig: &syn::Signature) -> bool {
    match &sig.output {
        syn::ReturnType::Type(_, ty) => match ty.as_ref() {
            syn::Type::Path(path) => path
                .path
                .segments
                .last()
                .map_or(false, |segment| segment.ident.to_string().ends_with("Result")),
            _ => false,
        },
        syn::ReturnType::Default => false,
    }
}

/// Parameters excluding `self`
pub fn typed_params(sig: &syn::Signature) -> impl Iterator<Item = &syn::PatType> {
    sig.inputs.iter().filter_map(|arg| match arg {
        syn::FnArg::Typed(pat_type) => Some(pat_type),
        syn::FnArg::Receiver(_) => None,
    })
}

/// Line ranges covered by test functions and `#[cfg(test)]` modules
pub fn test_regions(unit: &SourceUnit) -> Vec<(u32, u32)> {
    struct TestRegionVisitor<'u> {
        unit: &'u SourceUnit,
        regions: Vec<(u32, u32)>,
    }

    impl TestRegionVisitor<'_> {
        fn record(&mut self, node: &impl Spanned) {
            let location = self.unit.location_of(node.span());
            self.regions.push((location.line, location.end_line));
        }
    }

    impl<'ast> Visit<'ast> for TestRegionVisitor<'_> {
        fn visit_item_fn(&mut self, func: &'ast syn::ItemFn) {
            if is_test_attrs(&func.attrs) {
                self.record(func);
            } else {
                syn::visit::visit_item_fn(self, func);
            }
        }

        fn visit_item_mod(&mut self, module: &'ast syn::ItemMod) {
            if is_test_attrs(&module.attrs) {
                self.record(module);
            } else {
                syn::visit::visit_item_mod(self, module);
            }
        }

        fn visit_impl_item_fn(&mut self, func: &'ast syn::ImplItemFn) {
            if is_test_attrs(&func.attrs) {
                self.record(func);
            } else {
                syn::visit::visit_impl_item_fn(self, func);
            }
        }
    }

    let mut visitor = TestRegionVisitor { unit, regions: Vec::new() };
    visitor.visit_file(unit.syntax());
    visitor.regions
}

/// Drop findings inside test code when `skip_tests` is set
pub fn outside_tests(unit: &SourceUnit, mut findings: Vec<Finding>, skip_tests: bool) -> Vec<Finding> {
    if skip_tests && !findings.is_empty() {
        let regions = test_regions(unit);
        findings.retain(|finding| {
            let line = finding.location.line;
            !regions.iter().any(|&(first, last)| line >= first && line <= last)
        });
    }
    findings
}
