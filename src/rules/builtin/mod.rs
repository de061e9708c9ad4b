//! Built-in rules, one module per discipline
//!
//! Every predicate is purely syntactic: it sees one `SourceUnit` and nothing
//! else. Thresholds come from `RuleSettings` at construction time.

pub mod code;
pub mod comment;
pub mod cosmetic;
pub mod error_handling;
pub mod function;
pub mod import;
pub mod naming;
pub mod ordering;
pub mod pattern_matching;
pub mod structural;
pub mod support;
pub mod unsafe_code;

use super::Rule;
use crate::config::RuleSettings;

/// All built-in rules, grouped by discipline in style-guide order
pub fn rules(settings: &RuleSettings) -> Vec<Rule> {
    let mut rules = Vec::new();
    rules.extend(cosmetic::rules(settings));
    rules.extend(naming::rules(settings));
    rules.extend(import::rules(settings));
    rules.extend(pattern_matching::rules(settings));
    rules.extend(code::rules(settings));
    rules.extend(error_handling::rules(settings));
    rules.extend(function::rules(settings));
    rules.extend(ordering::rules(settings));
    rules.extend(unsafe_code::rules(settings));
    rules.extend(structural::rules(settings));
    rules.extend(comment::rules(settings));
    rules
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_builtin_ids_are_unique_and_snake_case() {
        let rules = rules(&RuleSettings::default());
        let mut seen = HashSet::new();

        for rule in &rules {
            assert!(seen.insert(rule.id.clone()), "duplicate id {}", rule.id);
            assert!(support::is_snake_case(&rule.id), "id {} is not snake_case", rule.id);
        }
        assert_eq!(rules.len(), 27);
    }
}
