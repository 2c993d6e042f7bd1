//! Rule configuration for `pagescrub-core`.
//!
//! This module defines the data structures for scrub rules and the fixed,
//! ordered rule list that ships with the library. The list is embedded at
//! compile time from `config/default_rules.yaml` and validated when loaded.
//!
//! License: MIT OR Apache-2.0

use anyhow::{Context, Result};
use log::{debug, warn};
use regex::RegexBuilder;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::errors::ScrubError;

/// Maximum allowed length for a regex pattern string.
pub const MAX_PATTERN_LENGTH: usize = 500;

/// A single ordered redaction rule.
///
/// Patterns are regular expressions matched case-insensitively. The
/// replacement is inserted literally; `$1`-style references are not expanded.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(default)]
pub struct ScrubRule {
    /// Unique identifier for the rule (e.g., "tenant_guid").
    pub name: String,
    /// Human-readable description of what the rule targets.
    pub description: Option<String>,
    /// Kind of identifier: tenant, guid, resource, thumbprint or username.
    pub category: Option<String>,
    /// The regex pattern string.
    pub pattern: Option<String>,
    /// The literal text that replaces every match.
    pub replace_with: String,
    /// When set, a match only counts if this literal immediately precedes it.
    pub preceded_by: Option<String>,
}

impl Default for ScrubRule {
    fn default() -> Self {
        Self {
            name: String::new(),
            description: None,
            category: None,
            pattern: None,
            replace_with: "[REDACTED]".to_string(),
            preceded_by: None,
        }
    }
}

/// The ordered list of rules applied by the sanitizer.
#[derive(Debug, Default, Deserialize, Serialize, Clone, PartialEq, Eq, Hash)]
pub struct RuleSet {
    pub rules: Vec<ScrubRule>,
}

impl RuleSet {
    /// Loads the built-in rule list from the embedded configuration.
    pub fn load_default_rules() -> Result<Self> {
        debug!("Loading default rules from embedded string...");
        let default_yaml = include_str!("../config/default_rules.yaml");
        let rule_set = Self::from_yaml_str(default_yaml).context("Failed to parse default rules")?;
        debug!("Loaded {} default rules.", rule_set.rules.len());
        Ok(rule_set)
    }

    /// Parses and validates a rule list from YAML text.
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let rule_set: RuleSet = serde_yml::from_str(text).context("Failed to parse rule YAML")?;
        validate_rules(&rule_set.rules)?;
        Ok(rule_set)
    }

    /// Looks up a rule by name.
    pub fn get(&self, name: &str) -> Option<&ScrubRule> {
        self.rules.iter().find(|r| r.name == name)
    }

    /// Position of a rule in application order.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.rules.iter().position(|r| r.name == name)
    }
}

/// Validates rule integrity: names, patterns, compilation and guards.
pub fn validate_rules(rules: &[ScrubRule]) -> Result<(), ScrubError> {
    let mut rule_names = HashSet::new();
    let mut errors = Vec::new();

    for rule in rules {
        if rule.name.is_empty() {
            errors.push("A rule has an empty `name` field.".to_string());
        } else if !rule_names.insert(rule.name.as_str()) {
            errors.push(format!("Duplicate rule name found: '{}'.", rule.name));
        }

        let pattern = match &rule.pattern {
            Some(p) if !p.is_empty() => p,
            Some(_) => {
                errors.push(format!("Rule '{}' has an empty `pattern` field.", rule.name));
                continue;
            }
            None => {
                errors.push(format!("Rule '{}' is missing the `pattern` field.", rule.name));
                continue;
            }
        };

        if pattern.len() > MAX_PATTERN_LENGTH {
            errors.push(
                ScrubError::PatternLengthExceeded(rule.name.clone(), pattern.len(), MAX_PATTERN_LENGTH)
                    .to_string(),
            );
            continue;
        }

        match RegexBuilder::new(pattern).case_insensitive(true).build() {
            Ok(regex) => {
                if regex.is_match("") {
                    errors.push(format!("Rule '{}' has a pattern that matches empty text.", rule.name));
                }
            }
            Err(e) => {
                errors.push(format!("Rule '{}' has an invalid regex pattern: {}", rule.name, e));
            }
        }

        if let Some(guard) = &rule.preceded_by {
            if guard.is_empty() {
                errors.push(format!("Rule '{}' has an empty `preceded_by` guard.", rule.name));
            }
        }

        if rule.replace_with.is_empty() {
            warn!("Rule '{}' replaces matches with an empty string.", rule.name);
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ScrubError::InvalidRuleSet(errors.join("\n")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(name: &str, pattern: &str) -> ScrubRule {
        ScrubRule {
            name: name.to_string(),
            pattern: Some(pattern.to_string()),
            replace_with: "x".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn default_rules_keep_generic_username_last() {
        let rules = RuleSet::load_default_rules().unwrap();
        assert_eq!(rules.rules.last().unwrap().name, "username");
        assert!(rules.position("key_vault").unwrap() < rules.position("username").unwrap());
    }

    #[test]
    fn guard_rule_directly_follows_truncated_rule() {
        let rules = RuleSet::load_default_rules().unwrap();
        let truncated = rules.position("tenant_guid_truncated").unwrap();
        let tail = &rules.rules[truncated + 1];
        assert_eq!(tail.name, "tenant_guid_tail");
        assert_eq!(
            tail.preceded_by.as_deref(),
            Some(rules.rules[truncated].replace_with.as_str())
        );
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let err = validate_rules(&[rule("a", "x"), rule("a", "y")]).unwrap_err();
        assert!(err.to_string().contains("Duplicate rule name found: 'a'"));
    }

    #[test]
    fn empty_matching_pattern_is_rejected() {
        let err = validate_rules(&[rule("loose", "a*")]).unwrap_err();
        assert!(err.to_string().contains("matches empty text"));
    }

    #[test]
    fn overlong_pattern_is_rejected() {
        let long = "a".repeat(MAX_PATTERN_LENGTH + 1);
        let err = validate_rules(&[rule("long", &long)]).unwrap_err();
        assert!(err.to_string().contains("exceeds maximum allowed"));
    }

    #[test]
    fn empty_guard_is_rejected() {
        let mut guarded = rule("guarded", "58");
        guarded.preceded_by = Some(String::new());
        assert!(validate_rules(&[guarded]).is_err());
    }
}
