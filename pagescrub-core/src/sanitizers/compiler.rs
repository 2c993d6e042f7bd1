//! compiler.rs - Compiles, caches and applies scrub rules.
//!
//! This module turns a [`RuleSet`] into [`CompiledRules`]: one
//! case-insensitive regex per rule, kept in the rule list's order. Applying a
//! compiled set runs every rule in sequence, each against the output of the
//! previous one. Compiled sets are cached in a global map keyed by an
//! order-sensitive hash of the rule list.
//!
//! License: MIT OR APACHE 2.0

use anyhow::Result;
use lazy_static::lazy_static;
use log::{debug, warn};
use regex::{Regex, RegexBuilder};
use std::borrow::Cow;
use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeMap, HashMap};
use std::hash::{Hash, Hasher};
use std::sync::{Arc, RwLock};

use crate::config::{RuleSet, ScrubRule, MAX_PATTERN_LENGTH};
use crate::errors::ScrubError;

/// Per-rule count of matches that actually changed text, keyed by rule name.
pub type RuleHits = BTreeMap<String, usize>;

/// A single compiled scrub rule.
#[derive(Debug)]
pub struct CompiledRule {
    /// The unique name of the rule.
    pub name: String,
    /// Case-insensitive regex for the rule's pattern.
    pub regex: Regex,
    /// Literal replacement text.
    pub replace_with: String,
    /// Anchored-at-end regex for the `preceded_by` literal, if any.
    pub guard: Option<Regex>,
}

/// Result of running one rule over a string.
#[derive(Debug)]
pub struct RuleOutcome<'t> {
    /// Borrowed when no match was replaced.
    pub text: Cow<'t, str>,
    /// Number of matches whose text differed from the replacement.
    pub hits: usize,
}

impl CompiledRule {
    /// Replaces every non-overlapping match in `text`.
    ///
    /// A candidate rejected by the guard does not consume input; the scan
    /// resumes one character after its start.
    pub fn apply<'t>(&self, text: &'t str) -> RuleOutcome<'t> {
        let mut out = String::new();
        let mut last = 0;
        let mut pos = 0;
        let mut hits = 0;
        let mut replaced_any = false;

        while pos <= text.len() {
            let Some(m) = self.regex.find_at(text, pos) else {
                break;
            };
            if !self.guard_allows(text, m.start()) {
                pos = next_char_boundary(text, m.start());
                continue;
            }
            if m.as_str() != self.replace_with {
                hits += 1;
            }
            replaced_any = true;
            out.push_str(&text[last..m.start()]);
            out.push_str(&self.replace_with);
            last = m.end();
            pos = if m.end() > m.start() {
                m.end()
            } else {
                next_char_boundary(text, m.end())
            };
        }

        if !replaced_any || hits == 0 {
            return RuleOutcome { text: Cow::Borrowed(text), hits: 0 };
        }
        out.push_str(&text[last..]);
        RuleOutcome { text: Cow::Owned(out), hits }
    }

    fn guard_allows(&self, text: &str, start: usize) -> bool {
        match &self.guard {
            Some(guard) => guard.is_match(&text[..start]),
            None => true,
        }
    }
}

fn next_char_boundary(text: &str, at: usize) -> usize {
    at + text[at..].chars().next().map_or(1, char::len_utf8)
}

/// All compiled rules, in application order.
#[derive(Debug)]
pub struct CompiledRules {
    pub rules: Vec<CompiledRule>,
}

impl CompiledRules {
    /// Applies every rule in order and returns the final text.
    pub fn apply(&self, input: &str) -> String {
        let mut hits = RuleHits::new();
        self.apply_counted(input, &mut hits)
    }

    /// Like [`apply`](Self::apply), adding each rule's hits to `tally`.
    pub fn apply_counted(&self, input: &str, tally: &mut RuleHits) -> String {
        let mut current = Cow::Borrowed(input);
        for rule in &self.rules {
            let outcome = rule.apply(&current);
            let hits = outcome.hits;
            let replaced = match outcome.text {
                Cow::Owned(text) => Some(text),
                Cow::Borrowed(_) => None,
            };
            if hits > 0 {
                *tally.entry(rule.name.clone()).or_default() += hits;
            }
            if let Some(text) = replaced {
                current = Cow::Owned(text);
            }
        }
        current.into_owned()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

lazy_static! {
    /// Process-wide cache of compiled rule sets, keyed by [`hash_rule_set`].
    static ref COMPILED_RULES_CACHE: RwLock<HashMap<u64, Arc<CompiledRules>>> = RwLock::new(HashMap::new());
}

/// Hashes the rule list in order. Reordering rules changes behavior, so it
/// must change the key too.
fn hash_rule_set(rule_set: &RuleSet) -> u64 {
    let mut hasher = DefaultHasher::new();
    rule_set.rules.hash(&mut hasher);
    hasher.finish()
}

/// Compiles a list of rules, keeping their order.
pub fn compile_rules(rules_to_compile: &[ScrubRule]) -> Result<CompiledRules, ScrubError> {
    debug!("Starting compilation of {} rules.", rules_to_compile.len());

    let mut compiled_rules = Vec::with_capacity(rules_to_compile.len());
    let mut compilation_errors = Vec::new();

    for rule in rules_to_compile {
        let Some(pattern) = rule.pattern.as_ref() else {
            warn!("Skipping rule '{}' because its pattern is missing.", &rule.name);
            continue;
        };

        if pattern.len() > MAX_PATTERN_LENGTH {
            compilation_errors.push(ScrubError::PatternLengthExceeded(
                rule.name.clone(),
                pattern.len(),
                MAX_PATTERN_LENGTH,
            ));
            continue;
        }

        let regex = match build_case_insensitive(pattern) {
            Ok(regex) => regex,
            Err(e) => {
                compilation_errors.push(ScrubError::RuleCompilationError(rule.name.clone(), e));
                continue;
            }
        };

        let guard = match rule.preceded_by.as_deref() {
            Some(literal) => match build_case_insensitive(&format!("{}\\z", regex::escape(literal))) {
                Ok(guard) => Some(guard),
                Err(e) => {
                    compilation_errors.push(ScrubError::RuleCompilationError(rule.name.clone(), e));
                    continue;
                }
            },
            None => None,
        };

        debug!(target: "pagescrub_core::compiler", "Rule '{}' compiled successfully.", &rule.name);
        compiled_rules.push(CompiledRule {
            name: rule.name.clone(),
            regex,
            replace_with: rule.replace_with.clone(),
            guard,
        });
    }

    if !compilation_errors.is_empty() {
        let error_message = compilation_errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<String>>()
            .join("\n");
        return Err(ScrubError::Fatal(format!(
            "Failed to compile {} rule(s):\n{}",
            compilation_errors.len(),
            error_message
        )));
    }

    let compiled = CompiledRules { rules: compiled_rules };
    for (earlier, later) in find_shadowed_rules(rules_to_compile, &compiled) {
        warn!(
            "Rule '{}' matches inside the literal of later rule '{}'; the later rule will never see its full text.",
            earlier, later
        );
    }
    debug!("Finished compiling rules. Total compiled: {}.", compiled.rules.len());
    Ok(compiled)
}

fn build_case_insensitive(pattern: &str) -> Result<Regex, regex::Error> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .size_limit(10 * (1 << 20))
        .build()
}

/// Gets compiled rules from the cache, compiling them on first use.
pub fn get_or_compile_rules(rule_set: &RuleSet) -> Result<Arc<CompiledRules>> {
    let cache_key = hash_rule_set(rule_set);

    {
        let cache = COMPILED_RULES_CACHE
            .read()
            .map_err(|_| ScrubError::Fatal("compiled rule cache lock poisoned".to_string()))?;
        if let Some(rules) = cache.get(&cache_key) {
            debug!("Serving compiled rules from cache for key: {}", cache_key);
            return Ok(Arc::clone(rules));
        }
    }

    debug!("Compiled rules not found in cache. Compiling now.");
    let compiled = Arc::new(compile_rules(&rule_set.rules)?);
    COMPILED_RULES_CACHE
        .write()
        .map_err(|_| ScrubError::Fatal("compiled rule cache lock poisoned".to_string()))?
        .insert(cache_key, Arc::clone(&compiled));

    debug!("Successfully compiled and cached rules for key: {}", cache_key);
    Ok(compiled)
}

/// Finds pairs `(earlier, later)` where an earlier unguarded rule matches
/// inside the literal text of a later, literal-only rule.
pub fn find_shadowed_rules(rules: &[ScrubRule], compiled: &CompiledRules) -> Vec<(String, String)> {
    let literals: HashMap<&str, String> = rules
        .iter()
        .filter(|r| r.preceded_by.is_none())
        .filter_map(|r| {
            let literal = literal_text(r.pattern.as_deref()?)?;
            Some((r.name.as_str(), literal))
        })
        .collect();

    let mut shadowed = Vec::new();
    for (i, later) in compiled.rules.iter().enumerate() {
        let Some(literal) = literals.get(later.name.as_str()) else {
            continue;
        };
        for earlier in compiled.rules[..i].iter().filter(|r| r.guard.is_none()) {
            if earlier.regex.is_match(literal) {
                shadowed.push((earlier.name.clone(), later.name.clone()));
            }
        }
    }
    shadowed
}

/// Returns the text a pattern matches if it has no regex operators, resolving
/// escaped punctuation such as `\.`.
pub fn literal_text(pattern: &str) -> Option<String> {
    let mut literal = String::with_capacity(pattern.len());
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some(escaped) if !escaped.is_alphanumeric() => literal.push(escaped),
                _ => return None,
            },
            '.' | '^' | '$' | '*' | '+' | '?' | '(' | ')' | '[' | ']' | '{' | '}' | '|' => return None,
            _ => literal.push(c),
        }
    }
    Some(literal)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(name: &str, pattern: &str, replace_with: &str) -> ScrubRule {
        ScrubRule {
            name: name.to_string(),
            pattern: Some(pattern.to_string()),
            replace_with: replace_with.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn replacement_is_literal() {
        let compiled = compile_rules(&[rule("r", "(abc)", "$1-x")]).unwrap();
        assert_eq!(compiled.apply("ABC abc"), "$1-x $1-x");
    }

    #[test]
    fn rules_see_previous_output() {
        let compiled = compile_rules(&[rule("first", "alpha", "beta"), rule("second", "beta", "gamma")]).unwrap();
        assert_eq!(compiled.apply("alpha"), "gamma");
    }

    #[test]
    fn guard_checks_preceding_text() {
        let mut guarded = rule("tail", "58", "XX");
        guarded.preceded_by = Some("ab".to_string());
        let compiled = compile_rules(&[guarded]).unwrap();
        assert_eq!(compiled.apply("ab58 cd58 AB58"), "abXX cd58 ABXX");
    }

    #[test]
    fn rejected_guard_candidate_does_not_consume_input() {
        let mut guarded = rule("tail", "aa", "X");
        guarded.preceded_by = Some("a".to_string());
        let compiled = compile_rules(&[guarded]).unwrap();
        assert_eq!(compiled.apply("aaa"), "aX");
        assert_eq!(compiled.apply("baaa"), "baX");
    }

    #[test]
    fn identical_replacement_counts_no_hits() {
        let compiled = compile_rules(&[rule("same", "keep", "keep")]).unwrap();
        let mut hits = RuleHits::new();
        assert_eq!(compiled.apply_counted("keep it", &mut hits), "keep it");
        assert!(hits.is_empty());
    }

    #[test]
    fn hits_count_each_match() {
        let compiled = compile_rules(&[rule("user", "bob", "alice")]).unwrap();
        let mut hits = RuleHits::new();
        compiled.apply_counted("bob BOB Bob", &mut hits);
        assert_eq!(hits.get("user"), Some(&3));
    }

    #[test]
    fn literal_text_detection() {
        assert_eq!(literal_text(r"admin@x\.com").as_deref(), Some("admin@x.com"));
        assert_eq!(literal_text("a.b"), None);
        assert_eq!(literal_text(r"\d+"), None);
    }

    #[test]
    fn generic_rule_before_specific_is_reported() {
        let rules = vec![rule("user", "bob", "u"), rule("host", "bobhost", "h")];
        let compiled = compile_rules(&rules).unwrap();
        assert_eq!(
            find_shadowed_rules(&rules, &compiled),
            vec![("user".to_string(), "host".to_string())]
        );
    }

    #[test]
    fn cache_returns_shared_instance() {
        let rule_set = RuleSet { rules: vec![rule("cached", "zzz", "y")] };
        let a = get_or_compile_rules(&rule_set).unwrap();
        let b = get_or_compile_rules(&rule_set).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }
}
