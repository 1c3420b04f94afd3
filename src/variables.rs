//! Variable name scraping
//!
//! Collects `$name` tokens from stylesheet source without parsing it. The scan
//! is blind to scope and syntax: names inside comments, strings and mixin
//! bodies are collected too. Whether a name is a real global is decided later
//! by the compiler itself, so over-collecting only costs a `null` that gets
//! purged from the result.

use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

/// `$` followed by word characters, hyphens, or backslash-escaped punctuation.
const VARIABLE_PATTERN: &str = r##"\$(?:[\w-]|\\[ !"#$%&'()*+,./:;<=>?@^{|}~\[\]])+"##;

fn variable_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(VARIABLE_PATTERN).expect("variable pattern is valid"))
}

/// Set of variable names (sigil included) seen during one extraction session.
///
/// Only ever grows. Iteration follows first-insertion order so the generated
/// stylesheet and the resulting map are stable for a given input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccumulatedVariables {
    names: Vec<String>,
    seen: HashSet<String>,
}

impl AccumulatedVariables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a name. Returns `false` if it was already present.
    pub fn insert(&mut self, name: &str) -> bool {
        if self.seen.contains(name) {
            return false;
        }
        self.seen.insert(name.to_string());
        self.names.push(name.to_string());
        true
    }

    pub fn contains(&self, name: &str) -> bool {
        self.seen.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

/// Lexical scanner for variable references
#[derive(Debug, Clone)]
pub struct VariableScraper {
    pattern: &'static Regex,
}

impl Default for VariableScraper {
    fn default() -> Self {
        Self::new()
    }
}

impl VariableScraper {
    pub fn new() -> Self {
        Self {
            pattern: variable_regex(),
        }
    }

    /// Add every variable token found in `source` to `target`.
    ///
    /// Returns the number of names that were not already in `target`.
    pub fn scrape(&self, source: &str, target: &mut AccumulatedVariables) -> usize {
        let mut added = 0;
        let mut cursor = 0;

        while cursor <= source.len() {
            let Some(found) = self.pattern.find_at(source, cursor) else {
                break;
            };

            if found.start() == found.end() {
                // Zero-width match: step over one character so the scan terminates.
                cursor = source[found.end()..]
                    .chars()
                    .next()
                    .map_or(source.len() + 1, |ch| found.end() + ch.len_utf8());
                continue;
            }

            if target.insert(found.as_str()) {
                added += 1;
            }
            cursor = found.end();
        }

        log::trace!("Scraped {} new variable name(s)", added);
        added
    }
}

/// Convenience function to scrape with a fresh scanner
pub fn scrape_variables(source: &str, target: &mut AccumulatedVariables) -> usize {
    VariableScraper::new().scrape(source, target)
}

/// Strip the sigil and resolve backslash escapes, giving the name as the
/// compiler reports it.
pub fn variable_key(token: &str) -> String {
    let body = token.strip_prefix(crate::types::VARIABLE_SIGIL).unwrap_or(token);
    let mut key = String::with_capacity(body.len());
    let mut chars = body.chars();

    while let Some(ch) = chars.next() {
        if ch == '\\' {
            if let Some(escaped) = chars.next() {
                key.push(escaped);
            }
        } else {
            key.push(ch);
        }
    }
    key
}
