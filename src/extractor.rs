//! Synthetic stylesheet generation and output extraction
//!
//! The compiler is asked to serialize variable values through a rule like
//!
//! ```scss
//! .sass-vars-<hex>{json-sass-vars-<hex>-content:'{"color": #{if(global-variable-exists('color'), json-encode($color), 'null')}}';}
//! ```
//!
//! which compiles to a declaration holding a JSON object. [`OutputExtractor`]
//! finds that declaration again in the compiled text and decodes it.

use crate::error::{ExtractError, Result};
use crate::types::marker_property;
use crate::variables::{variable_key, AccumulatedVariables};
use regex::Regex;
use serde_json::{Map, Value};

/// Resolved variable values keyed by name without the sigil.
pub type VariableMap = Map<String, Value>;

/// Build the interpolated JSON object text for every accumulated variable.
///
/// Each field evaluates, at compile time, to the JSON encoding of the global
/// variable's current value, or to `null` when no such global exists.
pub fn build_preparsed_source(accumulated: &AccumulatedVariables) -> String {
    let fields: Vec<String> = accumulated
        .iter()
        .map(|token| {
            let body = &token[1..];
            format!(
                "{}: #{{if(global-variable-exists('{}'), json-encode({}), 'null')}}",
                quote_json_key(&variable_key(token)),
                body,
                token
            )
        })
        .collect();

    format!("{{{}}}", fields.join(","))
}

/// The source served for the sentinel import.
pub fn synthetic_rule(token: &str, accumulated: &AccumulatedVariables) -> String {
    format!(
        "\n.{}{{{}:'{}';}}\n",
        token,
        marker_property(token),
        build_preparsed_source(accumulated)
    )
}

/// JSON-encode a key, then escape it for a single-quoted stylesheet string so
/// the compiler hands the JSON text back unchanged.
fn quote_json_key(key: &str) -> String {
    let json = Value::String(key.to_string()).to_string();
    let mut quoted = String::with_capacity(json.len());
    for ch in json.chars() {
        match ch {
            '\\' | '\'' | '#' => {
                quoted.push('\\');
                quoted.push(ch);
            }
            _ => quoted.push(ch),
        }
    }
    quoted
}

/// Locates and decodes the marker declaration in compiled output
#[derive(Debug, Clone)]
pub struct OutputExtractor {
    token: String,
    marker_regex: Regex,
}

impl OutputExtractor {
    pub fn new(token: &str) -> Result<Self> {
        let pattern = format!(
            r#"(?s){}\s*:\s*(?:'((?:[^'\\]|\\.)*)'|"((?:[^"\\]|\\.)*)")\s*[;}}]"#,
            regex::escape(&marker_property(token))
        );
        let marker_regex = Regex::new(&pattern)
            .map_err(|e| ExtractError::extraction(format!("Invalid marker pattern: {}", e)))?;

        Ok(Self {
            token: token.to_string(),
            marker_regex,
        })
    }

    /// Return the decoded JSON payload text, without purging anything.
    pub fn find_payload(&self, output: &str) -> Result<String> {
        let captures = self.marker_regex.captures(output).ok_or_else(|| {
            ExtractError::extraction(format!(
                "Marker for session {} not found in compiler output",
                self.token
            ))
        })?;

        let raw = captures
            .get(1)
            .or_else(|| captures.get(2))
            .map(|m| m.as_str())
            .unwrap_or_default();
        Ok(unescape_css_string(raw))
    }

    /// Decode the payload into a map and drop every `null` entry.
    pub fn extract(&self, output: &str) -> Result<VariableMap> {
        let payload = self.find_payload(output)?;
        log::debug!("Payload for session {}: {} bytes", self.token, payload.len());

        let value: Value = serde_json::from_str(&payload)
            .map_err(|e| ExtractError::extraction(format!("Payload is not valid JSON: {}", e)))?;

        match value {
            Value::Object(mut map) => {
                let before = map.len();
                purge_nulls(&mut map);
                log::debug!("Purged {} unresolved variable(s)", before - map.len());
                Ok(map)
            }
            other => Err(ExtractError::extraction(format!(
                "Payload is not a JSON object: {}",
                other
            ))),
        }
    }
}

/// Remove top-level entries whose value is `null`.
pub fn purge_nulls(map: &mut VariableMap) {
    map.retain(|_, value| !value.is_null());
}

/// Decode CSS string escapes (`\\`, `\"`, `\a `, `\1F600`...).
pub fn unescape_css_string(raw: &str) -> String {
    let mut result = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '\\' {
            result.push(ch);
            continue;
        }

        let mut hex = String::new();
        while hex.len() < 6 {
            match chars.peek() {
                Some(c) if c.is_ascii_hexdigit() => {
                    hex.push(*c);
                    chars.next();
                }
                _ => break,
            }
        }

        if !hex.is_empty() {
            // One whitespace character terminates a hex escape and is consumed.
            if matches!(chars.peek(), Some(' ') | Some('\t') | Some('\n')) {
                chars.next();
            }
            let decoded = u32::from_str_radix(&hex, 16)
                .ok()
                .filter(|code| *code != 0)
                .and_then(char::from_u32)
                .unwrap_or('\u{FFFD}');
            result.push(decoded);
            continue;
        }

        match chars.next() {
            // Escaped newline is a line continuation
            Some('\n') => {}
            Some(other) => result.push(other),
            None => result.push('\\'),
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const TOKEN: &str = "sass-vars-0123456789abcdef0123456789abcdef";

    fn accumulated(names: &[&str]) -> AccumulatedVariables {
        let mut vars = AccumulatedVariables::new();
        for name in names {
            vars.insert(name);
        }
        vars
    }

    #[test]
    fn test_build_preparsed_source() {
        let source = build_preparsed_source(&accumulated(&["$color", "$space-2"]));
        assert_eq!(
            source,
            "{\"color\": #{if(global-variable-exists('color'), json-encode($color), 'null')},\
             \"space-2\": #{if(global-variable-exists('space-2'), json-encode($space-2), 'null')}}"
        );
    }

    #[test]
    fn test_build_preparsed_source_empty() {
        assert_eq!(build_preparsed_source(&AccumulatedVariables::new()), "{}");
    }

    #[test]
    fn test_escaped_name_key() {
        let source = build_preparsed_source(&accumulated(&[r"$grid\:col"]));
        assert!(source.starts_with("{\"grid:col\": "));
        assert!(source.contains(r"global-variable-exists('grid\:col')"));
        assert!(source.contains(r"json-encode($grid\:col)"));
    }

    #[test]
    fn test_synthetic_rule() {
        let rule = synthetic_rule(TOKEN, &accumulated(&["$x"]));
        assert!(rule.contains(&format!(".{}{{json-{}-content:'{{\"x\": ", TOKEN, TOKEN)));
        assert!(rule.trim_end().ends_with("}';}"));
    }

    #[test]
    fn test_extract_purges_nulls_only() {
        let output = format!(
            ".{t} {{\n  json-{t}-content: '{{\"a\":null,\"b\":0,\"c\":false,\"d\":\"\",\"e\":[],\"f\":\"red\"}}';\n}}\n",
            t = TOKEN
        );
        let map = OutputExtractor::new(TOKEN).unwrap().extract(&output).unwrap();

        assert_eq!(
            Value::Object(map),
            json!({"b": 0, "c": false, "d": "", "e": [], "f": "red"})
        );
    }

    #[test]
    fn test_extract_keeps_payload_order() {
        let output = format!("json-{}-content:'{{\"z\":1,\"a\":2,\"m\":3}}';", TOKEN);
        let map = OutputExtractor::new(TOKEN).unwrap().extract(&output).unwrap();
        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["z", "a", "m"]);
    }

    #[test]
    fn test_extract_double_quoted_payload() {
        let output = format!(
            r#".{t} {{ json-{t}-content: "{{\"font\":\"'Helvetica', sans-serif\"}}"; }}"#,
            t = TOKEN
        );
        let map = OutputExtractor::new(TOKEN).unwrap().extract(&output).unwrap();
        assert_eq!(map["font"], json!("'Helvetica', sans-serif"));
    }

    #[test]
    fn test_extract_compressed_output() {
        let output = format!(".{t}{{json-{t}-content:'{{\"x\":1}}'}}", t = TOKEN);
        let map = OutputExtractor::new(TOKEN).unwrap().extract(&output).unwrap();
        assert_eq!(map["x"], json!(1));
    }

    #[test]
    fn test_extract_ignores_other_sessions() {
        let other = "sass-vars-ffffffffffffffffffffffffffffffff";
        let output = format!("json-{}-content: '{{\"x\":1}}';", other);

        match OutputExtractor::new(TOKEN).unwrap().extract(&output) {
            Err(ExtractError::ExtractionFailed { message }) => {
                assert!(message.contains("not found"));
            }
            other => panic!("Expected ExtractionFailed, got {:?}", other),
        }
    }

    #[test]
    fn test_extract_invalid_payload() {
        let output = format!("json-{}-content: '{{\"x\": }}';", TOKEN);
        assert!(matches!(
            OutputExtractor::new(TOKEN).unwrap().extract(&output),
            Err(ExtractError::ExtractionFailed { .. })
        ));

        let output = format!("json-{}-content: '[1, 2]';", TOKEN);
        assert!(matches!(
            OutputExtractor::new(TOKEN).unwrap().extract(&output),
            Err(ExtractError::ExtractionFailed { .. })
        ));
    }

    #[test]
    fn test_unescape_css_string() {
        assert_eq!(unescape_css_string(r#"a\\b"#), r"a\b");
        assert_eq!(unescape_css_string(r#"\"q\""#), "\"q\"");
        assert_eq!(unescape_css_string(r"line\a next"), "line\nnext");
        assert_eq!(unescape_css_string(r"\1F600"), "\u{1F600}");
        assert_eq!(unescape_css_string(r"\0"), "\u{FFFD}");
        assert_eq!(unescape_css_string("trailing\\"), "trailing\\");
    }

    #[test]
    fn test_escaped_json_string_round_trips() {
        // JSON `"a\"b"` as the compiler serializes it inside a quoted string
        let output = format!(r#"json-{}-content: '{{"k":"a\\"b"}}';"#, TOKEN);
        let map = OutputExtractor::new(TOKEN).unwrap().extract(&output).unwrap();
        assert_eq!(map["k"], json!("a\"b"));
    }
}
