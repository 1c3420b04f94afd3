//! Import interception
//!
//! The compiler calls an [`ImportHook`] once for every import directive it
//! meets, in document order. [`ImportInterceptor`] uses that callback to see
//! every stylesheet the compilation touches and, at the sentinel import, to
//! inject the rule that makes the compiler serialize the variables it saw.

use crate::extractor::synthetic_rule;
use crate::resolver::{path_candidates, resolve_path, FileSystem, OsFileSystem};
use crate::types::{ExtractOptions, HELPER_SOURCE};
use crate::variables::{AccumulatedVariables, VariableScraper};
use std::path::{Path, PathBuf};

/// What the hook tells the compiler about one import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportResult {
    /// Compile this source in place of the import.
    Source(String),

    /// The import was seen and resolved to this file. The hook contributes no
    /// content of its own; the compiler loads the file as usual and must not
    /// report a lookup error for it.
    Resolved(PathBuf),

    /// Not handled here. The compiler falls back to its own lookup and error
    /// reporting.
    Declined,
}

/// Import resolution callback handed to the compiler.
pub trait ImportHook {
    fn import(&mut self, import_ref: &str, importing_file: &Path) -> ImportResult;
}

impl<F> ImportHook for F
where
    F: FnMut(&str, &Path) -> ImportResult,
{
    fn import(&mut self, import_ref: &str, importing_file: &Path) -> ImportResult {
        self(import_ref, importing_file)
    }
}

/// Import hook bound to a single extraction session.
///
/// Owns the session's variable accumulator; nothing in here is shared with
/// other sessions.
#[derive(Debug)]
pub struct ImportInterceptor<F: FileSystem = OsFileSystem> {
    token: String,
    helper_import: String,
    search_roots: Vec<PathBuf>,
    default_extension: String,
    fs: F,
    scraper: VariableScraper,
    accumulated: AccumulatedVariables,
    visited: Vec<PathBuf>,
}

impl ImportInterceptor<OsFileSystem> {
    pub fn new(token: impl Into<String>, options: &ExtractOptions) -> Self {
        Self::with_file_system(token, options, OsFileSystem)
    }
}

impl<F: FileSystem> ImportInterceptor<F> {
    pub fn with_file_system(token: impl Into<String>, options: &ExtractOptions, fs: F) -> Self {
        Self {
            token: token.into(),
            helper_import: options.helper_import.clone(),
            search_roots: options.search_roots.clone(),
            default_extension: options.default_extension.clone(),
            fs,
            scraper: VariableScraper::new(),
            accumulated: AccumulatedVariables::new(),
            visited: Vec::new(),
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn accumulated(&self) -> &AccumulatedVariables {
        &self.accumulated
    }

    /// Files read and scraped so far, in visit order.
    pub fn visited(&self) -> &[PathBuf] {
        &self.visited
    }

    /// Source for the sentinel import, built from the names accumulated so far.
    pub fn synthetic_source(&self) -> String {
        synthetic_rule(&self.token, &self.accumulated)
    }

    fn visit_file(&mut self, import_ref: &str, importing_file: &Path) -> ImportResult {
        let candidates = path_candidates(
            import_ref,
            importing_file,
            &self.search_roots,
            &self.default_extension,
        );

        let resolved = match resolve_path(import_ref, candidates, &self.fs) {
            Ok(path) => path,
            Err(e) => {
                log::debug!("{}; leaving it to the compiler", e);
                return ImportResult::Declined;
            }
        };

        let content = match self.fs.read_to_string(&resolved) {
            Ok(content) => content,
            Err(e) => {
                log::warn!("Failed to read '{}': {}", resolved.display(), e);
                return ImportResult::Declined;
            }
        };

        let added = self.scraper.scrape(&content, &mut self.accumulated);
        log::debug!(
            "Import '{}' -> {} ({} new variable name(s))",
            import_ref,
            resolved.display(),
            added
        );
        self.visited.push(resolved.clone());

        ImportResult::Resolved(resolved)
    }
}

impl<F: FileSystem> ImportHook for ImportInterceptor<F> {
    fn import(&mut self, import_ref: &str, importing_file: &Path) -> ImportResult {
        if import_ref == self.token {
            log::debug!(
                "Sentinel import reached with {} variable name(s)",
                self.accumulated.len()
            );
            return ImportResult::Source(self.synthetic_source());
        }

        if import_ref == self.helper_import {
            return ImportResult::Source(HELPER_SOURCE.to_string());
        }

        self.visit_file(import_ref, importing_file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const TOKEN: &str = "sass-vars-00000000000000000000000000000000";

    fn create_test_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let file_path = dir.path().join(name);
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&file_path, content).unwrap();
        file_path
    }

    #[test]
    fn test_real_import_is_scraped_and_resolved() {
        let temp_dir = TempDir::new().unwrap();
        let partial = create_test_file(&temp_dir, "_vars.scss", "$x: 1;\n$y: $x;");
        let main = create_test_file(&temp_dir, "main.scss", "@import 'vars';");

        let mut interceptor = ImportInterceptor::new(TOKEN, &ExtractOptions::default());
        let result = interceptor.import("vars", &main);

        assert_eq!(result, ImportResult::Resolved(partial.clone()));
        assert_eq!(
            interceptor.accumulated().iter().collect::<Vec<_>>(),
            vec!["$x", "$y"]
        );
        assert_eq!(interceptor.visited(), &[partial]);
    }

    #[test]
    fn test_search_roots_are_used() {
        let temp_dir = TempDir::new().unwrap();
        let vendor = temp_dir.path().join("vendor");
        let theme = create_test_file(&temp_dir, "vendor/theme/colors.scss", "$brand: teal;");
        let main = create_test_file(&temp_dir, "src/main.scss", "");

        let options = ExtractOptions::with_search_roots([vendor]);
        let mut interceptor = ImportInterceptor::new(TOKEN, &options);

        assert_eq!(
            interceptor.import("theme/colors", &main),
            ImportResult::Resolved(theme)
        );
        assert!(interceptor.accumulated().contains("$brand"));
    }

    #[test]
    fn test_missing_import_is_declined() {
        let temp_dir = TempDir::new().unwrap();
        let main = create_test_file(&temp_dir, "main.scss", "");

        let mut interceptor = ImportInterceptor::new(TOKEN, &ExtractOptions::default());

        assert_eq!(interceptor.import("nope", &main), ImportResult::Declined);
        assert!(interceptor.accumulated().is_empty());
        assert!(interceptor.visited().is_empty());
    }

    #[test]
    fn test_sentinel_returns_synthetic_rule() {
        let temp_dir = TempDir::new().unwrap();
        create_test_file(&temp_dir, "_a.scss", "$a: 1;");
        create_test_file(&temp_dir, "b.scss", "$b: 2; // $a again");
        let main = create_test_file(&temp_dir, "main.scss", "");

        let mut interceptor = ImportInterceptor::new(TOKEN, &ExtractOptions::default());
        interceptor.import("a", &main);
        interceptor.import("b", &main);

        match interceptor.import(TOKEN, &main) {
            ImportResult::Source(source) => {
                assert!(source.contains(&format!(".{}{{json-{}-content:'", TOKEN, TOKEN)));
                assert!(source.contains("global-variable-exists('a')"));
                assert!(source.contains("json-encode($b)"));
                assert_eq!(source.matches("global-variable-exists").count(), 2);
            }
            other => panic!("Expected synthetic source, got {:?}", other),
        }
    }

    #[test]
    fn test_helper_import_is_served_from_memory() {
        let mut interceptor = ImportInterceptor::new(TOKEN, &ExtractOptions::default());

        match interceptor.import(crate::types::HELPER_IMPORT, Path::new("stdin")) {
            ImportResult::Source(source) => assert!(source.contains("@function json-encode")),
            other => panic!("Expected helper source, got {:?}", other),
        }
        assert!(interceptor.accumulated().is_empty());
    }

    #[test]
    fn test_sessions_do_not_share_state() {
        let temp_dir = TempDir::new().unwrap();
        create_test_file(&temp_dir, "_vars.scss", "$shared: 1;");
        let main = create_test_file(&temp_dir, "main.scss", "");

        let mut first = ImportInterceptor::new(TOKEN, &ExtractOptions::default());
        first.import("vars", &main);

        let second = ImportInterceptor::new(TOKEN, &ExtractOptions::default());
        assert!(first.accumulated().contains("$shared"));
        assert!(second.accumulated().is_empty());
    }

    #[test]
    fn test_closure_hook() {
        let mut calls = Vec::new();
        let mut hook = |import_ref: &str, _: &Path| {
            calls.push(import_ref.to_string());
            ImportResult::Declined
        };

        assert_eq!(hook.import("a", Path::new("x.scss")), ImportResult::Declined);
        assert_eq!(calls, vec!["a"]);
    }
}
