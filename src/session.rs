//! Extraction session
//!
//! One session is one compiler invocation. It owns a fresh token and a fresh
//! [`ImportInterceptor`], builds the synthetic program
//!
//! ```scss
//! @import "<entry point>";
//! @import "sass-json-export";
//! @import "<session token>";
//! ```
//!
//! and reads the serialized variables back out of the compiled text.

use crate::compiler::{RenderRequest, StylesheetCompiler};
use crate::error::{ExtractError, Result};
use crate::extractor::{OutputExtractor, VariableMap};
use crate::importer::ImportInterceptor;
use crate::resolver::normalize_path;
use crate::types::{ExtractOptions, SESSION_TOKEN_PREFIX};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Generate a session token: the prefix followed by an MD5 over the current
/// time and a random UUID. Uniqueness is what matters here, not secrecy.
pub fn generate_session_token() -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos())
        .unwrap_or_default();
    let seed = format!("{}{}", nanos, Uuid::new_v4());
    let digest = md5::compute(seed.as_bytes());

    format!("{}{}", SESSION_TOKEN_PREFIX, hex::encode(digest.0))
}

pub struct ExtractionSession<'c> {
    compiler: &'c dyn StylesheetCompiler,
    options: ExtractOptions,
    token: String,
}

impl<'c> ExtractionSession<'c> {
    pub fn new(compiler: &'c dyn StylesheetCompiler, options: ExtractOptions) -> Self {
        let token = generate_session_token();
        log::debug!("Starting extraction session {}", token);
        Self {
            compiler,
            options,
            token,
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// Build the program the compiler is asked to render.
    pub fn synthetic_program(&self, entry_point: &Path) -> String {
        format!(
            "@import \"{}\";\n@import \"{}\";\n@import \"{}\";\n",
            quote_import(entry_point),
            self.options.helper_import,
            self.token
        )
    }

    /// Run the session to completion. Consumes the session so its interceptor
    /// state can never be reused.
    pub fn run(self, entry_point: &Path) -> Result<VariableMap> {
        let entry_point = absolute_entry_point(entry_point);

        let mut options = self.options.clone();
        if let Some(entry_dir) = entry_point.parent() {
            if !options.search_roots.iter().any(|root| root == entry_dir) {
                options.search_roots.push(entry_dir.to_path_buf());
            }
        }

        let source = self.synthetic_program(&entry_point);
        if options.debug_mode {
            log::info!("Extracting variables from '{}'", entry_point.display());
            log::info!("Synthetic program:\n{}", source);
        }

        let mut interceptor = ImportInterceptor::new(self.token.clone(), &options);
        let output = self
            .compiler
            .render(RenderRequest {
                source,
                search_roots: options.search_roots.clone(),
                hook: &mut interceptor,
            })
            .map_err(ExtractError::compilation)?;

        log::debug!(
            "Session {} visited {} file(s), saw {} variable name(s)",
            self.token,
            interceptor.visited().len(),
            interceptor.accumulated().len()
        );

        let variables = OutputExtractor::new(&self.token)?
            .extract(&output)
            .map_err(|e| match e {
                ExtractError::ExtractionFailed { message } => ExtractError::extraction(format!(
                    "{} (entry point '{}')",
                    message,
                    entry_point.display()
                )),
                other => other,
            })?;

        if options.debug_mode {
            log::info!("Resolved {} variable(s)", variables.len());
        }
        Ok(variables)
    }
}

fn absolute_entry_point(entry_point: &Path) -> PathBuf {
    if entry_point.is_absolute() {
        return normalize_path(entry_point);
    }
    std::env::current_dir()
        .map(|cwd| normalize_path(&cwd.join(entry_point)))
        .unwrap_or_else(|_| entry_point.to_path_buf())
}

/// Path text usable inside a double-quoted import string.
fn quote_import(path: &Path) -> String {
    path.to_string_lossy()
        .replace('\\', "/")
        .replace('"', "\\\"")
}
