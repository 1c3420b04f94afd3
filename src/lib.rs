//! Sass Variable Extractor
//!
//! Resolves the final values of the variables declared across a stylesheet
//! source tree and returns them as JSON data, for tooling that needs design
//! tokens (colors, spacing, breakpoints) outside of the stylesheets.
//!
//! # Basic Usage
//!
//! ```no_run
//! use sassvars::{extract, Result};
//!
//! fn main() -> Result<()> {
//!     let variables = extract("styles/main.scss", &["node_modules"])?;
//!     println!("{}", serde_json::Value::Object(variables));
//!     Ok(())
//! }
//! ```
//!
//! # Extraction Pipeline
//!
//! 1. **Session**: generate a unique token and a synthetic program that imports
//!    the entry point, the bundled JSON encoder, and the token itself
//! 2. **Import hook**: every import the compiler meets is resolved with the
//!    compiler's own lookup rules and scraped for `$variable` names
//! 3. **Sentinel**: the token import is answered with a rule that serializes the
//!    value of every scraped name that exists as a global
//! 4. **Extraction**: the marker declaration is located in the compiled output,
//!    decoded, and stripped of unresolved (`null`) entries
//!
//! The stylesheet compiler is pluggable through [`StylesheetCompiler`]; the
//! default `grass` feature provides [`GrassCompiler`].

#[cfg(feature = "grass")]
pub mod cli;
pub mod compiler;
pub mod error;
pub mod extractor;
pub mod importer;
pub mod resolver;
pub mod session;
pub mod types;
pub mod variables;

use std::path::{Path, PathBuf};

// Re-export commonly used types and functions
pub use compiler::{RenderRequest, StylesheetCompiler};
pub use error::{ExtractError, Result};
pub use extractor::{OutputExtractor, VariableMap};
pub use importer::{ImportHook, ImportInterceptor, ImportResult};
pub use resolver::{path_candidates, resolve_path, FileSystem, OsFileSystem};
pub use session::{generate_session_token, ExtractionSession};
pub use types::*;
pub use variables::{scrape_variables, AccumulatedVariables, VariableScraper};

#[cfg(feature = "grass")]
pub use compiler::GrassCompiler;

#[cfg(feature = "grass")]
pub use cli::EnhancedCli;

/// Extractor version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Extract the resolved variables of `entry_point` with the default compiler.
///
/// `search_roots` are searched, in order, after the importing file's own
/// directory; the entry point's directory is always added last.
#[cfg(feature = "grass")]
pub fn extract<P, R>(entry_point: P, search_roots: &[R]) -> Result<VariableMap>
where
    P: AsRef<Path>,
    R: AsRef<Path>,
{
    let options = ExtractOptions::with_search_roots(
        search_roots.iter().map(|root| root.as_ref().to_path_buf()),
    );
    extract_with_options(entry_point, &options)
}

/// Extract with custom options and the default compiler.
#[cfg(feature = "grass")]
pub fn extract_with_options<P: AsRef<Path>>(
    entry_point: P,
    options: &ExtractOptions,
) -> Result<VariableMap> {
    extract_with_compiler(&GrassCompiler, entry_point, options)
}

/// Extract with any [`StylesheetCompiler`].
pub fn extract_with_compiler<P: AsRef<Path>>(
    compiler: &dyn StylesheetCompiler,
    entry_point: P,
    options: &ExtractOptions,
) -> Result<VariableMap> {
    ExtractionSession::new(compiler, options.clone()).run(entry_point.as_ref())
}

/// Run [`extract`] on the blocking thread pool and await its single outcome.
///
/// There is no cancellation: dropping the future leaves the compilation
/// running to completion in the background.
#[cfg(feature = "grass")]
pub async fn extract_async(
    entry_point: impl Into<PathBuf>,
    search_roots: Vec<PathBuf>,
) -> Result<VariableMap> {
    let entry_point = entry_point.into();
    tokio::task::spawn_blocking(move || extract(&entry_point, search_roots.as_slice()))
        .await
        .map_err(|e| ExtractError::extraction(format!("Extraction task failed: {}", e)))?
}
