//! Core types and constants for the variable extractor

use std::path::PathBuf;

// Import lookup conventions
pub const DEFAULT_EXTENSION: &str = ".scss";
pub const PARTIAL_PREFIX: &str = "_";

// Variable syntax
pub const VARIABLE_SIGIL: char = '$';

// Marker protocol
pub const SESSION_TOKEN_PREFIX: &str = "sass-vars-";
pub const MARKER_PROPERTY_PREFIX: &str = "json-";
pub const MARKER_PROPERTY_SUFFIX: &str = "-content";

/// Import name under which the bundled JSON encoder stylesheet is served.
pub const HELPER_IMPORT: &str = "sass-json-export";

/// Bundled stylesheet defining `json-encode($value)`.
pub const HELPER_SOURCE: &str = include_str!("../stylesheets/_json-encode.scss");

/// Settings for one extraction call.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Extra directories searched after the importing file's own directory
    pub search_roots: Vec<PathBuf>,

    /// Extension appended to import references that have none
    pub default_extension: String,

    /// Import name that resolves to the bundled JSON encoder
    pub helper_import: String,

    /// Log the synthetic program and extraction details at info level
    pub debug_mode: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            search_roots: Vec::new(),
            default_extension: DEFAULT_EXTENSION.to_string(),
            helper_import: HELPER_IMPORT.to_string(),
            debug_mode: false,
        }
    }
}

impl ExtractOptions {
    pub fn with_search_roots<I, P>(roots: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            search_roots: roots.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }
}

/// Name of the marker property the synthetic rule writes the payload to.
pub fn marker_property(token: &str) -> String {
    format!("{}{}{}", MARKER_PROPERTY_PREFIX, token, MARKER_PROPERTY_SUFFIX)
}
