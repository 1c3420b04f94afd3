//! Stylesheet compiler interface
//!
//! The extractor never evaluates stylesheets itself. It hands a synthetic
//! program to a [`StylesheetCompiler`] together with an [`ImportHook`] and reads
//! the compiled text back.

#[cfg(feature = "grass")]
mod grass_backend;

#[cfg(feature = "grass")]
pub use grass_backend::GrassCompiler;

use crate::importer::ImportHook;
use std::path::PathBuf;

/// One compiler invocation.
pub struct RenderRequest<'a> {
    /// Stylesheet source to compile
    pub source: String,

    /// Directories searched for imports after the importing file's directory
    pub search_roots: Vec<PathBuf>,

    /// Called synchronously for every import directive, in document order,
    /// recursively for nested imports
    pub hook: &'a mut dyn ImportHook,
}

impl std::fmt::Debug for RenderRequest<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderRequest")
            .field("source", &self.source)
            .field("search_roots", &self.search_roots)
            .finish_non_exhaustive()
    }
}

/// A stylesheet compiler that supports import hooks.
///
/// `render` returns the compiled text, or the compiler's own error message.
pub trait StylesheetCompiler: Send + Sync {
    fn render(&self, request: RenderRequest<'_>) -> std::result::Result<String, String>;
}

impl<C: StylesheetCompiler + ?Sized> StylesheetCompiler for &C {
    fn render(&self, request: RenderRequest<'_>) -> std::result::Result<String, String> {
        (**self).render(request)
    }
}

impl<C: StylesheetCompiler + ?Sized> StylesheetCompiler for Box<C> {
    fn render(&self, request: RenderRequest<'_>) -> std::result::Result<String, String> {
        (**self).render(request)
    }
}
