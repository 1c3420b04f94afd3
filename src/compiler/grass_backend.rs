//! `grass` compiler backend
//!
//! grass performs its own import lookup and exposes no importer callback, only
//! a replaceable file system. The hook is driven from that file system:
//!
//! - a probe for a path that does not exist asks the hook about the bare
//!   import name; a `Source` answer turns the path into a virtual file
//! - every real file grass reads is reported to the hook by its absolute path
//!   before the bytes are handed over

use super::{RenderRequest, StylesheetCompiler};
use crate::importer::{ImportHook, ImportResult};
use crate::types::PARTIAL_PREFIX;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

const STYLESHEET_EXTENSIONS: &[&str] = &[".scss", ".sass", ".css"];
const VIRTUAL_EXTENSION: &str = "scss";

/// [`StylesheetCompiler`] backed by the `grass` Sass compiler.
#[derive(Debug, Clone, Copy, Default)]
pub struct GrassCompiler;

impl GrassCompiler {
    pub fn new() -> Self {
        Self
    }
}

impl StylesheetCompiler for GrassCompiler {
    fn render(&self, request: RenderRequest<'_>) -> std::result::Result<String, String> {
        let RenderRequest {
            source,
            search_roots,
            hook,
        } = request;

        let hooked_fs = HookedFs::new(hook);
        let mut options = grass::Options::default()
            .fs(&hooked_fs)
            .style(grass::OutputStyle::Expanded);
        for root in &search_roots {
            options = options.load_path(root);
        }

        grass::from_string(source, &options).map_err(|e| e.to_string())
    }
}

struct HookedFs<'a> {
    hook: RefCell<&'a mut dyn ImportHook>,
    virtual_files: RefCell<HashMap<PathBuf, String>>,
    probed: RefCell<HashSet<(PathBuf, String)>>,
}

impl<'a> HookedFs<'a> {
    fn new(hook: &'a mut dyn ImportHook) -> Self {
        Self {
            hook: RefCell::new(hook),
            virtual_files: RefCell::new(HashMap::new()),
            probed: RefCell::new(HashSet::new()),
        }
    }

    /// Ask the hook once per directory and import name whether it serves the
    /// import itself. Hook sources are SCSS, so only `.scss` probe paths can
    /// become virtual files; grass would parse any other extension with a
    /// different syntax.
    fn probe_virtual(&self, path: &Path) -> bool {
        if path.extension().and_then(|ext| ext.to_str()) != Some(VIRTUAL_EXTENSION) {
            return false;
        }
        let Some(reference) = import_reference(path) else {
            return false;
        };

        let directory = path.parent().map(Path::to_path_buf).unwrap_or_default();
        if !self.probed.borrow_mut().insert((directory, reference.clone())) {
            return false;
        }

        match self.hook.borrow_mut().import(&reference, path) {
            ImportResult::Source(source) => {
                log::trace!("Serving '{}' as virtual file {}", reference, path.display());
                self.virtual_files
                    .borrow_mut()
                    .insert(path.to_path_buf(), source);
                true
            }
            ImportResult::Resolved(_) | ImportResult::Declined => false,
        }
    }
}

impl fmt::Debug for HookedFs<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookedFs").finish_non_exhaustive()
    }
}

impl grass::Fs for HookedFs<'_> {
    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn is_file(&self, path: &Path) -> bool {
        if self.virtual_files.borrow().contains_key(path) || path.is_file() {
            return true;
        }
        self.probe_virtual(path)
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        if let Some(source) = self.virtual_files.borrow().get(path) {
            return Ok(source.clone().into_bytes());
        }

        let absolute = absolutize(path);
        let reference = absolute.to_string_lossy().into_owned();
        match self.hook.borrow_mut().import(&reference, &absolute) {
            ImportResult::Source(source) => Ok(source.into_bytes()),
            ImportResult::Resolved(resolved) => {
                if resolved != absolute {
                    log::debug!(
                        "Hook resolved {} to {}; compiling the former",
                        absolute.display(),
                        resolved.display()
                    );
                }
                fs::read(path)
            }
            ImportResult::Declined => fs::read(path),
        }
    }
}

/// Recover the import name grass is probing for: `dir/_name.import.scss` -> `name`.
fn import_reference(path: &Path) -> Option<String> {
    let file_name = path.file_name()?.to_str()?;
    let stem = STYLESHEET_EXTENSIONS
        .iter()
        .find_map(|ext| file_name.strip_suffix(ext))
        .unwrap_or(file_name);
    let stem = stem.strip_suffix(".import").unwrap_or(stem);
    let stem = stem.strip_prefix(PARTIAL_PREFIX).unwrap_or(stem);

    if stem.is_empty() {
        None
    } else {
        Some(stem.to_string())
    }
}

fn absolutize(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .unwrap_or_else(|_| path.to_path_buf())
}
