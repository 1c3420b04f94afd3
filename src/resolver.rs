//! Import path resolution
//!
//! Reproduces the stylesheet compiler's lookup rules for `@import` references
//! from outside the compiler:
//!
//! - an extension-less reference gets the default extension appended
//! - a partial (`_name.scss`) is preferred over a plain file (`name.scss`)
//! - the importing file's directory is searched before the search roots,
//!   and the roots are searched in the order given

use crate::error::{ExtractError, Result};
use crate::types::PARTIAL_PREFIX;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

/// The file system operations import resolution needs.
pub trait FileSystem {
    /// Whether `path` exists and is a regular file. Symlinks are followed.
    fn is_file(&self, path: &Path) -> bool;

    fn read_to_string(&self, path: &Path) -> io::Result<String>;
}

/// [`FileSystem`] backed by `std::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsFileSystem;

impl FileSystem for OsFileSystem {
    fn is_file(&self, path: &Path) -> bool {
        fs::metadata(path).map(|meta| meta.is_file()).unwrap_or(false)
    }

    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        fs::read_to_string(path)
    }
}

impl<T: FileSystem + ?Sized> FileSystem for &T {
    fn is_file(&self, path: &Path) -> bool {
        (**self).is_file(path)
    }

    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        (**self).read_to_string(path)
    }
}

/// Compute every path an import reference may point to, highest priority first.
///
/// The order is: partial then plain file next to `importing_file`, then partial
/// then plain file under each search root in turn. Duplicates are kept.
pub fn path_candidates<P: AsRef<Path>>(
    import_ref: &str,
    importing_file: &Path,
    search_roots: &[P],
    default_extension: &str,
) -> Vec<PathBuf> {
    let reference = Path::new(import_ref);
    let subdir = reference.parent().unwrap_or_else(|| Path::new(""));

    let mut base_name = reference
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| import_ref.to_string());
    if Path::new(&base_name).extension().is_none() {
        base_name.push_str(default_extension);
    }
    let partial_name = format!("{}{}", PARTIAL_PREFIX, base_name);

    let importing_dir = importing_file.parent().unwrap_or_else(|| Path::new(""));
    let bases = std::iter::once(importing_dir).chain(search_roots.iter().map(AsRef::as_ref));

    let mut candidates = Vec::with_capacity(2 * (search_roots.len() + 1));
    for base in bases {
        let dir = base.join(subdir);
        candidates.push(normalize_path(&dir.join(&partial_name)));
        candidates.push(normalize_path(&dir.join(&base_name)));
    }
    candidates
}

/// Return the first candidate that exists as a regular file.
///
/// Candidates are tried strictly in order, so a later match never wins over an
/// earlier one.
pub fn resolve_path<F: FileSystem + ?Sized>(
    import_ref: &str,
    candidates: Vec<PathBuf>,
    fs: &F,
) -> Result<PathBuf> {
    match candidates.iter().position(|candidate| fs.is_file(candidate)) {
        Some(index) => {
            let mut candidates = candidates;
            Ok(candidates.swap_remove(index))
        }
        None => Err(ExtractError::not_found(import_ref, candidates)),
    }
}

/// Lexically normalize a path: drop `.` segments and fold `..` into the
/// preceding component where there is one. The file system is not consulted.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match normalized.components().next_back() {
                Some(Component::Normal(_)) => {
                    normalized.pop();
                }
                // `/..` is `/`
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => normalized.push(".."),
            },
            other => normalized.push(other.as_os_str()),
        }
    }

    if normalized.as_os_str().is_empty() {
        normalized.push(".");
    }
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use tempfile::TempDir;

    struct FakeFileSystem {
        files: HashSet<PathBuf>,
    }

    impl FakeFileSystem {
        fn with_files(files: &[&str]) -> Self {
            Self {
                files: files.iter().map(PathBuf::from).collect(),
            }
        }
    }

    impl FileSystem for FakeFileSystem {
        fn is_file(&self, path: &Path) -> bool {
            self.files.contains(path)
        }

        fn read_to_string(&self, _path: &Path) -> io::Result<String> {
            Ok(String::new())
        }
    }

    fn paths(items: &[&str]) -> Vec<PathBuf> {
        items.iter().map(PathBuf::from).collect()
    }

    #[test]
    fn test_candidate_order() {
        let candidates = path_candidates(
            "vars",
            Path::new("/project/styles/main.scss"),
            &["/lib/a", "/lib/b"],
            ".scss",
        );

        assert_eq!(
            candidates,
            paths(&[
                "/project/styles/_vars.scss",
                "/project/styles/vars.scss",
                "/lib/a/_vars.scss",
                "/lib/a/vars.scss",
                "/lib/b/_vars.scss",
                "/lib/b/vars.scss",
            ])
        );
    }

    #[test]
    fn test_default_extension_appended_once() {
        let without = path_candidates::<&str>("colors", Path::new("main.scss"), &[], ".scss");
        assert_eq!(without, paths(&["_colors.scss", "colors.scss"]));

        let with = path_candidates::<&str>("colors.scss", Path::new("main.scss"), &[], ".scss");
        assert_eq!(with, paths(&["_colors.scss", "colors.scss"]));

        let other = path_candidates::<&str>("colors.css", Path::new("main.scss"), &[], ".scss");
        assert_eq!(other, paths(&["_colors.css", "colors.css"]));
    }

    #[test]
    fn test_custom_default_extension() {
        let candidates = path_candidates::<&str>("theme", Path::new("/a/b.sass"), &[], ".sass");
        assert_eq!(candidates, paths(&["/a/_theme.sass", "/a/theme.sass"]));
    }

    #[test]
    fn test_subdirectory_reference() {
        let candidates = path_candidates(
            "base/typography",
            Path::new("/project/main.scss"),
            &["/vendor"],
            ".scss",
        );

        assert_eq!(
            candidates,
            paths(&[
                "/project/base/_typography.scss",
                "/project/base/typography.scss",
                "/vendor/base/_typography.scss",
                "/vendor/base/typography.scss",
            ])
        );
    }

    #[test]
    fn test_parent_segments_are_normalized() {
        let candidates = path_candidates::<&str>(
            "../shared/./tokens",
            Path::new("/project/styles/main.scss"),
            &[],
            ".scss",
        );

        assert_eq!(
            candidates,
            paths(&["/project/shared/_tokens.scss", "/project/shared/tokens.scss"])
        );
    }

    #[test]
    fn test_absolute_reference_replaces_base() {
        let candidates = path_candidates(
            "/abs/entry.scss",
            Path::new("/elsewhere/main.scss"),
            &["/root"],
            ".scss",
        );

        assert_eq!(candidates[1], PathBuf::from("/abs/entry.scss"));
        assert!(candidates.iter().all(|c| c.starts_with("/abs")));
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path(Path::new("a/./b/../c")), PathBuf::from("a/c"));
        assert_eq!(normalize_path(Path::new("../a")), PathBuf::from("../a"));
        assert_eq!(normalize_path(Path::new("/../a")), PathBuf::from("/a"));
        assert_eq!(normalize_path(Path::new("./")), PathBuf::from("."));
        assert_eq!(normalize_path(Path::new("a/..")), PathBuf::from("."));
    }

    #[test]
    fn test_resolve_returns_first_existing() {
        let fs = FakeFileSystem::with_files(&["/lib/a/vars.scss", "/lib/b/_vars.scss"]);
        let candidates = path_candidates(
            "vars",
            Path::new("/project/main.scss"),
            &["/lib/a", "/lib/b"],
            ".scss",
        );

        let resolved = resolve_path("vars", candidates, &fs).unwrap();
        assert_eq!(resolved, PathBuf::from("/lib/a/vars.scss"));
    }

    #[test]
    fn test_partial_wins_over_plain() {
        let fs = FakeFileSystem::with_files(&["/p/_vars.scss", "/p/vars.scss"]);
        let candidates = path_candidates::<&str>("vars", Path::new("/p/main.scss"), &[], ".scss");

        let resolved = resolve_path("vars", candidates, &fs).unwrap();
        assert_eq!(resolved, PathBuf::from("/p/_vars.scss"));
    }

    #[test]
    fn test_resolve_not_found() {
        let fs = FakeFileSystem::with_files(&[]);
        let candidates = path_candidates::<&str>("missing", Path::new("/p/main.scss"), &[], ".scss");

        match resolve_path("missing", candidates, &fs) {
            Err(ExtractError::NotFound { reference, candidates }) => {
                assert_eq!(reference, "missing");
                assert_eq!(candidates.len(), 2);
            }
            other => panic!("Expected NotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_os_file_system_ignores_directories() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("_vars.scss");
        fs::create_dir(&dir).unwrap();
        let file = temp_dir.path().join("vars.scss");
        fs::write(&file, "$x: 1;").unwrap();

        let candidates = vec![dir.clone(), file.clone()];
        let resolved = resolve_path("vars", candidates, &OsFileSystem).unwrap();

        assert_eq!(resolved, file);
        assert!(!OsFileSystem.is_file(&dir));
    }
}
