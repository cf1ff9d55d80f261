//! Photo library scanning.

use std::path::{Path, PathBuf};

use walkdir::{DirEntry, WalkDir};

use crate::error::Error;

const SUPPORTED_EXTS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

/// Return `true` if `path` has an extension the loader can decode.
#[must_use]
pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .is_some_and(|ext| {
            let ext = ext.to_ascii_lowercase();
            SUPPORTED_EXTS.iter().any(|e| *e == ext)
        })
}

/// Recursively collect the images below `root`, sorted by path so the grid
/// layout is stable between runs.
///
/// # Errors
/// Returns [`Error::BadDir`] if `root` is missing or not a directory and
/// [`Error::EmptyScan`] if no supported image was found.
pub fn scan_library(root: &Path) -> Result<Vec<PathBuf>, Error> {
    if !root.is_dir() {
        return Err(Error::BadDir(root.display().to_string()));
    }

    let mut out: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_entry(|e| !should_skip_dir(e))
        .flatten()
        .filter(|entry| entry.file_type().is_file() && is_supported_image(entry.path()))
        .map(|entry| entry.into_path())
        .collect();

    if out.is_empty() {
        return Err(Error::EmptyScan(root.display().to_string()));
    }
    out.sort();
    Ok(out)
}

fn should_skip_dir(entry: &DirEntry) -> bool {
    // Never skip the root; tempfile roots can be dot-dirs.
    if entry.depth() == 0 || !entry.file_type().is_dir() {
        return false;
    }
    entry
        .file_name()
        .to_str()
        .is_some_and(|n| n.starts_with('.'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn extension_match_is_case_insensitive() {
        assert!(is_supported_image(Path::new("a/b/IMG_0001.JPG")));
        assert!(is_supported_image(Path::new("x.webp")));
        assert!(!is_supported_image(Path::new("notes.txt")));
        assert!(!is_supported_image(Path::new("no_extension")));
    }

    #[test]
    fn skips_hidden_dirs_and_sorts() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        fs::write(root.join("b.png"), b"x").unwrap();
        fs::write(root.join("a.jpg"), b"x").unwrap();
        fs::create_dir_all(root.join(".thumbs")).unwrap();
        fs::write(root.join(".thumbs").join("c.jpg"), b"x").unwrap();
        fs::create_dir_all(root.join("sub")).unwrap();
        fs::write(root.join("sub").join("d.gif"), b"x").unwrap();
        fs::write(root.join("readme.md"), b"x").unwrap();

        let found = scan_library(root).unwrap();
        assert_eq!(
            found,
            vec![
                root.join("a.jpg"),
                root.join("b.png"),
                root.join("sub").join("d.gif"),
            ]
        );
    }

    #[test]
    fn rejects_missing_and_empty_dirs() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(matches!(
            scan_library(&tmp.path().join("missing")),
            Err(Error::BadDir(_))
        ));
        assert!(matches!(scan_library(tmp.path()), Err(Error::EmptyScan(_))));
    }
}
