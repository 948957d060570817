//! Filesystem helpers shared by the poimap crates.
//!
//! All access goes through `cap-std` directory handles opened with ambient
//! authority, so paths are always resolved relative to an explicit base
//! directory rather than the process working directory implicitly.
#![forbid(unsafe_code)]

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::{ambient_authority, fs_utf8};
use std::io::{self, Read};
use std::path::Component;

/// Open a UTF-8 file path for reading.
pub fn open_utf8_file(path: &Utf8Path) -> io::Result<fs_utf8::File> {
    fs_utf8::File::open_ambient(path, ambient_authority())
}

/// Read a whole UTF-8 text file, such as a rule table or a tag map.
pub fn read_utf8_to_string(path: &Utf8Path) -> io::Result<String> {
    let mut file = open_utf8_file(path)?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)?;
    Ok(contents)
}

/// Return whether `path` exists and is a regular file.
///
/// A missing file surfaces as an `io::ErrorKind::NotFound` error so callers
/// can distinguish "absent" from "present but a directory".
pub fn file_is_file(path: &Utf8Path) -> io::Result<bool> {
    let (parent, name) = split_file_name(path)?;
    let dir = fs_utf8::Dir::open_ambient_dir(parent, ambient_authority())?;
    dir.metadata(name).map(|meta| meta.is_file())
}

/// Return whether `path` names an existing directory.
///
/// Unlike [`file_is_file`], a missing path (or missing parent) is `Ok(false)`:
/// output paths are usually checked before they are created.
pub fn is_dir(path: &Utf8Path) -> io::Result<bool> {
    let (parent, name) = split_file_name(path)?;
    let metadata = fs_utf8::Dir::open_ambient_dir(parent, ambient_authority())
        .and_then(|dir| dir.metadata(name));
    match metadata {
        Ok(meta) => Ok(meta.is_dir()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(err) => Err(err),
    }
}

/// Split `path` into its parent directory (`.` when relative and bare) and
/// final component.
fn split_file_name(path: &Utf8Path) -> io::Result<(&Utf8Path, &str)> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_str().is_empty() => parent,
        _ => Utf8Path::new("."),
    };
    let name = path
        .file_name()
        .ok_or_else(|| io::Error::other("path should include a file name"))?;
    Ok((parent, name))
}

/// Create the parent directory of `path` when it does not exist yet.
pub fn ensure_parent_dir(path: &Utf8Path) -> io::Result<()> {
    let Some(parent) = path.parent() else {
        return Ok(());
    };
    if parent.as_str().is_empty() || parent == Utf8Path::new("/") {
        return Ok(());
    }

    let (base_dir, relative) = split_base_dir(parent)?;
    if relative.as_str().is_empty() {
        return Ok(());
    }
    base_dir.create_dir_all(&relative)
}

/// Split a directory path into an opened base directory and the remainder
/// relative to it. Absolute paths are anchored at the filesystem root (or
/// drive prefix on Windows), relative paths at `.`.
fn split_base_dir(dir: &Utf8Path) -> io::Result<(fs_utf8::Dir, Utf8PathBuf)> {
    let std_dir = dir.as_std_path();

    let (base, relative) = match std_dir.components().next() {
        Some(Component::Prefix(prefix)) => {
            let prefix_str = prefix
                .as_os_str()
                .to_str()
                .ok_or_else(|| io::Error::other("non-UTF-8 path prefix"))?;
            let base = Utf8PathBuf::from(prefix_str).join(std::path::MAIN_SEPARATOR.to_string());
            let relative = std_dir
                .strip_prefix(base.as_std_path())
                .or_else(|_| std_dir.strip_prefix(prefix.as_os_str()))
                .map_err(|_| io::Error::other("failed to strip prefix from directory path"))?
                .to_path_buf();
            (base, relative)
        }
        Some(Component::RootDir) => {
            let base = Utf8PathBuf::from(std::path::MAIN_SEPARATOR.to_string());
            let relative = std_dir
                .strip_prefix(base.as_std_path())
                .map_err(|_| io::Error::other("failed to strip root from absolute path"))?
                .to_path_buf();
            (base, relative)
        }
        _ => (Utf8PathBuf::from("."), std_dir.to_path_buf()),
    };

    let base_dir = fs_utf8::Dir::open_ambient_dir(&base, ambient_authority())?;
    let relative = Utf8PathBuf::from_path_buf(relative)
        .map_err(|_| io::Error::other("non-UTF-8 directory path"))?;
    Ok((base_dir, relative))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};
    use std::fs;
    use tempfile::TempDir;

    #[fixture]
    fn workspace() -> (TempDir, Utf8PathBuf) {
        let dir = TempDir::new().expect("create temp dir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 path");
        (dir, root)
    }

    #[rstest]
    fn creates_nested_parent(workspace: (TempDir, Utf8PathBuf)) {
        let (_guard, root) = workspace;
        let target = root.join("a/b/pois.db");
        ensure_parent_dir(&target).expect("create parents");
        assert!(root.join("a/b").is_dir());
    }

    #[rstest]
    fn reads_text_file(workspace: (TempDir, Utf8PathBuf)) {
        let (_guard, root) = workspace;
        let path = root.join("rules.json");
        fs::write(&path, "[]").expect("write file");
        assert_eq!(read_utf8_to_string(&path).expect("read file"), "[]");
        assert!(file_is_file(&path).expect("inspect file"));
    }

    #[rstest]
    fn directories_are_not_files(workspace: (TempDir, Utf8PathBuf)) {
        let (_guard, root) = workspace;
        let nested = root.join("nested");
        fs::create_dir(&nested).expect("create dir");
        assert!(!file_is_file(&nested).expect("inspect dir"));
    }

    #[rstest]
    fn missing_file_reports_not_found(workspace: (TempDir, Utf8PathBuf)) {
        let (_guard, root) = workspace;
        let err = file_is_file(&root.join("absent.json")).expect_err("missing file");
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[rstest]
    #[case::directory("nested", true)]
    #[case::file("rules.json", false)]
    #[case::missing("absent.db", false)]
    #[case::missing_parent("absent/pois.db", false)]
    fn is_dir_reports_directories_only(
        workspace: (TempDir, Utf8PathBuf),
        #[case] name: &str,
        #[case] expected: bool,
    ) {
        let (_guard, root) = workspace;
        fs::create_dir(root.join("nested")).expect("create dir");
        fs::write(root.join("rules.json"), "[]").expect("write file");
        assert_eq!(is_dir(&root.join(name)).expect("inspect path"), expected);
    }
}
