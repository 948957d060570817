//! Test helpers for preparing CLI workspaces and datasets.

use base64::{Engine as _, engine::general_purpose};
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;
use tempfile::TempDir;

/// Temporary directory addressed through UTF-8 paths.
#[derive(Debug)]
pub(super) struct Workspace {
    _dir: TempDir,
    root: Utf8PathBuf,
}

impl Workspace {
    pub(super) fn new() -> Self {
        let dir = TempDir::new().expect("tempdir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 workspace");
        Self { _dir: dir, root }
    }

    pub(super) fn root(&self) -> &Utf8Path {
        &self.root
    }

    pub(super) fn path(&self, name: &str) -> Utf8PathBuf {
        self.root.join(name)
    }

    /// Write `contents` to `name` inside the workspace and return its path.
    pub(super) fn file(&self, name: &str, contents: &str) -> Utf8PathBuf {
        let path = self.path(name);
        write_utf8(&path, contents.as_bytes());
        path
    }
}

pub(super) fn write_utf8(path: &Utf8Path, contents: &[u8]) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent directory");
    }
    fs::write(path, contents).expect("write file");
}

/// Decode the Base64 PBF fixture `stem` into the workspace.
pub(super) fn decode_pbf_fixture(root: &Utf8Path, stem: &str) -> Utf8PathBuf {
    let encoded_path = Utf8PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(format!("{stem}.osm.pbf.b64"));
    let encoded = fs::read_to_string(&encoded_path)
        .unwrap_or_else(|err| panic!("failed to read fixture {encoded_path}: {err}"));
    let cleaned: String = encoded
        .chars()
        .filter(|ch| !ch.is_ascii_whitespace())
        .collect();
    let decoded = general_purpose::STANDARD
        .decode(cleaned.as_bytes())
        .unwrap_or_else(|err| panic!("failed to decode fixture {encoded_path}: {err}"));
    let target = root.join(format!("{stem}.osm.pbf"));
    write_utf8(&target, &decoded);
    target
}
