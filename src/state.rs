use std::collections::BTreeSet;
use std::fs::{self, DirEntry};
use std::path::Path;

use camino::Utf8Path;

use crate::error::TaxoError;

/// File whose presence marks a unit of work as done.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    /// `<root>/<species>/*.ndb`
    Database,
    /// `<root>/<species>/*.esq`
    Index,
    /// `<root>/<species>.fasta`
    Harvest,
}

impl Marker {
    pub fn extension(&self) -> &'static str {
        match self {
            Marker::Database => "ndb",
            Marker::Index => "esq",
            Marker::Harvest => "fasta",
        }
    }
}

/// Names of species whose work under `root` is already complete. A missing `root`
/// has nothing complete.
pub fn completed_species(root: &Utf8Path, marker: Marker) -> Result<BTreeSet<String>, TaxoError> {
    if !root.as_std_path().is_dir() {
        return Ok(BTreeSet::new());
    }
    match marker {
        Marker::Database | Marker::Index => dirs_with_marker(root, marker.extension()),
        Marker::Harvest => top_level_stems(root, marker.extension()),
    }
}

fn dirs_with_marker(root: &Utf8Path, ext: &str) -> Result<BTreeSet<String>, TaxoError> {
    let mut out = BTreeSet::new();
    let entries = fs::read_dir(root.as_std_path())
        .map_err(|err| TaxoError::Filesystem(format!("read {root}: {err}")))?;
    for entry in entries {
        let entry = entry.map_err(|err| TaxoError::Filesystem(err.to_string()))?;
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        let name = utf8_name(&entry)?;
        if contains_ext(&path, ext)? {
            out.insert(name);
        }
    }
    Ok(out)
}

fn contains_ext(dir: &Path, ext: &str) -> Result<bool, TaxoError> {
    let entries = fs::read_dir(dir)
        .map_err(|err| TaxoError::Filesystem(format!("read {}: {err}", dir.display())))?;
    for entry in entries {
        let entry = entry.map_err(|err| TaxoError::Filesystem(err.to_string()))?;
        let path = entry.path();
        if path.is_file() && has_ext(&path, ext) {
            return Ok(true);
        }
    }
    Ok(false)
}

fn top_level_stems(root: &Utf8Path, ext: &str) -> Result<BTreeSet<String>, TaxoError> {
    let mut out = BTreeSet::new();
    let entries = fs::read_dir(root.as_std_path())
        .map_err(|err| TaxoError::Filesystem(format!("read {root}: {err}")))?;
    for entry in entries {
        let entry = entry.map_err(|err| TaxoError::Filesystem(err.to_string()))?;
        let path = entry.path();
        if !path.is_file() || !has_ext(&path, ext) {
            continue;
        }
        let name = utf8_name(&entry)?;
        if let Some(stem) = Path::new(&name).file_stem().and_then(|v| v.to_str()) {
            out.insert(stem.to_string());
        }
    }
    Ok(out)
}

fn utf8_name(entry: &DirEntry) -> Result<String, TaxoError> {
    entry
        .file_name()
        .into_string()
        .map_err(|_| TaxoError::InvalidPath(entry.path()))
}

fn has_ext(path: &Path, ext: &str) -> bool {
    path.extension()
        .and_then(|value| value.to_str())
        .map(|value| value == ext)
        .unwrap_or(false)
}
