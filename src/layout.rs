use std::fs;

use camino::{Utf8Path, Utf8PathBuf};

use crate::domain::{FileLabel, SpeciesName};
use crate::error::TaxoError;

/// Where each stage reads from and writes to, one directory per species.
pub struct Layout;

impl Layout {
    pub fn species_dir(root: &Utf8Path, species: &SpeciesName) -> Utf8PathBuf {
        root.join(species.as_str())
    }

    /// `-out` prefix for makeblastdb; the tool appends its own extensions.
    pub fn database_prefix(root: &Utf8Path, species: &SpeciesName) -> Utf8PathBuf {
        Self::species_dir(root, species).join(species.as_str())
    }

    pub fn index_name(root: &Utf8Path, species: &SpeciesName) -> Utf8PathBuf {
        Self::species_dir(root, species).join(species.as_str())
    }

    pub fn harvest_fasta(root: &Utf8Path, species: &SpeciesName) -> Utf8PathBuf {
        root.join(format!("{species}.fasta"))
    }

    pub fn harvest_gff(root: &Utf8Path, species: &SpeciesName) -> Utf8PathBuf {
        root.join(format!("{species}.gff"))
    }

    pub fn species_fasta(root: &Utf8Path, species: &SpeciesName) -> Utf8PathBuf {
        root.join(format!("{species}.fasta"))
    }

    pub fn input_file(root: &Utf8Path, label: &FileLabel) -> Utf8PathBuf {
        root.join(label.as_str())
    }

    pub fn ensure_dir(path: &Utf8Path) -> Result<(), TaxoError> {
        fs::create_dir_all(path.as_std_path())
            .map_err(|err| TaxoError::Filesystem(format!("create {path}: {err}")))
    }
}

/// Regular, non-hidden files directly under `dir`, sorted by name.
pub fn list_input_files(dir: &Utf8Path) -> Result<Vec<FileLabel>, TaxoError> {
    let entries = fs::read_dir(dir.as_std_path())
        .map_err(|err| TaxoError::Filesystem(format!("read {dir}: {err}")))?;
    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|err| TaxoError::Filesystem(err.to_string()))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let name = entry
            .file_name()
            .into_string()
            .map_err(|_| TaxoError::InvalidPath(path))?;
        if name.starts_with('.') {
            continue;
        }
        names.push(name);
    }
    names.sort();
    Ok(names.into_iter().map(FileLabel::new).collect())
}
