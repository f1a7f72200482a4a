use std::fmt;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::TaxoError;

/// Name of an input file, usually `<taxid>.<ext>` or `<label>.<ext>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileLabel(String);

impl FileLabel {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Everything before the first `.`.
    pub fn stem(&self) -> &str {
        self.0.split('.').next().unwrap_or_default()
    }

    pub fn tax_id(&self) -> Result<u64, TaxoError> {
        let stem = self.stem().trim();
        let is_numeric = !stem.is_empty() && stem.chars().all(|ch| ch.is_ascii_digit());
        if !is_numeric {
            return Err(TaxoError::InvalidTaxId(stem.to_string()));
        }
        stem.parse()
            .map_err(|_| TaxoError::InvalidTaxId(stem.to_string()))
    }
}

impl fmt::Display for FileLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for FileLabel {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Species directory name: `Genus_species`, or the fallback label when lookup gives nothing.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpeciesName(String);

impl SpeciesName {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn from_scientific(name: &str) -> Self {
        Self(name.replace(' ', "_"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn display_name(&self) -> String {
        self.0.replace('_', " ")
    }
}

impl fmt::Display for SpeciesName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DbType {
    #[default]
    Nucl,
    Prot,
}

impl fmt::Display for DbType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DbType::Nucl => write!(f, "nucl"),
            DbType::Prot => write!(f, "prot"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Database,
    Index,
    Harvest,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Database => write!(f, "database"),
            Stage::Index => write!(f, "index"),
            Stage::Harvest => write!(f, "harvest"),
        }
    }
}
