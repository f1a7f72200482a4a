use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum TaxoError {
    #[error("invalid taxid: {0}")]
    InvalidTaxId(String),

    #[error("taxonomy request failed: {0}")]
    TaxonomyHttp(String),

    #[error("taxonomy service returned status {status}: {message}")]
    TaxonomyStatus { status: u16, message: String },

    #[error("taxonomy service error: {0}")]
    TaxonomyService(String),

    #[error("failed to retrieve species name for {file} after {attempts} retries")]
    ResolutionExhausted {
        file: String,
        attempts: usize,
        #[source]
        source: Box<TaxoError>,
    },

    #[error("required tool not found: {0}")]
    MissingTool(String),

    #[error("failed to start {program}: {message}")]
    ToolSpawn { program: String, message: String },

    #[error("{program} exited with {status}: {stderr}")]
    ToolFailed {
        program: String,
        status: String,
        stderr: String,
    },

    #[error("filesystem error: {0}")]
    Filesystem(String),

    #[error("path is not valid UTF-8: {0}")]
    InvalidPath(PathBuf),

    #[error("missing config file {0}")]
    MissingConfig(PathBuf),

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("missing required path: {0}")]
    MissingPath(&'static str),
}
