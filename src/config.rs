use std::fs;
use std::path::PathBuf;

use camino::Utf8PathBuf;
use directories::BaseDirs;
use serde::{Deserialize, Serialize};

use crate::domain::DbType;
use crate::error::TaxoError;
use crate::registry::SpeciesRegistry;
use crate::retry::{DEFAULT_MAX_ATTEMPTS, RetryPolicy};
use crate::taxonomy::EntrezCredentials;
use crate::tools::ToolPrograms;

pub const CONFIG_FILE_NAME: &str = "taxodb.json";

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub schema_version: Option<u32>,
    #[serde(default)]
    pub entrez: EntrezCredentials,
    #[serde(default)]
    pub max_attempts: Option<usize>,
    #[serde(default)]
    pub display_warning: Option<bool>,
    #[serde(default)]
    pub species: Vec<String>,
    #[serde(default)]
    pub tools: ToolPrograms,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub db_type: Option<DbType>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct PathsConfig {
    #[serde(default)]
    pub input_dir: Option<Utf8PathBuf>,
    #[serde(default)]
    pub db_dir: Option<Utf8PathBuf>,
    #[serde(default)]
    pub index_dir: Option<Utf8PathBuf>,
    #[serde(default)]
    pub harvest_dir: Option<Utf8PathBuf>,
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub schema_version: u32,
    pub credentials: EntrezCredentials,
    pub retry: RetryPolicy,
    pub registry: SpeciesRegistry,
    pub tools: ToolPrograms,
    pub paths: PathsConfig,
    pub db_type: DbType,
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Explicit path must exist. Otherwise `taxodb.json` in the working directory, then the
    /// user config directory, then built-in defaults.
    pub fn resolve(path: Option<&str>) -> Result<ResolvedConfig, TaxoError> {
        let config = match path {
            Some(path) => {
                let config_path = PathBuf::from(path);
                if !config_path.exists() {
                    return Err(TaxoError::MissingConfig(config_path));
                }
                Self::read(config_path)?
            }
            None => match Self::default_locations().into_iter().find(|p| p.exists()) {
                Some(config_path) => Self::read(config_path)?,
                None => Config::default(),
            },
        };

        let mut resolved = Self::resolve_config(config)?;
        Self::apply_env(&mut resolved.credentials);
        Ok(resolved)
    }

    pub fn resolve_config(config: Config) -> Result<ResolvedConfig, TaxoError> {
        let schema_version = config.schema_version.unwrap_or(1);
        if schema_version != 1 {
            return Err(TaxoError::ConfigParse(format!(
                "unsupported schema_version {schema_version}"
            )));
        }

        let retry = RetryPolicy::new(
            config.max_attempts.unwrap_or(DEFAULT_MAX_ATTEMPTS),
            config.display_warning.unwrap_or(true),
        );

        Ok(ResolvedConfig {
            schema_version,
            credentials: config.entrez,
            retry,
            registry: SpeciesRegistry::new(config.species),
            tools: config.tools,
            paths: config.paths,
            db_type: config.db_type.unwrap_or_default(),
        })
    }

    fn read(config_path: PathBuf) -> Result<Config, TaxoError> {
        let content = fs::read_to_string(&config_path)
            .map_err(|_| TaxoError::ConfigRead(config_path.clone()))?;
        serde_json::from_str(&content).map_err(|err| TaxoError::ConfigParse(err.to_string()))
    }

    fn default_locations() -> Vec<PathBuf> {
        let mut locations = vec![PathBuf::from(CONFIG_FILE_NAME)];
        if let Some(dirs) = BaseDirs::new() {
            locations.push(dirs.config_dir().join("taxodb").join(CONFIG_FILE_NAME));
        }
        locations
    }

    fn apply_env(credentials: &mut EntrezCredentials) {
        if let Ok(api_key) = std::env::var("NCBI_API_KEY") {
            if !api_key.trim().is_empty() {
                credentials.api_key = Some(api_key.trim().to_string());
            }
        }
        if let Ok(email) = std::env::var("ENTREZ_EMAIL") {
            if !email.trim().is_empty() {
                credentials.email = Some(email.trim().to_string());
            }
        }
    }
}
