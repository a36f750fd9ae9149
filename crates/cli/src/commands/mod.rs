//! CLI subcommands.

pub mod delivery;
pub mod price;
pub mod quote;

use std::path::{Path, PathBuf};

use bazaar_storefront::{ApiClient, ApiError, ConfigError, StorefrontConfig};
use serde::de::DeserializeOwned;
use thiserror::Error;

/// Errors loading a local fixture file.
#[derive(Debug, Error)]
pub enum FixtureError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Invalid YAML in {path}: {source}")]
    Yaml {
        path: PathBuf,
        source: serde_yaml::Error,
    },
}

/// Load a list of records from a JSON or YAML file.
///
/// `.yaml` and `.yml` files are parsed as YAML, everything else as JSON.
pub async fn load_fixture<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, FixtureError> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| FixtureError::Io {
            path: path.to_path_buf(),
            source,
        })?;

    let is_yaml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));

    if is_yaml {
        serde_yaml::from_str(&contents).map_err(|source| FixtureError::Yaml {
            path: path.to_path_buf(),
            source,
        })
    } else {
        serde_json::from_str(&contents).map_err(|source| FixtureError::Json {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Errors building an API client from the environment.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Build an API client from `BAZAAR_*` environment variables.
pub fn api_client() -> Result<ApiClient, ClientError> {
    let config = StorefrontConfig::from_env()?;
    tracing::debug!(config = ?config.api, "Loaded API configuration");
    Ok(ApiClient::new(&config.api)?)
}
