/*
 *  Copyright 2025-2026 Colliery Software
 *
 *  Licensed under the Apache License, Version 2.0 (the "License");
 *  you may not use this file except in compliance with the License.
 *  You may obtain a copy of the License at
 *
 *      http://www.apache.org/licenses/LICENSE-2.0
 *
 *  Unless required by applicable law or agreed to in writing, software
 *  distributed under the License is distributed on an "AS IS" BASIS,
 *  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 *  See the License for the specific language governing permissions and
 *  limitations under the License.
 */

use regex::Regex;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::error::ConfigError;
use super::types::JobSyncConfig;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV_VAR: &str = "JOBSYNC_CONFIG";

pub struct ConfigLoader {
    search_paths: Vec<PathBuf>,
}

impl ConfigLoader {
    /// Create a new config loader with default search paths
    pub fn new() -> Self {
        let mut search_paths = vec![PathBuf::from("./jobsync.toml")];

        if let Some(config_dir) = dirs::config_dir() {
            search_paths.push(config_dir.join("jobsync").join("config.toml"));
        }

        search_paths.push(PathBuf::from("/etc/jobsync/config.toml"));

        Self { search_paths }
    }

    /// Create a config loader with custom search paths
    pub fn with_search_paths(search_paths: Vec<PathBuf>) -> Self {
        Self { search_paths }
    }

    /// Loads the named file, else `$JOBSYNC_CONFIG`, else the first file
    /// found on the search path.
    pub fn load_config(&self, config_file: Option<&Path>) -> Result<JobSyncConfig, ConfigError> {
        let config_path = if let Some(path) = config_file {
            path.to_path_buf()
        } else if let Ok(env_config) = env::var(CONFIG_ENV_VAR) {
            PathBuf::from(env_config)
        } else {
            self.find_config_file().ok_or(ConfigError::ConfigNotFound)?
        };

        self.load_config_from_file(&config_path)
    }

    /// Like [`load_config`](Self::load_config), but falls back to defaults
    /// when no file exists anywhere on the search path.
    pub fn load_or_default(&self, config_file: Option<&Path>) -> Result<JobSyncConfig, ConfigError> {
        match self.load_config(config_file) {
            Err(ConfigError::ConfigNotFound) => {
                debug!("No configuration file found, using defaults");
                Ok(JobSyncConfig::default())
            }
            other => other,
        }
    }

    /// Load configuration from a specific file
    pub fn load_config_from_file(&self, path: &Path) -> Result<JobSyncConfig, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;

        let substituted = substitute_env_vars(&content)?;

        let config = match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") | None => toml::from_str::<JobSyncConfig>(&substituted)?,
            Some(ext) => {
                return Err(ConfigError::UnsupportedFormat {
                    extension: ext.to_string(),
                })
            }
        };

        config.validate()?;
        debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Find the first existing configuration file in search paths
    pub fn find_config_file(&self) -> Option<PathBuf> {
        self.search_paths
            .iter()
            .find(|path| path.is_file())
            .cloned()
    }

    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Expands `${VAR}`, `${VAR:-default}` and `${VAR:?message}`.
fn substitute_env_vars(content: &str) -> Result<String, ConfigError> {
    let re = Regex::new(r"\$\{([^}]+)\}")
        .map_err(|e| ConfigError::EnvSubstitutionError(e.to_string()))?;
    let mut result = content.to_string();

    for cap in re.captures_iter(content) {
        let replacement = process_var_expression(&cap[1])?;
        result = result.replace(&cap[0], &replacement);
    }

    Ok(result)
}

fn process_var_expression(expr: &str) -> Result<String, ConfigError> {
    if let Some((var_name, default_value)) = expr.split_once(":-") {
        Ok(env::var(var_name).unwrap_or_else(|_| default_value.to_string()))
    } else if let Some((var_name, message)) = expr.split_once(":?") {
        env::var(var_name).map_err(|_| {
            ConfigError::EnvSubstitutionError(format!(
                "Required environment variable '{}' is not set: {}",
                var_name, message
            ))
        })
    } else {
        env::var(expr).map_err(|_| {
            ConfigError::EnvSubstitutionError(format!(
                "Required environment variable '{}' is not set",
                expr
            ))
        })
    }
}
