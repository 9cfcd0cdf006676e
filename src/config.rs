//! Application configuration.
//!
//! Settings come from (lowest to highest precedence) built-in defaults, a TOML or YAML
//! file, `PORYGON_*` environment variables and finally command-line flags.
//!
//! ```toml
//! catalog_path = "data/pokemon.csv"
//! bind = "127.0.0.1:3000"
//! team_size = 6
//!
//! [filter]
//! generation_cap = 4
//! fossils = "one"
//!
//! [optimizer]
//! tie_break = "lowest_ids"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::data::{FilterOptions, DEFAULT_CATALOG_PATH, NEWEST_GENERATION};
use crate::optimizer::OptimizerOptions;
use crate::parallel::WorkerPool;

pub const CONFIG_ENV: &str = "PORYGON_CONFIG";
pub const CATALOG_ENV: &str = "PORYGON_CATALOG";
pub const BIND_ENV: &str = "PORYGON_BIND";
pub const DEFAULT_BIND: &str = "127.0.0.1:3000";
pub const DEFAULT_TEAM_SIZE: usize = 6;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    pub catalog_path: PathBuf,
    pub bind: String,
    /// Default `tracing` filter; `RUST_LOG` wins when set.
    pub log_level: String,
    pub team_size: usize,
    pub filter: FilterOptions,
    pub optimizer: OptimizerOptions,
    pub parallel: WorkerPool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            catalog_path: PathBuf::from(DEFAULT_CATALOG_PATH),
            bind: DEFAULT_BIND.to_string(),
            log_level: "info".to_string(),
            team_size: DEFAULT_TEAM_SIZE,
            filter: FilterOptions::default(),
            optimizer: OptimizerOptions::default(),
            parallel: WorkerPool::default(),
        }
    }
}

impl AppConfig {
    /// Reads a config file; `.yaml`/`.yml` is parsed as YAML, anything else as TOML.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let is_yaml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));
        let config = if is_yaml {
            Self::from_yaml_str(&contents)?
        } else {
            Self::from_toml_str(&contents)?
        };
        tracing::debug!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads `explicit`, else the file named by `PORYGON_CONFIG`, else defaults, then
    /// applies the environment overrides.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        Self::resolve_with(explicit, |key| std::env::var(key).ok())
    }

    /// [AppConfig::resolve] with an injectable environment lookup.
    pub fn resolve_with<F>(explicit: Option<&Path>, env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let from_env = env(CONFIG_ENV).filter(|value| !value.trim().is_empty()).map(PathBuf::from);
        let mut config = match explicit.map(Path::to_path_buf).or(from_env) {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        config.apply_env(env);
        config.validate()?;
        Ok(config)
    }

    fn apply_env<F>(&mut self, env: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(catalog) = env(CATALOG_ENV).filter(|value| !value.trim().is_empty()) {
            self.catalog_path = PathBuf::from(catalog);
        }
        if let Some(bind) = env(BIND_ENV).filter(|value| !value.trim().is_empty()) {
            self.bind = bind;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.team_size == 0 {
            return Err(ConfigError::Invalid("team_size must be at least 1".to_string()));
        }
        if self.bind.trim().is_empty() {
            return Err(ConfigError::Invalid("bind address must not be empty".to_string()));
        }
        let known = 1..=NEWEST_GENERATION;
        if let Some(generation) = self
            .filter
            .generation_cap
            .iter()
            .chain(&self.filter.generations)
            .find(|generation| !known.contains(*generation))
        {
            return Err(ConfigError::Invalid(format!(
                "generation {generation} is outside 1..={NEWEST_GENERATION}"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::FossilPolicy;
    use crate::optimizer::TieBreak;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn defaults_without_file_or_env() {
        let config = AppConfig::resolve_with(None, no_env).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.catalog_path, PathBuf::from("data/pokemon.csv"));
        assert_eq!(config.team_size, 6);
    }

    #[test]
    fn parses_toml_sections() {
        let config = AppConfig::from_toml_str(
            r#"
            team_size = 4

            [filter]
            generation_cap = 3
            include_legendaries = true
            fossils = "none"

            [optimizer]
            tie_break = "lowest_ids"

            [parallel]
            workers = 2
            "#,
        )
        .unwrap();
        assert_eq!(config.team_size, 4);
        assert_eq!(config.filter.generation_cap, Some(3));
        assert!(config.filter.include_legendaries);
        assert_eq!(config.filter.fossils, FossilPolicy::None);
        assert_eq!(config.optimizer.tie_break, TieBreak::LowestIds);
        assert_eq!(config.parallel.workers, 2);
        assert_eq!(config.bind, DEFAULT_BIND);
    }

    #[test]
    fn parses_yaml() {
        let config = AppConfig::from_yaml_str(
            "bind: 0.0.0.0:8080\nfilter:\n  generations: [1, 2]\n  allow_multiple_starters: true\n",
        )
        .unwrap();
        assert_eq!(config.bind, "0.0.0.0:8080");
        assert_eq!(config.filter.generations, vec![1, 2]);
        assert!(config.filter.allow_multiple_starters);
    }

    #[test]
    fn rejects_invalid_values() {
        assert!(matches!(
            AppConfig::from_toml_str("team_size = 0"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            AppConfig::from_toml_str("[filter]\ngeneration_cap = 0"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            AppConfig::from_toml_str("[filter]\ngenerations = [1, 15]"),
            Err(ConfigError::Invalid(message)) if message.contains("15")
        ));
        assert!(matches!(
            AppConfig::from_toml_str("team_size = \"six\""),
            Err(ConfigError::Toml(_))
        ));
    }

    #[test]
    fn environment_overrides_file_values() {
        let env = |key: &str| match key {
            CATALOG_ENV => Some("/tmp/other.csv".to_string()),
            BIND_ENV => Some("0.0.0.0:9000".to_string()),
            _ => None,
        };
        let config = AppConfig::resolve_with(None, env).unwrap();
        assert_eq!(config.catalog_path, PathBuf::from("/tmp/other.csv"));
        assert_eq!(config.bind, "0.0.0.0:9000");
    }

    #[test]
    fn config_env_points_at_file() {
        let path = std::env::temp_dir().join(format!("porygon-config-{}.yaml", std::process::id()));
        std::fs::write(&path, "team_size: 3\n").unwrap();
        let lookup_path = path.display().to_string();
        let env = move |key: &str| (key == CONFIG_ENV).then(|| lookup_path.clone());
        let config = AppConfig::resolve_with(None, env).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(config.team_size, 3);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = AppConfig::resolve_with(Some(Path::new("does/not/exist.toml")), no_env).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
