use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::detector::{ArtifactPaths, ModelSource};
use crate::error::ConfigError;

/// Artifact locations from `config.json`. Relative paths are resolved
/// against the directory holding the config file.
///
/// ```json
/// {
///   "encoder": "protocol_encoder.json",
///   "scaler": "scaler.json",
///   "models": [{ "name": "catboost", "path": "catboost_model.json" }]
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub encoder: Option<PathBuf>,
    pub scaler: Option<PathBuf>,
    #[serde(default)]
    pub models: Vec<ModelSource>,
}

impl Config {
    pub fn default_path() -> Option<PathBuf> {
        let mut path = dirs::config_dir()?;
        path.push("netsentry");
        path.push("config.json");
        Some(path)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config = serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        let base = path.parent().unwrap_or_else(|| Path::new(""));
        Ok(config.relative_to(base))
    }

    /// An explicit path must exist. Otherwise the default location is used
    /// when present, and an empty config when not.
    pub fn discover(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load(path);
        }

        match Self::default_path() {
            Some(path) if path.exists() => {
                debug!(path = %path.display(), "using config file");
                Self::load(&path)
            }
            _ => Ok(Self::default()),
        }
    }

    /// Command-line values win. Models given on the command line replace the
    /// configured list rather than extending it.
    pub fn with_overrides(
        mut self,
        encoder: Option<PathBuf>,
        scaler: Option<PathBuf>,
        models: Vec<ModelSource>,
    ) -> Self {
        if encoder.is_some() {
            self.encoder = encoder;
        }
        if scaler.is_some() {
            self.scaler = scaler;
        }
        if !models.is_empty() {
            self.models = models;
        }
        self
    }

    pub fn artifact_paths(self) -> Result<ArtifactPaths, ConfigError> {
        let encoder = self.encoder.ok_or(ConfigError::Missing("encoder"))?;
        let scaler = self.scaler.ok_or(ConfigError::Missing("scaler"))?;
        if self.models.is_empty() {
            return Err(ConfigError::Missing("model"));
        }
        Ok(ArtifactPaths {
            encoder,
            scaler,
            models: self.models,
        })
    }

    fn relative_to(self, base: &Path) -> Self {
        let resolve = |path: PathBuf| {
            if path.is_relative() {
                base.join(path)
            } else {
                path
            }
        };

        Config {
            encoder: self.encoder.map(resolve),
            scaler: self.scaler.map(resolve),
            models: self
                .models
                .into_iter()
                .map(|m| ModelSource {
                    name: m.name,
                    path: resolve(m.path),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_resolves_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{
                "encoder": "protocol_encoder.json",
                "scaler": "/opt/netsentry/scaler.json",
                "models": [{"name": "catboost", "path": "models/catboost.json"}]
            }"#,
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.encoder, Some(dir.path().join("protocol_encoder.json")));
        assert_eq!(config.scaler, Some(PathBuf::from("/opt/netsentry/scaler.json")));
        assert_eq!(config.models[0].path, dir.path().join("models/catboost.json"));
    }

    #[test]
    fn test_explicit_missing_config_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = Config::discover(Some(&dir.path().join("nope.json")));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn test_invalid_config_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"models": "catboost"}"#).unwrap();
        assert!(matches!(Config::load(&path), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_overrides_take_precedence() {
        let config = Config {
            encoder: Some("a.json".into()),
            scaler: Some("b.json".into()),
            models: vec!["old=old.json".parse().unwrap()],
        };
        let merged = config.with_overrides(
            None,
            Some("cli_scaler.json".into()),
            vec!["new=new.json".parse().unwrap()],
        );
        assert_eq!(merged.encoder, Some(PathBuf::from("a.json")));
        assert_eq!(merged.scaler, Some(PathBuf::from("cli_scaler.json")));
        assert_eq!(merged.models.len(), 1);
        assert_eq!(merged.models[0].name, "new");
    }

    #[test]
    fn test_artifact_paths_require_everything() {
        let missing_scaler = Config {
            encoder: Some("e.json".into()),
            scaler: None,
            models: vec!["m=m.json".parse().unwrap()],
        };
        assert!(matches!(
            missing_scaler.artifact_paths(),
            Err(ConfigError::Missing("scaler"))
        ));

        let missing_model = Config {
            encoder: Some("e.json".into()),
            scaler: Some("s.json".into()),
            models: Vec::new(),
        };
        assert!(matches!(
            missing_model.artifact_paths(),
            Err(ConfigError::Missing("model"))
        ));
    }
}
