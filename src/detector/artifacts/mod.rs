pub mod classifier;
pub mod encoder;
pub mod scaler;

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ArtifactError;
pub use classifier::{Classifier, ForestModel, LogisticModel, ModelArtifact, ModelSet, NamedModel};
pub use encoder::{EncoderArtifact, ProtocolEncoder};
pub use scaler::{NumericScaler, ScalerArtifact};

/// A classifier artifact and the name its summary is reported under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelSource {
    pub name: String,
    pub path: PathBuf,
}

impl FromStr for ModelSource {
    type Err = String;

    /// `NAME=PATH`, or a bare `PATH` named after its file stem.
    fn from_str(arg: &str) -> Result<Self, Self::Err> {
        let (name, path) = match arg.split_once('=') {
            Some((name, path)) => (name.trim().to_string(), PathBuf::from(path.trim())),
            None => {
                let path = PathBuf::from(arg.trim());
                let stem = path
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .map(str::to_string)
                    .unwrap_or_default();
                (stem, path)
            }
        };

        if name.is_empty() {
            return Err(format!("model '{}' needs a name (NAME=PATH)", arg));
        }
        if path.as_os_str().is_empty() {
            return Err(format!("model '{}' needs a path (NAME=PATH)", arg));
        }
        Ok(ModelSource { name, path })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub encoder: PathBuf,
    pub scaler: PathBuf,
    pub models: Vec<ModelSource>,
}

/// Everything a detection run reads but never changes. Loaded once and
/// shared between runs.
pub struct Artifacts {
    encoder: ProtocolEncoder,
    scaler: NumericScaler,
    models: ModelSet,
}

impl Artifacts {
    pub fn new(
        encoder: ProtocolEncoder,
        scaler: NumericScaler,
        models: ModelSet,
    ) -> Result<Self, ArtifactError> {
        if models.is_empty() {
            return Err(ArtifactError::invalid("model set", "no classifier loaded"));
        }
        Ok(Self {
            encoder,
            scaler,
            models,
        })
    }

    pub fn load(paths: &ArtifactPaths) -> Result<Self, ArtifactError> {
        let encoder = ProtocolEncoder::from_artifact(read_json(&paths.encoder)?)?;
        info!(
            path = %paths.encoder.display(),
            categories = encoder.classes().len(),
            "loaded protocol encoder"
        );

        let scaler = NumericScaler::from_artifact(read_json(&paths.scaler)?)?;
        info!(
            path = %paths.scaler.display(),
            features = scaler.n_features(),
            "loaded numeric scaler"
        );

        let mut models = ModelSet::new();
        for source in &paths.models {
            let artifact: ModelArtifact = read_json(&source.path)?;
            models.insert(source.name.clone(), artifact.into_classifier()?)?;
            info!(model = %source.name, path = %source.path.display(), "loaded classifier");
        }

        Self::new(encoder, scaler, models)
    }

    pub fn encoder(&self) -> &ProtocolEncoder {
        &self.encoder
    }

    pub fn scaler(&self) -> &NumericScaler {
        &self.scaler
    }

    pub fn models(&self) -> &ModelSet {
        &self.models
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ArtifactError> {
    let content = fs::read_to_string(path).map_err(|source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| ArtifactError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
