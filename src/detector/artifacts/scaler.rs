use ndarray::{Array1, Array2, ArrayView2};
use serde::{Deserialize, Serialize};

use crate::error::{ArtifactError, DataError};

/// On-disk form of the fitted numeric scaler.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScalerArtifact {
    /// `(x - mean) / scale`
    Standard { mean: Vec<f64>, scale: Vec<f64> },
    /// `x * scale + min`
    MinMax { min: Vec<f64>, scale: Vec<f64> },
}

/// Fitted scaler for the numeric columns. Parameters are fixed at load.
#[derive(Debug, Clone)]
pub enum NumericScaler {
    Standard { mean: Array1<f64>, scale: Array1<f64> },
    MinMax { min: Array1<f64>, scale: Array1<f64> },
}

impl NumericScaler {
    pub fn standard(mean: Vec<f64>, scale: Vec<f64>) -> Result<Self, ArtifactError> {
        check_params(&mean, &scale)?;
        // A feature that was constant at fit time has scale 0; leave it unscaled.
        let scale = scale
            .into_iter()
            .map(|s| if s == 0.0 { 1.0 } else { s })
            .collect::<Vec<_>>();
        Ok(NumericScaler::Standard {
            mean: Array1::from(mean),
            scale: Array1::from(scale),
        })
    }

    pub fn min_max(min: Vec<f64>, scale: Vec<f64>) -> Result<Self, ArtifactError> {
        check_params(&min, &scale)?;
        Ok(NumericScaler::MinMax {
            min: Array1::from(min),
            scale: Array1::from(scale),
        })
    }

    pub fn from_artifact(artifact: ScalerArtifact) -> Result<Self, ArtifactError> {
        match artifact {
            ScalerArtifact::Standard { mean, scale } => Self::standard(mean, scale),
            ScalerArtifact::MinMax { min, scale } => Self::min_max(min, scale),
        }
    }

    pub fn n_features(&self) -> usize {
        match self {
            NumericScaler::Standard { mean, .. } => mean.len(),
            NumericScaler::MinMax { min, .. } => min.len(),
        }
    }

    /// Normalize every row of `x`. Row count and order are preserved.
    pub fn transform(&self, x: ArrayView2<'_, f64>) -> Result<Array2<f64>, DataError> {
        if x.ncols() != self.n_features() {
            return Err(DataError::Shape {
                stage: "numeric scaler",
                expected: self.n_features(),
                actual: x.ncols(),
            });
        }

        let scaled = match self {
            NumericScaler::Standard { mean, scale } => &(&x - mean) / scale,
            NumericScaler::MinMax { min, scale } => &(&x * scale) + min,
        };
        Ok(scaled)
    }
}

fn check_params(offset: &[f64], scale: &[f64]) -> Result<(), ArtifactError> {
    if offset.is_empty() {
        return Err(ArtifactError::invalid("numeric scaler", "no features"));
    }
    if offset.len() != scale.len() {
        return Err(ArtifactError::invalid(
            "numeric scaler",
            format!(
                "{} offset value(s) but {} scale value(s)",
                offset.len(),
                scale.len()
            ),
        ));
    }
    if offset.iter().chain(scale).any(|v| !v.is_finite()) {
        return Err(ArtifactError::invalid(
            "numeric scaler",
            "parameters must be finite",
        ));
    }
    Ok(())
}
