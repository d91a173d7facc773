use tracing::debug;

use crate::detector::artifacts::Classifier;
use crate::detector::features::{AnnotatedRow, DisplayTable, FeatureTable};
use crate::error::InferenceError;

/// Labels from one batch prediction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inference {
    pub predictions: Vec<u8>,
    pub intrusion_count: usize,
}

impl Inference {
    pub fn total(&self) -> usize {
        self.predictions.len()
    }
}

pub fn summary_line(intrusions: usize, total: usize) -> String {
    format!(
        "{} intrusion(s) detected out of {} packets.",
        intrusions, total
    )
}

/// Run `classifier` once over the whole table.
pub fn infer(
    features: &FeatureTable,
    classifier: &dyn Classifier,
) -> Result<Inference, InferenceError> {
    let predictions = classifier.predict(features)?;
    if predictions.len() != features.n_rows() {
        return Err(InferenceError::LabelCount {
            expected: features.n_rows(),
            actual: predictions.len(),
        });
    }

    let intrusion_count = predictions.iter().filter(|&&label| label == 1).count();
    debug!(
        rows = predictions.len(),
        intrusions = intrusion_count,
        "batch inference complete"
    );

    Ok(Inference {
        predictions,
        intrusion_count,
    })
}

/// Attach predictions to display rows by position.
pub fn annotate(
    display: DisplayTable,
    predictions: &[u8],
) -> Result<Vec<AnnotatedRow>, InferenceError> {
    if display.len() != predictions.len() {
        return Err(InferenceError::LabelCount {
            expected: display.len(),
            actual: predictions.len(),
        });
    }

    Ok(display
        .into_iter()
        .zip(predictions)
        .map(|(row, &prediction)| AnnotatedRow { row, prediction })
        .collect())
}
