pub mod artifacts;
pub mod capture;
pub mod features;
pub mod inference;
pub mod results;

use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};

use crate::error::{DetectionResult, InferenceError};
pub use artifacts::{ArtifactPaths, Artifacts, Classifier, ModelSet, ModelSource};
pub use capture::Capture;
pub use features::{prepare, AnnotatedRow, DisplayRow, FeatureTable};
pub use inference::{annotate, infer, Inference};
pub use results::{Detection, FileReport, ModelSummary, ResultView};

/// Pipeline entry point: capture rows in, per-model summaries and annotated
/// rows out.
///
/// Holds the artifacts behind an `Arc`; clones are cheap and runs on
/// different threads share the same read-only encoder, scaler and models.
#[derive(Clone)]
pub struct Detector {
    artifacts: Arc<Artifacts>,
}

impl Detector {
    pub fn new(artifacts: Arc<Artifacts>) -> Self {
        Self { artifacts }
    }

    /// Prepare features, then run every model over the whole batch. The
    /// primary model's labels annotate the rows. Any failure discards the
    /// run; there are no partial results.
    pub fn analyze(&self, capture: &Capture) -> DetectionResult<Detection> {
        let artifacts = &self.artifacts;
        let primary = artifacts.models().primary().ok_or(InferenceError::NoModel)?;
        let (features, display) = prepare(capture, artifacts.encoder(), artifacts.scaler())?;

        let mut summaries = Vec::with_capacity(artifacts.models().len());
        let mut labels = Vec::new();
        for model in artifacts.models().iter() {
            let inference = infer(&features, model.classifier())?;
            summaries.push(ModelSummary {
                model: model.name().to_string(),
                intrusion_count: inference.intrusion_count,
                total: inference.total(),
            });
            // names are unique within a model set
            if model.name() == primary.name() {
                labels = inference.predictions;
            }
        }

        let rows = annotate(display, &labels)?;

        Ok(Detection { summaries, rows })
    }

    pub fn analyze_path(&self, path: &Path) -> DetectionResult<Detection> {
        let capture = Capture::from_path(path)?;
        self.analyze(&capture)
    }

    /// Analyze one capture file and fold the outcome into a report. Failure
    /// is reported in the view, never propagated.
    pub fn run(&self, path: &Path) -> FileReport {
        let started_at = chrono::Utc::now();
        let outcome = self.analyze_path(path);

        match &outcome {
            Ok(detection) => {
                for summary in &detection.summaries {
                    info!(
                        source = %path.display(),
                        model = %summary.model,
                        intrusions = summary.intrusion_count,
                        packets = summary.total,
                        "capture analyzed"
                    );
                }
            }
            Err(e) => warn!(source = %path.display(), error = %e, "capture analysis failed"),
        }

        FileReport {
            source: path.display().to_string(),
            started_at,
            finished_at: chrono::Utc::now(),
            view: ResultView::from_outcome(outcome),
        }
    }
}
