use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};

use crate::detector::features::{AnnotatedRow, DISPLAY_COLUMNS};
use crate::detector::inference::summary_line;
use crate::error::DetectionError;

/// Key the result mapping uses in place of model names when a run fails.
pub const ERROR_KEY: &str = "Error";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSummary {
    pub model: String,
    pub intrusion_count: usize,
    pub total: usize,
}

impl ModelSummary {
    pub fn message(&self) -> String {
        summary_line(self.intrusion_count, self.total)
    }
}

/// Successful run over one capture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub summaries: Vec<ModelSummary>,
    pub rows: Vec<AnnotatedRow>,
}

/// What the presentation layer receives: either every model's summary with
/// the annotated rows, or a single error entry and nothing else.
///
/// `results` keeps model registration order, so the model that annotated
/// the rows comes first. It serializes as a JSON object in that order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultView {
    #[serde(serialize_with = "serialize_ordered")]
    pub results: Vec<(String, String)>,
    pub columns: Vec<String>,
    pub rows: Vec<AnnotatedRow>,
}

impl ResultView {
    pub fn from_detection(detection: Detection) -> Self {
        let results = detection
            .summaries
            .iter()
            .map(|s| (s.model.clone(), s.message()))
            .collect();

        Self {
            results,
            columns: DISPLAY_COLUMNS.iter().map(|c| c.to_string()).collect(),
            rows: detection.rows,
        }
    }

    pub fn from_error(error: &DetectionError) -> Self {
        Self {
            results: vec![(ERROR_KEY.to_string(), error.to_string())],
            columns: Vec::new(),
            rows: Vec::new(),
        }
    }

    pub fn from_outcome(outcome: Result<Detection, DetectionError>) -> Self {
        match outcome {
            Ok(detection) => Self::from_detection(detection),
            Err(error) => Self::from_error(&error),
        }
    }

    /// Summary line reported for `model`.
    pub fn result(&self, model: &str) -> Option<&str> {
        self.results
            .iter()
            .find(|(name, _)| name == model)
            .map(|(_, message)| message.as_str())
    }

    pub fn error(&self) -> Option<&str> {
        if self.columns.is_empty() {
            self.result(ERROR_KEY)
        } else {
            None
        }
    }

    pub fn is_error(&self) -> bool {
        self.error().is_some()
    }
}

fn serialize_ordered<S: Serializer>(
    entries: &[(String, String)],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_map(entries.iter().map(|(key, value)| (key, value)))
}

/// Result view for one capture file, with timing.
#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub source: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    #[serde(flatten)]
    pub view: ResultView,
}
