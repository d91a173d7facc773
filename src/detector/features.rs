//! Turns capture rows into the classifier's feature table.
//!
//! Every row yields exactly one feature vector and one display row, in input
//! order. Missing columns are defaulted rather than rejected:
//! - no `Protocol` column: `Protocol_Encoded` is 0 and the encoder is skipped
//! - no `Time` / `Length` column: the column is 0 before scaling
//!
//! Protocol values outside the encoder's known categories are replaced by
//! the encoder's first category before encoding.

use ndarray::{s, Array1, Array2};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::detector::artifacts::{NumericScaler, ProtocolEncoder};
use crate::detector::capture::Capture;
use crate::error::DataError;

pub const PROTOCOL: &str = "Protocol";
pub const TIME: &str = "Time";
pub const LENGTH: &str = "Length";
pub const PREDICTION: &str = "Prediction";

pub const FEATURE_COLUMNS: [&str; 3] = ["Protocol_Encoded", "Time_Normalized", "Length_Normalized"];
pub const DISPLAY_COLUMNS: [&str; 4] = [PROTOCOL, TIME, LENGTH, PREDICTION];

/// Named numeric columns handed to a classifier as one batch.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureTable {
    columns: Vec<String>,
    values: Array2<f64>,
}

impl FeatureTable {
    pub fn new(columns: Vec<String>, values: Array2<f64>) -> Result<Self, DataError> {
        if columns.len() != values.ncols() {
            return Err(DataError::Shape {
                stage: "feature table",
                expected: columns.len(),
                actual: values.ncols(),
            });
        }
        Ok(Self { columns, values })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    pub fn n_rows(&self) -> usize {
        self.values.nrows()
    }
}

/// The relevant input columns of one row, after defaulting and recoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayRow {
    #[serde(rename = "Protocol")]
    pub protocol: Option<String>,
    #[serde(rename = "Time")]
    pub time: f64,
    #[serde(rename = "Length")]
    pub length: f64,
}

/// A display row with the label the primary model assigned to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedRow {
    #[serde(flatten)]
    pub row: DisplayRow,
    #[serde(rename = "Prediction")]
    pub prediction: u8,
}

pub type DisplayTable = Vec<DisplayRow>;

pub fn prepare(
    capture: &Capture,
    encoder: &ProtocolEncoder,
    scaler: &NumericScaler,
) -> Result<(FeatureTable, DisplayTable), DataError> {
    let n_rows = capture.len();

    let protocols = recode_protocols(capture, encoder);
    let encoded: Vec<f64> = match &protocols {
        Some(values) => encoder
            .transform(values.iter().map(String::as_str))?
            .into_iter()
            .map(|code| code as f64)
            .collect(),
        None => {
            debug!("no {} column, encoding every row as 0", PROTOCOL);
            vec![0.0; n_rows]
        }
    };

    let time = numeric_column(capture, TIME)?;
    let length = numeric_column(capture, LENGTH)?;

    let raw = Array2::from_shape_fn((n_rows, 2), |(row, col)| {
        if col == 0 {
            time[row]
        } else {
            length[row]
        }
    });
    let normalized = scaler.transform(raw.view())?;
    if normalized.dim() != (n_rows, 2) {
        return Err(DataError::Shape {
            stage: "numeric scaler output",
            expected: 2,
            actual: normalized.ncols(),
        });
    }

    let mut values = Array2::<f64>::zeros((n_rows, FEATURE_COLUMNS.len()));
    values.column_mut(0).assign(&Array1::from(encoded));
    values.slice_mut(s![.., 1..]).assign(&normalized);
    let features = FeatureTable::new(
        FEATURE_COLUMNS.iter().map(|c| c.to_string()).collect(),
        values,
    )?;

    let display = (0..n_rows)
        .map(|row| DisplayRow {
            protocol: protocols.as_ref().map(|values| values[row].clone()),
            time: time[row],
            length: length[row],
        })
        .collect();

    Ok((features, display))
}

/// `Protocol` values with unknown categories replaced by the encoder's
/// fallback, or `None` when the column is absent.
fn recode_protocols(capture: &Capture, encoder: &ProtocolEncoder) -> Option<Vec<String>> {
    let values = capture.column(PROTOCOL)?;

    let mut recoded = 0usize;
    let protocols: Vec<String> = values
        .map(|value| {
            if encoder.is_known(value) {
                value.to_string()
            } else {
                recoded += 1;
                encoder.fallback().to_string()
            }
        })
        .collect();

    if recoded > 0 {
        debug!(
            recoded,
            fallback = encoder.fallback(),
            "replaced unknown protocol values"
        );
    }
    Some(protocols)
}

fn numeric_column(capture: &Capture, name: &str) -> Result<Vec<f64>, DataError> {
    match capture.column(name) {
        Some(values) => values
            .enumerate()
            .map(|(idx, raw)| parse_numeric(name, idx + 1, raw))
            .collect(),
        None => {
            debug!("no {} column, defaulting to 0", name);
            Ok(vec![0.0; capture.len()])
        }
    }
}

fn parse_numeric(column: &str, row: usize, raw: &str) -> Result<f64, DataError> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(DataError::MissingValue {
            column: column.to_string(),
            row,
        });
    }

    value
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| DataError::NotNumeric {
            column: column.to_string(),
            row,
            value: raw.to_string(),
        })
}
