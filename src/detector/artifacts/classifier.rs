use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use smartcore::ensemble::random_forest_classifier::RandomForestClassifier;
use smartcore::linalg::basic::matrix::DenseMatrix;

use crate::detector::features::{FeatureTable, FEATURE_COLUMNS};
use crate::error::{ArtifactError, InferenceError};

/// Random forest as persisted by smartcore's serde support.
pub type Forest = RandomForestClassifier<f64, i64, DenseMatrix<f64>, Vec<i64>>;

/// A fitted binary classifier. Label 1 is an intrusion.
///
/// Implementations are immutable after loading and shared across threads.
pub trait Classifier: Send + Sync {
    /// Column names the model was fitted on, in order.
    fn feature_names(&self) -> &[String];

    /// One label per row of `features`, in row order.
    fn predict_matrix(&self, features: &Array2<f64>) -> Result<Vec<u8>, InferenceError>;

    /// Batch prediction over a named feature table. Column names must match
    /// the fitted ones exactly, so a missing or extra column is rejected.
    fn predict(&self, features: &FeatureTable) -> Result<Vec<u8>, InferenceError> {
        let expected = self.feature_names();
        if features.columns() != expected {
            return Err(InferenceError::FeatureMismatch {
                expected: expected.to_vec(),
                actual: features.columns().to_vec(),
            });
        }
        self.predict_matrix(features.values())
    }
}

/// On-disk form of a fitted classifier.
#[derive(Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelArtifact {
    Logistic {
        #[serde(default = "default_feature_names")]
        feature_names: Vec<String>,
        weights: Vec<f64>,
        intercept: f64,
        #[serde(default = "default_threshold")]
        threshold: f64,
    },
    RandomForest {
        #[serde(default = "default_feature_names")]
        feature_names: Vec<String>,
        model: Forest,
    },
}

fn default_feature_names() -> Vec<String> {
    FEATURE_COLUMNS.iter().map(|name| name.to_string()).collect()
}

fn default_threshold() -> f64 {
    0.5
}

impl ModelArtifact {
    pub fn into_classifier(self) -> Result<Box<dyn Classifier>, ArtifactError> {
        match self {
            ModelArtifact::Logistic {
                feature_names,
                weights,
                intercept,
                threshold,
            } => Ok(Box::new(LogisticModel::new(
                feature_names,
                weights,
                intercept,
                threshold,
            )?)),
            ModelArtifact::RandomForest {
                feature_names,
                model,
            } => Ok(Box::new(ForestModel::new(feature_names, model)?)),
        }
    }
}

/// Logistic regression: `sigmoid(x . w + b) >= threshold` flags an intrusion.
#[derive(Debug, Clone)]
pub struct LogisticModel {
    feature_names: Vec<String>,
    weights: Array1<f64>,
    intercept: f64,
    threshold: f64,
}

impl LogisticModel {
    pub fn new(
        feature_names: Vec<String>,
        weights: Vec<f64>,
        intercept: f64,
        threshold: f64,
    ) -> Result<Self, ArtifactError> {
        if weights.len() != feature_names.len() {
            return Err(ArtifactError::invalid(
                "logistic model",
                format!(
                    "{} weight(s) for {} feature(s)",
                    weights.len(),
                    feature_names.len()
                ),
            ));
        }
        if !(0.0..=1.0).contains(&threshold) {
            return Err(ArtifactError::invalid(
                "logistic model",
                format!("threshold {} outside [0, 1]", threshold),
            ));
        }
        if !intercept.is_finite() || weights.iter().any(|w| !w.is_finite()) {
            return Err(ArtifactError::invalid(
                "logistic model",
                "weights and intercept must be finite",
            ));
        }

        Ok(Self {
            feature_names,
            weights: Array1::from(weights),
            intercept,
            threshold,
        })
    }

    pub fn probabilities(&self, features: &Array2<f64>) -> Result<Array1<f64>, InferenceError> {
        if features.ncols() != self.weights.len() {
            return Err(InferenceError::Model(format!(
                "X has {} features, but the model is expecting {} features as input",
                features.ncols(),
                self.weights.len()
            )));
        }
        let logits = features.dot(&self.weights) + self.intercept;
        Ok(logits.mapv(|z| 1.0 / (1.0 + (-z).exp())))
    }
}

impl Classifier for LogisticModel {
    fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    fn predict_matrix(&self, features: &Array2<f64>) -> Result<Vec<u8>, InferenceError> {
        let probabilities = self.probabilities(features)?;
        Ok(probabilities
            .iter()
            .map(|p| u8::from(*p >= self.threshold))
            .collect())
    }
}

pub struct ForestModel {
    feature_names: Vec<String>,
    forest: Forest,
}

impl ForestModel {
    pub fn new(feature_names: Vec<String>, forest: Forest) -> Result<Self, ArtifactError> {
        if feature_names.is_empty() {
            return Err(ArtifactError::invalid("random forest", "no feature names"));
        }
        Ok(Self {
            feature_names,
            forest,
        })
    }
}

impl Classifier for ForestModel {
    fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    fn predict_matrix(&self, features: &Array2<f64>) -> Result<Vec<u8>, InferenceError> {
        if features.ncols() != self.feature_names.len() {
            return Err(InferenceError::Model(format!(
                "X has {} features, but the model is expecting {} features as input",
                features.ncols(),
                self.feature_names.len()
            )));
        }
        if features.nrows() == 0 {
            return Ok(Vec::new());
        }

        let rows: Vec<Vec<f64>> = features.outer_iter().map(|row| row.to_vec()).collect();
        let x = DenseMatrix::from_2d_vec(&rows);
        let labels = self
            .forest
            .predict(&x)
            .map_err(|e| InferenceError::Model(e.to_string()))?;

        labels.into_iter().map(binary_label).collect()
    }
}

fn binary_label(label: i64) -> Result<u8, InferenceError> {
    match label {
        0 => Ok(0),
        1 => Ok(1),
        other => Err(InferenceError::NonBinaryLabel(other)),
    }
}

/// A classifier registered under the name it is reported by.
pub struct NamedModel {
    name: String,
    classifier: Box<dyn Classifier>,
}

impl NamedModel {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn classifier(&self) -> &dyn Classifier {
        self.classifier.as_ref()
    }
}

/// Named classifiers in registration order. The first one is the primary
/// model and annotates the display rows.
#[derive(Default)]
pub struct ModelSet {
    models: Vec<NamedModel>,
}

impl ModelSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(
        &mut self,
        name: impl Into<String>,
        classifier: Box<dyn Classifier>,
    ) -> Result<(), ArtifactError> {
        let name = name.into();
        if self.models.iter().any(|m| m.name == name) {
            return Err(ArtifactError::invalid(
                "model set",
                format!("model '{}' registered twice", name),
            ));
        }
        self.models.push(NamedModel { name, classifier });
        Ok(())
    }

    pub fn primary(&self) -> Option<&NamedModel> {
        self.models.first()
    }

    pub fn iter(&self) -> impl Iterator<Item = &NamedModel> {
        self.models.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.models.iter().map(|m| m.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use smartcore::ensemble::random_forest_classifier::RandomForestClassifierParameters;

    fn names() -> Vec<String> {
        default_feature_names()
    }

    fn table(columns: &[&str], values: Array2<f64>) -> FeatureTable {
        FeatureTable::new(columns.iter().map(|c| c.to_string()).collect(), values).unwrap()
    }

    fn length_model() -> LogisticModel {
        // flags rows whose normalized length is positive
        LogisticModel::new(names(), vec![0.0, 0.0, 10.0], 0.0, 0.5).unwrap()
    }

    #[test]
    fn test_logistic_predicts_per_row() {
        let model = length_model();
        let labels = model
            .predict_matrix(&array![[0.0, 0.0, -1.0], [1.0, 0.3, 2.0], [2.0, 0.0, 0.5]])
            .unwrap();
        assert_eq!(labels, vec![0, 1, 1]);
    }

    #[test]
    fn test_logistic_threshold_boundary() {
        let model = LogisticModel::new(names(), vec![0.0, 0.0, 0.0], 0.0, 0.5).unwrap();
        // sigmoid(0) == 0.5 sits on the threshold
        assert_eq!(model.predict_matrix(&array![[1.0, 1.0, 1.0]]).unwrap(), vec![1]);
    }

    #[test]
    fn test_logistic_rejects_bad_artifacts() {
        assert!(LogisticModel::new(names(), vec![1.0, 2.0], 0.0, 0.5).is_err());
        assert!(LogisticModel::new(names(), vec![1.0, 2.0, 3.0], 0.0, 1.5).is_err());
        assert!(LogisticModel::new(names(), vec![1.0, f64::INFINITY, 3.0], 0.0, 0.5).is_err());
    }

    #[test]
    fn test_missing_column_rejected_before_predict() {
        let model = length_model();
        let features = table(
            &["Protocol_Encoded", "Time_Normalized"],
            array![[0.0, 1.0]],
        );
        let result = model.predict(&features);
        assert!(matches!(result, Err(InferenceError::FeatureMismatch { .. })));
    }

    #[test]
    fn test_extra_column_rejected_before_predict() {
        let model = length_model();
        let features = table(
            &["Protocol_Encoded", "Time_Normalized", "Length_Normalized", "Info"],
            array![[0.0, 1.0, 2.0, 3.0]],
        );
        assert!(model.predict(&features).is_err());
    }

    #[test]
    fn test_reordered_columns_rejected() {
        let model = length_model();
        let features = table(
            &["Time_Normalized", "Protocol_Encoded", "Length_Normalized"],
            array![[0.0, 1.0, 2.0]],
        );
        assert!(matches!(
            model.predict(&features),
            Err(InferenceError::FeatureMismatch { .. })
        ));
    }

    #[test]
    fn test_logistic_artifact_defaults() {
        let artifact: ModelArtifact = serde_json::from_str(
            r#"{"kind": "logistic", "weights": [0.1, 0.2, 0.3], "intercept": -1.0}"#,
        )
        .unwrap();
        let classifier = artifact.into_classifier().unwrap();
        assert_eq!(classifier.feature_names(), names().as_slice());
    }

    fn fitted_forest() -> Forest {
        let x = DenseMatrix::from_2d_vec(&vec![
            vec![0.0, -1.0, -1.0],
            vec![0.0, -0.9, -1.1],
            vec![1.0, -1.1, -0.8],
            vec![1.0, -0.8, -1.2],
            vec![0.0, 1.0, 2.0],
            vec![1.0, 1.1, 2.2],
            vec![0.0, 0.9, 1.8],
            vec![1.0, 1.2, 2.1],
        ]);
        let y: Vec<i64> = vec![0, 0, 0, 0, 1, 1, 1, 1];
        // consider every feature at each split
        let params = RandomForestClassifierParameters::default().with_m(3);
        RandomForestClassifier::fit(&x, &y, params).unwrap()
    }

    #[test]
    fn test_forest_predicts_binary_labels() {
        let model = ForestModel::new(names(), fitted_forest()).unwrap();
        let labels = model
            .predict_matrix(&array![[0.0, -1.0, -1.0], [1.0, 1.0, 2.0]])
            .unwrap();
        assert_eq!(labels, vec![0, 1]);
    }

    #[test]
    fn test_forest_separates_its_training_rows() {
        let model = ForestModel::new(names(), fitted_forest()).unwrap();
        let labels = model
            .predict_matrix(&array![
                [0.0, -1.0, -1.0],
                [0.0, -0.9, -1.1],
                [1.0, -1.1, -0.8],
                [1.0, -0.8, -1.2],
                [0.0, 1.0, 2.0],
                [1.0, 1.1, 2.2],
                [0.0, 0.9, 1.8],
                [1.0, 1.2, 2.1]
            ])
            .unwrap();
        assert_eq!(labels, vec![0, 0, 0, 0, 1, 1, 1, 1]);
    }

    #[test]
    fn test_forest_empty_batch() {
        let model = ForestModel::new(names(), fitted_forest()).unwrap();
        let labels = model.predict_matrix(&Array2::zeros((0, 3))).unwrap();
        assert!(labels.is_empty());
    }

    #[test]
    fn test_forest_artifact_from_persisted_model() {
        let persisted = serde_json::json!({
            "kind": "random_forest",
            "model": serde_json::to_value(fitted_forest()).unwrap(),
        });
        let artifact: ModelArtifact = serde_json::from_value(persisted).unwrap();
        let classifier = artifact.into_classifier().unwrap();
        let labels = classifier.predict_matrix(&array![[1.0, 1.1, 2.0]]).unwrap();
        assert_eq!(labels, vec![1]);
    }

    #[test]
    fn test_non_binary_label_rejected() {
        assert!(matches!(binary_label(2), Err(InferenceError::NonBinaryLabel(2))));
        assert_eq!(binary_label(1).unwrap(), 1);
    }

    #[test]
    fn test_model_set_rejects_duplicate_names() {
        let mut models = ModelSet::new();
        models.insert("catboost", Box::new(length_model())).unwrap();
        assert!(models.insert("catboost", Box::new(length_model())).is_err());
        models.insert("logistic", Box::new(length_model())).unwrap();
        assert_eq!(models.names(), vec!["catboost", "logistic"]);
        assert_eq!(models.primary().unwrap().name(), "catboost");
    }
}
