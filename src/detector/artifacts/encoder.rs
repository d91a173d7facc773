use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{ArtifactError, DataError};

/// On-disk form of the fitted protocol encoder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncoderArtifact {
    pub classes: Vec<String>,
}

/// Fitted label encoder for the `Protocol` column.
///
/// A category's code is its position in the known-category list, so the
/// list order is part of the artifact and never re-sorted here.
#[derive(Debug, Clone)]
pub struct ProtocolEncoder {
    classes: Vec<String>,
    codes: HashMap<String, usize>,
}

impl ProtocolEncoder {
    pub fn new(classes: Vec<String>) -> Result<Self, ArtifactError> {
        if classes.is_empty() {
            return Err(ArtifactError::invalid(
                "protocol encoder",
                "known-category list is empty",
            ));
        }

        let mut codes = HashMap::with_capacity(classes.len());
        for (code, class) in classes.iter().enumerate() {
            if codes.insert(class.clone(), code).is_some() {
                return Err(ArtifactError::invalid(
                    "protocol encoder",
                    format!("category '{}' appears more than once", class),
                ));
            }
        }

        Ok(Self { classes, codes })
    }

    pub fn from_artifact(artifact: EncoderArtifact) -> Result<Self, ArtifactError> {
        Self::new(artifact.classes)
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Substitute for categories the encoder was never fitted on.
    pub fn fallback(&self) -> &str {
        // non-empty by construction
        &self.classes[0]
    }

    pub fn is_known(&self, value: &str) -> bool {
        self.codes.contains_key(value)
    }

    pub fn encode(&self, value: &str) -> Result<usize, DataError> {
        self.codes
            .get(value)
            .copied()
            .ok_or_else(|| DataError::UnknownCategory(value.to_string()))
    }

    pub fn transform<'a, I>(&self, values: I) -> Result<Vec<usize>, DataError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        values.into_iter().map(|value| self.encode(value)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoder(classes: &[&str]) -> ProtocolEncoder {
        ProtocolEncoder::new(classes.iter().map(|c| c.to_string()).collect()).unwrap()
    }

    #[test]
    fn test_codes_follow_class_order() {
        let enc = encoder(&["ARP", "DNS", "TCP", "UDP"]);
        assert_eq!(enc.encode("ARP").unwrap(), 0);
        assert_eq!(enc.encode("UDP").unwrap(), 3);
        assert_eq!(enc.transform(["TCP", "DNS", "TCP"]).unwrap(), vec![2, 1, 2]);
    }

    #[test]
    fn test_unknown_category_rejected_by_lookup() {
        let enc = encoder(&["TCP", "UDP"]);
        assert!(!enc.is_known("XYZ"));
        assert!(matches!(enc.encode("XYZ"), Err(DataError::UnknownCategory(v)) if v == "XYZ"));
    }

    #[test]
    fn test_lookup_is_case_sensitive() {
        let enc = encoder(&["TCP"]);
        assert!(!enc.is_known("tcp"));
    }

    #[test]
    fn test_fallback_is_first_class() {
        let enc = encoder(&["TCP", "UDP"]);
        assert_eq!(enc.fallback(), "TCP");
    }

    #[test]
    fn test_empty_classes_rejected() {
        assert!(ProtocolEncoder::new(Vec::new()).is_err());
    }

    #[test]
    fn test_duplicate_classes_rejected() {
        let result = ProtocolEncoder::new(vec!["TCP".into(), "TCP".into()]);
        assert!(result.is_err());
    }

    #[test]
    fn test_from_artifact_json() {
        let artifact: EncoderArtifact =
            serde_json::from_str(r#"{"classes": ["ICMP", "TCP", "UDP"]}"#).unwrap();
        let enc = ProtocolEncoder::from_artifact(artifact).unwrap();
        assert_eq!(enc.classes().len(), 3);
        assert_eq!(enc.encode("UDP").unwrap(), 2);
    }
}
