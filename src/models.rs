use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context};
use serde::Serialize;

use crate::error::PredictError;

#[derive(Debug, Serialize)]
pub struct PredictionResponse {
    pub prediction: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Maps the model's output index to a human readable class name.
///
/// The on-disk format is a JSON object keyed by the stringified index,
/// e.g. `{"0": "Apple___Apple_scab", "1": "Apple___Black_rot"}`.
#[derive(Debug, Clone, Default)]
pub struct ClassIndex {
    labels: HashMap<usize, String>,
}

impl ClassIndex {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Could not read class indices from {}", path.display()))?;
        Self::from_json(&raw)
            .with_context(|| format!("Could not parse class indices in {}", path.display()))
    }

    pub fn from_json(raw: &str) -> anyhow::Result<Self> {
        let entries: HashMap<String, String> = serde_json::from_str(raw)?;
        let labels = entries
            .into_iter()
            .map(|(key, name)| match key.parse::<usize>() {
                // Lookups go through the canonical decimal form, so "03" or "+3" would never match.
                Ok(index) if index.to_string() == key => Ok((index, name)),
                _ => Err(anyhow!("class key {:?} is not a canonical non-negative integer", key)),
            })
            .collect::<anyhow::Result<HashMap<_, _>>>()?;
        Ok(Self { labels })
    }

    pub fn label(&self, index: usize) -> Result<&str, PredictError> {
        self.labels
            .get(&index)
            .map(String::as_str)
            .ok_or(PredictError::UnknownClass(index))
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Indices in `0..num_classes` that have no label.
    pub fn missing_indices(&self, num_classes: usize) -> Vec<usize> {
        (0..num_classes)
            .filter(|index| !self.labels.contains_key(index))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parses_string_keys() {
        let classes =
            ClassIndex::from_json(r#"{"0": "Apple___healthy", "3": "Tomato_Leaf_Mold"}"#).unwrap();
        assert_eq!(classes.len(), 2);
        assert_eq!(classes.label(3).unwrap(), "Tomato_Leaf_Mold");
        assert_eq!(classes.label(0).unwrap(), "Apple___healthy");
    }

    #[test]
    fn missing_label_is_an_error() {
        let classes = ClassIndex::from_json(r#"{"0": "Apple___healthy"}"#).unwrap();
        assert!(matches!(classes.label(7), Err(PredictError::UnknownClass(7))));
    }

    #[test]
    fn rejects_non_numeric_keys() {
        assert!(ClassIndex::from_json(r#"{"apple": "Apple___healthy"}"#).is_err());
        assert!(ClassIndex::from_json(r#"{"-1": "Apple___healthy"}"#).is_err());
        assert!(ClassIndex::from_json(r#"["Apple___healthy"]"#).is_err());
    }

    #[test]
    fn rejects_non_canonical_keys() {
        for raw in [
            r#"{"03": "padded"}"#,
            r#"{"+3": "plus"}"#,
            r#"{" 3": "spaced"}"#,
            r#"{"3": "Tomato_Leaf_Mold", "03": "padded"}"#,
        ] {
            assert!(ClassIndex::from_json(raw).is_err(), "{} should be rejected", raw);
        }
        assert!(ClassIndex::from_json(r#"{"0": "Apple___healthy", "10": "Tomato___healthy"}"#).is_ok());
    }

    #[test]
    fn empty_table_has_no_labels() {
        let classes = ClassIndex::from_json("{}").unwrap();
        assert!(classes.is_empty());
        assert_eq!(classes.missing_indices(2), vec![0, 1]);
    }

    #[test]
    fn reports_uncovered_indices() {
        let classes = ClassIndex::from_json(r#"{"0": "a", "2": "c"}"#).unwrap();
        assert_eq!(classes.missing_indices(4), vec![1, 3]);
        assert!(classes.missing_indices(1).is_empty());
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"1": "Corn_(maize)___Common_rust_"}}"#).unwrap();

        let classes = ClassIndex::load(file.path()).unwrap();
        assert_eq!(classes.label(1).unwrap(), "Corn_(maize)___Common_rust_");
    }

    #[test]
    fn load_error_names_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("class_indices.json");

        let err = ClassIndex::load(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("class_indices.json"));
    }
}
