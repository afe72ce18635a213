use std::sync::Arc;

use log::info;

use crate::error::PredictError;
use crate::inference::{argmax, Classifier};
use crate::models::ClassIndex;
use crate::preprocess;

/// Read-only context shared by every worker for the lifetime of the process.
pub struct AppState {
    pub classifier: Arc<dyn Classifier>,
    pub classes: ClassIndex,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(classifier: Arc<dyn Classifier>, classes: ClassIndex, max_upload_bytes: usize) -> Self {
        Self {
            classifier,
            classes,
            max_upload_bytes,
        }
    }

    /// Runs the whole pipeline on one uploaded image and resolves its class name.
    pub fn classify(&self, bytes: &[u8]) -> Result<String, PredictError> {
        let input = preprocess::load_and_preprocess(bytes)?;
        let scores = self
            .classifier
            .predict(input)
            .map_err(PredictError::Inference)?;

        if scores.nrows() == 0 {
            return Err(PredictError::Inference(anyhow::anyhow!(
                "model returned an empty batch"
            )));
        }
        let index = argmax(scores.row(0)).ok_or_else(|| {
            PredictError::Inference(anyhow::anyhow!("model returned no class scores"))
        })?;

        let label = self.classes.label(index)?;
        info!("Predicted class {} ({})", index, label);
        Ok(label.to_string())
    }
}
