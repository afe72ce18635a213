use std::path::Path;

use anyhow::{anyhow, Context};
use ndarray::{Array2, Array4, ArrayView1};
use tract_onnx::prelude::*;

use crate::preprocess::{CHANNELS, INPUT_SIZE};

/// Anything that maps a preprocessed batch to per-class scores.
pub trait Classifier: Send + Sync {
    /// Returns one row of scores per batch element.
    fn predict(&self, input: Array4<f32>) -> anyhow::Result<Array2<f32>>;

    /// Number of classes the model emits, when known ahead of time.
    fn num_classes(&self) -> Option<usize> {
        None
    }
}

/// ONNX model executed with tract, loaded once at startup.
pub struct OnnxClassifier {
    model: TypedRunnableModel<TypedModel>,
}

impl OnnxClassifier {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let side = INPUT_SIZE as usize;
        let model = tract_onnx::onnx()
            .model_for_path(path)
            .with_context(|| format!("Could not load ONNX model from {}", path.display()))?
            .with_input_fact(0, f32::fact([1, side, side, CHANNELS]).into())?
            .into_optimized()
            .context("Could not optimize ONNX model")?;

        Self::from_typed(model)
    }

    pub fn from_typed(model: TypedModel) -> anyhow::Result<Self> {
        let model = model
            .into_runnable()
            .context("Could not make ONNX model runnable")?;
        Ok(Self { model })
    }
}

/// Scores per batch element once every non-batch axis is flattened.
fn scores_per_row(shape: &[usize]) -> (usize, usize) {
    let batch = shape.first().copied().unwrap_or(1);
    let width = shape.iter().skip(1).product();
    (batch, width)
}

impl Classifier for OnnxClassifier {
    fn predict(&self, input: Array4<f32>) -> anyhow::Result<Array2<f32>> {
        let tensor: Tensor = input.into();
        let result = self.model.run(tvec!(tensor.into()))?;

        let output = result
            .first()
            .ok_or_else(|| anyhow!("model produced no outputs"))?
            .to_array_view::<f32>()?;
        let scores = Array2::from_shape_vec(
            scores_per_row(output.shape()),
            output.iter().copied().collect(),
        )?;
        Ok(scores)
    }

    fn num_classes(&self) -> Option<usize> {
        let fact = self.model.model().output_fact(0).ok()?;
        fact.shape
            .as_concrete()
            .map(|dims| scores_per_row(dims).1)
    }
}

/// Index of the highest score. Ties resolve to the earliest index.
pub fn argmax(scores: ArrayView1<f32>) -> Option<usize> {
    scores
        .iter()
        .enumerate()
        .fold(None, |best: Option<(usize, f32)>, (index, &score)| match best {
            Some((_, top)) if score.total_cmp(&top).is_le() => best,
            _ => Some((index, score)),
        })
        .map(|(index, _)| index)
}
