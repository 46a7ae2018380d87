//! Dense feed-forward classifier evaluated from pretrained weights.
//!
//! Weight files are JSON:
//!
//! ```json
//! {
//!   "input_width": 42,
//!   "layers": [
//!     { "weights": [[...], ...], "bias": [...], "activation": "relu" },
//!     { "weights": [[...], ...], "bias": [...], "activation": "softmax" }
//!   ]
//! }
//! ```
//!
//! `weights` is row-major `[outputs][inputs]`. Shapes are checked once at
//! load; evaluation never mutates the model.

use serde::Deserialize;
use std::{fs, path::Path};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("model expects {expected} inputs, got {got}")]
    InputWidth { expected: usize, got: usize },
    #[error("layer {layer}: {reason}")]
    Shape { layer: usize, reason: String },
    #[error("model has no layers")]
    Empty,
    #[error("failed to read model {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse model: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Activation {
    Linear,
    Relu,
    Tanh,
    Softmax,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Dense {
    weights: Vec<Vec<f32>>,
    bias: Vec<f32>,
    #[serde(default = "default_activation")]
    activation: Activation,
}

fn default_activation() -> Activation {
    Activation::Linear
}

impl Dense {
    pub fn new(weights: Vec<Vec<f32>>, bias: Vec<f32>, activation: Activation) -> Self {
        Self {
            weights,
            bias,
            activation,
        }
    }

    fn outputs(&self) -> usize {
        self.bias.len()
    }

    fn forward(&self, input: &[f32]) -> Vec<f32> {
        let mut out: Vec<f32> = self
            .weights
            .iter()
            .zip(&self.bias)
            .map(|(row, b)| row.iter().zip(input).map(|(w, x)| w * x).sum::<f32>() + b)
            .collect();
        apply(self.activation, &mut out);
        out
    }
}

fn apply(act: Activation, v: &mut [f32]) {
    match act {
        Activation::Linear => {}
        Activation::Relu => v.iter_mut().for_each(|x| *x = x.max(0.0)),
        Activation::Tanh => v.iter_mut().for_each(|x| *x = x.tanh()),
        Activation::Softmax => {
            let max = v.iter().copied().fold(f32::NEG_INFINITY, f32::max);
            let mut sum = 0.0;
            for x in v.iter_mut() {
                *x = (*x - max).exp();
                sum += *x;
            }
            if sum > 0.0 {
                v.iter_mut().for_each(|x| *x /= sum);
            }
        }
    }
}

/// Class decision plus the raw output scores.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub class_id: usize,
    pub scores: Vec<f32>,
}

impl Prediction {
    /// Argmax; the lowest index wins ties and NaN never wins.
    pub fn from_scores(scores: Vec<f32>) -> Self {
        let mut class_id = 0;
        let mut best = f32::NEG_INFINITY;
        for (i, &s) in scores.iter().enumerate() {
            if s > best {
                best = s;
                class_id = i;
            }
        }
        Self { class_id, scores }
    }

    pub fn confidence(&self) -> f32 {
        self.scores.get(self.class_id).copied().unwrap_or(0.0)
    }
}

#[derive(Debug, Clone)]
pub struct Model {
    input_width: usize,
    layers: Vec<Dense>,
}

#[derive(Deserialize)]
struct ModelFile {
    input_width: usize,
    layers: Vec<Dense>,
}

impl TryFrom<ModelFile> for Model {
    type Error = ModelError;

    fn try_from(f: ModelFile) -> Result<Self, Self::Error> {
        Model::new(f.input_width, f.layers)
    }
}

impl Model {
    pub fn new(input_width: usize, layers: Vec<Dense>) -> Result<Self, ModelError> {
        if layers.is_empty() {
            return Err(ModelError::Empty);
        }
        let mut width = input_width;
        for (i, layer) in layers.iter().enumerate() {
            if layer.weights.len() != layer.bias.len() {
                return Err(ModelError::Shape {
                    layer: i,
                    reason: format!(
                        "{} weight rows but {} biases",
                        layer.weights.len(),
                        layer.bias.len()
                    ),
                });
            }
            if layer.outputs() == 0 {
                return Err(ModelError::Shape {
                    layer: i,
                    reason: "no outputs".into(),
                });
            }
            if let Some(row) = layer.weights.iter().find(|r| r.len() != width) {
                return Err(ModelError::Shape {
                    layer: i,
                    reason: format!("row of width {} where {width} expected", row.len()),
                });
            }
            width = layer.outputs();
        }
        Ok(Self {
            input_width,
            layers,
        })
    }

    pub fn from_json(text: &str) -> Result<Self, ModelError> {
        let file: ModelFile = serde_json::from_str(text)?;
        file.try_into()
    }

    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let text = fs::read_to_string(path).map_err(|source| ModelError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&text)
    }

    pub fn input_width(&self) -> usize {
        self.input_width
    }

    pub fn class_count(&self) -> usize {
        self.layers.last().map_or(0, Dense::outputs)
    }

    pub fn evaluate(&self, input: &[f32]) -> Result<Prediction, ModelError> {
        if input.len() != self.input_width {
            return Err(ModelError::InputWidth {
                expected: self.input_width,
                got: input.len(),
            });
        }
        let scores = self
            .layers
            .iter()
            .fold(input.to_vec(), |acc, layer| layer.forward(&acc));
        Ok(Prediction::from_scores(scores))
    }
}
