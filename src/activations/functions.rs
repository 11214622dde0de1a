use ndarray::{Array2, ArrayView2};
use serde::{Serialize, Deserialize};

/// An enumeration of the activation functions a Q-network layer can use.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, Default)]
pub enum Activation {
    #[default]
    Relu,
    Linear,
    LeakyRelu { alpha: f32 },
}

impl Activation {
    /// Apply the activation function to a batch in-place.
    pub fn apply_batch(&self, inputs: &mut Array2<f32>) {
        match self {
            Activation::Relu => {
                inputs.mapv_inplace(|v| v.max(0.0));
            }
            Activation::Linear => {}
            Activation::LeakyRelu { alpha } => {
                let a = *alpha;
                inputs.mapv_inplace(|v| if v > 0.0 { v } else { a * v });
            }
        }
    }

    /// Derivative with respect to the pre-activation values of a batch.
    pub fn derivative_batch(&self, inputs: ArrayView2<f32>) -> Array2<f32> {
        match self {
            Activation::Relu => {
                inputs.mapv(|v| if v > 0.0 { 1.0 } else { 0.0 })
            }
            Activation::Linear => {
                Array2::ones(inputs.dim())
            }
            Activation::LeakyRelu { alpha } => {
                let a = *alpha;
                inputs.mapv(|v| if v > 0.0 { 1.0 } else { a })
            }
        }
    }
}
