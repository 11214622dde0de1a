use ndarray::{Array1, Array2, ArrayView2, Axis};
use ndarray_rand::rand_distr::Uniform;
use ndarray_rand::RandomExt;
use serde::{Serialize, Deserialize};
use crate::activations::Activation;
use crate::error::{Result, TrafficError};

/// A fully connected (dense) layer of the Q-network
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct DenseLayer {
    pub weights: Array2<f32>,
    pub biases: Array1<f32>,
    pub activation: Activation,
    #[serde(skip)]
    pre_activation_output: Option<Array2<f32>>,
    #[serde(skip)]
    inputs: Option<Array2<f32>>,
}

impl DenseLayer {
    /// Create a new dense layer with the given input size, output size, and activation function.
    /// Weights are drawn uniformly from `[-1/sqrt(input_size), 1/sqrt(input_size)]`,
    /// biases start at zero.
    pub fn new(input_size: usize, output_size: usize, activation: Activation) -> Self {
        let bound = 1.0 / (input_size.max(1) as f32).sqrt();
        let weights = Array2::random((input_size, output_size), Uniform::new(-bound, bound));
        let biases = Array1::zeros(output_size);
        DenseLayer {
            weights,
            biases,
            activation,
            pre_activation_output: None,
            inputs: None,
        }
    }

    #[cfg(test)]
    pub(crate) fn with_weights(mut self, weights: Array2<f32>) -> Result<Self> {
        if weights.dim() != self.weights.dim() {
            return Err(TrafficError::dimension_mismatch(
                format!("{:?}", self.weights.dim()),
                format!("{:?}", weights.dim()),
            ));
        }
        self.weights = weights;
        Ok(self)
    }

    #[cfg(test)]
    pub(crate) fn with_biases(mut self, biases: Array1<f32>) -> Result<Self> {
        if biases.len() != self.biases.len() {
            return Err(TrafficError::dimension_mismatch(
                format!("{} biases", self.biases.len()),
                format!("{} biases", biases.len()),
            ));
        }
        self.biases = biases;
        Ok(self)
    }

    pub fn input_size(&self) -> usize {
        self.weights.shape()[0]
    }

    pub fn output_size(&self) -> usize {
        self.weights.shape()[1]
    }

    /// Forward pass without touching the backprop cache.
    pub fn predict_batch(&self, inputs: ArrayView2<f32>) -> Array2<f32> {
        let mut outputs = inputs.dot(&self.weights) + &self.biases.view().insert_axis(Axis(0));
        self.activation.apply_batch(&mut outputs);
        outputs
    }

    /// Forward pass that keeps the inputs and pre-activations for `backward_batch`.
    pub fn forward_batch(&mut self, inputs: ArrayView2<f32>) -> Array2<f32> {
        self.inputs = Some(inputs.to_owned());
        let mut outputs = inputs.dot(&self.weights) + &self.biases.view().insert_axis(Axis(0));
        self.pre_activation_output = Some(outputs.clone());
        self.activation.apply_batch(&mut outputs);
        outputs
    }

    /// Returns `(adjusted_error, weight_gradients, bias_gradients)` for a batch of
    /// errors with respect to this layer's outputs.
    pub fn backward_batch(&self, output_errors: ArrayView2<f32>) -> Result<(Array2<f32>, Array2<f32>, Array1<f32>)> {
        let (pre_activation_output, inputs) = match (&self.pre_activation_output, &self.inputs) {
            (Some(pre), Some(inputs)) => (pre, inputs),
            _ => {
                return Err(TrafficError::invalid_parameter(
                    "layer",
                    "forward_batch() must be called before backward_batch()",
                ))
            }
        };

        let activation_deriv = self.activation.derivative_batch(pre_activation_output.view());
        let adjusted_error = output_errors.to_owned() * &activation_deriv;
        let weight_gradients = inputs.t().dot(&adjusted_error);
        let bias_gradients = adjusted_error.sum_axis(Axis(0));

        Ok((adjusted_error, weight_gradients, bias_gradients))
    }

    /// Blend this layer's parameters toward `source`:
    /// `self = tau * source + (1 - tau) * self`.
    pub fn soft_update_from(&mut self, source: &DenseLayer, tau: f32) -> Result<()> {
        if self.weights.dim() != source.weights.dim() {
            return Err(TrafficError::dimension_mismatch(
                format!("{:?}", self.weights.dim()),
                format!("{:?}", source.weights.dim()),
            ));
        }
        self.weights.zip_mut_with(&source.weights, |t, &l| *t = tau * l + (1.0 - tau) * *t);
        self.biases.zip_mut_with(&source.biases, |t, &l| *t = tau * l + (1.0 - tau) * *t);
        Ok(())
    }
}
