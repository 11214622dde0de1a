use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use serde::{Serialize, Deserialize};

use crate::activations::Activation;
use crate::error::{Result, TrafficError};
use crate::layers::DenseLayer;
use crate::optimizer::{Optimizer, OptimizerWrapper};

/// A feed-forward network of dense layers together with the optimizer that
/// trains it.
///
/// Two calling conventions exist: [`predict`](Self::predict) /
/// [`predict_batch`](Self::predict_batch) evaluate the network without side
/// effects, while [`train_on_output_gradient`](Self::train_on_output_gradient)
/// runs a cached forward pass, backpropagates and applies one optimizer step.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct NeuralNetwork {
    pub layers: Vec<DenseLayer>,
    pub optimizer: OptimizerWrapper,
}

impl NeuralNetwork {
    /// Create a new neural network with the given layer sizes, activations, and optimizer.
    pub fn new(layer_sizes: &[usize], activations: &[Activation], optimizer: OptimizerWrapper) -> Result<Self> {
        if layer_sizes.len() < 2 {
            return Err(TrafficError::invalid_parameter(
                "layer_sizes",
                "network needs at least an input and an output layer",
            ));
        }
        if layer_sizes.len() - 1 != activations.len() {
            return Err(TrafficError::dimension_mismatch(
                format!("{} activations", layer_sizes.len() - 1),
                format!("{} activations", activations.len()),
            ));
        }
        if layer_sizes.iter().any(|&size| size == 0) {
            return Err(TrafficError::invalid_parameter("layer_sizes", "layer widths must be positive"));
        }

        let layers = layer_sizes
            .windows(2)
            .zip(activations.iter())
            .map(|(window, &activation)| DenseLayer::new(window[0], window[1], activation))
            .collect::<Vec<_>>();

        Ok(NeuralNetwork { layers, optimizer })
    }

    /// Replace the layers, e.g. with hand-set weights in tests.
    #[cfg(test)]
    pub(crate) fn with_layers(mut self, layers: Vec<DenseLayer>) -> Self {
        self.layers = layers;
        self
    }

    pub fn input_size(&self) -> usize {
        self.layers.first().map(|l| l.input_size()).unwrap_or(0)
    }

    pub fn output_size(&self) -> usize {
        self.layers.last().map(|l| l.output_size()).unwrap_or(0)
    }

    /// Evaluate a single input vector.
    pub fn predict(&self, input: ArrayView1<f32>) -> Array1<f32> {
        let output = self.predict_batch(input.insert_axis(Axis(0)));
        output.index_axis_move(Axis(0), 0)
    }

    /// Evaluate a batch of input vectors, one per row.
    pub fn predict_batch(&self, inputs: ArrayView2<f32>) -> Array2<f32> {
        let mut current_output = inputs.to_owned();
        for layer in &self.layers {
            current_output = layer.predict_batch(current_output.view());
        }
        current_output
    }

    fn forward_batch(&mut self, inputs: ArrayView2<f32>) -> Array2<f32> {
        let mut current_output = inputs.to_owned();
        for layer in &mut self.layers {
            current_output = layer.forward_batch(current_output.view());
        }
        current_output
    }

    fn backward_batch(&self, output_errors: ArrayView2<f32>) -> Result<Vec<(Array2<f32>, Array1<f32>)>> {
        let mut gradients = Vec::with_capacity(self.layers.len());
        let mut current_error = output_errors.to_owned();

        for (i, layer) in self.layers.iter().enumerate().rev() {
            let (adjusted_error, weight_gradients, bias_gradients) = layer.backward_batch(current_error.view())?;
            gradients.push((weight_gradients, bias_gradients));
            if i != 0 {
                current_error = adjusted_error.dot(&layer.weights.t());
            }
        }

        gradients.reverse();
        Ok(gradients)
    }

    /// One gradient step.
    ///
    /// `output_gradient` receives the forward outputs for `inputs` and must
    /// return dLoss/dOutput with the same shape; its scalar result (the loss)
    /// is passed through.
    pub fn train_on_output_gradient<F>(
        &mut self,
        inputs: ArrayView2<f32>,
        learning_rate: f32,
        output_gradient: F,
    ) -> Result<f32>
    where
        F: FnOnce(&Array2<f32>) -> Result<(Array2<f32>, f32)>,
    {
        if inputs.ncols() != self.input_size() {
            return Err(TrafficError::dimension_mismatch(
                format!("{} input columns", self.input_size()),
                format!("{} input columns", inputs.ncols()),
            ));
        }

        let outputs = self.forward_batch(inputs);
        let (output_errors, loss) = output_gradient(&outputs)?;
        if output_errors.dim() != outputs.dim() {
            return Err(TrafficError::dimension_mismatch(
                format!("{:?}", outputs.dim()),
                format!("{:?}", output_errors.dim()),
            ));
        }

        let gradients = self.backward_batch(output_errors.view())?;
        for (index, (layer, (weight_gradients, bias_gradients))) in self.layers.iter_mut().zip(gradients).enumerate() {
            self.optimizer.update_weights(index, &mut layer.weights, &weight_gradients, learning_rate);
            self.optimizer.update_biases(index, &mut layer.biases, &bias_gradients, learning_rate);
        }
        self.optimizer.finish_step();

        Ok(loss)
    }

    /// Blend every parameter toward `source`: `self = tau * source + (1 - tau) * self`.
    pub fn soft_update_from(&mut self, source: &NeuralNetwork, tau: f32) -> Result<()> {
        if self.layers.len() != source.layers.len() {
            return Err(TrafficError::dimension_mismatch(
                format!("{} layers", self.layers.len()),
                format!("{} layers", source.layers.len()),
            ));
        }
        for (target, local) in self.layers.iter_mut().zip(&source.layers) {
            target.soft_update_from(local, tau)?;
        }
        Ok(())
    }
}
