use ndarray::{Array1, ArrayView1};

/// Trait defining the interface for loss functions over a batch of scalar
/// predictions (one expected Q-value per sampled transition).
pub trait Loss: Send + Sync {
    /// Compute the loss for a batch of predictions and targets
    fn compute(&self, predictions: ArrayView1<f32>, targets: ArrayView1<f32>) -> f32;

    /// Compute the gradient of the loss with respect to predictions
    fn gradient(&self, predictions: ArrayView1<f32>, targets: ArrayView1<f32>) -> Array1<f32>;
}

/// Mean Squared Error loss: `mean((prediction - target)^2)`
pub struct MSE;

impl Loss for MSE {
    fn compute(&self, predictions: ArrayView1<f32>, targets: ArrayView1<f32>) -> f32 {
        if predictions.is_empty() {
            return 0.0;
        }
        let diff = &predictions - &targets;
        (&diff * &diff).sum() / predictions.len() as f32
    }

    fn gradient(&self, predictions: ArrayView1<f32>, targets: ArrayView1<f32>) -> Array1<f32> {
        let n = predictions.len().max(1) as f32;
        (&predictions - &targets) * (2.0 / n)
    }
}
