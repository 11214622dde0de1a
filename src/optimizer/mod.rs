use ndarray::{Array1, Array2};
use serde::{Serialize, Deserialize};
use crate::layers::DenseLayer;

/// Parameter update rule applied layer by layer after backpropagation.
///
/// `layer` is the index of the layer inside its network so stateful
/// optimizers can keep one set of moments per parameter tensor.
pub trait Optimizer {
    fn update_weights(&mut self, layer: usize, weights: &mut Array2<f32>, gradients: &Array2<f32>, learning_rate: f32);
    fn update_biases(&mut self, layer: usize, biases: &mut Array1<f32>, gradients: &Array1<f32>, learning_rate: f32);

    /// Called once after every layer has been updated for a batch.
    fn finish_step(&mut self) {}
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub enum OptimizerWrapper {
    SGD(SGD),
    Adam(Adam),
}

impl Optimizer for OptimizerWrapper {
    fn update_weights(&mut self, layer: usize, weights: &mut Array2<f32>, gradients: &Array2<f32>, learning_rate: f32) {
        match self {
            OptimizerWrapper::SGD(optimizer) => optimizer.update_weights(layer, weights, gradients, learning_rate),
            OptimizerWrapper::Adam(optimizer) => optimizer.update_weights(layer, weights, gradients, learning_rate),
        }
    }

    fn update_biases(&mut self, layer: usize, biases: &mut Array1<f32>, gradients: &Array1<f32>, learning_rate: f32) {
        match self {
            OptimizerWrapper::SGD(optimizer) => optimizer.update_biases(layer, biases, gradients, learning_rate),
            OptimizerWrapper::Adam(optimizer) => optimizer.update_biases(layer, biases, gradients, learning_rate),
        }
    }

    fn finish_step(&mut self) {
        match self {
            OptimizerWrapper::SGD(optimizer) => optimizer.finish_step(),
            OptimizerWrapper::Adam(optimizer) => optimizer.finish_step(),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct SGD;

impl SGD {
    pub fn new() -> SGD {
        SGD
    }
}

impl Default for SGD {
    fn default() -> Self {
        Self::new()
    }
}

impl Optimizer for SGD {
    fn update_weights(&mut self, _layer: usize, weights: &mut Array2<f32>, gradients: &Array2<f32>, learning_rate: f32) {
        weights.zip_mut_with(gradients, |w, &g| *w -= learning_rate * g);
    }

    fn update_biases(&mut self, _layer: usize, biases: &mut Array1<f32>, gradients: &Array1<f32>, learning_rate: f32) {
        biases.zip_mut_with(gradients, |b, &g| *b -= learning_rate * g);
    }
}

/// Adam with bias-corrected first and second moments per layer.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Adam {
    pub beta1: f32,
    pub beta2: f32,
    pub epsilon: f32,
    m_weights: Vec<Array2<f32>>,
    v_weights: Vec<Array2<f32>>,
    m_biases: Vec<Array1<f32>>,
    v_biases: Vec<Array1<f32>>,
    pub t: i32,
}

impl Adam {
    pub fn new(layers: &[DenseLayer], beta1: f32, beta2: f32, epsilon: f32) -> Self {
        Adam {
            beta1,
            beta2,
            epsilon,
            m_weights: layers.iter().map(|l| Array2::zeros(l.weights.dim())).collect(),
            v_weights: layers.iter().map(|l| Array2::zeros(l.weights.dim())).collect(),
            m_biases: layers.iter().map(|l| Array1::zeros(l.biases.dim())).collect(),
            v_biases: layers.iter().map(|l| Array1::zeros(l.biases.dim())).collect(),
            t: 1,
        }
    }

    pub fn default(layers: &[DenseLayer]) -> Self {
        Self::new(layers, 0.9, 0.999, 1e-8)
    }

    fn corrections(&self) -> (f32, f32) {
        (1.0 - self.beta1.powi(self.t), 1.0 - self.beta2.powi(self.t))
    }
}

impl Optimizer for Adam {
    fn update_weights(&mut self, layer: usize, weights: &mut Array2<f32>, gradients: &Array2<f32>, learning_rate: f32) {
        let (beta1, beta2, eps) = (self.beta1, self.beta2, self.epsilon);
        let (c1, c2) = self.corrections();
        let m = &mut self.m_weights[layer];
        let v = &mut self.v_weights[layer];

        m.zip_mut_with(gradients, |m, &g| *m = beta1 * *m + (1.0 - beta1) * g);
        v.zip_mut_with(gradients, |v, &g| *v = beta2 * *v + (1.0 - beta2) * g * g);

        ndarray::Zip::from(weights)
            .and(&*m)
            .and(&*v)
            .for_each(|w, &m, &v| *w -= learning_rate * (m / c1) / ((v / c2).sqrt() + eps));
    }

    fn update_biases(&mut self, layer: usize, biases: &mut Array1<f32>, gradients: &Array1<f32>, learning_rate: f32) {
        let (beta1, beta2, eps) = (self.beta1, self.beta2, self.epsilon);
        let (c1, c2) = self.corrections();
        let m = &mut self.m_biases[layer];
        let v = &mut self.v_biases[layer];

        m.zip_mut_with(gradients, |m, &g| *m = beta1 * *m + (1.0 - beta1) * g);
        v.zip_mut_with(gradients, |v, &g| *v = beta2 * *v + (1.0 - beta2) * g * g);

        ndarray::Zip::from(biases)
            .and(&*m)
            .and(&*v)
            .for_each(|b, &m, &v| *b -= learning_rate * (m / c1) / ((v / c2).sqrt() + eps));
    }

    fn finish_step(&mut self) {
        self.t = self.t.saturating_add(1);
    }
}
