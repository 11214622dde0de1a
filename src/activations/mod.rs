//! # Activation Functions Module
//!
//! Element-wise non-linearities applied after each dense layer of the
//! Q-network.
//!
//! - **ReLU**: `max(0, x)`, used for every hidden layer
//! - **LeakyReLU**: ReLU with a small negative slope
//! - **Linear**: identity, used for the Q-value output layer
//!
//! ```rust,no_run
//! use signal_ddqn::activations::Activation;
//! use ndarray::array;
//!
//! let mut data = array![[1.0, -0.5], [0.0, 2.0]];
//! Activation::Relu.apply_batch(&mut data);
//! ```

pub mod functions;

pub use functions::Activation;
