//! # Double DQN Agent Module
//!
//! The Q-function approximator that drives the signal controller: a *local*
//! network trained every learning step and a *target* network that provides
//! the bootstrap values and trails the local one through soft updates.
//!
//! ## Core Concepts
//!
//! - **Double Q-learning**: the expected value `Q_local(s, a)` and the
//!   bootstrap `max_a Q_target(s', a)` come from two independently owned
//!   networks, which damps value overestimation
//! - **Soft update**: after every gradient step the target parameters move a
//!   fraction `tau` toward the local ones
//! - **Epsilon-greedy**: random phase with probability epsilon, otherwise the
//!   phase with the largest local Q-value
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use signal_ddqn::agent::DdqnAgentBuilder;
//! use ndarray::Array1;
//!
//! let mut agent = DdqnAgentBuilder::new()
//!     .layer_sizes(&[186, 256, 256, 5])
//!     .gamma(0.75)
//!     .tau(0.005)
//!     .learning_rate(1e-3)
//!     .build()
//!     .unwrap();
//!
//! let state = Array1::zeros(186);
//! let action = agent.act(state.view(), 0.1).unwrap();
//! ```

mod ddqn;
pub use ddqn::{DdqnAgent, DdqnAgentBuilder, OptimizerKind};
