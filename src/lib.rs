//! # signal-ddqn - Deep Reinforcement Learning for a Signalised Intersection
//!
//! Trains a Double Deep Q-Network to pick the next signal phase of a single
//! four-way intersection carrying both vehicles and pedestrians. Every
//! decision interval the controller observes the intersection, encodes
//! vehicle and pedestrian positions into a 186-bit occupancy vector and
//! chooses one of five signal plans.
//!
//! ## Key Features
//!
//! - **State encoding**: 80 vehicle bits (8 lane groups × 10 distance cells)
//!   and 106 pedestrian bits (waiting areas, crosswalks, scramble crosswalks)
//! - **DDQN**: independently initialised local and target networks, MSE on
//!   the taken action, soft target updates
//! - **Replay memory**: fixed-capacity circular storage sampled without
//!   replacement
//! - **Phase control**: clearance phases between differing greens, bursts
//!   clipped at the episode end
//! - **Simulator seam**: a [`Simulator`](simulator::Simulator) trait with a
//!   SUMO TraCI client and an in-process scripted stand-in
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use signal_ddqn::agent::DdqnAgent;
//! use signal_ddqn::config::{create_run_dir, TrainingConfig};
//! use signal_ddqn::demand::TrafficGenerator;
//! use signal_ddqn::simulator::SumoSimulator;
//! use signal_ddqn::trainer::Trainer;
//!
//! let config = TrainingConfig::load("training.json")?;
//! let agent = DdqnAgent::new(&config.layer_sizes(), config.gamma, config.tau, config.learning_rate, config.optimizer)?;
//! let demand = TrafficGenerator::new(config.max_steps, config.n_peds_generated, &config.route_file)?;
//! let mut trainer = Trainer::new(&config, SumoSimulator::new(), demand, agent)?;
//!
//! trainer.train(config.total_episodes, |episode| config.epsilon_for(episode))?;
//! trainer.save(create_run_dir(&config.models_path)?)?;
//! # Ok::<(), signal_ddqn::error::TrafficError>(())
//! ```
//!
//! ## Module Organization
//!
//! - [`activations`] - Activation functions (ReLU, Linear, LeakyReLU)
//! - [`agent`] - The DDQN agent and its builder
//! - [`config`] - Training configuration and run directories
//! - [`demand`] - Per-episode route-file generation
//! - [`error`] - Error types and result handling
//! - [`intersection`] - Topology constants, state encoder, waiting times, phase controller
//! - [`layers`] - Dense layers
//! - [`loss`] - Loss functions for training
//! - [`network`] - Core neural network implementation
//! - [`optimizer`] - Optimization algorithms
//! - [`replay_buffer`] - Experience replay
//! - [`simulator`] - Simulator trait, TraCI client, scripted simulator
//! - [`trainer`] - Episode loop, rewards, per-episode statistics

pub mod activations;
pub mod agent;
pub mod config;
pub mod demand;
pub mod error;
pub mod intersection;
pub mod layers;
pub mod loss;
pub mod network;
pub mod optimizer;
pub mod replay_buffer;
pub mod simulator;
pub mod trainer;

#[cfg(test)]
mod tests;
