//! # Trainer Module
//!
//! Drives one simulated episode after another and trains the agent between
//! them.
//!
//! ## Episode lifecycle
//!
//! 1. **Init**: generate the demand for `seed = episode`, start the
//!    simulator, reset the waiting-time maps and accumulators.
//! 2. **Step** (until `max_steps` ticks have run): encode the state, collect
//!    cumulative waits, compute the reward of the previous decision, store
//!    the transition (not on the first decision), choose an action
//!    epsilon-greedily and let the [`PhaseController`] run its clearance and
//!    green phases.
//! 3. **Terminate**: close the simulator and append the episode statistics.
//! 4. **Learn**: `training_epochs` times sample a batch (skipped while the
//!    memory holds fewer transitions than the batch size), take a gradient
//!    step and soft-update the target network.
//!
//! ## Example
//!
//! ```rust,no_run
//! use signal_ddqn::agent::DdqnAgent;
//! use signal_ddqn::config::TrainingConfig;
//! use signal_ddqn::demand::TrafficGenerator;
//! use signal_ddqn::simulator::SumoSimulator;
//! use signal_ddqn::trainer::Trainer;
//!
//! let config = TrainingConfig::default();
//! let agent = DdqnAgent::new(&config.layer_sizes(), config.gamma, config.tau, config.learning_rate, config.optimizer)?;
//! let demand = TrafficGenerator::new(config.max_steps, config.n_peds_generated, &config.route_file)?;
//! let mut trainer = Trainer::new(&config, SumoSimulator::new(), demand, agent)?;
//!
//! let report = trainer.run_episode(0, config.epsilon_for(0))?;
//! println!("negative reward: {}", report.record.reward);
//! # Ok::<(), signal_ddqn::error::TrafficError>(())
//! ```

mod reward;
mod stats;

pub use reward::{NegativeRewards, Reward, EMERGENCY_STOP_PENALTY, PEDESTRIAN_WAIT_SCALE};
pub use stats::{EpisodeRecord, EpisodeStats};

use log::{debug, info, warn};
use ndarray::Array1;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::Path;
use std::time::{Duration, Instant};

use crate::agent::DdqnAgent;
use crate::config::TrainingConfig;
use crate::demand::DemandGenerator;
use crate::error::{Result, TrafficError};
use crate::intersection::{PhaseController, StateEncoder, WaitingTimes, TLS_ID};
use crate::replay_buffer::ReplayMemory;
use crate::simulator::Simulator;

/// File name of the saved agent inside a run directory.
pub const MODEL_FILE: &str = "trained_model.bin";

/// Outcome of one [`Trainer::run_episode`] call.
#[derive(Clone, Debug, PartialEq)]
pub struct EpisodeReport {
    pub episode: usize,
    pub record: EpisodeRecord,
    /// Transitions stored during the episode.
    pub transitions: usize,
    /// Gradient steps taken after the episode.
    pub learning_updates: usize,
    /// Mean learning loss, `None` when no update ran.
    pub mean_loss: Option<f32>,
    pub simulation_time: Duration,
    pub training_time: Duration,
}

/// Episode loop owning the simulator handle and every learning component.
pub struct Trainer<S: Simulator, G: DemandGenerator> {
    simulator: S,
    demand: G,
    agent: DdqnAgent,
    memory: ReplayMemory,
    encoder: StateEncoder,
    controller: PhaseController,
    waits: WaitingTimes,
    stats: EpisodeStats,
    command: Vec<String>,
    batch_size: usize,
    training_epochs: usize,
    rng: StdRng,
}

impl<S: Simulator, G: DemandGenerator> Trainer<S, G> {
    /// Wire up a trainer; fails when the agent's input or output width does
    /// not match the encoder and the configured action count.
    pub fn new(config: &TrainingConfig, simulator: S, demand: G, agent: DdqnAgent) -> Result<Self> {
        config.validate()?;
        let encoder = StateEncoder::new();
        if agent.state_size() != encoder.width() {
            return Err(TrafficError::dimension_mismatch(
                format!("network input width {}", encoder.width()),
                format!("network input width {}", agent.state_size()),
            ));
        }
        if agent.n_actions() != config.num_actions {
            return Err(TrafficError::dimension_mismatch(
                format!("{} actions", config.num_actions),
                format!("{} actions", agent.n_actions()),
            ));
        }

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(Trainer {
            simulator,
            demand,
            agent,
            memory: ReplayMemory::new(config.memory_size, encoder.width())?,
            encoder,
            controller: PhaseController::new(TLS_ID, config.timings(), config.max_steps),
            waits: WaitingTimes::new(),
            stats: EpisodeStats::new(),
            command: config.sumo_command(),
            batch_size: config.batch_size,
            training_epochs: config.training_epochs,
            rng,
        })
    }

    pub fn agent(&self) -> &DdqnAgent {
        &self.agent
    }

    pub fn agent_mut(&mut self) -> &mut DdqnAgent {
        &mut self.agent
    }

    pub fn into_agent(self) -> DdqnAgent {
        self.agent
    }

    pub fn memory(&self) -> &ReplayMemory {
        &self.memory
    }

    pub fn stats(&self) -> &EpisodeStats {
        &self.stats
    }

    pub fn simulator(&self) -> &S {
        &self.simulator
    }

    pub fn demand(&self) -> &G {
        &self.demand
    }

    pub fn controller(&self) -> &PhaseController {
        &self.controller
    }

    /// Simulate episode `episode` with exploration rate `epsilon`, then learn.
    pub fn run_episode(&mut self, episode: usize, epsilon: f32) -> Result<EpisodeReport> {
        let start = Instant::now();
        self.demand.generate(episode as u64)?;
        self.simulator.start(&self.command)?;
        self.controller.reset();
        self.waits.reset();

        // the simulator is closed even when the episode fails
        let outcome = self.simulate(epsilon);
        let closed = self.simulator.close();
        let (negative, transitions) = outcome?;
        closed?;

        let max_steps = self.controller.max_steps().max(1) as f64;
        let record = EpisodeRecord {
            reward: negative.total,
            vehicle_reward: negative.vehicle,
            pedestrian_reward: negative.pedestrian,
            cumulative_wait: self.controller.sum_waiting_time() as f64,
            avg_queue_length: self.controller.sum_queue_length() as f64 / max_steps,
            avg_pedestrian_queue_length: self.waits.pedestrian_queue() as f64 / max_steps,
            emergency_stops: self.controller.emergency_stops(),
            epsilon,
        };
        self.stats.record(&record);
        let simulation_time = start.elapsed();
        info!(
            "episode {}: reward {:.2} (veh {:.2}, ped {:.2}), epsilon {:.2}, {} transitions",
            episode, record.reward, record.vehicle_reward, record.pedestrian_reward, epsilon, transitions
        );

        let start = Instant::now();
        let losses = self.learn()?;
        let training_time = start.elapsed();
        let mean_loss = if losses.is_empty() {
            None
        } else {
            Some(losses.iter().sum::<f32>() / losses.len() as f32)
        };
        info!(
            "episode {}: simulation {:.1}s, training {:.1}s",
            episode,
            simulation_time.as_secs_f32(),
            training_time.as_secs_f32()
        );

        Ok(EpisodeReport {
            episode,
            record,
            transitions,
            learning_updates: losses.len(),
            mean_loss,
            simulation_time,
            training_time,
        })
    }

    /// Run episodes `0..episodes`, taking each epsilon from `schedule`.
    pub fn train<F: Fn(usize) -> f32>(&mut self, episodes: usize, schedule: F) -> Result<Vec<EpisodeReport>> {
        let mut reports = Vec::with_capacity(episodes);
        for episode in 0..episodes {
            info!("----- episode {} of {}", episode + 1, episodes);
            reports.push(self.run_episode(episode, schedule(episode))?);
        }
        Ok(reports)
    }

    /// Write the agent and the per-episode series into `dir`.
    pub fn save<P: AsRef<Path>>(&self, dir: P) -> Result<()> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        self.agent.save(dir.join(MODEL_FILE))?;
        self.stats.save(dir)
    }

    fn simulate(&mut self, epsilon: f32) -> Result<(NegativeRewards, usize)> {
        let mut negative = NegativeRewards::default();
        let mut previous: Option<(Array1<f32>, usize)> = None;
        let mut old_vehicle_wait = 0.0;
        let mut old_pedestrian_wait = 0.0;
        let mut transitions = 0;

        while !self.controller.is_finished() {
            let state = self.encoder.encode_state(&mut self.simulator)?;
            let vehicle_wait = self.waits.collect_vehicles(&mut self.simulator)?;
            let pedestrian_wait = self.waits.collect_pedestrians(&mut self.simulator)?;
            let stops = self.controller.take_decision_stops();
            let reward = Reward::compute(old_vehicle_wait, vehicle_wait, old_pedestrian_wait, pedestrian_wait, stops);

            if let Some((old_state, old_action)) = &previous {
                self.memory.store(
                    old_state.view(),
                    state.view(),
                    *old_action,
                    reward.total as f32,
                    reward.vehicle as f32,
                    reward.pedestrian as f32,
                )?;
                transitions += 1;
            }

            let action = self.agent.act(state.view(), epsilon)?;
            let previous_action = previous.as_ref().map(|(_, action)| *action);
            self.controller
                .transition(&mut self.simulator, &mut self.waits, previous_action, action)?;

            previous = Some((state, action));
            old_vehicle_wait = vehicle_wait;
            old_pedestrian_wait = pedestrian_wait;
            negative.accumulate(&reward);
        }
        Ok((negative, transitions))
    }

    fn learn(&mut self) -> Result<Vec<f32>> {
        let mut losses = Vec::with_capacity(self.training_epochs);
        for _ in 0..self.training_epochs {
            let Some(batch) = self.memory.sample(self.batch_size, &mut self.rng) else {
                continue;
            };
            losses.push(self.agent.learn(&batch)?);
        }
        if losses.is_empty() && self.training_epochs > 0 {
            warn!(
                "replay memory holds {} transitions, fewer than batch size {}; learning skipped",
                self.memory.valid_len(),
                self.batch_size
            );
        } else if let Some(last) = losses.last() {
            debug!("{} learning steps, last loss {:.4}", losses.len(), last);
        }
        Ok(losses)
    }
}
