use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::activations::Activation;
use crate::agent::OptimizerKind;
use crate::error::{Result, TrafficError};
use crate::intersection::{PhaseTimings, PEDESTRIAN_STATE_WIDTH, SIGNAL_PLANS, VEHICLE_STATE_WIDTH};

/// Every knob of a training run.
///
/// Loaded from JSON; missing fields take the defaults below.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    pub total_episodes: usize,
    /// Simulator ticks per episode.
    pub max_steps: usize,
    pub n_peds_generated: usize,

    pub green_duration: usize,
    pub ped_green_duration: usize,
    pub yellow_duration: usize,
    pub ped_yellow_duration: usize,

    pub gamma: f32,
    pub learning_rate: f32,
    pub tau: f32,
    pub optimizer: OptimizerKind,
    pub hidden_layers: Vec<usize>,
    /// Non-linearity of every hidden layer; the output layer is always linear.
    pub hidden_activation: Activation,

    pub batch_size: usize,
    pub memory_size: usize,
    /// Learning steps after each episode.
    pub training_epochs: usize,

    pub num_states: usize,
    pub num_state_veh: usize,
    pub num_actions: usize,

    pub epsilon_start: f32,
    pub epsilon_end: f32,

    pub gui: bool,
    pub sumo_binary: String,
    pub sumocfg_file: PathBuf,
    pub route_file: PathBuf,
    pub models_path: PathBuf,
    pub seed: Option<u64>,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        TrainingConfig {
            total_episodes: 100,
            max_steps: 5400,
            n_peds_generated: 300,
            green_duration: 10,
            ped_green_duration: 10,
            yellow_duration: 4,
            ped_yellow_duration: 4,
            gamma: 0.75,
            learning_rate: 1e-3,
            tau: 0.005,
            optimizer: OptimizerKind::Adam,
            hidden_layers: vec![400, 400, 400],
            hidden_activation: Activation::Relu,
            batch_size: 100,
            memory_size: 50_000,
            training_epochs: 800,
            num_states: VEHICLE_STATE_WIDTH + PEDESTRIAN_STATE_WIDTH,
            num_state_veh: VEHICLE_STATE_WIDTH,
            num_actions: SIGNAL_PLANS.len(),
            epsilon_start: 1.0,
            epsilon_end: 0.0,
            gui: false,
            sumo_binary: "sumo".to_string(),
            sumocfg_file: PathBuf::from("intersection/sumo_config.sumocfg"),
            route_file: PathBuf::from("intersection/episode_routes.rou.xml"),
            models_path: PathBuf::from("models"),
            seed: None,
        }
    }
}

impl TrainingConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Reject configurations that cannot drive a run.
    pub fn validate(&self) -> Result<()> {
        let fail = |msg: String| Err(TrafficError::Config(msg));

        if self.total_episodes == 0 {
            return fail("total_episodes must be positive".into());
        }
        if self.max_steps == 0 {
            return fail("max_steps must be positive".into());
        }
        if self.green_duration == 0 || self.ped_green_duration == 0 {
            return fail("green durations must be positive".into());
        }
        if self.num_actions < 2 || self.num_actions > SIGNAL_PLANS.len() {
            return fail(format!("num_actions must lie in [2, {}], got {}", SIGNAL_PLANS.len(), self.num_actions));
        }
        if self.num_state_veh != VEHICLE_STATE_WIDTH {
            return fail(format!("num_state_veh must be {}, got {}", VEHICLE_STATE_WIDTH, self.num_state_veh));
        }
        if self.num_states != VEHICLE_STATE_WIDTH + PEDESTRIAN_STATE_WIDTH {
            return fail(format!(
                "num_states must be {} + {}, got {}",
                VEHICLE_STATE_WIDTH, PEDESTRIAN_STATE_WIDTH, self.num_states
            ));
        }
        if self.hidden_layers.iter().any(|&width| width == 0) {
            return fail("hidden layer widths must be positive".into());
        }
        if let Activation::LeakyRelu { alpha } = self.hidden_activation {
            if !alpha.is_finite() || alpha < 0.0 {
                return fail(format!("leaky relu alpha must be finite and non-negative, got {}", alpha));
            }
        }
        if self.batch_size == 0 || self.memory_size == 0 {
            return fail("batch_size and memory_size must be positive".into());
        }
        if self.batch_size > self.memory_size {
            return fail(format!("batch_size {} exceeds memory_size {}", self.batch_size, self.memory_size));
        }
        if !(0.0..=1.0).contains(&self.gamma) {
            return fail(format!("gamma must lie in [0, 1], got {}", self.gamma));
        }
        if !(self.tau > 0.0 && self.tau <= 1.0) {
            return fail(format!("tau must lie in (0, 1], got {}", self.tau));
        }
        if !(self.learning_rate > 0.0) {
            return fail(format!("learning_rate must be positive, got {}", self.learning_rate));
        }
        if !(0.0..=1.0).contains(&self.epsilon_end) || !(0.0..=1.0).contains(&self.epsilon_start) {
            return fail("epsilon bounds must lie in [0, 1]".into());
        }
        if self.epsilon_end > self.epsilon_start {
            return fail(format!(
                "epsilon_end {} exceeds epsilon_start {}",
                self.epsilon_end, self.epsilon_start
            ));
        }
        Ok(())
    }

    pub fn timings(&self) -> PhaseTimings {
        PhaseTimings {
            green: self.green_duration,
            pedestrian_green: self.ped_green_duration,
            yellow: self.yellow_duration,
            pedestrian_yellow: self.ped_yellow_duration,
        }
    }

    /// Input width, hidden widths, action count.
    pub fn layer_sizes(&self) -> Vec<usize> {
        let mut sizes = Vec::with_capacity(self.hidden_layers.len() + 2);
        sizes.push(self.num_states);
        sizes.extend_from_slice(&self.hidden_layers);
        sizes.push(self.num_actions);
        sizes
    }

    /// `1 - episode / total`, clamped into `[epsilon_end, epsilon_start]`.
    pub fn epsilon_for(&self, episode: usize) -> f32 {
        let linear = 1.0 - episode as f32 / self.total_episodes.max(1) as f32;
        linear.clamp(self.epsilon_end, self.epsilon_start)
    }

    /// Simulator command line without the remote port.
    pub fn sumo_command(&self) -> Vec<String> {
        let binary = if self.gui {
            format!("{}-gui", self.sumo_binary)
        } else {
            self.sumo_binary.clone()
        };
        vec![
            binary,
            "-c".to_string(),
            self.sumocfg_file.display().to_string(),
            "--no-step-log".to_string(),
            "true".to_string(),
            "--waiting-time-memory".to_string(),
            self.max_steps.to_string(),
        ]
    }
}

/// Create `<models_path>/model_<n>`, numbered one past the largest existing
/// run directory (`model_1` in an empty folder).
pub fn create_run_dir<P: AsRef<Path>>(models_path: P) -> Result<PathBuf> {
    let models_path = models_path.as_ref();
    std::fs::create_dir_all(models_path)?;

    let mut last = 0usize;
    for entry in std::fs::read_dir(models_path)? {
        let name = entry?.file_name();
        let Some(name) = name.to_str() else { continue };
        if let Some(n) = name.strip_prefix("model_").and_then(|n| n.parse::<usize>().ok()) {
            last = last.max(n);
        }
    }

    let dir = models_path.join(format!("model_{}", last + 1));
    std::fs::create_dir(&dir)?;
    Ok(dir)
}
