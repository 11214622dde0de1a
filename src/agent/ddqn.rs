use crate::network::NeuralNetwork;
use crate::activations::Activation;
use crate::optimizer::{Adam, OptimizerWrapper, SGD};
use crate::replay_buffer::Batch;
use crate::loss::{Loss, MSE};
use crate::error::{Result, TrafficError};
use rand::{Rng, SeedableRng, rngs::StdRng};
use ndarray::{Array1, Array2, ArrayView1, Axis};
use serde::{Serialize, Deserialize};
use std::path::Path;

fn entropy_rng() -> StdRng {
    StdRng::from_entropy()
}

/// Which optimizer trains the local network.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum OptimizerKind {
    Sgd,
    #[default]
    Adam,
}

/// Double Deep Q-Network agent with a soft-updated target network
///
/// - `local` is trained on every sampled batch
/// - `target` provides `max_a Q_target(s', a)` for the bootstrap and only ever
///   moves through [`soft_update`](Self::soft_update)
/// - exploration draws from `[0, n_actions - 1)`, so the last action index is
///   only reachable through the greedy branch
///
/// # Example
///
/// ```rust
/// use signal_ddqn::agent::DdqnAgentBuilder;
/// use signal_ddqn::replay_buffer::ReplayMemory;
/// use ndarray::Array1;
///
/// let mut agent = DdqnAgentBuilder::new()
///     .layer_sizes(&[4, 16, 3])
///     .build()
///     .unwrap();
/// let mut memory = ReplayMemory::new(100, 4).unwrap();
///
/// let state = Array1::from(vec![1.0, 0.0, 0.0, 1.0]);
/// let next = Array1::from(vec![0.0, 1.0, 0.0, 1.0]);
/// memory.store(state.view(), next.view(), 1, -2.0, -2.0, 0.0).unwrap();
///
/// let mut rng = rand::thread_rng();
/// if let Some(batch) = memory.sample(1, &mut rng) {
///     let loss = agent.learn(&batch).unwrap();
///     assert!(loss.is_finite());
/// }
/// ```
#[derive(Serialize, Deserialize)]
pub struct DdqnAgent {
    /// Network trained every learning step and used for action selection
    pub local: NeuralNetwork,

    /// Slowly tracking network used for bootstrap targets
    pub target: NeuralNetwork,

    /// Discount factor
    pub gamma: f32,

    /// Soft-update blend factor
    pub tau: f32,

    pub learning_rate: f32,

    /// Number of gradient steps performed
    pub train_steps: usize,

    #[serde(skip, default = "entropy_rng")]
    rng: StdRng,
}

impl DdqnAgent {
    /// Create an agent with ReLU hidden layers, a linear output layer and
    /// two independently initialised networks.
    pub fn new(
        layer_sizes: &[usize],
        gamma: f32,
        tau: f32,
        learning_rate: f32,
        optimizer: OptimizerKind,
    ) -> Result<Self> {
        DdqnAgentBuilder::new()
            .layer_sizes(layer_sizes)
            .gamma(gamma)
            .tau(tau)
            .learning_rate(learning_rate)
            .optimizer(optimizer)
            .build()
    }

    pub fn state_size(&self) -> usize {
        self.local.input_size()
    }

    pub fn n_actions(&self) -> usize {
        self.local.output_size()
    }

    fn check_state(&self, state: ArrayView1<f32>) -> Result<()> {
        if state.len() != self.state_size() {
            return Err(TrafficError::dimension_mismatch(
                format!("state width {}", self.state_size()),
                format!("state width {}", state.len()),
            ));
        }
        Ok(())
    }

    /// Q-values of one state from the local (`use_target == false`) or target network.
    pub fn predict(&self, state: ArrayView1<f32>, use_target: bool) -> Result<Array1<f32>> {
        self.check_state(state)?;
        let network = if use_target { &self.target } else { &self.local };
        Ok(network.predict(state))
    }

    /// Index of the largest local Q-value for `state`; ties go to the lowest index.
    pub fn greedy_action(&self, state: ArrayView1<f32>) -> Result<usize> {
        let q_values = self.predict(state, false)?;
        q_values
            .iter()
            .enumerate()
            .fold(None, |best: Option<(usize, f32)>, (idx, &q)| match best {
                Some((_, best_q)) if !(q > best_q) => best,
                _ => Some((idx, q)),
            })
            .map(|(idx, _)| idx)
            .ok_or_else(|| TrafficError::invalid_parameter("q_values", "network produced no Q-values"))
    }

    /// Random draw from `[0, n_actions - 1)`.
    pub fn explore_action(&mut self) -> usize {
        let upper = self.n_actions().saturating_sub(1).max(1);
        self.rng.gen_range(0..upper)
    }

    /// Select an action using the epsilon-greedy policy
    pub fn act(&mut self, state: ArrayView1<f32>, epsilon: f32) -> Result<usize> {
        self.check_state(state)?;
        if self.rng.gen::<f32>() < epsilon {
            Ok(self.explore_action())
        } else {
            self.greedy_action(state)
        }
    }

    /// One DDQN gradient step on `batch`; returns the MSE loss before the step.
    ///
    /// `target_j = r_j + gamma * max_a Q_target(s'_j, a)` and
    /// `expected_j = Q_local(s_j, a_j)`; only the taken action's output
    /// receives gradient.
    pub fn update(&mut self, batch: &Batch) -> Result<f32> {
        if batch.is_empty() {
            return Err(TrafficError::invalid_parameter("batch", "cannot update on an empty batch"));
        }
        if batch.states.ncols() != self.state_size() || batch.next_states.ncols() != self.state_size() {
            return Err(TrafficError::dimension_mismatch(
                format!("state width {}", self.state_size()),
                format!("state width {}", batch.states.ncols()),
            ));
        }
        let n_actions = self.n_actions();
        if let Some(&action) = batch.actions.iter().find(|&&a| a >= n_actions) {
            return Err(TrafficError::InvalidAction { action, max_actions: n_actions });
        }

        let next_q = self.target.predict_batch(batch.next_states.view());
        let max_next_q = next_q.map_axis(Axis(1), |row| row.fold(f32::NEG_INFINITY, |m, &v| m.max(v)));
        let targets = &batch.rewards + &(max_next_q * self.gamma);

        let actions = &batch.actions;
        let loss = self.local.train_on_output_gradient(batch.states.view(), self.learning_rate, |outputs| {
            let expected: Array1<f32> = actions
                .iter()
                .enumerate()
                .map(|(row, &action)| outputs[[row, action]])
                .collect();
            let loss = MSE.compute(expected.view(), targets.view());
            let gradient = MSE.gradient(expected.view(), targets.view());

            let mut output_errors = Array2::zeros(outputs.dim());
            for (row, &action) in actions.iter().enumerate() {
                output_errors[[row, action]] = gradient[row];
            }
            Ok((output_errors, loss))
        })?;

        self.train_steps += 1;
        Ok(loss)
    }

    /// `target = tau * local + (1 - tau) * target`, per parameter.
    pub fn soft_update(&mut self, tau: f32) -> Result<()> {
        if !(0.0..=1.0).contains(&tau) {
            return Err(TrafficError::invalid_parameter("tau", "must lie in [0, 1]"));
        }
        self.target.soft_update_from(&self.local, tau)
    }

    /// `update` followed by `soft_update` with the configured tau.
    pub fn learn(&mut self, batch: &Batch) -> Result<f32> {
        let loss = self.update(batch)?;
        self.soft_update(self.tau)?;
        Ok(loss)
    }

    /// Save the agent to disk
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let serialized = bincode::serialize(self)?;
        std::fs::write(path, serialized)?;
        Ok(())
    }

    /// Load agent from disk
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = std::fs::read(path)?;
        let agent: Self = bincode::deserialize(&data)?;
        Ok(agent)
    }
}

/// Builder pattern for DdqnAgent
pub struct DdqnAgentBuilder {
    layer_sizes: Vec<usize>,
    hidden_activation: Activation,
    gamma: f32,
    tau: f32,
    learning_rate: f32,
    optimizer: OptimizerKind,
    seed: Option<u64>,
}

impl DdqnAgentBuilder {
    pub fn new() -> Self {
        DdqnAgentBuilder {
            layer_sizes: vec![],
            hidden_activation: Activation::Relu,
            gamma: 0.75,
            tau: 0.005,
            learning_rate: 1e-3,
            optimizer: OptimizerKind::Adam,
            seed: None,
        }
    }

    pub fn layer_sizes(mut self, sizes: &[usize]) -> Self {
        self.layer_sizes = sizes.to_vec();
        self
    }

    pub fn hidden_activation(mut self, activation: Activation) -> Self {
        self.hidden_activation = activation;
        self
    }

    pub fn gamma(mut self, gamma: f32) -> Self {
        self.gamma = gamma;
        self
    }

    pub fn tau(mut self, tau: f32) -> Self {
        self.tau = tau;
        self
    }

    pub fn learning_rate(mut self, learning_rate: f32) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    pub fn optimizer(mut self, optimizer: OptimizerKind) -> Self {
        self.optimizer = optimizer;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    fn network(&self) -> Result<NeuralNetwork> {
        let mut activations = vec![self.hidden_activation; self.layer_sizes.len().saturating_sub(2)];
        activations.push(Activation::Linear);
        NeuralNetwork::new(&self.layer_sizes, &activations, OptimizerWrapper::SGD(SGD::new()))
    }

    pub fn build(self) -> Result<DdqnAgent> {
        if self.layer_sizes.len() < 2 {
            return Err(TrafficError::invalid_parameter(
                "layer_sizes",
                "Must have at least 2 layers",
            ));
        }
        if self.layer_sizes.last().copied().unwrap_or(0) < 2 {
            return Err(TrafficError::invalid_parameter(
                "layer_sizes",
                "Need at least two actions for exploration",
            ));
        }
        if !(0.0..=1.0).contains(&self.gamma) {
            return Err(TrafficError::invalid_parameter("gamma", "must lie in [0, 1]"));
        }
        if !(self.tau > 0.0 && self.tau <= 1.0) {
            return Err(TrafficError::invalid_parameter("tau", "must lie in (0, 1]"));
        }
        if !(self.learning_rate > 0.0) {
            return Err(TrafficError::invalid_parameter("learning_rate", "must be positive"));
        }

        let mut local = self.network()?;
        let target = self.network()?;
        if self.optimizer == OptimizerKind::Adam {
            local.optimizer = OptimizerWrapper::Adam(Adam::default(&local.layers));
        }

        let rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => entropy_rng(),
        };

        Ok(DdqnAgent {
            local,
            target,
            gamma: self.gamma,
            tau: self.tau,
            learning_rate: self.learning_rate,
            train_steps: 0,
            rng,
        })
    }
}

impl Default for DdqnAgentBuilder {
    fn default() -> Self {
        Self::new()
    }
}
