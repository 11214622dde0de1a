use ndarray::{Array1, Array2, ArrayView1};
use rand::Rng;
use rand::seq::index;

use crate::error::{Result, TrafficError};

/// One decision interval seen by the agent.
#[derive(Clone, Debug, PartialEq)]
pub struct Transition {
    pub old_state: Array1<f32>,
    pub new_state: Array1<f32>,
    pub action: usize,
    pub reward: f32,
    pub reward_vehicle: f32,
    pub reward_pedestrian: f32,
}

/// A batch of transitions gathered into row-major matrices for the learner.
#[derive(Clone, Debug)]
pub struct Batch {
    pub states: Array2<f32>,
    pub next_states: Array2<f32>,
    pub actions: Vec<usize>,
    pub rewards: Array1<f32>,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

/// Fixed-capacity circular replay memory.
///
/// Storage is four parallel arrays allocated once. The write counter is
/// logical and never wraps: slot = `counter % capacity`, and only
/// `min(counter, capacity)` slots hold valid data.
#[derive(Clone, Debug)]
pub struct ReplayMemory {
    states: Array2<f32>,
    next_states: Array2<f32>,
    actions: Vec<usize>,
    rewards: Array1<f32>,
    rewards_vehicle: Array1<f32>,
    rewards_pedestrian: Array1<f32>,
    capacity: usize,
    counter: usize,
}

impl ReplayMemory {
    pub fn new(capacity: usize, state_size: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(TrafficError::invalid_parameter("capacity", "replay capacity must be positive"));
        }
        Ok(ReplayMemory {
            states: Array2::zeros((capacity, state_size)),
            next_states: Array2::zeros((capacity, state_size)),
            actions: vec![0; capacity],
            rewards: Array1::zeros(capacity),
            rewards_vehicle: Array1::zeros(capacity),
            rewards_pedestrian: Array1::zeros(capacity),
            capacity,
            counter: 0,
        })
    }

    pub fn store(
        &mut self,
        old_state: ArrayView1<f32>,
        new_state: ArrayView1<f32>,
        action: usize,
        reward: f32,
        reward_vehicle: f32,
        reward_pedestrian: f32,
    ) -> Result<()> {
        let width = self.state_size();
        if old_state.len() != width || new_state.len() != width {
            return Err(TrafficError::dimension_mismatch(
                format!("state width {}", width),
                format!("{} / {}", old_state.len(), new_state.len()),
            ));
        }

        let index = self.counter % self.capacity;
        self.states.row_mut(index).assign(&old_state);
        self.next_states.row_mut(index).assign(&new_state);
        self.actions[index] = action;
        self.rewards[index] = reward;
        self.rewards_vehicle[index] = reward_vehicle;
        self.rewards_pedestrian[index] = reward_pedestrian;
        self.counter += 1;
        Ok(())
    }

    pub fn push(&mut self, transition: &Transition) -> Result<()> {
        self.store(
            transition.old_state.view(),
            transition.new_state.view(),
            transition.action,
            transition.reward,
            transition.reward_vehicle,
            transition.reward_pedestrian,
        )
    }

    /// Logical number of stores so far; may exceed `capacity`.
    pub fn len(&self) -> usize {
        self.counter
    }

    pub fn is_empty(&self) -> bool {
        self.counter == 0
    }

    /// Number of slots holding valid transitions.
    pub fn valid_len(&self) -> usize {
        self.counter.min(self.capacity)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn state_size(&self) -> usize {
        self.states.ncols()
    }

    /// Physical slot written by the store with logical index `logical`.
    pub fn slot_of(&self, logical: usize) -> usize {
        logical % self.capacity
    }

    /// Read back the transition held in a physical slot.
    pub fn get(&self, slot: usize) -> Option<Transition> {
        if slot >= self.valid_len() {
            return None;
        }
        Some(Transition {
            old_state: self.states.row(slot).to_owned(),
            new_state: self.next_states.row(slot).to_owned(),
            action: self.actions[slot],
            reward: self.rewards[slot],
            reward_vehicle: self.rewards_vehicle[slot],
            reward_pedestrian: self.rewards_pedestrian[slot],
        })
    }

    /// Draw `batch_size` distinct slots uniformly from the valid range.
    ///
    /// Returns `None` while fewer than `batch_size` transitions have been
    /// stored; callers skip learning in that case.
    pub fn sample<R: Rng + ?Sized>(&self, batch_size: usize, rng: &mut R) -> Option<Batch> {
        if batch_size == 0 || self.valid_len() < batch_size {
            return None;
        }
        let indices = index::sample(rng, self.valid_len(), batch_size).into_vec();
        Some(self.gather(&indices))
    }

    /// Assemble the given slots into a batch.
    pub fn gather(&self, slots: &[usize]) -> Batch {
        let width = self.state_size();
        let mut states = Array2::zeros((slots.len(), width));
        let mut next_states = Array2::zeros((slots.len(), width));
        let mut actions = Vec::with_capacity(slots.len());
        let mut rewards = Array1::zeros(slots.len());

        for (row, &slot) in slots.iter().enumerate() {
            states.row_mut(row).assign(&self.states.row(slot));
            next_states.row_mut(row).assign(&self.next_states.row(slot));
            actions.push(self.actions[slot]);
            rewards[row] = self.rewards[slot];
        }

        Batch { states, next_states, actions, rewards }
    }
}
