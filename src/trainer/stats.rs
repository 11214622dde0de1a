use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;

use crate::error::Result;

/// Summary of one finished episode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EpisodeRecord {
    /// Sum of the negative total rewards.
    pub reward: f64,
    pub vehicle_reward: f64,
    pub pedestrian_reward: f64,
    /// Queued-vehicle seconds over the episode.
    pub cumulative_wait: f64,
    /// Halted vehicles per tick.
    pub avg_queue_length: f64,
    /// Waiting pedestrians per tick.
    pub avg_pedestrian_queue_length: f64,
    pub emergency_stops: u64,
    pub epsilon: f32,
}

/// Append-only per-episode series.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct EpisodeStats {
    pub rewards: Vec<f64>,
    pub vehicle_rewards: Vec<f64>,
    pub pedestrian_rewards: Vec<f64>,
    pub cumulative_waits: Vec<f64>,
    pub avg_queue_lengths: Vec<f64>,
    pub avg_pedestrian_queue_lengths: Vec<f64>,
    pub emergency_stops: Vec<u64>,
    pub epsilons: Vec<f32>,
}

impl EpisodeStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, record: &EpisodeRecord) {
        self.rewards.push(record.reward);
        self.vehicle_rewards.push(record.vehicle_reward);
        self.pedestrian_rewards.push(record.pedestrian_reward);
        self.cumulative_waits.push(record.cumulative_wait);
        self.avg_queue_lengths.push(record.avg_queue_length);
        self.avg_pedestrian_queue_lengths.push(record.avg_pedestrian_queue_length);
        self.emergency_stops.push(record.emergency_stops);
        self.epsilons.push(record.epsilon);
    }

    pub fn len(&self) -> usize {
        self.rewards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rewards.is_empty()
    }

    /// Write every series as `plot_<name>_data.txt` (one value per line)
    /// plus `training_stats.csv` into `dir`.
    pub fn save<P: AsRef<Path>>(&self, dir: P) -> Result<()> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        write_series(&dir.join("plot_reward_data.txt"), &self.rewards)?;
        write_series(&dir.join("plot_reward_veh_data.txt"), &self.vehicle_rewards)?;
        write_series(&dir.join("plot_reward_ped_data.txt"), &self.pedestrian_rewards)?;
        write_series(&dir.join("plot_delay_data.txt"), &self.cumulative_waits)?;
        write_series(&dir.join("plot_queue_data.txt"), &self.avg_queue_lengths)?;
        write_series(&dir.join("plot_queue_ped_data.txt"), &self.avg_pedestrian_queue_lengths)?;
        self.export_csv(dir.join("training_stats.csv"))
    }

    /// One row per episode.
    pub fn export_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut file = std::fs::File::create(path)?;
        writeln!(
            file,
            "episode,reward,reward_veh,reward_ped,cumulative_wait,avg_queue_len,avg_ped_queue_len,emergency_stops,epsilon"
        )?;
        for i in 0..self.len() {
            writeln!(
                file,
                "{},{},{},{},{},{},{},{},{}",
                i,
                self.rewards[i],
                self.vehicle_rewards[i],
                self.pedestrian_rewards[i],
                self.cumulative_waits[i],
                self.avg_queue_lengths[i],
                self.avg_pedestrian_queue_lengths[i],
                self.emergency_stops[i],
                self.epsilons[i],
            )?;
        }
        Ok(())
    }
}

fn write_series<T: std::fmt::Display>(path: &Path, values: &[T]) -> Result<()> {
    let mut file = std::fs::File::create(path)?;
    for value in values {
        writeln!(file, "{}", value)?;
    }
    Ok(())
}
