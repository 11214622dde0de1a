/// Pedestrian waiting time is divided by this before it enters the reward.
pub const PEDESTRIAN_WAIT_SCALE: f64 = 50.0;
/// Penalty per emergency stop observed during the decision interval.
pub const EMERGENCY_STOP_PENALTY: f64 = 100.0;

/// Reward of one decision interval, split by channel.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Reward {
    pub vehicle: f64,
    pub pedestrian: f64,
    pub total: f64,
}

impl Reward {
    /// Decrease of cumulative waiting time between two decisions, minus the
    /// emergency-stop penalty.
    ///
    /// ```rust
    /// use signal_ddqn::trainer::Reward;
    ///
    /// let reward = Reward::compute(30.0, 10.0, 100.0, 50.0, 0);
    /// assert_eq!(reward.vehicle, 20.0);
    /// assert_eq!(reward.pedestrian, 1.0);
    /// assert_eq!(reward.total, 21.0);
    /// ```
    pub fn compute(
        old_vehicle_wait: f64,
        new_vehicle_wait: f64,
        old_pedestrian_wait: f64,
        new_pedestrian_wait: f64,
        emergency_stops: u64,
    ) -> Self {
        let vehicle = old_vehicle_wait - new_vehicle_wait;
        let pedestrian = (old_pedestrian_wait - new_pedestrian_wait) / PEDESTRIAN_WAIT_SCALE;
        let total = vehicle + pedestrian - EMERGENCY_STOP_PENALTY * emergency_stops as f64;
        Reward { vehicle, pedestrian, total }
    }
}

/// Sums of the negative parts of each reward channel over an episode.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct NegativeRewards {
    pub total: f64,
    pub vehicle: f64,
    pub pedestrian: f64,
}

impl NegativeRewards {
    /// Add every channel of `reward` that is below zero.
    pub fn accumulate(&mut self, reward: &Reward) {
        if reward.total < 0.0 {
            self.total += reward.total;
        }
        if reward.vehicle < 0.0 {
            self.vehicle += reward.vehicle;
        }
        if reward.pedestrian < 0.0 {
            self.pedestrian += reward.pedestrian;
        }
    }
}
