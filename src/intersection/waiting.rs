use std::collections::HashMap;

use super::{INCOMING_ROADS, PEDESTRIAN_WAIT_LANES};
use crate::error::Result;
use crate::simulator::Simulator;

/// Pedestrians waiting at least this long (s) count as queued.
const PEDESTRIAN_QUEUE_THRESHOLD: f64 = 0.1;

/// Persistent id → waiting-time maps for one episode.
///
/// Vehicles on incoming roads store their accumulated waiting time as
/// reported; pedestrians in a waiting area add their current waiting time on
/// every collection. An entity seen outside its zone is removed from the
/// map, so its waiting no longer counts toward the total.
#[derive(Clone, Debug, Default)]
pub struct WaitingTimes {
    vehicles: HashMap<String, f64>,
    pedestrians: HashMap<String, f64>,
    pedestrian_queue: u64,
}

impl WaitingTimes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.vehicles.clear();
        self.pedestrians.clear();
        self.pedestrian_queue = 0;
    }

    /// Refresh the vehicle map and return the total vehicle waiting time.
    pub fn collect_vehicles<S: Simulator + ?Sized>(&mut self, sim: &mut S) -> Result<f64> {
        for id in sim.vehicle_ids()? {
            let wait = sim.vehicle_accumulated_waiting_time(&id)?;
            let road = sim.vehicle_road_id(&id)?;
            if INCOMING_ROADS.contains(&road.as_str()) {
                self.vehicles.insert(id, wait);
            } else {
                self.vehicles.remove(&id);
            }
        }
        Ok(self.vehicle_total())
    }

    /// Refresh the pedestrian map and return the total pedestrian waiting time.
    ///
    /// Also counts every pedestrian in a waiting area that has waited at least
    /// 0.1 s into the pedestrian queue counter.
    pub fn collect_pedestrians<S: Simulator + ?Sized>(&mut self, sim: &mut S) -> Result<f64> {
        for id in sim.person_ids()? {
            let wait = sim.person_waiting_time(&id)?;
            let lane = sim.person_lane_id(&id)?;
            if PEDESTRIAN_WAIT_LANES.contains(&lane.as_str()) {
                if wait >= PEDESTRIAN_QUEUE_THRESHOLD {
                    self.pedestrian_queue += 1;
                }
                *self.pedestrians.entry(id).or_insert(0.0) += wait;
            } else {
                self.pedestrians.remove(&id);
            }
        }
        Ok(self.pedestrian_total())
    }

    pub fn vehicle_total(&self) -> f64 {
        self.vehicles.values().sum()
    }

    pub fn pedestrian_total(&self) -> f64 {
        self.pedestrians.values().sum()
    }

    /// Pedestrian-queue observations accumulated this episode.
    pub fn pedestrian_queue(&self) -> u64 {
        self.pedestrian_queue
    }

    pub fn tracked_vehicles(&self) -> usize {
        self.vehicles.len()
    }

    pub fn tracked_pedestrians(&self) -> usize {
        self.pedestrians.len()
    }
}
