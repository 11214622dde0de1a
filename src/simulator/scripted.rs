use std::collections::HashMap;

use super::Simulator;
use crate::error::{Result, TrafficError};

#[derive(Clone, Debug, PartialEq)]
pub struct ScriptedVehicle {
    pub id: String,
    pub lane_id: String,
    pub road_id: String,
    pub lane_position: f64,
    pub waiting_time: f64,
}

impl ScriptedVehicle {
    /// Vehicle on lane `lane_id`; the road is the part before the last `_`.
    pub fn new(id: &str, lane_id: &str, lane_position: f64, waiting_time: f64) -> Self {
        let road_id = lane_id.rsplit_once('_').map(|(road, _)| road).unwrap_or(lane_id);
        ScriptedVehicle {
            id: id.to_string(),
            lane_id: lane_id.to_string(),
            road_id: road_id.to_string(),
            lane_position,
            waiting_time,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ScriptedPedestrian {
    pub id: String,
    pub lane_id: String,
    pub lane_position: f64,
    pub waiting_time: f64,
}

impl ScriptedPedestrian {
    pub fn new(id: &str, lane_id: &str, lane_position: f64, waiting_time: f64) -> Self {
        ScriptedPedestrian {
            id: id.to_string(),
            lane_id: lane_id.to_string(),
            lane_position,
            waiting_time,
        }
    }
}

/// In-process simulator returning a fixed snapshot on every query.
///
/// Every command is recorded so tests can assert on the exact phase
/// sequence and tick counts the controller produced.
#[derive(Clone, Debug, Default)]
pub struct ScriptedSimulator {
    pub vehicles: Vec<ScriptedVehicle>,
    pub pedestrians: Vec<ScriptedPedestrian>,
    pub halting: HashMap<String, usize>,
    /// Emergency stops reported right after the given tick (1-based).
    pub emergency_stops: HashMap<usize, Vec<String>>,
    /// Make `step` fail once this many ticks have elapsed.
    pub fail_after_ticks: Option<usize>,

    running: bool,
    ticks: usize,
    starts: usize,
    closes: usize,
    last_command: Vec<String>,
    phase_log: Vec<(usize, String, u32)>,
}

impl ScriptedSimulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_vehicles(mut self, vehicles: Vec<ScriptedVehicle>) -> Self {
        self.vehicles = vehicles;
        self
    }

    pub fn with_pedestrians(mut self, pedestrians: Vec<ScriptedPedestrian>) -> Self {
        self.pedestrians = pedestrians;
        self
    }

    pub fn with_halting(mut self, edge: &str, count: usize) -> Self {
        self.halting.insert(edge.to_string(), count);
        self
    }

    pub fn with_emergency_stop(mut self, tick: usize, vehicle: &str) -> Self {
        self.emergency_stops.entry(tick).or_default().push(vehicle.to_string());
        self
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Ticks advanced since the last `start`.
    pub fn ticks(&self) -> usize {
        self.ticks
    }

    pub fn starts(&self) -> usize {
        self.starts
    }

    pub fn closes(&self) -> usize {
        self.closes
    }

    pub fn last_command(&self) -> &[String] {
        &self.last_command
    }

    /// `(tick, tls, phase)` for every `set_phase` since the last `start`.
    pub fn phase_log(&self) -> &[(usize, String, u32)] {
        &self.phase_log
    }

    fn ensure_running(&self) -> Result<()> {
        if self.running {
            Ok(())
        } else {
            Err(TrafficError::simulator("scripted simulator is not running"))
        }
    }

    fn vehicle(&self, id: &str) -> Result<&ScriptedVehicle> {
        self.ensure_running()?;
        self.vehicles
            .iter()
            .find(|v| v.id == id)
            .ok_or_else(|| TrafficError::simulator(format!("unknown vehicle '{}'", id)))
    }

    fn person(&self, id: &str) -> Result<&ScriptedPedestrian> {
        self.ensure_running()?;
        self.pedestrians
            .iter()
            .find(|p| p.id == id)
            .ok_or_else(|| TrafficError::simulator(format!("unknown person '{}'", id)))
    }
}

impl Simulator for ScriptedSimulator {
    fn start(&mut self, command: &[String]) -> Result<()> {
        if self.running {
            return Err(TrafficError::simulator("scripted simulator already running"));
        }
        self.running = true;
        self.ticks = 0;
        self.starts += 1;
        self.last_command = command.to_vec();
        self.phase_log.clear();
        Ok(())
    }

    fn step(&mut self) -> Result<()> {
        self.ensure_running()?;
        if let Some(limit) = self.fail_after_ticks {
            if self.ticks >= limit {
                return Err(TrafficError::simulator(format!("scripted failure at tick {}", self.ticks)));
            }
        }
        self.ticks += 1;
        Ok(())
    }

    fn vehicle_ids(&mut self) -> Result<Vec<String>> {
        self.ensure_running()?;
        Ok(self.vehicles.iter().map(|v| v.id.clone()).collect())
    }

    fn vehicle_lane_position(&mut self, vehicle: &str) -> Result<f64> {
        Ok(self.vehicle(vehicle)?.lane_position)
    }

    fn vehicle_lane_id(&mut self, vehicle: &str) -> Result<String> {
        Ok(self.vehicle(vehicle)?.lane_id.clone())
    }

    fn vehicle_road_id(&mut self, vehicle: &str) -> Result<String> {
        Ok(self.vehicle(vehicle)?.road_id.clone())
    }

    fn vehicle_accumulated_waiting_time(&mut self, vehicle: &str) -> Result<f64> {
        Ok(self.vehicle(vehicle)?.waiting_time)
    }

    fn person_ids(&mut self) -> Result<Vec<String>> {
        self.ensure_running()?;
        Ok(self.pedestrians.iter().map(|p| p.id.clone()).collect())
    }

    fn person_lane_position(&mut self, person: &str) -> Result<f64> {
        Ok(self.person(person)?.lane_position)
    }

    fn person_lane_id(&mut self, person: &str) -> Result<String> {
        Ok(self.person(person)?.lane_id.clone())
    }

    fn person_waiting_time(&mut self, person: &str) -> Result<f64> {
        Ok(self.person(person)?.waiting_time)
    }

    fn edge_halting_count(&mut self, edge: &str) -> Result<usize> {
        self.ensure_running()?;
        Ok(self.halting.get(edge).copied().unwrap_or(0))
    }

    fn emergency_stopping_vehicles(&mut self) -> Result<Vec<String>> {
        self.ensure_running()?;
        Ok(self.emergency_stops.get(&self.ticks).cloned().unwrap_or_default())
    }

    fn set_phase(&mut self, tls: &str, phase: u32) -> Result<()> {
        self.ensure_running()?;
        self.phase_log.push((self.ticks, tls.to_string(), phase));
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.ensure_running()?;
        self.running = false;
        self.closes += 1;
        Ok(())
    }
}
