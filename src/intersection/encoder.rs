use ndarray::{s, Array1, Array2};

use super::{
    APPROACH_LENGTH, CROSSINGS, CROSSING_CELLS, CROSSING_CELL_LENGTH, PEDESTRIAN_STATE_WIDTH,
    SCRAMBLE_CELLS, SCRAMBLE_CROSSINGS, STATE_WIDTH, VEHICLE_CELLS, VEHICLE_CELL_BOUNDS,
    VEHICLE_LANE_GROUPS, VEHICLE_STATE_WIDTH, WAITING_AREAS, WAITING_CELLS, WAITING_CELL_LENGTH,
};
use crate::error::Result;
use crate::simulator::Simulator;

/// Position of one vehicle as reported by the simulator.
#[derive(Clone, Debug, PartialEq)]
pub struct VehicleObservation {
    pub lane_id: String,
    pub lane_position: f64,
}

/// Position of one pedestrian as reported by the simulator.
#[derive(Clone, Debug, PartialEq)]
pub struct PedestrianObservation {
    pub lane_id: String,
    pub lane_position: f64,
}

/// Discretises vehicle and pedestrian positions into occupancy bits.
///
/// Output layout: 80 vehicle bits (lane group × distance cell) followed by
/// 106 pedestrian bits (waiting areas, crosswalks, scramble crosswalks).
/// Several entities in one cell set the same bit once; entities on
/// unrecognised lanes or outside the grid are ignored.
#[derive(Clone, Copy, Debug, Default)]
pub struct StateEncoder;

impl StateEncoder {
    pub fn new() -> Self {
        StateEncoder
    }

    pub fn vehicle_width(&self) -> usize {
        VEHICLE_STATE_WIDTH
    }

    pub fn pedestrian_width(&self) -> usize {
        PEDESTRIAN_STATE_WIDTH
    }

    pub fn width(&self) -> usize {
        STATE_WIDTH
    }

    /// Cell index for a distance to the stop line; `None` beyond the approach.
    pub fn vehicle_cell(distance_to_stop_line: f64) -> Option<usize> {
        VEHICLE_CELL_BOUNDS.iter().position(|&bound| distance_to_stop_line < bound)
    }

    /// Lane group by exact lane id.
    pub fn vehicle_lane_group(lane_id: &str) -> Option<usize> {
        VEHICLE_LANE_GROUPS
            .iter()
            .find(|(lane, _)| *lane == lane_id)
            .map(|&(_, group)| group)
    }

    pub fn encode_vehicles(&self, vehicles: &[VehicleObservation]) -> Array1<f32> {
        let mut state = Array1::zeros(VEHICLE_STATE_WIDTH);
        for vehicle in vehicles {
            let distance = APPROACH_LENGTH - vehicle.lane_position;
            let (Some(cell), Some(group)) = (Self::vehicle_cell(distance), Self::vehicle_lane_group(&vehicle.lane_id)) else {
                continue;
            };
            state[group * VEHICLE_CELLS + cell] = 1.0;
        }
        state
    }

    pub fn encode_pedestrians(&self, pedestrians: &[PedestrianObservation]) -> Array1<f32> {
        let mut waiting = Array2::<f32>::zeros((WAITING_AREAS.len(), WAITING_CELLS));
        let mut crossing = Array2::<f32>::zeros((CROSSINGS.len(), CROSSING_CELLS));
        let mut scramble = Array2::<f32>::zeros((SCRAMBLE_CROSSINGS.len(), SCRAMBLE_CELLS));

        for pedestrian in pedestrians {
            let lane = pedestrian.lane_id.as_str();
            let position = pedestrian.lane_position;

            if let Some(group) = substring_group(&WAITING_AREAS, lane) {
                // saturates at the last cell
                if let Some(cell) = grid_cell(position, WAITING_CELL_LENGTH, usize::MAX) {
                    waiting[[group, cell.min(WAITING_CELLS - 1)]] = 1.0;
                }
            }
            if let Some(group) = substring_group(&CROSSINGS, lane) {
                if let Some(cell) = grid_cell(position, CROSSING_CELL_LENGTH, CROSSING_CELLS) {
                    crossing[[group, cell]] = 1.0;
                }
            }
            if let Some(group) = substring_group(&SCRAMBLE_CROSSINGS, lane) {
                if let Some(cell) = grid_cell(position, CROSSING_CELL_LENGTH, SCRAMBLE_CELLS) {
                    scramble[[group, cell]] = 1.0;
                }
            }
        }

        let mut state = Array1::zeros(PEDESTRIAN_STATE_WIDTH);
        let waiting_end = waiting.len();
        let crossing_end = waiting_end + crossing.len();
        state.slice_mut(s![..waiting_end]).assign(&Array1::from_iter(waiting.iter().copied()));
        state.slice_mut(s![waiting_end..crossing_end]).assign(&Array1::from_iter(crossing.iter().copied()));
        state.slice_mut(s![crossing_end..]).assign(&Array1::from_iter(scramble.iter().copied()));
        state
    }

    /// Vehicle followed by pedestrian bits.
    pub fn encode(&self, vehicles: &[VehicleObservation], pedestrians: &[PedestrianObservation]) -> Array1<f32> {
        let vehicle_state = self.encode_vehicles(vehicles);
        let pedestrian_state = self.encode_pedestrians(pedestrians);
        let mut state = Array1::zeros(STATE_WIDTH);
        state.slice_mut(s![..VEHICLE_STATE_WIDTH]).assign(&vehicle_state);
        state.slice_mut(s![VEHICLE_STATE_WIDTH..]).assign(&pedestrian_state);
        state
    }

    pub fn observe_vehicles<S: Simulator + ?Sized>(&self, sim: &mut S) -> Result<Vec<VehicleObservation>> {
        let ids = sim.vehicle_ids()?;
        let mut observations = Vec::with_capacity(ids.len());
        for id in &ids {
            observations.push(VehicleObservation {
                lane_position: sim.vehicle_lane_position(id)?,
                lane_id: sim.vehicle_lane_id(id)?,
            });
        }
        Ok(observations)
    }

    pub fn observe_pedestrians<S: Simulator + ?Sized>(&self, sim: &mut S) -> Result<Vec<PedestrianObservation>> {
        let ids = sim.person_ids()?;
        let mut observations = Vec::with_capacity(ids.len());
        for id in &ids {
            observations.push(PedestrianObservation {
                lane_position: sim.person_lane_position(id)?,
                lane_id: sim.person_lane_id(id)?,
            });
        }
        Ok(observations)
    }

    pub fn encode_vehicle_state<S: Simulator + ?Sized>(&self, sim: &mut S) -> Result<Array1<f32>> {
        let vehicles = self.observe_vehicles(sim)?;
        Ok(self.encode_vehicles(&vehicles))
    }

    pub fn encode_pedestrian_state<S: Simulator + ?Sized>(&self, sim: &mut S) -> Result<Array1<f32>> {
        let pedestrians = self.observe_pedestrians(sim)?;
        Ok(self.encode_pedestrians(&pedestrians))
    }

    /// Full state vector of the current simulator snapshot.
    pub fn encode_state<S: Simulator + ?Sized>(&self, sim: &mut S) -> Result<Array1<f32>> {
        let vehicle_state = self.encode_vehicle_state(sim)?;
        let pedestrian_state = self.encode_pedestrian_state(sim)?;
        let mut state = Array1::zeros(STATE_WIDTH);
        state.slice_mut(s![..VEHICLE_STATE_WIDTH]).assign(&vehicle_state);
        state.slice_mut(s![VEHICLE_STATE_WIDTH..]).assign(&pedestrian_state);
        Ok(state)
    }
}

fn substring_group(patterns: &[&str], lane_id: &str) -> Option<usize> {
    patterns.iter().position(|pattern| lane_id.contains(pattern))
}

/// `floor(position / cell_length)` when it lands in `[0, cells)`.
fn grid_cell(position: f64, cell_length: f64, cells: usize) -> Option<usize> {
    let cell = (position / cell_length).floor();
    if cell < 0.0 || !cell.is_finite() || cell >= cells as f64 {
        return None;
    }
    Some(cell as usize)
}
