use crate::intersection::{
    PedestrianObservation, StateEncoder, VehicleObservation, PEDESTRIAN_STATE_WIDTH, STATE_WIDTH,
    VEHICLE_STATE_WIDTH,
};
use crate::simulator::{ScriptedPedestrian, ScriptedSimulator, ScriptedVehicle, Simulator};

fn vehicle(lane: &str, position: f64) -> VehicleObservation {
    VehicleObservation { lane_id: lane.to_string(), lane_position: position }
}

fn pedestrian(lane: &str, position: f64) -> PedestrianObservation {
    PedestrianObservation { lane_id: lane.to_string(), lane_position: position }
}

fn set_bits(state: &ndarray::Array1<f32>) -> Vec<usize> {
    state
        .iter()
        .enumerate()
        .filter(|(_, &v)| v != 0.0)
        .map(|(i, _)| i)
        .collect()
}

#[test]
fn test_empty_intersection_is_all_zero() {
    let encoder = StateEncoder::new();
    let state = encoder.encode(&[], &[]);
    assert_eq!(state.len(), STATE_WIDTH);
    assert_eq!(STATE_WIDTH, 186);
    assert_eq!(VEHICLE_STATE_WIDTH, 80);
    assert_eq!(PEDESTRIAN_STATE_WIDTH, 106);
    assert!(state.iter().all(|&v| v == 0.0));
}

#[test]
fn test_vehicle_cells() {
    assert_eq!(StateEncoder::vehicle_cell(0.0), Some(0));
    assert_eq!(StateEncoder::vehicle_cell(4.9), Some(0));
    assert_eq!(StateEncoder::vehicle_cell(5.0), Some(1));
    assert_eq!(StateEncoder::vehicle_cell(24.0), Some(4));
    assert_eq!(StateEncoder::vehicle_cell(30.0), Some(5));
    assert_eq!(StateEncoder::vehicle_cell(50.0), Some(7));
    assert_eq!(StateEncoder::vehicle_cell(99.0), Some(9));
    assert_eq!(StateEncoder::vehicle_cell(100.0), None);
}

#[test]
fn test_vehicle_lane_groups() {
    assert_eq!(StateEncoder::vehicle_lane_group("W2TL_1"), Some(0));
    assert_eq!(StateEncoder::vehicle_lane_group("WW2TL_3"), Some(1));
    assert_eq!(StateEncoder::vehicle_lane_group("NN2TL_2"), Some(2));
    assert_eq!(StateEncoder::vehicle_lane_group("E2TL_3"), Some(5));
    assert_eq!(StateEncoder::vehicle_lane_group("SS2TL_1"), Some(6));
    assert_eq!(StateEncoder::vehicle_lane_group("S2TL_0"), None);
    assert_eq!(StateEncoder::vehicle_lane_group("TL2E_1"), None);
}

#[test]
fn test_vehicle_positions() {
    let encoder = StateEncoder::new();
    let state = encoder.encode_vehicles(&[
        vehicle("W2TL_1", 97.0),  // 3 m out, group 0, cell 0
        vehicle("N2TL_3", 50.0),  // 50 m out, group 3, cell 7
        vehicle("SS2TL_2", 5.0),  // 95 m out, group 6, cell 9
    ]);
    assert_eq!(set_bits(&state), vec![0, 37, 69]);
}

#[test]
fn test_vehicles_outside_the_grid_are_ignored() {
    let encoder = StateEncoder::new();
    let state = encoder.encode_vehicles(&[
        vehicle("W2TL_1", 0.0),   // exactly 100 m out
        vehicle("W2TL_1", -20.0), // beyond the approach
        vehicle("TL2E_1", 90.0),  // outgoing lane
        vehicle(":TL_0_0", 1.0),  // internal lane
    ]);
    assert!(state.iter().all(|&v| v == 0.0));
}

#[test]
fn test_duplicate_vehicles_set_one_bit() {
    let encoder = StateEncoder::new();
    let single = encoder.encode_vehicles(&[vehicle("E2TL_2", 92.0)]);
    let triple = encoder.encode_vehicles(&[
        vehicle("E2TL_2", 92.0),
        vehicle("E2TL_1", 93.5),
        vehicle("EE2TL_2", 91.0),
    ]);
    assert_eq!(single, triple);
    assert_eq!(set_bits(&triple), vec![40 + 1]);
}

#[test]
fn test_pedestrian_waiting_area() {
    let encoder = StateEncoder::new();
    let state = encoder.encode_pedestrians(&[
        pedestrian(":TL_w0_0", 3.5),
        pedestrian(":TL_w3_0", 0.2),
    ]);
    assert_eq!(set_bits(&state), vec![3, 30]);
}

#[test]
fn test_pedestrian_waiting_area_saturates() {
    let encoder = StateEncoder::new();
    let state = encoder.encode_pedestrians(&[pedestrian(":TL_w1_0", 25.0)]);
    assert_eq!(set_bits(&state), vec![19]);
}

#[test]
fn test_pedestrian_crossings() {
    let encoder = StateEncoder::new();
    let state = encoder.encode_pedestrians(&[
        pedestrian(":TL_c1_0", 5.0),   // crossing 0, cell 2
        pedestrian(":TL_c5_0", 17.9),  // crossing 3, cell 8
        pedestrian(":TL_c0_0", 0.0),   // scramble 0, cell 0
        pedestrian(":TL_c2_0", 29.0),  // scramble 1, cell 14
    ]);
    assert_eq!(set_bits(&state), vec![42, 75, 76, 105]);
}

#[test]
fn test_pedestrians_past_the_crossing_are_ignored() {
    let encoder = StateEncoder::new();
    let state = encoder.encode_pedestrians(&[
        pedestrian(":TL_c3_0", 18.0),
        pedestrian(":TL_c0_0", 30.0),
        pedestrian(":TL_c4_0", -1.0),
        pedestrian("S2TL", 4.0),
    ]);
    assert!(state.iter().all(|&v| v == 0.0));
}

#[test]
fn test_full_state_layout() {
    let encoder = StateEncoder::new();
    let state = encoder.encode(&[vehicle("W2TL_1", 97.0)], &[pedestrian(":TL_c2_0", 29.0)]);
    assert_eq!(set_bits(&state), vec![0, STATE_WIDTH - 1]);
}

#[test]
fn test_encode_state_from_simulator() {
    let mut sim = ScriptedSimulator::new()
        .with_vehicles(vec![
            ScriptedVehicle::new("v0", "N2TL_3", 50.0, 0.0),
            ScriptedVehicle::new("v1", "N2TL_3", 52.0, 0.0),
        ])
        .with_pedestrians(vec![ScriptedPedestrian::new("p0", ":TL_w0_0", 3.5, 0.0)]);
    sim.start(&[]).unwrap();

    let encoder = StateEncoder::new();
    let state = encoder.encode_state(&mut sim).unwrap();
    assert_eq!(state.len(), STATE_WIDTH);
    assert_eq!(set_bits(&state), vec![37, VEHICLE_STATE_WIDTH + 3]);
}

#[test]
fn test_vehicle_and_pedestrian_states_from_simulator() {
    let mut sim = ScriptedSimulator::new()
        .with_vehicles(vec![ScriptedVehicle::new("v0", "S2TL_2", 98.0, 0.0)])
        .with_pedestrians(vec![ScriptedPedestrian::new("p0", ":TL_c1_0", 4.5, 0.0)]);
    sim.start(&[]).unwrap();
    let encoder = StateEncoder::new();

    let vehicle_state = encoder.encode_vehicle_state(&mut sim).unwrap();
    assert_eq!(vehicle_state.len(), 80);
    assert_eq!(vehicle_state.len(), VEHICLE_STATE_WIDTH);
    assert_eq!(set_bits(&vehicle_state), vec![60]);

    let pedestrian_state = encoder.encode_pedestrian_state(&mut sim).unwrap();
    assert_eq!(pedestrian_state.len(), 106);
    assert_eq!(pedestrian_state.len(), PEDESTRIAN_STATE_WIDTH);
    // first crossing, cell 2, after the 40 waiting-area bits
    assert_eq!(set_bits(&pedestrian_state), vec![42]);

    let state = encoder.encode_state(&mut sim).unwrap();
    assert_eq!(set_bits(&state), vec![60, VEHICLE_STATE_WIDTH + 42]);
}

#[test]
fn test_encode_state_requires_running_simulator() {
    let mut sim = ScriptedSimulator::new();
    assert!(StateEncoder::new().encode_state(&mut sim).is_err());
}
