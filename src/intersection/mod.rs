//! # Intersection Module
//!
//! Static description of the single four-way intersection the controller
//! operates, plus the components that read and drive it:
//!
//! - [`encoder`]: simulator snapshot → fixed-width 0/1 state vector
//! - [`waiting`]: cumulative waiting-time bookkeeping for vehicles and
//!   pedestrians
//! - [`phase`]: the signal-phase state machine that steps the simulator
//!
//! Every identifier below (lanes, edges, pedestrian areas, phase indices)
//! comes from the SUMO network definition of the intersection and is treated
//! as an opaque contract.

pub mod encoder;
pub mod phase;
pub mod waiting;

pub use encoder::{PedestrianObservation, StateEncoder, VehicleObservation};
pub use phase::{LightColor, PhaseBurst, PhaseController, PhaseTimings};
pub use waiting::WaitingTimes;

/// Traffic-light id of the intersection.
pub const TLS_ID: &str = "C";

/// Vehicle lane-group cells per group.
pub const VEHICLE_CELLS: usize = 10;
/// Upper bounds (exclusive, metres from the stop line) of the vehicle cells.
pub const VEHICLE_CELL_BOUNDS: [f64; VEHICLE_CELLS] = [5.0, 10.0, 15.0, 20.0, 25.0, 35.0, 45.0, 65.0, 85.0, 100.0];
/// Length of an incoming approach; lane positions are measured from its start.
pub const APPROACH_LENGTH: f64 = 100.0;

/// Exact lane id → lane group. Groups alternate through / turn-only per
/// approach: W, N, E, S.
pub const VEHICLE_LANE_GROUPS: [(&str, usize); 24] = [
    ("W2TL_1", 0), ("W2TL_2", 0), ("WW2TL_1", 0), ("WW2TL_2", 0),
    ("W2TL_3", 1), ("WW2TL_3", 1),
    ("N2TL_1", 2), ("N2TL_2", 2), ("NN2TL_1", 2), ("NN2TL_2", 2),
    ("N2TL_3", 3), ("NN2TL_3", 3),
    ("E2TL_1", 4), ("E2TL_2", 4), ("EE2TL_1", 4), ("EE2TL_2", 4),
    ("E2TL_3", 5), ("EE2TL_3", 5),
    ("S2TL_1", 6), ("S2TL_2", 6), ("SS2TL_1", 6), ("SS2TL_2", 6),
    ("S2TL_3", 7), ("SS2TL_3", 7),
];
pub const VEHICLE_LANE_GROUP_COUNT: usize = 8;

/// Pedestrian waiting areas in front of each crossing (substring match).
pub const WAITING_AREAS: [&str; 4] = ["TL_w0_0", "TL_w1_0", "TL_w2_0", "TL_w3_0"];
pub const WAITING_CELLS: usize = 10;
pub const WAITING_CELL_LENGTH: f64 = 1.0;

/// Regular crosswalks (substring match).
pub const CROSSINGS: [&str; 4] = ["TL_c1_0", "TL_c3_0", "TL_c4_0", "TL_c5_0"];
pub const CROSSING_CELLS: usize = 9;

/// Diagonal (scramble) crosswalks (substring match).
pub const SCRAMBLE_CROSSINGS: [&str; 2] = ["TL_c0_0", "TL_c2_0"];
pub const SCRAMBLE_CELLS: usize = 15;
pub const CROSSING_CELL_LENGTH: f64 = 2.0;

pub const VEHICLE_STATE_WIDTH: usize = VEHICLE_LANE_GROUP_COUNT * VEHICLE_CELLS;
pub const PEDESTRIAN_STATE_WIDTH: usize =
    WAITING_AREAS.len() * WAITING_CELLS + CROSSINGS.len() * CROSSING_CELLS + SCRAMBLE_CROSSINGS.len() * SCRAMBLE_CELLS;
pub const STATE_WIDTH: usize = VEHICLE_STATE_WIDTH + PEDESTRIAN_STATE_WIDTH;

/// Roads whose vehicles count toward the vehicle waiting time.
pub const INCOMING_ROADS: [&str; 8] = ["E2TL", "N2TL", "W2TL", "S2TL", "EE2TL", "NN2TL", "WW2TL", "SS2TL"];

/// Internal lanes whose pedestrians count toward the pedestrian waiting time
/// (exact match).
pub const PEDESTRIAN_WAIT_LANES: [&str; 4] = [":TL_w0_0", ":TL_w1_0", ":TL_w2_0", ":TL_w3_0"];

/// Edges summed for the halted-vehicle queue length, in N, S, E, W pairs.
/// The east pair reads NN2TL rather than EE2TL; kept as observed.
pub const QUEUE_EDGES: [&str; 8] = ["N2TL", "NN2TL", "S2TL", "SS2TL", "E2TL", "NN2TL", "W2TL", "WW2TL"];

// Phase indices in the network's program.
pub const PHASE_EW_GREEN: u32 = 0;
pub const PHASE_EWP_YELLOW: u32 = 1;
pub const PHASE_EW_YELLOW: u32 = 2;
pub const PHASE_NS_GREEN: u32 = 3;
pub const PHASE_NSP_YELLOW: u32 = 4;
pub const PHASE_NS_YELLOW: u32 = 5;
pub const PHASE_EWV_GREEN: u32 = 6;
pub const PHASE_EWV_YELLOW: u32 = 7;
pub const PHASE_NSV_GREEN: u32 = 8;
pub const PHASE_NSV_YELLOW: u32 = 9;
pub const PHASE_TURN_GREEN: u32 = 10;
pub const PHASE_TURN_YELLOW: u32 = 11;
pub const PHASE_P_GREEN: u32 = 12;
pub const PHASE_P_YELLOW: u32 = 13;

/// Phase codes one action drives: its green and the clearance phases shown
/// when the controller leaves it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SignalPlan {
    pub name: &'static str,
    pub green: u32,
    pub pedestrian_yellow: Option<u32>,
    pub yellow: Option<u32>,
    /// Uses the pedestrian green duration.
    pub pedestrian_only: bool,
}

/// One plan per action index.
///
/// Yellow codes are looked up per plan, not derived as `green + 1` / `green + 2`.
pub const SIGNAL_PLANS: [SignalPlan; 5] = [
    SignalPlan {
        name: "east-west",
        green: PHASE_EW_GREEN,
        pedestrian_yellow: Some(PHASE_EWP_YELLOW),
        yellow: Some(PHASE_EW_YELLOW),
        pedestrian_only: false,
    },
    SignalPlan {
        name: "north-south",
        green: PHASE_NS_GREEN,
        pedestrian_yellow: Some(PHASE_NSP_YELLOW),
        yellow: Some(PHASE_NS_YELLOW),
        pedestrian_only: false,
    },
    SignalPlan {
        name: "east-west-turn",
        green: PHASE_EWV_GREEN,
        pedestrian_yellow: None,
        yellow: Some(PHASE_EWV_YELLOW),
        pedestrian_only: false,
    },
    SignalPlan {
        name: "north-south-turn",
        green: PHASE_NSV_GREEN,
        pedestrian_yellow: None,
        yellow: Some(PHASE_NSV_YELLOW),
        pedestrian_only: false,
    },
    SignalPlan {
        name: "pedestrian",
        green: PHASE_P_GREEN,
        pedestrian_yellow: Some(PHASE_P_YELLOW),
        yellow: None,
        pedestrian_only: true,
    },
];

/// Index of the pedestrian-only action.
pub const PEDESTRIAN_ACTION: usize = 4;
