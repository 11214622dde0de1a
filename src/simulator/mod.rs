//! # Simulator Module
//!
//! The traffic micro-simulator is an external stepping engine. Everything the
//! controller needs from it goes through the [`Simulator`] trait, and the
//! handle is passed explicitly (`&mut S`) to every collaborator, so one
//! process can run many episodes in sequence or drive a scripted stand-in
//! under test.
//!
//! - [`SumoSimulator`]: SUMO over the TraCI TCP protocol
//! - [`ScriptedSimulator`]: in-process fixed snapshots that record every
//!   command, for tests and benchmarks
//!
//! Calls are strictly sequential: queries happen between single-tick
//! [`step`](Simulator::step) calls, never concurrently.

pub mod scripted;
pub mod traci;

pub use scripted::{ScriptedPedestrian, ScriptedSimulator, ScriptedVehicle};
pub use traci::SumoSimulator;

use crate::error::Result;

/// Command/query surface of a discrete-time traffic simulator.
pub trait Simulator {
    /// Launch the simulator with the given command line.
    fn start(&mut self, command: &[String]) -> Result<()>;

    /// Advance by exactly one tick.
    fn step(&mut self) -> Result<()>;

    fn vehicle_ids(&mut self) -> Result<Vec<String>>;
    fn vehicle_lane_position(&mut self, vehicle: &str) -> Result<f64>;
    fn vehicle_lane_id(&mut self, vehicle: &str) -> Result<String>;
    fn vehicle_road_id(&mut self, vehicle: &str) -> Result<String>;
    fn vehicle_accumulated_waiting_time(&mut self, vehicle: &str) -> Result<f64>;

    fn person_ids(&mut self) -> Result<Vec<String>>;
    fn person_lane_position(&mut self, person: &str) -> Result<f64>;
    fn person_lane_id(&mut self, person: &str) -> Result<String>;
    fn person_waiting_time(&mut self, person: &str) -> Result<f64>;

    /// Vehicles halted on `edge` during the last tick.
    fn edge_halting_count(&mut self, edge: &str) -> Result<usize>;

    /// Vehicles that performed an emergency stop during the last tick.
    fn emergency_stopping_vehicles(&mut self) -> Result<Vec<String>>;

    /// Switch traffic light `tls` to the phase with index `phase`.
    fn set_phase(&mut self, tls: &str, phase: u32) -> Result<()>;

    fn close(&mut self) -> Result<()>;
}
