use log::debug;
use serde::{Deserialize, Serialize};

use super::{WaitingTimes, QUEUE_EDGES, SIGNAL_PLANS};
use crate::error::{Result, TrafficError};
use crate::simulator::Simulator;

/// Durations, in simulator ticks, of each kind of phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseTimings {
    pub green: usize,
    pub pedestrian_green: usize,
    pub yellow: usize,
    pub pedestrian_yellow: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LightColor {
    Green,
    Yellow,
    PedestrianYellow,
}

/// One phase command and the ticks the simulator ran under it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PhaseBurst {
    pub action: usize,
    pub color: LightColor,
    pub phase: u32,
    /// Configured duration.
    pub requested: usize,
    /// Ticks actually run after clipping at the episode end.
    pub steps: usize,
}

/// Signal-phase state machine for one episode.
///
/// Holds the previous action implicitly through the caller's
/// `(previous, action)` pairs, counts elapsed ticks against `max_steps` and
/// gathers per-tick queue and emergency-stop statistics.
#[derive(Clone, Debug)]
pub struct PhaseController {
    tls_id: String,
    timings: PhaseTimings,
    max_steps: usize,
    step: usize,
    sum_queue_length: u64,
    sum_waiting_time: u64,
    emergency_stops: u64,
    stops_since_decision: u64,
}

impl PhaseController {
    pub fn new(tls_id: &str, timings: PhaseTimings, max_steps: usize) -> Self {
        PhaseController {
            tls_id: tls_id.to_string(),
            timings,
            max_steps,
            step: 0,
            sum_queue_length: 0,
            sum_waiting_time: 0,
            emergency_stops: 0,
            stops_since_decision: 0,
        }
    }

    /// Zero the tick counter and every accumulator.
    pub fn reset(&mut self) {
        self.step = 0;
        self.sum_queue_length = 0;
        self.sum_waiting_time = 0;
        self.emergency_stops = 0;
        self.stops_since_decision = 0;
    }

    pub fn step(&self) -> usize {
        self.step
    }

    pub fn max_steps(&self) -> usize {
        self.max_steps
    }

    pub fn is_finished(&self) -> bool {
        self.step >= self.max_steps
    }

    pub fn timings(&self) -> PhaseTimings {
        self.timings
    }

    /// Halted vehicles summed over all ticks.
    pub fn sum_queue_length(&self) -> u64 {
        self.sum_queue_length
    }

    /// One tick in the queue is one second waited.
    pub fn sum_waiting_time(&self) -> u64 {
        self.sum_waiting_time
    }

    pub fn emergency_stops(&self) -> u64 {
        self.emergency_stops
    }

    /// Emergency stops since the previous call; resets the counter.
    pub fn take_decision_stops(&mut self) -> u64 {
        std::mem::take(&mut self.stops_since_decision)
    }

    /// Emit the clearance phases the change from `previous` requires, then
    /// the green of `action`, advancing the simulator through each.
    ///
    /// No clearance is shown on the first decision (`previous == None`) or
    /// when the action repeats.
    pub fn transition<S: Simulator + ?Sized>(
        &mut self,
        sim: &mut S,
        waits: &mut WaitingTimes,
        previous: Option<usize>,
        action: usize,
    ) -> Result<Vec<PhaseBurst>> {
        let plan = SIGNAL_PLANS
            .get(action)
            .ok_or(TrafficError::InvalidAction { action, max_actions: SIGNAL_PLANS.len() })?;
        let mut bursts = Vec::with_capacity(3);

        if let Some(previous) = previous.filter(|&p| p != action) {
            let old = SIGNAL_PLANS
                .get(previous)
                .ok_or(TrafficError::InvalidAction { action: previous, max_actions: SIGNAL_PLANS.len() })?;
            if let Some(code) = old.pedestrian_yellow {
                bursts.push(self.run_phase(sim, waits, previous, LightColor::PedestrianYellow, code, self.timings.pedestrian_yellow)?);
            }
            if let Some(code) = old.yellow {
                bursts.push(self.run_phase(sim, waits, previous, LightColor::Yellow, code, self.timings.yellow)?);
            }
        }

        let duration = if plan.pedestrian_only { self.timings.pedestrian_green } else { self.timings.green };
        bursts.push(self.run_phase(sim, waits, action, LightColor::Green, plan.green, duration)?);

        debug!(
            "step {}: {:?} -> {} ({})",
            self.step,
            previous,
            action,
            bursts.iter().map(|b| format!("{}x{}", b.phase, b.steps)).collect::<Vec<_>>().join(", ")
        );
        Ok(bursts)
    }

    fn run_phase<S: Simulator + ?Sized>(
        &mut self,
        sim: &mut S,
        waits: &mut WaitingTimes,
        action: usize,
        color: LightColor,
        phase: u32,
        duration: usize,
    ) -> Result<PhaseBurst> {
        sim.set_phase(&self.tls_id, phase)?;
        let steps = self.advance(sim, waits, duration)?;
        Ok(PhaseBurst { action, color, phase, requested: duration, steps })
    }

    /// Run up to `steps` ticks, clipped at `max_steps`; returns the ticks run.
    pub fn advance<S: Simulator + ?Sized>(&mut self, sim: &mut S, waits: &mut WaitingTimes, steps: usize) -> Result<usize> {
        let todo = steps.min(self.max_steps.saturating_sub(self.step));
        for _ in 0..todo {
            sim.step()?;
            waits.collect_pedestrians(sim)?;
            let stops = sim.emergency_stopping_vehicles()?.len() as u64;
            self.emergency_stops += stops;
            self.stops_since_decision += stops;
            self.step += 1;
            let queue_length = queue_length(sim)?;
            self.sum_queue_length += queue_length;
            self.sum_waiting_time += queue_length;
        }
        Ok(todo)
    }
}

/// Halted vehicles on the incoming edges during the last tick.
pub fn queue_length<S: Simulator + ?Sized>(sim: &mut S) -> Result<u64> {
    let mut total = 0u64;
    for edge in QUEUE_EDGES {
        total += sim.edge_halting_count(edge)? as u64;
    }
    Ok(total)
}
