//! # Demand Module
//!
//! Writes the per-episode route file the simulator loads: vehicle types,
//! twelve fixed routes with their flows, and one `<person>` per generated
//! pedestrian.
//!
//! Pedestrian departure times are uniform draws rescaled into
//! `[0, max_steps - 1400]`. Roughly 73 % of pedestrians walk straight across
//! one arm; the rest take a diagonal (scramble) crossing.
//!
//! Generation is a pure function of the seed, so episode `n` always sees the
//! same demand.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Uniform};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use crate::error::{Result, TrafficError};

/// Ticks before the episode end after which no pedestrian departs.
pub const PEDESTRIAN_DEPARTURE_MARGIN: usize = 1400;

/// `randint(0, 100)` draws at or below this produce a straight crossing.
const STRAIGHT_THRESHOLD: u32 = 72;

/// Origin and destination edges of straight crossings.
pub const STRAIGHT_WALKS: [(&str, &str); 8] = [
    ("S2TL", "TL2N"),
    ("TL2N", "S2TL"),
    ("TL2S", "N2TL"),
    ("N2TL", "TL2S"),
    ("E2TL", "W2TL"),
    ("W2TL", "E2TL"),
    ("TL2W", "TL2E"),
    ("TL2E", "TL2W"),
];

/// Origin and destination edges of diagonal crossings.
pub const DIAGONAL_WALKS: [(&str, &str); 8] = [
    ("N2TL", "TL2W"),
    ("TL2W", "N2TL"),
    ("E2TL", "S2TL"),
    ("S2TL", "E2TL"),
    ("TL2N", "TL2E"),
    ("TL2E", "TL2N"),
    ("TL2N", "TL2S"),
    ("TL2S", "W2TL"),
];

const VEHICLE_TYPES: &str = r#"    <vType id="slow" length="5" maxSpeed="8.33" accel="2.6" decel="4.5" speedDev="0.5" sigma="0.2" vClass="passenger"/>
    <vType id="medium" length="5" maxSpeed="13.9" accel="2.6" decel="4.5" speedDev="0.5" sigma="0.2" vClass="passenger"/>
    <vType id="fast" length="5" maxSpeed="22.2" accel="2.6" decel="4.5" speedDev="0.5" sigma="0.2" vClass="passenger"/>
"#;

/// `(id, edges)`
const ROUTES: [(&str, &str); 12] = [
    ("W_E", "WW2TL W2TL TL2E TL2EE"),
    ("E_W", "EE2TL E2TL TL2W TL2WW"),
    ("N_S", "NN2TL N2TL TL2S TL2SS"),
    ("S_N", "SS2TL S2TL TL2N TL2NN"),
    ("S_W", "SS2TL S2TL TL2W TL2WW"),
    ("W_N", "WW2TL W2TL TL2N TL2NN"),
    ("N_E", "NN2TL N2TL TL2E TL2EE"),
    ("E_S", "EE2TL E2TL TL2S TL2SS"),
    ("S_E", "SS2TL S2TL TL2E TL2EE"),
    ("W_S", "WW2TL W2TL TL2S TL2SS"),
    ("N_W", "NN2TL N2TL TL2W TL2WW"),
    ("E_N", "EE2TL E2TL TL2N TL2NN"),
];

/// Vehicle flow over the whole episode.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Flow {
    pub id: &'static str,
    pub route: &'static str,
    pub vehicle_type: &'static str,
    /// Per-tick insertion probability.
    pub probability: f64,
    pub depart_lane: &'static str,
}

pub const FLOWS: [Flow; 12] = [
    Flow { id: "WE", route: "W_E", vehicle_type: "medium", probability: 0.05, depart_lane: "2" },
    Flow { id: "EW", route: "E_W", vehicle_type: "medium", probability: 0.05, depart_lane: "2" },
    Flow { id: "NS", route: "N_S", vehicle_type: "medium", probability: 0.02, depart_lane: "2" },
    Flow { id: "SN", route: "S_N", vehicle_type: "medium", probability: 0.05, depart_lane: "2" },
    Flow { id: "SW", route: "S_W", vehicle_type: "slow", probability: 0.05, depart_lane: "1" },
    Flow { id: "WN", route: "W_N", vehicle_type: "slow", probability: 0.05, depart_lane: "1" },
    Flow { id: "NE", route: "N_E", vehicle_type: "slow", probability: 0.02, depart_lane: "1" },
    Flow { id: "ES", route: "E_S", vehicle_type: "slow", probability: 0.05, depart_lane: "1" },
    Flow { id: "SE", route: "S_E", vehicle_type: "medium", probability: 0.05, depart_lane: "random" },
    Flow { id: "WS", route: "W_S", vehicle_type: "medium", probability: 0.05, depart_lane: "random" },
    Flow { id: "NW", route: "N_W", vehicle_type: "fast", probability: 0.02, depart_lane: "random" },
    Flow { id: "EN", route: "E_N", vehicle_type: "fast", probability: 0.05, depart_lane: "random" },
];

/// Produces the demand of one episode from its seed.
pub trait DemandGenerator {
    fn generate(&mut self, seed: u64) -> Result<()>;
}

/// One generated pedestrian.
#[derive(Clone, Debug, PartialEq)]
pub struct PedestrianTrip {
    pub depart: f64,
    pub from: &'static str,
    pub to: &'static str,
    pub diagonal: bool,
}

/// Route-file generator for the four-arm intersection.
#[derive(Clone, Debug)]
pub struct TrafficGenerator {
    max_steps: usize,
    n_pedestrians: usize,
    route_file: PathBuf,
}

impl TrafficGenerator {
    pub fn new<P: AsRef<Path>>(max_steps: usize, n_pedestrians: usize, route_file: P) -> Result<Self> {
        if max_steps <= PEDESTRIAN_DEPARTURE_MARGIN {
            return Err(TrafficError::invalid_parameter(
                "max_steps".to_string(),
                format!("must exceed the {} tick pedestrian margin", PEDESTRIAN_DEPARTURE_MARGIN),
            ));
        }
        Ok(TrafficGenerator {
            max_steps,
            n_pedestrians,
            route_file: route_file.as_ref().to_path_buf(),
        })
    }

    pub fn route_file(&self) -> &Path {
        &self.route_file
    }

    /// Sorted departure ticks: uniform draws in `(2, n)` linearly mapped so
    /// the second-smallest draw (floored) lands at 0 and the largest
    /// (ceiled) at `max_steps - 1400`; the first departure is forced to 0.
    pub fn pedestrian_departures<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<f64> {
        let n = self.n_pedestrians;
        if n < 3 {
            return vec![0.0; n];
        }
        let uniform = Uniform::new(2.0, n as f64);
        let mut timings: Vec<f64> = (0..n).map(|_| uniform.sample(rng)).collect();
        timings.sort_by(|a, b| a.total_cmp(b));

        let min_old = timings[1].floor();
        let max_old = timings[n - 1].ceil();
        let max_new = (self.max_steps - PEDESTRIAN_DEPARTURE_MARGIN) as f64;
        let span = (max_old - min_old).max(1.0);

        let mut departures: Vec<f64> = timings
            .iter()
            .map(|&t| {
                let step = (max_new / span * (t - max_old) + max_new).round();
                if step <= 0.0 { 0.0 } else { step }
            })
            .collect();
        departures[0] = 0.0;
        departures
    }

    /// Departures plus a walk pattern per pedestrian.
    pub fn pedestrian_trips(&self, seed: u64) -> Vec<PedestrianTrip> {
        let mut rng = StdRng::seed_from_u64(seed);
        let departures = self.pedestrian_departures(&mut rng);
        departures
            .into_iter()
            .map(|depart| {
                let diagonal = rng.gen_range(0..100) > STRAIGHT_THRESHOLD;
                let table = if diagonal { &DIAGONAL_WALKS } else { &STRAIGHT_WALKS };
                let (from, to) = table[rng.gen_range(0..table.len())];
                PedestrianTrip { depart, from, to, diagonal }
            })
            .collect()
    }

    /// Full route-file document for `seed`.
    pub fn render(&self, seed: u64) -> String {
        let mut xml = String::new();
        // writing into a String cannot fail
        let _ = self.write_document(&mut xml, seed);
        xml
    }

    fn write_document(&self, xml: &mut String, seed: u64) -> std::fmt::Result {
        writeln!(xml, r#"<?xml version="1.0" encoding="UTF-8"?>"#)?;
        writeln!(xml, "<routes>")?;
        xml.push_str(VEHICLE_TYPES);
        for (id, edges) in ROUTES {
            writeln!(xml, r#"    <route id="{}" edges="{}"/>"#, id, edges)?;
        }
        writeln!(xml)?;
        for flow in FLOWS {
            writeln!(
                xml,
                r#"    <flow id="{}" route="{}" type="{}" begin="0" end="{}" probability="{}" departLane="{}" departSpeed="5" />"#,
                flow.id, flow.route, flow.vehicle_type, self.max_steps, flow.probability, flow.depart_lane
            )?;
        }
        writeln!(xml)?;
        for (i, trip) in self.pedestrian_trips(seed).iter().enumerate() {
            writeln!(
                xml,
                r#"    <vType id="p{}" vClass="pedestrian" width="0.5" length="0.21" minGap="0.2" maxSpeed="1.5" guiShape="pedestrian"/>"#,
                i
            )?;
            writeln!(xml, r#"    <person id="p{}" type="p{}" depart="{:.1}" departPos="0">"#, i, i, trip.depart)?;
            writeln!(xml, r#"        <walk from="{}" to="{}" arrivalPos="-1"/>"#, trip.from, trip.to)?;
            writeln!(xml, "    </person>")?;
        }
        writeln!(xml, "</routes>")
    }
}

impl DemandGenerator for TrafficGenerator {
    fn generate(&mut self, seed: u64) -> Result<()> {
        if let Some(parent) = self.route_file.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(&self.route_file, self.render(seed))?;
        Ok(())
    }
}
