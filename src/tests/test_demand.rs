use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::demand::{DemandGenerator, TrafficGenerator, DIAGONAL_WALKS, FLOWS, STRAIGHT_WALKS};

fn generator(n_pedestrians: usize) -> TrafficGenerator {
    TrafficGenerator::new(5400, n_pedestrians, "episode_routes.rou.xml").unwrap()
}

#[test]
fn test_departures_are_rescaled() {
    let generator = generator(300);
    let mut rng = StdRng::seed_from_u64(3);
    let departures = generator.pedestrian_departures(&mut rng);

    assert_eq!(departures.len(), 300);
    assert_eq!(departures[0], 0.0);
    assert!(departures.windows(2).all(|w| w[0] <= w[1]));
    assert!(departures.iter().all(|&d| (0.0..=4000.0).contains(&d)));
    assert!(departures.iter().all(|&d| d.fract() == 0.0));
    // the largest draw maps onto the end of the departure window
    assert!(*departures.last().unwrap() > 3900.0);
}

#[test]
fn test_small_pedestrian_counts() {
    let mut rng = StdRng::seed_from_u64(0);
    assert!(generator(0).pedestrian_departures(&mut rng).is_empty());
    assert_eq!(generator(2).pedestrian_departures(&mut rng), vec![0.0, 0.0]);
}

#[test]
fn test_trips_come_from_walk_tables() {
    let trips = generator(500).pedestrian_trips(11);
    assert_eq!(trips.len(), 500);

    for trip in &trips {
        let table = if trip.diagonal { &DIAGONAL_WALKS } else { &STRAIGHT_WALKS };
        assert!(table.contains(&(trip.from, trip.to)));
    }

    let diagonal = trips.iter().filter(|t| t.diagonal).count() as f64 / trips.len() as f64;
    assert!(diagonal > 0.15 && diagonal < 0.4, "diagonal share {}", diagonal);
}

#[test]
fn test_same_seed_same_demand() {
    let generator = generator(50);
    assert_eq!(generator.render(5), generator.render(5));
    assert_ne!(generator.render(5), generator.render(6));
}

#[test]
fn test_route_file_contents() {
    let xml = generator(20).render(1);
    assert!(xml.starts_with("<?xml"));
    assert!(xml.trim_end().ends_with("</routes>"));
    assert_eq!(xml.matches("<route ").count(), 12);
    assert_eq!(xml.matches("<flow ").count(), FLOWS.len());
    assert_eq!(xml.matches("<person ").count(), 20);
    assert_eq!(xml.matches("<walk ").count(), 20);
    assert!(xml.contains(r#"<person id="p0" type="p0" depart="0.0" departPos="0">"#));
    assert!(xml.contains(r#"<flow id="NS" route="N_S" type="medium" begin="0" end="5400" probability="0.02""#));
}

#[test]
fn test_generate_writes_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("intersection").join("routes.rou.xml");
    let mut generator = TrafficGenerator::new(3000, 10, &path).unwrap();
    generator.generate(0).unwrap();

    let written = std::fs::read_to_string(&path).unwrap();
    assert_eq!(written, generator.render(0));
}

#[test]
fn test_episode_must_outlast_departure_margin() {
    assert!(TrafficGenerator::new(1400, 10, "routes.rou.xml").is_err());
}
