#[cfg(test)]
mod property_tests {
    use ndarray::Array1;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use signal_ddqn::config::TrainingConfig;
    use signal_ddqn::intersection::{PedestrianObservation, StateEncoder, VehicleObservation, STATE_WIDTH};
    use signal_ddqn::replay_buffer::ReplayMemory;
    use signal_ddqn::trainer::{NegativeRewards, Reward};

    const LANES: [&str; 8] = ["W2TL_0", "W2TL_3", "N2TL_1", "E2TL_2", "S2TL_3", "S2TL_0", "X2TL_0", ""];
    const PEDESTRIAN_LANES: [&str; 8] = [
        ":TL_w0_0", ":TL_w3_0", ":TL_c1_0", ":TL_c5_0", ":TL_c0_0", ":TL_c2_0", ":TL_0_0", "E2TL",
    ];

    fn vehicle_strategy() -> impl Strategy<Value = VehicleObservation> {
        (0..LANES.len(), -20.0f64..120.0).prop_map(|(lane, lane_position)| VehicleObservation {
            lane_id: LANES[lane].to_string(),
            lane_position,
        })
    }

    fn pedestrian_strategy() -> impl Strategy<Value = PedestrianObservation> {
        (0..PEDESTRIAN_LANES.len(), -5.0f64..40.0).prop_map(|(lane, lane_position)| PedestrianObservation {
            lane_id: PEDESTRIAN_LANES[lane].to_string(),
            lane_position,
        })
    }

    proptest! {
        #[test]
        fn test_state_is_binary_with_fixed_width(
            vehicles in prop::collection::vec(vehicle_strategy(), 0..40),
            pedestrians in prop::collection::vec(pedestrian_strategy(), 0..40),
        ) {
            let state = StateEncoder::new().encode(&vehicles, &pedestrians);
            prop_assert_eq!(state.len(), STATE_WIDTH);
            prop_assert!(state.iter().all(|&bit| bit == 0.0 || bit == 1.0));
            let ones = state.iter().filter(|&&bit| bit == 1.0).count();
            prop_assert!(ones <= vehicles.len() + pedestrians.len());
        }

        #[test]
        fn test_duplicate_entities_are_idempotent(
            vehicles in prop::collection::vec(vehicle_strategy(), 1..20),
            pedestrians in prop::collection::vec(pedestrian_strategy(), 1..20),
        ) {
            let encoder = StateEncoder::new();
            let once = encoder.encode(&vehicles, &pedestrians);

            let doubled_vehicles: Vec<_> = vehicles.iter().chain(vehicles.iter()).cloned().collect();
            let doubled_pedestrians: Vec<_> = pedestrians.iter().chain(pedestrians.iter()).cloned().collect();
            let twice = encoder.encode(&doubled_vehicles, &doubled_pedestrians);
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn test_vehicle_order_does_not_matter(vehicles in prop::collection::vec(vehicle_strategy(), 0..20)) {
            let encoder = StateEncoder::new();
            let mut reversed = vehicles.clone();
            reversed.reverse();
            prop_assert_eq!(encoder.encode_vehicles(&vehicles), encoder.encode_vehicles(&reversed));
        }

        #[test]
        fn test_replay_slot_follows_counter(capacity in 1usize..12, stores in 0usize..40) {
            let mut memory = ReplayMemory::new(capacity, 2).unwrap();
            for i in 0..stores {
                let state = Array1::from_elem(2, i as f32);
                memory
                    .store(state.view(), state.view(), i % 5, i as f32, 0.0, 0.0)
                    .unwrap();
            }

            prop_assert_eq!(memory.len(), stores);
            prop_assert_eq!(memory.valid_len(), stores.min(capacity));
            // the newest store always sits at counter % capacity
            if stores > 0 {
                let slot = memory.slot_of(stores - 1);
                let newest = memory.get(slot).unwrap();
                prop_assert_eq!(newest.reward, (stores - 1) as f32);
                prop_assert_eq!(newest.old_state[0], (stores - 1) as f32);
            }
            prop_assert!(memory.get(capacity).is_none());
        }

        #[test]
        fn test_sample_draws_distinct_valid_slots(
            capacity in 1usize..20,
            stores in 0usize..40,
            batch in 1usize..10,
            seed in any::<u64>(),
        ) {
            let mut memory = ReplayMemory::new(capacity, 1).unwrap();
            for i in 0..stores {
                let state = Array1::from_elem(1, i as f32);
                memory.store(state.view(), state.view(), 0, i as f32, 0.0, 0.0).unwrap();
            }

            let mut rng = StdRng::seed_from_u64(seed);
            match memory.sample(batch, &mut rng) {
                None => prop_assert!(memory.valid_len() < batch),
                Some(sample) => {
                    prop_assert_eq!(sample.len(), batch);
                    let mut rewards: Vec<f32> = sample.rewards.to_vec();
                    rewards.sort_by(|a, b| a.total_cmp(b));
                    rewards.dedup();
                    prop_assert_eq!(rewards.len(), batch);
                    // only the last `capacity` stores survive the wrap
                    let oldest = stores.saturating_sub(capacity) as f32;
                    prop_assert!(rewards.iter().all(|&r| r >= oldest && r < stores as f32));
                }
            }
        }

        #[test]
        fn test_epsilon_within_bounds(
            total in 1usize..500,
            episode in 0usize..1000,
            end in 0.0f32..0.5,
            start in 0.5f32..=1.0,
        ) {
            let config = TrainingConfig {
                total_episodes: total,
                epsilon_start: start,
                epsilon_end: end,
                ..Default::default()
            };
            let epsilon = config.epsilon_for(episode);
            prop_assert!(epsilon >= end && epsilon <= start);
            prop_assert!(config.epsilon_for(episode + 1) <= epsilon);
        }

        #[test]
        fn test_reward_decomposition(
            old_vehicle in 0.0f64..1e4,
            new_vehicle in 0.0f64..1e4,
            old_pedestrian in 0.0f64..1e4,
            new_pedestrian in 0.0f64..1e4,
            stops in 0u64..5,
        ) {
            let reward = Reward::compute(old_vehicle, new_vehicle, old_pedestrian, new_pedestrian, stops);
            let recombined = reward.vehicle + reward.pedestrian - 100.0 * stops as f64;
            prop_assert!((reward.total - recombined).abs() < 1e-6);

            let mut negative = NegativeRewards::default();
            negative.accumulate(&reward);
            prop_assert!(negative.total <= 0.0 && negative.vehicle <= 0.0 && negative.pedestrian <= 0.0);
            prop_assert_eq!(negative.total, reward.total.min(0.0));
        }
    }
}
