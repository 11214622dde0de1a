use crate::trainer::{EpisodeRecord, EpisodeStats, NegativeRewards, Reward};

#[test]
fn test_reward_example() {
    let reward = Reward::compute(30.0, 10.0, 100.0, 50.0, 0);
    assert_eq!(reward.vehicle, 20.0);
    assert_eq!(reward.pedestrian, 1.0);
    assert_eq!(reward.total, 21.0);
}

#[test]
fn test_reward_penalises_emergency_stops() {
    let reward = Reward::compute(30.0, 10.0, 100.0, 50.0, 2);
    assert_eq!(reward.total, 21.0 - 200.0);
    assert_eq!(reward.vehicle, 20.0);
}

#[test]
fn test_growing_waits_give_negative_reward() {
    let reward = Reward::compute(0.0, 12.0, 0.0, 25.0, 0);
    assert_eq!(reward.vehicle, -12.0);
    assert_eq!(reward.pedestrian, -0.5);
    assert_eq!(reward.total, -12.5);
}

#[test]
fn test_negative_rewards_only_sum_losses() {
    let mut negative = NegativeRewards::default();
    negative.accumulate(&Reward::compute(30.0, 10.0, 0.0, 50.0, 0)); // veh +20, ped -1
    negative.accumulate(&Reward::compute(10.0, 15.0, 0.0, 0.0, 0)); // veh -5

    assert_eq!(negative.total, -5.0);
    assert_eq!(negative.vehicle, -5.0);
    assert_eq!(negative.pedestrian, -1.0);
}

#[test]
fn test_episode_stats_files() {
    let mut stats = EpisodeStats::new();
    stats.record(&EpisodeRecord {
        reward: -10.0,
        vehicle_reward: -8.0,
        pedestrian_reward: -2.0,
        cumulative_wait: 120.0,
        avg_queue_length: 1.5,
        avg_pedestrian_queue_length: 0.25,
        emergency_stops: 1,
        epsilon: 1.0,
    });
    stats.record(&EpisodeRecord { reward: -4.0, epsilon: 0.5, ..Default::default() });
    assert_eq!(stats.len(), 2);

    let dir = tempfile::tempdir().unwrap();
    stats.save(dir.path()).unwrap();

    let rewards = std::fs::read_to_string(dir.path().join("plot_reward_data.txt")).unwrap();
    assert_eq!(rewards, "-10\n-4\n");
    let delay = std::fs::read_to_string(dir.path().join("plot_delay_data.txt")).unwrap();
    assert_eq!(delay.lines().collect::<Vec<_>>(), vec!["120", "0"]);
    for name in ["plot_reward_veh_data.txt", "plot_reward_ped_data.txt", "plot_queue_data.txt", "plot_queue_ped_data.txt"] {
        let contents = std::fs::read_to_string(dir.path().join(name)).unwrap();
        assert_eq!(contents.lines().count(), 2, "{}", name);
    }

    let csv = std::fs::read_to_string(dir.path().join("training_stats.csv")).unwrap();
    let lines: Vec<_> = csv.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("episode,reward"));
    assert_eq!(lines[1], "0,-10,-8,-2,120,1.5,0.25,1,1");
}
