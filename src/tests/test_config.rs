use crate::activations::Activation;
use crate::agent::OptimizerKind;
use crate::config::{create_run_dir, TrainingConfig};
use crate::error::TrafficError;

#[test]
fn test_default_config_is_valid() {
    let config = TrainingConfig::default();
    config.validate().unwrap();
    assert_eq!(config.num_states, 186);
    assert_eq!(config.num_actions, 5);
    assert_eq!(config.layer_sizes(), vec![186, 400, 400, 400, 5]);
}

#[test]
fn test_partial_json_takes_defaults() {
    let config: TrainingConfig =
        serde_json::from_str(r#"{ "total_episodes": 3, "optimizer": "Sgd", "hidden_layers": [64] }"#).unwrap();
    assert_eq!(config.total_episodes, 3);
    assert_eq!(config.optimizer, OptimizerKind::Sgd);
    assert_eq!(config.layer_sizes(), vec![186, 64, 5]);
    assert_eq!(config.max_steps, 5400);
}

#[test]
fn test_hidden_activation_from_json() {
    let config = TrainingConfig::default();
    assert_eq!(config.hidden_activation, Activation::Relu);

    let config: TrainingConfig =
        serde_json::from_str(r#"{ "hidden_activation": { "LeakyRelu": { "alpha": 0.01 } } }"#).unwrap();
    assert_eq!(config.hidden_activation, Activation::LeakyRelu { alpha: 0.01 });
    config.validate().unwrap();

    let negative = TrainingConfig { hidden_activation: Activation::LeakyRelu { alpha: -0.5 }, ..Default::default() };
    assert!(matches!(negative.validate(), Err(TrafficError::Config(_))));
}

#[test]
fn test_save_and_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    let config = TrainingConfig { gamma: 0.9, batch_size: 32, ..Default::default() };
    config.save(&path).unwrap();
    assert_eq!(TrainingConfig::load(&path).unwrap(), config);
}

#[test]
fn test_load_rejects_invalid_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, r#"{ "num_states": 80 }"#).unwrap();
    assert!(matches!(TrainingConfig::load(&path), Err(TrafficError::Config(_))));

    std::fs::write(&path, "not json").unwrap();
    assert!(matches!(TrainingConfig::load(&path), Err(TrafficError::SerializationError(_))));
}

#[test]
fn test_validation_errors() {
    let invalid = [
        TrainingConfig { total_episodes: 0, ..Default::default() },
        TrainingConfig { green_duration: 0, ..Default::default() },
        TrainingConfig { num_actions: 6, ..Default::default() },
        TrainingConfig { num_state_veh: 79, ..Default::default() },
        TrainingConfig { batch_size: 200, memory_size: 100, ..Default::default() },
        TrainingConfig { tau: 0.0, ..Default::default() },
        TrainingConfig { gamma: -0.1, ..Default::default() },
        TrainingConfig { learning_rate: 0.0, ..Default::default() },
        TrainingConfig { epsilon_start: 0.1, epsilon_end: 0.5, ..Default::default() },
        TrainingConfig { hidden_layers: vec![32, 0], ..Default::default() },
    ];
    for config in invalid {
        assert!(matches!(config.validate(), Err(TrafficError::Config(_))), "{:?}", config);
    }
}

#[test]
fn test_zero_yellow_is_allowed() {
    let config = TrainingConfig { yellow_duration: 0, ped_yellow_duration: 0, ..Default::default() };
    config.validate().unwrap();
}

#[test]
fn test_epsilon_schedule() {
    let config = TrainingConfig { total_episodes: 4, ..Default::default() };
    assert_eq!(config.epsilon_for(0), 1.0);
    assert_eq!(config.epsilon_for(1), 0.75);
    assert_eq!(config.epsilon_for(3), 0.25);

    let clamped = TrainingConfig { total_episodes: 4, epsilon_start: 0.5, epsilon_end: 0.3, ..Default::default() };
    assert_eq!(clamped.epsilon_for(0), 0.5);
    assert_eq!(clamped.epsilon_for(3), 0.3);
}

#[test]
fn test_sumo_command() {
    let config = TrainingConfig { max_steps: 600, ..Default::default() };
    assert_eq!(
        config.sumo_command(),
        vec!["sumo", "-c", "intersection/sumo_config.sumocfg", "--no-step-log", "true", "--waiting-time-memory", "600"]
    );

    let gui = TrainingConfig { gui: true, ..Default::default() };
    assert_eq!(gui.sumo_command()[0], "sumo-gui");
}

#[test]
fn test_run_dirs_are_numbered() {
    let dir = tempfile::tempdir().unwrap();
    let first = create_run_dir(dir.path().join("models")).unwrap();
    assert_eq!(first.file_name().unwrap(), "model_1");

    std::fs::create_dir(dir.path().join("models").join("model_7")).unwrap();
    std::fs::create_dir(dir.path().join("models").join("notes")).unwrap();
    let next = create_run_dir(dir.path().join("models")).unwrap();
    assert_eq!(next.file_name().unwrap(), "model_8");
    assert!(next.is_dir());
}
