pub mod test_config;
pub mod test_demand;
pub mod test_encoder;
pub mod test_replay_buffer;
pub mod test_reward;
