use clap::Parser;
use log::{error, info};
use std::path::PathBuf;
use std::time::Instant;

use signal_ddqn::agent::DdqnAgentBuilder;
use signal_ddqn::config::{create_run_dir, TrainingConfig};
use signal_ddqn::demand::TrafficGenerator;
use signal_ddqn::error::Result;
use signal_ddqn::simulator::SumoSimulator;
use signal_ddqn::trainer::Trainer;

/// Train a DDQN traffic-signal controller against SUMO.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// JSON training configuration; defaults are used when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Launch sumo-gui instead of sumo
    #[arg(long)]
    gui: bool,

    /// Override the number of episodes
    #[arg(short, long)]
    episodes: Option<usize>,

    /// Override the directory run folders are created in
    #[arg(long)]
    models_dir: Option<PathBuf>,
}

fn run(args: Args) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => TrainingConfig::load(path)?,
        None => TrainingConfig::default(),
    };
    if args.gui {
        config.gui = true;
    }
    if let Some(episodes) = args.episodes {
        config.total_episodes = episodes;
    }
    if let Some(dir) = args.models_dir {
        config.models_path = dir;
    }
    config.validate()?;

    let run_dir = create_run_dir(&config.models_path)?;
    config.save(run_dir.join("training_config.json"))?;
    info!("run directory: {}", run_dir.display());
    info!("simulator command: {}", config.sumo_command().join(" "));

    let mut builder = DdqnAgentBuilder::new()
        .layer_sizes(&config.layer_sizes())
        .hidden_activation(config.hidden_activation)
        .gamma(config.gamma)
        .tau(config.tau)
        .learning_rate(config.learning_rate)
        .optimizer(config.optimizer);
    if let Some(seed) = config.seed {
        builder = builder.seed(seed);
    }
    let agent = builder.build()?;

    let demand = TrafficGenerator::new(config.max_steps, config.n_peds_generated, &config.route_file)?;
    let mut trainer = Trainer::new(&config, SumoSimulator::new(), demand, agent)?;

    let started = Instant::now();
    trainer.train(config.total_episodes, |episode| config.epsilon_for(episode))?;
    info!("training finished in {:.1}s", started.elapsed().as_secs_f32());

    trainer.save(&run_dir)?;
    info!("saved agent and episode statistics to {}", run_dir.display());
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run(Args::parse()) {
        error!("{}", e);
        std::process::exit(1);
    }
}
