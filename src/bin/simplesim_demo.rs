//! Drive the remote simulator with random actions and print what comes back.

use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use gym_duckietown_agent::registry::{self, BoxedEnv, KwArgs, SIMPLESIM_AGENT_ID};
use gym_duckietown_agent::utils::rng_from_seed;
use gym_duckietown_agent::{Env, RenderMode, Space, save_png};

#[derive(Parser)]
#[command(name = "simplesim-demo", version, about)]
struct Cli {
    /// Number of random steps to take.
    #[arg(long, default_value_t = 100)]
    steps: usize,

    /// How to render after every step.
    #[arg(long, value_enum, default_value = "human")]
    render: RenderChoice,

    /// Pause between steps, in milliseconds.
    #[arg(long, default_value_t = 100)]
    sleep_ms: u64,

    /// Seed for the local action sampler (the simulator is not affected).
    #[arg(long)]
    seed: Option<u64>,

    /// Write every rendered frame as PNG into this directory (needs `rgb_array`).
    #[arg(long)]
    save_frames: Option<PathBuf>,

    /// Log every simulator round trip at info level.
    #[arg(long)]
    debug: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum RenderChoice {
    Human,
    #[value(name = "rgb_array")]
    RgbArray,
    #[value(name = "none")]
    Off,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    registry::register_defaults()?;
    let mut kwargs = KwArgs::new();
    kwargs.insert("debug".into(), cli.debug.to_string());
    let mut env = registry::make(SIMPLESIM_AGENT_ID, &kwargs)
        .with_context(|| format!("failed to create {SIMPLESIM_AGENT_ID}"))?;

    if let Some(dir) = &cli.save_frames {
        std::fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))?;
    }

    let mut rng = rng_from_seed(cli.seed);
    env.reset()?;
    render(&mut env, &cli, 0)?;

    for i in 1..=cli.steps {
        let action = env.action_space().sample(&mut rng);
        let step = env.step(action.to_vec())?;
        render(&mut env, &cli, i)?;

        let obs_shape = match &step.observation {
            Some(obs) => format!("{:?}", obs.shape()),
            None => "-no observation-".to_string(),
        };
        info!(
            "action: {:?}, reward: {}, done: {}, misc: {}, obs shape: {}",
            action, step.reward, step.done, step.info, obs_shape
        );
        thread::sleep(Duration::from_millis(cli.sleep_ms));
    }

    env.close();
    Ok(())
}

fn render(env: &mut BoxedEnv, cli: &Cli, index: usize) -> Result<()> {
    let mode = match cli.render {
        RenderChoice::Off => return Ok(()),
        RenderChoice::Human => RenderMode::Human,
        RenderChoice::RgbArray => RenderMode::RgbArray,
    };
    let frame = env.render(mode, false)?;
    if let (Some(dir), Some(frame)) = (&cli.save_frames, frame) {
        let path = dir.join(format!("frame_{index:05}.png"));
        if let Err(e) = save_png(&path, &frame.to_render_frame()) {
            warn!(path = %path.display(), error = %e, "could not save frame");
        }
    }
    Ok(())
}
