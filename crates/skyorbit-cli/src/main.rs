use anyhow::{Context, Result, bail};
use cgmath::InnerSpace;
use clap::{Args, Parser, Subcommand};
use skyorbit_core::{AnimatorState, InputEvent, OrbitConfig, Simulation, Vec3};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "skyorbit")]
#[command(about = "Idle camera orbit controller, headless")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    Simulate(SimulateArgs),
    Config(ConfigArgs),
}

#[derive(Args)]
struct SimulateArgs {
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long, default_value = "0,0,500")]
    position: String,
    #[arg(long, default_value_t = 10_000.0)]
    duration_ms: f64,
    #[arg(long, default_value_t = 1000.0 / 60.0)]
    frame_ms: f64,
    #[arg(long, help = "Comma-separated kind@ms entries, e.g. press@0,release@500")]
    script: Option<String>,
    #[arg(long, default_value_t = 500.0)]
    sample_ms: f64,
}

#[derive(Args)]
struct ConfigArgs {
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::Simulate(args) => simulate(args),
        Command::Config(args) => show_config(args),
    }
}

fn simulate(args: SimulateArgs) -> Result<()> {
    if !(args.duration_ms.is_finite() && args.duration_ms >= 0.0) {
        bail!("--duration-ms must be a non-negative number");
    }
    if !(args.sample_ms.is_finite() && args.sample_ms > 0.0) {
        bail!("--sample-ms must be a positive number");
    }
    if !(args.frame_ms.is_finite() && args.frame_ms > 0.0) {
        bail!("--frame-ms must be a positive number");
    }
    let config = load_config(args.config.as_ref())?;
    let position = parse_vec3(&args.position).context("invalid --position")?;
    let mut script = match args.script.as_deref() {
        Some(text) => parse_script(text)?,
        None => Vec::new(),
    };
    script.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut sim = Simulation::new(config, position, args.frame_ms)
        .context("failed to build the simulated viewer")?;
    sim.load();
    sim.scene_ready();
    sim.advance(args.frame_ms);
    sim.first_frame_settled();
    info!(controller = %sim.controller().id(), "simulation started");

    println!("{:>9}  {:>10} {:>10} {:>10}  {:>9}  state", "t_ms", "x", "y", "z", "distance");
    let mut script = script.into_iter().peekable();
    let mut next_sample = sim.now_ms();
    loop {
        while let Some((at, event)) = script.next_if(|(at, _)| *at <= sim.now_ms()) {
            let result = sim.input(event);
            info!(at, ?event, handled = result.handled, "input");
        }
        if sim.now_ms() >= next_sample {
            print_sample(&sim);
            next_sample += args.sample_ms;
        }
        if sim.now_ms() >= args.duration_ms {
            break;
        }
        let next_input = script.peek().map_or(f64::INFINITY, |(at, _)| *at);
        let stop = next_sample.min(next_input).min(args.duration_ms);
        sim.advance(stop - sim.now_ms());
    }

    info!(
        timers_fired = sim.timers_fired().len(),
        events = sim.delivered().len(),
        "simulation finished"
    );
    Ok(())
}

fn show_config(args: ConfigArgs) -> Result<()> {
    let config = load_config(args.config.as_ref())?;
    let json = config
        .to_json_pretty()
        .context("failed to serialize configuration")?;
    println!("{json}");
    Ok(())
}

fn load_config(path: Option<&PathBuf>) -> Result<OrbitConfig> {
    match path {
        Some(path) => OrbitConfig::load(path)
            .with_context(|| format!("failed to load configuration from {}", path.display())),
        None => Ok(OrbitConfig::default()),
    }
}

fn print_sample(sim: &Simulation) {
    let position = sim.camera_position();
    let controller = sim.controller();
    let state = if controller.is_interacting() {
        "interacting"
    } else if controller.pending_resume().is_some() {
        "resuming"
    } else {
        match controller.animator_state() {
            AnimatorState::Animating(_) => "orbiting",
            AnimatorState::Idle => "idle",
        }
    };
    println!(
        "{:>9.1}  {:>10.3} {:>10.3} {:>10.3}  {:>9.3}  {state}",
        sim.now_ms(),
        position.x,
        position.y,
        position.z,
        position.magnitude(),
    );
}

fn parse_vec3(text: &str) -> Result<Vec3> {
    let parts: Vec<&str> = text.split(',').collect();
    if parts.len() != 3 {
        bail!("expected three comma-separated numbers, e.g. 0,0,500");
    }

    let x: f64 = parts[0].trim().parse().context("invalid x")?;
    let y: f64 = parts[1].trim().parse().context("invalid y")?;
    let z: f64 = parts[2].trim().parse().context("invalid z")?;
    Ok(Vec3::new(x, y, z))
}

fn parse_script(text: &str) -> Result<Vec<(f64, InputEvent)>> {
    text.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(parse_script_entry)
        .collect()
}

fn parse_script_entry(entry: &str) -> Result<(f64, InputEvent)> {
    let Some((kind, at)) = entry.split_once('@') else {
        bail!("script entry `{entry}` must look like kind@ms");
    };
    let event = match kind.trim() {
        "scroll" => InputEvent::Scroll,
        "press" => InputEvent::Press,
        "release" => InputEvent::Release,
        other => bail!("unknown input `{other}` (expected scroll, press or release)"),
    };
    let at: f64 = at
        .trim()
        .parse()
        .with_context(|| format!("invalid time in script entry `{entry}`"))?;
    if !(at.is_finite() && at >= 0.0) {
        bail!("script entry `{entry}` has a negative or non-finite time");
    }
    Ok((at, event))
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
