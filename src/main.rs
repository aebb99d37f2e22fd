use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crac_fuzzy_sim::config::{load_config, SimulationConfig};
use crac_fuzzy_sim::metrics::MetricsReport;
use crac_fuzzy_sim::runtime::run_paced;
use crac_fuzzy_sim::simulation::{build_controller, Simulation, SimulationHandle};
use crac_fuzzy_sim::telemetry::{spawn_forwarder, ChannelSink, LogSink, NullSink, TelemetrySink};
use crac_fuzzy_sim::logging;

#[derive(Parser)]
#[command(name = "crac-fuzzy-sim", version, about = "Fuzzy CRAC temperature control simulator")]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Overrides the disturbance seed from the config
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Log level used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the closed loop for N minutes and print one JSON record per tick
    Run {
        #[arg(short = 'n', long, default_value_t = 1440)]
        steps: usize,
        /// Log every telemetry record instead of discarding it
        #[arg(long)]
        publish: bool,
    },
    /// Evaluate the controller once, outside the loop
    Infer {
        #[arg(long, allow_hyphen_values = true)]
        error: f64,
        #[arg(long, allow_hyphen_values = true)]
        delta: f64,
        #[arg(long, allow_hyphen_values = true)]
        external_temp: f64,
        #[arg(long)]
        thermal_load: f64,
        /// Print every inference stage as JSON
        #[arg(long)]
        trace: bool,
    },
    /// Step the loop on a wall-clock interval, publishing through a worker thread
    Realtime {
        #[arg(long, default_value_t = 1000)]
        interval_ms: u64,
        /// Stop after this many ticks (default: until Ctrl-C)
        #[arg(long)]
        ticks: Option<u64>,
    },
    /// Print the active controller definition as JSON
    Describe,
}

fn load(cli: &Cli) -> Result<SimulationConfig> {
    let mut config = match &cli.config {
        Some(path) => load_config(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => SimulationConfig::default(),
    };
    if let Some(seed) = cli.seed {
        config.seed = seed;
    }
    Ok(config)
}

fn print_report(report: &MetricsReport, fallbacks: u64) {
    eprintln!("===========================================");
    eprintln!("Ticks: {}  Alerts: {}  Fallbacks: {}  Dropped publishes: {}",
        report.ticks, report.alerts, fallbacks, report.publish_failures);
    eprintln!("Tick P50: {:?}, P99: {:?}", report.tick_p50, report.tick_p99);
    eprintln!("Inference P50: {:?}, P99: {:?}", report.inference_p50, report.inference_p99);
    eprintln!("===========================================");
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(&cli.log_level);
    let config = load(&cli)?;

    match cli.command {
        Command::Run { steps, publish } => {
            let sink: Box<dyn TelemetrySink> = if publish { Box::new(LogSink) } else { Box::new(NullSink) };
            let mut sim = Simulation::from_config(&config, sink)?;
            for state in sim.run(steps) {
                println!("{}", serde_json::to_string(&state)?);
            }
            print_report(&sim.metrics().report(), sim.controller().fallback_count());
        }

        Command::Infer { error, delta, external_temp, thermal_load, trace } => {
            let controller = build_controller(&config)?;
            if trace {
                let trace = controller.trace(error, delta, external_temp, thermal_load)?;
                println!("{}", serde_json::to_string_pretty(&trace)?);
            } else {
                println!("{:.4}", controller.infer(error, delta, external_temp, thermal_load));
            }
        }

        Command::Realtime { interval_ms, ticks } => {
            let (sink, rx) = ChannelSink::new(config.telemetry.channel_capacity);
            let shutdown = Arc::new(AtomicBool::new(false));
            let forwarder = spawn_forwarder(rx, Box::new(LogSink), shutdown.clone());

            let sim = Simulation::from_config(&config, Box::new(sink))?;
            let metrics = sim.metrics().clone();
            let controller = Arc::clone(sim.controller());
            let handle = SimulationHandle::new(sim);

            let runtime = tokio::runtime::Runtime::new()?;
            let executed = runtime.block_on(run_paced(
                handle,
                Duration::from_millis(interval_ms),
                ticks,
            ));

            shutdown.store(true, Ordering::Relaxed);
            let forwarded = forwarder.join().unwrap_or(0);
            eprintln!("Paced run finished: {} ticks, {} records forwarded", executed, forwarded);
            print_report(&metrics.report(), controller.fallback_count());
        }

        Command::Describe => {
            let controller = build_controller(&config)?;
            println!("{}", serde_json::to_string_pretty(controller.config())?);
        }
    }

    Ok(())
}
