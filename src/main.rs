use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use plumecast::{
    environment::{EnvironmentFeed, OpenMeteoFeed, StaticFeed},
    web, DispersionModel, ServiceConfig, SimulationInput,
};

#[derive(Debug, Parser)]
#[command(author, version, about = "Air pollution dispersion service")]
struct Cli {
    /// Path to the service YAML config (built-in defaults when omitted)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP API
    Serve {
        #[arg(long)]
        host: Option<String>,

        #[arg(long)]
        port: Option<u16>,

        /// Answer environment routes from the configured simulation
        /// defaults instead of querying Open-Meteo
        #[arg(long)]
        offline: bool,
    },
    /// Print one dispersion field as JSON
    Simulate(SimulateArgs),
}

#[derive(Debug, Args)]
struct SimulateArgs {
    /// Seed wind and concentrations from the current Open-Meteo reading
    #[arg(long)]
    live: bool,

    #[arg(long)]
    wind_speed: Option<f64>,

    #[arg(long)]
    wind_dir_deg: Option<f64>,

    #[arg(long)]
    base_pm25: Option<f64>,

    #[arg(long)]
    base_pm10: Option<f64>,

    #[arg(long)]
    base_no2: Option<f64>,

    #[arg(long)]
    base_so2: Option<f64>,

    #[arg(long)]
    base_co: Option<f64>,

    #[arg(long)]
    num_rays: Option<i32>,

    #[arg(long)]
    max_distance_m: Option<u32>,

    #[arg(long)]
    step_m: Option<u32>,

    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,
}

impl SimulateArgs {
    fn apply(&self, mut input: SimulationInput) -> SimulationInput {
        if let Some(value) = self.wind_speed {
            input.wind_speed = value;
        }
        if let Some(value) = self.wind_dir_deg {
            input.wind_dir_deg = value;
        }
        if let Some(value) = self.base_pm25 {
            input.base_pm25 = value;
        }
        if let Some(value) = self.base_pm10 {
            input.base_pm10 = value;
        }
        if let Some(value) = self.base_no2 {
            input.base_no2 = value;
        }
        if let Some(value) = self.base_so2 {
            input.base_so2 = value;
        }
        if let Some(value) = self.base_co {
            input.base_co = value;
        }
        if let Some(value) = self.num_rays {
            input.num_rays = value;
        }
        if let Some(value) = self.max_distance_m {
            input.max_distance_m = value;
        }
        if let Some(value) = self.step_m {
            input.step_m = value;
        }
        input
    }
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = ServiceConfig::load_or_default(cli.config.as_deref())?;
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    init_tracing(&config.logging.level);

    match cli.command {
        Command::Serve {
            host,
            port,
            offline,
        } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            if offline {
                info!("serving environment routes from simulation defaults");
                let feed = StaticFeed::from_input(&config.simulation);
                web::run(config, feed).await?;
            } else {
                let feed = OpenMeteoFeed::new(config.feed.clone());
                web::run(config, feed).await?;
            }
        }
        Command::Simulate(args) => {
            let mut input = config.simulation.clone();
            if args.live {
                let feed = OpenMeteoFeed::new(config.feed.clone());
                let observation = feed.current(config.location.coordinates()).await?;
                info!(
                    wind_speed = observation.wind_speed,
                    wind_direction = observation.wind_direction,
                    "using live reading"
                );
                input = observation.to_simulation_input(&input);
            }
            let input = args.apply(input);
            let field = DispersionModel::new(config.source).generate(&input)?;
            let json = if args.pretty {
                serde_json::to_string_pretty(&field)?
            } else {
                serde_json::to_string(&field)?
            };
            println!("{json}");
        }
    }
    Ok(())
}
