//! Chimera Nodes CLI
//!
//! Runs the biosensor or quantum entropy service, or exercises either
//! node once from the command line.

use chimera_nodes::{
    config::{BiosensorConfig, ServiceConfig, BIOSENSOR_DEFAULT_PORT, QUANTUM_DEFAULT_PORT},
    quantum::{self, EntropySource},
    sensors::{IioPlatform, SensorNode, SimulatedPlatform},
};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

type CliResult = Result<(), Box<dyn std::error::Error>>;

#[derive(Debug, Parser)]
#[command(name = "chimera-nodes", version, about = "Biosensor and quantum entropy nodes")]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Biosensor node
    Biosensor {
        #[command(subcommand)]
        action: BiosensorCommand,
    },
    /// Quantum entropy node
    Quantum {
        #[command(subcommand)]
        action: QuantumCommand,
    },
}

#[derive(Debug, Subcommand)]
enum BiosensorCommand {
    /// Serve the biosensor HTTP API
    Serve {
        #[arg(long)]
        mock: bool,
        #[command(flatten)]
        listen: ListenArgs,
    },
    /// Print sensor health and one set of readings
    Probe {
        #[arg(long)]
        mock: bool,
    },
    /// Poll readings until the sample count is reached or Ctrl-C
    Watch {
        #[arg(long)]
        mock: bool,
        /// Number of samples, 0 for unlimited
        #[arg(long, default_value_t = 0)]
        samples: u64,
        #[arg(long, default_value_t = 1000)]
        interval_ms: u64,
    },
}

#[derive(Debug, Subcommand)]
enum QuantumCommand {
    /// Serve the quantum entropy HTTP API
    Serve {
        #[arg(long)]
        mock: bool,
        #[command(flatten)]
        listen: ListenArgs,
    },
    /// Generate one entropy digest
    Entropy {
        #[arg(long)]
        mock: bool,
        #[arg(long, default_value_t = 256)]
        bits: usize,
    },
}

#[derive(Debug, Args)]
struct ListenArgs {
    #[arg(long)]
    host: Option<String>,
    #[arg(long)]
    port: Option<u16>,
}

impl ListenArgs {
    fn resolve(&self, config: &ServiceConfig, default_port: u16) -> (String, u16) {
        let host = self.host.clone().unwrap_or_else(|| config.server.host.clone());
        let port = self.port.or(config.server.port).unwrap_or(default_port);
        (host, port)
    }
}

fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> CliResult {
    let mut config = ServiceConfig::load(cli.config.as_deref())?;
    info!("Chimera Nodes v{}", chimera_nodes::VERSION);

    match cli.command {
        Command::Biosensor { action } => match action {
            BiosensorCommand::Serve { mock, listen } => {
                config.biosensor.mock |= mock;
                let node = probe_sensors(&config.biosensor);
                let (host, port) = listen.resolve(&config, BIOSENSOR_DEFAULT_PORT);
                serve_biosensor(&config, node, &host, port)
            }
            BiosensorCommand::Probe { mock } => {
                config.biosensor.mock |= mock;
                let node = probe_sensors(&config.biosensor);
                println!("{}", serde_json::to_string_pretty(&node.health_status())?);
                println!("{}", serde_json::to_string_pretty(&node.read_all())?);
                Ok(())
            }
            BiosensorCommand::Watch {
                mock,
                samples,
                interval_ms,
            } => {
                config.biosensor.mock |= mock;
                let node = probe_sensors(&config.biosensor);
                watch(&node, samples, Duration::from_millis(interval_ms))
            }
        },
        Command::Quantum { action } => match action {
            QuantumCommand::Serve { mock, listen } => {
                config.quantum.mock |= mock;
                // Probe before any async runtime exists; hardware clients block.
                let source = quantum::build_source(&config.quantum);
                let (host, port) = listen.resolve(&config, QUANTUM_DEFAULT_PORT);
                serve_quantum(&config, source, &host, port)
            }
            QuantumCommand::Entropy { mock, bits } => {
                config.quantum.mock |= mock;
                let source = quantum::build_source(&config.quantum);
                let digest = source.generate_entropy_hash(bits)?;
                let backend = source.backend_info();
                println!("{}", digest);
                println!("backend: {} ({})", backend.name, backend.kind);
                Ok(())
            }
        },
    }
}

fn probe_sensors(config: &BiosensorConfig) -> SensorNode {
    let node = if config.mock {
        info!("Using simulated sensors");
        SensorNode::probe(&mut SimulatedPlatform::new())
    } else {
        SensorNode::probe(&mut IioPlatform::new(&config.iio_root))
    };

    let health = node.health_status();
    for (sensor, available) in health.entries() {
        info!(sensor, available, "Sensor status");
    }
    for (sensor, reason) in node.probe_failures() {
        warn!(sensor, reason, "Sensor disabled");
    }
    info!("{} of 3 sensors active", health.active_sensors());
    node
}

fn watch(node: &SensorNode, samples: u64, interval: Duration) -> CliResult {
    let running = Arc::new(AtomicBool::new(true));
    let handler_flag = Arc::clone(&running);
    ctrlc::set_handler(move || handler_flag.store(false, Ordering::SeqCst))?;

    let mut taken = 0u64;
    while running.load(Ordering::SeqCst) && (samples == 0 || taken < samples) {
        println!("{}", serde_json::to_string(&node.read_all())?);
        taken += 1;
        std::thread::sleep(interval);
    }

    info!(samples = taken, "Watch finished");
    Ok(())
}

#[cfg(feature = "server")]
fn serve_biosensor(config: &ServiceConfig, node: SensorNode, host: &str, port: u16) -> CliResult {
    use chimera_nodes::server::{self, biosensor};

    let metrics = Arc::new(chimera_nodes::MetricsRegistry::new()?);
    if config.biosensor.api_key.is_some() {
        info!("Authentication enabled (API key required)");
    } else {
        info!("Authentication disabled (set BIOSENSOR_API_KEY to enable)");
    }
    let state = Arc::new(biosensor::BiosensorState::new(
        node,
        config.biosensor.api_key.clone(),
        metrics,
    ));
    let addr = server::listen_addr(host, port)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(server::serve(biosensor::router(state), addr))?;
    Ok(())
}

#[cfg(feature = "server")]
fn serve_quantum(
    config: &ServiceConfig,
    source: Box<dyn EntropySource>,
    host: &str,
    port: u16,
) -> CliResult {
    use chimera_nodes::server::{self, quantum, RateLimiter};

    let metrics = Arc::new(chimera_nodes::MetricsRegistry::new()?);
    let backend = source.backend_info();
    info!(
        backend = backend.name.as_str(),
        real_hardware = backend.is_real_hardware,
        "Entropy backend selected"
    );
    let limiter = RateLimiter::per_minute(config.rate_limit.requests_per_minute);
    let state = Arc::new(quantum::QuantumState::new(source, limiter, metrics));
    let addr = server::listen_addr(host, port)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(server::serve(quantum::router(state), addr))?;
    Ok(())
}

#[cfg(not(feature = "server"))]
fn serve_biosensor(_: &ServiceConfig, _: SensorNode, _: &str, _: u16) -> CliResult {
    Err("built without HTTP support (enable the `server` feature)".into())
}

#[cfg(not(feature = "server"))]
fn serve_quantum(_: &ServiceConfig, _: Box<dyn EntropySource>, _: &str, _: u16) -> CliResult {
    Err("built without HTTP support (enable the `server` feature)".into())
}
