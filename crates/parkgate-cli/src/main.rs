//! `parkgate`: operate parking gate relays and price exits from the command line.

mod display;

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::watch;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use parkgate_billing::{FeeInput, breakdown};
use parkgate_control::{ExitProcessor, FacilityConfig, GateConfig, GateSnapshot, SensorPoller};
use parkgate_core::{Amount, GateAction};
use parkgate_network::RelayClient;

#[derive(Parser, Debug)]
#[command(name = "parkgate", version, about = "Parking gate relay control and exit fees")]
struct Cli {
    /// Facility configuration file (JSON)
    #[arg(long, global = true, env = "PARKGATE_CONFIG", default_value = "parkgate.json")]
    config: PathBuf,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug)]
struct StayArgs {
    /// Length of the stay in minutes
    #[arg(long)]
    minutes: u64,

    /// Parker category, e.g. staff
    #[arg(long)]
    category: Option<String>,

    /// The ticket was lost
    #[arg(long)]
    lost: bool,
}

impl StayArgs {
    fn fee_input(&self) -> FeeInput {
        FeeInput {
            duration_minutes: self.minutes,
            parker_category: self.category.clone(),
            is_lost_ticket: self.lost,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Open a gate
    Open { gate: String },
    /// Close a gate
    Close { gate: String },
    /// Read the input lines of a gate's relay
    Sensors { gate: String },
    /// Compute the fee for a stay
    Fee {
        #[command(flatten)]
        stay: StayArgs,
    },
    /// Charge a stay and open the exit gate
    Exit {
        gate: String,
        #[command(flatten)]
        stay: StayArgs,
        /// Amount paid, e.g. 20 or 12.50
        #[arg(long)]
        tendered: Amount,
    },
    /// Poll every gate and report link changes until Ctrl-C
    Watch,
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match &cli.command {
        Commands::Fee { stay } => fee(&cli.config, stay),
        Commands::Open { gate } => control(&load_config(&cli.config)?, gate, GateAction::Open).await,
        Commands::Close { gate } => control(&load_config(&cli.config)?, gate, GateAction::Close).await,
        Commands::Sensors { gate } => sensors(&load_config(&cli.config)?, gate).await,
        Commands::Exit {
            gate,
            stay,
            tendered,
        } => exit(&load_config(&cli.config)?, gate, stay, *tendered).await,
        Commands::Watch => watch_gates(load_config(&cli.config)?).await,
    }
}

fn load_config(path: &Path) -> anyhow::Result<FacilityConfig> {
    let config = FacilityConfig::load(path)?;
    debug!(path = %path.display(), gates = config.gates.len(), "Loaded configuration");
    Ok(config)
}

fn find_gate<'a>(config: &'a FacilityConfig, name: &str) -> anyhow::Result<&'a GateConfig> {
    config
        .gate(name)
        .with_context(|| format!("unknown gate '{name}'"))
}

fn client(config: &FacilityConfig) -> RelayClient {
    RelayClient::new(config.link.client_config())
}

/// Pricing needs no relay, so a missing configuration falls back to the default tariff.
fn fee(path: &Path, stay: &StayArgs) -> anyhow::Result<()> {
    let tariff = if path.exists() {
        load_config(path)?.tariff
    } else {
        warn!(path = %path.display(), "Configuration not found, using default tariff");
        Default::default()
    };

    println!("{}", display::format_breakdown(&breakdown(&tariff, &stay.fee_input())));
    Ok(())
}

async fn control(config: &FacilityConfig, name: &str, action: GateAction) -> anyhow::Result<()> {
    let gate = find_gate(config, name)?;
    let ack = client(config)
        .control_gate(&gate.endpoint()?, gate.channel, action)
        .await
        .with_context(|| format!("cannot {action} gate '{name}'"))?;

    println!("{name}: {action} sent to {} ({})", ack.endpoint, ack.command);
    Ok(())
}

async fn sensors(config: &FacilityConfig, name: &str) -> anyhow::Result<()> {
    let gate = find_gate(config, name)?;
    let inputs = client(config)
        .read_sensors(&gate.endpoint()?)
        .await
        .with_context(|| format!("cannot read sensors of gate '{name}'"))?;

    println!("{name}: {}", display::format_sensors(&inputs));
    Ok(())
}

async fn exit(
    config: &FacilityConfig,
    name: &str,
    stay: &StayArgs,
    tendered: Amount,
) -> anyhow::Result<()> {
    let gate = find_gate(config, name)?;
    let processor = ExitProcessor::new(client(config), config.tariff.clone());
    let receipt = processor
        .authorize_exit(gate, &stay.fee_input(), tendered)
        .await?;

    println!("{}", display::format_receipt(&receipt));
    Ok(())
}

async fn watch_gates(config: FacilityConfig) -> anyhow::Result<()> {
    if config.gates.is_empty() {
        bail!("no gates configured");
    }

    let mut poller = SensorPoller::new(client(&config), &config.gates, &config.link)?;
    let mut updates = poller.subscribe();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let printer = tokio::spawn(async move {
        let mut previous: HashMap<String, GateSnapshot> = HashMap::new();
        while updates.changed().await.is_ok() {
            let snapshots = updates.borrow_and_update().clone();
            for snapshot in snapshots {
                let unchanged = previous.get(&snapshot.name).is_some_and(|last| {
                    last.state == snapshot.state && last.sensors == snapshot.sensors
                });
                if !unchanged {
                    println!("{}", display::format_snapshot(&snapshot));
                }
                previous.insert(snapshot.name.clone(), snapshot);
            }
        }
    });

    let polling = tokio::spawn(async move { poller.run(shutdown_rx).await });

    tokio::signal::ctrl_c()
        .await
        .context("cannot listen for Ctrl-C")?;
    info!("Shutting down");

    let _ = shutdown_tx.send(true);
    polling.await?;
    printer.await?;
    Ok(())
}
