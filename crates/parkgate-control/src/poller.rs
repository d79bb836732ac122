//! Periodic sensor polling.
//!
//! Every tick the poller reads the input lines of each configured gate, one
//! relay call per gate, all gates concurrently. Each gate keeps its own
//! [`LinkHealth`], so a dead controller never delays or affects the others.
//!
//! ```text
//!             ┌── read_sensors(gate A) ──> LinkHealth A ──┐
//! interval ───┼── read_sensors(gate B) ──> LinkHealth B ──┼──> watch<Vec<GateSnapshot>>
//!             └── read_sensors(gate C) ──> LinkHealth C ──┘
//! ```
//!
//! Sensor readings survive isolated failures and are dropped once a gate goes
//! offline, so a stale "vehicle present" is never reported for a dead link.

use chrono::{DateTime, Local};
use futures::future::join_all;
use serde::Serialize;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use parkgate_core::{ChannelVector, RelayEndpoint, Result};
use parkgate_network::{Connector, LinkErrorKind, RelayClient, TcpConnector};

use crate::config::{GateConfig, LinkSettings};
use crate::health::{LinkHealth, LinkState, LinkTransition};

/// Published view of one gate after a polling round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GateSnapshot {
    pub name: String,
    pub endpoint: RelayEndpoint,
    pub state: LinkState,
    /// Last good reading, `None` before the first one or while offline.
    pub sensors: Option<ChannelVector>,
    pub consecutive_failures: u32,
    pub last_error: Option<LinkErrorKind>,
    pub last_poll: Option<DateTime<Local>>,
}

/// Link state change of a named gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GateTransition {
    pub gate: String,
    pub transition: LinkTransition,
}

#[derive(Debug)]
struct PolledGate {
    name: String,
    endpoint: RelayEndpoint,
    health: LinkHealth,
    sensors: Option<ChannelVector>,
    last_poll: Option<DateTime<Local>>,
}

impl PolledGate {
    fn snapshot(&self) -> GateSnapshot {
        GateSnapshot {
            name: self.name.clone(),
            endpoint: self.endpoint.clone(),
            state: self.health.state(),
            sensors: self.sensors,
            consecutive_failures: self.health.consecutive_failures(),
            last_error: self.health.last_error(),
            last_poll: self.last_poll,
        }
    }
}

/// Polls the sensor inputs of a set of gates.
pub struct SensorPoller<C: Connector = TcpConnector> {
    client: RelayClient<C>,
    gates: Vec<PolledGate>,
    interval: Duration,
    snapshots: watch::Sender<Vec<GateSnapshot>>,
}

impl<C: Connector> SensorPoller<C> {
    /// Create a poller for `gates`. Every gate starts in `Checking`.
    ///
    /// # Errors
    /// Returns the validation error of the first malformed gate.
    pub fn new(client: RelayClient<C>, gates: &[GateConfig], settings: &LinkSettings) -> Result<Self> {
        let gates = gates
            .iter()
            .map(|gate| {
                gate.validate()?;
                Ok(PolledGate {
                    name: gate.name.clone(),
                    endpoint: gate.endpoint()?,
                    health: LinkHealth::new(settings.offline_threshold),
                    sensors: None,
                    last_poll: None,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let (snapshots, _) = watch::channel(gates.iter().map(PolledGate::snapshot).collect());

        Ok(Self {
            client,
            gates,
            interval: settings.poll_interval(),
            snapshots,
        })
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Receiver that sees the snapshot list after every polling round.
    pub fn subscribe(&self) -> watch::Receiver<Vec<GateSnapshot>> {
        self.snapshots.subscribe()
    }

    /// Current snapshot of every gate, in configuration order.
    pub fn snapshots(&self) -> Vec<GateSnapshot> {
        self.gates.iter().map(PolledGate::snapshot).collect()
    }

    /// Poll every gate once, concurrently, and publish the result.
    ///
    /// Returns the link state changes caused by this round.
    pub async fn poll_once(&mut self) -> Vec<GateTransition> {
        let client = &self.client;
        let results = join_all(
            self.gates
                .iter()
                .map(|gate| client.read_sensors(&gate.endpoint)),
        )
        .await;

        let now = Local::now();
        let mut transitions = Vec::new();

        for (gate, result) in self.gates.iter_mut().zip(results) {
            gate.last_poll = Some(now);

            let changed = match result {
                Ok(sensors) => {
                    debug!(gate = %gate.name, %sensors, "Sensor reading");
                    gate.sensors = Some(sensors);
                    gate.health.record_success()
                }
                Err(e) => {
                    debug!(gate = %gate.name, endpoint = %gate.endpoint, "Sensor poll failed: {}", e);
                    gate.health.record_failure(e.kind())
                }
            };

            if gate.health.state() == LinkState::Offline {
                gate.sensors = None;
            }

            if let Some(transition) = changed {
                match transition.to {
                    LinkState::Offline => warn!(
                        gate = %gate.name,
                        endpoint = %gate.endpoint,
                        failures = gate.health.consecutive_failures(),
                        "Gate offline"
                    ),
                    _ => info!(gate = %gate.name, endpoint = %gate.endpoint, "Gate {}", transition.to),
                }
                transitions.push(GateTransition {
                    gate: gate.name.clone(),
                    transition,
                });
            }
        }

        self.snapshots.send_replace(self.snapshots());
        transitions
    }

    /// Poll every `interval` until `shutdown` becomes `true` or its sender is dropped.
    ///
    /// The first round starts immediately. A round already in progress is
    /// completed before shutdown is observed.
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) {
        info!(
            gates = self.gates.len(),
            interval_ms = self.interval.as_millis() as u64,
            "Sensor poller started"
        );

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        while !*shutdown.borrow() {
            tokio::select! {
                _ = ticker.tick() => {
                    self.poll_once().await;
                }
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        info!("Sensor poller stopped");
    }
}
