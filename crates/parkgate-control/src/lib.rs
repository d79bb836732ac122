//! Gate operations built on the relay link client and fee calculator.
//!
//! This crate holds the pieces an application's composition root wires
//! together: the facility configuration, per-gate link health tracking, the
//! periodic sensor poller and exit processing.

pub mod config;
pub mod exit;
pub mod health;
pub mod poller;

pub use config::{FacilityConfig, GateConfig, GateRole, LinkSettings};
pub use exit::{ExitError, ExitProcessor, ExitReceipt};
pub use health::{LinkHealth, LinkState, LinkTransition};
pub use poller::{GateSnapshot, GateTransition, SensorPoller};
