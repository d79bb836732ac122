//! Relay link layer for Parkgate
//!
//! This crate talks to the network relay controllers that drive parking gates
//! and read vehicle-presence loops. Each operation is one short-lived TCP
//! exchange with a single timeout and no retries.
//!
//! # Components
//!
//! - **RelayClient**: `send_command`, `control_gate`, `read_sensors`
//! - **Connector**: transport seam, [`TcpConnector`] in production
//! - **LinkError**: validation / transport / timeout / protocol failures
//!
//! # Example
//!
//! ```no_run
//! use parkgate_core::{GateAction, RelayEndpoint};
//! use parkgate_network::{RelayClient, RelayClientConfig};
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = RelayClient::new(RelayClientConfig {
//!     timeout: Duration::from_millis(3000),
//! });
//!
//! let gate = RelayEndpoint::new("192.168.1.50", 502)?;
//! client.control_gate(&gate, 2, GateAction::Open).await?;
//! # Ok(())
//! # }
//! ```

mod client;
mod connector;
mod error;

pub use client::{GateAck, RelayClient, RelayClientConfig};
pub use connector::{Connector, TcpConnector};
pub use error::{LinkError, LinkErrorKind, Result};
