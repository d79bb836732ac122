//! Relay link client.
//!
//! Each call opens one connection to a relay controller, writes one command,
//! optionally reads the first reply, and closes. Nothing is kept between calls.
//!
//! # Architecture
//!
//! ```text
//! Operator action / SensorPoller / ExitProcessor
//!     │
//!     └─> RelayClient ──(Connector)──> Relay controller
//!            │
//!            └─> RelayCodec (raw command bytes, first reply chunk)
//! ```
//!
//! # Example Usage
//!
//! ```no_run
//! use parkgate_core::{GateAction, RelayEndpoint};
//! use parkgate_network::{RelayClient, RelayClientConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = RelayClient::new(RelayClientConfig::default());
//! let endpoint = RelayEndpoint::new("192.168.1.50", 502)?;
//!
//! client.control_gate(&endpoint, 1, GateAction::Open).await?;
//!
//! let inputs = client.read_sensors(&endpoint).await?;
//! println!("vehicle on loop 1: {}", inputs.input(parkgate_core::Channel::new(1)?));
//! # Ok(())
//! # }
//! ```
//!
//! # Design Principles
//!
//! - **No automatic retry**: caller decides retry strategy
//! - **No connection reuse**: one socket per call, always closed on return
//! - **One deadline**: connect, write and read share a single timeout
//!
//! # Timeout Handling
//!
//! The whole exchange is one future raced against the timer. When the timer
//! wins, the exchange future is dropped, which destroys the socket; a late
//! reply or connection error has nowhere left to be delivered, so a call
//! resolves exactly once.

use futures::{SinkExt, StreamExt};
use std::time::Duration;
use tokio_util::codec::Framed;
use tracing::{debug, error, info, trace, warn};

use parkgate_core::{
    Channel, ChannelVector, GateAction, RelayEndpoint,
    constants::{COMMAND_SENT, DEFAULT_LINK_TIMEOUT_MS, SENSOR_QUERY},
};
use parkgate_protocol::{RelayCodec, RelayCommand, parse_sensor_reply};

use crate::connector::{Connector, TcpConnector};
use crate::error::{LinkError, Result};

/// Configuration for the relay link client
///
/// # Example
///
/// ```
/// use parkgate_network::RelayClientConfig;
/// use std::time::Duration;
///
/// let config = RelayClientConfig {
///     timeout: Duration::from_millis(2000),
/// };
/// assert_eq!(RelayClientConfig::default().timeout.as_millis(), 5000);
/// ```
#[derive(Debug, Clone)]
pub struct RelayClientConfig {
    /// Bound for one complete exchange (connect, write, read)
    pub timeout: Duration,
}

impl Default for RelayClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(DEFAULT_LINK_TIMEOUT_MS),
        }
    }
}

/// Acknowledgement of a gate command handed to the relay.
///
/// Only confirms the bytes were written; the relay does not report actuation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateAck {
    pub endpoint: RelayEndpoint,
    pub channel: Channel,
    pub action: GateAction,
    /// Command exactly as written to the wire.
    pub command: String,
}

/// Client for relay controller exchanges.
///
/// Cheap to clone; clones share no mutable state, and calls on one client may
/// run concurrently against the same or different endpoints. Callers that need
/// strict ordering of commands to one gate must serialize those calls.
#[derive(Debug, Clone)]
pub struct RelayClient<C = TcpConnector> {
    connector: C,
    timeout: Duration,
}

impl RelayClient<TcpConnector> {
    /// Create a TCP client with the given configuration
    ///
    /// # Example
    ///
    /// ```
    /// use parkgate_network::{RelayClient, RelayClientConfig};
    ///
    /// let client = RelayClient::new(RelayClientConfig::default());
    /// assert_eq!(client.timeout().as_millis(), 5000);
    /// ```
    pub fn new(config: RelayClientConfig) -> Self {
        Self::with_connector(config, TcpConnector)
    }
}

impl<C: Connector> RelayClient<C> {
    /// Create a client that opens its connections through `connector`.
    pub fn with_connector(config: RelayClientConfig, connector: C) -> Self {
        debug!("Creating relay client with {}ms timeout", config.timeout.as_millis());

        Self {
            connector,
            timeout: config.timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    /// Perform one command exchange with a relay controller.
    ///
    /// With `wait_for_response == false` the call resolves with
    /// [`COMMAND_SENT`] as soon as the command is written and the connection
    /// shut down. Otherwise it resolves with the first reply, trimmed.
    ///
    /// # Errors
    ///
    /// - [`LinkError::Timeout`] if the exchange does not finish within the
    ///   configured timeout
    /// - [`LinkError::Transport`] on connection failure, reset, or if the relay
    ///   closes the connection before replying
    pub async fn send_command(
        &self,
        endpoint: &RelayEndpoint,
        command: &str,
        wait_for_response: bool,
    ) -> Result<String> {
        trace!(%endpoint, command, wait_for_response, "Sending relay command");

        match tokio::time::timeout(self.timeout, self.exchange(endpoint, command, wait_for_response))
            .await
        {
            Ok(Ok(reply)) => {
                trace!(%endpoint, reply = %reply, "Relay exchange completed");
                Ok(reply)
            }
            Ok(Err(e)) => {
                error!(%endpoint, "Relay exchange failed: {}", e);
                Err(e)
            }
            Err(_) => {
                warn!(%endpoint, "Relay exchange timeout after {}ms", self.timeout.as_millis());
                Err(LinkError::timeout(self.timeout.as_millis() as u64))
            }
        }
    }

    /// Open or close a gate wired to `channel` of the relay at `endpoint`.
    ///
    /// Fire-and-forget: the relay's physical actuation is not confirmed.
    ///
    /// # Errors
    ///
    /// - [`LinkError::Validation`] if `channel` is outside 1-8; no connection
    ///   is attempted
    /// - any error of [`send_command`](Self::send_command)
    pub async fn control_gate(
        &self,
        endpoint: &RelayEndpoint,
        channel: u8,
        action: GateAction,
    ) -> Result<GateAck> {
        let channel = Channel::new(channel).map_err(|e| {
            warn!(%endpoint, channel, "Rejected gate command: {}", e);
            LinkError::from(e)
        })?;

        let command = RelayCommand::gate(channel, action).encode();
        info!(%endpoint, %channel, %action, "Sending gate command");

        self.send_command(endpoint, &command, false).await?;

        Ok(GateAck {
            endpoint: endpoint.clone(),
            channel,
            action,
            command,
        })
    }

    /// Read the eight input lines of the relay at `endpoint`.
    ///
    /// # Errors
    ///
    /// - [`LinkError::Protocol`] if the reply is not `input` followed by eight
    ///   binary digits
    /// - any error of [`send_command`](Self::send_command)
    pub async fn read_sensors(&self, endpoint: &RelayEndpoint) -> Result<ChannelVector> {
        let reply = self.send_command(endpoint, SENSOR_QUERY, true).await?;

        parse_sensor_reply(&reply).map_err(|e| {
            warn!(%endpoint, "{}", e);
            LinkError::from(e)
        })
    }

    /// Connect, write, and optionally read; the caller bounds this with the timeout.
    async fn exchange(
        &self,
        endpoint: &RelayEndpoint,
        command: &str,
        wait_for_response: bool,
    ) -> Result<String> {
        let stream = self
            .connector
            .connect(endpoint)
            .await
            .map_err(LinkError::transport)?;
        debug!(%endpoint, "Connected to relay");

        let mut framed = Framed::new(stream, RelayCodec::new());
        framed.send(command).await.map_err(LinkError::transport)?;

        if !wait_for_response {
            close(&mut framed, endpoint).await;
            return Ok(COMMAND_SENT.to_string());
        }

        let reply = match framed.next().await {
            Some(Ok(reply)) => reply,
            Some(Err(e)) => return Err(LinkError::transport(e)),
            None => {
                return Err(LinkError::transport(
                    "connection closed before relay replied",
                ));
            }
        };

        close(&mut framed, endpoint).await;
        Ok(reply)
    }
}

/// Flush and shut down the write half. Failures here do not change the
/// outcome of an exchange whose command already went out.
async fn close<S>(framed: &mut Framed<S, RelayCodec>, endpoint: &RelayEndpoint)
where
    S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin,
{
    if let Err(e) = SinkExt::<&str>::close(framed).await {
        debug!(%endpoint, "Error closing relay connection: {}", e);
    }
}
