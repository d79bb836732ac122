//! Transport seam for relay exchanges.
//!
//! [`RelayClient`](crate::RelayClient) never opens sockets itself; it asks a
//! [`Connector`] for one byte stream per call. Production code uses
//! [`TcpConnector`]; tests substitute in-memory streams and count attempts.

use std::future::Future;
use std::io;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tracing::warn;

use parkgate_core::RelayEndpoint;

/// Opens one byte stream to a relay controller.
///
/// # Object Safety
///
/// `connect` returns `impl Future` (Edition 2024 RPITIT), so the trait is not
/// object-safe. Use it as a generic parameter:
///
/// ```no_run
/// use parkgate_network::{Connector, RelayClient};
///
/// fn describe<C: Connector>(client: &RelayClient<C>) -> u128 {
///     client.timeout().as_millis()
/// }
/// ```
pub trait Connector: Send + Sync {
    /// Stream type produced by this connector.
    type Stream: AsyncRead + AsyncWrite + Unpin + Send + 'static;

    /// Open a fresh connection to `endpoint`.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error when the connection cannot be established.
    fn connect(
        &self,
        endpoint: &RelayEndpoint,
    ) -> impl Future<Output = io::Result<Self::Stream>> + Send;
}

/// Plain TCP connector. Host names are resolved on every call.
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpConnector;

impl Connector for TcpConnector {
    type Stream = TcpStream;

    async fn connect(&self, endpoint: &RelayEndpoint) -> io::Result<TcpStream> {
        let stream = TcpStream::connect((endpoint.host(), endpoint.port())).await?;

        // Commands are single small writes; do not let Nagle hold them back.
        if let Err(e) = stream.set_nodelay(true) {
            warn!("Failed to set TCP_NODELAY: {} - command latency may be impacted", e);
        }

        Ok(stream)
    }
}
