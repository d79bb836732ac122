//! Tokio codec for relay controller exchanges.
//!
//! The relay protocol has no framing: a command is whatever bytes one write
//! carries, and a reply is whatever the controller sends back in its first
//! burst. `RelayCodec` mirrors that:
//! - [`Encoder`]: writes the command text as raw bytes, no terminator
//! - [`Decoder`]: yields everything buffered so far as one trimmed text frame,
//!   cut at the maximum frame size
//!
//! # Usage with Tokio Framed
//!
//! ```rust,no_run
//! use futures::{SinkExt, StreamExt};
//! use tokio::net::TcpStream;
//! use tokio_util::codec::Framed;
//! use parkgate_protocol::{RelayCodec, RelayCommand};
//!
//! # async fn example() -> std::io::Result<()> {
//! let stream = TcpStream::connect("192.168.1.50:502").await?;
//! let mut framed = Framed::new(stream, RelayCodec::new());
//!
//! framed.send(RelayCommand::SensorQuery).await?;
//! if let Some(Ok(reply)) = framed.next().await {
//!     println!("relay replied: {reply}");
//! }
//! # Ok(())
//! # }
//! ```

use bytes::{BufMut, BytesMut};
use std::io;
use tokio_util::codec::{Decoder, Encoder};

use crate::RelayCommand;

/// Default maximum reply size in bytes.
///
/// A sensor reply is 13 bytes. Longer replies are truncated to this size;
/// the reply parser decides whether what remains is usable.
const DEFAULT_MAX_FRAME_SIZE: usize = 4 * 1024;

/// Codec for raw relay command/reply exchanges.
#[derive(Debug, Clone)]
pub struct RelayCodec {
    max_frame_size: usize,
}

impl RelayCodec {
    /// Create a codec with the default maximum reply size (4 KB).
    #[must_use]
    pub fn new() -> Self {
        Self {
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
        }
    }

    /// Create a codec with a custom maximum reply size.
    #[must_use]
    pub fn with_max_frame_size(max_frame_size: usize) -> Self {
        Self { max_frame_size }
    }

    #[must_use]
    pub fn max_frame_size(&self) -> usize {
        self.max_frame_size
    }
}

impl Default for RelayCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for RelayCodec {
    type Item = String;
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.is_empty() {
            return Ok(None);
        }

        let mut chunk = src.split();
        chunk.truncate(self.max_frame_size);
        Ok(Some(String::from_utf8_lossy(&chunk).trim().to_string()))
    }
}

impl Encoder<&str> for RelayCodec {
    type Error = io::Error;

    fn encode(&mut self, item: &str, dst: &mut BytesMut) -> Result<(), Self::Error> {
        dst.reserve(item.len());
        dst.put_slice(item.as_bytes());
        Ok(())
    }
}

impl Encoder<RelayCommand> for RelayCodec {
    type Error = io::Error;

    fn encode(&mut self, item: RelayCommand, dst: &mut BytesMut) -> Result<(), Self::Error> {
        Encoder::<&str>::encode(self, item.encode().as_str(), dst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parkgate_core::{Channel, GateAction};

    #[test]
    fn test_encode_str_without_terminator() {
        let mut codec = RelayCodec::new();
        let mut buf = BytesMut::new();
        codec.encode("all10000000", &mut buf).unwrap();
        assert_eq!(&buf[..], b"all10000000");
    }

    #[test]
    fn test_encode_command() {
        let mut codec = RelayCodec::new();
        let mut buf = BytesMut::new();
        let command = RelayCommand::gate(Channel::new(2).unwrap(), GateAction::Open);
        codec.encode(command, &mut buf).unwrap();
        assert_eq!(&buf[..], b"all01000000");
    }

    #[test]
    fn test_decode_empty_buffer() {
        let mut codec = RelayCodec::new();
        let mut buf = BytesMut::new();
        assert_eq!(codec.decode(&mut buf).unwrap(), None);
    }

    #[test]
    fn test_decode_trims_and_drains() {
        let mut codec = RelayCodec::new();
        let mut buf = BytesMut::from(&b"input00100000\r\n"[..]);
        assert_eq!(
            codec.decode(&mut buf).unwrap(),
            Some("input00100000".to_string())
        );
        assert!(buf.is_empty());
    }

    #[test]
    fn test_decode_invalid_utf8_is_lossy() {
        let mut codec = RelayCodec::new();
        let mut buf = BytesMut::from(&[b'i', 0xFF, b'n'][..]);
        let frame = codec.decode(&mut buf).unwrap().unwrap();
        assert!(frame.starts_with('i'));
        assert!(frame.ends_with('n'));
    }

    #[test]
    fn test_decode_truncates_oversized_reply() {
        let mut codec = RelayCodec::with_max_frame_size(8);
        let mut buf = BytesMut::from(&b"input00100000"[..]);
        assert_eq!(codec.decode(&mut buf).unwrap(), Some("input001".to_string()));
        assert!(buf.is_empty());
    }

    #[test]
    fn test_decode_long_reply_keeps_leading_reading() {
        let mut codec = RelayCodec::new();
        let reply = format!("input00100000{}", "x".repeat(6000));
        let mut buf = BytesMut::from(reply.as_bytes());

        let frame = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(frame.len(), DEFAULT_MAX_FRAME_SIZE);
        assert!(frame.starts_with("input00100000"));
    }
}
