//! Relay controller line protocol.
//!
//! Encoding of gate and sensor commands, parsing of sensor replies, and a
//! [`RelayCodec`] for driving an exchange through `tokio_util::codec::Framed`.

pub mod codec;
pub mod commands;
pub mod reply;

pub use codec::RelayCodec;
pub use commands::RelayCommand;
pub use reply::{ReplyError, parse_sensor_reply};
