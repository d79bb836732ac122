//! Parsing of relay controller replies.
//!
//! A sensor reply echoes the query token followed by the input vector:
//!
//! ```text
//! input00100000
//! ^^^^^         query token
//!      ^^^^^^^^ inputs, channel 8 first, channel 1 last
//! ```
//!
//! Controllers may append trailing characters after the eight digits; they
//! are ignored.

use thiserror::Error;

use parkgate_core::{
    ChannelVector,
    constants::{CHANNEL_COUNT, SENSOR_QUERY},
};

/// A reply that does not have the shape of a sensor reply.
///
/// Carries the raw text so firmware mismatches can be diagnosed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unexpected relay reply '{raw}': {reason}")]
pub struct ReplyError {
    pub raw: String,
    pub reason: &'static str,
}

impl ReplyError {
    fn new(raw: &str, reason: &'static str) -> Self {
        Self {
            raw: raw.to_string(),
            reason,
        }
    }
}

/// Extract the input vector from a sensor reply.
///
/// Surrounding whitespace is ignored. The eight characters immediately after
/// the `input` token are the vector, kept in wire order.
///
/// # Errors
///
/// Returns [`ReplyError`] if the reply does not start with `input`, has fewer
/// than eight characters after it, or those characters are not `0`/`1`.
///
/// # Examples
///
/// ```
/// use parkgate_core::Channel;
/// use parkgate_protocol::parse_sensor_reply;
///
/// let inputs = parse_sensor_reply("input00000100\r\n").unwrap();
/// assert!(inputs.input(Channel::new(3).unwrap()));
/// assert!(parse_sensor_reply("error").is_err());
/// ```
pub fn parse_sensor_reply(raw: &str) -> Result<ChannelVector, ReplyError> {
    let trimmed = raw.trim();

    let data = trimmed
        .strip_prefix(SENSOR_QUERY)
        .ok_or_else(|| ReplyError::new(raw, "missing input prefix"))?;

    let digits: String = data.chars().take(CHANNEL_COUNT).collect();
    if digits.chars().count() < CHANNEL_COUNT {
        return Err(ReplyError::new(raw, "fewer than 8 channel digits"));
    }

    ChannelVector::parse(&digits).map_err(|_| ReplyError::new(raw, "channel digits must be 0 or 1"))
}
