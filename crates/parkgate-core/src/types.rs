use crate::{
    Result,
    constants::{
        CHANNEL_COUNT, CHANNEL_OFF, CHANNEL_ON, MAX_CHANNEL, MIN_CHANNEL, MINOR_UNITS_PER_MAJOR,
    },
    error::Error,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Mul};

/// Network address of a relay controller.
///
/// Deserialization goes through [`RelayEndpoint::new`], so every endpoint in
/// memory has a non-empty host and a non-zero port.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "EndpointFields")]
pub struct RelayEndpoint {
    host: String,
    port: u16,
}

/// Unchecked wire shape of a [`RelayEndpoint`].
#[derive(Deserialize)]
struct EndpointFields {
    host: String,
    port: u16,
}

impl TryFrom<EndpointFields> for RelayEndpoint {
    type Error = Error;

    fn try_from(fields: EndpointFields) -> Result<Self> {
        RelayEndpoint::new(fields.host, fields.port)
    }
}

impl RelayEndpoint {
    /// Create an endpoint with validation.
    ///
    /// # Errors
    /// Returns `Error::InvalidEndpoint` if the host is empty or the port is 0.
    pub fn new(host: impl Into<String>, port: u16) -> Result<Self> {
        let host = host.into().trim().to_string();
        if host.is_empty() {
            return Err(Error::InvalidEndpoint("host must not be empty".to_string()));
        }
        if port == 0 {
            return Err(Error::InvalidEndpoint(format!(
                "port must be 1-65535, got {port}"
            )));
        }
        Ok(RelayEndpoint { host, port })
    }

    /// Host name or IP literal.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Re-check the host and port.
    ///
    /// # Errors
    /// Same conditions as [`RelayEndpoint::new`].
    pub fn validate(&self) -> Result<()> {
        Self::new(self.host.clone(), self.port).map(|_| ())
    }
}

impl fmt::Display for RelayEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

impl std::str::FromStr for RelayEndpoint {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (host, port) = s
            .trim()
            .rsplit_once(':')
            .ok_or_else(|| Error::InvalidEndpoint(format!("expected host:port, got '{s}'")))?;
        let port: u16 = port
            .parse()
            .map_err(|_| Error::InvalidEndpoint(format!("invalid port in '{s}'")))?;
        let host = host.trim_start_matches('[').trim_end_matches(']');
        RelayEndpoint::new(host, port)
    }
}

/// Relay channel number (1-8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Channel(u8);

impl Channel {
    /// Create a channel with validation.
    ///
    /// # Errors
    /// Returns `Error::InvalidChannel` if the number is outside 1-8.
    pub fn new(number: u8) -> Result<Self> {
        if !(MIN_CHANNEL..=MAX_CHANNEL).contains(&number) {
            return Err(Error::InvalidChannel(format!(
                "channel must be {MIN_CHANNEL}-{MAX_CHANNEL}, got {number}"
            )));
        }
        Ok(Channel(number))
    }

    #[must_use]
    pub fn as_u8(&self) -> u8 {
        self.0
    }

    /// Every channel of a controller, in ascending order.
    pub fn all() -> impl Iterator<Item = Channel> {
        (MIN_CHANNEL..=MAX_CHANNEL).map(Channel)
    }

    /// String index of this channel in an output (gate command) vector.
    #[inline]
    fn output_index(self) -> usize {
        usize::from(self.0) - 1
    }

    /// String index of this channel in an input (sensor reply) vector.
    #[inline]
    fn input_index(self) -> usize {
        CHANNEL_COUNT - usize::from(self.0)
    }
}

impl TryFrom<u8> for Channel {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        Channel::new(value)
    }
}

impl From<Channel> for u8 {
    fn from(channel: Channel) -> u8 {
        channel.0
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for Channel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let number: u8 = s
            .trim()
            .parse()
            .map_err(|_| Error::InvalidChannel(format!("not a channel number: {s}")))?;
        Channel::new(number)
    }
}

/// What to do with a gate's output line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GateAction {
    Open,
    Close,
}

impl GateAction {
    /// Returns `true` if the action energises the output.
    #[inline]
    #[must_use]
    pub fn is_open(self) -> bool {
        matches!(self, GateAction::Open)
    }
}

impl fmt::Display for GateAction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            GateAction::Open => write!(f, "open"),
            GateAction::Close => write!(f, "close"),
        }
    }
}

impl std::str::FromStr for GateAction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "open" => Ok(GateAction::Open),
            "close" => Ok(GateAction::Close),
            other => Err(Error::InvalidAction(other.to_string())),
        }
    }
}

/// State of the eight lines of a relay controller, stored in wire order.
///
/// Index 0 is the first digit on the wire. Outputs and inputs use opposite
/// channel orderings; use [`ChannelVector::output`] and [`ChannelVector::input`]
/// instead of indexing by hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ChannelVector([bool; CHANNEL_COUNT]);

impl ChannelVector {
    /// All lines off.
    #[must_use]
    pub fn cleared() -> Self {
        ChannelVector([false; CHANNEL_COUNT])
    }

    /// Output vector with only `channel` energised.
    #[must_use]
    pub fn single(channel: Channel) -> Self {
        let mut bits = [false; CHANNEL_COUNT];
        bits[channel.output_index()] = true;
        ChannelVector(bits)
    }

    /// Parse exactly eight `0`/`1` characters in wire order.
    ///
    /// # Errors
    /// Returns `Error::InvalidChannelVector` on wrong length or any other character.
    pub fn parse(digits: &str) -> Result<Self> {
        if digits.chars().count() != CHANNEL_COUNT {
            return Err(Error::InvalidChannelVector(format!(
                "expected {CHANNEL_COUNT} digits, got '{digits}'"
            )));
        }

        let mut bits = [false; CHANNEL_COUNT];
        for (slot, c) in bits.iter_mut().zip(digits.chars()) {
            *slot = match c {
                CHANNEL_ON => true,
                CHANNEL_OFF => false,
                other => {
                    return Err(Error::InvalidChannelVector(format!(
                        "unexpected character '{other}' in '{digits}'"
                    )));
                }
            };
        }
        Ok(ChannelVector(bits))
    }

    /// Output line state for `channel` (channel 1 is the first digit).
    #[must_use]
    pub fn output(&self, channel: Channel) -> bool {
        self.0[channel.output_index()]
    }

    /// Input line state for `channel` (channel 1 is the last digit).
    #[must_use]
    pub fn input(&self, channel: Channel) -> bool {
        self.0[channel.input_index()]
    }

    /// Channels whose input circuit is closed.
    #[must_use]
    pub fn active_inputs(&self) -> Vec<Channel> {
        Channel::all().filter(|c| self.input(*c)).collect()
    }

    /// Raw bits in wire order.
    #[must_use]
    pub fn bits(&self) -> [bool; CHANNEL_COUNT] {
        self.0
    }

    /// Render the eight digits in wire order.
    #[must_use]
    pub fn as_string(&self) -> String {
        self.0
            .iter()
            .map(|on| if *on { CHANNEL_ON } else { CHANNEL_OFF })
            .collect()
    }
}

impl fmt::Display for ChannelVector {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.as_string())
    }
}

impl std::str::FromStr for ChannelVector {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        ChannelVector::parse(s)
    }
}

impl Serialize for ChannelVector {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.as_string())
    }
}

impl<'de> Deserialize<'de> for ChannelVector {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let digits = String::deserialize(deserializer)?;
        ChannelVector::parse(&digits).map_err(serde::de::Error::custom)
    }
}

/// Exact money amount held in minor units (cents).
///
/// Serialized as the integer number of minor units. Addition and scaling
/// saturate at `u64::MAX` minor units instead of overflowing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Amount(u64);

impl Amount {
    pub const ZERO: Amount = Amount(0);

    #[must_use]
    pub const fn from_minor(minor: u64) -> Self {
        Amount(minor)
    }

    #[must_use]
    pub const fn from_major(major: u64) -> Self {
        Amount(major * MINOR_UNITS_PER_MAJOR)
    }

    #[must_use]
    pub const fn minor(&self) -> u64 {
        self.0
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[must_use]
    pub fn checked_sub(self, rhs: Amount) -> Option<Amount> {
        self.0.checked_sub(rhs.0).map(Amount)
    }

    #[must_use]
    pub fn saturating_sub(self, rhs: Amount) -> Amount {
        Amount(self.0.saturating_sub(rhs.0))
    }
}

impl Add for Amount {
    type Output = Amount;

    fn add(self, rhs: Amount) -> Amount {
        Amount(self.0.saturating_add(rhs.0))
    }
}

impl Mul<u64> for Amount {
    type Output = Amount;

    fn mul(self, rhs: u64) -> Amount {
        Amount(self.0.saturating_mul(rhs))
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Amount>>(iter: I) -> Amount {
        iter.fold(Amount::ZERO, Add::add)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}.{:02}",
            self.0 / MINOR_UNITS_PER_MAJOR,
            self.0 % MINOR_UNITS_PER_MAJOR
        )
    }
}

impl std::str::FromStr for Amount {
    type Err = Error;

    /// Parse `12`, `12.5` or `12.50`.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let invalid = || Error::InvalidAmount(format!("'{s}'"));

        let (major, minor) = match s.split_once('.') {
            Some((_, "")) => return Err(invalid()),
            Some((major, minor)) => (major, minor),
            None => (s, ""),
        };
        if major.is_empty() || !major.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        if minor.len() > 2 || !minor.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }

        let major: u64 = major.parse().map_err(|_| invalid())?;
        let minor: u64 = match minor.len() {
            0 => 0,
            1 => minor.parse::<u64>().map_err(|_| invalid())? * 10,
            _ => minor.parse().map_err(|_| invalid())?,
        };

        major
            .checked_mul(MINOR_UNITS_PER_MAJOR)
            .and_then(|m| m.checked_add(minor))
            .map(Amount)
            .ok_or_else(invalid)
    }
}
