//! Core constants for the relay line protocol and gate control.
//!
//! Relay controllers speak a plain text protocol over TCP. There is no
//! framing byte and no terminator: the controller treats each write as one
//! command and answers queries with a single line.
//!
//! ```text
//! Gate command:   all<8 channel digits>     e.g. all10000000 (open channel 1)
//! Sensor query:   input
//! Sensor reply:   input<8 channel digits>   e.g. input00100000
//! ```
//!
//! # Channel Ordering
//!
//! The two directions index channels differently and both conventions must be
//! preserved for compatibility with deployed controllers:
//!
//! | Direction | Channel 1 position | Channel N position |
//! |-----------|--------------------|--------------------|
//! | Output (gate command) | first digit | index `N - 1` |
//! | Input (sensor reply) | last digit | index `8 - N` |
//!
//! # Usage
//!
//! ```
//! use parkgate_core::constants::*;
//!
//! assert_eq!(GATE_COMMAND_PREFIX.len() + CHANNEL_COUNT, GATE_COMMAND_LENGTH);
//!
//! use std::time::Duration;
//! let timeout = Duration::from_millis(DEFAULT_LINK_TIMEOUT_MS);
//! assert_eq!(timeout.as_secs(), 5);
//! ```

// ============================================================================
// Wire Tokens
// ============================================================================

/// Literal prefix of every gate (output) command.
///
/// # Examples
///
/// ```
/// use parkgate_core::constants::GATE_COMMAND_PREFIX;
///
/// let command = format!("{GATE_COMMAND_PREFIX}10000000");
/// assert_eq!(command, "all10000000");
/// ```
pub const GATE_COMMAND_PREFIX: &str = "all";

/// Sensor query token. Also the prefix of the controller's reply.
pub const SENSOR_QUERY: &str = "input";

/// Character marking an energised output or a closed input circuit.
pub const CHANNEL_ON: char = '1';

/// Character marking a released output or an open input circuit.
pub const CHANNEL_OFF: char = '0';

// ============================================================================
// Channel Addressing
// ============================================================================

/// Number of output (and input) lines on a relay controller.
pub const CHANNEL_COUNT: usize = 8;

/// Lowest valid channel number.
pub const MIN_CHANNEL: u8 = 1;

/// Highest valid channel number.
pub const MAX_CHANNEL: u8 = 8;

/// Total length of an encoded gate command (`all` + 8 digits).
pub const GATE_COMMAND_LENGTH: usize = 11;

// ============================================================================
// Link Timing
// ============================================================================

/// Default bound for one complete relay exchange (connect, write, read).
pub const DEFAULT_LINK_TIMEOUT_MS: u64 = 5000;

/// Default interval between two sensor polls of the same gate.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 2000;

/// Consecutive failed polls after which a gate is reported offline.
pub const DEFAULT_OFFLINE_THRESHOLD: u32 = 3;

/// Value returned by a fire-and-forget exchange once the command bytes are
/// handed to the socket. It does not confirm physical actuation.
pub const COMMAND_SENT: &str = "SENT";

// ============================================================================
// Money
// ============================================================================

/// Minor units (cents) per major currency unit.
pub const MINOR_UNITS_PER_MAJOR: u64 = 100;
