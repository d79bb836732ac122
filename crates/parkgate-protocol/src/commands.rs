//! Commands understood by a relay controller.
//!
//! # Wire Format
//!
//! ```text
//! Gate command:  all + 8 digits, channel 1 first     all00100000
//! Sensor query:  input                               input
//! ```
//!
//! Neither command carries a terminator; the controller takes each TCP write
//! as one command.

use serde::{Deserialize, Serialize};
use std::fmt;

use parkgate_core::{
    Channel, ChannelVector, GateAction,
    constants::{GATE_COMMAND_LENGTH, GATE_COMMAND_PREFIX, SENSOR_QUERY},
};

/// A command sent to a relay controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelayCommand {
    /// Drive one output line. `Close` releases every output regardless of channel.
    Gate { channel: Channel, action: GateAction },

    /// Ask for the state of the eight input lines.
    SensorQuery,
}

impl RelayCommand {
    /// Build a gate command.
    #[must_use]
    pub fn gate(channel: Channel, action: GateAction) -> Self {
        RelayCommand::Gate { channel, action }
    }

    /// Output vector carried by a gate command, `None` for queries.
    ///
    /// # Examples
    ///
    /// ```
    /// use parkgate_core::{Channel, GateAction};
    /// use parkgate_protocol::RelayCommand;
    ///
    /// let open = RelayCommand::gate(Channel::new(2).unwrap(), GateAction::Open);
    /// assert_eq!(open.output_vector().unwrap().to_string(), "01000000");
    ///
    /// let close = RelayCommand::gate(Channel::new(2).unwrap(), GateAction::Close);
    /// assert_eq!(close.output_vector().unwrap().to_string(), "00000000");
    /// ```
    #[must_use]
    pub fn output_vector(&self) -> Option<ChannelVector> {
        match self {
            RelayCommand::Gate {
                channel,
                action: GateAction::Open,
            } => Some(ChannelVector::single(*channel)),
            RelayCommand::Gate {
                action: GateAction::Close,
                ..
            } => Some(ChannelVector::cleared()),
            RelayCommand::SensorQuery => None,
        }
    }

    /// Returns `true` if the controller answers this command.
    #[inline]
    #[must_use]
    pub fn expects_reply(&self) -> bool {
        matches!(self, RelayCommand::SensorQuery)
    }

    /// Render the command exactly as it goes on the wire.
    ///
    /// # Examples
    ///
    /// ```
    /// use parkgate_core::{Channel, GateAction};
    /// use parkgate_protocol::RelayCommand;
    ///
    /// let open = RelayCommand::gate(Channel::new(1).unwrap(), GateAction::Open);
    /// assert_eq!(open.encode(), "all10000000");
    /// assert_eq!(RelayCommand::SensorQuery.encode(), "input");
    /// ```
    #[must_use]
    pub fn encode(&self) -> String {
        match self.output_vector() {
            Some(vector) => {
                let mut command = String::with_capacity(GATE_COMMAND_LENGTH);
                command.push_str(GATE_COMMAND_PREFIX);
                command.push_str(&vector.as_string());
                command
            }
            None => SENSOR_QUERY.to_string(),
        }
    }
}

impl fmt::Display for RelayCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}
