//! Facility configuration.
//!
//! One explicit, read-only object describing the relay controllers and the
//! tariff. The application loads it once and passes references to whatever
//! needs it; nothing in the workspace reads gate addresses from globals.
//!
//! # File Format
//!
//! ```json
//! {
//!   "link": { "timeout_ms": 5000, "poll_interval_ms": 2000, "offline_threshold": 3 },
//!   "gates": [
//!     { "name": "north-exit", "host": "192.168.1.50", "port": 502, "channel": 1 },
//!     { "name": "north-entry", "host": "192.168.1.50", "port": 502, "channel": 2, "role": "entry" }
//!   ],
//!   "tariff": {
//!     "rate_tier1": 500, "rate_tier2": 300, "rate_tier3": 200, "rate_tier4": 100,
//!     "lost_ticket_fee": 5000, "exempt_categories": ["staff", "vip"]
//!   }
//! }
//! ```
//!
//! `link` and `tariff` may be omitted and fall back to their defaults. Money
//! is given in minor units (cents).

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use parkgate_billing::TariffTable;
use parkgate_core::{
    Channel, Error, RelayEndpoint, Result,
    constants::{DEFAULT_LINK_TIMEOUT_MS, DEFAULT_OFFLINE_THRESHOLD, DEFAULT_POLL_INTERVAL_MS},
};
use parkgate_network::RelayClientConfig;

fn default_timeout_ms() -> u64 {
    DEFAULT_LINK_TIMEOUT_MS
}

fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

fn default_offline_threshold() -> u32 {
    DEFAULT_OFFLINE_THRESHOLD
}

/// Timing of relay exchanges and polling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkSettings {
    /// Bound for one relay exchange.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Interval between two sensor polls of a gate.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Consecutive poll failures before a gate is reported offline.
    #[serde(default = "default_offline_threshold")]
    pub offline_threshold: u32,
}

impl Default for LinkSettings {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_LINK_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            offline_threshold: DEFAULT_OFFLINE_THRESHOLD,
        }
    }
}

impl LinkSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Relay client configuration derived from these settings.
    pub fn client_config(&self) -> RelayClientConfig {
        RelayClientConfig {
            timeout: self.timeout(),
        }
    }
}

/// Which way traffic passes a gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GateRole {
    Entry,
    #[default]
    Exit,
}

/// One physical gate: the relay controller driving it and its output channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateConfig {
    pub name: String,
    pub host: String,
    pub port: u16,
    pub channel: u8,
    #[serde(default)]
    pub role: GateRole,
}

impl GateConfig {
    /// Relay controller address of this gate.
    ///
    /// # Errors
    /// Returns `Error::InvalidEndpoint` if host or port are malformed.
    pub fn endpoint(&self) -> Result<RelayEndpoint> {
        RelayEndpoint::new(self.host.clone(), self.port)
    }

    /// # Errors
    /// Returns `Error::Config` naming the gate and the offending field.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::Config("gate name must not be empty".to_string()));
        }
        self.endpoint()
            .map_err(|e| Error::Config(format!("gate '{}': {e}", self.name)))?;
        Channel::new(self.channel)
            .map_err(|e| Error::Config(format!("gate '{}': {e}", self.name)))?;
        Ok(())
    }
}

/// Everything the gate subsystem needs to know about a facility.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FacilityConfig {
    #[serde(default)]
    pub link: LinkSettings,

    #[serde(default)]
    pub gates: Vec<GateConfig>,

    #[serde(default)]
    pub tariff: TariffTable,
}

impl FacilityConfig {
    /// Parse and validate a JSON configuration.
    ///
    /// # Errors
    /// Returns `Error::Config` on malformed JSON or any invalid gate.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: FacilityConfig = serde_json::from_str(json)
            .map_err(|e| Error::Config(format!("invalid configuration: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON configuration file.
    ///
    /// # Errors
    /// Returns `Error::Config` if the file cannot be read or is invalid.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {e}", path.display())))?;
        Self::from_json_str(&json)
    }

    /// Check every gate and that gate names are unique.
    ///
    /// # Errors
    /// Returns `Error::Config` describing the first problem found.
    pub fn validate(&self) -> Result<()> {
        if self.link.timeout_ms == 0 {
            return Err(Error::Config("link timeout must be positive".to_string()));
        }
        if self.link.poll_interval_ms == 0 {
            return Err(Error::Config("poll interval must be positive".to_string()));
        }

        let mut names = HashSet::new();
        for gate in &self.gates {
            gate.validate()?;
            if !names.insert(gate.name.as_str()) {
                return Err(Error::Config(format!("duplicate gate name '{}'", gate.name)));
            }
        }
        Ok(())
    }

    /// Look up a gate by name.
    pub fn gate(&self, name: &str) -> Option<&GateConfig> {
        self.gates.iter().find(|gate| gate.name == name)
    }
}
