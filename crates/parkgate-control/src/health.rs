//! Relay link health state machine.
//!
//! Tracks whether a gate's relay controller is reachable, based on the outcome
//! of consecutive link calls.
//!
//! # States
//!
//! - `Checking`: no conclusive result yet (startup or after a reset)
//! - `Online`: the last call succeeded
//! - `Offline`: `threshold` consecutive calls failed
//!
//! # Valid Transitions
//!
//! - Checking → Online (any success)
//! - Checking → Offline (threshold reached)
//! - Online → Offline (threshold reached)
//! - Offline → Online (any success)
//!
//! A single failure below the threshold never changes the state, and any
//! success resets the failure counter.
//!
//! # Examples
//!
//! ```
//! use parkgate_control::{LinkHealth, LinkState};
//! use parkgate_network::LinkErrorKind;
//!
//! let mut health = LinkHealth::new(3);
//! assert_eq!(health.state(), LinkState::Checking);
//!
//! health.record_success();
//! assert_eq!(health.state(), LinkState::Online);
//!
//! health.record_failure(LinkErrorKind::Timeout);
//! health.record_failure(LinkErrorKind::Timeout);
//! assert_eq!(health.state(), LinkState::Online);
//!
//! let transition = health.record_failure(LinkErrorKind::Transport).unwrap();
//! assert_eq!(transition.to, LinkState::Offline);
//! ```

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::time::{Duration, Instant};

use parkgate_core::constants::DEFAULT_OFFLINE_THRESHOLD;
use parkgate_network::{LinkError, LinkErrorKind};

/// Maximum number of state transitions kept per gate.
const MAX_HISTORY_SIZE: usize = 32;

/// Reachability of a relay controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkState {
    /// No conclusive result yet.
    Checking,

    /// Last exchange succeeded.
    Online,

    /// Too many consecutive exchanges failed.
    Offline,
}

impl fmt::Display for LinkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state_str = match self {
            LinkState::Checking => "checking",
            LinkState::Online => "online",
            LinkState::Offline => "offline",
        };
        f.write_str(state_str)
    }
}

impl LinkState {
    /// Check if transition to target state is valid from this state.
    ///
    /// ```
    /// use parkgate_control::LinkState;
    ///
    /// assert!(LinkState::Checking.can_transition_to(&LinkState::Online));
    /// assert!(!LinkState::Online.can_transition_to(&LinkState::Checking));
    /// ```
    pub fn can_transition_to(&self, target: &LinkState) -> bool {
        matches!(
            (self, target),
            (LinkState::Checking, LinkState::Online | LinkState::Offline)
                | (LinkState::Online, LinkState::Offline)
                | (LinkState::Offline, LinkState::Online)
        )
    }
}

/// A recorded change of link state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkTransition {
    pub from: LinkState,
    pub to: LinkState,
    pub at: DateTime<Local>,
}

/// Consecutive-failure tracker for one relay controller.
///
/// Not thread-safe; each gate owns its own tracker.
#[derive(Debug, Clone)]
pub struct LinkHealth {
    state: LinkState,
    state_entered_at: Instant,
    consecutive_failures: u32,
    threshold: u32,
    last_error: Option<LinkErrorKind>,
    last_success: Option<DateTime<Local>>,
    history: VecDeque<LinkTransition>,
}

impl Default for LinkHealth {
    fn default() -> Self {
        Self::new(DEFAULT_OFFLINE_THRESHOLD)
    }
}

impl LinkHealth {
    /// Create a tracker in the `Checking` state. A threshold of 0 is treated as 1.
    pub fn new(threshold: u32) -> Self {
        Self {
            state: LinkState::Checking,
            state_entered_at: Instant::now(),
            consecutive_failures: 0,
            threshold: threshold.max(1),
            last_error: None,
            last_success: None,
            history: VecDeque::with_capacity(MAX_HISTORY_SIZE),
        }
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// Kind of the most recent failure, cleared by a success.
    pub fn last_error(&self) -> Option<LinkErrorKind> {
        self.last_error
    }

    pub fn last_success(&self) -> Option<DateTime<Local>> {
        self.last_success
    }

    pub fn time_in_current_state(&self) -> Duration {
        self.state_entered_at.elapsed()
    }

    /// Recent transitions, oldest first.
    pub fn history(&self) -> &VecDeque<LinkTransition> {
        &self.history
    }

    /// Record a successful exchange. Returns the transition if the state changed.
    pub fn record_success(&mut self) -> Option<LinkTransition> {
        self.consecutive_failures = 0;
        self.last_error = None;
        self.last_success = Some(Local::now());
        self.change_state(LinkState::Online)
    }

    /// Record a failed exchange. Returns the transition if the state changed.
    ///
    /// Validation failures describe caller input, not the relay, and are ignored.
    pub fn record_failure(&mut self, kind: LinkErrorKind) -> Option<LinkTransition> {
        if kind == LinkErrorKind::Validation {
            return None;
        }

        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        self.last_error = Some(kind);

        if self.consecutive_failures >= self.threshold {
            self.change_state(LinkState::Offline)
        } else {
            None
        }
    }

    /// Record the outcome of any link call.
    pub fn record<T>(&mut self, outcome: &Result<T, LinkError>) -> Option<LinkTransition> {
        match outcome {
            Ok(_) => self.record_success(),
            Err(e) => self.record_failure(e.kind()),
        }
    }

    /// Forget everything and return to `Checking`.
    pub fn reset(&mut self) {
        *self = Self::new(self.threshold);
    }

    fn change_state(&mut self, new_state: LinkState) -> Option<LinkTransition> {
        if !self.state.can_transition_to(&new_state) {
            return None;
        }

        let transition = LinkTransition {
            from: self.state,
            to: new_state,
            at: Local::now(),
        };

        self.state = new_state;
        self.state_entered_at = Instant::now();

        if self.history.len() >= MAX_HISTORY_SIZE {
            self.history.pop_front();
        }
        self.history.push_back(transition.clone());

        Some(transition)
    }
}
