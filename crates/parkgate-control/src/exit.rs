//! Exit processing: price the stay, check payment, open the barrier.

use chrono::{DateTime, Local};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use parkgate_billing::{FeeBreakdown, FeeInput, TariffTable, breakdown};
use parkgate_core::{Amount, GateAction};
use parkgate_network::{Connector, LinkError, RelayClient, TcpConnector};

use crate::config::{GateConfig, GateRole};

/// Why an exit was not authorized.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExitError {
    #[error("Insufficient payment: due {due}, tendered {tendered}")]
    InsufficientPayment { due: Amount, tendered: Amount },

    #[error("Gate '{0}' is not an exit gate")]
    NotAnExitGate(String),

    #[error("Invalid gate configuration: {0}")]
    Config(#[from] parkgate_core::Error),

    /// The barrier could not be commanded; payment was accepted.
    #[error("Gate link failure: {0}")]
    Link(#[from] LinkError),
}

/// Record of an authorized exit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExitReceipt {
    pub gate: String,
    pub fee: Amount,
    pub tendered: Amount,
    pub change: Amount,
    pub breakdown: FeeBreakdown,
    /// Relay command that opened the barrier.
    pub command: String,
    pub processed_at: DateTime<Local>,
}

/// Prices exits and opens exit barriers.
#[derive(Debug, Clone)]
pub struct ExitProcessor<C = TcpConnector> {
    client: RelayClient<C>,
    tariff: TariffTable,
}

impl<C: Connector> ExitProcessor<C> {
    pub fn new(client: RelayClient<C>, tariff: TariffTable) -> Self {
        Self { client, tariff }
    }

    pub fn tariff(&self) -> &TariffTable {
        &self.tariff
    }

    /// Fee due for `input`, with the hours charged per tier.
    pub fn quote(&self, input: &FeeInput) -> FeeBreakdown {
        breakdown(&self.tariff, input)
    }

    /// Charge the stay and open `gate` when `tendered` covers the fee.
    ///
    /// The gate is only contacted once payment is sufficient.
    ///
    /// # Errors
    ///
    /// - [`ExitError::NotAnExitGate`] for an entry gate
    /// - [`ExitError::InsufficientPayment`] when `tendered` is below the fee
    /// - [`ExitError::Config`] when the gate address is malformed
    /// - [`ExitError::Link`] when the open command could not be delivered
    pub async fn authorize_exit(
        &self,
        gate: &GateConfig,
        input: &FeeInput,
        tendered: Amount,
    ) -> Result<ExitReceipt, ExitError> {
        if gate.role != GateRole::Exit {
            return Err(ExitError::NotAnExitGate(gate.name.clone()));
        }

        let breakdown = self.quote(input);
        let fee = breakdown.total;

        let Some(change) = tendered.checked_sub(fee) else {
            warn!(gate = %gate.name, %fee, %tendered, "Exit refused: insufficient payment");
            return Err(ExitError::InsufficientPayment { due: fee, tendered });
        };

        let endpoint = gate.endpoint()?;
        let ack = self
            .client
            .control_gate(&endpoint, gate.channel, GateAction::Open)
            .await
            .inspect_err(|e| warn!(gate = %gate.name, %fee, "Exit paid but gate not opened: {}", e))?;

        info!(gate = %gate.name, %fee, %change, basis = ?breakdown.basis, "Exit authorized");

        Ok(ExitReceipt {
            gate: gate.name.clone(),
            fee,
            tendered,
            change,
            breakdown,
            command: ack.command,
            processed_at: Local::now(),
        })
    }
}
