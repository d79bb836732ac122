//! Plain-text rendering of fees, receipts and gate snapshots for the terminal.

use parkgate_billing::{FeeBasis, FeeBreakdown};
use parkgate_control::{ExitReceipt, GateSnapshot, LinkState};
use parkgate_core::ChannelVector;

const TIER_LABELS: [&str; 4] = ["tier 1", "tier 2", "tier 3", "tier 4"];

pub fn basis_label(basis: FeeBasis) -> &'static str {
    match basis {
        FeeBasis::LostTicket => "lost ticket",
        FeeBasis::Exempt => "exempt",
        FeeBasis::NoCharge => "no charge",
        FeeBasis::FirstHour => "first hour",
        FeeBasis::Tiered => "tiered",
    }
}

/// One line: total, rule and the hours charged per tier.
pub fn format_breakdown(breakdown: &FeeBreakdown) -> String {
    let tiers: Vec<String> = breakdown
        .tier_hours
        .iter()
        .zip(TIER_LABELS)
        .filter(|(hours, _)| **hours > 0)
        .map(|(hours, label)| format!("{hours} h {label}"))
        .collect();

    if tiers.is_empty() {
        format!("fee {} ({})", breakdown.total, basis_label(breakdown.basis))
    } else {
        format!(
            "fee {} ({}, {} h: {})",
            breakdown.total,
            basis_label(breakdown.basis),
            breakdown.hours,
            tiers.join(", ")
        )
    }
}

pub fn format_receipt(receipt: &ExitReceipt) -> String {
    format!(
        "gate      {}\n{}\ntendered  {}\nchange    {}\ncommand   {}\nat        {}",
        receipt.gate,
        format_breakdown(&receipt.breakdown),
        receipt.tendered,
        receipt.change,
        receipt.command,
        receipt.processed_at.format("%Y-%m-%d %H:%M:%S"),
    )
}

/// Raw vector in wire order followed by the active input numbers.
pub fn format_sensors(sensors: &ChannelVector) -> String {
    let active: Vec<String> = sensors
        .active_inputs()
        .iter()
        .map(ToString::to_string)
        .collect();

    if active.is_empty() {
        format!("{sensors} (no inputs active)")
    } else {
        format!("{sensors} (active inputs: {})", active.join(", "))
    }
}

pub fn format_snapshot(snapshot: &GateSnapshot) -> String {
    let detail = match (snapshot.state, snapshot.sensors.as_ref(), snapshot.last_error) {
        (LinkState::Offline, _, Some(kind)) => format!(
            "{} consecutive failures, last {kind}",
            snapshot.consecutive_failures
        ),
        (_, Some(sensors), _) => format_sensors(sensors),
        (_, None, Some(kind)) => format!("no reading yet, last {kind}"),
        (_, None, None) => "no reading yet".to_string(),
    };

    format!(
        "{:<16} {:<22} {:<8} {}",
        snapshot.name, snapshot.endpoint.to_string(), snapshot.state.to_string(), detail
    )
}
