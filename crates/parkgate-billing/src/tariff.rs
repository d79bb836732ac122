//! Tariff table used by the fee calculator.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use parkgate_core::Amount;

/// Last hour billed at the first-tier rate.
pub const TIER1_LAST_HOUR: u64 = 1;

/// Last hour billed at the second-tier rate (hours 2-4).
pub const TIER2_LAST_HOUR: u64 = 4;

/// Last hour billed at the third-tier rate (hours 5-8). Later hours use tier 4.
pub const TIER3_LAST_HOUR: u64 = 8;

/// Hourly rates, flat lost-ticket fee and exempt parker categories.
///
/// Read-only to the calculator; owned by the facility configuration.
///
/// # Example
///
/// ```
/// use parkgate_billing::TariffTable;
///
/// let tariff: TariffTable = serde_json::from_str(r#"{
///     "rate_tier1": 400,
///     "rate_tier2": 250,
///     "rate_tier3": 150,
///     "rate_tier4": 100,
///     "lost_ticket_fee": 4000,
///     "exempt_categories": ["staff"]
/// }"#).unwrap();
///
/// assert!(tariff.is_exempt("Staff"));
/// assert!(!tariff.is_exempt("visitor"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TariffTable {
    /// Charge for the first hour.
    pub rate_tier1: Amount,

    /// Per-hour charge for hours 2-4.
    pub rate_tier2: Amount,

    /// Per-hour charge for hours 5-8.
    pub rate_tier3: Amount,

    /// Per-hour charge for every hour after the eighth.
    pub rate_tier4: Amount,

    /// Flat charge when the ticket is lost, whatever the duration.
    pub lost_ticket_fee: Amount,

    /// Parker categories that are never charged.
    #[serde(default)]
    pub exempt_categories: BTreeSet<String>,
}

impl Default for TariffTable {
    fn default() -> Self {
        Self {
            rate_tier1: Amount::from_major(5),
            rate_tier2: Amount::from_major(3),
            rate_tier3: Amount::from_major(2),
            rate_tier4: Amount::from_major(1),
            lost_ticket_fee: Amount::from_major(50),
            exempt_categories: ["staff", "vip"].into_iter().map(String::from).collect(),
        }
    }
}

impl TariffTable {
    /// Returns `true` if `category` is exempt. Comparison ignores case and
    /// surrounding whitespace.
    #[must_use]
    pub fn is_exempt(&self, category: &str) -> bool {
        let category = category.trim();
        !category.is_empty()
            && self
                .exempt_categories
                .iter()
                .any(|exempt| exempt.trim().eq_ignore_ascii_case(category))
    }

    /// Per-hour rate applying to the given 1-based hour of a stay.
    #[must_use]
    pub fn rate_for_hour(&self, hour: u64) -> Amount {
        match hour {
            0..=TIER1_LAST_HOUR => self.rate_tier1,
            h if h <= TIER2_LAST_HOUR => self.rate_tier2,
            h if h <= TIER3_LAST_HOUR => self.rate_tier3,
            _ => self.rate_tier4,
        }
    }
}
