//! Fee calculation.
//!
//! # Precedence
//!
//! Rules are evaluated in order; the first that applies decides the fee:
//!
//! 1. Lost ticket: flat `lost_ticket_fee`
//! 2. Exempt category: zero
//! 3. Zero duration: zero
//! 4. Up to 60 minutes: exactly `rate_tier1`
//! 5. Otherwise: hours rounded up, each hour billed at its tier rate
//!
//! | Hours | Rate |
//! |-------|------|
//! | 1 | `rate_tier1` |
//! | 2-4 | `rate_tier2` per hour |
//! | 5-8 | `rate_tier3` per hour |
//! | 9+ | `rate_tier4` per hour |

use chrono::{DateTime, TimeZone};
use serde::{Deserialize, Serialize};

use parkgate_core::Amount;

use crate::tariff::{TIER1_LAST_HOUR, TIER2_LAST_HOUR, TIER3_LAST_HOUR, TariffTable};

const MINUTES_PER_HOUR: u64 = 60;

/// Input of one exit fee computation.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FeeInput {
    pub duration_minutes: u64,
    #[serde(default)]
    pub parker_category: Option<String>,
    #[serde(default)]
    pub is_lost_ticket: bool,
}

impl FeeInput {
    /// Regular ticket, no category.
    #[must_use]
    pub fn new(duration_minutes: u64) -> Self {
        Self {
            duration_minutes,
            ..Self::default()
        }
    }

    /// Elapsed whole minutes between entry and exit. An exit before the entry
    /// counts as zero minutes.
    ///
    /// ```
    /// use chrono::{Duration, Utc};
    /// use parkgate_billing::FeeInput;
    ///
    /// let entry = Utc::now();
    /// let exit = entry + Duration::seconds(150 * 60 + 59);
    /// assert_eq!(FeeInput::from_times(entry, exit).duration_minutes, 150);
    /// ```
    #[must_use]
    pub fn from_times<Tz: TimeZone>(entry: DateTime<Tz>, exit: DateTime<Tz>) -> Self {
        let minutes = exit.signed_duration_since(entry).num_minutes().max(0);
        Self::new(minutes.unsigned_abs())
    }

    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.parker_category = Some(category.into());
        self
    }

    #[must_use]
    pub fn lost_ticket(mut self) -> Self {
        self.is_lost_ticket = true;
        self
    }
}

/// Which rule decided a fee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeeBasis {
    LostTicket,
    Exempt,
    NoCharge,
    FirstHour,
    Tiered,
}

/// Fee with the hours charged in each tier, for receipts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeBreakdown {
    pub basis: FeeBasis,
    /// Billable hours after rounding up.
    pub hours: u64,
    /// Hours charged at tier 1..=4.
    pub tier_hours: [u64; 4],
    pub total: Amount,
}

impl FeeBreakdown {
    fn flat(basis: FeeBasis, total: Amount) -> Self {
        Self {
            basis,
            hours: 0,
            tier_hours: [0; 4],
            total,
        }
    }
}

/// Whole hours billed for a stay, rounding any started hour up.
#[must_use]
pub fn billable_hours(duration_minutes: u64) -> u64 {
    duration_minutes.div_ceil(MINUTES_PER_HOUR)
}

/// Compute the fee for `input` with the rule that decided it.
#[must_use]
pub fn breakdown(tariff: &TariffTable, input: &FeeInput) -> FeeBreakdown {
    if input.is_lost_ticket {
        return FeeBreakdown::flat(FeeBasis::LostTicket, tariff.lost_ticket_fee);
    }

    if input
        .parker_category
        .as_deref()
        .is_some_and(|category| tariff.is_exempt(category))
    {
        return FeeBreakdown::flat(FeeBasis::Exempt, Amount::ZERO);
    }

    if input.duration_minutes == 0 {
        return FeeBreakdown::flat(FeeBasis::NoCharge, Amount::ZERO);
    }

    // Any stay up to and including 60 minutes is one first-tier hour.
    if input.duration_minutes <= MINUTES_PER_HOUR {
        return FeeBreakdown {
            basis: FeeBasis::FirstHour,
            hours: 1,
            tier_hours: [1, 0, 0, 0],
            total: tariff.rate_tier1,
        };
    }

    let hours = billable_hours(input.duration_minutes);
    let tier_hours = [
        hours.min(TIER1_LAST_HOUR),
        hours.clamp(TIER1_LAST_HOUR, TIER2_LAST_HOUR) - TIER1_LAST_HOUR,
        hours.clamp(TIER2_LAST_HOUR, TIER3_LAST_HOUR) - TIER2_LAST_HOUR,
        hours.saturating_sub(TIER3_LAST_HOUR),
    ];
    let rates = [
        tariff.rate_tier1,
        tariff.rate_tier2,
        tariff.rate_tier3,
        tariff.rate_tier4,
    ];
    let total = rates
        .iter()
        .zip(tier_hours)
        .map(|(rate, hours)| *rate * hours)
        .sum();

    FeeBreakdown {
        basis: FeeBasis::Tiered,
        hours,
        tier_hours,
        total,
    }
}

/// Amount owed for `input` under `tariff`.
///
/// Total and pure: every input yields an amount, and identical inputs yield
/// identical amounts.
#[must_use]
pub fn calculate_fee(tariff: &TariffTable, input: &FeeInput) -> Amount {
    breakdown(tariff, input).total
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Local};
    use rstest::rstest;

    fn tariff() -> TariffTable {
        TariffTable::default()
    }

    #[test]
    fn test_first_hour_rate() {
        let t = tariff();
        assert_eq!(calculate_fee(&t, &FeeInput::new(45)), t.rate_tier1);
    }

    #[test]
    fn test_150_minutes_is_three_hours() {
        let t = tariff();
        assert_eq!(
            calculate_fee(&t, &FeeInput::new(150)),
            t.rate_tier1 + t.rate_tier2 * 2
        );
    }

    #[rstest]
    #[case(1)]
    #[case(59)]
    #[case(60)]
    fn test_up_to_sixty_minutes_is_first_tier(#[case] minutes: u64) {
        let t = tariff();
        let result = breakdown(&t, &FeeInput::new(minutes));
        assert_eq!(result.total, t.rate_tier1);
        assert_eq!(result.basis, FeeBasis::FirstHour);
    }

    #[test]
    fn test_sixty_one_minutes_is_two_hours() {
        let t = tariff();
        assert_eq!(
            calculate_fee(&t, &FeeInput::new(61)),
            t.rate_tier1 + t.rate_tier2
        );
    }

    #[test]
    fn test_boundary_sixty_matches_tiered_formula() {
        // The first-hour rule and the ceiling rule agree at exactly 60 minutes.
        let t = tariff();
        assert_eq!(billable_hours(60), 1);
        assert_eq!(calculate_fee(&t, &FeeInput::new(60)), t.rate_for_hour(1));
    }

    #[rstest]
    // hours -> tier1 + tier2 * n2 + tier3 * n3 + tier4 * n4 in minor units (500/300/200/100)
    #[case(4 * 60, 500 + 300 * 3)]
    #[case(4 * 60 + 1, 500 + 300 * 3 + 200)]
    #[case(8 * 60, 500 + 300 * 3 + 200 * 4)]
    #[case(8 * 60 + 1, 500 + 300 * 3 + 200 * 4 + 100)]
    #[case(24 * 60, 500 + 300 * 3 + 200 * 4 + 100 * 16)]
    fn test_tier_boundaries(#[case] minutes: u64, #[case] expected_minor: u64) {
        assert_eq!(
            calculate_fee(&tariff(), &FeeInput::new(minutes)).minor(),
            expected_minor
        );
    }

    #[test]
    fn test_zero_duration_is_free() {
        let result = breakdown(&tariff(), &FeeInput::new(0));
        assert_eq!(result.total, Amount::ZERO);
        assert_eq!(result.basis, FeeBasis::NoCharge);
    }

    #[test]
    fn test_exempt_category_is_free() {
        let t = tariff();
        for minutes in [0, 45, 600, 10_000] {
            let input = FeeInput::new(minutes).with_category("vip");
            assert_eq!(calculate_fee(&t, &input), Amount::ZERO);
        }
    }

    #[test]
    fn test_unknown_category_pays() {
        let t = tariff();
        let input = FeeInput::new(45).with_category("visitor");
        assert_eq!(calculate_fee(&t, &input), t.rate_tier1);
    }

    #[test]
    fn test_lost_ticket_overrides_everything() {
        let t = tariff();
        assert_eq!(
            calculate_fee(&t, &FeeInput::new(0).lost_ticket()),
            t.lost_ticket_fee
        );
        assert_eq!(
            calculate_fee(&t, &FeeInput::new(600).with_category("vip").lost_ticket()),
            t.lost_ticket_fee
        );
    }

    #[test]
    fn test_breakdown_tier_hours() {
        let result = breakdown(&tariff(), &FeeInput::new(10 * 60));
        assert_eq!(result.basis, FeeBasis::Tiered);
        assert_eq!(result.hours, 10);
        assert_eq!(result.tier_hours, [1, 3, 4, 2]);
    }

    #[test]
    fn test_from_times_clamps_negative() {
        let entry = Local::now();
        let exit = entry - Duration::minutes(5);
        assert_eq!(FeeInput::from_times(entry, exit).duration_minutes, 0);
    }

    #[test]
    fn test_huge_duration_saturates() {
        let fee = calculate_fee(&tariff(), &FeeInput::new(u64::MAX));
        assert_eq!(fee, Amount::from_minor(u64::MAX));
    }
}
