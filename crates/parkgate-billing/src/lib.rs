//! Exit fee calculation for Parkgate.
//!
//! [`calculate_fee`] maps a parking duration and parker category to the amount
//! due under a [`TariffTable`]. It is a pure, total function: no I/O, no
//! failure modes, identical output for identical input.
//!
//! ```
//! use parkgate_billing::{FeeInput, TariffTable, calculate_fee};
//!
//! let tariff = TariffTable::default();
//! let due = calculate_fee(&tariff, &FeeInput::new(150));
//! assert_eq!(due, tariff.rate_tier1 + tariff.rate_tier2 * 2);
//! ```

pub mod fee;
pub mod tariff;

pub use fee::{FeeBasis, FeeBreakdown, FeeInput, billable_hours, breakdown, calculate_fee};
pub use tariff::TariffTable;
