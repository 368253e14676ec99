//! # Pricing Engine
//!
//! The single entry point that writes a scheduling's derived totals.
//!
//! ## Calculation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Attached services           Bath R$ 40.00   Nails R$ 25.00             │
//! │       │                                                                 │
//! │       ▼  Σ price (empty set = R$ 0.00)                                  │
//! │  gross_total_value           R$ 65.00                                   │
//! │       │                                                                 │
//! │       ▼  × (1 − percentage_discount / 100), rounded to the cent         │
//! │  total_value                 R$ 52.00     (20% off)                     │
//! │                                                                         │
//! │  discount_amount = gross − total = R$ 13.00  (derived on read only)    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `recompute` has no error path. Discounts outside `0..=100%` are rejected
//! by [`validate_discount`](crate::validation::validate_discount) before a
//! scheduling ever reaches this module, and nothing here persists.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::types::{DiscountRate, Scheduling};

/// The two derived values of a scheduling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Totals {
    pub gross_total_value: Money,
    pub total_value: Money,
}

impl Totals {
    /// Computes totals from service prices and a discount.
    pub fn compute<I>(prices: I, discount: DiscountRate) -> Self
    where
        I: IntoIterator<Item = Money>,
    {
        let gross_total_value: Money = prices.into_iter().sum();
        Totals {
            gross_total_value,
            total_value: gross_total_value.apply_discount(discount),
        }
    }

    /// `gross_total_value - total_value`
    pub fn discount_amount(&self) -> Money {
        self.gross_total_value - self.total_value
    }
}

/// Recomputes the derived totals of `scheduling` in place from the prices of
/// the services currently attached to it.
///
/// `prices` must be the prices of exactly the attached services, one per
/// service. Calling this twice with the same inputs gives the same totals.
pub fn recompute<I>(scheduling: &mut Scheduling, prices: I) -> Totals
where
    I: IntoIterator<Item = Money>,
{
    let totals = Totals::compute(prices, scheduling.percentage_discount);
    scheduling.gross_total_value = totals.gross_total_value;
    scheduling.total_value = totals.total_value;
    totals
}

/// Discount shown on notes and summaries. Never stored.
pub fn discount_amount(scheduling: &Scheduling) -> Money {
    scheduling.gross_total_value - scheduling.total_value
}

// =============================================================================
// Unit Tests
// =============================================================================
