//! Quote and invoice arithmetic: category subtotals, GST, totals and deposits.

use serde::{Deserialize, Serialize};

use crate::domain::service_entry::{ItemCategory, ServiceItem};

/// Australian GST.
pub const DEFAULT_GST_RATE: f64 = 0.10;
/// Share of the quoted total captured up front to confirm a booking.
pub const DEFAULT_DEPOSIT_RATE: f64 = 0.20;

/// Totals recomputed from line items. Every field is rounded to cents.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct CostBreakdown {
    pub parts: f64,
    pub labor: f64,
    pub fees: f64,
    pub subtotal: f64,
    pub gst: f64,
    pub total: f64,
}

impl CostBreakdown {
    pub fn from_items(items: &[ServiceItem], gst_rate: f64) -> Self {
        let sum_of = |category: ItemCategory| -> f64 {
            items
                .iter()
                .filter(|item| item.category == category)
                .map(|item| item.price)
                .sum()
        };
        Self::from_amounts(
            sum_of(ItemCategory::Parts),
            sum_of(ItemCategory::Labor),
            sum_of(ItemCategory::Fees),
            gst_rate,
        )
    }

    pub fn from_amounts(parts: f64, labor: f64, fees: f64, gst_rate: f64) -> Self {
        let parts = round_cents(parts);
        let labor = round_cents(labor);
        let fees = round_cents(fees);
        let subtotal = round_cents(parts + labor + fees);
        let gst = round_cents(subtotal * gst_rate);
        Self {
            parts,
            labor,
            fees,
            subtotal,
            gst,
            total: round_cents(subtotal + gst),
        }
    }
}

/// Deposit owed for a total at the given rate (clamped to `0..=1`).
pub fn deposit_amount(total: f64, deposit_rate: f64) -> f64 {
    round_cents(total * deposit_rate.clamp(0.0, 1.0))
}

/// Labor cost for `hours` at an hourly rate.
pub fn labor_cost(hours: f64, hourly_rate: f64) -> f64 {
    round_cents(hours * hourly_rate)
}

pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
