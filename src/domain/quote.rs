use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::service_entry::ServiceItem;
use crate::errors::{AutoServeError, Result};
use crate::pricing::{self, CostBreakdown};

const DEFAULT_VALIDITY_DAYS: u64 = 14;

/// A mechanic's priced offer for a booking.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Quote {
    pub id: Uuid,
    pub mechanic_id: Uuid,
    pub vehicle_id: Uuid,
    pub items: Vec<ServiceItem>,
    pub gst_rate: f64,
    pub issued_on: NaiveDate,
    pub valid_until: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Quote {
    pub fn new(
        mechanic_id: Uuid,
        vehicle_id: Uuid,
        items: Vec<ServiceItem>,
        issued_on: NaiveDate,
    ) -> Self {
        let valid_until = issued_on
            .checked_add_days(Days::new(DEFAULT_VALIDITY_DAYS))
            .unwrap_or(issued_on);
        Self {
            id: Uuid::new_v4(),
            mechanic_id,
            vehicle_id,
            items,
            gst_rate: pricing::DEFAULT_GST_RATE,
            issued_on,
            valid_until,
            notes: None,
        }
    }

    pub fn with_gst_rate(mut self, gst_rate: f64) -> Self {
        self.gst_rate = gst_rate;
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Rejects empty quotes, negative or non-finite prices, and nonsensical GST rates.
    pub fn validate(&self) -> Result<()> {
        if self.items.is_empty() {
            return Err(AutoServeError::InvalidInput(
                "quote must contain at least one item".into(),
            ));
        }
        if let Some(item) = self
            .items
            .iter()
            .find(|item| !item.price.is_finite() || item.price < 0.0)
        {
            return Err(AutoServeError::InvalidInput(format!(
                "item `{}` has invalid price {}",
                item.name, item.price
            )));
        }
        if !self.gst_rate.is_finite() || !(0.0..1.0).contains(&self.gst_rate) {
            return Err(AutoServeError::InvalidInput(format!(
                "GST rate {} out of range",
                self.gst_rate
            )));
        }
        if self.valid_until < self.issued_on {
            return Err(AutoServeError::InvalidInput(
                "quote expires before it was issued".into(),
            ));
        }
        Ok(())
    }

    pub fn breakdown(&self) -> CostBreakdown {
        CostBreakdown::from_items(&self.items, self.gst_rate)
    }

    pub fn total(&self) -> f64 {
        self.breakdown().total
    }

    pub fn deposit(&self, deposit_rate: f64) -> f64 {
        pricing::deposit_amount(self.total(), deposit_rate)
    }

    pub fn is_expired(&self, today: NaiveDate) -> bool {
        today > self.valid_until
    }
}
