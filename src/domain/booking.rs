use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::common::Identifiable;
use crate::domain::quote::Quote;
use crate::pricing::round_cents;

/// A customer's request for work on one vehicle by one mechanic.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Booking {
    pub id: Uuid,
    pub vehicle_id: Uuid,
    pub mechanic_id: Uuid,
    pub service_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub requested_date: NaiveDate,
    pub status: BookingStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quote: Option<Quote>,
    #[serde(default)]
    pub escrow: Escrow,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    pub fn new(
        vehicle_id: Uuid,
        mechanic_id: Uuid,
        service_type: impl Into<String>,
        requested_date: NaiveDate,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            vehicle_id,
            mechanic_id,
            service_type: service_type.into(),
            description: None,
            requested_date,
            status: BookingStatus::QuoteRequested,
            quote: None,
            escrow: Escrow::default(),
            review_id: None,
            created_at,
            updated_at: created_at,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn quoted_total(&self) -> Option<f64> {
        self.quote.as_ref().map(Quote::total)
    }

    /// Amount still owed against the accepted quote.
    pub fn balance_due(&self) -> f64 {
        match self.quoted_total() {
            Some(total) => round_cents((total - self.escrow.paid()).max(0.0)),
            None => 0.0,
        }
    }

    pub fn is_open(&self) -> bool {
        !matches!(
            self.status,
            BookingStatus::Completed | BookingStatus::Cancelled
        )
    }
}

impl Identifiable for Booking {
    fn id(&self) -> Uuid {
        self.id
    }
}

/// Booking lifecycle: `QuoteRequested → Quoted → Confirmed → InProgress → Completed`,
/// with `Cancelled` reachable from any open state.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    QuoteRequested,
    Quoted,
    Confirmed,
    InProgress,
    Completed,
    Cancelled,
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            BookingStatus::QuoteRequested => "quote requested",
            BookingStatus::Quoted => "quoted",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::InProgress => "in progress",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentKind {
    Deposit,
    Full,
    Balance,
}

/// A payment captured into escrow.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaymentRecord {
    pub reference: String,
    pub kind: PaymentKind,
    pub amount: f64,
    pub paid_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EscrowStatus {
    #[default]
    Empty,
    Holding,
    Released,
    Refunded,
}

/// Funds held on the customer's behalf until the job is completed or cancelled.
///
/// This is bookkeeping only; no money moves anywhere.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Escrow {
    #[serde(default)]
    pub status: EscrowStatus,
    #[serde(default)]
    pub held: f64,
    #[serde(default)]
    pub released: f64,
    #[serde(default)]
    pub refunded: f64,
    #[serde(default)]
    pub payments: Vec<PaymentRecord>,
}

impl Escrow {
    /// Total captured across all payments.
    pub fn paid(&self) -> f64 {
        round_cents(self.payments.iter().map(|p| p.amount).sum())
    }

    pub fn has_payment(&self, kind: PaymentKind) -> bool {
        self.payments.iter().any(|p| p.kind == kind)
    }

    pub fn hold(&mut self, record: PaymentRecord) {
        self.held = round_cents(self.held + record.amount);
        self.payments.push(record);
        self.status = EscrowStatus::Holding;
    }

    /// Moves everything held to the mechanic. Returns the released amount.
    pub fn release(&mut self) -> f64 {
        let amount = self.held;
        self.released = round_cents(self.released + amount);
        self.held = 0.0;
        self.status = EscrowStatus::Released;
        amount
    }

    /// Returns everything held to the customer. Returns the refunded amount.
    pub fn refund(&mut self) -> f64 {
        let amount = self.held;
        self.refunded = round_cents(self.refunded + amount);
        self.held = 0.0;
        if amount > 0.0 {
            self.status = EscrowStatus::Refunded;
        }
        amount
    }
}
