//! Simulated payment processing.
//!
//! There is no real processor behind the app: a payment is a deferred computation
//! that settles after a fixed latency. Unlike a bare timer it can fail, so callers
//! are written against a gateway that may decline. Dropping the future before it
//! resolves cancels the payment; nothing is retried.

use std::{collections::HashSet, sync::Arc, time::Duration};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::booking::{PaymentKind, PaymentRecord};
use crate::time::{Clock, SystemClock};

pub const DEFAULT_LATENCY_MS: u64 = 2_000;
/// Card token the simulated processor always declines.
pub const DECLINE_TOKEN: &str = "tok_declined";

#[derive(Debug, Error, Clone, PartialEq)]
pub enum PaymentError {
    #[error("payment declined: {0}")]
    Declined(String),
    #[error("invalid payment amount: {0}")]
    InvalidAmount(f64),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaymentRequest {
    pub booking_id: Uuid,
    pub kind: PaymentKind,
    pub amount: f64,
    pub card_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaymentReceipt {
    pub reference: String,
    pub booking_id: Uuid,
    pub kind: PaymentKind,
    pub amount: f64,
    pub paid_at: DateTime<Utc>,
}

impl From<&PaymentReceipt> for PaymentRecord {
    fn from(receipt: &PaymentReceipt) -> Self {
        PaymentRecord {
            reference: receipt.reference.clone(),
            kind: receipt.kind,
            amount: receipt.amount,
            paid_at: receipt.paid_at,
        }
    }
}

/// Anything that can take a payment for a booking.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn process(&self, request: PaymentRequest) -> Result<PaymentReceipt, PaymentError>;
}

/// Processor that settles every request after a fixed latency.
#[derive(Clone)]
pub struct SimulatedPaymentProcessor {
    latency: Duration,
    decline_tokens: HashSet<String>,
    clock: Arc<dyn Clock>,
}

impl SimulatedPaymentProcessor {
    pub fn new(latency: Duration) -> Self {
        Self {
            latency,
            decline_tokens: HashSet::from([DECLINE_TOKEN.to_string()]),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn declining(mut self, card_token: impl Into<String>) -> Self {
        self.decline_tokens.insert(card_token.into());
        self
    }

    pub fn latency(&self) -> Duration {
        self.latency
    }
}

impl Default for SimulatedPaymentProcessor {
    fn default() -> Self {
        Self::new(Duration::from_millis(DEFAULT_LATENCY_MS))
    }
}

#[async_trait]
impl PaymentGateway for SimulatedPaymentProcessor {
    async fn process(&self, request: PaymentRequest) -> Result<PaymentReceipt, PaymentError> {
        info!(
            booking = %request.booking_id,
            kind = ?request.kind,
            amount = request.amount,
            "processing payment"
        );
        tokio::time::sleep(self.latency).await;

        if !request.amount.is_finite() || request.amount <= 0.0 {
            warn!(booking = %request.booking_id, amount = request.amount, "rejected payment amount");
            return Err(PaymentError::InvalidAmount(request.amount));
        }
        if self.decline_tokens.contains(&request.card_token) {
            warn!(booking = %request.booking_id, "card declined");
            return Err(PaymentError::Declined("card was declined by the issuer".into()));
        }

        let receipt = PaymentReceipt {
            reference: format!("sim_{}", Uuid::new_v4().simple()),
            booking_id: request.booking_id,
            kind: request.kind,
            amount: request.amount,
            paid_at: self.clock.now(),
        };
        info!(reference = %receipt.reference, "payment captured");
        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::FixedClock;
    use chrono::NaiveDate;

    fn request(amount: f64, token: &str) -> PaymentRequest {
        PaymentRequest {
            booking_id: Uuid::new_v4(),
            kind: PaymentKind::Deposit,
            amount,
            card_token: token.into(),
        }
    }

    fn processor() -> SimulatedPaymentProcessor {
        let clock = FixedClock::on(NaiveDate::from_ymd_opt(2024, 7, 1).unwrap());
        SimulatedPaymentProcessor::default().with_clock(Arc::new(clock))
    }

    #[tokio::test(start_paused = true)]
    async fn settles_after_fixed_latency() {
        let processor = processor();
        let started = tokio::time::Instant::now();
        let receipt = processor
            .process(request(57.2, "tok_visa"))
            .await
            .expect("payment succeeds");
        assert!(started.elapsed() >= processor.latency());
        assert_eq!(receipt.amount, 57.2);
        assert!(receipt.reference.starts_with("sim_"));
        assert_eq!(receipt.paid_at.date_naive(), NaiveDate::from_ymd_opt(2024, 7, 1).unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_future_cancels_before_settlement() {
        let processor = processor();
        let deadline = processor.latency() - Duration::from_millis(1);
        let outcome = tokio::time::timeout(deadline, processor.process(request(10.0, "tok_visa"))).await;
        assert!(outcome.is_err(), "payment must still be pending");
    }

    #[tokio::test(start_paused = true)]
    async fn declined_token_fails() {
        let err = processor()
            .process(request(10.0, DECLINE_TOKEN))
            .await
            .expect_err("declined");
        assert!(matches!(err, PaymentError::Declined(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn custom_decline_tokens_are_honoured() {
        let err = processor()
            .declining("tok_expired")
            .process(request(10.0, "tok_expired"))
            .await
            .expect_err("declined");
        assert!(matches!(err, PaymentError::Declined(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn non_positive_amounts_are_rejected() {
        let err = processor()
            .process(request(0.0, "tok_visa"))
            .await
            .expect_err("zero amount");
        assert_eq!(err, PaymentError::InvalidAmount(0.0));
    }
}
