//! Booking lifecycle: quote request, quote, payment into escrow, work, completion.
//!
//! Every transition is checked against the booking's current status; anything
//! out of order is rejected with [`AutoServeError::InvalidState`] and leaves the
//! garage untouched.

use chrono::NaiveDate;
use tracing::{info, warn};
use uuid::Uuid;

use super::booking_mut;
use crate::domain::{
    Booking, BookingStatus, Garage, MechanicRef, Notification, NotificationKind, PaymentKind,
    PaymentRecord, Quote, ServiceEntry,
};
use crate::errors::{AutoServeError, Result};
use crate::payment::{PaymentGateway, PaymentReceipt, PaymentRequest};
use crate::time::Clock;

pub struct BookingService;

impl BookingService {
    /// Opens a booking in `QuoteRequested` for an existing vehicle and mechanic.
    pub fn request_quote(
        garage: &mut Garage,
        vehicle_id: Uuid,
        mechanic_id: Uuid,
        service_type: &str,
        requested_date: NaiveDate,
        description: Option<&str>,
        clock: &impl Clock,
    ) -> Result<Uuid> {
        if service_type.trim().is_empty() {
            return Err(AutoServeError::InvalidInput(
                "service type is required".into(),
            ));
        }
        let vehicle = garage
            .vehicle(vehicle_id)
            .ok_or_else(|| AutoServeError::NotFound(format!("vehicle {vehicle_id}")))?;
        let mechanic = garage
            .mechanic(mechanic_id)
            .ok_or_else(|| AutoServeError::NotFound(format!("mechanic {mechanic_id}")))?;
        if requested_date < clock.today() {
            return Err(AutoServeError::InvalidInput(format!(
                "requested date {requested_date} is in the past"
            )));
        }

        let message = format!(
            "Quote requested from {} for {} on your {} {}",
            mechanic.name, service_type, vehicle.make, vehicle.model
        );
        let now = clock.now();
        let mut booking = Booking::new(vehicle_id, mechanic_id, service_type.trim(), requested_date, now);
        if let Some(description) = description.filter(|d| !d.trim().is_empty()) {
            booking = booking.with_description(description.trim());
        }
        let booking_id = garage.add_booking(booking);
        garage.push_notification(
            Notification::new(NotificationKind::QuoteRequested, "Quote requested", message, now)
                .for_booking(booking_id)
                .for_vehicle(vehicle_id),
        );
        info!(booking = %booking_id, vehicle = %vehicle_id, mechanic = %mechanic_id, "quote requested");
        Ok(booking_id)
    }

    /// Attaches the mechanic's quote and moves the booking to `Quoted`.
    pub fn submit_quote(
        garage: &mut Garage,
        booking_id: Uuid,
        quote: Quote,
        clock: &impl Clock,
    ) -> Result<()> {
        quote.validate()?;
        let now = clock.now();
        let booking = booking_mut(garage, booking_id)?;
        expect_status(booking, &[BookingStatus::QuoteRequested], "submit a quote")?;
        if quote.mechanic_id != booking.mechanic_id || quote.vehicle_id != booking.vehicle_id {
            return Err(AutoServeError::InvalidInput(
                "quote does not match the booking's vehicle and mechanic".into(),
            ));
        }
        let total = quote.total();
        booking.quote = Some(quote);
        booking.status = BookingStatus::Quoted;
        booking.updated_at = now;
        garage.push_notification(
            Notification::new(
                NotificationKind::QuoteReceived,
                "Quote received",
                format!("Quote of {total:.2} ready for review"),
                now,
            )
            .for_booking(booking_id),
        );
        info!(booking = %booking_id, total, "quote submitted");
        Ok(())
    }

    /// Amount the gateway would be asked for, without charging anything.
    pub fn amount_due(booking: &Booking, kind: PaymentKind, deposit_rate: f64) -> Result<f64> {
        let quote = booking.quote.as_ref().ok_or_else(|| {
            AutoServeError::InvalidState(format!("booking {} has no quote", booking.id))
        })?;
        Ok(match kind {
            PaymentKind::Deposit => quote.deposit(deposit_rate),
            PaymentKind::Full => quote.total(),
            PaymentKind::Balance => booking.balance_due(),
        })
    }

    /// Charges the customer through `gateway` and holds the funds in escrow.
    ///
    /// `Deposit` and `Full` accept a quoted booking and confirm it; `Balance` settles
    /// what is still owed on a confirmed or in-progress booking. A declined payment
    /// leaves the booking as it was and adds a failure notification.
    pub async fn pay<G, C>(
        garage: &mut Garage,
        booking_id: Uuid,
        kind: PaymentKind,
        card_token: &str,
        gateway: &G,
        clock: &C,
        deposit_rate: f64,
    ) -> Result<PaymentReceipt>
    where
        G: PaymentGateway + ?Sized,
        C: Clock,
    {
        let booking = garage
            .booking(booking_id)
            .ok_or_else(|| AutoServeError::NotFound(format!("booking {booking_id}")))?;
        match kind {
            PaymentKind::Deposit | PaymentKind::Full => {
                expect_status(booking, &[BookingStatus::Quoted], "accept the quote")?;
                if booking.escrow.has_payment(PaymentKind::Deposit)
                    || booking.escrow.has_payment(PaymentKind::Full)
                {
                    return Err(AutoServeError::InvalidState(format!(
                        "booking {booking_id} already has a payment"
                    )));
                }
                if booking
                    .quote
                    .as_ref()
                    .is_some_and(|quote| quote.is_expired(clock.today()))
                {
                    return Err(AutoServeError::InvalidState(format!(
                        "quote for booking {booking_id} has expired"
                    )));
                }
            }
            PaymentKind::Balance => {
                expect_status(
                    booking,
                    &[BookingStatus::Confirmed, BookingStatus::InProgress],
                    "pay the balance",
                )?;
                if booking.balance_due() <= 0.0 {
                    return Err(AutoServeError::InvalidState(format!(
                        "booking {booking_id} has nothing left to pay"
                    )));
                }
            }
        }
        let request = PaymentRequest {
            booking_id,
            kind,
            amount: Self::amount_due(booking, kind, deposit_rate)?,
            card_token: card_token.to_string(),
        };

        let outcome = gateway.process(request).await;
        let now = clock.now();
        let receipt = match outcome {
            Ok(receipt) => receipt,
            Err(err) => {
                warn!(booking = %booking_id, error = %err, "payment failed");
                garage.push_notification(
                    Notification::new(
                        NotificationKind::PaymentFailed,
                        "Payment failed",
                        err.to_string(),
                        now,
                    )
                    .for_booking(booking_id),
                );
                return Err(err.into());
            }
        };

        let booking = booking_mut(garage, booking_id)?;
        booking.escrow.hold(PaymentRecord::from(&receipt));
        let confirmed = booking.status == BookingStatus::Quoted;
        if confirmed {
            booking.status = BookingStatus::Confirmed;
        }
        booking.updated_at = now;
        garage.push_notification(
            Notification::new(
                NotificationKind::PaymentReceived,
                "Payment received",
                format!("{:.2} held in escrow", receipt.amount),
                now,
            )
            .for_booking(booking_id),
        );
        if confirmed {
            garage.push_notification(
                Notification::new(
                    NotificationKind::BookingConfirmed,
                    "Booking confirmed",
                    "Your mechanic has been notified",
                    now,
                )
                .for_booking(booking_id),
            );
        }
        info!(booking = %booking_id, reference = %receipt.reference, "payment held");
        Ok(receipt)
    }

    pub fn start(garage: &mut Garage, booking_id: Uuid, clock: &impl Clock) -> Result<()> {
        let now = clock.now();
        let booking = booking_mut(garage, booking_id)?;
        expect_status(booking, &[BookingStatus::Confirmed], "start work")?;
        booking.status = BookingStatus::InProgress;
        booking.updated_at = now;
        garage.push_notification(
            Notification::new(
                NotificationKind::ServiceStarted,
                "Service started",
                "Work on your vehicle has begun",
                now,
            )
            .for_booking(booking_id),
        );
        info!(booking = %booking_id, "work started");
        Ok(())
    }

    /// Finishes the job: releases escrow, writes the logbook entry and advances the odometer.
    ///
    /// The balance must be settled first. Returns the new service entry's id.
    pub fn complete(
        garage: &mut Garage,
        booking_id: Uuid,
        odometer: u32,
        clock: &impl Clock,
    ) -> Result<Uuid> {
        let booking = garage
            .booking(booking_id)
            .ok_or_else(|| AutoServeError::NotFound(format!("booking {booking_id}")))?;
        expect_status(booking, &[BookingStatus::InProgress], "complete the job")?;
        let balance = booking.balance_due();
        if balance > 0.0 {
            return Err(AutoServeError::InvalidState(format!(
                "booking {booking_id} has an outstanding balance of {balance:.2}"
            )));
        }
        let vehicle_id = booking.vehicle_id;
        let vehicle = garage
            .vehicle(vehicle_id)
            .ok_or_else(|| AutoServeError::NotFound(format!("vehicle {vehicle_id}")))?;
        if odometer < vehicle.odometer {
            return Err(AutoServeError::InvalidInput(format!(
                "odometer reading {odometer} is below the recorded {}",
                vehicle.odometer
            )));
        }
        let mechanic = garage
            .mechanic(booking.mechanic_id)
            .map(|m| MechanicRef {
                name: m.name.clone(),
                address: m.address.clone(),
                mechanic_id: Some(m.id),
            })
            .unwrap_or_default();
        let (items, total) = booking
            .quote
            .as_ref()
            .map(|quote| (quote.items.clone(), quote.total()))
            .unwrap_or_default();
        let entry = ServiceEntry::new(clock.today(), booking.service_type.clone(), odometer)
            .with_mechanic(mechanic)
            .with_items(items)
            .with_total_cost(total);

        let now = clock.now();
        let booking = booking_mut(garage, booking_id)?;
        let released = booking.escrow.release();
        booking.status = BookingStatus::Completed;
        booking.updated_at = now;
        let vehicle = garage
            .vehicle_mut(vehicle_id)
            .ok_or_else(|| AutoServeError::NotFound(format!("vehicle {vehicle_id}")))?;
        vehicle.odometer = odometer;
        let entry_id = vehicle.upsert_service(entry);
        garage.push_notification(
            Notification::new(
                NotificationKind::ServiceCompleted,
                "Service completed",
                format!("{released:.2} released to your mechanic"),
                now,
            )
            .for_booking(booking_id)
            .for_vehicle(vehicle_id),
        );
        info!(booking = %booking_id, entry = %entry_id, released, "booking completed");
        Ok(entry_id)
    }

    /// Cancels an open booking before work starts. Returns the refunded amount.
    pub fn cancel(garage: &mut Garage, booking_id: Uuid, clock: &impl Clock) -> Result<f64> {
        let now = clock.now();
        let booking = booking_mut(garage, booking_id)?;
        expect_status(
            booking,
            &[
                BookingStatus::QuoteRequested,
                BookingStatus::Quoted,
                BookingStatus::Confirmed,
            ],
            "cancel",
        )?;
        let refunded = booking.escrow.refund();
        booking.status = BookingStatus::Cancelled;
        booking.updated_at = now;
        let message = if refunded > 0.0 {
            format!("{refunded:.2} refunded")
        } else {
            "No payment was taken".to_string()
        };
        garage.push_notification(
            Notification::new(NotificationKind::BookingCancelled, "Booking cancelled", message, now)
                .for_booking(booking_id),
        );
        info!(booking = %booking_id, refunded, "booking cancelled");
        Ok(refunded)
    }
}

fn expect_status(booking: &Booking, allowed: &[BookingStatus], action: &str) -> Result<()> {
    if allowed.contains(&booking.status) {
        Ok(())
    } else {
        Err(AutoServeError::InvalidState(format!(
            "cannot {action}: booking {} is {}",
            booking.id, booking.status
        )))
    }
}
