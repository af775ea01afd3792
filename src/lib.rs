#![doc(test(attr(deny(warnings))))]

//! Auto Serve Core holds the logic behind the Auto Serve booking app: vehicle
//! logbooks and service-due tracking, quote and invoice pricing, mechanic
//! browsing, bookings with escrowed payments, reviews, and notifications.

pub mod cli;
pub mod config;
pub mod core;
pub mod currency;
pub mod domain;
pub mod errors;
pub mod payment;
pub mod pricing;
pub mod service_due;
pub mod storage;
pub mod time;
pub mod utils;

use std::sync::Once;

pub use errors::{AutoServeError, Result};

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::info!("Auto Serve tracing initialized.");
    });
}
