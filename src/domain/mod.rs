//! Entities of the Auto Serve garage: vehicles and their logbooks, mechanics,
//! bookings, and the notification feed.

pub mod booking;
pub mod common;
pub mod garage;
pub mod mechanic;
pub mod notification;
pub mod quote;
pub mod service_entry;
pub mod vehicle;

pub use booking::{Booking, BookingStatus, Escrow, EscrowStatus, PaymentKind, PaymentRecord};
pub use common::{Displayable, GeoPoint, Identifiable, NamedEntity};
pub use garage::Garage;
pub use mechanic::{Mechanic, Review};
pub use notification::{Notification, NotificationKind};
pub use quote::Quote;
pub use service_entry::{ItemCategory, MechanicRef, ServiceEntry, ServiceItem, ServiceStatus};
pub use vehicle::Vehicle;
