pub mod booking_service;
pub mod mechanic_service;
pub mod notification_service;
pub mod review_service;
pub mod vehicle_service;

pub use booking_service::BookingService;
pub use mechanic_service::{MechanicMatch, MechanicQuery, MechanicService, MechanicSort};
pub use notification_service::NotificationService;
pub use review_service::ReviewService;
pub use vehicle_service::VehicleService;

use uuid::Uuid;

use crate::domain::{Booking, Garage};
use crate::errors::{AutoServeError, Result};

pub(crate) fn booking_mut(garage: &mut Garage, id: Uuid) -> Result<&mut Booking> {
    garage
        .booking_mut(id)
        .ok_or_else(|| AutoServeError::NotFound(format!("booking {id}")))
}
