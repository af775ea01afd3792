//! The notification feed, plus service-due reminders generated from logbooks.

use chrono::{DateTime, Utc};
use tracing::debug;
use uuid::Uuid;

use crate::domain::{Garage, Notification, NotificationKind};
use crate::errors::{AutoServeError, Result};
use crate::service_due::calculate_service_due;

pub struct NotificationService;

impl NotificationService {
    /// All notifications, newest first.
    pub fn list(garage: &Garage) -> Vec<&Notification> {
        let mut items: Vec<&Notification> = garage.notifications.iter().collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        items
    }

    pub fn unread_count(garage: &Garage) -> usize {
        garage.notifications.iter().filter(|n| !n.read).count()
    }

    pub fn mark_read(garage: &mut Garage, id: Uuid) -> Result<()> {
        let notification = garage
            .notifications
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or_else(|| AutoServeError::NotFound(format!("notification {id}")))?;
        notification.read = true;
        Ok(())
    }

    /// Marks everything read and returns how many changed.
    pub fn mark_all_read(garage: &mut Garage) -> usize {
        let mut changed = 0;
        for notification in garage.notifications.iter_mut().filter(|n| !n.read) {
            notification.read = true;
            changed += 1;
        }
        changed
    }

    /// Adds a reminder for each vehicle that is due soon or overdue.
    ///
    /// A vehicle that still has an unread reminder does not get another one.
    /// Returns the ids of the reminders created.
    pub fn service_due_reminders(garage: &mut Garage, now: DateTime<Utc>) -> Vec<Uuid> {
        let pending: Vec<Notification> = garage
            .vehicles
            .iter()
            .filter(|vehicle| {
                !garage.notifications.iter().any(|n| {
                    n.kind == NotificationKind::ServiceDue
                        && !n.read
                        && n.vehicle_id == Some(vehicle.id)
                })
            })
            .filter_map(|vehicle| {
                let due = calculate_service_due(vehicle, now);
                due.needs_attention().then(|| {
                    Notification::new(
                        NotificationKind::ServiceDue,
                        format!("{} {}: {}", vehicle.make, vehicle.model, due.status),
                        due.message,
                        now,
                    )
                    .for_vehicle(vehicle.id)
                })
            })
            .collect();

        pending
            .into_iter()
            .map(|notification| {
                debug!(vehicle = ?notification.vehicle_id, "service reminder queued");
                garage.push_notification(notification)
            })
            .collect()
    }
}
