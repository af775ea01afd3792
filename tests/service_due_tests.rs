mod common;

use autoserve_core::{
    core::services::VehicleService,
    domain::{ServiceEntry, ServiceStatus, Vehicle},
    service_due::{calculate_service_due, ServiceDueStatus},
    storage::InMemoryRepository,
    time::{start_of_day, FixedClock},
};
use common::date;

fn service() -> VehicleService<InMemoryRepository, FixedClock> {
    VehicleService::new(InMemoryRepository::new(), FixedClock::on(date(2024, 9, 1)))
}

fn status_at_distance(km_since: u32) -> ServiceDueStatus {
    let service = service();
    let id = service
        .register(Vehicle::new("Toyota", "Corolla", 2020, 40_000 + km_since))
        .unwrap();
    service
        .log_service(id, ServiceEntry::new(date(2024, 9, 1), "Logbook", 40_000))
        .unwrap();
    service.service_due(id).unwrap().status
}

#[test]
fn distance_thresholds_through_the_service() {
    assert_eq!(status_at_distance(7_999), ServiceDueStatus::UpToDate);
    assert_eq!(status_at_distance(8_000), ServiceDueStatus::DueSoon);
    assert_eq!(status_at_distance(9_999), ServiceDueStatus::DueSoon);
    assert_eq!(status_at_distance(10_000), ServiceDueStatus::Overdue);
}

#[test]
fn vehicle_without_history_needs_service() {
    let service = service();
    let id = service.register(Vehicle::new("Ford", "Focus", 2015, 120_000)).unwrap();
    let due = service.service_due(id).unwrap();
    assert_eq!(due.status, ServiceDueStatus::Overdue);
    assert_eq!(due.message, "Service history needed");
    assert_eq!(due.progress_percentage, 100.0);
}

#[test]
fn in_progress_and_cancelled_entries_do_not_reset_the_interval() {
    let service = service();
    let id = service.register(Vehicle::new("VW", "Golf", 2017, 48_500)).unwrap();
    service
        .log_service(id, ServiceEntry::new(date(2024, 8, 2), "Logbook", 40_000))
        .unwrap();
    service
        .log_service(
            id,
            ServiceEntry::new(date(2024, 8, 30), "Brakes", 48_400)
                .with_status(ServiceStatus::InProgress),
        )
        .unwrap();
    service
        .log_service(
            id,
            ServiceEntry::new(date(2024, 8, 31), "Tyres", 48_450)
                .with_status(ServiceStatus::Cancelled),
        )
        .unwrap();

    let due = service.service_due(id).unwrap();
    assert_eq!(due.status, ServiceDueStatus::DueSoon);
    assert_eq!(due.message, "Service due in 1,500 km");
    assert_eq!(due.km_until_service, 1_500);
}

#[test]
fn repeated_calculation_is_identical() {
    let vehicle = Vehicle::new("Mazda", "3", 2021, 40_500)
        .with_service(ServiceEntry::new(date(2024, 8, 22), "Logbook", 40_000));
    let now = start_of_day(date(2024, 9, 1));
    let first = calculate_service_due(&vehicle, now);
    let second = calculate_service_due(&vehicle, now);
    assert_eq!(first, second);
    assert_eq!(first.message, "Next service in 9,500 km or 24 weeks");
}

#[test]
fn fleet_is_sorted_most_urgent_first() {
    let service = service();
    let fresh = service.register(Vehicle::new("Kia", "Rio", 2023, 5_500)).unwrap();
    service
        .log_service(fresh, ServiceEntry::new(date(2024, 8, 22), "Minor", 5_000))
        .unwrap();
    let stale = service.register(Vehicle::new("Holden", "Astra", 2012, 41_000)).unwrap();
    service
        .log_service(stale, ServiceEntry::new(date(2024, 2, 13), "Major", 40_000))
        .unwrap();
    let unknown = service.register(Vehicle::new("Suzuki", "Swift", 2010, 90_000)).unwrap();

    let fleet = service.fleet_due().unwrap();
    let order: Vec<_> = fleet.iter().map(|(v, _)| v.id).collect();
    assert_eq!(order[2], fresh);
    assert!(order[..2].contains(&stale));
    assert!(order[..2].contains(&unknown));
    assert!(fleet[..2]
        .iter()
        .all(|(_, due)| due.status == ServiceDueStatus::Overdue));
}
