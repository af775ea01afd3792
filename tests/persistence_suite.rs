mod common;

use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use autoserve_core::{
    domain::{Garage, ServiceEntry, Vehicle},
    errors::AutoServeError,
    storage::{
        json_backend::{load_garage_from_path, save_garage_to_path},
        JsonStorage, StorageBackend, VehicleRepository,
    },
};
use common::{date, setup_test_env, temp_base};

fn tmp_path_for(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{existing}.tmp"),
        None => String::from("tmp"),
    };
    tmp.set_extension(ext);
    tmp
}

fn garage_with_vehicle(name: &str) -> Garage {
    let mut garage = Garage::new(name);
    garage.add_vehicle(
        Vehicle::new("Toyota", "Hilux", 2019, 88_000)
            .with_plate("UTE42")
            .with_service(ServiceEntry::new(date(2024, 3, 1), "Logbook", 80_000)),
    );
    garage
}

#[test]
fn atomic_save_failure_preserves_original_file() {
    let base = temp_base();
    let path = base.join("garage.json");
    let mut garage = garage_with_vehicle("Reliable");
    save_garage_to_path(&garage, &path).expect("initial save");
    let original = fs::read_to_string(&path).expect("read original file");

    // A directory in the way of the temp file makes staging fail.
    fs::create_dir_all(tmp_path_for(&path)).unwrap();
    garage.add_vehicle(Vehicle::new("Ford", "Ranger", 2021, 10));
    assert!(save_garage_to_path(&garage, &path).is_err());

    let current = fs::read_to_string(&path).expect("read after failure");
    assert_eq!(original, current, "original snapshot must be untouched");
}

#[test]
fn repository_round_trips_through_disk() {
    let (repo, _) = setup_test_env();
    let vehicle = Vehicle::new("Subaru", "Outback", 2018, 101_000);
    repo.put_vehicle(&vehicle).unwrap();
    let entry = ServiceEntry::new(date(2024, 5, 5), "Timing belt", 100_500).with_total_cost(1_250.0);
    let entry_id = entry.id;
    repo.put_service_entry(vehicle.id, entry).unwrap();

    let stored = repo.get_vehicle(vehicle.id).unwrap().expect("vehicle persisted");
    assert_eq!(stored.make, "Subaru");
    let entries = repo.list_service_entries(vehicle.id).unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(
        repo.get_service_entry(vehicle.id, entry_id).unwrap().map(|e| e.total_cost),
        Some(1_250.0)
    );
    assert!(repo.backend().exists(repo.name()));
}

#[test]
fn service_entry_for_unknown_vehicle_is_not_found() {
    let (repo, _) = setup_test_env();
    let err = repo
        .put_service_entry(uuid::Uuid::new_v4(), ServiceEntry::new(date(2024, 1, 1), "Oil", 1))
        .unwrap_err();
    assert!(matches!(err, AutoServeError::NotFound(_)));
}

#[test]
fn backups_are_pruned_to_retention_and_restorable() {
    let base = temp_base();
    let storage = JsonStorage::new(Some(base), Some(2)).unwrap();
    let garage = garage_with_vehicle("Family");
    storage.save(&garage, "Family").unwrap();

    let first = storage.backup(&garage, "Family", Some("before trip")).unwrap();
    assert!(first.contains("before-trip"), "{first}");
    for _ in 0..2 {
        thread::sleep(Duration::from_millis(5));
        storage.backup(&garage, "Family", None).unwrap();
    }

    let backups = storage.list_backups("Family").unwrap();
    assert_eq!(backups.len(), 2);
    assert!(!backups.contains(&first));

    let restored = storage.restore("Family", &backups[0]).unwrap();
    assert_eq!(restored.vehicles.len(), 1);
    assert_eq!(restored.vehicles[0].plate.as_deref(), Some("UTE42"));
}

#[test]
fn newer_schema_versions_are_rejected() {
    let base = temp_base();
    let path = base.join("future.json");
    let mut garage = garage_with_vehicle("Future");
    garage.schema_version = u8::MAX;
    save_garage_to_path(&garage, &path).unwrap();

    let err = load_garage_from_path(&path).unwrap_err();
    assert!(matches!(err, AutoServeError::Storage(_)));
}

#[test]
fn snapshot_omits_absent_optional_fields() {
    let base = temp_base();
    let path = base.join("sparse.json");
    let mut garage = Garage::new("Sparse");
    garage.add_vehicle(Vehicle::new("Honda", "Jazz", 2022, 12_000));
    save_garage_to_path(&garage, &path).unwrap();

    let json = fs::read_to_string(&path).unwrap();
    assert!(!json.contains("\"plate\""));
    assert!(!json.contains("\"color\""));
    let loaded = load_garage_from_path(&path).unwrap();
    assert_eq!(loaded.vehicles[0].plate, None);
}
