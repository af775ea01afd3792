//! Built-in mechanic directory used when a garage is first created.

use crate::domain::{Garage, GeoPoint, Mechanic};

struct SeedMechanic {
    name: &'static str,
    business: &'static str,
    address: &'static str,
    location: (f64, f64),
    specialties: &'static [&'static str],
    hourly_rate: f64,
    verified: bool,
}

const DIRECTORY: &[SeedMechanic] = &[
    SeedMechanic {
        name: "Mike Thompson",
        business: "Thompson Auto Care",
        address: "12 Parramatta Rd, Annandale NSW",
        location: (-33.8830, 151.1700),
        specialties: &["General Service", "Brakes", "Suspension"],
        hourly_rate: 110.0,
        verified: true,
    },
    SeedMechanic {
        name: "Priya Sharma",
        business: "Eastside Euro Specialists",
        address: "48 Oxford St, Paddington NSW",
        location: (-33.8847, 151.2265),
        specialties: &["European", "Diagnostics", "Electrical"],
        hourly_rate: 145.0,
        verified: true,
    },
    SeedMechanic {
        name: "Dave Nguyen",
        business: "Mobile Mechanic Dave",
        address: "Servicing Inner West NSW",
        location: (-33.8988, 151.1543),
        specialties: &["Mobile", "General Service", "Batteries"],
        hourly_rate: 95.0,
        verified: false,
    },
    SeedMechanic {
        name: "Sarah O'Connell",
        business: "Northside 4x4 & Diesel",
        address: "7 Pacific Hwy, Chatswood NSW",
        location: (-33.7969, 151.1803),
        specialties: &["Diesel", "4x4", "Transmission"],
        hourly_rate: 130.0,
        verified: true,
    },
    SeedMechanic {
        name: "Tom Russo",
        business: "Russo Tyres & Brakes",
        address: "201 Canterbury Rd, Canterbury NSW",
        location: (-33.9120, 151.1190),
        specialties: &["Tyres", "Brakes", "Wheel Alignment"],
        hourly_rate: 85.0,
        verified: true,
    },
];

/// Fresh copies of the directory, each with a new id.
pub fn sample_mechanics() -> Vec<Mechanic> {
    DIRECTORY
        .iter()
        .map(|seed| {
            let mechanic = Mechanic::new(seed.name, seed.hourly_rate)
                .with_business(seed.business)
                .with_address(seed.address)
                .with_location(GeoPoint::new(seed.location.0, seed.location.1))
                .with_specialties(seed.specialties.iter().copied());
            if seed.verified {
                mechanic.verified()
            } else {
                mechanic
            }
        })
        .collect()
}

/// Adds the directory to a garage that has no mechanics yet. Returns how many were added.
pub fn seed_mechanics(garage: &mut Garage) -> usize {
    if !garage.mechanics.is_empty() {
        return 0;
    }
    let mechanics = sample_mechanics();
    let added = mechanics.len();
    for mechanic in mechanics {
        garage.add_mechanic(mechanic);
    }
    added
}
