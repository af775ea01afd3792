//! Browsing the mechanic directory.

use std::cmp::Ordering;

use uuid::Uuid;

use crate::domain::{GeoPoint, Garage, Mechanic};
use crate::errors::{AutoServeError, Result};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MechanicSort {
    /// Highest rated first; more reviews break ties.
    #[default]
    Rating,
    /// Nearest first; mechanics without a location sort last.
    Distance,
    /// Cheapest hourly rate first.
    HourlyRate,
}

/// Filters applied when browsing mechanics. Unset fields do not filter.
#[derive(Debug, Clone, Default)]
pub struct MechanicQuery {
    pub specialty: Option<String>,
    pub min_rating: Option<f64>,
    pub near: Option<GeoPoint>,
    pub max_distance_km: Option<f64>,
    pub verified_only: bool,
    pub sort: MechanicSort,
}

#[derive(Debug, Clone)]
pub struct MechanicMatch<'a> {
    pub mechanic: &'a Mechanic,
    /// Distance from [`MechanicQuery::near`], when both locations are known.
    pub distance_km: Option<f64>,
}

pub struct MechanicService;

impl MechanicService {
    pub fn get(garage: &Garage, id: Uuid) -> Result<&Mechanic> {
        garage
            .mechanic(id)
            .ok_or_else(|| AutoServeError::NotFound(format!("mechanic {id}")))
    }

    pub fn search<'a>(garage: &'a Garage, query: &MechanicQuery) -> Vec<MechanicMatch<'a>> {
        let mut matches: Vec<MechanicMatch<'a>> = garage
            .mechanics
            .iter()
            .filter(|m| !query.verified_only || m.verified)
            .filter(|m| {
                query
                    .specialty
                    .as_deref()
                    .map_or(true, |specialty| m.has_specialty(specialty))
            })
            .filter(|m| query.min_rating.map_or(true, |min| m.rating >= min))
            .map(|mechanic| MechanicMatch {
                mechanic,
                distance_km: query
                    .near
                    .zip(mechanic.location)
                    .map(|(origin, location)| origin.distance_km(&location)),
            })
            .filter(|m| match (query.max_distance_km, m.distance_km) {
                (Some(max), Some(distance)) => distance <= max,
                (Some(_), None) => false,
                (None, _) => true,
            })
            .collect();

        match query.sort {
            MechanicSort::Rating => matches.sort_by(|a, b| {
                b.mechanic
                    .rating
                    .total_cmp(&a.mechanic.rating)
                    .then(b.mechanic.review_count.cmp(&a.mechanic.review_count))
            }),
            MechanicSort::Distance => {
                matches.sort_by(|a, b| match (a.distance_km, b.distance_km) {
                    (Some(x), Some(y)) => x.total_cmp(&y),
                    (Some(_), None) => Ordering::Less,
                    (None, Some(_)) => Ordering::Greater,
                    (None, None) => Ordering::Equal,
                })
            }
            MechanicSort::HourlyRate => {
                matches.sort_by(|a, b| a.mechanic.hourly_rate.total_cmp(&b.mechanic.hourly_rate))
            }
        }
        matches
    }
}
