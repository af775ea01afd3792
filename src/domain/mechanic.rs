use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::common::*;

/// A mechanic (or workshop) listed for booking.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Mechanic {
    pub id: Uuid,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<GeoPoint>,
    #[serde(default)]
    pub specialties: Vec<String>,
    pub hourly_rate: f64,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub review_count: u32,
    #[serde(default)]
    pub verified: bool,
    #[serde(default)]
    pub reviews: Vec<Review>,
}

impl Mechanic {
    pub fn new(name: impl Into<String>, hourly_rate: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            business_name: None,
            address: None,
            location: None,
            specialties: Vec::new(),
            hourly_rate,
            rating: 0.0,
            review_count: 0,
            verified: false,
            reviews: Vec::new(),
        }
    }

    pub fn with_business(mut self, business_name: impl Into<String>) -> Self {
        self.business_name = Some(business_name.into());
        self
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    pub fn with_location(mut self, location: GeoPoint) -> Self {
        self.location = Some(location);
        self
    }

    pub fn with_specialties<I, S>(mut self, specialties: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.specialties = specialties.into_iter().map(Into::into).collect();
        self
    }

    pub fn verified(mut self) -> Self {
        self.verified = true;
        self
    }

    pub fn has_specialty(&self, specialty: &str) -> bool {
        let needle = specialty.trim().to_ascii_lowercase();
        self.specialties
            .iter()
            .any(|s| s.to_ascii_lowercase().contains(&needle))
    }

    /// Recomputes `rating` and `review_count` from the stored reviews.
    pub fn refresh_rating(&mut self) {
        self.review_count = self.reviews.len() as u32;
        self.rating = if self.reviews.is_empty() {
            0.0
        } else {
            let sum: u32 = self.reviews.iter().map(|r| u32::from(r.rating)).sum();
            (f64::from(sum) / self.reviews.len() as f64 * 10.0).round() / 10.0
        };
    }
}

impl Identifiable for Mechanic {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl NamedEntity for Mechanic {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Displayable for Mechanic {
    fn display_label(&self) -> String {
        match &self.business_name {
            Some(business) => format!("{} ({})", self.name, business),
            None => self.name.clone(),
        }
    }
}

/// Customer review left after a completed booking.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Review {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub author: String,
    pub rating: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}
