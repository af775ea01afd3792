//! Customer reviews of completed jobs.

use tracing::info;
use uuid::Uuid;

use crate::domain::{BookingStatus, Garage, Review};
use crate::errors::{AutoServeError, Result};
use crate::time::Clock;

pub struct ReviewService;

impl ReviewService {
    /// Records a 1-5 star review for a completed booking and refreshes the mechanic's rating.
    ///
    /// Each booking takes at most one review.
    pub fn add(
        garage: &mut Garage,
        booking_id: Uuid,
        author: &str,
        rating: u8,
        comment: Option<&str>,
        clock: &impl Clock,
    ) -> Result<Uuid> {
        if !(1..=5).contains(&rating) {
            return Err(AutoServeError::InvalidInput(format!(
                "rating {rating} must be between 1 and 5"
            )));
        }
        let author = author.trim();
        if author.is_empty() {
            return Err(AutoServeError::InvalidInput("author is required".into()));
        }
        let booking = garage
            .booking(booking_id)
            .ok_or_else(|| AutoServeError::NotFound(format!("booking {booking_id}")))?;
        if booking.status != BookingStatus::Completed {
            return Err(AutoServeError::InvalidState(format!(
                "booking {booking_id} is {}, only completed jobs can be reviewed",
                booking.status
            )));
        }
        if booking.review_id.is_some() {
            return Err(AutoServeError::InvalidState(format!(
                "booking {booking_id} already has a review"
            )));
        }
        let mechanic_id = booking.mechanic_id;
        let review = Review {
            id: Uuid::new_v4(),
            booking_id,
            author: author.to_string(),
            rating,
            comment: comment
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(str::to_string),
            created_at: clock.now(),
        };
        let review_id = review.id;

        let mechanic = garage
            .mechanic_mut(mechanic_id)
            .ok_or_else(|| AutoServeError::NotFound(format!("mechanic {mechanic_id}")))?;
        mechanic.reviews.push(review);
        mechanic.refresh_rating();
        let rating = mechanic.rating;
        super::booking_mut(garage, booking_id)?.review_id = Some(review_id);
        info!(mechanic = %mechanic_id, rating, "review added");
        Ok(review_id)
    }

    /// A mechanic's reviews, newest first.
    pub fn reviews_for(garage: &Garage, mechanic_id: Uuid) -> Result<Vec<&Review>> {
        let mechanic = garage
            .mechanic(mechanic_id)
            .ok_or_else(|| AutoServeError::NotFound(format!("mechanic {mechanic_id}")))?;
        let mut reviews: Vec<&Review> = mechanic.reviews.iter().collect();
        reviews.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(reviews)
    }
}
