//! Service-due calculation for a vehicle's logbook.
//!
//! A vehicle is due for service every [`SERVICE_INTERVAL_KM`] kilometres or every
//! [`SERVICE_INTERVAL_MONTHS`] months (modelled as [`SERVICE_INTERVAL_DAYS`] days),
//! whichever comes first, counted from the most recent *completed* service.
//! The calculation is pure: callers pass `now` explicitly.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::currency::format_grouped;
use crate::domain::{ServiceEntry, Vehicle};
use crate::time::start_of_day;

pub const SERVICE_INTERVAL_KM: i64 = 10_000;
pub const SERVICE_INTERVAL_MONTHS: i64 = 6;
pub const DAYS_PER_MONTH: i64 = 30;
pub const SERVICE_INTERVAL_DAYS: i64 = SERVICE_INTERVAL_MONTHS * DAYS_PER_MONTH;
/// 80% of the distance interval.
pub const DUE_SOON_KM: i64 = SERVICE_INTERVAL_KM * 4 / 5;
/// 80% of the time interval.
pub const DUE_SOON_DAYS: i64 = SERVICE_INTERVAL_DAYS * 4 / 5;

pub const HISTORY_NEEDED_MESSAGE: &str = "Service history needed";

const SECONDS_PER_DAY: i64 = 86_400;
const DAYS_PER_WEEK: i64 = 7;

const FALLBACK_TEXT_CLASS: &str = "text-gray-600";
const FALLBACK_BADGE_CLASS: &str = "bg-gray-100 text-gray-800";
const FALLBACK_DOT_CLASS: &str = "bg-gray-500";

/// Classification of a vehicle's next scheduled maintenance.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ServiceDueStatus {
    #[serde(rename = "Up to Date")]
    UpToDate,
    #[serde(rename = "Due Soon")]
    DueSoon,
    #[serde(rename = "Overdue")]
    Overdue,
}

impl ServiceDueStatus {
    pub fn label(&self) -> &'static str {
        match self {
            ServiceDueStatus::UpToDate => "Up to Date",
            ServiceDueStatus::DueSoon => "Due Soon",
            ServiceDueStatus::Overdue => "Overdue",
        }
    }

    pub fn parse(label: &str) -> Option<Self> {
        match label.trim() {
            "Up to Date" => Some(ServiceDueStatus::UpToDate),
            "Due Soon" => Some(ServiceDueStatus::DueSoon),
            "Overdue" => Some(ServiceDueStatus::Overdue),
            _ => None,
        }
    }

    pub fn text_color_class(&self) -> &'static str {
        match self {
            ServiceDueStatus::UpToDate => "text-green-600",
            ServiceDueStatus::DueSoon => "text-yellow-600",
            ServiceDueStatus::Overdue => "text-red-600",
        }
    }

    pub fn badge_color_class(&self) -> &'static str {
        match self {
            ServiceDueStatus::UpToDate => "bg-green-100 text-green-800",
            ServiceDueStatus::DueSoon => "bg-yellow-100 text-yellow-800",
            ServiceDueStatus::Overdue => "bg-red-100 text-red-800",
        }
    }

    pub fn dot_color_class(&self) -> &'static str {
        match self {
            ServiceDueStatus::UpToDate => "bg-green-500",
            ServiceDueStatus::DueSoon => "bg-yellow-500",
            ServiceDueStatus::Overdue => "bg-red-500",
        }
    }
}

impl std::fmt::Display for ServiceDueStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Text colour class for a status label read from a snapshot.
pub fn status_text_color(label: &str) -> &'static str {
    ServiceDueStatus::parse(label)
        .map(|status| status.text_color_class())
        .unwrap_or(FALLBACK_TEXT_CLASS)
}

/// Badge colour class for a status label read from a snapshot.
pub fn status_badge_color(label: &str) -> &'static str {
    ServiceDueStatus::parse(label)
        .map(|status| status.badge_color_class())
        .unwrap_or(FALLBACK_BADGE_CLASS)
}

/// Dot colour class for a status label read from a snapshot.
pub fn status_dot_color(label: &str) -> &'static str {
    ServiceDueStatus::parse(label)
        .map(|status| status.dot_color_class())
        .unwrap_or(FALLBACK_DOT_CLASS)
}

/// The date and odometer of one completed service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceMark {
    pub date: NaiveDate,
    pub odometer: u32,
}

impl ServiceMark {
    pub fn new(date: NaiveDate, odometer: u32) -> Self {
        Self { date, odometer }
    }
}

impl From<&ServiceEntry> for ServiceMark {
    fn from(entry: &ServiceEntry) -> Self {
        Self::new(entry.date, entry.odometer)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServiceDueResult {
    pub status: ServiceDueStatus,
    pub message: String,
    /// Kilometres left in the interval; negative when overdue.
    pub km_until_service: i64,
    /// Days left in the interval; negative when overdue.
    pub days_until_service: i64,
    /// Larger of distance and time progress, in `0..=100`.
    pub progress_percentage: f64,
}

impl ServiceDueResult {
    fn history_needed() -> Self {
        Self {
            status: ServiceDueStatus::Overdue,
            message: HISTORY_NEEDED_MESSAGE.to_string(),
            km_until_service: 0,
            days_until_service: 0,
            progress_percentage: 100.0,
        }
    }

    pub fn needs_attention(&self) -> bool {
        !matches!(self.status, ServiceDueStatus::UpToDate)
    }
}

/// Service-due status for a vehicle. Entries that are not `completed` are ignored.
pub fn calculate_service_due(vehicle: &Vehicle, now: DateTime<Utc>) -> ServiceDueResult {
    let history: Vec<ServiceMark> = vehicle.completed_services().map(ServiceMark::from).collect();
    calculate_from_history(vehicle.odometer, &history, now)
}

/// Service-due status from a current odometer and completed-service history.
///
/// Inconsistent data (a service odometer above the current reading, or a service
/// dated in the future) is not rejected; it simply reads as plenty of budget left.
pub fn calculate_from_history(
    current_odometer: u32,
    history: &[ServiceMark],
    now: DateTime<Utc>,
) -> ServiceDueResult {
    // First recorded entry wins ties on date.
    let Some(last) = history
        .iter()
        .reduce(|best, mark| if mark.date > best.date { mark } else { best })
    else {
        return ServiceDueResult::history_needed();
    };

    let km_since = i64::from(current_odometer) - i64::from(last.odometer);
    let days_since = (now - start_of_day(last.date))
        .num_seconds()
        .div_euclid(SECONDS_PER_DAY);

    let km_until_service = SERVICE_INTERVAL_KM - km_since;
    let days_until_service = SERVICE_INTERVAL_DAYS - days_since;

    let km_progress = fraction(km_since, SERVICE_INTERVAL_KM) * 100.0;
    let time_progress = fraction(days_since, SERVICE_INTERVAL_DAYS) * 100.0;
    let progress_percentage = km_progress.max(time_progress);

    let (status, message) = if km_since >= SERVICE_INTERVAL_KM || days_since >= SERVICE_INTERVAL_DAYS
    {
        (
            ServiceDueStatus::Overdue,
            overdue_message(-km_until_service, -days_until_service),
        )
    } else if km_since >= DUE_SOON_KM || days_since >= DUE_SOON_DAYS {
        (
            ServiceDueStatus::DueSoon,
            due_soon_message(
                (km_since >= DUE_SOON_KM).then_some(km_until_service),
                (days_since >= DUE_SOON_DAYS).then_some(days_until_service),
            ),
        )
    } else {
        (
            ServiceDueStatus::UpToDate,
            format!(
                "Next service in {} or {}",
                km_phrase(km_until_service),
                weeks_phrase(weeks(days_until_service))
            ),
        )
    };

    ServiceDueResult {
        status,
        message,
        km_until_service,
        days_until_service,
        progress_percentage,
    }
}

fn overdue_message(km_over: i64, days_over: i64) -> String {
    let weeks_over = weeks(days_over);
    let mut parts = Vec::with_capacity(2);
    if km_over > 0 {
        parts.push(km_phrase(km_over));
    }
    if weeks_over > 0 {
        parts.push(weeks_phrase(weeks_over));
    }
    if parts.is_empty() {
        "Service overdue".to_string()
    } else {
        format!("Service overdue by {}", parts.join(" and "))
    }
}

/// Only the dimensions that crossed the due-soon threshold are passed in.
fn due_soon_message(km_left: Option<i64>, days_left: Option<i64>) -> String {
    let mut parts = Vec::with_capacity(2);
    if let Some(km) = km_left.filter(|km| *km > 0) {
        parts.push(km_phrase(km));
    }
    if let Some(w) = days_left.map(weeks).filter(|w| *w > 0) {
        parts.push(weeks_phrase(w));
    }
    if parts.is_empty() {
        "Service due this week".to_string()
    } else {
        format!("Service due in {}", parts.join(" or "))
    }
}

fn fraction(elapsed: i64, interval: i64) -> f64 {
    (elapsed as f64 / interval as f64).clamp(0.0, 1.0)
}

fn weeks(days: i64) -> i64 {
    days.div_euclid(DAYS_PER_WEEK)
}

fn km_phrase(km: i64) -> String {
    format!("{} km", format_grouped(km))
}

fn weeks_phrase(weeks: i64) -> String {
    if weeks == 1 {
        "1 week".to_string()
    } else {
        format!("{weeks} weeks")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ServiceStatus;
    use chrono::{Days, Duration};

    fn now() -> DateTime<Utc> {
        start_of_day(NaiveDate::from_ymd_opt(2024, 9, 1).unwrap()) + Duration::hours(15)
    }

    fn days_ago(days: u64) -> NaiveDate {
        now().date_naive().checked_sub_days(Days::new(days)).unwrap()
    }

    fn at(odometer: u32, days: u64, current: u32) -> ServiceDueResult {
        calculate_from_history(current, &[ServiceMark::new(days_ago(days), odometer)], now())
    }

    #[test]
    fn empty_history_needs_service() {
        let result = calculate_from_history(55_000, &[], now());
        assert_eq!(result.status, ServiceDueStatus::Overdue);
        assert_eq!(result.message, HISTORY_NEEDED_MESSAGE);
        assert_eq!(result.km_until_service, 0);
        assert_eq!(result.days_until_service, 0);
        assert_eq!(result.progress_percentage, 100.0);
    }

    #[test]
    fn scenario_overdue_by_time_only() {
        let result = at(40_000, 200, 41_000);
        assert_eq!(result.status, ServiceDueStatus::Overdue);
        assert_eq!(result.message, "Service overdue by 2 weeks");
        assert_eq!(result.km_until_service, 9_000);
        assert_eq!(result.days_until_service, -20);
        assert_eq!(result.progress_percentage, 100.0);
    }

    #[test]
    fn scenario_due_soon_by_distance_reports_km_only() {
        let result = at(40_000, 30, 48_500);
        assert_eq!(result.status, ServiceDueStatus::DueSoon);
        assert_eq!(result.message, "Service due in 1,500 km");
        assert_eq!(result.km_until_service, 1_500);
        assert_eq!(result.days_until_service, 150);
        assert_eq!(result.progress_percentage, 85.0);
    }

    #[test]
    fn scenario_up_to_date_reports_both_budgets() {
        let result = at(40_000, 10, 40_500);
        assert_eq!(result.status, ServiceDueStatus::UpToDate);
        assert_eq!(result.message, "Next service in 9,500 km or 24 weeks");
        assert_eq!(result.km_until_service, 9_500);
        assert_eq!(result.days_until_service, 170);
    }

    #[test]
    fn overdue_on_both_dimensions_joins_with_and() {
        let result = at(40_000, 194, 51_250);
        assert_eq!(result.message, "Service overdue by 1,250 km and 2 weeks");
    }

    #[test]
    fn due_soon_on_both_dimensions_mentions_both() {
        let result = at(40_000, 150, 48_000);
        assert_eq!(result.status, ServiceDueStatus::DueSoon);
        assert_eq!(result.message, "Service due in 2,000 km or 4 weeks");
    }

    #[test]
    fn due_soon_by_time_only_reports_weeks() {
        let result = at(40_000, 144, 41_000);
        assert_eq!(result.status, ServiceDueStatus::DueSoon);
        assert_eq!(result.message, "Service due in 5 weeks");
        assert_eq!(result.progress_percentage, 80.0);
    }

    #[test]
    fn distance_boundaries() {
        assert_eq!(at(0, 0, 10_000).status, ServiceDueStatus::Overdue);
        assert_eq!(at(0, 0, 9_999).status, ServiceDueStatus::DueSoon);
        assert_eq!(at(0, 0, 8_000).status, ServiceDueStatus::DueSoon);
        assert_eq!(at(0, 0, 7_999).status, ServiceDueStatus::UpToDate);
    }

    #[test]
    fn exact_distance_interval_has_no_positive_overdue_part() {
        let result = at(0, 0, 10_000);
        assert_eq!(result.message, "Service overdue");
        assert_eq!(result.km_until_service, 0);
    }

    #[test]
    fn time_boundaries() {
        assert_eq!(at(0, 180, 0).status, ServiceDueStatus::Overdue);
        assert_eq!(at(0, 179, 0).status, ServiceDueStatus::DueSoon);
        assert_eq!(at(0, 144, 0).status, ServiceDueStatus::DueSoon);
        assert_eq!(at(0, 143, 0).status, ServiceDueStatus::UpToDate);
    }

    #[test]
    fn last_days_of_due_soon_window_say_this_week() {
        let result = at(0, 176, 0);
        assert_eq!(result.status, ServiceDueStatus::DueSoon);
        assert_eq!(result.message, "Service due this week");
    }

    #[test]
    fn most_recent_completed_service_wins() {
        let history = [
            ServiceMark::new(days_ago(300), 20_000),
            ServiceMark::new(days_ago(10), 39_000),
            ServiceMark::new(days_ago(120), 30_000),
        ];
        let result = calculate_from_history(40_000, &history, now());
        assert_eq!(result.km_until_service, 9_000);
        assert_eq!(result.days_until_service, 170);
    }

    #[test]
    fn non_completed_entries_are_ignored() {
        let base = Vehicle::new("Toyota", "Hilux", 2020, 48_500)
            .with_service(ServiceEntry::new(days_ago(30), "Logbook", 40_000));
        let noisy = base
            .clone()
            .with_service(
                ServiceEntry::new(days_ago(1), "Brakes", 48_400)
                    .with_status(ServiceStatus::InProgress),
            )
            .with_service(
                ServiceEntry::new(days_ago(2), "Tyres", 12).with_status(ServiceStatus::Cancelled),
            );
        assert_eq!(
            calculate_service_due(&base, now()),
            calculate_service_due(&noisy, now())
        );
    }

    #[test]
    fn negative_distance_reads_as_ample_budget() {
        let result = at(50_000, 10, 45_000);
        assert_eq!(result.status, ServiceDueStatus::UpToDate);
        assert_eq!(result.km_until_service, 15_000);
        assert!(result.progress_percentage >= 0.0);
    }

    #[test]
    fn future_dated_service_is_tolerated() {
        let future = now().date_naive().checked_add_days(Days::new(3)).unwrap();
        let result = calculate_from_history(1_000, &[ServiceMark::new(future, 500)], now());
        assert_eq!(result.status, ServiceDueStatus::UpToDate);
        assert_eq!(result.days_until_service, 183);
    }

    #[test]
    fn progress_is_monotonic_in_odometer() {
        let mut previous = 0.0;
        let mut seen_overdue = false;
        for current in (40_000..=52_000).step_by(250) {
            let result = at(40_000, 20, current);
            assert!(result.progress_percentage >= previous);
            if seen_overdue {
                assert_eq!(result.status, ServiceDueStatus::Overdue);
            }
            seen_overdue |= result.status == ServiceDueStatus::Overdue;
            previous = result.progress_percentage;
        }
        assert!(seen_overdue);
    }

    #[test]
    fn colour_lookups_fall_back_for_unknown_labels() {
        assert_eq!(status_text_color("Overdue"), "text-red-600");
        assert_eq!(status_badge_color("Due Soon"), "bg-yellow-100 text-yellow-800");
        assert_eq!(status_dot_color("Up to Date"), "bg-green-500");
        assert_eq!(status_text_color("Unknown"), "text-gray-600");
        assert_eq!(status_badge_color(""), "bg-gray-100 text-gray-800");
        assert_eq!(status_dot_color("overdue"), "bg-gray-500");
    }

    #[test]
    fn status_serializes_with_display_labels() {
        let json = serde_json::to_string(&ServiceDueStatus::UpToDate).unwrap();
        assert_eq!(json, "\"Up to Date\"");
    }
}
