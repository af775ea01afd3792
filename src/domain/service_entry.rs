use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::common::*;
use crate::pricing::CostBreakdown;

/// A historical maintenance event recorded in a vehicle's logbook.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServiceEntry {
    pub id: Uuid,
    pub date: NaiveDate,
    pub service_type: String,
    #[serde(default)]
    pub mechanic: MechanicRef,
    #[serde(default)]
    pub total_cost: f64,
    /// Odometer reading at the time of service.
    pub odometer: u32,
    pub status: ServiceStatus,
    #[serde(default)]
    pub items: Vec<ServiceItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warranty: Option<String>,
}

impl ServiceEntry {
    /// Creates a completed entry with no line items.
    pub fn new(date: NaiveDate, service_type: impl Into<String>, odometer: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            date,
            service_type: service_type.into(),
            mechanic: MechanicRef::default(),
            total_cost: 0.0,
            odometer,
            status: ServiceStatus::Completed,
            items: Vec::new(),
            notes: None,
            warranty: None,
        }
    }

    pub fn with_status(mut self, status: ServiceStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_mechanic(mut self, mechanic: MechanicRef) -> Self {
        self.mechanic = mechanic;
        self
    }

    pub fn with_items(mut self, items: Vec<ServiceItem>) -> Self {
        self.items = items;
        self
    }

    pub fn with_total_cost(mut self, total_cost: f64) -> Self {
        self.total_cost = total_cost;
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn with_warranty(mut self, warranty: impl Into<String>) -> Self {
        self.warranty = Some(warranty.into());
        self
    }

    pub fn is_completed(&self) -> bool {
        matches!(self.status, ServiceStatus::Completed)
    }

    /// Recomputes the invoice totals from the line items. `total_cost` is not consulted.
    pub fn breakdown(&self, gst_rate: f64) -> CostBreakdown {
        CostBreakdown::from_items(&self.items, gst_rate)
    }
}

impl Identifiable for ServiceEntry {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl Displayable for ServiceEntry {
    fn display_label(&self) -> String {
        format!(
            "{} {} @ {} km ({})",
            self.date, self.service_type, self.odometer, self.status
        )
    }
}

/// Lifecycle status of a service entry. Only `Completed` entries count towards service-due.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum ServiceStatus {
    Completed,
    InProgress,
    Cancelled,
}

impl ServiceStatus {
    pub fn label(&self) -> &'static str {
        match self {
            ServiceStatus::Completed => "completed",
            ServiceStatus::InProgress => "in-progress",
            ServiceStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "completed" => Some(ServiceStatus::Completed),
            "in-progress" | "in_progress" | "inprogress" => Some(ServiceStatus::InProgress),
            "cancelled" | "canceled" => Some(ServiceStatus::Cancelled),
            _ => None,
        }
    }
}

impl std::fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Who performed the service, as recorded on the logbook entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MechanicRef {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mechanic_id: Option<Uuid>,
}

impl MechanicRef {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: None,
            mechanic_id: None,
        }
    }
}

/// A billable line within a service entry or quote.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServiceItem {
    pub name: String,
    pub price: f64,
    pub category: ItemCategory,
}

impl ServiceItem {
    pub fn new(name: impl Into<String>, price: f64, category: ItemCategory) -> Self {
        Self {
            name: name.into(),
            price,
            category,
        }
    }

    pub fn parts(name: impl Into<String>, price: f64) -> Self {
        Self::new(name, price, ItemCategory::Parts)
    }

    pub fn labor(name: impl Into<String>, price: f64) -> Self {
        Self::new(name, price, ItemCategory::Labor)
    }

    pub fn fee(name: impl Into<String>, price: f64) -> Self {
        Self::new(name, price, ItemCategory::Fees)
    }
}

impl NamedEntity for ServiceItem {
    fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ItemCategory {
    Parts,
    Labor,
    Fees,
}
