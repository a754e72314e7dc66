//! Clinical service reference data.

use serde::{Deserialize, Serialize};

/// Backend identifier of a service.
pub type ServiceId = i64;

/// A clinical service from the clinic price list.
///
/// Reference data: fetched once per session and never edited by the chart.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Service {
    /// Backend ID
    pub id: ServiceId,
    /// Display name (e.g., "Filling")
    pub name: String,
    /// Unit price in the clinic currency
    pub price: i64,
    /// Price-list category (e.g., "Therapy", "Surgery")
    #[serde(default)]
    pub category: Option<String>,
}

impl Service {
    /// Create a service without a category.
    pub fn new(id: ServiceId, name: impl Into<String>, price: i64) -> Self {
        Self {
            id,
            name: name.into(),
            price,
            category: None,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }
}

/// Completion status of a service on a tooth.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ServiceStatus {
    #[default]
    Pending,
    Completed,
}

impl ServiceStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ServiceStatus::Pending => "pending",
            ServiceStatus::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(ServiceStatus::Pending),
            "completed" => Some(ServiceStatus::Completed),
            _ => None,
        }
    }
}
