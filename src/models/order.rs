use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Accepted,
    ReachedRestaurant,
    PickedUp,
    ReachedCustomer,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// The single forward step from this status, if any.
    pub fn next(self) -> Option<OrderStatus> {
        match self {
            OrderStatus::Pending => Some(OrderStatus::Accepted),
            OrderStatus::Accepted => Some(OrderStatus::ReachedRestaurant),
            OrderStatus::ReachedRestaurant => Some(OrderStatus::PickedUp),
            OrderStatus::PickedUp => Some(OrderStatus::ReachedCustomer),
            OrderStatus::ReachedCustomer => Some(OrderStatus::Delivered),
            OrderStatus::Delivered | OrderStatus::Cancelled => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Accepted => "accepted",
            OrderStatus::ReachedRestaurant => "reached_restaurant",
            OrderStatus::PickedUp => "picked_up",
            OrderStatus::ReachedCustomer => "reached_customer",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RejectionReason {
    TooFar,
    VehicleIssue,
    PersonalEmergency,
    AlreadyBusy,
    Other,
}

impl RejectionReason {
    pub fn as_str(self) -> &'static str {
        match self {
            RejectionReason::TooFar => "too_far",
            RejectionReason::VehicleIssue => "vehicle_issue",
            RejectionReason::PersonalEmergency => "personal_emergency",
            RejectionReason::AlreadyBusy => "already_busy",
            RejectionReason::Other => "other",
        }
    }
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub code: String,
    pub restaurant_name: String,
    pub pickup_address: String,
    pub pickup_area: String,
    pub customer_name: String,
    pub drop_address: String,
    pub drop_area: String,
    pub item_count: u8,
    pub estimated_earnings: u64,
    pub estimated_distance_km: f64,
    pub delivery_pin: String,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}
