use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Earnings {
    pub today: u64,
    pub today_deliveries: u32,
    pub this_week: u64,
    pub weekly_deliveries: u32,
    pub this_month: u64,
    pub monthly_deliveries: u32,
}

impl Earnings {
    /// Figures the demo account starts with.
    pub fn demo() -> Self {
        Self {
            today: 485,
            today_deliveries: 6,
            this_week: 3250,
            weekly_deliveries: 42,
            this_month: 12800,
            monthly_deliveries: 165,
        }
    }

    pub fn record_delivery(&mut self, amount: u64) {
        self.today += amount;
        self.today_deliveries += 1;
        self.this_week += amount;
        self.weekly_deliveries += 1;
        self.this_month += amount;
        self.monthly_deliveries += 1;
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryOutcome {
    Delivered,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeliveryRecord {
    pub id: u64,
    pub order_id: Option<Uuid>,
    pub order_code: String,
    pub date: NaiveDate,
    pub restaurant_name: String,
    pub drop_area: String,
    pub outcome: DeliveryOutcome,
    pub earnings: u64,
}

/// Seed history shown to the demo account, newest first.
pub fn demo_history() -> Vec<DeliveryRecord> {
    const SEED: [(&str, (i32, u32, u32), &str, &str, DeliveryOutcome, u64); 7] = [
        ("ORD100", (2025, 7, 13), "McDonald's", "Koramangala", DeliveryOutcome::Delivered, 65),
        ("ORD099", (2025, 7, 13), "Subway", "Indiranagar", DeliveryOutcome::Delivered, 78),
        ("ORD098", (2025, 7, 12), "KFC", "HSR Layout", DeliveryOutcome::Delivered, 82),
        ("ORD097", (2025, 7, 12), "Starbucks", "Bellandur", DeliveryOutcome::Cancelled, 0),
        ("ORD096", (2025, 7, 11), "Taco Bell", "Whitefield", DeliveryOutcome::Delivered, 90),
        ("ORD095", (2025, 7, 11), "Cafe Coffee Day", "MG Road", DeliveryOutcome::Delivered, 55),
        ("ORD094", (2025, 7, 10), "Biryani Blues", "JP Nagar", DeliveryOutcome::Delivered, 105),
    ];

    let total = SEED.len() as u64;
    SEED.iter()
        .enumerate()
        .filter_map(|(index, (code, (y, m, d), restaurant, area, outcome, earnings))| {
            Some(DeliveryRecord {
                id: total - index as u64,
                order_id: None,
                order_code: (*code).to_string(),
                date: NaiveDate::from_ymd_opt(*y, *m, *d)?,
                restaurant_name: (*restaurant).to_string(),
                drop_area: (*area).to_string(),
                outcome: *outcome,
                earnings: *earnings,
            })
        })
        .collect()
}
