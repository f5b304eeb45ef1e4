use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use uuid::Uuid;

use crate::models::order::{Order, OrderStatus};

const RESTAURANTS: [&str; 8] = [
    "Burger King",
    "Pizza Hut",
    "Dominos",
    "KFC",
    "McDonald's",
    "Subway",
    "Taco Bell",
    "Biryani Blues",
];

const AREAS: [&str; 8] = [
    "Koramangala",
    "Indiranagar",
    "HSR Layout",
    "Bellandur",
    "Whitefield",
    "Marathahalli",
    "JP Nagar",
    "MG Road",
];

const CUSTOMERS: [&str; 6] = [
    "Rahul Sharma",
    "Priya Singh",
    "Amit Kumar",
    "Neha Gupta",
    "Vikram Patel",
    "Anjali Verma",
];

const PICKUP_STREETS: [&str; 4] = ["Main St", "Food Court", "Mall Road", "Plaza"];
const DROP_STREETS: [&str; 4] = ["Park Street", "Garden View", "Lake View", "Apartment"];

fn pick<R: Rng + ?Sized>(rng: &mut R, options: &[&'static str]) -> String {
    options.choose(rng).copied().unwrap_or_default().to_string()
}

/// Builds a simulated order request with a random restaurant, route and PIN.
pub fn random_order<R: Rng + ?Sized>(rng: &mut R, now: DateTime<Utc>) -> Order {
    let distance_tenths: u32 = rng.gen_range(20..=100);

    Order {
        id: Uuid::new_v4(),
        code: format!("ORD{}", rng.gen_range(100..1000)),
        restaurant_name: pick(rng, &RESTAURANTS),
        pickup_address: format!("{} {}", rng.gen_range(100..1000), pick(rng, &PICKUP_STREETS)),
        pickup_area: pick(rng, &AREAS),
        customer_name: pick(rng, &CUSTOMERS),
        drop_address: format!("{} {}", rng.gen_range(100..1000), pick(rng, &DROP_STREETS)),
        drop_area: pick(rng, &AREAS),
        item_count: rng.gen_range(1..=5),
        estimated_earnings: rng.gen_range(50..130),
        estimated_distance_km: f64::from(distance_tenths) / 10.0,
        delivery_pin: rng.gen_range(1000..10000).to_string(),
        status: OrderStatus::Pending,
        created_at: now,
        completed_at: None,
    }
}
