//! Property listing records
//!
//! The domain payloads stored by the repository and cached by `PropertyCache`.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A property listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub id: String,
    pub title: String,
    pub description: String,
    /// Asking price in the listing currency
    pub price: f64,
    pub city: String,
    pub address: String,
    /// Free-form kind, e.g. "apartment", "house"
    pub property_type: String,
    pub bedrooms: u32,
    pub bathrooms: u32,
    pub area_sqm: f64,
    /// Listing agency, if any
    pub agency_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Aggregate statistics over every stored listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyStatistics {
    pub total_properties: u64,
    /// 0.0 when there are no listings
    pub average_price: f64,
    pub min_price: f64,
    pub max_price: f64,
    pub by_city: BTreeMap<String, u64>,
    pub by_type: BTreeMap<String, u64>,
    pub computed_at: DateTime<Utc>,
}

impl PropertyStatistics {
    /// Computes statistics over a set of listings.
    pub fn from_properties<'a, I>(properties: I) -> Self
    where
        I: IntoIterator<Item = &'a Property>,
    {
        let mut total = 0u64;
        let mut sum = 0.0;
        let mut min_price = f64::INFINITY;
        let mut max_price = f64::NEG_INFINITY;
        let mut by_city = BTreeMap::new();
        let mut by_type = BTreeMap::new();

        for property in properties {
            total += 1;
            sum += property.price;
            min_price = min_price.min(property.price);
            max_price = max_price.max(property.price);
            *by_city.entry(property.city.clone()).or_insert(0) += 1;
            *by_type.entry(property.property_type.clone()).or_insert(0) += 1;
        }

        if total == 0 {
            min_price = 0.0;
            max_price = 0.0;
        }

        Self {
            total_properties: total,
            average_price: if total == 0 { 0.0 } else { sum / total as f64 },
            min_price,
            max_price,
            by_city,
            by_type,
            computed_at: Utc::now(),
        }
    }
}
