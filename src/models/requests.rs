//! Request DTOs for the listing API
//!
//! Defines the structure of incoming HTTP request bodies and query strings.

use serde::Deserialize;

/// Default number of search results
pub const DEFAULT_SEARCH_LIMIT: usize = 20;

/// Upper bound on requested search results
pub const MAX_SEARCH_LIMIT: usize = 100;

/// Request body for creating or replacing a listing
/// (POST /properties, PUT /properties/:id).
#[derive(Debug, Clone, Deserialize)]
pub struct PropertyRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub price: f64,
    pub city: String,
    #[serde(default)]
    pub address: String,
    #[serde(default = "default_property_type")]
    pub property_type: String,
    #[serde(default)]
    pub bedrooms: u32,
    #[serde(default)]
    pub bathrooms: u32,
    #[serde(default)]
    pub area_sqm: f64,
    #[serde(default)]
    pub agency_id: Option<String>,
}

fn default_property_type() -> String {
    "apartment".to_string()
}

impl PropertyRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.title.trim().is_empty() {
            return Some("Title cannot be empty".to_string());
        }
        if self.city.trim().is_empty() {
            return Some("City cannot be empty".to_string());
        }
        if !self.price.is_finite() || self.price < 0.0 {
            return Some("Price must be a non-negative number".to_string());
        }
        if !self.area_sqm.is_finite() || self.area_sqm < 0.0 {
            return Some("Area must be a non-negative number".to_string());
        }
        None
    }
}

/// Query string for GET /properties/search
#[derive(Debug, Clone, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
    #[serde(default)]
    pub limit: Option<usize>,
}

impl SearchParams {
    /// Requested limit clamped to `1..=MAX_SEARCH_LIMIT`.
    pub fn effective_limit(&self) -> usize {
        self.limit
            .unwrap_or(DEFAULT_SEARCH_LIMIT)
            .clamp(1, MAX_SEARCH_LIMIT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> PropertyRequest {
        serde_json::from_str(r#"{"title": "Loft", "price": 250000, "city": "Lyon"}"#).unwrap()
    }

    #[test]
    fn test_property_request_deserialize_defaults() {
        let req = request();
        assert_eq!(req.title, "Loft");
        assert_eq!(req.price, 250000.0);
        assert_eq!(req.property_type, "apartment");
        assert_eq!(req.bedrooms, 0);
        assert!(req.agency_id.is_none());
    }

    #[test]
    fn test_validate_valid_request() {
        assert!(request().validate().is_none());
    }

    #[test]
    fn test_validate_empty_title() {
        let req = PropertyRequest {
            title: "  ".to_string(),
            ..request()
        };
        assert!(req.validate().is_some());
    }

    #[test]
    fn test_validate_negative_price() {
        let req = PropertyRequest {
            price: -1.0,
            ..request()
        };
        assert!(req.validate().is_some());
    }

    #[test]
    fn test_search_limit_clamped() {
        let params = |limit| SearchParams {
            q: "flat".to_string(),
            limit,
        };
        assert_eq!(params(None).effective_limit(), DEFAULT_SEARCH_LIMIT);
        assert_eq!(params(Some(0)).effective_limit(), 1);
        assert_eq!(params(Some(5_000)).effective_limit(), MAX_SEARCH_LIMIT);
        assert_eq!(params(Some(7)).effective_limit(), 7);
    }
}
