//! Property Repository
//!
//! The data-access collaborator behind `PropertyService`. The cache never
//! calls it; the service does, on cache misses and for writes.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use parking_lot::RwLock;

use crate::cache::normalize_query;
use crate::error::{AppError, Result};
use crate::models::{Property, PropertyRequest, PropertyStatistics};

/// Storage operations for listings.
pub trait PropertyRepository: Send + Sync {
    /// Returns the listing, or None if no row has this id.
    fn fetch_by_id(&self, id: &str) -> Result<Option<Property>>;

    /// Full-text search, best matches first, at most `limit` rows.
    fn search(&self, query: &str, limit: usize) -> Result<Vec<Property>>;

    fn compute_statistics(&self) -> Result<PropertyStatistics>;

    fn create(&self, request: PropertyRequest) -> Result<Property>;

    /// Replaces the listing's fields. `NotFound` if the id is unknown.
    fn update(&self, id: &str, request: PropertyRequest) -> Result<Property>;

    /// `NotFound` if the id is unknown.
    fn delete(&self, id: &str) -> Result<()>;
}

// == In-Memory Repository ==
/// Repository backed by a map, used by the server binary and tests.
#[derive(Debug)]
pub struct InMemoryPropertyRepository {
    rows: RwLock<HashMap<String, Property>>,
    next_id: AtomicU64,
}

impl Default for InMemoryPropertyRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryPropertyRepository {
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Stores a listing as-is, replacing any row with the same id.
    pub fn insert(&self, property: Property) {
        self.rows.write().insert(property.id.clone(), property);
    }

    pub fn len(&self) -> usize {
        self.rows.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.read().is_empty()
    }

    fn allocate_id(&self) -> String {
        let rows = self.rows.read();
        loop {
            let id = self.next_id.fetch_add(1, Ordering::Relaxed).to_string();
            if !rows.contains_key(&id) {
                return id;
            }
        }
    }
}

/// Title matches weigh double; other text fields count once per term.
fn relevance(property: &Property, terms: &[&str]) -> u32 {
    let title = property.title.to_lowercase();
    let body = format!(
        "{} {} {}",
        property.description, property.city, property.address
    )
    .to_lowercase();

    terms
        .iter()
        .map(|term| {
            let mut score = 0;
            if title.contains(term) {
                score += 2;
            }
            if body.contains(term) {
                score += 1;
            }
            score
        })
        .sum()
}

fn apply(request: PropertyRequest, property: &mut Property) {
    property.title = request.title;
    property.description = request.description;
    property.price = request.price;
    property.city = request.city;
    property.address = request.address;
    property.property_type = request.property_type;
    property.bedrooms = request.bedrooms;
    property.bathrooms = request.bathrooms;
    property.area_sqm = request.area_sqm;
    property.agency_id = request.agency_id;
}

impl PropertyRepository for InMemoryPropertyRepository {
    fn fetch_by_id(&self, id: &str) -> Result<Option<Property>> {
        Ok(self.rows.read().get(id).cloned())
    }

    fn search(&self, query: &str, limit: usize) -> Result<Vec<Property>> {
        let normalized = normalize_query(query);
        let terms: Vec<&str> = normalized.split_whitespace().collect();
        let rows = self.rows.read();

        let mut ranked: Vec<(u32, &Property)> = rows
            .values()
            .map(|property| {
                let score = if terms.is_empty() {
                    1
                } else {
                    relevance(property, &terms)
                };
                (score, property)
            })
            .filter(|(score, _)| *score > 0)
            .collect();

        ranked.sort_by(|(a_score, a), (b_score, b)| {
            b_score.cmp(a_score).then_with(|| a.id.cmp(&b.id))
        });

        Ok(ranked
            .into_iter()
            .take(limit)
            .map(|(_, property)| property.clone())
            .collect())
    }

    fn compute_statistics(&self) -> Result<PropertyStatistics> {
        Ok(PropertyStatistics::from_properties(self.rows.read().values()))
    }

    fn create(&self, request: PropertyRequest) -> Result<Property> {
        let now = Utc::now();
        let mut property = Property {
            id: self.allocate_id(),
            title: String::new(),
            description: String::new(),
            price: 0.0,
            city: String::new(),
            address: String::new(),
            property_type: String::new(),
            bedrooms: 0,
            bathrooms: 0,
            area_sqm: 0.0,
            agency_id: None,
            created_at: now,
            updated_at: now,
        };
        apply(request, &mut property);

        self.rows
            .write()
            .insert(property.id.clone(), property.clone());
        Ok(property)
    }

    fn update(&self, id: &str, request: PropertyRequest) -> Result<Property> {
        let mut rows = self.rows.write();
        let property = rows
            .get_mut(id)
            .ok_or_else(|| AppError::NotFound(id.to_string()))?;

        apply(request, property);
        property.updated_at = Utc::now();
        Ok(property.clone())
    }

    fn delete(&self, id: &str) -> Result<()> {
        self.rows
            .write()
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::property::fixtures::property;

    fn request(title: &str, city: &str, price: f64) -> PropertyRequest {
        PropertyRequest {
            title: title.to_string(),
            description: String::new(),
            price,
            city: city.to_string(),
            address: String::new(),
            property_type: "house".to_string(),
            bedrooms: 3,
            bathrooms: 2,
            area_sqm: 120.0,
            agency_id: None,
        }
    }

    #[test]
    fn test_create_assigns_fresh_ids() {
        let repo = InMemoryPropertyRepository::new();
        repo.insert(property("1", "Lyon", 1.0));

        let created = repo.create(request("Villa", "Nice", 900.0)).unwrap();

        assert_ne!(created.id, "1");
        assert_eq!(repo.len(), 2);
        assert_eq!(repo.fetch_by_id(&created.id).unwrap(), Some(created));
    }

    #[test]
    fn test_update_and_delete_unknown_id() {
        let repo = InMemoryPropertyRepository::new();
        assert_eq!(
            repo.update("missing", request("x", "y", 1.0)),
            Err(AppError::NotFound("missing".to_string()))
        );
        assert!(matches!(repo.delete("missing"), Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_update_replaces_fields() {
        let repo = InMemoryPropertyRepository::new();
        repo.insert(property("1", "Lyon", 1.0));

        let updated = repo.update("1", request("Renovated", "Lyon", 5.0)).unwrap();

        assert_eq!(updated.title, "Renovated");
        assert_eq!(updated.price, 5.0);
        assert!(updated.updated_at >= updated.created_at);
    }

    #[test]
    fn test_search_ranks_title_matches_first() {
        let repo = InMemoryPropertyRepository::new();
        let mut in_title = property("b", "Lyon", 1.0);
        in_title.title = "Garden house".to_string();
        let mut in_body = property("a", "Lyon", 1.0);
        in_body.description = "Small garden".to_string();
        repo.insert(in_title);
        repo.insert(in_body);
        repo.insert(property("c", "Paris", 1.0));

        let ids: Vec<String> = repo
            .search("GARDEN", 10)
            .unwrap()
            .into_iter()
            .map(|p| p.id)
            .collect();

        assert_eq!(ids, vec!["b", "a"]);
        assert_eq!(repo.search("garden", 1).unwrap().len(), 1);
        assert!(repo.search("castle", 10).unwrap().is_empty());
    }

    #[test]
    fn test_empty_query_lists_everything_by_id() {
        let repo = InMemoryPropertyRepository::new();
        repo.insert(property("2", "Lyon", 1.0));
        repo.insert(property("1", "Lyon", 1.0));

        let ids: Vec<String> = repo.search("  ", 10).unwrap().into_iter().map(|p| p.id).collect();
        assert_eq!(ids, vec!["1", "2"]);
    }

    #[test]
    fn test_compute_statistics() {
        let repo = InMemoryPropertyRepository::new();
        repo.insert(property("1", "Lyon", 100.0));
        repo.insert(property("2", "Nice", 300.0));

        let stats = repo.compute_statistics().unwrap();
        assert_eq!(stats.total_properties, 2);
        assert_eq!(stats.average_price, 200.0);
    }
}
