//! Property Service
//!
//! Read-through access to listings, search results and statistics, with
//! write-through invalidation after every successful repository write.

use std::sync::Arc;

use tracing::{debug, info};

use crate::cache::PropertyCache;
use crate::error::{AppError, Result};
use crate::models::{Property, PropertyRequest, PropertyStatistics};
use crate::service::repository::PropertyRepository;

/// Couples the repository with the property cache.
pub struct PropertyService {
    repository: Arc<dyn PropertyRepository>,
    cache: Arc<PropertyCache>,
}

impl PropertyService {
    pub fn new(repository: Arc<dyn PropertyRepository>, cache: Arc<PropertyCache>) -> Self {
        Self { repository, cache }
    }

    pub fn cache(&self) -> &Arc<PropertyCache> {
        &self.cache
    }

    // == Reads ==
    // Each read captures the cache generation before touching the
    // repository, so a row read before a concurrent write commits is never
    // cached after that write's invalidation.
    pub fn get_property(&self, id: &str) -> Result<Property> {
        if let Some(property) = self.cache.get_property(id) {
            return Ok(property);
        }

        let generation = self.cache.generation();
        let property = self
            .repository
            .fetch_by_id(id)?
            .ok_or_else(|| AppError::NotFound(id.to_string()))?;
        if !self.cache.fill_property(&property, generation) {
            debug!(id, "Listing served without caching");
        }
        Ok(property)
    }

    pub fn search(&self, query: &str, limit: usize) -> Result<Vec<Property>> {
        if let Some(results) = self.cache.get_search_results(query, limit) {
            return Ok(results);
        }

        let generation = self.cache.generation();
        let results = self.repository.search(query, limit)?;
        debug!(query, limit, count = results.len(), "Search results loaded");
        self.cache
            .fill_search_results(query, limit, &results, generation);
        Ok(results)
    }

    pub fn statistics(&self) -> Result<PropertyStatistics> {
        if let Some(statistics) = self.cache.get_statistics() {
            return Ok(statistics);
        }

        let generation = self.cache.generation();
        let statistics = self.repository.compute_statistics()?;
        self.cache.fill_statistics(&statistics, generation);
        Ok(statistics)
    }

    // == Writes ==
    pub fn create(&self, request: PropertyRequest) -> Result<Property> {
        let property = self.repository.create(request)?;
        self.invalidate_after_write(&property.id);
        info!(id = %property.id, "Property created");
        Ok(property)
    }

    pub fn update(&self, id: &str, request: PropertyRequest) -> Result<Property> {
        let property = self.repository.update(id, request)?;
        self.invalidate_after_write(id);
        info!(id, "Property updated");
        Ok(property)
    }

    pub fn delete(&self, id: &str) -> Result<()> {
        self.repository.delete(id)?;
        self.invalidate_after_write(id);
        info!(id, "Property deleted");
        Ok(())
    }

    /// Drops the listing, the statistics and every cached search page.
    fn invalidate_after_write(&self, id: &str) {
        self.cache.invalidate_property(id);
        let searches = self.cache.clear_search_results();
        debug!(id, searches, "Invalidated cached listing data");
    }
}
