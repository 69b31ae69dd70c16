use crate::models::{is_unknown, PlaceRecord};
use crate::services::{PlaceDetails, PlaceHit, PlacesProvider};
use geo::{HaversineDistance, Point};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlaceQueryError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// Searches venues and caterers around a location and enriches each hit
pub struct PlaceQueryClient {
    provider: Arc<dyn PlacesProvider>,
    dietary_qualifier: String,
}

impl PlaceQueryClient {
    pub fn new(provider: Arc<dyn PlacesProvider>, dietary_qualifier: impl Into<String>) -> Self {
        Self {
            provider,
            dietary_qualifier: dietary_qualifier.into(),
        }
    }

    /// Search venues matching `type_query` (usually the event type name)
    pub async fn query_venues(
        &self,
        location: &str,
        type_query: &str,
        limit: usize,
        radius_m: u32,
    ) -> Result<Vec<PlaceRecord>, PlaceQueryError> {
        self.query(location, type_query, limit, radius_m).await
    }

    /// Search caterers for one cuisine, qualified by the dietary qualifier
    pub async fn query_catering(
        &self,
        location: &str,
        cuisine: &str,
        limit: usize,
        radius_m: u32,
    ) -> Result<Vec<PlaceRecord>, PlaceQueryError> {
        let query = self.catering_query(cuisine);
        self.query(location, &query, limit, radius_m).await
    }

    pub fn catering_query(&self, cuisine: &str) -> String {
        let qualifier = self.dietary_qualifier.trim();
        if qualifier.is_empty() {
            format!("{} catering", cuisine.trim())
        } else {
            format!("{} {} catering", qualifier, cuisine.trim())
        }
    }

    /// Geocode, text search, truncate and enrich.
    ///
    /// Upstream failures are logged and yield an empty list so one bad lookup
    /// does not sink the whole plan.
    async fn query(
        &self,
        location: &str,
        query: &str,
        limit: usize,
        radius_m: u32,
    ) -> Result<Vec<PlaceRecord>, PlaceQueryError> {
        if limit == 0 {
            return Err(PlaceQueryError::InvalidArgument(
                "result count must be a positive integer".to_string(),
            ));
        }

        if is_unknown(location) {
            tracing::warn!("Location is unknown, skipping search for '{}'", query);
            return Ok(Vec::new());
        }

        let center = match self.provider.geocode(location).await {
            Ok(Some(center)) => center,
            Ok(None) => {
                tracing::warn!("No geocoding match for '{}'", location);
                return Ok(Vec::new());
            }
            Err(e) => {
                tracing::warn!("Geocoding '{}' failed: {}", location, e);
                return Ok(Vec::new());
            }
        };

        let hits = match self.provider.text_search(query, center, radius_m).await {
            Ok(hits) => hits,
            Err(e) => {
                tracing::warn!("Place search '{}' near '{}' failed: {}", query, location, e);
                return Ok(Vec::new());
            }
        };

        let mut records = Vec::with_capacity(limit.min(hits.len()));
        for hit in hits.into_iter().take(limit) {
            let details = self.details_for(&hit).await;
            records.push(to_record(hit, details, center));
        }

        tracing::info!(
            "Found {} places for '{}' within {}m of '{}'",
            records.len(),
            query,
            radius_m,
            location
        );
        Ok(records)
    }

    async fn details_for(&self, hit: &PlaceHit) -> PlaceDetails {
        let Some(place_id) = hit.place_id.as_deref() else {
            return PlaceDetails::default();
        };

        match self.provider.place_details(place_id).await {
            Ok(details) => details,
            Err(e) => {
                tracing::debug!("Details lookup for '{}' failed: {}", hit.name, e);
                PlaceDetails::default()
            }
        }
    }
}

fn to_record(hit: PlaceHit, details: PlaceDetails, center: Point<f64>) -> PlaceRecord {
    let distance_km = hit.geometry.as_ref().map(|geometry| {
        let point: Point<f64> = geometry.location.into();
        round_km(center.haversine_distance(&point) / 1000.0)
    });

    PlaceRecord {
        name: hit.name,
        address: hit.formatted_address,
        types: hit.types,
        rating: hit.rating,
        price_level: hit.price_level,
        vicinity: hit.vicinity,
        phone_number: details.formatted_phone_number,
        website: details.website,
        opening_hours: details.opening_hours.and_then(|hours| hours.weekday_text),
        distance_km,
    }
}

fn round_km(km: f64) -> f64 {
    (km * 100.0).round() / 100.0
}
