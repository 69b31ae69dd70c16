use crate::services::places::{Geometry, PlaceDetails, PlaceHit, PlacesError, PlacesProvider};
use async_trait::async_trait;
use geo::Point;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

const DETAIL_FIELDS: &str = "formatted_phone_number,website,opening_hours";

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    geometry: Geometry,
}

/// Envelope shared by the Maps web-service responses
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    status: String,
    error_message: Option<String>,
    results: Option<Vec<T>>,
    result: Option<T>,
}

/// Google Maps web-service client (Geocoding, Places Text Search, Place Details)
pub struct GoogleMapsClient {
    base_url: String,
    api_key: String,
    client: Client,
}

impl GoogleMapsClient {
    /// Create a new Google Maps client
    pub fn new(base_url: String, api_key: String, timeout_secs: u64) -> Result<Self, PlacesError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self {
            base_url,
            api_key,
            client,
        })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, query: &str) -> Result<Envelope<T>, PlacesError> {
        let url = format!(
            "{}/{}?{}&key={}",
            self.base_url.trim_end_matches('/'),
            path,
            query,
            urlencoding::encode(&self.api_key)
        );

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(PlacesError::ApiError {
                status: response.status().to_string(),
                message: format!("HTTP error from {}", path),
            });
        }

        let envelope: Envelope<T> = response
            .json()
            .await
            .map_err(|e| PlacesError::InvalidResponse(format!("Failed to parse {}: {}", path, e)))?;

        match envelope.status.as_str() {
            "OK" | "ZERO_RESULTS" => Ok(envelope),
            _ => Err(PlacesError::ApiError {
                status: envelope.status.clone(),
                message: envelope
                    .error_message
                    .clone()
                    .unwrap_or_else(|| format!("{} request rejected", path)),
            }),
        }
    }
}

#[async_trait]
impl PlacesProvider for GoogleMapsClient {
    async fn geocode(&self, address: &str) -> Result<Option<Point<f64>>, PlacesError> {
        let query = format!("address={}", urlencoding::encode(address));
        let envelope: Envelope<GeocodeResult> = self.get("geocode/json", &query).await?;

        Ok(envelope
            .results
            .unwrap_or_default()
            .into_iter()
            .next()
            .map(|first| first.geometry.location.into()))
    }

    async fn text_search(
        &self,
        query: &str,
        center: Point<f64>,
        radius_m: u32,
    ) -> Result<Vec<PlaceHit>, PlacesError> {
        let params = format!(
            "query={}&location={},{}&radius={}",
            urlencoding::encode(query),
            center.y(),
            center.x(),
            radius_m
        );
        let envelope: Envelope<PlaceHit> = self.get("place/textsearch/json", &params).await?;

        let hits = envelope.results.unwrap_or_default();
        tracing::debug!("Text search '{}' returned {} hits", query, hits.len());
        Ok(hits)
    }

    async fn place_details(&self, place_id: &str) -> Result<PlaceDetails, PlacesError> {
        let params = format!(
            "place_id={}&fields={}",
            urlencoding::encode(place_id),
            DETAIL_FIELDS
        );
        let envelope: Envelope<PlaceDetails> = self.get("place/details/json", &params).await?;

        Ok(envelope.result.unwrap_or_default())
    }
}
