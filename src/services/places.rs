use async_trait::async_trait;
use geo::Point;
use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur when calling the places provider
#[derive(Debug, Error)]
pub enum PlacesError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Places API returned {status}: {message}")]
    ApiError { status: String, message: String },

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl From<LatLng> for Point<f64> {
    fn from(value: LatLng) -> Self {
        Point::new(value.lng, value.lat)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Geometry {
    pub location: LatLng,
}

/// Raw search hit as returned by a text search
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PlaceHit {
    pub place_id: Option<String>,
    #[serde(default)]
    pub name: String,
    pub formatted_address: Option<String>,
    #[serde(default)]
    pub types: Vec<String>,
    pub rating: Option<f64>,
    pub price_level: Option<u8>,
    pub vicinity: Option<String>,
    pub geometry: Option<Geometry>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct OpeningHours {
    pub weekday_text: Option<Vec<String>>,
}

/// Contact and hours details for a single place
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PlaceDetails {
    pub formatted_phone_number: Option<String>,
    pub website: Option<String>,
    pub opening_hours: Option<OpeningHours>,
}

/// Geocoding, text search and details lookups
#[async_trait]
pub trait PlacesProvider: Send + Sync {
    /// Resolve an address to the coordinates of its first match
    async fn geocode(&self, address: &str) -> Result<Option<Point<f64>>, PlacesError>;

    async fn text_search(
        &self,
        query: &str,
        center: Point<f64>,
        radius_m: u32,
    ) -> Result<Vec<PlaceHit>, PlacesError>;

    async fn place_details(&self, place_id: &str) -> Result<PlaceDetails, PlacesError>;
}
