use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use crate::models::domain::{CateringRecommendations, PlanResult, VenueRecommendations};

/// Response for the plan-event endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanEventResponse {
    pub venues: VenueRecommendations,
    pub catering: Vec<CateringRecommendations>,
    pub status: String,
}

impl From<PlanResult> for PlanEventResponse {
    fn from(result: PlanResult) -> Self {
        Self {
            venues: result.venues,
            catering: result.catering,
            status: "success".to_string(),
        }
    }
}

/// Liveness response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
    pub message: String,
    pub version: String,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub services: BTreeMap<String, String>,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}
