//! Event Planner - turns a free-text event description into ranked venues and caterers
//!
//! The planning pipeline chains three external services:
//! a small language model that extracts structured fields from the prompt,
//! Google Maps for geocoding and place search,
//! and a larger language model that ranks and annotates the candidates.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use crate::core::{
    FieldSerializer, PipelineError, PlaceQueryClient, PlannerPipeline, RankingAgent,
    ResponseExtractor,
};
pub use crate::models::{EventRequest, EventType, PlaceRecord, PlanResult};
