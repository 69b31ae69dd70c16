// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    CateringRecommendations, EventRequest, EventType, HeadCount, PlaceRecord, PlanResult,
    RankingRequirements, Recommendation, VenueRecommendations, ALLOWED_REQUIREMENTS, UNKNOWN,
};
pub use domain::{is_unknown, normalize_budget};
pub use requests::PlanEventRequest;
pub use responses::{ErrorResponse, HealthResponse, PlanEventResponse, StatusResponse};
