use serde::{Deserialize, Serialize};
use validator::Validate;

/// Request to plan an event
///
/// `result_count` and `radius` are signed so that zero and negative values
/// reach validation instead of failing deserialization.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PlanEventRequest {
    #[validate(length(min = 1))]
    pub prompt: String,
    #[serde(default)]
    #[validate(range(min = 1))]
    pub result_count: Option<i64>,
    #[serde(default)]
    #[validate(range(min = 1, max = 50000))]
    pub radius: Option<i64>,
}
