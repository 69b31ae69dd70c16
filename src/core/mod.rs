// Planning stages, leaf first
pub mod extract;
pub mod pipeline;
pub mod place_query;
pub mod ranking;
pub mod serializer;

pub use extract::{ExtractionError, ExtractionMode, ResponseExtractor};
pub use pipeline::{PipelineError, PlannerPipeline, DEFAULT_RADIUS_M, DEFAULT_RESULT_COUNT};
pub use place_query::{PlaceQueryClient, PlaceQueryError};
pub use ranking::{covers_dietary_preferences, is_confirmation_note, RankingAgent, RankingError};
pub use serializer::{CuisinePolicy, FieldSerializer, SerializerError};
