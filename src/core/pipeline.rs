use crate::core::place_query::{PlaceQueryClient, PlaceQueryError};
use crate::core::ranking::{RankingAgent, RankingError};
use crate::core::serializer::{FieldSerializer, SerializerError};
use crate::models::{CateringRecommendations, EventRequest, PlaceRecord, PlanResult, RankingRequirements};
use futures::future::try_join_all;
use std::time::Instant;
use thiserror::Error;
use tracing::Instrument;
use uuid::Uuid;

/// Places fetched per search when the caller does not say
pub const DEFAULT_RESULT_COUNT: usize = 15;
/// Search radius in meters when the caller does not say
pub const DEFAULT_RADIUS_M: u32 = 20_000;

/// Any failure of a planning run, wrapping the stage that caused it
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Pipeline planning failed: {0}")]
    Serialization(#[from] SerializerError),

    #[error("Pipeline planning failed: {0}")]
    PlaceQuery(#[from] PlaceQueryError),

    #[error("Pipeline planning failed: {0}")]
    Ranking(#[from] RankingError),
}

/// Orchestrates serialize -> query places -> rank for one prompt
///
/// # Pipeline Stages
/// 1. Serialize the prompt into an [`EventRequest`]
/// 2. Query caterers once per cuisine
/// 3. Query venues for the event type
/// 4. Rank venues once, then each cuisine's caterers
pub struct PlannerPipeline {
    serializer: FieldSerializer,
    place_query: PlaceQueryClient,
    ranking: RankingAgent,
    parallel_cuisines: bool,
}

impl PlannerPipeline {
    pub fn new(
        serializer: FieldSerializer,
        place_query: PlaceQueryClient,
        ranking: RankingAgent,
        parallel_cuisines: bool,
    ) -> Self {
        Self {
            serializer,
            place_query,
            ranking,
            parallel_cuisines,
        }
    }

    /// Plan an event from a natural-language description
    ///
    /// # Arguments
    /// * `prompt` - Free-text event description
    /// * `result_count` - Places fetched per search
    /// * `radius_m` - Search radius around the geocoded location
    ///
    /// # Returns
    /// Ranked venues plus one catering set per cuisine, in cuisine order
    pub async fn plan(
        &self,
        prompt: &str,
        result_count: usize,
        radius_m: u32,
    ) -> Result<PlanResult, PipelineError> {
        let span = tracing::info_span!("plan", plan_id = %Uuid::new_v4());

        async move {
            let start_time = Instant::now();
            let result = self.run(prompt, result_count, radius_m).await;

            match &result {
                Ok(plan) => tracing::info!(
                    "Plan finished in {:.2?} with {} catering sets",
                    start_time.elapsed(),
                    plan.catering.len()
                ),
                Err(e) => tracing::error!("{} (after {:.2?})", e, start_time.elapsed()),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn run(
        &self,
        prompt: &str,
        result_count: usize,
        radius_m: u32,
    ) -> Result<PlanResult, PipelineError> {
        let event = self.serializer.serialize(prompt).await?;
        tracing::info!(
            "Serialized prompt: {}",
            serde_json::to_string(&event).unwrap_or_else(|_| format!("{:?}", event))
        );

        let catering_candidates = self
            .query_catering(&event, result_count, radius_m)
            .await?;

        let venue_candidates = self
            .place_query
            .query_venues(&event.location, event.event_type.venue_query(), result_count, radius_m)
            .await?;

        tracing::info!(
            "Queried {} venues and {:?} caterers per cuisine",
            venue_candidates.len(),
            catering_candidates.iter().map(Vec::len).collect::<Vec<_>>()
        );

        let requirements = RankingRequirements::from(&event);

        let venues = self
            .ranking
            .rank_venues(&requirements, &venue_candidates)
            .await?;
        let catering = self
            .rank_catering(&requirements, &catering_candidates)
            .await?;

        Ok(PlanResult { venues, catering })
    }

    async fn query_catering(
        &self,
        event: &EventRequest,
        limit: usize,
        radius_m: u32,
    ) -> Result<Vec<Vec<PlaceRecord>>, PlaceQueryError> {
        if self.parallel_cuisines {
            return try_join_all(event.cuisines.iter().map(|cuisine| {
                self.place_query
                    .query_catering(&event.location, cuisine, limit, radius_m)
            }))
            .await;
        }

        let mut lists = Vec::with_capacity(event.cuisines.len());
        for cuisine in &event.cuisines {
            lists.push(
                self.place_query
                    .query_catering(&event.location, cuisine, limit, radius_m)
                    .await?,
            );
        }
        Ok(lists)
    }

    async fn rank_catering(
        &self,
        requirements: &RankingRequirements,
        candidate_lists: &[Vec<PlaceRecord>],
    ) -> Result<Vec<CateringRecommendations>, RankingError> {
        if self.parallel_cuisines {
            return try_join_all(
                candidate_lists
                    .iter()
                    .map(|candidates| self.ranking.rank_catering(requirements, candidates)),
            )
            .await;
        }

        let mut ranked = Vec::with_capacity(candidate_lists.len());
        for candidates in candidate_lists {
            ranked.push(self.ranking.rank_catering(requirements, candidates).await?);
        }
        Ok(ranked)
    }
}
