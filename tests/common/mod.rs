// Shared stub providers for the integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use event_planner::core::{
    CuisinePolicy, FieldSerializer, PlaceQueryClient, PlannerPipeline, RankingAgent,
    ResponseExtractor,
};
use event_planner::services::{
    CompletionError, CompletionProvider, CompletionRequest, PlaceDetails, PlaceHit, PlacesError,
    PlacesProvider,
};
use geo::Point;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const SERIALIZER_MODEL: &str = "test/serializer";
pub const RANKING_MODEL: &str = "test/ranking";

/// Language model stub: a fixed serializer reply, ranking replies echo the
/// cuisine found in the catering payload so ordering can be checked
pub struct StubModel {
    serializer_reply: String,
    pub requests: Mutex<Vec<CompletionRequest>>,
}

impl StubModel {
    pub fn new(serializer_reply: &str) -> Arc<Self> {
        Arc::new(Self {
            serializer_reply: serializer_reply.to_string(),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn ranking_prompts(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.model == RANKING_MODEL)
            .map(|r| r.system_prompt.clone())
            .collect()
    }

    pub fn catering_prompts(&self) -> Vec<String> {
        self.ranking_prompts()
            .into_iter()
            .filter(|p| p.contains("CATERING OPTIONS"))
            .collect()
    }
}

#[async_trait]
impl CompletionProvider for StubModel {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
        self.requests.lock().unwrap().push(request.clone());

        if request.model == SERIALIZER_MODEL {
            return Ok(self.serializer_reply.clone());
        }

        let (_, payload) = request
            .system_prompt
            .split_once("Data:\n\n")
            .ok_or(CompletionError::EmptyResponse)?;
        let payload: serde_json::Value =
            serde_json::from_str(payload).map_err(|_| CompletionError::EmptyResponse)?;

        if let Some(candidates) = payload["catering"].as_array() {
            let names: Vec<serde_json::Value> = candidates
                .iter()
                .map(|c| serde_json::json!({"name": c["name"], "why_recommended": "Nearby", "notes": []}))
                .collect();
            return Ok(format!(
                "<think>ranking</think>\n```json\n{}\n```",
                serde_json::json!({"recommended_catering": names, "general_notes": []})
            ));
        }

        Ok("```json\n{\"recommended_venues\": [{\"name\": \"Community Hall\", \"why_recommended\": \"Large\", \"notes\": [\"Confirm capacity\"]}], \"general_notes\": []}\n```".to_string())
    }
}

/// Places stub: every search returns one hit named after the query
#[derive(Default)]
pub struct StubMaps {
    pub fail: bool,
    pub geocode_calls: AtomicUsize,
    pub searches: Mutex<Vec<String>>,
}

impl StubMaps {
    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            fail: true,
            ..Default::default()
        })
    }

    pub fn search_queries(&self) -> Vec<String> {
        self.searches.lock().unwrap().clone()
    }

    pub fn geocodes(&self) -> usize {
        self.geocode_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PlacesProvider for StubMaps {
    async fn geocode(&self, _address: &str) -> Result<Option<Point<f64>>, PlacesError> {
        self.geocode_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(PlacesError::InvalidResponse("maps unavailable".to_string()));
        }
        Ok(Some(Point::new(-122.4194, 37.7749)))
    }

    async fn text_search(
        &self,
        query: &str,
        _center: Point<f64>,
        _radius_m: u32,
    ) -> Result<Vec<PlaceHit>, PlacesError> {
        self.searches.lock().unwrap().push(query.to_string());
        Ok(vec![PlaceHit {
            place_id: Some(format!("id-{}", query)),
            name: query.to_string(),
            rating: Some(4.5),
            ..Default::default()
        }])
    }

    async fn place_details(&self, _place_id: &str) -> Result<PlaceDetails, PlacesError> {
        Ok(PlaceDetails::default())
    }
}

pub struct Harness {
    pub model: Arc<StubModel>,
    pub maps: Arc<StubMaps>,
    pub pipeline: PlannerPipeline,
}

pub fn harness(serializer_reply: &str, maps: Arc<StubMaps>, policy: CuisinePolicy, parallel: bool) -> Harness {
    let model = StubModel::new(serializer_reply);

    let pipeline = PlannerPipeline::new(
        FieldSerializer::new(
            model.clone(),
            SERIALIZER_MODEL,
            ResponseExtractor::lenient(),
            policy,
            "American",
        ),
        PlaceQueryClient::new(maps.clone(), "halal"),
        RankingAgent::new(model.clone(), RANKING_MODEL, ResponseExtractor::strict()),
        parallel,
    );

    Harness {
        model,
        maps,
        pipeline,
    }
}

pub fn serialized(cuisines: &[&str], dietary: &[&str]) -> String {
    serde_json::json!({
        "location": "San Francisco",
        "event_type": "Wedding",
        "budget": "30000",
        "min_head_count": 200,
        "max_head_count": 200,
        "cuisines": cuisines,
        "dietary_preferences": dietary,
        "other_requirements": []
    })
    .to_string()
}
