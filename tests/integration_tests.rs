// Integration tests for the planning pipeline

mod common;

use common::{harness, serialized, StubMaps};
use event_planner::core::{covers_dietary_preferences, CuisinePolicy, PipelineError};
use std::sync::Arc;

fn data_section(prompt: &str) -> serde_json::Value {
    let (_, payload) = prompt.split_once("Data:\n\n").unwrap();
    let payload: serde_json::Value = serde_json::from_str(payload).unwrap();
    payload["data"].clone()
}

#[tokio::test]
async fn test_one_catering_query_and_ranking_per_cuisine() {
    let h = harness(
        &serialized(&["Pakistani", "Arab", "Turkish"], &[]),
        Arc::new(StubMaps::default()),
        CuisinePolicy::DefaultCuisine,
        false,
    );

    let plan = h.pipeline.plan("wedding", 15, 20000).await.unwrap();

    assert_eq!(
        h.maps.search_queries(),
        vec![
            "halal Pakistani catering",
            "halal Arab catering",
            "halal Turkish catering",
            "Wedding",
        ]
    );
    assert_eq!(h.model.catering_prompts().len(), 3);
    assert_eq!(h.model.ranking_prompts().len(), 4);

    let names: Vec<&str> = plan
        .catering
        .iter()
        .map(|set| set.recommended_catering[0].name.as_str())
        .collect();
    assert_eq!(
        names,
        vec!["halal Pakistani catering", "halal Arab catering", "halal Turkish catering"]
    );
    assert_eq!(plan.venues.recommended_venues[0].name, "Community Hall");
}

#[tokio::test]
async fn test_parallel_cuisines_keep_order() {
    let cuisines = ["Thai", "Somali", "Mexican", "Lebanese", "Ethiopian"];
    let h = harness(
        &serialized(&cuisines, &[]),
        Arc::new(StubMaps::default()),
        CuisinePolicy::DefaultCuisine,
        true,
    );

    let plan = h.pipeline.plan("party", 5, 10000).await.unwrap();

    assert_eq!(plan.catering.len(), cuisines.len());
    for (set, cuisine) in plan.catering.iter().zip(cuisines) {
        assert_eq!(
            set.recommended_catering[0].name,
            format!("halal {} catering", cuisine)
        );
    }
}

#[tokio::test]
async fn test_requirements_shared_by_every_ranking_call() {
    let h = harness(
        &serialized(&["Pakistani", "Arab"], &["halal"]),
        Arc::new(StubMaps::default()),
        CuisinePolicy::DefaultCuisine,
        false,
    );

    h.pipeline.plan("wedding", 15, 20000).await.unwrap();

    let prompts = h.model.ranking_prompts();
    let first = data_section(&prompts[0]);
    assert_eq!(first["event_type"], "Wedding");
    assert_eq!(first["budget"], "30000");
    for prompt in &prompts[1..] {
        assert_eq!(data_section(prompt), first);
    }
}

#[tokio::test]
async fn test_dietary_preferences_force_confirmation_notes() {
    let h = harness(
        &serialized(&["Pakistani", "Arab"], &["halal", "dairy-free"]),
        Arc::new(StubMaps::default()),
        CuisinePolicy::DefaultCuisine,
        false,
    );

    let plan = h.pipeline.plan("wedding", 15, 20000).await.unwrap();

    for set in &plan.catering {
        assert!(!set.recommended_catering.is_empty());
        for recommendation in &set.recommended_catering {
            assert!(covers_dietary_preferences(
                &recommendation.notes,
                &["halal".to_string(), "dairy-free".to_string()]
            ));
            assert!(recommendation.notes[0].contains("halal, dairy-free"));
        }
    }
}

#[tokio::test]
async fn test_missing_cuisine_policy() {
    let reply = r#"{"location": "Boston", "event_type": "Party", "cuisines": "unknown"}"#;

    let h = harness(reply, Arc::new(StubMaps::default()), CuisinePolicy::DefaultCuisine, false);
    let plan = h.pipeline.plan("party", 15, 20000).await.unwrap();
    assert_eq!(plan.catering.len(), 1);
    assert!(h.maps.search_queries().contains(&"halal American catering".to_string()));

    let h = harness(reply, Arc::new(StubMaps::default()), CuisinePolicy::StrictUnknown, false);
    let plan = h.pipeline.plan("party", 15, 20000).await.unwrap();
    assert!(plan.catering.is_empty());
    assert_eq!(h.maps.search_queries(), vec!["Party"]);
    assert!(h.model.catering_prompts().is_empty());
}

#[tokio::test]
async fn test_serializer_failure_stops_pipeline() {
    let h = harness(
        "I'm sorry, I can't parse that.",
        Arc::new(StubMaps::default()),
        CuisinePolicy::DefaultCuisine,
        false,
    );

    let err = h.pipeline.plan("???", 15, 20000).await.unwrap_err();

    assert!(matches!(err, PipelineError::Serialization(_)));
    assert!(err.to_string().starts_with("Pipeline planning failed:"));
    assert_eq!(h.maps.geocodes(), 0);
    assert!(h.model.ranking_prompts().is_empty());
}

#[tokio::test]
async fn test_empty_serialization_is_pipeline_error() {
    let h = harness("```json\n{}\n```", Arc::new(StubMaps::default()), CuisinePolicy::DefaultCuisine, false);

    let err = h.pipeline.plan("hello", 15, 20000).await.unwrap_err();
    assert!(matches!(err, PipelineError::Serialization(_)));
}

#[tokio::test]
async fn test_places_outage_degrades_to_empty_candidates() {
    let h = harness(
        &serialized(&["Pakistani"], &[]),
        StubMaps::failing(),
        CuisinePolicy::DefaultCuisine,
        false,
    );

    let plan = h.pipeline.plan("wedding", 15, 20000).await.unwrap();

    assert_eq!(plan.catering.len(), 1);
    assert!(plan.catering[0].recommended_catering.is_empty());
    assert_eq!(h.maps.geocodes(), 2);
}

#[tokio::test]
async fn test_unknown_location_skips_places() {
    let reply = r#"{"location": "unknown", "event_type": "Iftar", "cuisines": ["Arab"]}"#;
    let h = harness(reply, Arc::new(StubMaps::default()), CuisinePolicy::DefaultCuisine, false);

    let plan = h.pipeline.plan("iftar", 15, 20000).await.unwrap();

    assert_eq!(h.maps.geocodes(), 0);
    assert_eq!(plan.catering.len(), 1);
}

#[tokio::test]
async fn test_zero_result_count_is_invalid_argument() {
    let h = harness(
        &serialized(&["Arab"], &[]),
        Arc::new(StubMaps::default()),
        CuisinePolicy::DefaultCuisine,
        false,
    );

    let err = h.pipeline.plan("wedding", 0, 20000).await.unwrap_err();

    assert!(matches!(err, PipelineError::PlaceQuery(_)));
    assert_eq!(h.maps.geocodes(), 0);
}
