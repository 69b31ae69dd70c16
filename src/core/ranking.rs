use crate::core::extract::{ExtractionError, ResponseExtractor};
use crate::models::{
    CateringRecommendations, PlaceRecord, RankingRequirements, Recommendation, VenueRecommendations,
};
use crate::services::{CompletionError, CompletionProvider, CompletionRequest};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RankingError {
    #[error("Failed to rank candidates: {0}")]
    Completion(#[from] CompletionError),

    #[error("Failed to rank candidates: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("Failed to encode ranking payload: {0}")]
    Payload(#[from] serde_json::Error),
}

const VENUE_RUBRIC: &str = r#"You are an AI event planning assistant for a local mosque or community center.

Your task is to evaluate and rank possible EVENT VENUES based on the event requirements and the venue data provided.

You will be given:
1. Event requirements (event type, headcount, budget, dietary preferences, other requirements)
2. A list of venue candidates sourced from Google Maps, each with structured fields

Your responsibilities:
- Compare venues against each other
- Rank the venues from most suitable to least suitable
- Select the TOP 3-5 venues only
- Do NOT invent facts that are not present in the input
- If information is missing or unclear, explicitly note that it needs confirmation

Evaluation criteria (use all that apply):
- Suitability for the event type
- Likely capacity based on venue type and context
- Rating and number of reviews
- Location relevance (distance_km is the distance from the requested location)
- Price level if available
- Explicitly mentioned user requirements only

Important rules:
- Do NOT assume availability of AV equipment, stage, or accessibility unless stated
- If a venue is a community hall, mosque hall, or conference center, you may say "likely suitable" but must add a confirmation note
- Do NOT infer dietary details for venues unless explicitly mentioned
- If headcount suitability is unclear, flag it

Return ONLY valid JSON in the following format, inside a ```json code block, with no additional text:

{
  "recommended_venues": [
    {
      "name": "string",
      "address": "string",
      "rating": number | null,
      "price_level": number | null,
      "why_recommended": "string",
      "notes": ["string"]
    }
  ],
  "general_notes": ["string"]
}

Be concise, realistic, and conservative in your recommendations."#;

const CATERING_RUBRIC: &str = r#"You are an AI event planning assistant for a local mosque or community center.

Your task is to evaluate and rank possible CATERING OPTIONS based on the event requirements and the catering data provided.

You will be given:
1. Event requirements (event type, headcount, budget, dietary preferences, other requirements)
2. A list of catering candidates sourced from Google Maps, each with structured fields

Your responsibilities:
* Compare catering options against each other
* Rank the catering options from most suitable to least suitable
* Select the TOP 3-5 catering options only
* Do NOT invent menu items or services
* Treat dietary preferences as STRICT requirements

Dietary rules:
* If "halal" is listed, the caterer must explicitly appear halal-friendly or be flagged for confirmation
* If multiple dietary preferences exist (e.g., halal + dairy-free), always note that confirmation is required
* Never assume allergy handling or cross-contamination safety

Evaluation criteria:
* Alignment with dietary preferences
* Rating and number of reviews
* Catering-specific keywords or context
* Location relevance (distance_km is the distance from the requested location)
* Price level if available

Important rules:
* Do NOT claim a caterer supports a dietary restriction unless explicitly stated or strongly implied by name/category
* Always include a confirmation note for dietary restrictions
* If headcount suitability or pricing is unclear, note it

Return ONLY valid JSON in the following format, inside a ```json code block, with no additional text:

{
  "recommended_catering": [
    {
      "name": "string",
      "address": "string",
      "rating": number | null,
      "price_level": number | null,
      "why_recommended": "string",
      "dietary_support": ["string"],
      "notes": ["string"]
    }
  ],
  "general_notes": ["string"]
}

Be cautious, transparent, and realistic."#;

#[derive(Serialize)]
struct VenuePayload<'a> {
    venues: &'a [PlaceRecord],
    data: &'a RankingRequirements,
}

#[derive(Serialize)]
struct CateringPayload<'a> {
    catering: &'a [PlaceRecord],
    data: &'a RankingRequirements,
}

/// Ranks and annotates candidates with the large model
pub struct RankingAgent {
    provider: Arc<dyn CompletionProvider>,
    model: String,
    extractor: ResponseExtractor,
}

impl RankingAgent {
    pub fn new(
        provider: Arc<dyn CompletionProvider>,
        model: impl Into<String>,
        extractor: ResponseExtractor,
    ) -> Self {
        Self {
            provider,
            model: model.into(),
            extractor,
        }
    }

    /// Rank venue candidates against the event requirements
    pub async fn rank_venues(
        &self,
        requirements: &RankingRequirements,
        candidates: &[PlaceRecord],
    ) -> Result<VenueRecommendations, RankingError> {
        let payload = serde_json::to_string(&VenuePayload {
            venues: candidates,
            data: requirements,
        })?;

        let raw = self.complete(VENUE_RUBRIC, &payload).await?;
        let ranked: VenueRecommendations = self.extractor.extract_as(&raw)?;

        tracing::info!(
            "Ranked {} venue candidates into {} recommendations",
            candidates.len(),
            ranked.recommended_venues.len()
        );
        Ok(ranked)
    }

    /// Rank one cuisine's caterers against the event requirements
    ///
    /// When dietary preferences are present every recommendation is
    /// guaranteed to carry a confirmation note.
    pub async fn rank_catering(
        &self,
        requirements: &RankingRequirements,
        candidates: &[PlaceRecord],
    ) -> Result<CateringRecommendations, RankingError> {
        let payload = serde_json::to_string(&CateringPayload {
            catering: candidates,
            data: requirements,
        })?;

        let raw = self.complete(CATERING_RUBRIC, &payload).await?;
        let mut ranked: CateringRecommendations = self.extractor.extract_as(&raw)?;

        if !requirements.dietary_preferences.is_empty() {
            for recommendation in &mut ranked.recommended_catering {
                ensure_confirmation_note(recommendation, &requirements.dietary_preferences);
            }
        }

        tracing::info!(
            "Ranked {} catering candidates into {} recommendations",
            candidates.len(),
            ranked.recommended_catering.len()
        );
        Ok(ranked)
    }

    async fn complete(&self, rubric: &str, payload: &str) -> Result<String, CompletionError> {
        tracing::debug!("Ranking payload: {}", payload);
        let instruction = format!("{}\n\nData:\n\n{}", rubric, payload);
        self.provider
            .complete(&CompletionRequest::system(&self.model, instruction))
            .await
    }
}

/// Leading verbs that turn a note into a request to check something
const REQUEST_VERBS: [&str; 5] = ["confirm", "verify", "check", "ask", "please"];
const REQUEST_PHRASES: [&str; 8] = [
    "needs confirmation",
    "requires confirmation",
    "to be confirmed",
    "not confirmed",
    "unconfirmed",
    "needs verification",
    "requires verification",
    "must be verified",
];

/// Whether a note asks for something to be confirmed or verified.
///
/// "Confirm halal options" qualifies, "Reviews confirm the meat is halal"
/// and "Confirmed halal" do not.
pub fn is_confirmation_note(note: &str) -> bool {
    let lower = note.trim().to_lowercase();
    let first_word = lower
        .split(|c: char| !c.is_alphabetic())
        .find(|word| !word.is_empty())
        .unwrap_or_default();

    REQUEST_VERBS.contains(&first_word)
        || REQUEST_PHRASES.iter().any(|phrase| lower.contains(phrase))
}

/// Whether every dietary preference is named by some confirmation note
pub fn covers_dietary_preferences(notes: &[String], preferences: &[String]) -> bool {
    let requests: Vec<String> = notes
        .iter()
        .filter(|note| is_confirmation_note(note))
        .map(|note| note.to_lowercase())
        .collect();

    preferences.iter().all(|preference| {
        let preference = preference.to_lowercase();
        requests.iter().any(|note| note.contains(&preference))
    })
}

fn ensure_confirmation_note(recommendation: &mut Recommendation, preferences: &[String]) {
    if covers_dietary_preferences(&recommendation.notes, preferences) {
        return;
    }
    tracing::debug!("Adding dietary confirmation note to {}", recommendation.name);
    recommendation.notes.push(format!(
        "Confirm {} options directly with the caterer before booking.",
        preferences.join(", ")
    ));
}
