use crate::core::extract::{ExtractionError, ResponseExtractor};
use crate::models::{EventRequest, EventType, ALLOWED_REQUIREMENTS, UNKNOWN};
use crate::services::{CompletionError, CompletionProvider, CompletionRequest};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

/// Errors that can occur while turning a prompt into an event request
#[derive(Debug, Error)]
pub enum SerializerError {
    #[error("Failed to serialize prompt: {0}")]
    Completion(#[from] CompletionError),

    #[error("Failed to serialize prompt: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("Failed to serialize prompt: model returned no fields")]
    Empty,
}

/// What to do when the prompt names no cuisine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CuisinePolicy {
    /// Fall back to the configured default cuisine
    #[default]
    DefaultCuisine,
    /// Leave the list empty, so no catering is searched
    StrictUnknown,
}

/// Extracts the structured event request from free text with a small model
pub struct FieldSerializer {
    provider: Arc<dyn CompletionProvider>,
    model: String,
    extractor: ResponseExtractor,
    cuisine_policy: CuisinePolicy,
    default_cuisine: String,
}

impl FieldSerializer {
    /// Create a new serializer
    ///
    /// # Arguments
    /// * `provider` - Completion endpoint shared with the rest of the app
    /// * `model` - Model id sent with every request
    /// * `extractor` - Extraction mode used on the completion
    /// * `cuisine_policy` - Behaviour when no cuisine is mentioned
    /// * `default_cuisine` - Fallback cuisine for [`CuisinePolicy::DefaultCuisine`]
    pub fn new(
        provider: Arc<dyn CompletionProvider>,
        model: impl Into<String>,
        extractor: ResponseExtractor,
        cuisine_policy: CuisinePolicy,
        default_cuisine: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            model: model.into(),
            extractor,
            cuisine_policy,
            default_cuisine: default_cuisine.into(),
        }
    }

    /// Serialize a natural-language event description
    pub async fn serialize(&self, prompt: &str) -> Result<EventRequest, SerializerError> {
        let request = CompletionRequest::system(&self.model, self.build_instruction(prompt));
        let raw = self.provider.complete(&request).await?;

        let fields = self.extractor.extract(&raw)?;
        if fields.is_empty() {
            tracing::warn!("Serializer returned an empty object");
            return Err(SerializerError::Empty);
        }

        let mut event: EventRequest = serde_json::from_value(Value::Object(fields))
            .map_err(ExtractionError::Shape)?;

        if event.cuisines.is_empty() && self.cuisine_policy == CuisinePolicy::DefaultCuisine {
            tracing::debug!("No cuisine extracted, using {}", self.default_cuisine);
            event.cuisines.push(self.default_cuisine.clone());
        }

        Ok(event.with_ordered_head_counts())
    }

    fn cuisine_rule(&self) -> String {
        match self.cuisine_policy {
            CuisinePolicy::DefaultCuisine => format!(
                "- only include cuisines that are explicitly mentioned in the prompt, if none is mentioned, default to \"{}\"",
                self.default_cuisine
            ),
            CuisinePolicy::StrictUnknown => format!(
                "- only include cuisines that are explicitly mentioned in the prompt, if none is mentioned, set the field to '{}'",
                UNKNOWN
            ),
        }
    }

    pub(crate) fn build_instruction(&self, prompt: &str) -> String {
        let event_types = EventType::ALL
            .iter()
            .map(EventType::as_str)
            .collect::<Vec<_>>()
            .join(", ");

        format!(
            r#"Serialize this prompt into JSON. Extract the following fields:
- location (string)
- event_type (string)
- budget (string)
- min_head_count (string)
- max_head_count (string)
- cuisines (array of strings)
- dietary_preferences (array of strings)
- other_requirements (array of strings)

Instructions for location:
- don't use abbreviations (e.g., 'New York City' instead of 'NYC')

Instructions for budget:
- just put the number, no commas or other symbols

Instructions for cuisines:
{cuisine_rule}

Instructions for head_count:
- If the text mentions 'X attendees' or 'around X people', use X for both min_head_count and max_head_count.
- If the text mentions a single number of attendees, use that number for both min_head_count and max_head_count.
- If a range is given (e.g., 100-150 attendees), use the lower number as min_head_count and the higher as max_head_count.

Instructions for event_type:
- Choose the event type from the following list only:
  {event_types}
- Use context clues to infer the event type if it's not explicitly mentioned.
- If words like iftar or ramadan are mentioned, classify as Iftar.

Instructions for other_requirements:
- Only include items in other_requirements if the user explicitly mentions them.
- Allowed requirements are: {requirements}
- Do not infer anything from the prompt text; only include explicitly mentioned requirements

If information is missing, set the field to '{unknown}'.

User text:
{prompt}"#,
            cuisine_rule = self.cuisine_rule(),
            event_types = event_types,
            requirements = ALLOWED_REQUIREMENTS.join(", "),
            unknown = UNKNOWN,
            prompt = prompt,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::HeadCount;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct CannedModel {
        reply: String,
        seen: Mutex<Vec<CompletionRequest>>,
    }

    impl CannedModel {
        fn new(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: reply.to_string(),
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl CompletionProvider for CannedModel {
        async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
            self.seen.lock().unwrap().push(request.clone());
            Ok(self.reply.clone())
        }
    }

    fn serializer(model: Arc<CannedModel>, policy: CuisinePolicy) -> FieldSerializer {
        FieldSerializer::new(model, "small", ResponseExtractor::lenient(), policy, "American")
    }

    #[tokio::test]
    async fn test_wedding_prompt() {
        let model = CannedModel::new(
            "<think>The user wants a wedding.</think>\n```json\n{\n  \"location\": \"San Francisco\",\n  \"event_type\": \"Wedding\",\n  \"budget\": \"$30,000\",\n  \"min_head_count\": \"200\",\n  \"max_head_count\": \"200\",\n  \"cuisines\": [\"Pakistani\", \"Arab\"],\n  \"dietary_preferences\": [\"halal\"],\n  \"other_requirements\": \"unknown\"\n}\n```",
        );
        let prompt = "I want to plan a wedding in SF for 200 guests. Budget is $30k. Pakistani and Arab food, halal only.";

        let event = serializer(model.clone(), CuisinePolicy::DefaultCuisine)
            .serialize(prompt)
            .await
            .unwrap();

        assert_eq!(event.location, "San Francisco");
        assert_eq!(event.event_type, EventType::Wedding);
        assert_eq!(event.min_head_count, HeadCount::Exact(200));
        assert_eq!(event.max_head_count, HeadCount::Exact(200));
        assert_eq!(event.budget, "30000");
        assert_eq!(event.cuisines, vec!["Pakistani", "Arab"]);
        assert_eq!(event.dietary_preferences, vec!["halal"]);
        assert!(event.other_requirements.is_empty());

        let seen = model.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].model, "small");
        assert_eq!(seen[0].temperature, 0.0);
        assert!(seen[0].system_prompt.ends_with(prompt));
    }

    #[tokio::test]
    async fn test_missing_cuisine_uses_default() {
        let model = CannedModel::new(r#"{"location": "Boston", "cuisines": "unknown"}"#);
        let event = serializer(model, CuisinePolicy::DefaultCuisine)
            .serialize("a party in Boston")
            .await
            .unwrap();

        assert_eq!(event.cuisines, vec!["American"]);
    }

    #[tokio::test]
    async fn test_strict_unknown_keeps_cuisines_empty() {
        let model = CannedModel::new(r#"{"location": "Boston", "cuisines": "unknown"}"#);
        let serializer = serializer(model, CuisinePolicy::StrictUnknown);

        let event = serializer.serialize("a party in Boston").await.unwrap();

        assert!(event.cuisines.is_empty());
        assert!(!serializer.build_instruction("x").contains("American"));
    }

    #[tokio::test]
    async fn test_empty_object_is_an_error() {
        let model = CannedModel::new("```json\n{}\n```");
        let err = serializer(model, CuisinePolicy::DefaultCuisine)
            .serialize("?")
            .await
            .unwrap_err();

        assert!(matches!(err, SerializerError::Empty));
        assert!(err.to_string().starts_with("Failed to serialize prompt"));
    }

    #[tokio::test]
    async fn test_prose_only_reply_is_extraction_error() {
        let model = CannedModel::new("Sorry, I cannot help with that.");
        let err = serializer(model, CuisinePolicy::DefaultCuisine)
            .serialize("?")
            .await
            .unwrap_err();

        assert!(matches!(err, SerializerError::Extraction(ExtractionError::NoJsonFound)));
    }

    #[test]
    fn test_instruction_lists_vocabularies() {
        let serializer = serializer(CannedModel::new("{}"), CuisinePolicy::DefaultCuisine);
        let instruction = serializer.build_instruction("Iftar for 80 people in Queens");

        assert!(instruction.contains("Guest Speaker, Community Meeting"));
        assert!(instruction.contains("transport accessibility, decorations, setup requirements"));
        assert!(instruction.contains("default to \"American\""));
    }
}
