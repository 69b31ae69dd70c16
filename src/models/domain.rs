use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;

/// Sentinel used for every field the serializer could not fill
pub const UNKNOWN: &str = "unknown";

/// Requirements the serializer is allowed to report, in canonical casing
pub const ALLOWED_REQUIREMENTS: [&str; 18] = [
    "AV equipment",
    "projector",
    "microphone",
    "sound system",
    "accessible facilities",
    "wheelchair access",
    "indoor",
    "outdoor",
    "stage",
    "podium",
    "performance area",
    "food",
    "catering",
    "dietary restrictions",
    "parking",
    "transport accessibility",
    "decorations",
    "setup requirements",
];

/// Closed vocabulary of event categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EventType {
    Conference,
    Seminar,
    Workshop,
    Lecture,
    Talk,
    GuestSpeaker,
    CommunityMeeting,
    TownHall,
    Celebration,
    Festival,
    Party,
    Wedding,
    Engagement,
    ReligiousCeremony,
    PrayerEvent,
    Iftar,
    EidGathering,
    Charity,
    Fundraiser,
    #[default]
    Unknown,
}

impl EventType {
    /// Every known category, in the order the serializer instruction lists them
    pub const ALL: [EventType; 19] = [
        EventType::Conference,
        EventType::Seminar,
        EventType::Workshop,
        EventType::Lecture,
        EventType::Talk,
        EventType::GuestSpeaker,
        EventType::CommunityMeeting,
        EventType::TownHall,
        EventType::Celebration,
        EventType::Festival,
        EventType::Party,
        EventType::Wedding,
        EventType::Engagement,
        EventType::ReligiousCeremony,
        EventType::PrayerEvent,
        EventType::Iftar,
        EventType::EidGathering,
        EventType::Charity,
        EventType::Fundraiser,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Conference => "Conference",
            EventType::Seminar => "Seminar",
            EventType::Workshop => "Workshop",
            EventType::Lecture => "Lecture",
            EventType::Talk => "Talk",
            EventType::GuestSpeaker => "Guest Speaker",
            EventType::CommunityMeeting => "Community Meeting",
            EventType::TownHall => "Town Hall",
            EventType::Celebration => "Celebration",
            EventType::Festival => "Festival",
            EventType::Party => "Party",
            EventType::Wedding => "Wedding",
            EventType::Engagement => "Engagement",
            EventType::ReligiousCeremony => "Religious Ceremony",
            EventType::PrayerEvent => "Prayer Event",
            EventType::Iftar => "Iftar",
            EventType::EidGathering => "Eid Gathering",
            EventType::Charity => "Charity",
            EventType::Fundraiser => "Fundraiser",
            EventType::Unknown => UNKNOWN,
        }
    }

    /// Map a model-produced label onto the closed vocabulary.
    ///
    /// Matching ignores case and surrounding whitespace. Anything mentioning
    /// iftar or ramadan maps to `Iftar`; values outside the list become `Unknown`.
    pub fn from_label(label: &str) -> Self {
        let normalized = label.trim().to_lowercase();
        if normalized.is_empty() || normalized == UNKNOWN {
            return EventType::Unknown;
        }

        if let Some(found) = Self::ALL
            .iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(&normalized))
        {
            return *found;
        }

        if normalized.contains("iftar") || normalized.contains("ramadan") {
            return EventType::Iftar;
        }

        tracing::warn!("Event type '{}' is outside the known vocabulary, using unknown", label);
        EventType::Unknown
    }

    /// Search text used when looking for venues of this type
    pub fn venue_query(&self) -> &'static str {
        match self {
            EventType::Unknown => "event venue",
            other => other.as_str(),
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for EventType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for EventType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label: Option<String> = Option::deserialize(deserializer)?;
        Ok(label.map(|l| EventType::from_label(&l)).unwrap_or_default())
    }
}

/// Attendee count, or the unknown sentinel when the prompt did not say
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HeadCount {
    Exact(u32),
    #[default]
    Unknown,
}

impl HeadCount {
    pub fn value(&self) -> Option<u32> {
        match self {
            HeadCount::Exact(n) => Some(*n),
            HeadCount::Unknown => None,
        }
    }

    fn from_json(value: &Value) -> Self {
        match value {
            Value::Number(n) => n
                .as_u64()
                .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f.round() as u64))
                .and_then(|n| u32::try_from(n).ok())
                .map(HeadCount::Exact)
                .unwrap_or_default(),
            Value::String(s) => s
                .trim()
                .replace(',', "")
                .parse::<u32>()
                .map(HeadCount::Exact)
                .unwrap_or_default(),
            _ => HeadCount::Unknown,
        }
    }
}

impl Serialize for HeadCount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            HeadCount::Exact(n) => serializer.serialize_u32(*n),
            HeadCount::Unknown => serializer.serialize_str(UNKNOWN),
        }
    }
}

impl<'de> Deserialize<'de> for HeadCount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(HeadCount::from_json(&value))
    }
}

/// Structured event request extracted from the user's free text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRequest {
    #[serde(default = "unknown_string", deserialize_with = "text_or_unknown")]
    pub location: String,
    #[serde(default)]
    pub event_type: EventType,
    #[serde(default = "unknown_string", deserialize_with = "budget_or_unknown")]
    pub budget: String,
    #[serde(default)]
    pub min_head_count: HeadCount,
    #[serde(default)]
    pub max_head_count: HeadCount,
    #[serde(default, deserialize_with = "string_list")]
    pub cuisines: Vec<String>,
    #[serde(default, deserialize_with = "string_list")]
    pub dietary_preferences: Vec<String>,
    #[serde(default, deserialize_with = "allowed_requirements")]
    pub other_requirements: Vec<String>,
}

impl EventRequest {
    pub fn has_location(&self) -> bool {
        !is_unknown(&self.location)
    }

    /// Swap head counts the model reported in the wrong order
    pub fn with_ordered_head_counts(mut self) -> Self {
        if let (HeadCount::Exact(min), HeadCount::Exact(max)) =
            (self.min_head_count, self.max_head_count)
        {
            if min > max {
                self.min_head_count = HeadCount::Exact(max);
                self.max_head_count = HeadCount::Exact(min);
            }
        }
        self
    }
}

/// Requirements shared by every ranking call of one plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingRequirements {
    pub event_type: EventType,
    pub budget: String,
    pub min_head_count: HeadCount,
    pub max_head_count: HeadCount,
    pub other_requirements: Vec<String>,
    pub dietary_preferences: Vec<String>,
}

impl From<&EventRequest> for RankingRequirements {
    fn from(request: &EventRequest) -> Self {
        Self {
            event_type: request.event_type,
            budget: request.budget.clone(),
            min_head_count: request.min_head_count,
            max_head_count: request.max_head_count,
            other_requirements: request.other_requirements.clone(),
            dietary_preferences: request.dietary_preferences.clone(),
        }
    }
}

/// Venue or caterer found through the places service, enriched with details
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceRecord {
    pub name: String,
    pub address: Option<String>,
    #[serde(default)]
    pub types: Vec<String>,
    pub rating: Option<f64>,
    pub price_level: Option<u8>,
    pub vicinity: Option<String>,
    pub phone_number: Option<String>,
    pub website: Option<String>,
    pub opening_hours: Option<Vec<String>>,
    /// Distance from the geocoded search centre
    pub distance_km: Option<f64>,
}

/// One ranked venue or caterer as annotated by the ranking model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    #[serde(default, deserialize_with = "lenient_text")]
    pub name: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub rating: Option<f64>,
    #[serde(default, deserialize_with = "lenient_price_level")]
    pub price_level: Option<u8>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub why_recommended: String,
    #[serde(default, deserialize_with = "string_list")]
    pub notes: Vec<String>,
    /// Only present on catering recommendations
    #[serde(
        default,
        deserialize_with = "optional_string_list",
        skip_serializing_if = "Option::is_none"
    )]
    pub dietary_support: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VenueRecommendations {
    #[serde(default, deserialize_with = "lenient_list")]
    pub recommended_venues: Vec<Recommendation>,
    #[serde(default, deserialize_with = "string_list")]
    pub general_notes: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CateringRecommendations {
    #[serde(default, deserialize_with = "lenient_list")]
    pub recommended_catering: Vec<Recommendation>,
    #[serde(default, deserialize_with = "string_list")]
    pub general_notes: Vec<String>,
}

/// Output of one planning run; never persisted
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanResult {
    pub venues: VenueRecommendations,
    /// One entry per requested cuisine, in request order
    pub catering: Vec<CateringRecommendations>,
}

pub fn is_unknown(value: &str) -> bool {
    let trimmed = value.trim();
    trimmed.is_empty() || trimmed.eq_ignore_ascii_case(UNKNOWN)
}

fn unknown_string() -> String {
    UNKNOWN.to_string()
}

fn text_or_unknown<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) if !is_unknown(&s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => unknown_string(),
    })
}

/// Keep only the digits and decimal point of a budget ("$30,000" -> "30000")
pub fn normalize_budget(raw: &str) -> String {
    let digits: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    let digits = digits.trim_matches('.');
    if digits.chars().any(|c| c.is_ascii_digit()) {
        digits.to_string()
    } else {
        unknown_string()
    }
}

fn budget_or_unknown<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) => normalize_budget(&s),
        Value::Number(n) => normalize_budget(&n.to_string()),
        _ => unknown_string(),
    })
}

fn string_list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    let items = match value {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .collect(),
        Value::String(s) => s.split(',').map(str::to_string).collect(),
        _ => Vec::new(),
    };

    Ok(items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !is_unknown(s))
        .collect())
}

fn optional_string_list<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Vec<String>>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    if value.is_null() {
        return Ok(None);
    }
    string_list(value).map(Some).map_err(serde::de::Error::custom)
}

/// Null or non-text values become an empty string
fn lenient_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    })
}

/// Null becomes an empty list; entries that do not fit `T` are skipped
fn lenient_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: serde::de::DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    let Value::Array(items) = value else {
        return Ok(Vec::new());
    };

    Ok(items
        .into_iter()
        .filter_map(|item| match serde_json::from_value(item) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                tracing::warn!("Skipping malformed recommendation: {}", e);
                None
            }
        })
        .collect())
}

fn allowed_requirements<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    let requested = string_list(deserializer)?;
    let mut allowed: Vec<String> = Vec::with_capacity(requested.len());
    for item in requested {
        match ALLOWED_REQUIREMENTS
            .iter()
            .find(|candidate| candidate.eq_ignore_ascii_case(&item))
        {
            Some(canonical) if !allowed.iter().any(|a| a == canonical) => {
                allowed.push(canonical.to_string())
            }
            Some(_) => {}
            None => tracing::debug!("Dropping requirement outside the allow-list: {}", item),
        }
    }
    Ok(allowed)
}

fn number_from_json(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn lenient_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(number_from_json(&value))
}

fn lenient_price_level<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u8>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(number_from_json(&value)
        .filter(|level| (0.0..=4.0).contains(level))
        .map(|level| level.round() as u8))
}
