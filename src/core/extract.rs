use regex::Regex;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::sync::OnceLock;
use thiserror::Error;

/// How much of a raw response is logged when nothing could be extracted
const RAW_PREVIEW_CHARS: usize = 500;
/// How much of a failed candidate is kept for diagnostics
const SNIPPET_CHARS: usize = 200;

/// Errors that can occur when pulling JSON out of a completion
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("No JSON found in LLM response")]
    NoJsonFound,

    #[error("No JSON block found in LLM response")]
    NoJsonBlock,

    #[error("Failed to parse JSON: {source}")]
    Parse {
        #[source]
        source: serde_json::Error,
        snippet: String,
    },

    #[error("Unexpected JSON shape: {0}")]
    Shape(#[source] serde_json::Error),
}

/// Whether a fenced ```json block is mandatory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMode {
    /// Only a fenced ```json block is accepted
    Strict,
    /// Any fenced block, then the outermost brace span
    #[default]
    Lenient,
}

fn thinking_span() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)<think(?:ing)?>.*?</think(?:ing)?>").expect("valid thinking regex")
    })
}

fn json_fence() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)```json\s*(\{.*?\})\s*```").expect("valid fence regex"))
}

fn any_fence() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)```(?:json)?\s*(\{.*?\})\s*```").expect("valid fence regex"))
}

/// Remove `<think>...</think>` scratch spans a reasoning model may emit
pub fn strip_thinking(raw: &str) -> String {
    thinking_span().replace_all(raw, "").into_owned()
}

fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Pulls a single JSON object out of a raw model completion
///
/// # Extraction order
/// 1. Strip thinking spans
/// 2. Fenced code block (tag required in strict mode)
/// 3. Lenient only: first `{` to last `}`
/// 4. Parse the candidate as an object
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseExtractor {
    mode: ExtractionMode,
}

impl ResponseExtractor {
    pub fn new(mode: ExtractionMode) -> Self {
        Self { mode }
    }

    pub fn strict() -> Self {
        Self::new(ExtractionMode::Strict)
    }

    pub fn lenient() -> Self {
        Self::new(ExtractionMode::Lenient)
    }

    pub fn mode(&self) -> ExtractionMode {
        self.mode
    }

    /// Extract the JSON object contained in `raw`
    pub fn extract(&self, raw: &str) -> Result<Map<String, Value>, ExtractionError> {
        let cleaned = strip_thinking(raw);

        let candidate = match self.find_candidate(&cleaned) {
            Some(candidate) => candidate,
            None => {
                tracing::warn!(
                    "No JSON candidate in LLM response (first {} chars): {}",
                    RAW_PREVIEW_CHARS,
                    truncate_chars(raw, RAW_PREVIEW_CHARS)
                );
                return Err(match self.mode {
                    ExtractionMode::Strict => ExtractionError::NoJsonBlock,
                    ExtractionMode::Lenient => ExtractionError::NoJsonFound,
                });
            }
        };

        serde_json::from_str(candidate).map_err(|source| {
            let snippet = truncate_chars(candidate, SNIPPET_CHARS).to_string();
            tracing::warn!("JSON parse error: {} (attempted to parse: {})", source, snippet);
            ExtractionError::Parse { source, snippet }
        })
    }

    /// Extract the JSON object and deserialize it into `T`
    pub fn extract_as<T: DeserializeOwned>(&self, raw: &str) -> Result<T, ExtractionError> {
        let map = self.extract(raw)?;
        serde_json::from_value(Value::Object(map)).map_err(ExtractionError::Shape)
    }

    fn find_candidate<'a>(&self, cleaned: &'a str) -> Option<&'a str> {
        let fence = match self.mode {
            ExtractionMode::Strict => json_fence(),
            ExtractionMode::Lenient => any_fence(),
        };

        if let Some(inner) = fence.captures(cleaned).and_then(|caps| caps.get(1)) {
            return Some(inner.as_str());
        }

        if self.mode == ExtractionMode::Strict {
            return None;
        }

        let start = cleaned.find('{')?;
        let end = cleaned.rfind('}')?;
        (end > start).then(|| &cleaned[start..=end])
    }
}
