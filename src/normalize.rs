use log::error;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Outline entries beyond this count are dropped
pub const MAX_OUTLINE_POINTS: usize = 6;

/// One intro sentence paired with the hook technique it demonstrates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntroSentence {
    pub text: String,
    pub technique: String,
}

/// Result shape of the quick hook analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HookAnalysis {
    pub intro_analysis: Vec<IntroSentence>,
    pub body_outline: Vec<String>,
}

impl HookAnalysis {
    /// Enforce the declared outline bound
    pub fn clamp_outline(mut self) -> Self {
        self.body_outline.truncate(MAX_OUTLINE_POINTS);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchCard {
    pub title: String,
    pub analysis: String,
}

/// Result shape of the research analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchAnalysis {
    pub cards: Vec<ResearchCard>,
}

/// Models are told to reply with bare JSON but sometimes wrap it in a
/// markdown code fence anyway. If the text contains a fenced block
/// (optionally tagged "json"), substitute its inner content for the whole
/// text; otherwise use the trimmed original. The first fence wins.
pub fn strip_code_fence(text: &str) -> &str {
    let re = Regex::new(r"```(?:json)?\s*([\s\S]*?)\s*```").unwrap();
    match re.captures(text) {
        Some(caps) => caps.get(1).map_or("", |m| m.as_str()),
        None => text.trim(),
    }
}

/// Parse a model reply into the expected result shape. The raw text is
/// logged on failure so a bad reply can be diagnosed; the caller only ever
/// sees the generic error.
pub fn parse_response<T: DeserializeOwned>(raw: &str) -> Result<T, ApiError> {
    let cleaned = strip_code_fence(raw);
    serde_json::from_str(cleaned).map_err(|_| {
        error!("Failed to parse DeepSeek response: {raw}");
        ApiError::MalformedResponse("Invalid JSON response from DeepSeek API".to_string())
    })
}
