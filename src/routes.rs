use std::sync::Arc;

use axum::extract::{Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use log::{debug, error};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use crate::analysis::{self, AnalysisParams};
use crate::deepseek::CompletionProvider;
use crate::error::ApiError;
use crate::normalize::{self, HookAnalysis, ResearchAnalysis};
use crate::usage::{UsageEntry, UsageSink};

const TRANSCRIPT_API_URL: &str = "https://api.supadata.ai/v1/youtube/transcript";
const SEARCH_API_URL: &str = "https://serpapi.com/search.json";

#[derive(Clone)]
pub struct AppState {
    pub http: reqwest::Client,
    pub provider: Arc<dyn CompletionProvider>,
    pub usage: Arc<dyn UsageSink>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/deepseek/analyze", post(analyze))
        .route("/api/deepseek/research", post(research))
        .route("/api/youtube/transcript", get(transcript))
        .route("/api/youtube/search", get(search))
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

#[derive(Debug, Deserialize)]
struct AnalyzeRequest {
    transcript: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResearchRequest {
    transcript: Option<String>,
    question: Option<String>,
}

async fn analyze(
    State(state): State<AppState>,
    Json(req): Json<AnalyzeRequest>,
) -> Result<Json<HookAnalysis>, ApiError> {
    let transcript = req
        .transcript
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::Validation("Transcript is required".to_string()))?;

    let truncated = analysis::truncate_chars(&transcript, analysis::HOOK.max_transcript_chars);
    let result: HookAnalysis = run_analysis(&state, &analysis::HOOK, truncated.to_string()).await?;
    Ok(Json(result.clamp_outline()))
}

async fn research(
    State(state): State<AppState>,
    Json(req): Json<ResearchRequest>,
) -> Result<Json<ResearchAnalysis>, ApiError> {
    let (transcript, question) = match (req.transcript, req.question) {
        (Some(t), Some(q)) if !t.is_empty() && !q.is_empty() => (t, q),
        _ => {
            return Err(ApiError::Validation(
                "Both transcript and research question are required".to_string(),
            ));
        }
    };

    let question_len = question.chars().count();
    if !(20..=10_000).contains(&question_len) {
        return Err(ApiError::Validation(
            "Research question must be between 20 and 10,000 characters".to_string(),
        ));
    }

    let truncated = analysis::truncate_chars(&transcript, analysis::RESEARCH.max_transcript_chars);
    let content = analysis::research_user_content(&question, truncated);
    run_analysis(&state, &analysis::RESEARCH, content).await.map(Json)
}

/// Pipeline tail shared by both analysis endpoints:
/// build prompt -> call completion -> record usage -> normalize.
async fn run_analysis<T: DeserializeOwned>(
    state: &AppState,
    params: &AnalysisParams,
    user_content: String,
) -> Result<T, ApiError> {
    let messages = params.build_messages(user_content);

    debug!("Making request to DeepSeek API for {}", params.endpoint);
    let completion = state
        .provider
        .complete(&messages, params.completion_params())
        .await?;

    // Counters exist as soon as the call succeeds; record them before
    // parsing so an unparseable reply still leaves a usage record.
    if let Some(usage) = completion.usage {
        state.usage.record(&UsageEntry::new(params.endpoint, usage));
    }

    normalize::parse_response(&completion.text)
}

#[derive(Debug, Deserialize)]
struct TranscriptQuery {
    url: Option<String>,
    text: Option<bool>,
}

/// Forward a transcript request to the extraction API, returning its JSON
/// body untouched.
async fn transcript(
    State(state): State<AppState>,
    Query(query): Query<TranscriptQuery>,
) -> Result<Json<Value>, ApiError> {
    let url = query
        .url
        .filter(|u| !u.is_empty())
        .ok_or_else(|| ApiError::Validation("YouTube URL is required".to_string()))?;

    if crate::extract_video_id(&url).is_none() {
        return Err(ApiError::Validation(format!(
            "could not extract video ID from: {url}"
        )));
    }

    let api_key = std::env::var("SUPADATA_API_KEY").unwrap_or_default();
    let text = query.text.unwrap_or(false);

    let resp = state
        .http
        .get(TRANSCRIPT_API_URL)
        .query(&[("url", url.as_str()), ("text", if text { "true" } else { "false" })])
        .header("x-api-key", api_key)
        .send()
        .await
        .map_err(|e| upstream("Failed to fetch transcript", &e))?;

    if !resp.status().is_success() {
        error!("Transcript API returned {}", resp.status());
        return Err(ApiError::Upstream("Failed to fetch transcript".to_string()));
    }

    let body: Value = resp
        .json()
        .await
        .map_err(|e| upstream("Failed to fetch transcript", &e))?;
    Ok(Json(body))
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    q: Option<String>,
}

/// Forward a video search to the search API, returning its JSON body
/// untouched.
async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Value>, ApiError> {
    let q = query
        .q
        .filter(|q| !q.is_empty())
        .ok_or_else(|| ApiError::Validation("Search query is required".to_string()))?;

    let api_key = std::env::var("SERP_API_KEY").unwrap_or_default();

    let resp = state
        .http
        .get(SEARCH_API_URL)
        .query(&[
            ("engine", "youtube"),
            ("search_query", q.as_str()),
            ("api_key", api_key.as_str()),
        ])
        .send()
        .await
        .map_err(|e| upstream("Failed to search videos", &e))?;

    if !resp.status().is_success() {
        error!("Search API returned {}", resp.status());
        return Err(ApiError::Upstream("Failed to search videos".to_string()));
    }

    let body: Value = resp
        .json()
        .await
        .map_err(|e| upstream("Failed to search videos", &e))?;
    Ok(Json(body))
}

fn upstream(message: &str, err: &reqwest::Error) -> ApiError {
    error!("{message}: {err}");
    ApiError::Upstream(message.to_string())
}
