//! Gemini `generateContent` backend.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::prompts::{classification_prompt, discovery_prompt, SYSTEM_PROMPT};
use super::{Classification, ConnectionCandidate, Oracle, OracleError};
use crate::model::{Insight, Mood};
use crate::settings::schema::GeminiSettings;

const API_KEY_HEADER: &str = "x-goog-api-key";

pub struct GeminiOracle {
    http: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
    temperature: f32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    system_instruction: Content,
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: String,
    response_schema: serde_json::Value,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<ResponseCandidate>,
}

#[derive(Debug, Deserialize)]
struct ResponseCandidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct RawClassification {
    mood: String,
    #[serde(default)]
    tags: Vec<String>,
}

impl GeminiOracle {
    pub fn from_settings(settings: &GeminiSettings, api_key: &str) -> Result<Self, OracleError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            api_key: api_key.to_string(),
            model: settings.model.clone(),
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            temperature: settings.temperature,
        })
    }

    fn headers(&self) -> Result<HeaderMap, OracleError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            API_KEY_HEADER,
            HeaderValue::from_str(&self.api_key)
                .map_err(|e| OracleError::NotConfigured(format!("invalid API key: {}", e)))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    fn build_request(&self, prompt: String, schema: serde_json::Value) -> GenerateRequest {
        GenerateRequest {
            system_instruction: Content {
                role: None,
                parts: vec![Part {
                    text: SYSTEM_PROMPT.to_string(),
                }],
            },
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part { text: prompt }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json".to_string(),
                response_schema: schema,
                temperature: self.temperature,
            },
        }
    }

    /// Run one structured generation and return the raw JSON text.
    async fn generate(
        &self,
        prompt: String,
        schema: serde_json::Value,
    ) -> Result<String, OracleError> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        let request = self.build_request(prompt, schema);

        tracing::debug!(model = %self.model, "[oracle] Gemini generateContent request");

        let response = self
            .http
            .post(&url)
            .headers(self.headers()?)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await?;
            return Err(OracleError::Api { status, message });
        }

        let body: GenerateResponse = response.json().await?;
        extract_text(body)
    }
}

fn classification_schema() -> serde_json::Value {
    let moods: Vec<&str> = Mood::ALL.iter().map(|m| m.as_str()).collect();
    json!({
        "type": "OBJECT",
        "properties": {
            "mood": { "type": "STRING", "enum": moods },
            "tags": { "type": "ARRAY", "items": { "type": "STRING" } }
        },
        "required": ["mood", "tags"]
    })
}

fn discovery_schema() -> serde_json::Value {
    json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "toId": { "type": "STRING" },
                "strength": { "type": "NUMBER" },
                "reason": { "type": "STRING" }
            },
            "required": ["toId", "strength", "reason"]
        }
    })
}

/// Concatenate the text parts of the first candidate.
fn extract_text(body: GenerateResponse) -> Result<String, OracleError> {
    let text = body
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .map(|p| p.text)
                .collect::<Vec<_>>()
                .join("")
        })
        .ok_or_else(|| OracleError::InvalidResponse("no candidates in response".to_string()))?;

    if text.trim().is_empty() {
        return Err(OracleError::InvalidResponse("empty response text".to_string()));
    }
    Ok(text)
}

/// Strip markdown code fences some models wrap JSON in.
fn strip_code_blocks(response: &str) -> &str {
    response
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim()
}

fn parse_classification(text: &str) -> Result<Classification, OracleError> {
    let raw: RawClassification = serde_json::from_str(strip_code_blocks(text))?;
    let mood = raw
        .mood
        .parse::<Mood>()
        .map_err(|e| OracleError::InvalidResponse(e.to_string()))?;
    Ok(Classification {
        mood,
        tags: raw.tags,
    })
}

fn parse_candidates(text: &str) -> Result<Vec<ConnectionCandidate>, OracleError> {
    Ok(serde_json::from_str(strip_code_blocks(text))?)
}

#[async_trait]
impl Oracle for GeminiOracle {
    async fn classify(&self, text: &str) -> Result<Classification, OracleError> {
        let response = self
            .generate(classification_prompt(text), classification_schema())
            .await?;
        parse_classification(&response)
    }

    async fn discover_connections(
        &self,
        insight: &Insight,
        candidates: &[Insight],
    ) -> Result<Vec<ConnectionCandidate>, OracleError> {
        let response = self
            .generate(discovery_prompt(insight, candidates), discovery_schema())
            .await?;
        parse_candidates(&response)
    }

    fn description(&self) -> String {
        format!("Gemini ({})", self.model)
    }
}
