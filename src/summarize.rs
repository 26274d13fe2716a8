use std::future::Future;

use log::debug;
use thiserror::Error;

use crate::config::Config;

pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Instruction text placed directly in front of the transcript
pub const PROMPT: &str = "You are a highly skilled YouTube video summarizer with expertise in extracting key insights and important details from video transcripts. Your task is to carefully analyze the provided transcript of the video and produce a concise yet comprehensive summary. Focus on identifying the main ideas, critical moments, and key takeaways from the video content. The summary should be structured in bullet points, with each point highlighting a distinct aspect of the video.

Your summary should be:

1. Clear and easy to understand, presenting the most relevant information in an organized manner.
2. Concise, keeping the total length under 250 words.
3. Focused on the core themes and ideas of the video, leaving out unnecessary details while retaining the essence of the content.
4. Structured in a way that makes it easy for someone to quickly grasp the video's main points and important takeaways.
5. Provide any action items, recommendations, or conclusions mentioned in the video that can be useful for the viewer.";

#[derive(Debug, Error)]
pub enum SummarizeError {
    #[error("GOOGLE_API_KEY is not set (required for Gemini summarization)")]
    MissingApiKey,

    #[error("request to Gemini failed: {0}")]
    Network(reqwest::Error),

    #[error("Gemini API returned {status}: {body}")]
    Api { status: reqwest::StatusCode, body: String },

    #[error("unexpected Gemini API response format")]
    EmptyResponse,
}

impl From<reqwest::Error> for SummarizeError {
    // strip the request URL before it reaches logs or the user
    fn from(e: reqwest::Error) -> Self {
        SummarizeError::Network(e.without_url())
    }
}

/// A hosted model that turns one text input into one text output
pub trait Summarizer {
    fn generate(&self, input: &str) -> impl Future<Output = Result<String, SummarizeError>> + Send;
}

/// Prompt and transcript as one undivided input, no separator
pub fn build_input(prompt: &str, transcript_text: &str) -> String {
    let mut input = String::with_capacity(prompt.len() + transcript_text.len());
    input.push_str(prompt);
    input.push_str(transcript_text);
    input
}

/// Request body carrying the whole input as a single text part
pub fn request_body(input: &str) -> serde_json::Value {
    serde_json::json!({
        "contents": [
            {
                "role": "user",
                "parts": [{ "text": input }]
            }
        ]
    })
}

/// Gemini `generateContent` client
#[derive(Debug, Clone)]
pub struct Gemini {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl Gemini {
    pub fn new(config: &Config) -> Result<Self, SummarizeError> {
        let api_key = config.google_api_key.clone().ok_or(SummarizeError::MissingApiKey)?;
        Ok(Self::with_client(reqwest::Client::new(), api_key, config.model.clone()))
    }

    fn with_client(client: reqwest::Client, api_key: String, model: String) -> Self {
        Gemini { client, api_key, model }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{GEMINI_BASE_URL}/v1beta/models/{}:generateContent", self.model)
    }
}

impl Summarizer for Gemini {
    async fn generate(&self, input: &str) -> Result<String, SummarizeError> {
        debug!("Summarizing via Gemini with model {} ({} chars)", self.model, input.len());

        let resp = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&request_body(input))
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = match resp.text().await {
                Ok(body) => body,
                Err(e) => format!("<could not read response body: {}>", e.without_url()),
            };
            return Err(SummarizeError::Api { status, body });
        }

        let json: serde_json::Value = resp.json().await?;
        extract_gemini_text(&json)
    }
}

fn extract_gemini_text(json: &serde_json::Value) -> Result<String, SummarizeError> {
    let text = json
        .get("candidates")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("content"))
        .and_then(|c| c.get("parts"))
        .and_then(|p| p.as_array())
        .map(|parts| {
            parts
                .iter()
                .filter_map(|part| part.get("text")?.as_str())
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default();

    if text.is_empty() {
        return Err(SummarizeError::EmptyResponse);
    }
    Ok(text)
}
