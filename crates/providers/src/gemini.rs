//! Gemini `generateContent` client and the comment analysis built on it.

use anyhow::{anyhow, Result};
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use shared::settings::ProviderAuth;
use shared::types::Comment;
use std::env;
use std::sync::OnceLock;
use std::time::Duration;
use tracing::warn;

pub const MISSING_INPUT_SUMMARY: &str =
    "Unable to analyze comments (Missing API Key or No Comments).";
pub const UNAVAILABLE_SUMMARY: &str = "AI Analysis currently unavailable.";

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

static CODE_FENCE: OnceLock<Regex> = OnceLock::new();

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    role: String,
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    text: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiCandidatePart {
    text: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiCandidateContent {
    parts: Vec<GeminiCandidatePart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiCandidateContent>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

/// API keys go in the query string, OAuth access tokens in the header
#[derive(Debug, Clone, PartialEq)]
enum GeminiCredential {
    ApiKey(String),
    Bearer(String),
}

pub struct GeminiClient {
    http: Client,
    credential: GeminiCredential,
    model: String,
}

impl GeminiClient {
    pub fn from_auth(model: &str, auth: &ProviderAuth) -> Result<Self> {
        let credential = if let Some(api_key) = &auth.api_key {
            GeminiCredential::ApiKey(api_key.clone())
        } else if let Some(oauth) = &auth.oauth {
            GeminiCredential::Bearer(oauth.access_token.clone())
        } else {
            GeminiCredential::ApiKey(
                env::var("GEMINI_API_KEY")
                    .map_err(|_| anyhow!("No Gemini authentication configured"))?,
            )
        };

        Ok(Self {
            http: Client::builder().timeout(Duration::from_secs(45)).build()?,
            credential,
            model: model.to_string(),
        })
    }

    fn request(&self, prompt: &str) -> reqwest::Result<reqwest::Request> {
        let url = format!("{}/models/{}:generateContent", GEMINI_BASE_URL, self.model);
        let req = GeminiRequest {
            contents: vec![GeminiContent {
                role: "user".to_string(),
                parts: vec![GeminiPart {
                    text: prompt.to_string(),
                }],
            }],
        };
        let builder = self.http.post(url).json(&req);
        let builder = match &self.credential {
            GeminiCredential::ApiKey(key) => builder.query(&[("key", key)]),
            GeminiCredential::Bearer(token) => builder.bearer_auth(token),
        };
        builder.build()
    }

    /// Single-turn generation; returns the first candidate's text.
    pub async fn generate(&self, prompt: &str) -> Result<String> {
        let resp = self.http.execute(self.request(prompt)?).await?;
        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            let body = body.trim();
            if body.is_empty() {
                return Err(anyhow!("gemini error: {}", status));
            }
            let body: String = body.chars().take(800).collect();
            return Err(anyhow!("gemini error: {}\n{}", status, body));
        }
        let body: GeminiResponse = resp.json().await?;
        let text = body
            .candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .and_then(|c| c.parts.first())
            .map(|p| p.text.clone())
            .unwrap_or_default();
        Ok(text)
    }
}

/// A comment the model picked out as useful
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Highlight {
    #[serde(default)]
    pub author: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentAnalysis {
    pub summary: String,
    #[serde(default)]
    pub highlights: Vec<Highlight>,
}

impl CommentAnalysis {
    pub fn fallback(summary: &str) -> Self {
        Self {
            summary: summary.to_string(),
            highlights: Vec::new(),
        }
    }
}

/// Summarizes a video's comments. Never fails: problems degrade to a fixed summary.
pub struct CommentAnalyzer {
    client: Option<GeminiClient>,
}

impl CommentAnalyzer {
    pub fn new(model: &str, auth: &ProviderAuth) -> Self {
        let client = match GeminiClient::from_auth(model, auth) {
            Ok(client) => Some(client),
            Err(e) => {
                warn!("comment analysis disabled: {}", e);
                None
            }
        };
        Self { client }
    }

    pub fn disabled() -> Self {
        Self { client: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.client.is_some()
    }

    pub async fn analyze(&self, comments: &[Comment]) -> CommentAnalysis {
        let client = match &self.client {
            Some(client) if !comments.is_empty() => client,
            _ => return CommentAnalysis::fallback(MISSING_INPUT_SUMMARY),
        };

        let prompt = build_prompt(comments);
        match client.generate(&prompt).await {
            Ok(text) => match parse_analysis(&text) {
                Ok(analysis) => analysis,
                Err(e) => {
                    warn!("Gemini analysis returned unreadable JSON: {}", e);
                    CommentAnalysis::fallback(UNAVAILABLE_SUMMARY)
                }
            },
            Err(e) => {
                warn!("Gemini analysis failed: {}", e);
                CommentAnalysis::fallback(UNAVAILABLE_SUMMARY)
            }
        }
    }
}

fn build_prompt(comments: &[Comment]) -> String {
    let comments_text = comments
        .iter()
        .map(|c| format!("- {}: {}", c.author, c.text))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"Analyze these YouTube comments for an educational video.

1. Identify the 3 most useful/insightful comments that add value (e.g., timestamps, summaries, corrections).
2. Provide a 1-sentence summary of the general sentiment.

Format the output as JSON:
{{
  "summary": "General sentiment summary...",
  "highlights": [
    {{ "author": "User Name", "text": "The specific helpful part..." }}
  ]
}}

Comments:
{}
"#,
        comments_text
    )
}

/// Parse the model reply, tolerating a Markdown code fence around the JSON.
pub fn parse_analysis(text: &str) -> Result<CommentAnalysis> {
    let fence = CODE_FENCE.get_or_init(|| Regex::new(r"```(?:json)?").expect("static regex"));
    let cleaned = fence.replace_all(text, "");
    let analysis: CommentAnalysis = serde_json::from_str(cleaned.trim())?;
    Ok(analysis)
}
