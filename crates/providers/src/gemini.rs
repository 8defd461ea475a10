use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use futures::stream::{self, BoxStream, Stream, StreamExt};
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use shared::settings::AssistantSettings;
use std::collections::VecDeque;
use std::env;
use std::fmt;
use std::time::Duration;
use zeroize::Zeroizing;

use crate::model::{FragmentStream, ImagePayload, ModelRequest, RemoteModel};
use crate::sse::SseParser;

pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Gemini API key, wiped from memory on drop.
#[derive(Clone)]
pub struct ApiKey(Zeroizing<String>);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Result<Self> {
        let key = Zeroizing::new(key.into());
        if key.trim().is_empty() {
            return Err(anyhow!("{} is empty", API_KEY_ENV));
        }
        Ok(Self(key))
    }

    /// Read the key from `GEMINI_API_KEY`. Missing or blank is an error.
    pub fn from_env() -> Result<Self> {
        let key = env::var(API_KEY_ENV).map_err(|_| anyhow!("{} is not set", API_KEY_ENV))?;
        Self::new(key)
    }

    fn expose(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

// ── Request types ────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    role: &'static str,
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum GeminiPart {
    Text { text: String },
    InlineData { inline_data: GeminiInlineData },
}

#[derive(Debug, Serialize)]
struct GeminiInlineData {
    mime_type: String,
    data: String,
}

// ── Response types (shared by both endpoints) ────────────────────────

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiCandidateContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidateContent {
    #[serde(default)]
    parts: Vec<GeminiCandidatePart>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidatePart {
    #[serde(default)]
    text: Option<String>,
}

impl GeminiResponse {
    /// Concatenated text of the first candidate, if it has any.
    fn text(&self) -> Option<String> {
        let parts = &self.candidates.first()?.content.as_ref()?.parts;
        let text: String = parts.iter().filter_map(|p| p.text.as_deref()).collect();
        if parts.iter().all(|p| p.text.is_none()) {
            None
        } else {
            Some(text)
        }
    }
}

fn build_request(request: ModelRequest) -> GeminiRequest {
    let mut parts = vec![GeminiPart::Text {
        text: request.prompt,
    }];
    if let Some(ImagePayload { data, mime_type }) = request.image {
        parts.push(GeminiPart::InlineData {
            inline_data: GeminiInlineData { mime_type, data },
        });
    }
    GeminiRequest {
        contents: vec![GeminiContent { role: "user", parts }],
    }
}

// ── Client ───────────────────────────────────────────────────────────

pub struct GeminiClient {
    http: Client,
    api_key: ApiKey,
    model: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: ApiKey, settings: &AssistantSettings) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .pool_max_idle_per_host(2)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            http,
            api_key,
            model: settings.model.clone(),
            base_url: settings.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self, method: &str) -> String {
        format!("{}/v1beta/models/{}:{}", self.base_url, self.model, method)
    }

    async fn post(&self, url: &str, request: ModelRequest) -> Result<Response> {
        let body = build_request(request);
        let resp = self
            .http
            .post(url)
            .header("x-goog-api-key", self.api_key.expose())
            .json(&body)
            .send()
            .await?;
        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            let detail: String = body.trim().chars().take(800).collect();
            if detail.is_empty() {
                return Err(anyhow!("gemini error: {}", status));
            }
            return Err(anyhow!("gemini error: {}\n{}", status, detail));
        }
        Ok(resp)
    }
}

#[async_trait]
impl RemoteModel for GeminiClient {
    async fn generate(&self, request: ModelRequest) -> Result<String> {
        let url = self.endpoint("generateContent");
        tracing::debug!(model = %self.model, image = request.image.is_some(), "gemini generate");
        let resp = self.post(&url, request).await?;
        let body: GeminiResponse = resp.json().await?;
        body.text()
            .ok_or_else(|| anyhow!("gemini returned no candidate text"))
    }

    async fn generate_stream(&self, request: ModelRequest) -> Result<FragmentStream> {
        let url = format!("{}?alt=sse", self.endpoint("streamGenerateContent"));
        tracing::debug!(model = %self.model, "gemini stream");
        let resp = self.post(&url, request).await?;
        Ok(sse_fragments(resp.bytes_stream()))
    }
}

struct SseState<B, E> {
    body: BoxStream<'static, Result<B, E>>,
    parser: SseParser,
    /// Decoded items not yet handed out. An `Err` is always the last entry.
    pending: VecDeque<Result<String>>,
    finished: bool,
}

/// Turn an SSE response body into a stream of text fragments.
///
/// Fragments decoded before a read error or a malformed event are still
/// yielded; the error comes after them and ends the stream.
fn sse_fragments<S, B, E>(body: S) -> FragmentStream
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: fmt::Display + Send + 'static,
{
    let state = SseState {
        body: body.boxed(),
        parser: SseParser::new(),
        pending: VecDeque::new(),
        finished: false,
    };
    stream::unfold(state, |mut state| async move {
        loop {
            if let Some(item) = state.pending.pop_front() {
                return Some((item, state));
            }
            if state.finished {
                return None;
            }
            let events = match state.body.next().await {
                Some(Ok(bytes)) => state.parser.feed(bytes.as_ref()),
                Some(Err(e)) => {
                    state.finished = true;
                    state
                        .pending
                        .push_back(Err(anyhow!("stream read error: {}", e)));
                    continue;
                }
                None => {
                    state.finished = true;
                    state.parser.finish().into_iter().collect()
                }
            };
            for event in events {
                match serde_json::from_str::<GeminiResponse>(&event.data) {
                    Ok(chunk) => {
                        if let Some(text) = chunk.text().filter(|t| !t.is_empty()) {
                            state.pending.push_back(Ok(text));
                        }
                    }
                    Err(e) => {
                        state.finished = true;
                        state
                            .pending
                            .push_back(Err(anyhow!("malformed stream event: {}", e)));
                        break;
                    }
                }
            }
        }
    })
    .boxed()
}
