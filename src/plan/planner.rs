use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use base64::Engine as _;
use serde::{Deserialize, Serialize};

use crate::component::component_model::RawComponentSet;
use crate::error::{FusionError, FusionResult};
use crate::plan::plan_model::PlannerResponse;
use crate::plan::response::parse_planner_reply;
use crate::plan::retry::RetryPolicy;

// ============================================================================
// SemanticPlanner trait: boundary to the reasoning model
// ============================================================================

/// Everything the planner sees: the screenshot and the detector's output.
pub struct PlanRequest<'a> {
    pub image: &'a [u8],
    pub mime_type: &'a str,
    pub raw: &'a RawComponentSet,
}

/// Turns a screenshot plus raw detections into structural edits.
pub trait SemanticPlanner {
    fn plan(&self, request: &PlanRequest<'_>) -> FusionResult<PlannerResponse>;
}

#[derive(Serialize)]
struct ComponentSummary<'a> {
    index: usize,
    class: &'a str,
    text: &'a str,
    clickable: bool,
    bounds: [i32; 4],
}

/// Compact JSON listing of the raw components, one entry per detection.
pub fn summarize_components(raw: &RawComponentSet) -> String {
    let summary: Vec<ComponentSummary<'_>> = raw
        .components
        .iter()
        .map(|c| ComponentSummary {
            index: c.index,
            class: &c.class,
            text: &c.text,
            clickable: c.clickable,
            bounds: [c.bounds.x, c.bounds.y, c.bounds.width, c.bounds.height],
        })
        .collect();
    serde_json::to_string(&summary).unwrap_or_else(|_| "[]".to_string())
}

/// Guess a MIME type from a file extension, defaulting to PNG.
pub fn mime_type_for(path: &str) -> &'static str {
    let lower = path.to_lowercase();
    if lower.ends_with(".jpg") || lower.ends_with(".jpeg") {
        "image/jpeg"
    } else if lower.ends_with(".webp") {
        "image/webp"
    } else if lower.ends_with(".gif") {
        "image/gif"
    } else {
        "image/png"
    }
}

// ============================================================================
// MockPlanner: canned reply, no network
// ============================================================================

/// Planner that always answers with the same reply text.
pub struct MockPlanner {
    pub reply: String,
}

impl MockPlanner {
    pub fn with_reply(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
        }
    }
}

impl SemanticPlanner for MockPlanner {
    fn plan(&self, _request: &PlanRequest<'_>) -> FusionResult<PlannerResponse> {
        parse_planner_reply(&self.reply)
    }
}

// ============================================================================
// VlmPlanner: OpenAI-compatible chat completions
// ============================================================================

const SYSTEM_PROMPT: &str = "You are a UI structure analyst. Given a screenshot and a numbered \
list of detected components, describe the page regions in `page_analysis` and return \
`operations`: merge fragments of one widget, delete duplicates and noise, keep independent \
components. Reference components only by index and never output coordinates. Every index \
must appear in exactly one operation. Reply with JSON only.";

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: String,
}

/// Vision-language planner reached over HTTP.
///
/// Parsed replies are memoized per instance, keyed by a fingerprint of the
/// image bytes and component summary. Dropping the planner drops its cache.
pub struct VlmPlanner {
    endpoint: String,
    model: String,
    api_key: Option<String>,
    retry: RetryPolicy,
    client: reqwest::blocking::Client,
    cache: Mutex<HashMap<String, PlannerResponse>>,
}

impl VlmPlanner {
    pub fn new(
        endpoint: &str,
        model: &str,
        api_key: Option<String>,
        timeout: Duration,
        retry: RetryPolicy,
    ) -> FusionResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;

        Ok(Self {
            endpoint: endpoint.to_string(),
            model: model.to_string(),
            api_key,
            retry,
            client,
            cache: Mutex::new(HashMap::new()),
        })
    }

    pub fn cache_len(&self) -> usize {
        self.cache.lock().map(|c| c.len()).unwrap_or(0)
    }

    fn build_body(&self, request: &PlanRequest<'_>, summary: &str) -> serde_json::Value {
        let image_b64 = base64::engine::general_purpose::STANDARD.encode(request.image);
        let user_prompt = format!(
            "Image resolution: {}x{} pixels.\nDetected components ({}):\n{}\n\nReturn only JSON.",
            request.raw.width(),
            request.raw.height(),
            request.raw.components.len(),
            summary
        );

        serde_json::json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                {
                    "role": "user",
                    "content": [
                        {
                            "type": "image_url",
                            "image_url": { "url": format!("data:{};base64,{}", request.mime_type, image_b64) }
                        },
                        { "type": "text", "text": user_prompt }
                    ]
                }
            ],
            "temperature": 0.1,
            "max_tokens": 8192
        })
    }

    /// One HTTP round trip. The inner `Err` is a retryable failure; the
    /// outer one is fatal.
    fn attempt(&self, body: &serde_json::Value) -> FusionResult<Result<PlannerResponse, FusionError>> {
        let mut req = self.client.post(&self.endpoint).json(body);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }

        let response = match req.send() {
            Ok(r) => r,
            Err(e) if e.is_timeout() || e.is_connect() => {
                tracing::warn!(error = %e, "planner request failed, will retry");
                return Ok(Err(FusionError::Http(e)));
            }
            Err(e) => return Err(FusionError::Http(e)),
        };

        let status = response.status().as_u16();
        if !response.status().is_success() {
            let body = response.text().unwrap_or_default();
            let err = FusionError::PlannerStatus { status, body };
            if RetryPolicy::is_retryable(status) {
                tracing::warn!(status, "planner returned retryable status");
                return Ok(Err(err));
            }
            return Err(err);
        }

        let chat: ChatResponse = response.json()?;
        let content = chat
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| FusionError::Planner("reply has no choices".to_string()))?;

        // Malformed replies count as retryable.
        match parse_planner_reply(&content) {
            Ok(parsed) => Ok(Ok(parsed)),
            Err(e) => {
                tracing::warn!(error = %e, "planner reply unparseable, will retry");
                Ok(Err(e))
            }
        }
    }
}

impl SemanticPlanner for VlmPlanner {
    fn plan(&self, request: &PlanRequest<'_>) -> FusionResult<PlannerResponse> {
        let summary = summarize_components(request.raw);
        let key = request_fingerprint(request.image, &summary);

        if let Ok(cache) = self.cache.lock() {
            if let Some(hit) = cache.get(&key) {
                tracing::debug!(key = %key, "planner cache hit");
                return Ok(hit.clone());
            }
        }

        let body = self.build_body(request, &summary);
        tracing::info!(
            model = %self.model,
            components = request.raw.components.len(),
            "requesting semantic plan"
        );

        let mut last_error = None;
        for attempt in 0..self.retry.max_attempts {
            let delay = self.retry.delay_before(attempt);
            if !delay.is_zero() {
                tracing::info!(attempt = attempt + 1, delay_ms = delay.as_millis() as u64, "backing off");
                std::thread::sleep(delay);
            }

            match self.attempt(&body)? {
                Ok(parsed) => {
                    if let Ok(mut cache) = self.cache.lock() {
                        cache.insert(key, parsed.clone());
                    }
                    return Ok(parsed);
                }
                Err(e) => last_error = Some(e),
            }
        }

        Err(FusionError::Planner(format!(
            "gave up after {} attempts: {}",
            self.retry.max_attempts,
            last_error.map(|e| e.to_string()).unwrap_or_default()
        )))
    }
}

/// SHA-1 over the image bytes and the component summary.
pub fn request_fingerprint(image: &[u8], summary: &str) -> String {
    use sha1::{Digest, Sha1};

    let mut hasher = Sha1::new();
    hasher.update(image);
    hasher.update(summary.as_bytes());
    format!("{:x}", hasher.finalize())
}
