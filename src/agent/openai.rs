//! OpenAI-compatible agent
//!
//! Talks to any endpoint implementing the Chat Completions API (OpenAI,
//! DeepSeek, vLLM, ...). The agent keeps a small buffered model context so
//! multi-turn conversations carry over between calls.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::Instrument;

use super::sse::{SseDecoder, DONE_MARKER};
use super::{instrument_stream, Agent, ResponseStream, PROBE_TASK};
use crate::config::{ModelConfig, SecretString};
use crate::error::{ChatError, Result};
use crate::types::ResponseEvent;

/// Message in the upstream request format
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: &str, content: impl Into<String>) -> Self {
        Self {
            role: role.to_string(),
            content: content.into(),
        }
    }
}

/// Sliding window over the most recent messages sent to the model.
#[derive(Debug)]
pub struct BufferedContext {
    capacity: usize,
    messages: Mutex<VecDeque<ChatMessage>>,
}

impl BufferedContext {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            messages: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    pub fn snapshot(&self) -> Vec<ChatMessage> {
        self.lock().iter().cloned().collect()
    }

    /// Record a completed exchange, evicting the oldest messages past capacity.
    pub fn record(&self, task: &str, reply: &str) {
        let mut messages = self.lock();
        messages.push_back(ChatMessage::new("user", task));
        messages.push_back(ChatMessage::new("assistant", reply));
        while messages.len() > self.capacity {
            messages.pop_front();
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<ChatMessage>> {
        self.messages.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Agent backed by an OpenAI-compatible Chat Completions endpoint
pub struct OpenAiAgent {
    model: String,
    base_url: String,
    api_key: SecretString,
    system_message: String,
    client: reqwest::Client,
    context: Arc<BufferedContext>,
}

impl std::fmt::Debug for OpenAiAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiAgent")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key)
            .finish()
    }
}

impl OpenAiAgent {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            base_url: "https://api.openai.com".to_string(),
            api_key: SecretString::new(api_key),
            system_message: String::new(),
            client: reqwest::Client::new(),
            context: Arc::new(BufferedContext::new(10)),
        }
    }

    /// Build an agent from the `[model]` configuration section.
    pub fn from_config(config: &ModelConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.connect_timeout_secs {
            builder = builder.connect_timeout(std::time::Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| ChatError::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            model: config.model.clone(),
            base_url: normalize_base_url(&config.base_url),
            api_key: config.api_key.clone(),
            system_message: config.system_message.clone(),
            client,
            context: Arc::new(BufferedContext::new(config.buffer_size)),
        })
    }

    pub fn with_base_url(mut self, base_url: impl AsRef<str>) -> Self {
        self.base_url = normalize_base_url(base_url.as_ref());
        self
    }

    pub fn with_system_message(mut self, system_message: impl Into<String>) -> Self {
        self.system_message = system_message.into();
        self
    }

    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.context = Arc::new(BufferedContext::new(buffer_size));
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn context(&self) -> &BufferedContext {
        &self.context
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url)
    }

    /// System message, buffered context, then the new task.
    fn build_messages(&self, task: &str, with_context: bool) -> Vec<ChatMessage> {
        let mut messages = Vec::new();
        if !self.system_message.is_empty() {
            messages.push(ChatMessage::new("system", self.system_message.as_str()));
        }
        if with_context {
            messages.extend(self.context.snapshot());
        }
        messages.push(ChatMessage::new("user", task));
        messages
    }

    async fn complete(&self, messages: Vec<ChatMessage>) -> Result<String> {
        let request = CompletionRequest {
            model: self.model.clone(),
            messages,
            stream: false,
        };
        let url = self.endpoint();
        let response = send(&self.client, &url, &self.api_key, &request).await?;
        let body = response.text().await?;
        parse_completion(&body)
    }
}

/// Normalize base URL by stripping trailing /v1
fn normalize_base_url(base_url: &str) -> String {
    base_url
        .trim_end_matches('/')
        .trim_end_matches("/v1")
        .trim_end_matches('/')
        .to_string()
}

/// POST the request and fail with `Upstream` on transport errors or non-2xx.
async fn send(
    client: &reqwest::Client,
    url: &str,
    api_key: &SecretString,
    request: &CompletionRequest,
) -> Result<reqwest::Response> {
    tracing::debug!(url, stream = request.stream, messages = request.messages.len(), "HTTP POST");

    let response = client
        .post(url)
        .bearer_auth(api_key.expose())
        .json(request)
        .send()
        .await
        .map_err(|e| ChatError::Upstream(format!("Failed to send request to {url}: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ChatError::Upstream(format!(
            "API error at {url} ({status}): {body}"
        )));
    }
    Ok(response)
}

fn is_json_response(response: &reqwest::Response) -> bool {
    response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/json"))
}

/// Extract the assistant text from a non-streaming completion body.
fn parse_completion(body: &str) -> Result<String> {
    if let Ok(envelope) = serde_json::from_str::<ErrorEnvelope>(body) {
        return Err(ChatError::Upstream(envelope.error.message()));
    }
    let response: CompletionResponse = serde_json::from_str(body)
        .map_err(|e| ChatError::AdapterProtocol(format!("Failed to parse completion: {e}")))?;
    let choice = response.choices.into_iter().next().ok_or_else(|| {
        ChatError::AdapterProtocol("Completion contained no choices".to_string())
    })?;
    Ok(choice
        .message
        .content
        .or(choice.message.reasoning_content)
        .unwrap_or_default())
}

/// Per-run decoding state for a streamed completion
#[derive(Debug, Default)]
struct StreamState {
    text: String,
    done: bool,
    finish_reason: Option<String>,
}

impl StreamState {
    /// Decode one `data` payload into response events.
    fn handle(&mut self, data: &str) -> Result<Vec<ResponseEvent>> {
        if self.done {
            return Ok(Vec::new());
        }
        if data == DONE_MARKER {
            self.done = true;
            return Ok(vec![ResponseEvent::FinalMessage(self.text.clone())]);
        }

        let chunk: StreamChunk = serde_json::from_str(data).map_err(|e| {
            ChatError::AdapterProtocol(format!("Failed to parse stream chunk: {e}"))
        })?;
        if let Some(error) = chunk.error {
            return Err(ChatError::Upstream(error.message()));
        }

        let mut events = Vec::new();
        if let Some(choice) = chunk.choices.into_iter().next() {
            if let Some(delta) = choice.delta {
                if let Some(content) = delta.content.or(delta.reasoning_content) {
                    if !content.is_empty() {
                        self.text.push_str(&content);
                        events.push(ResponseEvent::Delta(content));
                    }
                }
            }
            if choice.finish_reason.is_some() {
                self.finish_reason = choice.finish_reason;
            }
        }
        Ok(events)
    }

    /// Close the run once the byte stream ends.
    ///
    /// A finish reason without `[DONE]` still counts as a normal close; a
    /// stream that ends with neither was cut off.
    fn finish(&mut self) -> Result<Option<ResponseEvent>> {
        if self.done {
            return Ok(None);
        }
        if self.finish_reason.is_some() {
            self.done = true;
            return Ok(Some(ResponseEvent::FinalMessage(self.text.clone())));
        }
        Err(ChatError::Upstream(
            "Upstream closed the stream before signaling completion".to_string(),
        ))
    }
}

/// Drive one streamed completion, recording the exchange in `context` on success.
fn completion_stream(
    client: reqwest::Client,
    url: String,
    api_key: SecretString,
    request: CompletionRequest,
    context: Arc<BufferedContext>,
    task: String,
) -> impl Stream<Item = Result<ResponseEvent>> + Send + 'static {
    async_stream::try_stream! {
        tracing::info!(model = %request.model, "Starting streaming completion");
        let response = send(&client, &url, &api_key, &request).await?;

        if is_json_response(&response) {
            // Upstream ignored `stream: true` and answered in one piece
            let body = response.text().await?;
            let text = parse_completion(&body)?;
            context.record(&task, &text);
            yield ResponseEvent::Aggregate(text);
        } else {
            let mut bytes = response.bytes_stream();
            let mut decoder = SseDecoder::new();
            let mut state = StreamState::default();

            while let Some(chunk) = bytes.next().await {
                let chunk = chunk
                    .map_err(|e| ChatError::Upstream(format!("Stream error: {e}")))?;
                for data in decoder.push(&chunk)? {
                    for event in state.handle(&data)? {
                        yield event;
                    }
                }
                if state.done {
                    break;
                }
            }
            if let Some(data) = decoder.finish() {
                for event in state.handle(&data)? {
                    yield event;
                }
            }
            if let Some(event) = state.finish()? {
                yield event;
            }

            context.record(&task, &state.text);
            tracing::info!(
                len = state.text.len(),
                finish_reason = ?state.finish_reason,
                "Streaming completion finished"
            );
        }
    }
}

#[async_trait]
impl Agent for OpenAiAgent {
    fn name(&self) -> &str {
        "openai"
    }

    fn invoke_streaming(&self, task: &str) -> ResponseStream {
        let request = CompletionRequest {
            model: self.model.clone(),
            messages: self.build_messages(task, true),
            stream: true,
        };
        let span = tracing::info_span!(
            "a3s.chat.completion",
            "a3s.chat.model" = %self.model,
            "a3s.chat.streaming" = true,
        );
        let events = completion_stream(
            self.client.clone(),
            self.endpoint(),
            self.api_key.clone(),
            request,
            self.context.clone(),
            task.to_string(),
        );
        Box::pin(instrument_stream(events, span))
    }

    async fn invoke(&self, task: &str) -> Result<String> {
        let span = tracing::info_span!(
            "a3s.chat.completion",
            "a3s.chat.model" = %self.model,
            "a3s.chat.streaming" = false,
        );
        async {
            let text = self.complete(self.build_messages(task, true)).await?;
            self.context.record(task, &text);
            tracing::info!(len = text.len(), "Completion finished");
            Ok(text)
        }
        .instrument(span)
        .await
    }

    /// Probe without touching the buffered conversation context.
    async fn probe(&self) -> Result<()> {
        let span = tracing::info_span!("a3s.chat.probe", "a3s.chat.model" = %self.model);
        self.complete(self.build_messages(PROBE_TASK, false))
            .instrument(span)
            .await
            .map(|_| ())
    }
}

// Upstream wire types. These never leave this module.

#[derive(Debug, Serialize)]
struct CompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    content: Option<String>,
    /// Reasoning/thinking content (DeepSeek-R1 and similar)
    reasoning_content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
    #[serde(default)]
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    delta: Option<StreamDelta>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StreamDelta {
    content: Option<String>,
    reasoning_content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ApiError {
    Detailed { message: String },
    Plain(String),
}

impl ApiError {
    fn message(self) -> String {
        match self {
            ApiError::Detailed { message } | ApiError::Plain(message) => message,
        }
    }
}
