//! OpenAI-compatible chat-completions client

use super::circuit_breaker::CircuitBreaker;
use super::generator::{GenerationError, TextGenerator};
use crate::config::GenerationConfig;
use crate::metrics::METRICS;
use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{debug, error, warn};

const OPERATION: &str = "chat_completions";
const SYSTEM_PROMPT: &str =
    "You are an experienced interviewer. Reply with a single interview question and nothing else.";

pub struct OpenAiClient {
    client: Client,
    config: GenerationConfig,
    api_key: Option<String>,
    breaker: CircuitBreaker,
}

impl OpenAiClient {
    /// Build a client; the API key is read from `config.api_key_env`
    pub fn new(config: GenerationConfig) -> Result<Self, GenerationError> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| GenerationError::Network(e.to_string()))?;

        let breaker = CircuitBreaker::new(config.circuit_breaker_failures, config.breaker_reset());
        let api_key = config.api_key();

        Ok(Self {
            client,
            config,
            api_key,
            breaker,
        })
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    fn request(&self, prompt: &str, temperature: f32, stream: bool) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.config.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: prompt.to_string(),
                },
            ],
            max_tokens: Some(self.config.max_tokens),
            temperature: Some(temperature),
            stream,
        }
    }

    fn post(&self, body: &ChatCompletionRequest) -> RequestBuilder {
        let mut req = self.client.post(&self.config.api_url).json(body);
        if let Some(ref api_key) = self.api_key {
            req = req.header("Authorization", format!("Bearer {}", api_key));
        }
        req
    }

    async fn complete_once(&self, body: &ChatCompletionRequest) -> Result<String, GenerationError> {
        let response = self
            .post(body)
            .send()
            .await
            .map_err(|e| GenerationError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(GenerationError::Api(format!("HTTP {}: {}", status, text)));
        }

        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::InvalidResponse(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content.trim().to_string())
            .ok_or_else(|| GenerationError::InvalidResponse("No choices in response".to_string()))
    }

    async fn stream_once(
        &self,
        body: &ChatCompletionRequest,
        tx: &mpsc::Sender<String>,
    ) -> Result<(), GenerationError> {
        let response = self
            .post(body)
            .send()
            .await
            .map_err(|e| GenerationError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(GenerationError::Api(format!("HTTP {}: {}", status, text)));
        }

        let mut stream = response.bytes_stream();
        let mut decoder = SseDecoder::default();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| GenerationError::StreamInterrupted(e.to_string()))?;

            for event in decoder.push(&chunk) {
                match event {
                    SseEvent::Done => return Ok(()),
                    SseEvent::Data(payload) => {
                        let parsed: ChatCompletionChunk = serde_json::from_str(&payload)
                            .map_err(|e| GenerationError::InvalidResponse(e.to_string()))?;
                        let fragments = parsed
                            .choices
                            .into_iter()
                            .filter_map(|choice| choice.delta.content)
                            .filter(|content| !content.is_empty());
                        for fragment in fragments {
                            tx.send(fragment).await.map_err(|_| {
                                GenerationError::StreamInterrupted("receiver dropped".to_string())
                            })?;
                        }
                    }
                }
            }
        }

        Err(GenerationError::StreamInterrupted(
            "stream ended before [DONE]".to_string(),
        ))
    }
}

#[async_trait]
impl TextGenerator for OpenAiClient {
    async fn complete(&self, prompt: &str, temperature: f32) -> Result<String, GenerationError> {
        self.breaker.check(OPERATION)?;

        let body = self.request(prompt, temperature, false);
        let start = Instant::now();
        let attempts = self.config.max_attempts.max(1);

        let mut attempt = 0;
        loop {
            match self.complete_once(&body).await {
                Ok(text) => {
                    self.breaker.record_success(OPERATION);
                    METRICS.record_generation("complete", true, start.elapsed().as_secs_f64());
                    return Ok(text);
                }
                Err(e) if attempt + 1 < attempts => {
                    warn!("Question generation attempt {} failed: {}", attempt, e);
                }
                Err(e) => {
                    self.breaker.record_failure(OPERATION);
                    METRICS.record_generation("complete", false, start.elapsed().as_secs_f64());
                    error!("Question generation failed after {} attempts: {}", attempts, e);
                    return Err(e);
                }
            }

            attempt += 1;
            debug!("Retry attempt {} for question generation", attempt);
            tokio::time::sleep(Duration::from_millis(100 * (1 << attempt))).await;
        }
    }

    /// Single attempt; the caller falls back to `complete` on failure
    async fn stream_complete(
        &self,
        prompt: &str,
        temperature: f32,
        tx: mpsc::Sender<String>,
    ) -> Result<(), GenerationError> {
        self.breaker.check(OPERATION)?;

        let body = self.request(prompt, temperature, true);
        let start = Instant::now();

        match self.stream_once(&body, &tx).await {
            Ok(()) => {
                self.breaker.record_success(OPERATION);
                METRICS.record_generation("stream", true, start.elapsed().as_secs_f64());
                Ok(())
            }
            Err(e) => {
                self.breaker.record_failure(OPERATION);
                METRICS.record_generation("stream", false, start.elapsed().as_secs_f64());
                error!("Streaming question generation failed: {}", e);
                Err(e)
            }
        }
    }

    fn name(&self) -> &str {
        &self.config.model
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum SseEvent {
    Data(String),
    Done,
}

/// Splits a server-sent-event byte stream into `data:` payloads
///
/// Bytes are buffered until a full line arrives so a UTF-8 character split
/// across two chunks is decoded whole.
#[derive(Debug, Default)]
struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    fn push(&mut self, chunk: &Bytes) -> Vec<SseEvent> {
        self.buffer.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some(line_end) = self.buffer.iter().position(|b| *b == b'\n') {
            let raw: Vec<u8> = self.buffer.drain(..=line_end).collect();
            let line = String::from_utf8_lossy(&raw);
            let line = line.trim();

            let Some(payload) = line.strip_prefix("data:") else {
                continue;
            };
            let payload = payload.trim();
            if payload == "[DONE]" {
                events.push(SseEvent::Done);
            } else if !payload.is_empty() {
                events.push(SseEvent::Data(payload.to_string()));
            }
        }
        events
    }
}

// OpenAI-compatible API types
#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    stream: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionChunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: ChunkDelta,
}

#[derive(Debug, Default, Deserialize)]
struct ChunkDelta {
    content: Option<String>,
}
