/// LLM Client: the single point of entry for all text-generation calls.
///
/// ARCHITECTURAL RULE: No other module may call the chat completions API directly.
/// All generation goes through the `TextGenerator` trait implemented here.
///
/// Talks to any OpenAI-compatible endpoint (Groq by default) with streaming
/// enabled; the stream is aggregated into one string before returning.
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::config::Config;

pub mod prompts;

const TEMPERATURE: f32 = 1.0;
const TOP_P: f32 = 1.0;
const MAX_TOKENS: u32 = 2048;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("stream ended before [DONE]")]
    StreamEnded,

    #[error("provider reported an error mid-stream: {0}")]
    StreamError(String),

    #[error("malformed stream event: {0}")]
    Malformed(String),

    #[error("LLM returned empty content")]
    EmptyContent,
}

/// Text generator boundary: prompt in, fully assembled text out.
///
/// No retry contract: any failure is terminal for that call.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError>;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    top_p: f32,
    max_tokens: u32,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct StreamChunk {
    choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: StreamDelta,
}

#[derive(Debug, Default, Deserialize)]
struct StreamDelta {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
    endpoint: String,
    model: String,
}

impl LlmClient {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        Self::with_endpoint(
            config.llm_api_key.clone(),
            &config.llm_base_url,
            config.llm_model.clone(),
        )
    }

    /// Client for any OpenAI-compatible base URL (`…/v1`).
    pub fn with_endpoint(api_key: String, base_url: &str, model: String) -> anyhow::Result<Self> {
        Ok(Self {
            client: Client::builder()
                .timeout(Duration::from_secs(300))
                .build()?,
            api_key,
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            model,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl TextGenerator for LlmClient {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        let request_body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: prompts::CAREER_COACH_SYSTEM,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: TEMPERATURE,
            top_p: TOP_P,
            max_tokens: MAX_TOKENS,
            stream: true,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let mut stream = response.bytes_stream();
        let mut aggregator = StreamAggregator::default();
        while let Some(chunk) = stream.next().await {
            if aggregator.push(&chunk?)? {
                break;
            }
        }

        let text = aggregator.finish()?;
        debug!("LLM stream complete: {} chars", text.len());
        Ok(text)
    }
}

/// Accumulates server-sent events into the assembled completion text.
///
/// Bytes are buffered until a full line is available, so multibyte characters
/// split across network reads decode intact. Lines may end in `\n` or `\r\n`.
#[derive(Debug, Default)]
struct StreamAggregator {
    buffer: Vec<u8>,
    out: String,
    done: bool,
}

impl StreamAggregator {
    /// Feeds raw bytes; returns true once `[DONE]` has been seen.
    fn push(&mut self, bytes: &[u8]) -> Result<bool, LlmError> {
        if self.done {
            return Ok(true);
        }
        self.buffer.extend_from_slice(bytes);
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            if self.handle_line(&line)? {
                self.done = true;
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Handles one SSE line; returns true on `[DONE]`.
    fn handle_line(&mut self, raw: &[u8]) -> Result<bool, LlmError> {
        let line = std::str::from_utf8(raw)
            .map_err(|e| LlmError::Malformed(format!("line is not valid UTF-8: {e}")))?;
        let line = line.trim_end_matches(|c| c == '\r' || c == '\n');
        // Blank separators, comments, `event:` and `id:` fields carry no text.
        let Some(data) = line.strip_prefix("data:") else {
            return Ok(false);
        };
        let data = data.trim();
        if data == "[DONE]" {
            return Ok(true);
        }
        if data.is_empty() {
            return Ok(false);
        }

        match serde_json::from_str::<StreamChunk>(data) {
            Ok(chunk) => {
                if let Some(piece) = chunk
                    .choices
                    .first()
                    .and_then(|c| c.delta.content.as_deref())
                {
                    self.out.push_str(piece);
                }
                Ok(false)
            }
            Err(parse_error) => match serde_json::from_str::<ApiError>(data) {
                Ok(api) => Err(LlmError::StreamError(api.error.message)),
                Err(_) => Err(LlmError::Malformed(parse_error.to_string())),
            },
        }
    }

    fn finish(mut self) -> Result<String, LlmError> {
        // A final line may arrive without its terminator before the connection closes.
        if !self.done && !self.buffer.is_empty() {
            let rest = std::mem::take(&mut self.buffer);
            self.done = self.handle_line(&rest)?;
        }
        if !self.done {
            return Err(LlmError::StreamEnded);
        }
        if self.out.trim().is_empty() {
            return Err(LlmError::EmptyContent);
        }
        Ok(self.out)
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    use super::*;

    fn event(content: &str) -> String {
        format!(
            "data: {}\n\n",
            serde_json::json!({"choices": [{"delta": {"content": content}}]})
        )
    }

    #[test]
    fn test_aggregates_deltas_until_done() {
        let mut agg = StreamAggregator::default();
        assert!(!agg.push(event("summary: ").as_bytes()).unwrap());
        assert!(!agg.push(event("hello").as_bytes()).unwrap());
        assert!(agg.push(b"data: [DONE]\n\n").unwrap());
        assert_eq!(agg.finish().unwrap(), "summary: hello");
    }

    #[test]
    fn test_event_split_across_chunks() {
        let full = event("abc");
        let (head, tail) = full.split_at(10);
        let mut agg = StreamAggregator::default();
        agg.push(head.as_bytes()).unwrap();
        agg.push(tail.as_bytes()).unwrap();
        agg.push(b"data: [DONE]\n\n").unwrap();
        assert_eq!(agg.finish().unwrap(), "abc");
    }

    #[test]
    fn test_multibyte_character_split_across_chunks() {
        let full = event("résumé");
        let bytes = full.as_bytes();
        // Split between the two bytes of the first 'é'.
        let split = bytes.iter().position(|&b| b == 0xC3).unwrap() + 1;
        let mut agg = StreamAggregator::default();
        agg.push(&bytes[..split]).unwrap();
        agg.push(&bytes[split..]).unwrap();
        agg.push(b"data: [DONE]\n\n").unwrap();
        assert_eq!(agg.finish().unwrap(), "résumé");
    }

    #[test]
    fn test_crlf_separated_events() {
        let mut agg = StreamAggregator::default();
        let ok = event("ok").replace('\n', "\r\n");
        agg.push(ok.as_bytes()).unwrap();
        assert!(agg.push(b"data: [DONE]\r\n\r\n").unwrap());
        assert_eq!(agg.finish().unwrap(), "ok");
    }

    #[test]
    fn test_done_without_trailing_newline() {
        let mut agg = StreamAggregator::default();
        agg.push(event("tail").as_bytes()).unwrap();
        assert!(!agg.push(b"data: [DONE]").unwrap());
        assert_eq!(agg.finish().unwrap(), "tail");
    }

    #[test]
    fn test_role_only_delta_is_skipped() {
        let mut agg = StreamAggregator::default();
        agg.push(b"data: {\"choices\": [{\"delta\": {\"role\": \"assistant\"}}]}\n\n")
            .unwrap();
        agg.push(b": keep-alive\n\n").unwrap();
        agg.push(event("x").as_bytes()).unwrap();
        agg.push(b"data: [DONE]\n\n").unwrap();
        assert_eq!(agg.finish().unwrap(), "x");
    }

    #[test]
    fn test_error_event_fails_the_call() {
        let mut agg = StreamAggregator::default();
        agg.push(event("partial").as_bytes()).unwrap();
        let err = agg
            .push(b"data: {\"error\": {\"message\": \"model overloaded\"}}\n\n")
            .unwrap_err();
        match err {
            LlmError::StreamError(message) => assert_eq!(message, "model overloaded"),
            other => panic!("expected StreamError, got {other:?}"),
        }
    }

    #[test]
    fn test_unparsable_event_is_malformed() {
        let mut agg = StreamAggregator::default();
        let err = agg.push(b"data: {not json\n\n").unwrap_err();
        assert!(matches!(err, LlmError::Malformed(_)));
    }

    #[test]
    fn test_missing_done_is_stream_ended() {
        let mut agg = StreamAggregator::default();
        agg.push(event("partial").as_bytes()).unwrap();
        assert!(matches!(agg.finish(), Err(LlmError::StreamEnded)));
    }

    #[test]
    fn test_blank_output_is_empty_content() {
        let mut agg = StreamAggregator::default();
        agg.push(event("  ").as_bytes()).unwrap();
        agg.push(b"data: [DONE]\n\n").unwrap();
        assert!(matches!(agg.finish(), Err(LlmError::EmptyContent)));
    }

    /// Reads one HTTP request (headers plus a Content-Length body).
    async fn read_request(socket: &mut TcpStream) {
        let mut received = Vec::new();
        let mut buf = [0u8; 4096];
        loop {
            let n = socket.read(&mut buf).await.unwrap();
            if n == 0 {
                return;
            }
            received.extend_from_slice(&buf[..n]);
            let Some(end) = received.windows(4).position(|w| w == b"\r\n\r\n") else {
                continue;
            };
            let head = String::from_utf8_lossy(&received[..end]).to_lowercase();
            let body_len = head
                .lines()
                .find_map(|l| l.strip_prefix("content-length:"))
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if received.len() >= end + 4 + body_len {
                return;
            }
        }
    }

    /// Serves one streaming response, writing each part as its own read.
    async fn serve_stream(parts: Vec<Vec<u8>>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            read_request(&mut socket).await;
            socket
                .write_all(
                    b"HTTP/1.1 200 OK\r\ncontent-type: text/event-stream\r\nconnection: close\r\n\r\n",
                )
                .await
                .unwrap();
            for part in parts {
                let _ = socket.write_all(&part).await;
                let _ = socket.flush().await;
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
            let _ = socket.shutdown().await;
        });
        format!("http://{addr}/v1")
    }

    #[tokio::test]
    async fn test_generate_reassembles_split_utf8_over_crlf_stream() {
        let body = format!("{}data: [DONE]\n\n", event("résumé")).replace('\n', "\r\n");
        let bytes = body.into_bytes();
        let split = bytes.iter().position(|&b| b == 0xC3).unwrap() + 1;
        let base_url = serve_stream(vec![bytes[..split].to_vec(), bytes[split..].to_vec()]).await;

        let client =
            LlmClient::with_endpoint("test-key".to_string(), &base_url, "test-model".to_string())
                .unwrap();
        let text = client.generate("tailor this").await.unwrap();

        assert_eq!(text, "résumé");
    }

    #[tokio::test]
    async fn test_generate_surfaces_mid_stream_error() {
        let body = format!(
            "{}data: {{\"error\": {{\"message\": \"rate limited\"}}}}\n\ndata: [DONE]\n\n",
            event("half a docu")
        );
        let base_url = serve_stream(vec![body.into_bytes()]).await;

        let client =
            LlmClient::with_endpoint("test-key".to_string(), &base_url, "test-model".to_string())
                .unwrap();
        let err = client.generate("tailor this").await.unwrap_err();

        assert!(matches!(err, LlmError::StreamError(ref m) if m == "rate limited"));
    }
}
