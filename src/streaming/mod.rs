//! Streaming token decoding for chat completions
//!
//! The wire format is an SSE-like stream of `data: <json>` lines terminated
//! by `data: [DONE]`, always in the OpenAI-compatible chat shape regardless
//! of which adapter initiated the request. [`SseChunkDecoder`] owns the
//! byte-buffer state machine; [`stream_chat_completions`] wires it to a live
//! HTTP response with explicit cancellation.
//!
//! The token sequence is lazy, finite and not restartable: replaying
//! requires a new request.

use std::pin::Pin;

use futures_util::{Stream, StreamExt};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::error::GenError;
use crate::transport::HttpTransport;
use crate::types::ProviderConfig;

/// A lazy, cancellable sequence of text deltas.
pub type ChatStream = Pin<Box<dyn Stream<Item = Result<String, GenError>> + Send>>;

/// A handle that can be used to request cancellation of a running stream.
///
/// Firing it terminates the sequence without further chunks and drops the
/// underlying HTTP connection so the provider stops generating tokens.
#[derive(Clone, Debug)]
pub struct CancelHandle {
    token: CancellationToken,
}

impl CancelHandle {
    fn new() -> Self {
        Self {
            token: CancellationToken::new(),
        }
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Check if cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// A chat token stream together with its cancel handle.
pub struct ChatStreamHandle {
    pub stream: ChatStream,
    pub cancel: CancelHandle,
}

impl std::fmt::Debug for ChatStreamHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatStreamHandle")
            .field("cancel", &self.cancel)
            .finish_non_exhaustive()
    }
}

/// Message role in a chat request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

/// One chat message.
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }
}

/// A chat completion request.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
}

impl ChatRequest {
    /// A single-turn user request.
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            messages: vec![ChatMessage::user(prompt)],
        }
    }

    /// Prepend a system message.
    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.messages.insert(0, ChatMessage::system(system_prompt));
        self
    }

    fn to_wire(&self, stream: bool) -> serde_json::Value {
        serde_json::json!({
            "model": self.model,
            "messages": self.messages,
            "stream": stream,
        })
    }
}

const EVENT_PREFIX: &str = "data:";
const DONE_SENTINEL: &str = "[DONE]";

/// Byte-level decoder for the `data:`-delimited token stream.
///
/// Chunks are accumulated and split on newlines; the trailing (possibly
/// incomplete) segment stays buffered until the next chunk, so the decoder
/// is invariant to how the transport slices the bytes. Lines that fail to
/// parse as JSON are skipped; a single malformed event never aborts the
/// stream. Splitting the buffer on raw `\n` bytes is safe for multi-byte
/// UTF-8 content since no continuation byte equals `0x0A`.
#[derive(Debug, Default)]
pub struct SseChunkDecoder {
    buffer: Vec<u8>,
    done: bool,
}

impl SseChunkDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the `[DONE]` sentinel was seen. This may happen before the
    /// underlying transport closes.
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Feed one transport chunk, returning the text deltas completed by it.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        let mut tokens = Vec::new();
        if self.done {
            return tokens;
        }

        self.buffer.extend_from_slice(chunk);

        while let Some(newline_pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=newline_pos).collect();
            let line = String::from_utf8_lossy(&line[..newline_pos]);
            let trimmed = line.trim();

            let Some(payload) = trimmed.strip_prefix(EVENT_PREFIX) else {
                continue;
            };
            let payload = payload.trim();

            if payload == DONE_SENTINEL {
                self.done = true;
                self.buffer.clear();
                break;
            }

            let Ok(parsed) = serde_json::from_str::<serde_json::Value>(payload) else {
                continue;
            };
            if let Some(content) = parsed["choices"][0]["delta"]["content"].as_str() {
                if !content.is_empty() {
                    tokens.push(content.to_string());
                }
            }
        }

        tokens
    }
}

/// Open a streaming chat completion and decode it into a token stream.
///
/// The returned handle's sequence terminates when the `[DONE]` sentinel is
/// seen, the connection closes, or the cancel handle fires; after
/// cancellation no further chunks are yielded.
pub fn stream_chat_completions(
    config: &ProviderConfig,
    request: &ChatRequest,
) -> Result<ChatStreamHandle, GenError> {
    config.validate()?;

    let url = format!(
        "{}/chat/completions",
        config.base_url.trim_end_matches('/')
    );
    let api_key = config.api_key.clone();
    let body = request.to_wire(true);

    let cancel = CancelHandle::new();
    let token = cancel.token.clone();

    let stream = async_stream::stream! {
        let client = reqwest::Client::new();
        let send = client
            .post(&url)
            .bearer_auth(&api_key)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .json(&body)
            .send();

        let response = tokio::select! {
            _ = token.cancelled() => return,
            result = send => match result {
                Ok(response) => response,
                Err(e) => {
                    yield Err(GenError::from(e));
                    return;
                }
            },
        };

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Stream request failed".to_string());
            yield Err(GenError::Http { status, message });
            return;
        }

        let mut bytes = response.bytes_stream();
        let mut decoder = SseChunkDecoder::new();

        loop {
            tokio::select! {
                _ = token.cancelled() => return,
                chunk = bytes.next() => {
                    let Some(chunk) = chunk else { break };
                    let chunk = match chunk {
                        Ok(chunk) => chunk,
                        Err(e) => {
                            yield Err(GenError::from(e));
                            return;
                        }
                    };
                    for delta in decoder.feed(&chunk) {
                        yield Ok(delta);
                    }
                    if decoder.is_done() {
                        return;
                    }
                }
            }
        }
    };

    Ok(ChatStreamHandle {
        stream: Box::pin(stream),
        cancel,
    })
}

/// Non-streaming chat completion: returns the first choice's message text.
pub async fn chat_completion(
    config: &ProviderConfig,
    request: &ChatRequest,
) -> Result<String, GenError> {
    let transport = HttpTransport::new(config)?;
    let response = transport
        .post_json("/chat/completions", &request.to_wire(false))
        .await?;

    response["choices"][0]["message"]["content"]
        .as_str()
        .map(|s| s.to_string())
        .ok_or_else(|| {
            GenError::response_format("Chat response contained no message content")
        })
}

/// Drain a token stream into the full response text, stopping at the first
/// error.
pub async fn collect_text(mut stream: ChatStream) -> Result<String, GenError> {
    let mut full_response = String::new();
    while let Some(delta) = stream.next().await {
        full_response.push_str(&delta?);
    }
    Ok(full_response)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_whole(bytes: &[u8]) -> Vec<String> {
        let mut decoder = SseChunkDecoder::new();
        decoder.feed(bytes)
    }

    fn sse_body() -> Vec<u8> {
        let mut body = Vec::new();
        for token in ["Hello", ", ", "世界", "!"] {
            body.extend_from_slice(
                format!(
                    "data: {{\"choices\":[{{\"delta\":{{\"content\":\"{token}\"}}}}]}}\n\n"
                )
                .as_bytes(),
            );
        }
        body.extend_from_slice(b"data: [DONE]\n\n");
        body
    }

    #[test]
    fn decodes_token_sequence() {
        let tokens = decode_whole(&sse_body());
        assert_eq!(tokens, vec!["Hello", ", ", "世界", "!"]);
    }

    #[test]
    fn decoding_is_chunk_boundary_invariant() {
        let body = sse_body();
        let expected = decode_whole(&body);

        // Split at every byte offset, including inside the multi-byte token.
        for split in 0..=body.len() {
            let mut decoder = SseChunkDecoder::new();
            let mut tokens = decoder.feed(&body[..split]);
            tokens.extend(decoder.feed(&body[split..]));
            assert_eq!(tokens, expected, "tokens diverged at split offset {split}");
        }
    }

    #[test]
    fn malformed_json_lines_are_skipped() {
        let body = b"data: {\"choices\":[{\"delta\":{\"content\":\"a\"}}]}\n\
                     data: {not json}\n\
                     data: {\"choices\":[{\"delta\":{\"content\":\"b\"}}]}\n";
        assert_eq!(decode_whole(body), vec!["a", "b"]);
    }

    #[test]
    fn done_sentinel_terminates_immediately() {
        let mut decoder = SseChunkDecoder::new();
        let tokens = decoder.feed(
            b"data: {\"choices\":[{\"delta\":{\"content\":\"a\"}}]}\n\
              data: [DONE]\n\
              data: {\"choices\":[{\"delta\":{\"content\":\"late\"}}]}\n",
        );
        assert_eq!(tokens, vec!["a"]);
        assert!(decoder.is_done());

        // Anything fed afterwards is ignored.
        assert!(decoder
            .feed(b"data: {\"choices\":[{\"delta\":{\"content\":\"later\"}}]}\n")
            .is_empty());
    }

    #[test]
    fn non_data_lines_are_ignored() {
        let body = b": keep-alive\n\
                     event: message\n\
                     \n\
                     data: {\"choices\":[{\"delta\":{\"content\":\"x\"}}]}\n";
        assert_eq!(decode_whole(body), vec!["x"]);
    }

    #[test]
    fn empty_and_absent_deltas_yield_nothing() {
        let body = b"data: {\"choices\":[{\"delta\":{\"content\":\"\"}}]}\n\
                     data: {\"choices\":[{\"delta\":{\"role\":\"assistant\"}}]}\n\
                     data: {\"choices\":[]}\n";
        assert!(decode_whole(body).is_empty());
    }

    #[test]
    fn system_prompt_is_prepended() {
        let request =
            ChatRequest::new("gpt-4o-mini", "hi").with_system_prompt("be terse");
        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[0].role, MessageRole::System);
        assert_eq!(request.messages[1].role, MessageRole::User);

        let wire = request.to_wire(true);
        assert_eq!(wire["stream"], true);
        assert_eq!(wire["messages"][0]["role"], "system");
    }

    fn provider_config(base_url: &str) -> ProviderConfig {
        ProviderConfig {
            id: "openai".to_string(),
            name: None,
            base_url: base_url.to_string(),
            api_key: "sk-test".to_string(),
            models: vec![],
        }
    }

    #[tokio::test]
    async fn streams_tokens_from_server() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("POST", "/chat/completions")
            .match_header("authorization", "Bearer sk-test")
            .with_status(200)
            .with_header("content-type", "text/event-stream")
            .with_body(sse_body())
            .create_async()
            .await;

        let handle =
            stream_chat_completions(&provider_config(&server.url()), &ChatRequest::new("m", "hi"))
                .unwrap();
        let text = collect_text(handle.stream).await.unwrap();
        assert_eq!(text, "Hello, 世界!");
    }

    #[tokio::test]
    async fn handshake_failure_surfaces_http_error() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("POST", "/chat/completions")
            .with_status(401)
            .with_body("{\"error\":{\"message\":\"bad key\"}}")
            .create_async()
            .await;

        let handle =
            stream_chat_completions(&provider_config(&server.url()), &ChatRequest::new("m", "hi"))
                .unwrap();
        let err = collect_text(handle.stream).await.expect_err("401 expected");
        assert_eq!(err.status_code(), Some(401));
    }

    #[tokio::test]
    async fn cancelled_stream_yields_nothing() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_body(sse_body())
            .create_async()
            .await;

        let mut handle =
            stream_chat_completions(&provider_config(&server.url()), &ChatRequest::new("m", "hi"))
                .unwrap();
        handle.cancel.cancel();
        assert!(handle.cancel.is_cancelled());

        // Cancellation fired before the handshake completed, so the stream
        // terminates without items.
        assert!(handle.stream.next().await.is_none());
    }

    #[tokio::test]
    async fn missing_config_fails_before_connecting() {
        let mut config = provider_config("https://example.com");
        config.api_key = String::new();
        let err = stream_chat_completions(&config, &ChatRequest::new("m", "hi"))
            .expect_err("config error expected");
        assert!(matches!(err, GenError::Config(_)));
    }
}
