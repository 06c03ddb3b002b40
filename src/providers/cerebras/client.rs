use super::types::{
    error_message, ChatCompletionChunk, ChatCompletionRequest, ChatCompletionResponse,
};
use crate::config::{ClientConfig, DEFAULT_BASE_URL};
use crate::error::BoxError;
use crate::provider::CompletionProvider;
use crate::sse_stream::SseStreamExt;
use crate::{CompletionRequest, Error, Response, StreamEvent};
use futures_util::{future, stream, Stream, StreamExt};
use reqwest::Client;
use std::time::Duration;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Longest silence tolerated between reads. A streamed generation may run longer in total.
const READ_TIMEOUT: Duration = Duration::from_secs(120);

/// Cerebras Cloud provider, speaking the OpenAI-compatible chat completions API.
pub struct CerebrasProvider {
    client: Client,
    api_key: String,
    base_url: String,
}

impl CerebrasProvider {
    /// Create a new provider against the public endpoint.
    pub fn new(api_key: String) -> Result<Self, Error> {
        Self::new_with_base_url(api_key, DEFAULT_BASE_URL.to_string())
    }

    /// Create a new provider with a custom base URL.
    pub fn new_with_base_url(api_key: String, base_url: String) -> Result<Self, Error> {
        Self::with_read_timeout(api_key, base_url, READ_TIMEOUT)
    }

    pub(crate) fn with_read_timeout(
        api_key: String,
        base_url: String,
        read_timeout: Duration,
    ) -> Result<Self, Error> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .read_timeout(read_timeout)
            .build()?;

        Ok(Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Create a provider from resolved client configuration.
    pub fn from_config(config: &ClientConfig) -> Result<Self, Error> {
        Self::new_with_base_url(config.api_key.clone(), config.base_url.clone())
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

/// Turn a streamed response body into completion events.
///
/// Ends at the `[DONE]` sentinel or when the body ends. Frames that are not
/// valid chunk JSON are skipped. A transport error or an in-band `error`
/// frame is yielded once and ends the stream.
pub(crate) fn chunk_events<S, B, E>(
    body: S,
) -> impl Stream<Item = Result<StreamEvent, Error>> + Send
where
    S: Stream<Item = Result<B, E>> + Unpin + Send,
    B: AsRef<[u8]> + Send,
    E: Into<BoxError> + Send,
{
    body.sse_events()
        .take_while(|event| future::ready(!matches!(event, Ok(event) if event.is_done())))
        .filter_map(|event| async move {
            match event {
                Ok(event) => match serde_json::from_str::<ChatCompletionChunk>(&event.data) {
                    Ok(chunk) => Some(chunk.into_events()),
                    Err(e) => {
                        tracing::debug!(error = %e, data = %event.data, "skipping unparseable stream frame");
                        None
                    }
                },
                Err(e) => Some(Err(e)),
            }
        })
        .flat_map(|events| {
            let events = match events {
                Ok(events) => events.into_iter().map(Ok).collect::<Vec<_>>(),
                Err(e) => vec![Err(e)],
            };
            stream::iter(events)
        })
        .scan(false, |failed, event| {
            if *failed {
                return future::ready(None);
            }
            *failed = event.is_err();
            future::ready(Some(event))
        })
}

#[async_trait::async_trait]
impl CompletionProvider for CerebrasProvider {
    async fn generate(&self, request: &CompletionRequest) -> Result<Response, Error> {
        let url = self.endpoint();
        let body = ChatCompletionRequest::from(request);

        tracing::debug!(
            url = %url,
            model = %body.model,
            message_count = body.messages.len(),
            max_tokens = body.max_tokens,
            temperature = body.temperature,
            stream = body.stream,
            "sending completion request"
        );

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::debug!(status = status.as_u16(), "completion request rejected");
            return Err(Error::api(status.as_u16(), error_text));
        }

        if request.stream {
            return Ok(Response::from_stream(chunk_events(response.bytes_stream())));
        }

        let text = response.text().await?;
        let parsed: ChatCompletionResponse = serde_json::from_str(&text)?;
        if let Some(error) = &parsed.error {
            tracing::debug!(error = %error_message(error), "completion response carried an error");
            return Err(Error::api(status.as_u16(), text));
        }
        if parsed.choices.is_empty() {
            tracing::warn!(id = ?parsed.id, "completion response contained no choices");
        }

        Ok(Response::from_complete(parsed.into_complete()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn frames(parts: &[&'static str]) -> Vec<Result<Bytes, std::io::Error>> {
        parts.iter().map(|p| Ok(Bytes::from_static(p.as_bytes()))).collect()
    }

    #[test]
    fn test_default_endpoint() {
        let provider = CerebrasProvider::new("test-key".to_string()).unwrap();
        assert_eq!(provider.endpoint(), format!("{DEFAULT_BASE_URL}/chat/completions"));
    }

    #[test]
    fn test_provider_creation() {
        let provider =
            CerebrasProvider::new_with_base_url("test-key".to_string(), "http://localhost:1/v1/".to_string())
                .unwrap();
        assert_eq!(provider.endpoint(), "http://localhost:1/v1/chat/completions");
    }

    #[tokio::test]
    async fn test_chunk_events_stop_at_done() {
        let body = stream::iter(frames(&[
            "data: {\"choices\":[{\"delta\":{\"content\":\"Hi\"}}]}\n\n",
            "data: not json\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\" there\"},\"finish_reason\":\"stop\"}]}\n\n",
            "data: [DONE]\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"ignored\"}}]}\n\n",
        ]));

        let text = Response::from_stream(chunk_events(body)).text().await.unwrap();
        assert_eq!(text, "Hi there");
    }

    #[tokio::test]
    async fn test_chunk_events_mid_stream_failure() {
        let mut parts = frames(&["data: {\"choices\":[{\"delta\":{\"content\":\"partial\"}}]}\n\n"]);
        parts.push(Err(std::io::Error::new(
            std::io::ErrorKind::ConnectionAborted,
            "connection dropped",
        )));

        let mut chunks = Response::from_stream(chunk_events(stream::iter(parts))).text_stream();
        assert_eq!(chunks.next().await.unwrap().unwrap(), "partial");
        assert!(matches!(chunks.next().await, Some(Err(Error::Network(_)))));
        assert!(chunks.next().await.is_none());
    }

    #[tokio::test]
    async fn test_chunk_events_error_frame_fails_stream() {
        let body = stream::iter(frames(&[
            "data: {\"choices\":[{\"delta\":{\"content\":\"partial\"}}]}\n\n",
            "data: {\"error\":{\"message\":\"Internal server error\",\"type\":\"server_error\"}}\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\" after\"}}]}\n\n",
            "data: [DONE]\n\n",
        ]));

        let mut chunks = Response::from_stream(chunk_events(body)).text_stream();
        assert_eq!(chunks.next().await.unwrap().unwrap(), "partial");
        match chunks.next().await {
            Some(Err(Error::Streaming(message))) => {
                assert!(message.contains("Internal server error"))
            }
            other => panic!("expected streaming error, got {other:?}"),
        }
        assert!(chunks.next().await.is_none());
    }

    #[tokio::test]
    async fn test_chunk_events_error_frame_fails_buffering() {
        let body = stream::iter(frames(&[
            "data: {\"choices\":[{\"delta\":{\"content\":\"partial\"}}]}\n\n",
            "data: {\"error\":{\"message\":\"Internal server error\"}}\n\n",
        ]));

        let result = Response::from_stream(chunk_events(body)).text().await;
        assert!(matches!(result, Err(Error::Streaming(_))), "got {result:?}");
    }

    #[tokio::test]
    async fn test_error_body_with_success_status() {
        use wiremock::matchers::method;
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        let body = r#"{"error":{"message":"model overloaded","type":"server_error"}}"#;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(&server)
            .await;

        let provider =
            CerebrasProvider::new_with_base_url("test-key".to_string(), server.uri()).unwrap();
        let request = CompletionRequest::new(
            "glm-4.7",
            vec![crate::ChatMessage::user("hi")],
            crate::GenerationOptions::default(),
            false,
        )
        .unwrap();

        match provider.generate(&request).await {
            Err(Error::Api { body: error_body, .. }) => assert_eq!(error_body, body),
            Err(other) => panic!("expected Api error, got {other:?}"),
            Ok(_) => panic!("expected Api error, got a response"),
        }
    }

    #[tokio::test]
    async fn test_slow_stream_outlives_read_timeout() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        // Each gap stays under the read timeout; the whole body does not.
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.ends_with(b"\"stream\":true}") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    return;
                }
                request.extend_from_slice(&buf[..n]);
            }

            socket
                .write_all(b"HTTP/1.1 200 OK\r\ncontent-type: text/event-stream\r\nconnection: close\r\n\r\n")
                .await
                .unwrap();
            for word in ["slow", " but", " steady"] {
                tokio::time::sleep(Duration::from_millis(150)).await;
                let frame =
                    format!("data: {{\"choices\":[{{\"delta\":{{\"content\":\"{word}\"}}}}]}}\n\n");
                socket.write_all(frame.as_bytes()).await.unwrap();
            }
            socket.write_all(b"data: [DONE]\n\n").await.unwrap();
        });

        let provider = CerebrasProvider::with_read_timeout(
            "test-key".to_string(),
            format!("http://{addr}/v1"),
            Duration::from_millis(300),
        )
        .unwrap();
        let request = CompletionRequest::new(
            "glm-4.7",
            vec![crate::ChatMessage::user("hi")],
            crate::GenerationOptions::default(),
            true,
        )
        .unwrap();

        let text = provider.generate(&request).await.unwrap().text().await.unwrap();
        assert_eq!(text, "slow but steady");
    }
}
