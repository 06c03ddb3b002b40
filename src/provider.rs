use crate::{CompletionRequest, Error, Response};

/// The transport seam: something that can turn a [`CompletionRequest`] into a [`Response`].
///
/// `request.stream` selects the wire shape; either way the result is a
/// [`Response`] that can be buffered with `text()` or consumed incrementally.
#[async_trait::async_trait]
pub trait CompletionProvider: Send + Sync + 'static {
    /// Send one request. Implementations perform no retries.
    async fn generate(&self, request: &CompletionRequest) -> Result<Response, Error>;
}
