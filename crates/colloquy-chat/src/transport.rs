//! Transport abstraction for issuing questions

use async_trait::async_trait;
use colloquy_api::{Error, QnaClient, QuestionRequest, Result, UpdateStream};
use tokio_util::sync::CancellationToken;

/// Issues an outbound question and produces its update stream.
///
/// Each call yields one finite, non-restartable stream. Retry behavior,
/// if any, belongs behind this boundary; the session only records final
/// outcomes.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn post_question(
        &self,
        request: &QuestionRequest,
        cancel: CancellationToken,
    ) -> Result<UpdateStream>;
}

/// Transport backed by the answer service client
pub struct ServiceTransport {
    client: QnaClient,
}

impl ServiceTransport {
    pub fn new(client: QnaClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ServiceTransport {
    async fn post_question(
        &self,
        request: &QuestionRequest,
        cancel: CancellationToken,
    ) -> Result<UpdateStream> {
        tokio::select! {
            _ = cancel.cancelled() => Err(Error::Aborted),
            result = self.client.post_question(request) => result,
        }
    }
}
