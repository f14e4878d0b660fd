//! Seam between the dashboard and a text-generation backend

use async_trait::async_trait;

use crate::error::ServiceError;

/// A single blocking prompt-in, text-out round trip.
///
/// No retries, no streaming. Implementations report every failure as a
/// [`ServiceError`] whose message can be shown to the user as is.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, ServiceError>;

    /// Model identifier, for logs and the health endpoint
    fn model_id(&self) -> &str;
}
