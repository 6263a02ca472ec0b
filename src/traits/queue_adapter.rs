use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::errors::TransportError;
use crate::protocol::{Message, PollResult};

/// Uniform publish/receive contract over a provider's queueing primitive.
///
/// Implementations are constructed explicitly and shared as
/// `Arc<dyn QueueAdapter>`; the owner controls `init`/`dispose`.
#[async_trait]
pub trait QueueAdapter: Send + Sync {
    /// Short provider name used in logs and metrics.
    fn provider(&self) -> &'static str;

    /// Prepare the underlying client. Called once by the owner before use.
    async fn init(&self) -> Result<(), TransportError> {
        Ok(())
    }

    /// Release the underlying client. Pending receives resolve empty.
    async fn dispose(&self) {}

    /// Publish one message to `channel`.
    ///
    /// Transient transport errors are retried a fixed number of times;
    /// permanent errors are returned immediately.
    async fn publish(&self, channel: &str, message: &Message) -> Result<(), TransportError>;

    /// Fetch, acknowledge and decode up to one batch of messages.
    ///
    /// Never fails: undecodable messages are dropped individually and a
    /// failed or cancelled fetch yields an empty result.
    async fn receive(&self, channel: &str, cancel: &CancellationToken) -> PollResult;
}
