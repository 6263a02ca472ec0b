/// Delay before a `functionstarted` heartbeat is published (2 seconds)
pub const HEARTBEAT_DELAY_MS: u64 = 2_000;
/// Attempts made for each publish before giving up
pub const PUBLISH_ATTEMPTS: u32 = 3;
/// Base backoff between publish attempts, multiplied by the attempt number
pub const PUBLISH_RETRY_BACKOFF_MS: u64 = 100;
/// Maximum messages fetched per receive (lowest common maximum across providers)
pub const MAX_BATCH_SIZE: usize = 10;
/// Default long-poll wait for receive (20 seconds, the SQS maximum)
pub const DEFAULT_LONG_POLL_WAIT_MS: u64 = 20_000;
/// Default Pub/Sub REST endpoint
pub const DEFAULT_PUBSUB_ENDPOINT: &str = "https://pubsub.googleapis.com/v1";
