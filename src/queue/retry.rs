// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::future::Future;
use std::time::Duration;

use crate::config::consts::PUBLISH_RETRY_BACKOFF_MS;
use crate::errors::TransportError;
use crate::observability::messages::{queue::PublishRetrying, StructuredLog};

/// Run `op` up to `max_attempts` times.
///
/// Only errors classified as retryable trigger another attempt; the last
/// error is returned once attempts are exhausted. `op` receives the 1-based
/// attempt number.
pub async fn retry_op<T, F, Fut>(
    max_attempts: u32,
    operation: &str,
    mut op: F,
) -> Result<T, TransportError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, TransportError>>,
{
    let max_attempts = max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(error) if error.is_retryable() && attempt < max_attempts => {
                PublishRetrying {
                    operation,
                    attempt,
                    max_attempts,
                    error: &error,
                }
                .log();
                tokio::time::sleep(Duration::from_millis(PUBLISH_RETRY_BACKOFF_MS * attempt as u64)).await;
                attempt += 1;
            }
            Err(error) => return Err(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test(start_paused = true)]
    async fn test_permanently_failing_op_stops_at_bound() {
        let calls = AtomicU32::new(0);

        let result: Result<(), _> = retry_op(3, "publish", |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(TransportError::network("publish", "connection reset")) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_failure_recovers() {
        let result = retry_op(3, "publish", |attempt| async move {
            if attempt < 3 {
                Err(TransportError::Throttled {
                    operation: "publish".to_string(),
                })
            } else {
                Ok(attempt)
            }
        })
        .await;

        assert_eq!(result.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_permanent_error_is_not_retried() {
        let calls = AtomicU32::new(0);

        let result: Result<(), _> = retry_op(3, "publish", |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            async {
                Err(TransportError::ChannelNotFound {
                    channel: "missing".to_string(),
                })
            }
        })
        .await;

        assert!(matches!(result, Err(TransportError::ChannelNotFound { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
