// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_sqs::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_sqs::types::{
    DeleteMessageBatchRequestEntry, Message as AwsMessage, MessageAttributeValue,
    MessageSystemAttributeName,
};

use super::api::{SqsApi, SqsMessage, SqsMessageAttribute, SqsOutgoing};
use crate::config::consts::MAX_BATCH_SIZE;
use crate::config::{SqsConfig, TrampolineConfig};
use crate::errors::TransportError;

/// Longest long-poll SQS accepts, in seconds.
const MAX_WAIT_SECONDS: u64 = 20;

const NON_EXISTENT_QUEUE_CODES: [&str; 2] = ["AWS.SimpleQueueService.NonExistentQueue", "QueueDoesNotExist"];
const THROTTLING_CODES: [&str; 3] = ["ThrottlingException", "RequestThrottled", "AWS.SimpleQueueService.RequestThrottled"];

/// [`SqsApi`] over the AWS SDK.
///
/// Credentials and region come from the usual AWS provider chain; the
/// optional `sqs` config section overrides the region and endpoint (for a
/// local SQS-compatible service).
#[derive(Debug, Clone)]
pub struct AwsSqsClient {
    client: aws_sdk_sqs::Client,
}

impl AwsSqsClient {
    pub fn new(client: aws_sdk_sqs::Client) -> Self {
        Self { client }
    }

    pub async fn from_config(cfg: &TrampolineConfig) -> Self {
        Self::from_sqs_config(&cfg.sqs).await
    }

    pub async fn from_sqs_config(cfg: &SqsConfig) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = &cfg.region {
            loader = loader.region(Region::new(region.clone()));
        }
        if let Some(endpoint) = &cfg.endpoint {
            loader = loader.endpoint_url(endpoint);
        }
        Self::new(aws_sdk_sqs::Client::new(&loader.load().await))
    }
}

fn to_attribute_value(attribute: &SqsMessageAttribute) -> Result<MessageAttributeValue, TransportError> {
    MessageAttributeValue::builder()
        .data_type(&attribute.data_type)
        .string_value(&attribute.string_value)
        .build()
        .map_err(|e| TransportError::InvalidResponse {
            operation: "send_message".to_string(),
            reason: e.to_string(),
        })
}

fn to_message_attributes(
    attributes: &HashMap<String, SqsMessageAttribute>,
) -> Result<HashMap<String, MessageAttributeValue>, TransportError> {
    attributes
        .iter()
        .map(|(key, attribute)| Ok((key.clone(), to_attribute_value(attribute)?)))
        .collect()
}

/// Non-string attributes carry no `StringValue` and are skipped.
fn from_aws_message(message: &AwsMessage) -> SqsMessage {
    let attributes = message
        .message_attributes()
        .map(|attributes| {
            attributes
                .iter()
                .filter_map(|(key, value)| {
                    value.string_value().map(|string_value| {
                        (
                            key.clone(),
                            SqsMessageAttribute {
                                data_type: value.data_type().to_string(),
                                string_value: string_value.to_string(),
                            },
                        )
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    let sent_timestamp = message
        .attributes()
        .and_then(|system| system.get(&MessageSystemAttributeName::SentTimestamp))
        .and_then(|millis| millis.parse().ok());

    SqsMessage {
        message_id: message.message_id().unwrap_or_default().to_string(),
        receipt_handle: message.receipt_handle().unwrap_or_default().to_string(),
        body: message.body().unwrap_or_default().to_string(),
        attributes,
        sent_timestamp,
    }
}

/// Batch entry ids only need to be unique within the request.
fn delete_entries(receipt_handles: &[String]) -> Result<Vec<DeleteMessageBatchRequestEntry>, TransportError> {
    receipt_handles
        .iter()
        .enumerate()
        .map(|(index, handle)| {
            DeleteMessageBatchRequestEntry::builder()
                .id(index.to_string())
                .receipt_handle(handle)
                .build()
                .map_err(|e| TransportError::InvalidResponse {
                    operation: "delete_messages".to_string(),
                    reason: e.to_string(),
                })
        })
        .collect()
}

fn wait_seconds(wait: Duration) -> i32 {
    wait.as_secs().min(MAX_WAIT_SECONDS) as i32
}

fn service_error(
    operation: &str,
    queue_url: &str,
    status: u16,
    code: Option<&str>,
    message: Option<&str>,
) -> TransportError {
    match code {
        Some(code) if NON_EXISTENT_QUEUE_CODES.contains(&code) => TransportError::ChannelNotFound {
            channel: queue_url.to_string(),
        },
        Some(code) if THROTTLING_CODES.contains(&code) => TransportError::Throttled {
            operation: operation.to_string(),
        },
        _ if status == 429 => TransportError::Throttled {
            operation: operation.to_string(),
        },
        _ => TransportError::Http {
            operation: operation.to_string(),
            status,
            reason: message.or(code).unwrap_or_default().to_string(),
        },
    }
}

fn classify<E>(operation: &str, queue_url: &str, error: SdkError<E>) -> TransportError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
{
    match &error {
        SdkError::TimeoutError(_) => TransportError::Timeout {
            operation: operation.to_string(),
        },
        SdkError::DispatchFailure(failure) if failure.is_timeout() => TransportError::Timeout {
            operation: operation.to_string(),
        },
        SdkError::DispatchFailure(_) => TransportError::network(operation, DisplayErrorContext(&error)),
        SdkError::ServiceError(context) => service_error(
            operation,
            queue_url,
            context.raw().status().as_u16(),
            context.err().code(),
            context.err().message(),
        ),
        _ => TransportError::InvalidResponse {
            operation: operation.to_string(),
            reason: DisplayErrorContext(&error).to_string(),
        },
    }
}

#[async_trait]
impl SqsApi for AwsSqsClient {
    async fn send_message(&self, queue_url: &str, message: &SqsOutgoing) -> Result<(), TransportError> {
        self.client
            .send_message()
            .queue_url(queue_url)
            .message_body(&message.body)
            .set_message_attributes(Some(to_message_attributes(&message.attributes)?))
            .send()
            .await
            .map_err(|e| classify("send_message", queue_url, e))?;
        Ok(())
    }

    async fn receive_messages(
        &self,
        queue_url: &str,
        max_messages: usize,
        wait: Duration,
    ) -> Result<Vec<SqsMessage>, TransportError> {
        let output = self
            .client
            .receive_message()
            .queue_url(queue_url)
            .max_number_of_messages(max_messages.min(MAX_BATCH_SIZE) as i32)
            .wait_time_seconds(wait_seconds(wait))
            .message_attribute_names("All")
            .message_system_attribute_names(MessageSystemAttributeName::SentTimestamp)
            .send()
            .await
            .map_err(|e| classify("receive_messages", queue_url, e))?;

        Ok(output.messages().iter().map(from_aws_message).collect())
    }

    async fn delete_messages(&self, queue_url: &str, receipt_handles: &[String]) -> Result<(), TransportError> {
        if receipt_handles.is_empty() {
            return Ok(());
        }

        let output = self
            .client
            .delete_message_batch()
            .queue_url(queue_url)
            .set_entries(Some(delete_entries(receipt_handles)?))
            .send()
            .await
            .map_err(|e| classify("delete_messages", queue_url, e))?;

        let failed = output.failed();
        if !failed.is_empty() {
            return Err(TransportError::InvalidResponse {
                operation: "delete_messages".to_string(),
                reason: format!("{} of {} deletes failed", failed.len(), receipt_handles.len()),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{CALLID_ATTR, KIND_ATTR};
    use aws_sdk_sqs::operation::send_message::SendMessageError;

    fn string_value(value: &str) -> MessageAttributeValue {
        MessageAttributeValue::builder()
            .data_type("String")
            .string_value(value)
            .build()
            .unwrap()
    }

    #[test]
    fn test_outgoing_attributes_are_string_typed() {
        let attributes: HashMap<String, SqsMessageAttribute> = [
            (KIND_ATTR.to_string(), SqsMessageAttribute::string("response")),
            (CALLID_ATTR.to_string(), SqsMessageAttribute::string("42")),
        ]
        .into();

        let wire = to_message_attributes(&attributes).unwrap();
        assert_eq!(wire.len(), 2);
        assert_eq!(wire[KIND_ATTR].data_type(), "String");
        assert_eq!(wire[KIND_ATTR].string_value(), Some("response"));
        assert_eq!(wire[CALLID_ATTR].string_value(), Some("42"));
    }

    #[test]
    fn test_received_message_maps_to_sqs_message() {
        let message = AwsMessage::builder()
            .message_id("m-1")
            .receipt_handle("rh-1")
            .body("{\"callId\":\"42\"}")
            .message_attributes(KIND_ATTR, string_value("response"))
            .message_attributes(CALLID_ATTR, string_value("42"))
            .attributes(MessageSystemAttributeName::SentTimestamp, "1714564800000")
            .build();

        let mapped = from_aws_message(&message);
        assert_eq!(mapped.message_id, "m-1");
        assert_eq!(mapped.receipt_handle, "rh-1");
        assert_eq!(mapped.body, "{\"callId\":\"42\"}");
        assert_eq!(mapped.attributes[KIND_ATTR], SqsMessageAttribute::string("response"));
        assert_eq!(mapped.attributes[CALLID_ATTR].string_value, "42");
        assert_eq!(mapped.sent_timestamp, Some(1_714_564_800_000));
    }

    #[test]
    fn test_binary_attributes_are_skipped() {
        let binary = MessageAttributeValue::builder()
            .data_type("Binary")
            .binary_value(aws_sdk_sqs::primitives::Blob::new(vec![1, 2, 3]))
            .build()
            .unwrap();
        let message = AwsMessage::builder()
            .message_attributes("blob", binary)
            .message_attributes(CALLID_ATTR, string_value("42"))
            .build();

        let mapped = from_aws_message(&message);
        assert_eq!(mapped.attributes.len(), 1);
        assert_eq!(mapped.sent_timestamp, None);
    }

    #[test]
    fn test_delete_entries_have_unique_ids() {
        let entries = delete_entries(&["rh-a".to_string(), "rh-b".to_string()]).unwrap();
        let ids: Vec<_> = entries.iter().map(|e| e.id()).collect();
        let handles: Vec<_> = entries.iter().map(|e| e.receipt_handle()).collect();
        assert_eq!(ids, vec!["0", "1"]);
        assert_eq!(handles, vec!["rh-a", "rh-b"]);
    }

    #[test]
    fn test_wait_is_capped_at_sqs_maximum() {
        assert_eq!(wait_seconds(Duration::from_millis(20_000)), 20);
        assert_eq!(wait_seconds(Duration::from_secs(60)), 20);
        assert_eq!(wait_seconds(Duration::from_millis(500)), 0);
    }

    #[test]
    fn test_service_error_classification() {
        let missing = service_error(
            "send_message",
            "https://sqs/replies",
            400,
            Some("AWS.SimpleQueueService.NonExistentQueue"),
            None,
        );
        assert!(matches!(missing, TransportError::ChannelNotFound { channel } if channel == "https://sqs/replies"));

        let throttled = service_error("send_message", "q", 400, Some("ThrottlingException"), None);
        assert!(matches!(throttled, TransportError::Throttled { .. }));

        let unavailable = service_error("receive_messages", "q", 503, None, Some("try later"));
        assert!(unavailable.is_retryable());
        assert!(unavailable.to_string().contains("try later"));

        let denied = service_error("send_message", "q", 403, Some("AccessDenied"), None);
        assert!(!denied.is_retryable());
    }

    #[test]
    fn test_sdk_timeout_is_retryable() {
        let error = SdkError::<SendMessageError>::timeout_error("request timed out");
        let classified = classify("send_message", "q", error);
        assert!(matches!(classified, TransportError::Timeout { .. }));
        assert!(classified.is_retryable());
    }
}
