// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::HashMap;

use super::{FunctionReturn, ReceivableMessage};

/// What a receiver should do with an observed message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// First response for this call: this is the outcome.
    Accepted,
    /// A response for a call that already has an outcome.
    Duplicate,
    /// Heartbeat or metrics sample; never changes an outcome.
    Advisory,
    /// Dead letter; not a protocol outcome.
    Anomaly,
}

/// Keeps the first `response` per call and reports later ones as duplicates.
///
/// Delivery is at-least-once, so the same response (or a heartbeat arriving
/// after the response) is expected now and then.
#[derive(Debug, Default)]
pub struct ResponseLedger {
    settled: HashMap<String, FunctionReturn>,
}

impl ResponseLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, message: &ReceivableMessage) -> Disposition {
        match message {
            ReceivableMessage::Response { call_id, body, .. } => {
                if self.settled.contains_key(call_id) {
                    tracing::debug!(call_id = %call_id, "Ignoring duplicate response");
                    return Disposition::Duplicate;
                }
                self.settled.insert(call_id.clone(), body.clone());
                Disposition::Accepted
            }
            ReceivableMessage::FunctionStarted { .. } | ReceivableMessage::CpuMetrics { .. } => {
                Disposition::Advisory
            }
            ReceivableMessage::DeadLetter { .. } => Disposition::Anomaly,
        }
    }

    pub fn outcome(&self, call_id: &str) -> Option<&FunctionReturn> {
        self.settled.get(call_id)
    }

    pub fn is_settled(&self, call_id: &str) -> bool {
        self.settled.contains_key(call_id)
    }

    pub fn len(&self) -> usize {
        self.settled.len()
    }

    pub fn is_empty(&self) -> bool {
        self.settled.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ShapedError;
    use crate::protocol::{CallingContext, FunctionCall};
    use chrono::Utc;
    use serde_json::json;

    fn ctx(call_id: &str) -> CallingContext {
        CallingContext {
            call: FunctionCall::new(call_id, "identity", vec![]),
            start_time: Utc::now(),
            execution_id: "exec".to_string(),
            log_url: None,
            instance_id: None,
        }
    }

    fn response(body: FunctionReturn) -> ReceivableMessage {
        ReceivableMessage::Response {
            call_id: body.call_id.clone(),
            body,
            timestamp: None,
        }
    }

    #[test]
    fn test_first_response_wins() {
        let mut ledger = ResponseLedger::new();
        let first = response(ctx("42").returned(json!("abc123")));
        let second = response(ctx("42").error_return(ShapedError::new("Error", "late")));

        assert_eq!(ledger.observe(&first), Disposition::Accepted);
        assert_eq!(ledger.observe(&second), Disposition::Duplicate);
        assert_eq!(ledger.observe(&first), Disposition::Duplicate);

        let outcome = ledger.outcome("42").unwrap();
        assert_eq!(outcome.value(), Some(&json!("abc123")));
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_heartbeat_after_response_is_advisory() {
        let mut ledger = ResponseLedger::new();
        ledger.observe(&response(ctx("42").returned(json!(1))));

        let late = ReceivableMessage::FunctionStarted { call_id: "42".to_string() };
        assert_eq!(ledger.observe(&late), Disposition::Advisory);
        assert!(ledger.is_settled("42"));
    }

    #[test]
    fn test_calls_are_tracked_independently() {
        let mut ledger = ResponseLedger::new();

        assert_eq!(ledger.observe(&response(ctx("1").returned(json!(1)))), Disposition::Accepted);
        assert_eq!(ledger.observe(&response(ctx("2").returned(json!(2)))), Disposition::Accepted);
        assert_eq!(ledger.outcome("1").unwrap().value(), Some(&json!(1)));
        assert_eq!(ledger.outcome("2").unwrap().value(), Some(&json!(2)));
    }

    #[test]
    fn test_dead_letter_is_an_anomaly() {
        let mut ledger = ResponseLedger::new();
        let dead = ReceivableMessage::DeadLetter {
            attributes: Default::default(),
            raw: vec![],
        };
        assert_eq!(ledger.observe(&dead), Disposition::Anomaly);
        assert!(ledger.is_empty());
    }
}
