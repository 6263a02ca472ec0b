// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::atomic::{AtomicU64, Ordering};

/// Transport byte counters accumulated by queue adapters.
///
/// One instance is created by the adapter's owner and shared with the
/// adapter as `Arc<TransportMetrics>`; cost reporting reads it through
/// [`TransportMetrics::snapshot`].
#[derive(Debug, Default)]
pub struct TransportMetrics {
    outbound_bytes: AtomicU64,
    provider_bytes: AtomicU64,
    published: AtomicU64,
    received: AtomicU64,
}

/// Point-in-time copy of [`TransportMetrics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub outbound_bytes: u64,
    pub provider_bytes: u64,
    pub published: u64,
    pub received: u64,
}

impl TransportMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes moved over the network, as seen by this process.
    pub fn record_outbound(&self, bytes: u64) {
        self.outbound_bytes.fetch_add(bytes, Ordering::Relaxed);
    }

    /// Bytes the provider bills for, including its own overhead.
    pub fn record_provider(&self, bytes: u64) {
        self.provider_bytes.fetch_add(bytes, Ordering::Relaxed);
    }

    pub fn record_published(&self) {
        self.published.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_received(&self, count: u64) {
        self.received.fetch_add(count, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            outbound_bytes: self.outbound_bytes.load(Ordering::Relaxed),
            provider_bytes: self.provider_bytes.load(Ordering::Relaxed),
            published: self.published.load(Ordering::Relaxed),
            received: self.received.load(Ordering::Relaxed),
        }
    }
}
