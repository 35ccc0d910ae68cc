use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::sync::RwLock;

/// Aggregated Data API usage, including billed quota units.
///
/// Quota is the scarce resource here, not request count: one search.list
/// call costs as much as 100 commentThreads.list calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuotaUsage {
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    pub rate_limited_requests: u64,
    pub quota_units_used: u64,
    pub average_response_time: Duration,
    pub last_request_time: Option<SystemTime>,
    pub requests_by_endpoint: HashMap<String, EndpointUsage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointUsage {
    pub request_count: u64,
    pub success_count: u64,
    pub error_count: u64,
    pub quota_units: u64,
    pub total_response_time: Duration,
}

#[derive(Debug, Clone)]
pub struct RequestRecord {
    pub endpoint: String,
    pub quota_cost: u64,
    pub status_code: Option<u16>,
    pub response_time: Duration,
    pub success: bool,
    pub rate_limited: bool,
}

impl Default for QuotaUsage {
    fn default() -> Self {
        Self {
            total_requests: 0,
            successful_requests: 0,
            failed_requests: 0,
            rate_limited_requests: 0,
            quota_units_used: 0,
            average_response_time: Duration::from_millis(0),
            last_request_time: None,
            requests_by_endpoint: HashMap::new(),
        }
    }
}

impl EndpointUsage {
    fn new() -> Self {
        Self {
            request_count: 0,
            success_count: 0,
            error_count: 0,
            quota_units: 0,
            total_response_time: Duration::from_millis(0),
        }
    }

    fn update(&mut self, record: &RequestRecord) {
        self.request_count += 1;
        self.total_response_time += record.response_time;
        // Failed calls still consume quota once they reach the API
        self.quota_units += record.quota_cost;

        if record.success {
            self.success_count += 1;
        } else {
            self.error_count += 1;
        }
    }

    pub fn average_response_time(&self) -> Duration {
        if self.request_count == 0 {
            Duration::from_millis(0)
        } else {
            self.total_response_time / self.request_count as u32
        }
    }

    pub fn success_rate(&self) -> f64 {
        if self.request_count == 0 {
            0.0
        } else {
            self.success_count as f64 / self.request_count as f64
        }
    }
}

#[derive(Debug)]
pub struct QuotaTracker {
    usage: Arc<RwLock<QuotaUsage>>,
}

impl QuotaTracker {
    pub fn new() -> Self {
        Self {
            usage: Arc::new(RwLock::new(QuotaUsage::default())),
        }
    }

    pub async fn record(&self, record: RequestRecord) {
        let mut usage = self.usage.write().await;

        let total_time = usage.average_response_time * usage.total_requests as u32
            + record.response_time;
        usage.total_requests += 1;
        usage.average_response_time = total_time / usage.total_requests as u32;
        usage.quota_units_used += record.quota_cost;
        usage.last_request_time = Some(SystemTime::now());

        if record.success {
            usage.successful_requests += 1;
        } else {
            usage.failed_requests += 1;
        }
        if record.rate_limited {
            usage.rate_limited_requests += 1;
        }

        usage
            .requests_by_endpoint
            .entry(record.endpoint.clone())
            .or_insert_with(EndpointUsage::new)
            .update(&record);
    }

    pub async fn usage(&self) -> QuotaUsage {
        self.usage.read().await.clone()
    }

    pub async fn reset(&self) {
        *self.usage.write().await = QuotaUsage::default();
    }
}

impl Default for QuotaTracker {
    fn default() -> Self {
        Self::new()
    }
}
