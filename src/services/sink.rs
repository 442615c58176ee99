use crate::config::AnalyticsConfig;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Optional third-party analytics. Emitting never blocks and never fails the caller.
pub trait AnalyticsSink: Send + Sync {
    fn emit(&self, event: &str, properties: Map<String, Value>);
}

pub struct NoopSink;

impl AnalyticsSink for NoopSink {
    fn emit(&self, _event: &str, _properties: Map<String, Value>) {}
}

/// Posts `{"event": ..., "properties": {...}}` to a collector endpoint on a
/// spawned task. Outside a Tokio runtime the event is dropped.
#[cfg(feature = "integrations")]
pub struct HttpSink {
    client: reqwest::Client,
    endpoint: String,
}

#[cfg(feature = "integrations")]
impl HttpSink {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }
}

#[cfg(feature = "integrations")]
impl AnalyticsSink for HttpSink {
    fn emit(&self, event: &str, properties: Map<String, Value>) {
        let handle = match tokio::runtime::Handle::try_current() {
            Ok(h) => h,
            Err(_) => {
                tracing::debug!("No runtime available, dropping analytics event '{}'", event);
                return;
            }
        };

        let client = self.client.clone();
        let endpoint = self.endpoint.clone();
        let body = serde_json::json!({
            "event": event,
            "properties": properties,
        });
        let event = event.to_string();

        handle.spawn(async move {
            match client
                .post(&endpoint)
                .header("User-Agent", concat!("folio/", env!("CARGO_PKG_VERSION")))
                .json(&body)
                .send()
                .await
            {
                Ok(resp) if resp.status().is_success() => {}
                Ok(resp) => tracing::warn!(
                    "Analytics mirror rejected '{}': HTTP {}",
                    event,
                    resp.status()
                ),
                Err(e) => tracing::warn!("Analytics mirror failed for '{}': {}", event, e),
            }
        });
    }
}

pub fn from_config(config: &AnalyticsConfig) -> Arc<dyn AnalyticsSink> {
    match config.mirror_endpoint.as_deref() {
        #[cfg(feature = "integrations")]
        Some(endpoint) => {
            tracing::info!("Mirroring page views to {}", endpoint);
            Arc::new(HttpSink::new(endpoint))
        }
        #[cfg(not(feature = "integrations"))]
        Some(_) => {
            tracing::warn!("analytics.mirror_endpoint is set but the 'integrations' feature is disabled");
            Arc::new(NoopSink)
        }
        None => Arc::new(NoopSink),
    }
}
