use std::time::Duration;

use crate::reaction::ReconcilePolicy;

const DEFAULT_TIMEOUT_SECS: u64 = 20;

/// Connection and behaviour settings read from the process environment.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub store_url: String,
    pub api_key: String,
    pub timeout: Duration,
    pub reconcile: ReconcilePolicy,
}

impl AppConfig {
    pub fn new(store_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            store_url: store_url.into(),
            api_key: api_key.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            reconcile: ReconcilePolicy::default(),
        }
    }

    pub fn from_env() -> Self {
        let store_url = std::env::var("SUPABASE_URL").unwrap_or_default();
        let api_key = std::env::var("SUPABASE_ANON_KEY").unwrap_or_default();
        if store_url.is_empty() || api_key.is_empty() {
            tracing::error!("missing SUPABASE_URL or SUPABASE_ANON_KEY");
        }
        let timeout = std::env::var("HTTP_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        let reconcile = std::env::var("FEEDBACK_RECONCILE")
            .ok()
            .and_then(|s| ReconcilePolicy::parse(&s))
            .unwrap_or_default();

        Self {
            store_url,
            api_key,
            timeout,
            reconcile,
        }
    }

    pub fn with_reconcile(mut self, reconcile: ReconcilePolicy) -> Self {
        self.reconcile = reconcile;
        self
    }
}
