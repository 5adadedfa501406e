use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::OnceCell;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

static TRACING_INIT: OnceCell<()> = OnceCell::new();

#[derive(Debug, Default)]
pub struct AppMetrics {
    requests_total: AtomicU64,
    plans_generated_total: AtomicU64,
    cost_recomputes_total: AtomicU64,
    edits_applied_total: AtomicU64,
    edits_rejected_total: AtomicU64,
    catalog_records_skipped_total: AtomicU64,
    total_latency_millis: AtomicU64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub requests_total: u64,
    pub plans_generated_total: u64,
    pub cost_recomputes_total: u64,
    pub edits_applied_total: u64,
    pub edits_rejected_total: u64,
    pub catalog_records_skipped_total: u64,
    pub avg_latency_millis: f64,
}

impl AppMetrics {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn inc_request(&self) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_plan_generated(&self) {
        self.plans_generated_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_cost_recompute(&self) {
        self.cost_recomputes_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_edit_applied(&self) {
        self.edits_applied_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_edit_rejected(&self) {
        self.edits_rejected_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_catalog_records_skipped(&self, count: usize) {
        self.catalog_records_skipped_total
            .fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn observe_latency(&self, duration: Duration) {
        self.total_latency_millis
            .fetch_add(duration.as_millis() as u64, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let requests = self.requests_total.load(Ordering::Relaxed);
        let latency = self.total_latency_millis.load(Ordering::Relaxed);

        MetricsSnapshot {
            requests_total: requests,
            plans_generated_total: self.plans_generated_total.load(Ordering::Relaxed),
            cost_recomputes_total: self.cost_recomputes_total.load(Ordering::Relaxed),
            edits_applied_total: self.edits_applied_total.load(Ordering::Relaxed),
            edits_rejected_total: self.edits_rejected_total.load(Ordering::Relaxed),
            catalog_records_skipped_total: self
                .catalog_records_skipped_total
                .load(Ordering::Relaxed),
            avg_latency_millis: if requests == 0 {
                0.0
            } else {
                latency as f64 / requests as f64
            },
        }
    }
}

pub fn init_tracing(service_name: &str) {
    TRACING_INIT.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}=info,atoll_api=info,atoll_service=info",
                service_name
            ))
        });

        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_current_span(true)
            .with_span_list(true)
            .init();
    });
}
