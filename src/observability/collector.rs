use std::collections::BTreeMap;
use std::sync::Arc;

use super::StageMetrics;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub stage: String,
    pub records_produced: u64,
    pub errors_count: u64,
    pub elapsed_us: u64,
}

/// Stage metrics keyed by stage name, reported in registration order
#[derive(Default, Clone)]
pub struct MetricsCollector {
    order: Vec<String>,
    metrics: BTreeMap<String, Arc<StageMetrics>>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, metrics: Arc<StageMetrics>) {
        let stage = metrics.stage().to_string();
        if self.metrics.insert(stage.clone(), metrics).is_none() {
            self.order.push(stage);
        }
    }

    pub fn snapshot(&self) -> Vec<MetricsSnapshot> {
        self.order
            .iter()
            .filter_map(|stage| self.metrics.get(stage))
            .map(|m| MetricsSnapshot {
                stage: m.stage().to_string(),
                records_produced: m.records_produced(),
                errors_count: m.errors_count(),
                elapsed_us: m.total_elapsed_us(),
            })
            .collect()
    }

    pub fn get_stage_metrics(&self, stage: &str) -> Option<Arc<StageMetrics>> {
        self.metrics.get(stage).cloned()
    }
}
