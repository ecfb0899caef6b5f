use super::MetricsCollector;

pub struct PipelineMonitor {
    collector: MetricsCollector,
}

impl PipelineMonitor {
    pub fn new(collector: MetricsCollector) -> Self {
        Self { collector }
    }

    pub fn generate_report(&self) -> String {
        let snapshot = self.collector.snapshot();

        if snapshot.is_empty() {
            return "No stages registered".to_string();
        }

        let mut report = String::from("=== Simulation Metrics ===\n");
        for stage in &snapshot {
            report.push_str(&format!(
                "\n[{}]\n  Records: {}\n  Errors: {}\n  Elapsed: {}μs\n",
                stage.stage,
                stage.records_produced,
                match stage.errors_count {
                    0 => "0 errors".to_string(),
                    1 => "1 error".to_string(),
                    n => format!("{n} errors"),
                },
                stage.elapsed_us
            ));
        }
        report
    }

    pub fn collector(&self) -> &MetricsCollector {
        &self.collector
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observability::StageMetrics;
    use std::sync::Arc;

    #[test]
    fn test_report_lists_stages_in_order() {
        let mut collector = MetricsCollector::new();
        for stage in ["decision", "arrival", "evaluation"] {
            collector.register(Arc::new(StageMetrics::new(stage)));
        }
        if let Some(m) = collector.get_stage_metrics("arrival") {
            m.record_produced(4);
            m.record_error();
        }

        let report = PipelineMonitor::new(collector).generate_report();
        let decision = report.find("[decision]").unwrap();
        let arrival = report.find("[arrival]").unwrap();
        let evaluation = report.find("[evaluation]").unwrap();
        assert!(decision < arrival && arrival < evaluation);
        assert!(report.contains("Records: 4"));
        assert!(report.contains("1 error\n"));
    }

    #[test]
    fn test_empty_report() {
        let monitor = PipelineMonitor::new(MetricsCollector::new());
        assert_eq!(monitor.generate_report(), "No stages registered");
    }
}
