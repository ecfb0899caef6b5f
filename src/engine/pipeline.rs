use anyhow::{anyhow, Context, Result};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use crate::approach::Approach;
use crate::arrival::{ArrivalSimulator, ArrivalTiming};
use crate::config::SimConfig;
use crate::core::{ArrivalRecord, DecisionRecord, EvaluationEntry, MotionSample, RunSummary};
use crate::decision::DecisionEngine;
use crate::engine::artifacts::ArtifactStore;
use crate::engine::state::PipelineState;
use crate::evaluation::Evaluator;
use crate::frames::{FrameSink, FrameSource};
use crate::observability::{MetricsCollector, PipelineMonitor, StageMetrics};
use crate::registry::ApproachRegistry;
use crate::trace::{interpolate, read_head_trace, NetworkTrace, SizeTable};

pub const DECISION_STAGE: &str = "decision";
pub const ARRIVAL_STAGE: &str = "arrival";
pub const EVALUATION_STAGE: &str = "evaluation";

/// Traces a run is driven by
#[derive(Debug, Clone)]
pub struct SimInputs {
    /// Interpolated head motion
    pub motion: Vec<MotionSample>,
    pub network: NetworkTrace,
    pub sizes: SizeTable,
}

impl SimInputs {
    /// Read the motion, network and size files named in the config
    pub async fn load(config: &SimConfig) -> Result<Self> {
        let paths = &config.paths;
        let motion_text = read_text(&paths.motion_file).await?;
        let network_text = read_text(&paths.network_file).await?;
        let size_text = read_text(&paths.size_file).await?;

        let recorded = read_head_trace(
            &motion_text,
            config.motion.column_idx,
            config.motion.sample_interval_ms(),
        )
        .context(format!("Failed to parse motion trace {:?}", paths.motion_file))?;
        let motion = interpolate(
            &recorded,
            config.motion.motion_interval_ms(),
            config.video.duration_ms(),
        );
        let network = NetworkTrace::from_json_str(&network_text, config.network.network_scale_ratio)
            .context(format!("Failed to parse network trace {:?}", paths.network_file))?;
        let sizes = SizeTable::from_json_str(&size_text)
            .context(format!("Failed to parse size table {:?}", paths.size_file))?;

        tracing::info!(
            motion_samples = motion.len(),
            segments = network.segments().len(),
            chunks = sizes.chunk_count(),
            "inputs loaded"
        );
        Ok(Self { motion, network, sizes })
    }
}

async fn read_text(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .context(format!("Failed to read {:?}", path))
}

/// Everything one run produces
#[derive(Debug, Clone)]
pub struct SimulationOutput {
    pub decisions: Vec<DecisionRecord>,
    pub arrivals: Vec<ArrivalRecord>,
    /// Per-tick results followed by the summary
    pub evaluation: Vec<EvaluationEntry>,
    pub summary: RunSummary,
}

/// Drives decision, arrival and evaluation in sequence
pub struct Simulation {
    config: SimConfig,
    registry: ApproachRegistry,
    state: PipelineState,
    artifacts: Option<ArtifactStore>,
    metrics_collector: MetricsCollector,
    decision_metrics: Arc<StageMetrics>,
    arrival_metrics: Arc<StageMetrics>,
    evaluation_metrics: Arc<StageMetrics>,
}

impl Simulation {
    pub fn new(config: SimConfig, registry: ApproachRegistry) -> Result<Self> {
        config.validate().context("Invalid simulation config")?;
        if registry.get(&config.method.approach).is_none() {
            return Err(anyhow!(
                "Unknown approach {:?}; registered: {:?}",
                config.method.approach,
                registry.list().map(|m| m.id.as_str()).collect::<Vec<_>>()
            ));
        }

        let decision_metrics = Arc::new(StageMetrics::new(DECISION_STAGE));
        let arrival_metrics = Arc::new(StageMetrics::new(ARRIVAL_STAGE));
        let evaluation_metrics = Arc::new(StageMetrics::new(EVALUATION_STAGE));
        let mut metrics_collector = MetricsCollector::new();
        metrics_collector.register(decision_metrics.clone());
        metrics_collector.register(arrival_metrics.clone());
        metrics_collector.register(evaluation_metrics.clone());

        Ok(Self {
            config,
            registry,
            state: PipelineState::Idle,
            artifacts: None,
            metrics_collector,
            decision_metrics,
            arrival_metrics,
            evaluation_metrics,
        })
    }

    /// Persist each stage's log as soon as the stage finishes
    pub fn with_artifacts(mut self, store: ArtifactStore) -> Self {
        self.artifacts = Some(store);
        self
    }

    pub fn artifacts(&self) -> Option<&ArtifactStore> {
        self.artifacts.as_ref()
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn state(&self) -> &PipelineState {
        &self.state
    }

    pub fn monitor(&self) -> PipelineMonitor {
        PipelineMonitor::new(self.metrics_collector.clone())
    }

    fn transition(&mut self, target: PipelineState) -> Result<()> {
        if !self.state.can_transition_to(&target) {
            return Err(anyhow!(
                "Invalid state transition: {} -> {}",
                self.state.name(),
                target.name()
            ));
        }
        tracing::debug!(from = self.state.name(), to = target.name(), "state transition");
        self.state = target;
        Ok(())
    }

    fn fail(&mut self, stage: &Arc<StageMetrics>, err: anyhow::Error) -> anyhow::Error {
        stage.record_error();
        tracing::error!(stage = stage.stage(), error = %err, "simulation failed");
        self.state = PipelineState::Error {
            error_msg: format!("{err:#}"),
        };
        err
    }

    /// Run all three stages over `inputs`
    pub async fn run(
        &mut self,
        inputs: &SimInputs,
        frames: &dyn FrameSource,
        sink: Option<&mut dyn FrameSink>,
    ) -> Result<SimulationOutput> {
        if self.state.is_terminal() {
            self.transition(PipelineState::Idle)?;
        }
        let started = Instant::now();
        self.transition(PipelineState::Deciding)?;

        let metrics = self.decision_metrics.clone();
        let (decisions, approach) = match self.decide(inputs) {
            Ok(out) => out,
            Err(e) => return Err(self.fail(&metrics, e)),
        };
        let saved = match &self.artifacts {
            Some(store) => store.save_decisions(&decisions).await,
            None => Ok(()),
        };
        if let Err(e) = saved {
            return Err(self.fail(&metrics, e));
        }
        self.transition(PipelineState::Simulating {
            decisions: decisions.len(),
        })?;

        let metrics = self.arrival_metrics.clone();
        let arrivals = match self.simulate(inputs, &decisions) {
            Ok(out) => out,
            Err(e) => return Err(self.fail(&metrics, e)),
        };
        let saved = match &self.artifacts {
            Some(store) => store.save_arrivals(&arrivals).await,
            None => Ok(()),
        };
        if let Err(e) = saved {
            return Err(self.fail(&metrics, e));
        }
        self.transition(PipelineState::Evaluating {
            chunks: arrivals.len(),
        })?;

        let metrics = self.evaluation_metrics.clone();
        let evaluated = self.evaluate(inputs, approach, arrivals.clone(), frames, sink).await;
        let (evaluation, summary) = match evaluated {
            Ok(out) => out,
            Err(e) => return Err(self.fail(&metrics, e)),
        };
        let saved = match &self.artifacts {
            Some(store) => store.save_evaluation(&evaluation).await,
            None => Ok(()),
        };
        if let Err(e) = saved {
            return Err(self.fail(&metrics, e));
        }
        let ticks = evaluation.len().saturating_sub(1);
        self.transition(PipelineState::Completed {
            duration: Some(started.elapsed()),
            ticks,
        })?;
        tracing::info!(
            decisions = decisions.len(),
            chunks = arrivals.len(),
            ticks,
            gc_score = summary.gc_score,
            "simulation completed"
        );

        Ok(SimulationOutput {
            decisions,
            arrivals,
            evaluation,
            summary,
        })
    }

    fn decide(&self, inputs: &SimInputs) -> Result<(Vec<DecisionRecord>, Box<dyn Approach>)> {
        let start = self.decision_metrics.start();
        let method = &self.config.method;
        let approach = self
            .registry
            .create(&method.approach, &method.approach_config)
            .context(format!("Failed to create approach {:?}", method.approach))?;
        let mut engine = DecisionEngine::from_config(&self.config, approach)?;
        let decisions = engine.run(&inputs.motion)?;
        self.decision_metrics.record_produced(decisions.len() as u64);
        self.decision_metrics.finish(start);
        Ok((decisions, engine.into_approach()))
    }

    fn simulate(&self, inputs: &SimInputs, decisions: &[DecisionRecord]) -> Result<Vec<ArrivalRecord>> {
        let start = self.arrival_metrics.start();
        let timing = ArrivalTiming::from_config(&self.config)?;
        let arrivals = ArrivalSimulator::new(&inputs.sizes, &inputs.network, timing)
            .simulate(decisions)
            .context("Failed to simulate arrivals")?;
        self.arrival_metrics.record_produced(arrivals.len() as u64);
        self.arrival_metrics.finish(start);
        Ok(arrivals)
    }

    async fn evaluate(
        &self,
        inputs: &SimInputs,
        approach: Box<dyn Approach>,
        arrivals: Vec<ArrivalRecord>,
        frames: &dyn FrameSource,
        sink: Option<&mut dyn FrameSink>,
    ) -> Result<(Vec<EvaluationEntry>, RunSummary)> {
        let start = self.evaluation_metrics.start();
        let mut evaluator = Evaluator::from_config(&self.config, approach, arrivals)?;
        let ticks = evaluator
            .run(&inputs.motion, frames, sink)
            .await
            .context("Failed to evaluate viewport")?;
        let summary = evaluator.finish(&inputs.sizes);

        let mut entries: Vec<EvaluationEntry> = ticks.into_iter().map(EvaluationEntry::Tick).collect();
        entries.push(EvaluationEntry::Summary(summary.clone()));
        self.evaluation_metrics.record_produced(entries.len() as u64);
        self.evaluation_metrics.finish(start);
        Ok((entries, summary))
    }
}
