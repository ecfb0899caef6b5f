//! JSON artifacts of a run.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::core::{ArrivalRecord, DecisionRecord, EvaluationEntry};
use crate::engine::pipeline::SimulationOutput;

pub const DECISION_FILE: &str = "decision.json";
pub const ARRIVAL_FILE: &str = "arrival.json";
pub const EVALUATION_FILE: &str = "evaluation.json";

/// Reads and writes the decision, arrival and evaluation logs of a run
pub struct ArtifactStore {
    output_dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Write all three artifacts, creating the output directory if needed
    pub async fn save(&self, output: &SimulationOutput) -> Result<()> {
        self.save_decisions(&output.decisions).await?;
        self.save_arrivals(&output.arrivals).await?;
        self.save_evaluation(&output.evaluation).await?;
        tracing::info!(dir = ?self.output_dir, "artifacts written");
        Ok(())
    }

    pub async fn save_decisions(&self, decisions: &[DecisionRecord]) -> Result<()> {
        self.write_json(DECISION_FILE, decisions).await
    }

    pub async fn save_arrivals(&self, arrivals: &[ArrivalRecord]) -> Result<()> {
        self.write_json(ARRIVAL_FILE, arrivals).await
    }

    pub async fn save_evaluation(&self, evaluation: &[EvaluationEntry]) -> Result<()> {
        self.write_json(EVALUATION_FILE, evaluation).await
    }

    pub async fn load_decisions(&self) -> Result<Vec<DecisionRecord>> {
        self.read_json(DECISION_FILE).await
    }

    pub async fn load_arrivals(&self) -> Result<Vec<ArrivalRecord>> {
        self.read_json(ARRIVAL_FILE).await
    }

    pub async fn load_evaluation(&self) -> Result<Vec<EvaluationEntry>> {
        self.read_json(EVALUATION_FILE).await
    }

    async fn write_json<T: Serialize + ?Sized>(&self, name: &str, value: &T) -> Result<()> {
        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .context(format!("Failed to create output directory {:?}", self.output_dir))?;
        let path = self.output_dir.join(name);
        let json = serde_json::to_string_pretty(value).context(format!("Failed to serialize {}", name))?;
        tokio::fs::write(&path, json)
            .await
            .context(format!("Failed to write {:?}", path))?;
        tracing::debug!(path = ?path, "artifact written");
        Ok(())
    }

    async fn read_json<T: DeserializeOwned>(&self, name: &str) -> Result<T> {
        let path = self.output_dir.join(name);
        let json = tokio::fs::read_to_string(&path)
            .await
            .context(format!("Failed to read {:?}", path))?;
        serde_json::from_str(&json).context(format!("Failed to deserialize {:?}", path))
    }
}
