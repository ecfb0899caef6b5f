//! Per-tick viewport scoring and the run aggregate.

use std::collections::BTreeMap;

use crate::approach::Approach;
use crate::config::SimConfig;
use crate::core::{
    ArrivalRecord, Frame, Location, MotionSample, RunSummary, TickResult, TileArrival, TileId,
};
use crate::frames::{FrameSink, FrameSource};
use crate::projection::{FovRange, ProjectionFormat, SamplingSize, TileProjection};
use crate::trace::SizeTable;
use crate::Result;

use super::quality;
use super::reconstruct::{ground_truth, render_display, BackgroundLayout, DisplayContext, DisplayInput};
use super::remap::InterMode;

/// Scoring cadence, metric selection and cost weights
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationSettings {
    pub fps: u32,
    pub chunk_ms: u64,
    pub pre_download_ms: u64,
    pub video_duration_ms: u64,
    pub psnr: bool,
    pub ssim: bool,
    pub mse: bool,
    /// Metrics are computed every `frequency` frames
    pub frequency: u32,
    pub save_result_img: bool,
    pub use_gpu: bool,
    pub gc_weights: [f64; 3],
    pub gpu_computation_cost: f64,
    /// Grid used for the out-of-view estimate
    pub sampling: SamplingSize,
}

impl EvaluationSettings {
    pub fn from_config(config: &SimConfig) -> Self {
        Self {
            fps: config.video.video_fps,
            chunk_ms: config.video.chunk_ms(),
            pre_download_ms: config.method.pre_download_ms(),
            video_duration_ms: config.video.duration_ms(),
            psnr: config.metric.psnr_flag,
            ssim: config.metric.ssim_flag,
            mse: config.metric.mse_flag,
            frequency: config.metric.psnr_ssim_frequency,
            save_result_img: config.metric.save_result_img,
            use_gpu: config.metric.use_gpu,
            gc_weights: [config.score.gc_w1, config.score.gc_w2, config.computation_weight()],
            gpu_computation_cost: config.score.gpu_computation_cost,
            sampling: config.metric.decision_sampling(),
        }
    }

    fn frame_index(&self, elapsed_ms: u64) -> u64 {
        elapsed_ms * self.fps as u64 / 1000
    }
}

/// Rendering geometry shared by every tick
#[derive(Debug, Clone, Copy)]
pub struct ViewportSpec {
    pub converted: TileProjection,
    pub origin_format: ProjectionFormat,
    pub background: Option<BackgroundLayout>,
    pub fov: FovRange,
    pub fov_sampling: SamplingSize,
    pub inter_mode: InterMode,
}

impl ViewportSpec {
    pub fn from_config(config: &SimConfig) -> Result<Self> {
        let bg = &config.method.background;
        Ok(Self {
            converted: TileProjection::new(
                config.video.converted.projection,
                config.video.converted.resolution(),
                config.method.tile_grid(),
                config.metric.fov(),
            ),
            origin_format: config.video.origin.projection,
            background: bg.enabled.then(|| BackgroundLayout {
                format: bg.projection,
                resolution: bg.resolution(),
            }),
            fov: config.metric.fov(),
            fov_sampling: config.metric.fov_sampling(),
            inter_mode: config.metric.inter_mode()?,
        })
    }
}

/// Replays the real motion trace against the arrival ledger
pub struct Evaluator {
    approach: Box<dyn Approach>,
    viewport: ViewportSpec,
    quality_list: Vec<u32>,
    settings: EvaluationSettings,
    arrivals: BTreeMap<u32, ArrivalRecord>,
    base_ts: Option<u64>,
    last_frame_idx: Option<u64>,
    last_truth_idx: Option<u64>,
    last_frame: Option<Frame>,
    psnr: Vec<f64>,
    ssim: Vec<f64>,
    mse: Vec<f64>,
    out_area: Vec<f64>,
}

impl Evaluator {
    pub fn new(
        approach: Box<dyn Approach>,
        viewport: ViewportSpec,
        quality_list: Vec<u32>,
        settings: EvaluationSettings,
        arrivals: Vec<ArrivalRecord>,
    ) -> Self {
        Self {
            approach,
            viewport,
            quality_list,
            settings,
            arrivals: arrivals.into_iter().map(|r| (r.chunk_idx, r)).collect(),
            base_ts: None,
            last_frame_idx: None,
            last_truth_idx: None,
            last_frame: None,
            psnr: Vec::new(),
            ssim: Vec::new(),
            mse: Vec::new(),
            out_area: Vec::new(),
        }
    }

    pub fn from_config(config: &SimConfig, approach: Box<dyn Approach>, arrivals: Vec<ArrivalRecord>) -> Result<Self> {
        Ok(Self::new(
            approach,
            ViewportSpec::from_config(config)?,
            config.video.converted.quality_list.clone(),
            EvaluationSettings::from_config(config),
            arrivals,
        ))
    }

    fn display_context(&self) -> DisplayContext<'_> {
        DisplayContext {
            converted: &self.viewport.converted,
            quality_list: &self.quality_list,
            background: self.viewport.background,
            fov: self.viewport.fov,
            fov_sampling: self.viewport.fov_sampling,
            inter_mode: self.viewport.inter_mode,
        }
    }

    async fn render_truth(&self, frames: &dyn FrameSource, sample: &MotionSample, frame_idx: u64) -> Result<Frame> {
        let source = frames.source_frame(frame_idx).await?;
        Ok(ground_truth(
            &source,
            self.viewport.origin_format,
            &sample.direction(),
            self.viewport.fov,
            self.viewport.fov_sampling,
            self.viewport.inter_mode,
        ))
    }

    /// Score one motion sample.
    ///
    /// Returns `None` for pre-download ticks and for samples that fall on an
    /// already evaluated frame.
    pub async fn evaluate_motion(
        &mut self,
        sample: &MotionSample,
        frames: &dyn FrameSource,
        mut sink: Option<&mut dyn FrameSink>,
    ) -> Result<Option<TickResult>> {
        let base_ts = *self.base_ts.get_or_insert(sample.timestamp);
        let elapsed = sample.timestamp.saturating_sub(base_ts);
        let frame_idx = self.settings.frame_index(elapsed);

        if elapsed <= self.settings.pre_download_ms {
            if self.settings.save_result_img && self.last_truth_idx != Some(frame_idx) {
                if let Some(sink) = sink.as_deref_mut() {
                    let truth = self.render_truth(frames, sample, frame_idx).await?;
                    sink.write_frame(frame_idx, &truth).await?;
                    self.last_frame = Some(truth);
                }
                self.last_truth_idx = Some(frame_idx);
            }
            return Ok(None);
        }

        if self.last_frame_idx == Some(frame_idx) {
            return Ok(None);
        }
        self.last_frame_idx = Some(frame_idx);

        let base_frame_idx = self.settings.frame_index(self.settings.pre_download_ms);
        let metric_tick = (self.settings.psnr || self.settings.ssim || self.settings.mse)
            && frame_idx.saturating_sub(base_frame_idx) % self.settings.frequency.max(1) as u64 == 0;

        let chunk_idx = (elapsed / self.settings.chunk_ms.max(1)) as u32;
        let tick = sample.timestamp as f64;
        let record = self
            .arrivals
            .get(&chunk_idx)
            .filter(|r| r.first_playable_ts().is_some_and(|ts| ts <= tick));

        let Some(record) = record else {
            tracing::info!(ts = sample.timestamp, chunk = chunk_idx, frame = frame_idx, "no content to play");
            if self.settings.save_result_img {
                if let (Some(sink), Some(last)) = (sink.as_deref_mut(), self.last_frame.as_ref()) {
                    sink.write_frame(frame_idx, last).await?;
                }
            }
            let mut mse = None;
            if metric_tick {
                self.psnr.push(0.0);
                self.ssim.push(0.0);
                if self.settings.mse {
                    self.mse.push(quality::WORST_MSE);
                    mse = Some(quality::WORST_MSE);
                }
            }
            self.out_area.push(1.0);
            return Ok(Some(TickResult {
                motion_ts: sample.timestamp,
                frame_idx,
                yaw: sample.yaw,
                pitch: sample.pitch,
                location: Location::NoContent,
                out_area_percent: 1.0,
                psnr: 0.0,
                ssim: 0.0,
                mse,
            }));
        };

        let delivered: Vec<TileArrival> = record.playable_at(tick).copied().collect();
        let footprint = self
            .viewport
            .converted
            .sphere_to_tile(&sample.direction(), self.settings.sampling);
        let missing = footprint
            .per_sample
            .iter()
            .filter(|&&t| !delivered.iter().any(|d| d.tile_idx == TileId::Tile(t)))
            .count();
        let (location, out_area_percent) = if missing == 0 {
            (Location::In, 0.0)
        } else {
            (Location::Out, missing as f64 / footprint.per_sample.len().max(1) as f64)
        };
        self.out_area.push(out_area_percent);

        let (mut psnr, mut ssim, mut mse) = (0.0, 0.0, None);
        if metric_tick {
            let mut quality_frames = Vec::with_capacity(self.quality_list.len());
            for &q in &self.quality_list {
                quality_frames.push(frames.converted_frame(q, frame_idx).await?);
            }
            let background = match self.viewport.background {
                Some(_) => Some(frames.background_frame(frame_idx).await?),
                None => None,
            };

            let input = DisplayInput {
                direction: sample.direction(),
                delivered: &delivered,
                quality_frames: &quality_frames,
                background_frame: background.as_ref(),
            };
            let ctx = self.display_context();
            let samples = self.approach.generate_display_result(&input, &ctx)?;
            let display = render_display(&input, &ctx, &samples)?;
            let truth = self.render_truth(frames, sample, frame_idx).await?;

            if self.settings.psnr {
                psnr = quality::psnr(&truth, &display)?;
            }
            if self.settings.ssim {
                ssim = quality::ssim(&truth, &display)?;
            }
            if self.settings.mse {
                let value = quality::mse(&truth, &display)?;
                self.mse.push(value);
                mse = Some(value);
            }
            self.psnr.push(psnr);
            self.ssim.push(ssim);

            if self.settings.save_result_img {
                if let Some(sink) = sink.as_deref_mut() {
                    sink.write_frame(frame_idx, &display).await?;
                }
            }
            self.last_frame = Some(display);
        }

        tracing::debug!(
            ts = sample.timestamp,
            frame = frame_idx,
            ?location,
            out_area_percent,
            psnr,
            ssim,
            "tick evaluated"
        );

        Ok(Some(TickResult {
            motion_ts: sample.timestamp,
            frame_idx,
            yaw: sample.yaw,
            pitch: sample.pitch,
            location,
            out_area_percent,
            psnr,
            ssim,
            mse,
        }))
    }

    /// Score a whole motion trace, up to the end of the video
    pub async fn run(
        &mut self,
        motion: &[MotionSample],
        frames: &dyn FrameSource,
        mut sink: Option<&mut dyn FrameSink>,
    ) -> Result<Vec<TickResult>> {
        let mut ticks = Vec::new();
        let Some(first) = motion.first() else {
            return Ok(ticks);
        };
        let end_ts = self.base_ts.unwrap_or(first.timestamp) + self.settings.video_duration_ms;
        for sample in motion.iter().take_while(|m| m.timestamp < end_ts) {
            let sink = sink.as_mut().map(|s| &mut **s as &mut dyn FrameSink);
            if let Some(tick) = self.evaluate_motion(sample, frames, sink).await? {
                ticks.push(tick);
            }
        }
        tracing::info!(ticks = ticks.len(), "evaluation stage finished");
        Ok(ticks)
    }

    /// Aggregate quality, bandwidth, storage and the composite score
    pub fn finish(&self, sizes: &SizeTable) -> RunSummary {
        let s = &self.settings;
        let total_bytes: u64 = self.arrivals.values().map(|r| r.chunk_size).sum();
        let chunk_s = s.chunk_ms as f64 / 1000.0;
        let max_rate = self
            .arrivals
            .values()
            .map(|r| r.chunk_size as f64 / chunk_s)
            .fold(0.0, f64::max);
        let scored_s = s.video_duration_ms.saturating_sub(s.pre_download_ms) as f64 / 1000.0;
        let avg_rate = if scored_s > 0.0 { total_bytes as f64 / scored_s } else { 0.0 };

        let bandwidth_gb = total_bytes as f64 / 1e9;
        let storage_gb = sizes.total_storage() as f64 / 1e9;
        let computation = if s.use_gpu { s.gpu_computation_cost } else { 0.0 };
        let [w1, w2, w3] = s.gc_weights;
        let cost = [w1 * bandwidth_gb, w2 * storage_gb, w3 * computation];
        let denominator: f64 = cost.iter().sum();

        let avg_psnr = mean(&self.psnr);
        let gc_score = if denominator > 0.0 { avg_psnr / denominator } else { 0.0 };

        let summary = RunSummary {
            avg_psnr,
            avg_ssim: mean(&self.ssim),
            avg_mse: mean(&self.mse),
            avg_out_area_percent: mean(&self.out_area),
            max_bandwidth_mbps: max_rate / 125.0 / 1000.0,
            avg_bandwidth_mbps: avg_rate / 125.0 / 1000.0,
            total_transfer_mb: total_bytes as f64 / 1e6,
            total_storage_gb: storage_gb,
            cost,
            gc_score,
        };
        tracing::info!(
            avg_psnr = summary.avg_psnr,
            avg_bandwidth_mbps = summary.avg_bandwidth_mbps,
            gc_score = summary.gc_score,
            "run scored"
        );
        summary
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}
