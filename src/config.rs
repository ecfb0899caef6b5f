//! Run configuration.
//!
//! One JSON document, split into sections. Every field has a default so a
//! config file only needs to name what it changes.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::evaluation::InterMode;
use crate::projection::{FovRange, ProjectionFormat, Resolution, SamplingSize, TileGrid};
use crate::{Result, SimError};

/// Frame geometry of a video stream
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamSpec {
    pub width: usize,
    pub height: usize,
    pub projection: ProjectionFormat,
}

impl StreamSpec {
    pub fn resolution(&self) -> Resolution {
        Resolution::new(self.width, self.height)
    }
}

/// The tiled stream the client fetches
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConvertedSpec {
    pub width: usize,
    pub height: usize,
    pub projection: ProjectionFormat,
    /// Encoding qualities, one slot per entry in the reconstruction canvas
    pub quality_list: Vec<u32>,
}

impl ConvertedSpec {
    pub fn resolution(&self) -> Resolution {
        Resolution::new(self.width, self.height)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoConfig {
    /// Seconds
    pub video_duration: f64,
    pub video_fps: u32,
    /// Seconds
    pub chunk_duration: f64,
    /// Milliseconds
    pub rendering_delay: f64,
    pub origin: StreamSpec,
    pub converted: ConvertedSpec,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            video_duration: 10.0,
            video_fps: 30,
            chunk_duration: 1.0,
            rendering_delay: 10.0,
            origin: StreamSpec {
                width: 3840,
                height: 1920,
                projection: ProjectionFormat::Erp,
            },
            converted: ConvertedSpec {
                width: 3840,
                height: 1920,
                projection: ProjectionFormat::Erp,
                quality_list: vec![29],
            },
        }
    }
}

impl VideoConfig {
    pub fn duration_ms(&self) -> u64 {
        seconds_to_ms(self.video_duration)
    }

    pub fn chunk_ms(&self) -> u64 {
        seconds_to_ms(self.chunk_duration)
    }

    pub fn chunk_count(&self) -> u64 {
        match self.chunk_ms() {
            0 => 0,
            chunk => self.duration_ms() / chunk,
        }
    }
}

/// Where the decision logic runs relative to the network link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecisionLocation {
    Client,
    Server,
}

impl DecisionLocation {
    /// Share of the round trip between motion capture and the decision
    pub fn motion_delay(&self, rtt_ms: f64) -> f64 {
        match self {
            Self::Client => 0.0,
            Self::Server => rtt_ms / 2.0,
        }
    }

    /// Share of the round trip charged to each download
    pub fn download_rtt(&self, rtt_ms: f64) -> f64 {
        match self {
            Self::Client => rtt_ms,
            Self::Server => rtt_ms / 2.0,
        }
    }
}

impl FromStr for DecisionLocation {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "client" => Ok(Self::Client),
            "server" => Ok(Self::Server),
            other => Err(SimError::config(format!(
                "decision_location must be client or server, got {other:?}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackgroundConfig {
    pub enabled: bool,
    pub width: usize,
    pub height: usize,
    pub projection: ProjectionFormat,
}

impl Default for BackgroundConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            width: 960,
            height: 480,
            projection: ProjectionFormat::Erp,
        }
    }
}

impl BackgroundConfig {
    pub fn resolution(&self) -> Resolution {
        Resolution::new(self.width, self.height)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MethodConfig {
    /// Registry id of the approach
    pub approach: String,
    pub decision_location: String,
    /// Milliseconds
    pub decision_delay: u64,
    /// Seconds
    pub pre_download_duration: f64,
    /// Seconds
    pub hw_size: f64,
    pub pw_size: u32,
    pub tile_width_num: u32,
    pub tile_height_num: u32,
    pub background: BackgroundConfig,
    /// Handed to the approach unchanged
    pub approach_config: Value,
}

impl Default for MethodConfig {
    fn default() -> Self {
        Self {
            approach: "ondemand".to_string(),
            decision_location: "client".to_string(),
            decision_delay: 300,
            pre_download_duration: 0.0,
            hw_size: 1.0,
            pw_size: 1,
            tile_width_num: 6,
            tile_height_num: 4,
            background: BackgroundConfig::default(),
            approach_config: Value::Null,
        }
    }
}

impl MethodConfig {
    pub fn location(&self) -> Result<DecisionLocation> {
        self.decision_location.parse()
    }

    pub fn tile_grid(&self) -> TileGrid {
        TileGrid::new(self.tile_width_num, self.tile_height_num)
    }

    pub fn hw_size_ms(&self) -> u64 {
        seconds_to_ms(self.hw_size)
    }

    pub fn pre_download_ms(&self) -> u64 {
        seconds_to_ms(self.pre_download_duration)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionConfig {
    /// Samples per second in the recorded trace
    pub sample_frequency: u32,
    /// Samples per second after interpolation
    pub motion_frequency: u32,
    /// 1-based user selection within the trace file
    pub column_idx: usize,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            sample_frequency: 10,
            motion_frequency: 100,
            column_idx: 1,
        }
    }
}

impl MotionConfig {
    pub fn sample_interval_ms(&self) -> u64 {
        1000 / self.sample_frequency.max(1) as u64
    }

    pub fn motion_interval_ms(&self) -> u64 {
        1000 / self.motion_frequency.max(1) as u64
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Milliseconds, used when a trace segment has no rtt of its own
    pub rtt: f64,
    pub network_scale_ratio: f64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            rtt: 30.0,
            network_scale_ratio: 1.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricConfig {
    /// Degrees, [width, height]
    pub range_fov: [f64; 2],
    /// [height, width] of the rendered viewport
    pub fov_resolution: [usize; 2],
    /// [height, width] of the decision-time sampling grid
    pub sampling_size: [usize; 2],
    pub psnr_flag: bool,
    pub ssim_flag: bool,
    pub mse_flag: bool,
    pub psnr_ssim_frequency: u32,
    pub inter_mode: String,
    pub use_gpu: bool,
    pub save_result_img: bool,
}

impl Default for MetricConfig {
    fn default() -> Self {
        Self {
            range_fov: [89.0, 89.0],
            fov_resolution: [1920, 1832],
            sampling_size: [50, 50],
            psnr_flag: true,
            ssim_flag: false,
            mse_flag: false,
            psnr_ssim_frequency: 1,
            inter_mode: "bilinear".to_string(),
            use_gpu: false,
            save_result_img: false,
        }
    }
}

impl MetricConfig {
    pub fn fov(&self) -> FovRange {
        FovRange::new(self.range_fov[0], self.range_fov[1])
    }

    pub fn fov_sampling(&self) -> SamplingSize {
        SamplingSize::new(self.fov_resolution[0], self.fov_resolution[1])
    }

    pub fn decision_sampling(&self) -> SamplingSize {
        SamplingSize::new(self.sampling_size[0], self.sampling_size[1])
    }

    pub fn inter_mode(&self) -> Result<InterMode> {
        self.inter_mode.parse()
    }
}

/// Weights of the composite score
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreConfig {
    pub gc_w1: f64,
    pub gc_w2: f64,
    /// Defaults to video duration in hours
    pub gc_w3: Option<f64>,
    pub gpu_computation_cost: f64,
}

impl Default for ScoreConfig {
    fn default() -> Self {
        Self {
            gc_w1: 0.09,
            gc_w2: 0.000015,
            gc_w3: None,
            gpu_computation_cost: 1.204,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub motion_file: PathBuf,
    pub network_file: PathBuf,
    pub size_file: PathBuf,
    pub output_dir: PathBuf,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub video: VideoConfig,
    pub method: MethodConfig,
    pub motion: MotionConfig,
    pub network: NetworkConfig,
    pub metric: MetricConfig,
    pub score: ScoreConfig,
    pub paths: PathsConfig,
}

impl SimConfig {
    /// Parse and validate a JSON document
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: SimConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from disk; relative trace paths resolve against the config file
    pub async fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let json = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config from {:?}", path))?;
        let mut config = Self::from_json_str(&json)
            .context(format!("Failed to load config {:?}", path))?;

        if let Some(base) = path.parent() {
            config.paths.resolve_against(base);
        }
        Ok(config)
    }

    /// Reject configurations that cannot be simulated
    pub fn validate(&self) -> Result<()> {
        let v = &self.video;
        let m = &self.method;

        if !(v.video_duration > 0.0) || !(v.chunk_duration > 0.0) {
            return Err(SimError::config("video_duration and chunk_duration must be positive"));
        }
        if v.video_fps == 0 {
            return Err(SimError::config("video_fps must be positive"));
        }
        let chunk_ms = v.chunk_ms();
        if chunk_ms == 0 || v.duration_ms() % chunk_ms != 0 {
            return Err(SimError::config(format!(
                "video_duration {}s is not a multiple of chunk_duration {}s",
                v.video_duration, v.chunk_duration
            )));
        }
        if m.pre_download_duration < 0.0 || m.pre_download_ms() % chunk_ms != 0 {
            return Err(SimError::config(format!(
                "pre_download_duration {}s is not a multiple of chunk_duration {}s",
                m.pre_download_duration, v.chunk_duration
            )));
        }
        if m.pre_download_ms() >= v.duration_ms() {
            return Err(SimError::config("pre_download_duration must be shorter than the video"));
        }

        validate_stream("origin", v.origin.width, v.origin.height, v.origin.projection)?;
        validate_stream("converted", v.converted.width, v.converted.height, v.converted.projection)?;
        if m.background.enabled {
            validate_stream("background", m.background.width, m.background.height, m.background.projection)?;
        }
        if v.converted.quality_list.is_empty() {
            return Err(SimError::config("quality_list must not be empty"));
        }

        if m.tile_width_num == 0 || m.tile_height_num == 0 {
            return Err(SimError::config("tile_width_num and tile_height_num must be positive"));
        }
        if m.tile_width_num as usize > v.converted.width || m.tile_height_num as usize > v.converted.height {
            return Err(SimError::config("tile grid is finer than the converted frame"));
        }
        if m.pw_size == 0 {
            return Err(SimError::config("pw_size must be at least 1"));
        }
        if m.hw_size_ms() == 0 {
            return Err(SimError::config("hw_size must be positive"));
        }
        m.location()?;

        if self.motion.sample_frequency == 0 || self.motion.motion_frequency == 0 {
            return Err(SimError::config("motion frequencies must be positive"));
        }
        if self.motion.column_idx == 0 {
            return Err(SimError::config("column_idx is 1-based"));
        }
        if !(self.network.network_scale_ratio > 0.0) || self.network.rtt < 0.0 {
            return Err(SimError::config("network_scale_ratio must be positive and rtt non-negative"));
        }

        let metric = &self.metric;
        if !metric.fov().is_valid() {
            return Err(SimError::config(format!(
                "range_fov {:?} must lie in (0, 180) degrees",
                metric.range_fov
            )));
        }
        if metric.fov_sampling().count() == 0 || metric.decision_sampling().count() == 0 {
            return Err(SimError::config("fov_resolution and sampling_size must be non-empty"));
        }
        if metric.psnr_ssim_frequency == 0 {
            return Err(SimError::config("psnr_ssim_frequency must be at least 1"));
        }
        metric.inter_mode()?;

        Ok(())
    }

    /// gc_w3, or the video duration in hours
    pub fn computation_weight(&self) -> f64 {
        self.score.gc_w3.unwrap_or(self.video.video_duration / 3600.0)
    }
}

impl PathsConfig {
    fn resolve_against(&mut self, base: &Path) {
        for path in [
            &mut self.motion_file,
            &mut self.network_file,
            &mut self.size_file,
            &mut self.output_dir,
        ] {
            if !path.as_os_str().is_empty() && path.is_relative() {
                *path = base.join(&*path);
            }
        }
    }
}

fn validate_stream(name: &str, width: usize, height: usize, projection: ProjectionFormat) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(SimError::config(format!("{name} resolution must be non-zero")));
    }
    if projection.is_cube() && width * 2 != height * 3 {
        return Err(SimError::config(format!(
            "{name} {projection} frame must be 3:2, got {width}x{height}"
        )));
    }
    Ok(())
}

fn seconds_to_ms(seconds: f64) -> u64 {
    (seconds * 1000.0).round().max(0.0) as u64
}
