//! Viewport reconstruction and scoring.

pub mod quality;
pub mod reconstruct;
pub mod remap;
pub mod scorer;

pub use reconstruct::{
    checkout_tiles, concat_canvas, display_samples, fov_coordinates, ground_truth, reconstruct_viewport,
    render_display, BackgroundLayout, DisplayContext, DisplayInput, DisplaySamples,
};
pub use remap::{remap, InterMode};
pub use scorer::{EvaluationSettings, Evaluator, ViewportSpec};
