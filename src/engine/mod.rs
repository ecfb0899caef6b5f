pub mod artifacts;
pub mod pipeline;
pub mod state;

pub use artifacts::ArtifactStore;
pub use pipeline::{SimInputs, Simulation, SimulationOutput};
pub use state::PipelineState;
