pub mod frame;
pub mod types;

pub use frame::{Frame, CHANNELS, GRAY};
pub use types::{
    ArrivalRecord, DecisionRecord, Direction, EvaluationEntry, Location, MotionSample,
    RunSummary, TickResult, TileArrival, TileChoice, TileId,
};
