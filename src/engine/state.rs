use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Simulation run states
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelineState {
    Idle,
    Deciding,
    Simulating {
        decisions: usize,
    },
    Evaluating {
        chunks: usize,
    },
    Completed {
        #[serde(skip)]
        duration: Option<Duration>,
        ticks: usize,
    },
    Error {
        error_msg: String,
    },
}

impl PipelineState {
    /// Check if transition from current state to target state is valid
    pub fn can_transition_to(&self, target: &PipelineState) -> bool {
        use PipelineState::*;

        matches!(
            (self, target),
            (Idle, Deciding) |

            (Deciding, Simulating { .. }) |
            (Deciding, Error { .. }) |

            (Simulating { .. }, Evaluating { .. }) |
            (Simulating { .. }, Error { .. }) |

            (Evaluating { .. }, Completed { .. }) |
            (Evaluating { .. }, Error { .. }) |

            // a finished or failed run may be restarted
            (Completed { .. }, Idle) |
            (Error { .. }, Idle)
        )
    }

    /// Get human-readable state name
    pub fn name(&self) -> &str {
        match self {
            Self::Idle => "Idle",
            Self::Deciding => "Deciding",
            Self::Simulating { .. } => "Simulating",
            Self::Evaluating { .. } => "Evaluating",
            Self::Completed { .. } => "Completed",
            Self::Error { .. } => "Error",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed { .. } | Self::Error { .. })
    }
}

impl Default for PipelineState {
    fn default() -> Self {
        Self::Idle
    }
}
