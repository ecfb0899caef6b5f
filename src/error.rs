//! Error types for the simulation core

use thiserror::Error;

/// Errors raised by the simulation core.
///
/// Modeled gaps (no content yet, viewport partly outside the delivered
/// tiles) are not errors; they are recorded as evaluation data.
#[derive(Debug, Error)]
pub enum SimError {
    /// The configuration cannot be simulated
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// No size-table entry for the requested tile variant
    #[error("Size not found: chunk={chunk_idx}, tile={tile}, quality={quality}")]
    MissingSize {
        chunk_idx: u32,
        tile: i64,
        quality: u32,
    },

    /// A decision record or trace is internally inconsistent
    #[error("Malformed {artifact}: {reason}")]
    Malformed { artifact: &'static str, reason: String },

    /// Projection name not supported
    #[error("Unsupported projection: {0}")]
    UnsupportedProjection(String),

    /// Interpolation name not supported
    #[error("Unsupported interpolation mode: {0}")]
    UnsupportedInterpolation(String),

    /// No approach registered under the given name
    #[error("Unknown approach: {0}")]
    UnknownApproach(String),

    /// Frame dimensions do not match
    #[error("Frame shape mismatch: {left_w}x{left_h} vs {right_w}x{right_h}")]
    ShapeMismatch {
        left_w: usize,
        left_h: usize,
        right_w: usize,
        right_h: usize,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Result type for simulation operations
pub type Result<T> = std::result::Result<T, SimError>;

impl SimError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn malformed(artifact: &'static str, reason: impl Into<String>) -> Self {
        Self::Malformed {
            artifact,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_size_display() {
        let err = SimError::MissingSize {
            chunk_idx: 3,
            tile: 7,
            quality: 22,
        };
        let msg = err.to_string();
        assert!(msg.contains("chunk=3"));
        assert!(msg.contains("tile=7"));
        assert!(msg.contains("quality=22"));
    }

    #[test]
    fn test_config_error_display() {
        let err = SimError::config("pre_download_duration must be a multiple of chunk_duration");
        assert!(err.to_string().starts_with("Invalid configuration"));
    }
}
