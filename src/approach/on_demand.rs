use serde_json::Value;
use tilesim_macros::Approach;

use super::{predict_constant, Approach, DEFAULT_SMOOTHING};
use crate::core::MotionSample;
use crate::decision::HistoricalWindow;
use crate::{Result, SimError};

/// Fetch the tiles of the predicted viewport at the lowest quality
#[derive(Approach, Debug, Clone)]
#[approach_meta(name = "On-demand", description = "Viewport-predicted tiles at the lowest quality")]
pub struct OnDemand {
    #[param(default = "0.3", min = 0.0, max = 1.0)]
    pub alpha: f64,
}

impl Default for OnDemand {
    fn default() -> Self {
        Self {
            alpha: DEFAULT_SMOOTHING,
        }
    }
}

impl Approach for OnDemand {
    fn on_create(&mut self, config: &Value) -> Result<()> {
        if let Some(alpha) = config.get("alpha").and_then(|v| v.as_f64()) {
            if !(0.0..=1.0).contains(&alpha) {
                return Err(SimError::config(format!("alpha must lie in [0, 1], got {alpha}")));
            }
            self.alpha = alpha;
        }
        Ok(())
    }

    fn predict_motion(&self, window: &HistoricalWindow, pw_size: u32) -> Vec<MotionSample> {
        predict_constant(window, pw_size, self.alpha)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_alpha_from_config() {
        let mut approach = OnDemand::default();
        approach.on_create(&json!({"alpha": 0.5})).unwrap();
        assert_eq!(approach.alpha, 0.5);

        assert!(approach.on_create(&json!({"alpha": 1.5})).is_err());
        approach.on_create(&Value::Null).unwrap();
        assert_eq!(approach.alpha, 0.5);
    }
}
