//! Bounded motion history owned by the decision engine.

use std::collections::VecDeque;

use crate::core::MotionSample;

/// A motion sample stamped with the time the decision logic saw it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimedSample {
    /// Milliseconds, including any decision-location shift
    pub ts: f64,
    pub motion: MotionSample,
}

/// FIFO of recent motion spanning at most `span_ms`
#[derive(Debug, Clone)]
pub struct HistoricalWindow {
    span_ms: f64,
    samples: VecDeque<TimedSample>,
}

impl HistoricalWindow {
    pub fn new(span_ms: u64) -> Self {
        Self {
            span_ms: span_ms as f64,
            samples: VecDeque::new(),
        }
    }

    /// Append, then drop from the front until the span fits
    pub fn push(&mut self, ts: f64, motion: MotionSample) {
        self.samples.push_back(TimedSample { ts, motion });
        while let (Some(front), Some(back)) = (self.samples.front(), self.samples.back()) {
            if back.ts - front.ts > self.span_ms {
                self.samples.pop_front();
            } else {
                break;
            }
        }
    }

    pub fn front(&self) -> Option<&TimedSample> {
        self.samples.front()
    }

    pub fn back(&self) -> Option<&TimedSample> {
        self.samples.back()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TimedSample> {
        self.samples.iter()
    }

    /// Time covered between the oldest and newest sample
    pub fn span(&self) -> f64 {
        match (self.samples.front(), self.samples.back()) {
            (Some(front), Some(back)) => back.ts - front.ts,
            _ => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_evicts_oldest() {
        let mut hw = HistoricalWindow::new(100);
        for ts in [0u64, 50, 100, 150, 260] {
            hw.push(ts as f64, MotionSample::new(ts, 0.0, 0.0));
        }
        // 260 - 150 > 100, so only the newest sample is left
        assert_eq!(hw.len(), 1);
        assert_eq!(hw.front().unwrap().ts, 260.0);
    }

    #[test]
    fn test_span_boundary_is_inclusive() {
        let mut hw = HistoricalWindow::new(100);
        hw.push(0.0, MotionSample::new(0, 0.0, 0.0));
        hw.push(100.0, MotionSample::new(100, 0.0, 0.0));
        assert_eq!(hw.len(), 2);
        assert_eq!(hw.span(), 100.0);
    }

    proptest! {
        #[test]
        fn prop_span_stays_bounded(
            span in 1u64..2_000,
            steps in prop::collection::vec(0u64..500, 1..200),
        ) {
            let mut hw = HistoricalWindow::new(span);
            let mut ts = 0u64;
            for step in steps {
                ts += step;
                hw.push(ts as f64, MotionSample::new(ts, 0.0, 0.0));

                prop_assert!(hw.span() <= span as f64);
                prop_assert_eq!(hw.back().unwrap().ts, ts as f64);
                let ordered = hw.iter().zip(hw.iter().skip(1)).all(|(a, b)| a.ts <= b.ts);
                prop_assert!(ordered);
            }
        }
    }
}
