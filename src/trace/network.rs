//! Piecewise-constant bandwidth traces.

use serde::{Deserialize, Serialize};

use crate::{Result, SimError};

/// One segment as recorded on disk
#[derive(Debug, Clone, Deserialize)]
struct SegmentEntry {
    #[serde(rename = "throughput_MBps")]
    throughput_mbps: f64,
    duration_ms: f64,
    #[serde(default)]
    rtt: Option<f64>,
}

/// Constant-throughput interval of a trace
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NetworkSegment {
    pub start_ms: f64,
    pub duration_ms: f64,
    /// Bytes per second
    pub throughput: f64,
    /// Milliseconds; `None` falls back to the configured rtt
    pub rtt: Option<f64>,
}

impl NetworkSegment {
    pub fn end_ms(&self) -> f64 {
        self.start_ms + self.duration_ms
    }
}

/// Ordered, contiguous segments. The last one never ends.
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkTrace {
    segments: Vec<NetworkSegment>,
}

impl NetworkTrace {
    /// Build from `(throughput bytes/s, duration ms, rtt)` triples starting at 0
    pub fn from_segments(segments: impl IntoIterator<Item = (f64, f64, Option<f64>)>) -> Result<Self> {
        let mut start_ms = 0.0;
        let mut out = Vec::new();
        for (i, (throughput, duration_ms, rtt)) in segments.into_iter().enumerate() {
            if !(throughput > 0.0) || !throughput.is_finite() {
                return Err(SimError::malformed(
                    "network trace",
                    format!("segment {i} has non-positive throughput {throughput}"),
                ));
            }
            if !(duration_ms >= 0.0) {
                return Err(SimError::malformed(
                    "network trace",
                    format!("segment {i} has negative duration {duration_ms}"),
                ));
            }
            out.push(NetworkSegment {
                start_ms,
                duration_ms,
                throughput,
                rtt,
            });
            start_ms += duration_ms;
        }
        if out.is_empty() {
            return Err(SimError::malformed("network trace", "no segments"));
        }
        Ok(Self { segments: out })
    }

    /// Parse the JSON segment list, scaling throughput by `scale_ratio`
    pub fn from_json_str(json: &str, scale_ratio: f64) -> Result<Self> {
        let entries: Vec<SegmentEntry> = serde_json::from_str(json)?;
        Self::from_segments(
            entries
                .into_iter()
                .map(|e| (e.throughput_mbps * scale_ratio * 1e6, e.duration_ms, e.rtt)),
        )
    }

    pub fn segments(&self) -> &[NetworkSegment] {
        &self.segments
    }

    pub fn cursor(&self) -> NetworkCursor<'_> {
        NetworkCursor { trace: self, idx: 0 }
    }
}

/// Forward-only position in a trace
#[derive(Debug, Clone)]
pub struct NetworkCursor<'a> {
    trace: &'a NetworkTrace,
    idx: usize,
}

/// Outcome of one serialized download
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transfer {
    pub end_ms: f64,
    /// Segment the last byte arrived in
    pub segment: NetworkSegment,
}

impl<'a> NetworkCursor<'a> {
    pub fn segment(&self) -> NetworkSegment {
        self.trace.segments[self.idx]
    }

    fn is_last(&self) -> bool {
        self.idx + 1 >= self.trace.segments.len()
    }

    /// Download `bytes` starting at `start_ms`, crossing segment boundaries
    /// as needed. The cursor only moves forward.
    pub fn transfer(&mut self, start_ms: f64, bytes: u64) -> Transfer {
        while !self.is_last() && self.segment().end_ms() <= start_ms {
            self.idx += 1;
        }

        let mut clock = start_ms.max(self.segment().start_ms);
        let mut remaining = bytes as f64;
        loop {
            let seg = self.segment();
            let rate_per_ms = seg.throughput / 1000.0;
            if self.is_last() {
                clock += remaining / rate_per_ms;
                break;
            }
            let capacity = (seg.end_ms() - clock) * rate_per_ms;
            if capacity >= remaining {
                clock += remaining / rate_per_ms;
                break;
            }
            remaining -= capacity;
            clock = seg.end_ms();
            self.idx += 1;
        }

        Transfer {
            end_ms: clock,
            segment: self.segment(),
        }
    }
}
