//! Head-motion traces.

use crate::core::MotionSample;
use crate::{Result, SimError};

/// Parse a recorded head-motion file.
///
/// The file has one header line, then a pitch line and a yaw line per user,
/// each a space-separated list of angles in radians. `user_column` selects
/// the user (1-based); sample `i` is stamped `i * sample_interval_ms`.
pub fn read_head_trace(text: &str, user_column: usize, sample_interval_ms: u64) -> Result<Vec<MotionSample>> {
    let mut lines = text.lines().skip(1);
    let mut user = 0;

    loop {
        let pitch_line = lines.next().unwrap_or("");
        let yaw_line = lines.next().unwrap_or("");
        let pitch: Vec<&str> = pitch_line.split_whitespace().collect();
        if pitch.len() <= 1 {
            break;
        }
        user += 1;
        if user != user_column {
            continue;
        }

        let yaw: Vec<&str> = yaw_line.split_whitespace().collect();
        if yaw.len() != pitch.len() {
            return Err(SimError::malformed(
                "motion trace",
                format!("user {user}: {} pitch values but {} yaw values", pitch.len(), yaw.len()),
            ));
        }

        return yaw
            .iter()
            .zip(pitch.iter())
            .enumerate()
            .map(|(i, (y, p))| {
                let yaw = parse_angle(y, user, i)?;
                let pitch = parse_angle(p, user, i)?;
                Ok(MotionSample::new(i as u64 * sample_interval_ms, yaw, pitch))
            })
            .collect();
    }

    Err(SimError::malformed(
        "motion trace",
        format!("user column {user_column} not found ({user} users in file)"),
    ))
}

fn parse_angle(token: &str, user: usize, idx: usize) -> Result<f64> {
    token
        .parse::<f64>()
        .map_err(|e| SimError::malformed("motion trace", format!("user {user}, sample {idx}: {token:?}: {e}")))
}

/// Resample a sparse trace at a fixed interval.
///
/// A trace shorter than the video is extended by holding its last sample
/// until `first_ts + video_duration_ms`. Between neighbours yaw and pitch are
/// linear; roll and scale hold the earlier sample. Repeated timestamps keep
/// the first sample.
pub fn interpolate(records: &[MotionSample], motion_interval_ms: u64, video_duration_ms: u64) -> Vec<MotionSample> {
    let mut records = dedup_timestamps(records);
    let (Some(first), Some(last)) = (records.first().copied(), records.last().copied()) else {
        return Vec::new();
    };

    let end = first.timestamp + video_duration_ms;
    if last.timestamp <= end {
        records.push(MotionSample { timestamp: end, ..last });
    }

    let step = motion_interval_ms.max(1);
    let mut out = Vec::new();
    for pair in records.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        if b.timestamp <= a.timestamp {
            continue;
        }
        let span = (b.timestamp - a.timestamp) as f64;
        let mut ts = a.timestamp;
        while ts < b.timestamp {
            let t = (ts - a.timestamp) as f64 / span;
            out.push(MotionSample {
                timestamp: ts,
                yaw: a.yaw + (b.yaw - a.yaw) * t,
                pitch: a.pitch + (b.pitch - a.pitch) * t,
                ..a
            });
            ts += step;
        }
    }
    out
}

fn dedup_timestamps(records: &[MotionSample]) -> Vec<MotionSample> {
    let mut out: Vec<MotionSample> = Vec::with_capacity(records.len());
    for r in records {
        match out.last() {
            Some(prev) if r.timestamp <= prev.timestamp => {
                tracing::debug!(ts = r.timestamp, "dropping repeated motion timestamp");
            }
            _ => out.push(*r),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRACE: &str = "header\n0.1 0.2 0.3\n1.0 1.1 1.2\n-0.1 -0.2 -0.3\n2.0 2.1 2.2\n";

    #[test]
    fn test_read_selects_user_column() {
        let first = read_head_trace(TRACE, 1, 100).unwrap();
        assert_eq!(first.len(), 3);
        assert_eq!(first[1].timestamp, 100);
        assert_eq!(first[1].pitch, 0.2);
        assert_eq!(first[1].yaw, 1.1);

        let second = read_head_trace(TRACE, 2, 100).unwrap();
        assert_eq!(second[2].pitch, -0.3);
        assert_eq!(second[2].yaw, 2.2);
    }

    #[test]
    fn test_read_missing_user() {
        let err = read_head_trace(TRACE, 3, 100).unwrap_err();
        assert!(matches!(err, SimError::Malformed { .. }));
    }

    #[test]
    fn test_read_rejects_garbage() {
        let err = read_head_trace("h\n0.1 x\n0.3 0.4\n", 1, 100).unwrap_err();
        assert!(err.to_string().contains("\"x\""));
    }

    #[test]
    fn test_interpolate_linear_and_extended() {
        let records = vec![MotionSample::new(0, 0.0, 0.0), MotionSample::new(100, 1.0, -1.0)];
        let out = interpolate(&records, 25, 200);

        // 0..100 interpolated, 100..200 held at the last sample
        assert_eq!(out.len(), 8);
        assert_eq!(out[1].timestamp, 25);
        assert!((out[1].yaw - 0.25).abs() < 1e-12);
        assert!((out[1].pitch + 0.25).abs() < 1e-12);
        assert_eq!(out[7].timestamp, 175);
        assert_eq!(out[7].yaw, 1.0);
    }

    #[test]
    fn test_interpolate_first_duplicate_wins() {
        let records = vec![
            MotionSample::new(0, 0.0, 0.0),
            MotionSample::new(0, 9.0, 9.0),
            MotionSample::new(50, 1.0, 0.0),
        ];
        let out = interpolate(&records, 50, 50);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].yaw, 0.0);
    }
}
