//! Input level metering.
//!
//! Platforms report recording levels either in decibels (-160..0) or as a
//! linear amplitude (0..1). When no level is reported at all, a simulated
//! heartbeat keeps the UI moving.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::{CancellationToken, DropGuard};

/// Receives levels in `0.0..=1.0`.
pub type LevelSink = Arc<dyn Fn(f64) + Send + Sync>;

const DB_FLOOR: f64 = -160.0;
const HEARTBEAT_PERIOD_MS: f64 = 300.0;
const HEARTBEAT_PEAK: f64 = 0.6;

/// Map a raw meter reading onto `0.0..=1.0`.
///
/// Non-positive readings are decibels, positive readings are amplitudes.
/// Returns `None` for NaN.
pub fn normalize_meter(raw: f64) -> Option<f64> {
    if raw.is_nan() {
        return None;
    }
    let level = if raw <= 0.0 { 1.0 - raw / DB_FLOOR } else { raw };
    Some(level.clamp(0.0, 1.0))
}

/// Simulated level at `elapsed` since metering started: a slow sine between
/// 0 and 0.6.
pub fn heartbeat_level(elapsed: Duration) -> f64 {
    let t = elapsed.as_secs_f64() * 1000.0 / HEARTBEAT_PERIOD_MS;
    (t.sin() + 1.0) / 2.0 * HEARTBEAT_PEAK
}

/// Background task feeding heartbeat levels to a sink.
///
/// Dropping the meter stops the task.
pub struct LevelMeter {
    guard: DropGuard,
    handle: JoinHandle<()>,
}

impl LevelMeter {
    pub fn spawn(interval: Duration, sink: LevelSink) -> Self {
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let handle = tokio::spawn(async move {
            let started = Instant::now();
            let mut tick = tokio::time::interval(interval);
            loop {
                tokio::select! {
                    () = token.cancelled() => break,
                    _ = tick.tick() => sink(heartbeat_level(started.elapsed())),
                }
            }
        });
        Self {
            guard: cancel.drop_guard(),
            handle,
        }
    }

    /// Stop the task and wait for it to finish.
    pub async fn stop(self) {
        drop(self.guard);
        let _ = self.handle.await;
    }
}

impl std::fmt::Debug for LevelMeter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LevelMeter").finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn decibels_map_to_unit_range() {
        assert!(close(normalize_meter(0.0).unwrap(), 1.0));
        assert!(close(normalize_meter(-80.0).unwrap(), 0.5));
        assert!(close(normalize_meter(-160.0).unwrap(), 0.0));
        assert!(close(normalize_meter(-500.0).unwrap(), 0.0));
    }

    #[test]
    fn amplitude_is_clamped() {
        assert!(close(normalize_meter(0.25).unwrap(), 0.25));
        assert!(close(normalize_meter(3.0).unwrap(), 1.0));
    }

    #[test]
    fn nan_is_ignored() {
        assert_eq!(normalize_meter(f64::NAN), None);
    }

    #[test]
    fn heartbeat_stays_in_range() {
        for ms in (0..5_000).step_by(37) {
            let level = heartbeat_level(Duration::from_millis(ms));
            assert!((0.0..=HEARTBEAT_PEAK).contains(&level), "{level} at {ms}ms");
        }
        assert!(close(heartbeat_level(Duration::ZERO), 0.3));
    }

    #[tokio::test(start_paused = true)]
    async fn meter_ticks_until_stopped() {
        let levels = Arc::new(Mutex::new(Vec::new()));
        let sink_levels = Arc::clone(&levels);
        let meter = LevelMeter::spawn(
            Duration::from_millis(120),
            Arc::new(move |l: f64| sink_levels.lock().unwrap().push(l)),
        );

        tokio::time::sleep(Duration::from_millis(500)).await;
        meter.stop().await;
        let seen = levels.lock().unwrap().len();
        assert!(seen >= 4, "saw {seen} levels");

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(levels.lock().unwrap().len(), seen);
    }
}
