use log::debug;
use std::time::{Duration, Instant};

static REPORT_INTERVAL: Duration = Duration::from_secs(1);

/// Tracks tick-to-tick durations and logs a frame rate summary once per
/// report interval.
#[derive(Debug)]
pub struct FpsEstimator {
    iteration_start: Instant,
    pub iteration_duration: Duration,
    window_start: Instant,
    window_frames: u32,
    window_worst: Duration,
}

impl FpsEstimator {
    pub fn new(fps: f64) -> FpsEstimator {
        let now = Instant::now();
        FpsEstimator {
            iteration_start: now,
            iteration_duration: Duration::from_secs_f64(1.0 / fps),
            window_start: now,
            window_frames: 0,
            window_worst: Duration::from_secs(0),
        }
    }

    pub fn reset(&mut self) {
        let now = Instant::now();
        self.iteration_start = now;
        self.window_start = now;
        self.window_frames = 0;
        self.window_worst = Duration::from_secs(0);
    }

    /// Returns the time since the previous tick.
    pub fn tick(&mut self) -> Duration {
        let now = Instant::now();
        let delta_t = now - self.iteration_start;
        self.iteration_start = now;
        self.record(now, delta_t);
        delta_t
    }

    fn record(&mut self, now: Instant, delta_t: Duration) {
        self.window_frames += 1;
        self.window_worst = self.window_worst.max(delta_t);
        let window = now - self.window_start;
        if window >= REPORT_INTERVAL {
            debug!(
                "{:.1} fps over {:?}, slowest frame {:?} (budget {:?})",
                frames_per_second(self.window_frames, window),
                window,
                self.window_worst,
                self.iteration_duration
            );
            self.window_start = now;
            self.window_frames = 0;
            self.window_worst = Duration::from_secs(0);
        }
    }
}

fn frames_per_second(frames: u32, window: Duration) -> f64 {
    if window.as_secs_f64() <= 0.0 {
        return 0.0;
    }
    frames as f64 / window.as_secs_f64()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate() {
        assert_eq!(frames_per_second(60, Duration::from_secs(1)), 60.0);
        assert_eq!(frames_per_second(30, Duration::from_millis(500)), 60.0);
        assert_eq!(frames_per_second(10, Duration::from_secs(0)), 0.0);
    }

    #[test]
    fn window_resets_after_interval() {
        let mut fps = FpsEstimator::new(60.0);
        let start = fps.window_start;
        fps.record(start + Duration::from_millis(10), Duration::from_millis(10));
        fps.record(start + Duration::from_millis(30), Duration::from_millis(20));
        assert_eq!(fps.window_frames, 2);
        assert_eq!(fps.window_worst, Duration::from_millis(20));

        fps.record(start + Duration::from_millis(1010), Duration::from_millis(980));
        assert_eq!(fps.window_frames, 0);
        assert_eq!(fps.window_worst, Duration::from_secs(0));
        assert_eq!(fps.window_start, start + Duration::from_millis(1010));
    }
}
