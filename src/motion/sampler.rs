//! Rate-limited input sampling: decouples arbitrary-frequency joystick
//! events from the fixed-cadence sampler loop. The loop polls once per
//! period; between polls only the latest sample is kept.

/// One normalized joystick sample, each component in [-1, 1].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JoystickSample {
    pub x: f64,
    pub y: f64,
}

impl JoystickSample {
    pub fn in_range(&self) -> bool {
        (-1.0..=1.0).contains(&self.x) && (-1.0..=1.0).contains(&self.y)
    }
}

/// Holds the most recent joystick sample between sampler ticks.
///
/// `update` is O(1) and never blocks; `poll` is called once per fixed
/// period and redelivers the stored sample until a newer one arrives.
/// Redelivery of stale data is intentional: a held joystick keeps
/// driving continuous movement.
#[derive(Debug, Default)]
pub struct RateLimitedInputSampler {
    latest: Option<JoystickSample>,
    running: bool,
}

impl RateLimitedInputSampler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start delivering samples. Idempotent; restarting clears any
    /// paused state but keeps a previously stored sample.
    pub fn begin(&mut self) {
        self.running = true;
    }

    /// Store the most recent sample, overwriting any unconsumed one.
    pub fn update(&mut self, sample: JoystickSample) {
        self.latest = Some(sample);
    }

    /// Stop delivering and discard the stored sample.
    pub fn end(&mut self) {
        self.running = false;
        self.latest = None;
    }

    /// Called once per period by the sampler loop. Returns the latest
    /// stored sample, or `None` when stopped or when nothing has
    /// arrived since `begin`.
    pub fn poll(&self) -> Option<JoystickSample> {
        if self.running { self.latest } else { None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_sample_means_no_delivery() {
        let mut sampler = RateLimitedInputSampler::new();
        assert_eq!(sampler.poll(), None);
        sampler.begin();
        assert_eq!(sampler.poll(), None);
    }

    #[test]
    fn latest_sample_wins_within_one_period() {
        let mut sampler = RateLimitedInputSampler::new();
        sampler.begin();
        sampler.update(JoystickSample { x: 0.1, y: 0.0 });
        sampler.update(JoystickSample { x: 0.5, y: -0.5 });
        sampler.update(JoystickSample { x: 1.0, y: 0.25 });
        assert_eq!(sampler.poll(), Some(JoystickSample { x: 1.0, y: 0.25 }));
    }

    #[test]
    fn stale_sample_is_redelivered_until_stopped() {
        let mut sampler = RateLimitedInputSampler::new();
        sampler.begin();
        let sample = JoystickSample { x: -0.3, y: 0.7 };
        sampler.update(sample);
        assert_eq!(sampler.poll(), Some(sample));
        assert_eq!(sampler.poll(), Some(sample));
        sampler.end();
        assert_eq!(sampler.poll(), None);
    }

    #[test]
    fn restart_is_idempotent() {
        let mut sampler = RateLimitedInputSampler::new();
        sampler.begin();
        sampler.update(JoystickSample { x: 0.2, y: 0.2 });
        sampler.begin();
        assert!(sampler.poll().is_some());
        sampler.end();
        sampler.begin();
        assert_eq!(sampler.poll(), None, "end discards the stored sample");
    }

    #[test]
    fn range_check_flags_out_of_range_components() {
        assert!(JoystickSample { x: 1.0, y: -1.0 }.in_range());
        assert!(!JoystickSample { x: 1.5, y: 0.0 }.in_range());
        assert!(!JoystickSample { x: 0.0, y: -2.0 }.in_range());
    }
}
