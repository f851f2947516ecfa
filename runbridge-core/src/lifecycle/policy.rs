//! Poll budget

use std::time::Duration;

use super::error::InvalidPollPolicy;

/// How many times to poll a run and how long to wait between polls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    max_attempts: u32,
    interval: Duration,
}

impl PollPolicy {
    /// Creates a policy; `max_attempts` must be at least 1
    pub fn new(max_attempts: u32, interval: Duration) -> Result<Self, InvalidPollPolicy> {
        if max_attempts == 0 {
            return Err(InvalidPollPolicy::ZeroAttempts);
        }
        Ok(Self {
            max_attempts,
            interval,
        })
    }

    /// Creates a policy from a fractional number of seconds
    pub fn from_secs_f64(max_attempts: u32, interval_secs: f64) -> Result<Self, InvalidPollPolicy> {
        let interval = Duration::try_from_secs_f64(interval_secs)
            .map_err(|_| InvalidPollPolicy::Interval(interval_secs))?;
        Self::new(max_attempts, interval)
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_zero_attempts() {
        assert_eq!(
            PollPolicy::new(0, Duration::from_secs(1)),
            Err(InvalidPollPolicy::ZeroAttempts)
        );
    }

    #[test]
    fn test_rejects_negative_or_nan_interval() {
        assert!(PollPolicy::from_secs_f64(3, -0.5).is_err());
        assert!(PollPolicy::from_secs_f64(3, f64::NAN).is_err());
        assert!(PollPolicy::from_secs_f64(3, f64::INFINITY).is_err());
    }

    #[test]
    fn test_zero_interval_is_allowed() {
        let policy = PollPolicy::from_secs_f64(2, 0.0).unwrap();
        assert_eq!(policy.interval(), Duration::ZERO);
        assert_eq!(policy.max_attempts(), 2);
    }

    #[test]
    fn test_rejects_interval_too_large_for_duration() {
        assert_eq!(
            PollPolicy::from_secs_f64(3, 1e30),
            Err(InvalidPollPolicy::Interval(1e30))
        );
    }
}
