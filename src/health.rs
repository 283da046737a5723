/// Sensor health tracking with offline hysteresis
use crate::models::SensorStatus;

/// Consecutive failed cycles before the sensor is declared offline.
pub const MAX_FAILED_UPDATES: u32 = 3;

/// A state change reported by the monitor; the caller performs the side
/// effects (logging, invalidating the published data file).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    CameOnline,
    WentOffline,
}

/// Tracks consecutive sampling failures and the resulting online state.
///
/// Starts optimistic: the sensor is assumed online until it has failed
/// `MAX_FAILED_UPDATES` times in a row. Failures below the threshold cause
/// no transition, so isolated bus glitches never flap the status.
#[derive(Debug)]
pub struct HealthMonitor {
    consecutive_failures: u32,
    online: bool,
}

impl HealthMonitor {
    pub fn new() -> Self {
        HealthMonitor {
            consecutive_failures: 0,
            online: true,
        }
    }

    pub fn is_online(&self) -> bool {
        self.online
    }

    pub fn status(&self) -> SensorStatus {
        if self.online {
            SensorStatus::Online
        } else {
            SensorStatus::Offline
        }
    }

    /// Record the outcome of one sampling cycle and report a transition,
    /// if any occurred.
    pub fn record(&mut self, success: bool) -> Option<Transition> {
        if success {
            self.consecutive_failures = 0;
            if !self.online {
                self.online = true;
                return Some(Transition::CameOnline);
            }
        } else {
            self.consecutive_failures += 1;
            if self.consecutive_failures == MAX_FAILED_UPDATES && self.online {
                self.online = false;
                return Some(Transition::WentOffline);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_online() {
        let monitor = HealthMonitor::new();
        assert!(monitor.is_online());
        assert_eq!(monitor.status(), SensorStatus::Online);
    }

    #[test]
    fn goes_offline_only_at_threshold() {
        let mut monitor = HealthMonitor::new();
        assert_eq!(monitor.record(false), None);
        assert_eq!(monitor.record(false), None);
        assert!(monitor.is_online());
        assert_eq!(monitor.record(false), Some(Transition::WentOffline));
        assert!(!monitor.is_online());
    }

    #[test]
    fn failures_past_threshold_repeat_no_side_effect() {
        let mut monitor = HealthMonitor::new();
        for _ in 0..3 {
            monitor.record(false);
        }
        assert_eq!(monitor.record(false), None);
        assert_eq!(monitor.record(false), None);
        assert!(!monitor.is_online());
    }

    #[test]
    fn success_resets_the_streak() {
        let mut monitor = HealthMonitor::new();
        monitor.record(false);
        monitor.record(false);
        assert_eq!(monitor.record(true), None); // still online, no transition
        // The counter restarted, so it takes three more failures to go down.
        assert_eq!(monitor.record(false), None);
        assert_eq!(monitor.record(false), None);
        assert_eq!(monitor.record(false), Some(Transition::WentOffline));
    }

    #[test]
    fn one_success_recovers_from_offline() {
        let mut monitor = HealthMonitor::new();
        for _ in 0..3 {
            monitor.record(false);
        }
        assert_eq!(monitor.record(true), Some(Transition::CameOnline));
        assert!(monitor.is_online());
    }
}
