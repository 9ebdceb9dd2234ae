//! # Manager configuration.
//!
//! Provides [`ManagerConfig`], the settings shared by a manager and every
//! channel it creates.
//!
//! ## Sentinel values
//! - `min_refresh_interval = 0s` → no floor on polling intervals
//! - `bus_capacity = 0` → clamped to 1

use std::time::Duration;

use crate::policies::AdmissionPolicy;

/// Configuration for a [`Manager`](crate::Manager).
///
/// ## Field semantics
/// - `bus_capacity`: Event bus ring buffer size (min 1; clamped by Bus)
/// - `admission`: What to do with refreshes arriving while loading
/// - `min_refresh_interval`: Lower bound applied to every effective polling interval
///
/// ## Notes
/// All fields are public for flexibility. Prefer using helper accessors to avoid
/// sprinkling sentinel checks (`0`) across the codebase.
#[derive(Clone, Debug)]
pub struct ManagerConfig {
    /// Capacity of the event bus broadcast channel ring buffer.
    ///
    /// Slow observers that lag behind more than `bus_capacity` messages skip
    /// older items. Minimum value is 1 (enforced by Bus).
    pub bus_capacity: usize,

    /// Admission policy for refreshes that arrive while an execution is loading.
    pub admission: AdmissionPolicy,

    /// Floor for the effective polling interval of every channel.
    ///
    /// - `Duration::ZERO` = no floor (subscriber intervals used as given)
    /// - `> 0` = intervals shorter than this are raised to it
    pub min_refresh_interval: Duration,
}

impl ManagerConfig {
    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }

    /// Applies the configured floor to a polling interval.
    #[inline]
    pub fn clamp_interval(&self, interval: Duration) -> Duration {
        interval.max(self.min_refresh_interval)
    }
}

impl Default for ManagerConfig {
    /// Default configuration:
    ///
    /// - `bus_capacity = 1024`
    /// - `admission = AdmissionPolicy::Queue`
    /// - `min_refresh_interval = 0s` (no floor)
    fn default() -> Self {
        Self {
            bus_capacity: 1024,
            admission: AdmissionPolicy::default(),
            min_refresh_interval: Duration::ZERO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinels() {
        let cfg = ManagerConfig {
            bus_capacity: 0,
            ..ManagerConfig::default()
        };
        assert_eq!(cfg.bus_capacity_clamped(), 1);
        assert_eq!(cfg.clamp_interval(Duration::from_millis(3)), Duration::from_millis(3));

        let floored = ManagerConfig {
            min_refresh_interval: Duration::from_millis(50),
            ..ManagerConfig::default()
        };
        assert_eq!(floored.clamp_interval(Duration::from_millis(3)), Duration::from_millis(50));
        assert_eq!(floored.clamp_interval(Duration::from_secs(1)), Duration::from_secs(1));
    }
}
