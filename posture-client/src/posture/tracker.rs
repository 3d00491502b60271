use chrono::{DateTime, Utc};

use crate::config::PostureConfig;
use crate::models::PostureResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostureState {
    Good,
    Bad,
}

/// Timeline of the current bad-posture episode and alert bookkeeping
#[derive(Debug, Clone, PartialEq)]
pub struct PostureSession {
    bad_posture_start: Option<DateTime<Utc>>,
    last_alert: Option<DateTime<Utc>>,
    alerts_enabled: bool,
}

impl Default for PostureSession {
    fn default() -> Self {
        Self {
            bad_posture_start: None,
            last_alert: None,
            alerts_enabled: true,
        }
    }
}

impl PostureSession {
    pub fn bad_posture_start(&self) -> Option<DateTime<Utc>> {
        self.bad_posture_start
    }

    pub fn last_alert(&self) -> Option<DateTime<Utc>> {
        self.last_alert
    }

    pub fn alerts_enabled(&self) -> bool {
        self.alerts_enabled
    }

    pub fn state(&self) -> PostureState {
        if self.bad_posture_start.is_some() {
            PostureState::Bad
        } else {
            PostureState::Good
        }
    }
}

/// An alert decision. Muted alerts still count for the cooldown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Alert {
    pub at: DateTime<Utc>,
    pub audible: bool,
}

/// Outcome of feeding one inference result to the tracker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observation {
    Good,
    Bad {
        /// Whole seconds since the episode started
        duration_secs: u64,
        alert: Option<Alert>,
    },
    /// Service-reported error; the timeline did not move
    Unassessed,
}

impl Observation {
    pub fn alert(&self) -> Option<Alert> {
        match self {
            Observation::Bad { alert, .. } => *alert,
            _ => None,
        }
    }
}

/// Two-state machine over posture classifications
///
/// Recovery clears the episode start but keeps the last alert time, so the
/// cooldown always spans episodes.
#[derive(Debug, Clone, Default)]
pub struct PostureTracker {
    session: PostureSession,
}

impl PostureTracker {
    pub fn new(alerts_enabled: bool) -> Self {
        Self {
            session: PostureSession {
                alerts_enabled,
                ..PostureSession::default()
            },
        }
    }

    pub fn session(&self) -> &PostureSession {
        &self.session
    }

    /// Flip the alert toggle and return the new value
    pub fn toggle_alerts(&mut self) -> bool {
        self.session.alerts_enabled = !self.session.alerts_enabled;
        tracing::info!(
            "Alerts {}",
            if self.session.alerts_enabled {
                "enabled"
            } else {
                "disabled"
            }
        );
        self.session.alerts_enabled
    }

    /// Whole seconds spent in the current episode, `None` when posture is good
    #[cfg(test)]
    fn duration_secs(&self, now: DateTime<Utc>) -> Option<u64> {
        self.session.bad_posture_start.map(|start| {
            let elapsed_ms = (now - start).num_milliseconds().max(0);
            (elapsed_ms / 1000) as u64
        })
    }

    /// Feed one inference result
    pub fn observe(
        &mut self,
        result: &PostureResult,
        config: &PostureConfig,
        now: DateTime<Utc>,
    ) -> Observation {
        match result.is_good() {
            Some(is_good) => self.observe_posture(is_good, config.alert_interval_ms, now),
            None => Observation::Unassessed,
        }
    }

    /// Advance the timeline with one classification
    pub fn observe_posture(
        &mut self,
        is_good: bool,
        alert_interval_ms: u64,
        now: DateTime<Utc>,
    ) -> Observation {
        if is_good {
            if self.session.bad_posture_start.take().is_some() {
                tracing::debug!("Posture recovered");
            }
            return Observation::Good;
        }

        let start = *self.session.bad_posture_start.get_or_insert_with(|| {
            tracing::debug!("Bad posture episode started");
            now
        });

        let elapsed_ms = (now - start).num_milliseconds().max(0);
        let duration_secs = (elapsed_ms / 1000) as u64;
        let threshold_secs = alert_interval_ms as f64 / 1000.0;

        let cooled_down = match self.session.last_alert {
            None => true,
            Some(last) => (now - last).num_milliseconds() >= alert_interval_ms as i64,
        };

        let alert = if duration_secs as f64 >= threshold_secs && cooled_down {
            self.session.last_alert = Some(now);
            tracing::info!("Bad posture held for {}s, alerting", duration_secs);
            Some(Alert {
                at: now,
                audible: self.session.alerts_enabled,
            })
        } else {
            None
        };

        Observation::Bad {
            duration_secs,
            alert,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t(secs: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap() + Duration::seconds(secs)
    }

    fn alert_times(tracker: &mut PostureTracker, samples: &[(i64, bool)], interval_ms: u64) -> Vec<i64> {
        samples
            .iter()
            .filter_map(|&(secs, is_good)| {
                tracker
                    .observe_posture(is_good, interval_ms, t(secs))
                    .alert()
                    .map(|_| secs)
            })
            .collect()
    }

    #[test]
    fn test_duration_counts_whole_seconds() {
        let mut tracker = PostureTracker::default();

        for k in 0..=7 {
            let observation = tracker.observe_posture(false, 10_000, t(k));
            assert!(matches!(
                observation,
                Observation::Bad { duration_secs, .. } if duration_secs == k as u64
            ));
        }

        let observation =
            tracker.observe_posture(false, 10_000, t(7) + Duration::milliseconds(900));
        assert!(matches!(observation, Observation::Bad { duration_secs: 7, .. }));
    }

    #[test]
    fn test_good_posture_resets_duration() {
        let mut tracker = PostureTracker::default();

        tracker.observe_posture(false, 10_000, t(0));
        tracker.observe_posture(false, 10_000, t(4));
        assert_eq!(tracker.duration_secs(t(4)), Some(4));

        assert_eq!(tracker.observe_posture(true, 10_000, t(5)), Observation::Good);
        assert_eq!(tracker.duration_secs(t(5)), None);
        assert_eq!(tracker.session().state(), PostureState::Good);

        let observation = tracker.observe_posture(false, 10_000, t(6));
        assert!(matches!(observation, Observation::Bad { duration_secs: 0, .. }));
    }

    #[test]
    fn test_cooldown_alerts_once_per_interval() {
        let mut tracker = PostureTracker::default();
        let samples: Vec<_> = (0..=12).map(|s| (s, false)).collect();

        assert_eq!(alert_times(&mut tracker, &samples, 5000), vec![5, 10]);
    }

    #[test]
    fn test_fractional_interval_threshold() {
        let mut tracker = PostureTracker::default();
        let samples: Vec<_> = (0..=6).map(|s| (s, false)).collect();

        // 2.5s threshold is first met by a whole-second duration of 3
        assert_eq!(alert_times(&mut tracker, &samples, 2500), vec![3, 6]);
    }

    #[test]
    fn test_service_error_does_not_move_timeline() {
        let mut tracker = PostureTracker::default();
        let config = PostureConfig::from_defaults(&crate::models::ServiceDefaults::fallback());
        let failed = PostureResult::Failed {
            error: "No person detected".to_string(),
        };

        assert_eq!(tracker.observe(&failed, &config, t(0)), Observation::Unassessed);
        assert_eq!(tracker.session().bad_posture_start(), None);

        tracker.observe_posture(false, config.alert_interval_ms, t(1));
        assert_eq!(tracker.observe(&failed, &config, t(30)), Observation::Unassessed);
        assert_eq!(tracker.session().bad_posture_start(), Some(t(1)));
        assert_eq!(tracker.session().last_alert(), None);
    }

    #[test]
    fn test_recovery_keeps_last_alert() {
        let mut tracker = PostureTracker::default();
        let samples = [
            (0, false),
            (5, false), // alert
            (6, true),
            (7, false),
            (9, false),
            (12, false), // new episode reaches 5s
        ];

        assert_eq!(alert_times(&mut tracker, &samples, 5000), vec![5, 12]);

        tracker.observe_posture(true, 5000, t(13));
        assert_eq!(tracker.session().bad_posture_start(), None);
        assert_eq!(tracker.session().last_alert(), Some(t(12)));
    }

    #[test]
    fn test_muted_alerts_keep_cooldown_bookkeeping() {
        let mut tracker = PostureTracker::new(false);

        tracker.observe_posture(false, 5000, t(0));
        let muted = tracker.observe_posture(false, 5000, t(5)).alert();
        assert_eq!(muted, Some(Alert { at: t(5), audible: false }));
        assert_eq!(tracker.session().last_alert(), Some(t(5)));

        // Re-enabling mid-episode follows the uninterrupted timeline
        assert!(tracker.toggle_alerts());
        assert_eq!(tracker.observe_posture(false, 5000, t(7)).alert(), None);
        let audible = tracker.observe_posture(false, 5000, t(10)).alert();
        assert_eq!(audible, Some(Alert { at: t(10), audible: true }));
    }

    #[test]
    fn test_toggle_alerts() {
        let mut tracker = PostureTracker::default();
        assert!(tracker.session().alerts_enabled());

        assert!(!tracker.toggle_alerts());
        assert!(tracker.toggle_alerts());
        assert!(tracker.session().alerts_enabled());
    }
}
