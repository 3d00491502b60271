use chrono::{DateTime, Utc};
use crossterm::event::KeyCode;

use super::view::{StatusView, Tone};
use crate::api::InferenceClient;
use crate::config::{resolve, validate, ConfigStore, PostureConfig, ValidationError};
use crate::models::ServiceDefaults;
use crate::monitor::{CycleReport, MonitorEvent};
use crate::posture::{AlertSink, Observation, PostureTracker};
use crate::render::{render_landmarks, Scene};

/// Step used by the interval keys, in milliseconds
const INTERVAL_STEP_MS: u64 = 1000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CameraState {
    Starting,
    Ready { width: u32, height: u32 },
    Error(String),
}

/// Application state shared by the dashboard and the headless reporter
pub struct App {
    /// Should the application quit?
    pub should_quit: bool,
    /// Show help overlay
    pub show_help: bool,
    pub view: StatusView,
    /// Skeleton of the latest frame that carried landmarks
    pub scene: Scene,
    pub camera: CameraState,
    /// One-line feedback for the last user action
    pub notice: Option<String>,
    pub frames_assessed: u64,
    pub alerts_played: u64,
    config: PostureConfig,
    store: ConfigStore,
    reset_requested: bool,
    tracker: PostureTracker,
    sink: Box<dyn AlertSink>,
}

impl App {
    /// Build the app with the stored thresholds, or the service defaults
    pub fn new(
        store: ConfigStore,
        defaults: ServiceDefaults,
        alerts_enabled: bool,
        sink: Box<dyn AlertSink>,
    ) -> Self {
        let config = resolve(&defaults, store.load());

        Self {
            should_quit: false,
            show_help: false,
            view: StatusView::waiting(),
            scene: Scene::new(),
            camera: CameraState::Starting,
            notice: None,
            frames_assessed: 0,
            alerts_played: 0,
            config,
            store,
            reset_requested: false,
            tracker: PostureTracker::new(alerts_enabled),
            sink,
        }
    }

    pub fn config(&self) -> &PostureConfig {
        &self.config
    }

    pub fn tracker(&self) -> &PostureTracker {
        &self.tracker
    }

    pub fn handle_event(&mut self, event: MonitorEvent, now: DateTime<Utc>) {
        match event {
            MonitorEvent::CameraReady { width, height } => {
                self.camera = CameraState::Ready { width, height };
            }
            MonitorEvent::CameraError(message) => {
                self.camera = CameraState::Error(message);
            }
            MonitorEvent::Result(report) => {
                self.apply_result(&report, now);
            }
        }
    }

    /// Feed one accepted result through the tracker, the text view and the renderer
    pub fn apply_result(&mut self, report: &CycleReport, now: DateTime<Utc>) -> Observation {
        let observation = self.tracker.observe(&report.result, &self.config, now);
        self.frames_assessed += 1;

        self.view.apply(&report.result, &observation);

        if let Some(landmarks) = report.result.landmarks() {
            render_landmarks(
                &mut self.scene,
                landmarks,
                report.width as f64,
                report.height as f64,
            );
        }

        if let Some(alert) = observation.alert() {
            if alert.audible {
                self.alerts_played += 1;
                if let Err(e) = self.sink.play() {
                    tracing::warn!("Alert play failed: {:#}", e);
                }
            }
        }

        observation
    }

    pub fn toggle_alerts(&mut self) -> bool {
        let enabled = self.tracker.toggle_alerts();
        self.notice = Some(self.alerts_label().to_string());
        enabled
    }

    pub fn alerts_label(&self) -> &'static str {
        if self.tracker.session().alerts_enabled() {
            "Alerts Enabled"
        } else {
            "Alerts Disabled"
        }
    }

    pub fn camera_label(&self) -> &'static str {
        match self.camera {
            CameraState::Starting => "Starting...",
            CameraState::Ready { .. } => "Detection Running",
            CameraState::Error(_) => "Camera access error",
        }
    }

    /// Validate and apply a full candidate; the previous config survives a rejection
    pub fn save_config(&mut self, candidate: PostureConfig) -> Result<(), ValidationError> {
        let config = match validate(candidate) {
            Ok(config) => config,
            Err(e) => {
                self.notice = Some(e.user_message());
                return Err(e);
            }
        };

        self.config = config;

        match self.store.save(&self.config) {
            Ok(()) => {
                tracing::info!("Configuration saved");
                self.notice = Some("Configuration saved".to_string());
            }
            Err(e) => {
                tracing::warn!("Failed to save config: {}", e);
                self.notice = Some("Configuration applied but could not be saved".to_string());
            }
        }

        Ok(())
    }

    /// Forget the stored thresholds and return to `defaults`
    pub fn reset_config(&mut self, defaults: &ServiceDefaults) {
        self.config = self.store.reset(defaults);
        self.notice = Some("Configuration reset to defaults".to_string());
    }

    /// Fetch fresh service defaults and reset to them.
    ///
    /// If the service cannot be reached the current thresholds stay in place.
    pub async fn reset_from_service(&mut self, client: &InferenceClient) {
        match client.config_defaults().await {
            Ok(defaults) => self.reset_config(&defaults),
            Err(e) => {
                tracing::warn!("Failed to reset config: {}", e);
                self.notice = Some(format!("Reset failed: {}", e));
            }
        }
    }

    /// True once per press of the reset key
    pub fn take_reset_request(&mut self) -> bool {
        std::mem::take(&mut self.reset_requested)
    }

    fn adjust_interval(&mut self, increase: bool) {
        let current = self.config.alert_interval_ms;
        let alert_interval_ms = if increase {
            current.saturating_add(INTERVAL_STEP_MS)
        } else {
            current.saturating_sub(INTERVAL_STEP_MS).max(INTERVAL_STEP_MS)
        };

        // Rejection already sets the notice
        let _ = self.save_config(PostureConfig {
            alert_interval_ms,
            ..self.config
        });
    }

    /// Handle keyboard input
    pub fn handle_key(&mut self, key: KeyCode) {
        // Help overlay takes precedence
        if self.show_help {
            if matches!(key, KeyCode::Char('?') | KeyCode::Esc) {
                self.show_help = false;
            }
            return;
        }

        match key {
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => {
                self.should_quit = true;
            }

            KeyCode::Char('?') => {
                self.show_help = true;
            }

            KeyCode::Char('a') | KeyCode::Char('A') => {
                self.toggle_alerts();
            }

            KeyCode::Char('r') | KeyCode::Char('R') => {
                self.reset_requested = true;
                self.notice = Some("Fetching service defaults...".to_string());
            }

            KeyCode::Char('+') | KeyCode::Char('=') => {
                self.adjust_interval(true);
            }

            KeyCode::Char('-') => {
                self.adjust_interval(false);
            }

            _ => {}
        }
    }

    /// Single-line summary for headless mode
    pub fn status_line(&self) -> String {
        let marker = match self.view.tone {
            Tone::Good => "OK ",
            Tone::Bad => "BAD",
            Tone::Neutral => "-- ",
        };

        format!("[{}] {}", marker, self.view.lines().join(" | "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Landmark, PostureAssessment, PostureResult};
    use crate::storage::MemorySlotStore;
    use chrono::{Duration, TimeZone};
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct CountingSink(Arc<Mutex<u32>>);

    impl AlertSink for CountingSink {
        fn play(&mut self) -> anyhow::Result<()> {
            *self.0.lock().unwrap() += 1;
            Ok(())
        }
    }

    fn t(secs: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap() + Duration::seconds(secs)
    }

    fn app_with(sink: CountingSink) -> (App, ConfigStore) {
        let store = ConfigStore::new(Arc::new(MemorySlotStore::new()), "postureConfig");
        let app = App::new(
            store.clone(),
            ServiceDefaults::fallback(),
            true,
            Box::new(sink),
        );
        (app, store)
    }

    fn report(seq: u64, is_good: bool, landmarks: Option<Vec<Landmark>>) -> CycleReport {
        CycleReport {
            seq,
            width: 640,
            height: 480,
            result: PostureResult::Assessed(PostureAssessment {
                status: "Checking".to_string(),
                is_good,
                landmarks,
                ..PostureAssessment::default()
            }),
        }
    }

    #[test]
    fn test_starts_from_defaults_when_nothing_stored() {
        let (app, _) = app_with(CountingSink::default());

        assert_eq!(app.config().right_min_angle, -60.0);
        assert_eq!(app.config().alert_interval_ms, 10_000);
        assert_eq!(app.camera_label(), "Starting...");
    }

    #[test]
    fn test_audible_alert_plays_sink() {
        let sink = CountingSink::default();
        let (mut app, _) = app_with(sink.clone());

        for secs in 0..=10 {
            app.apply_result(&report(secs as u64 + 1, false, None), t(secs));
        }

        assert_eq!(*sink.0.lock().unwrap(), 1);
        assert_eq!(app.alerts_played, 1);
        assert_eq!(app.view.timer.as_deref(), Some("Bad Posture Time: 10s"));
    }

    #[test]
    fn test_disabled_alerts_stay_silent() {
        let sink = CountingSink::default();
        let (mut app, _) = app_with(sink.clone());

        app.handle_key(KeyCode::Char('a'));
        assert_eq!(app.alerts_label(), "Alerts Disabled");

        for secs in 0..=10 {
            app.apply_result(&report(secs as u64 + 1, false, None), t(secs));
        }

        assert_eq!(*sink.0.lock().unwrap(), 0);
        assert_eq!(app.tracker().session().last_alert(), Some(t(10)));
    }

    #[test]
    fn test_landmarks_render_into_scene_at_frame_size() {
        let (mut app, _) = app_with(CountingSink::default());
        let landmarks = vec![Landmark::new(0.5, 0.5, 0.9); 33];

        app.apply_result(&report(1, true, Some(landmarks)), t(0));
        assert_eq!((app.scene.width, app.scene.height), (640.0, 480.0));
        assert_eq!(app.scene.markers().count(), 33);

        // A result without landmarks leaves the previous skeleton in place
        app.apply_result(&report(2, true, None), t(1));
        assert_eq!(app.scene.markers().count(), 33);
    }

    #[test]
    fn test_invalid_config_is_rejected_and_kept() {
        let (mut app, store) = app_with(CountingSink::default());
        let before = *app.config();

        let result = app.save_config(PostureConfig {
            right_min_angle: 10.0,
            ..before
        });

        assert!(result.is_err());
        assert_eq!(*app.config(), before);
        assert!(app
            .notice
            .as_deref()
            .unwrap()
            .starts_with("Invalid angle configuration"));
        assert_eq!(store.load(), None);
    }

    #[test]
    fn test_interval_keys_persist_config() {
        let (mut app, store) = app_with(CountingSink::default());

        app.handle_key(KeyCode::Char('+'));
        assert_eq!(app.config().alert_interval_ms, 11_000);
        assert_eq!(store.load().map(|c| c.alert_interval_ms), Some(11_000));

        app.handle_key(KeyCode::Char('r'));
        assert!(app.take_reset_request());
        assert!(!app.take_reset_request());

        app.reset_config(&ServiceDefaults::fallback());
        assert_eq!(app.config().alert_interval_ms, 10_000);
        assert_eq!(store.load(), None);
    }

    #[test]
    fn test_camera_events() {
        let (mut app, _) = app_with(CountingSink::default());

        app.handle_event(MonitorEvent::CameraError("no device".to_string()), t(0));
        assert_eq!(app.camera_label(), "Camera access error");

        app.handle_event(MonitorEvent::CameraReady { width: 640, height: 480 }, t(1));
        assert_eq!(app.camera_label(), "Detection Running");
    }

    #[test]
    fn test_help_overlay_swallows_keys() {
        let (mut app, _) = app_with(CountingSink::default());

        app.handle_key(KeyCode::Char('?'));
        app.handle_key(KeyCode::Char('q'));
        assert!(!app.should_quit);

        app.handle_key(KeyCode::Esc);
        app.handle_key(KeyCode::Char('q'));
        assert!(app.should_quit);
    }

    #[test]
    fn test_status_line() {
        let (mut app, _) = app_with(CountingSink::default());
        app.apply_result(&report(1, false, None), t(0));
        app.apply_result(&report(2, false, None), t(3));

        assert_eq!(app.status_line(), "[BAD] Checking | Bad Posture Time: 3s");
    }
}
