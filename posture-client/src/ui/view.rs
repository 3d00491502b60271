use crate::models::{PostureAssessment, PostureResult};
use crate::posture::Observation;

/// Colour cue for the status line and the frame border
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tone {
    #[default]
    Neutral,
    Good,
    Bad,
}

/// Text shown next to the camera view
///
/// Measurement lines keep their last value when a result omits them.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StatusView {
    pub status: String,
    pub tone: Tone,
    pub neck: Option<String>,
    pub back: Option<String>,
    pub shoulder: Option<String>,
    pub knee: Option<String>,
    /// Present only while posture is bad
    pub timer: Option<String>,
}

impl StatusView {
    pub fn waiting() -> Self {
        Self {
            status: "Waiting for first frame...".to_string(),
            ..Self::default()
        }
    }

    /// Update from one result and the tracker's verdict on it
    pub fn apply(&mut self, result: &PostureResult, observation: &Observation) {
        let assessment = match result {
            PostureResult::Failed { error } => {
                self.status = format!("Status: {}", error);
                self.tone = Tone::Neutral;
                return;
            }
            PostureResult::Assessed(assessment) => assessment,
        };

        self.status = assessment.status.clone();
        self.tone = if assessment.is_good {
            Tone::Good
        } else {
            Tone::Bad
        };

        self.apply_measurements(assessment);

        self.timer = match observation {
            Observation::Bad { duration_secs, .. } => {
                Some(format!("Bad Posture Time: {}s", duration_secs))
            }
            _ => None,
        };
    }

    fn apply_measurements(&mut self, assessment: &PostureAssessment) {
        if let Some(angles) = &assessment.angles {
            let parts: Vec<String> = [("Right", angles.right), ("Left", angles.left)]
                .into_iter()
                .filter_map(|(side, angle)| angle.map(|a| format!("{}: {}", side, degrees(a))))
                .collect();
            self.neck = Some(format!("Neck Angles: {}", parts.join(" | ")));
        }

        if let Some(metrics) = &assessment.metrics {
            if let Some(back) = metrics.back_angle {
                self.back = Some(format!("Back Angle: {}", degrees(back)));
            }
            if let Some(tilt) = metrics.shoulder_tilt {
                self.shoulder = Some(format!("Shoulder Tilt: {}", degrees(tilt)));
            }
            if let Some(knee) = metrics.right_knee_angle {
                self.knee = Some(format!("Right Knee Angle: {}", degrees(knee)));
            }
        }
    }

    /// Non-empty lines, top to bottom
    pub fn lines(&self) -> Vec<&str> {
        std::iter::once(self.status.as_str())
            .chain(self.timer.as_deref())
            .chain(self.neck.as_deref())
            .chain(self.back.as_deref())
            .chain(self.shoulder.as_deref())
            .chain(self.knee.as_deref())
            .filter(|line| !line.is_empty())
            .collect()
    }
}

fn degrees(value: f64) -> String {
    format!("{:.2}°", value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NeckAngles, PostureMetrics};

    fn assessed(is_good: bool) -> PostureAssessment {
        PostureAssessment {
            status: if is_good { "Good posture" } else { "Bad posture" }.to_string(),
            is_good,
            ..PostureAssessment::default()
        }
    }

    #[test]
    fn test_bad_result_shows_timer_and_tone() {
        let mut view = StatusView::waiting();
        let result = PostureResult::Assessed(assessed(false));

        view.apply(
            &result,
            &Observation::Bad {
                duration_secs: 12,
                alert: None,
            },
        );

        assert_eq!(view.status, "Bad posture");
        assert_eq!(view.tone, Tone::Bad);
        assert_eq!(view.timer.as_deref(), Some("Bad Posture Time: 12s"));

        view.apply(&PostureResult::Assessed(assessed(true)), &Observation::Good);
        assert_eq!(view.tone, Tone::Good);
        assert_eq!(view.timer, None);
    }

    #[test]
    fn test_error_result_keeps_measurements() {
        let mut view = StatusView::waiting();
        let mut assessment = assessed(false);
        assessment.metrics = Some(PostureMetrics {
            back_angle: Some(12.5),
            ..PostureMetrics::default()
        });
        view.apply(
            &PostureResult::Assessed(assessment),
            &Observation::Bad {
                duration_secs: 3,
                alert: None,
            },
        );

        let failed = PostureResult::Failed {
            error: "No person detected".to_string(),
        };
        view.apply(&failed, &Observation::Unassessed);

        assert_eq!(view.status, "Status: No person detected");
        assert_eq!(view.tone, Tone::Neutral);
        assert_eq!(view.back.as_deref(), Some("Back Angle: 12.50°"));
        assert_eq!(view.timer.as_deref(), Some("Bad Posture Time: 3s"));
    }

    #[test]
    fn test_neck_angles_formatting() {
        let mut view = StatusView::waiting();
        let mut assessment = assessed(true);
        assessment.angles = Some(NeckAngles {
            right: Some(-12.5),
            left: Some(8.0),
        });

        view.apply(&PostureResult::Assessed(assessment.clone()), &Observation::Good);
        assert_eq!(
            view.neck.as_deref(),
            Some("Neck Angles: Right: -12.50° | Left: 8.00°")
        );

        assessment.angles = Some(NeckAngles {
            right: None,
            left: Some(3.0),
        });
        view.apply(&PostureResult::Assessed(assessment), &Observation::Good);
        assert_eq!(view.neck.as_deref(), Some("Neck Angles: Left: 3.00°"));
    }

    #[test]
    fn test_missing_metrics_keep_previous_values() {
        let mut view = StatusView::waiting();
        let mut assessment = assessed(true);
        assessment.metrics = Some(PostureMetrics {
            back_angle: Some(5.0),
            shoulder_tilt: Some(1.0),
            right_knee_angle: Some(90.0),
        });
        view.apply(&PostureResult::Assessed(assessment.clone()), &Observation::Good);

        assessment.metrics = Some(PostureMetrics {
            shoulder_tilt: Some(2.0),
            ..PostureMetrics::default()
        });
        view.apply(&PostureResult::Assessed(assessment), &Observation::Good);

        assert_eq!(view.back.as_deref(), Some("Back Angle: 5.00°"));
        assert_eq!(view.shoulder.as_deref(), Some("Shoulder Tilt: 2.00°"));
        assert_eq!(view.knee.as_deref(), Some("Right Knee Angle: 90.00°"));
        assert_eq!(view.lines().len(), 4);
    }
}
