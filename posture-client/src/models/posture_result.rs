use serde::{de, Deserialize, Deserializer, Serialize};

use super::Landmark;

/// Response of the inference service for one submitted frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PostureResult {
    /// The service could not assess the frame (e.g. no person in view)
    ///
    /// An empty `error` does not count; the body is read as an assessment.
    Failed {
        #[serde(deserialize_with = "non_empty")]
        error: String,
    },
    /// Posture classification with optional measurements
    Assessed(PostureAssessment),
}

fn non_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let value = String::deserialize(deserializer)?;
    if value.is_empty() {
        return Err(de::Error::custom("empty error message"));
    }
    Ok(value)
}

impl PostureResult {
    /// Posture classification, `None` for service-reported errors
    pub fn is_good(&self) -> Option<bool> {
        match self {
            PostureResult::Failed { .. } => None,
            PostureResult::Assessed(assessment) => Some(assessment.is_good),
        }
    }

    pub fn landmarks(&self) -> Option<&[Landmark]> {
        match self {
            PostureResult::Failed { .. } => None,
            PostureResult::Assessed(assessment) => assessment.landmarks.as_deref(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PostureAssessment {
    /// Human-readable verdict from the service
    #[serde(default)]
    pub status: String,
    pub is_good: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub angles: Option<NeckAngles>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<PostureMetrics>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub landmarks: Option<Vec<Landmark>>,
}

/// Neck tilt in degrees; right tilt is negative, left tilt positive
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NeckAngles {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PostureMetrics {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub back_angle: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shoulder_tilt: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right_knee_angle: Option<f64>,
}

/// Threshold defaults published by the inference service (`GET /api/config`)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ServiceDefaults {
    pub right_min_angle: f64,
    pub right_max_angle: f64,
    pub left_min_angle: f64,
    pub left_max_angle: f64,
}

impl ServiceDefaults {
    /// Used when the service cannot be reached at startup
    pub fn fallback() -> Self {
        Self {
            right_min_angle: -60.0,
            right_max_angle: 0.0,
            left_min_angle: 0.0,
            left_max_angle: 60.0,
        }
    }
}
