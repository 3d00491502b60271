use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::ServiceDefaults;

/// Alert interval applied whenever thresholds come from service defaults
pub const DEFAULT_ALERT_INTERVAL_MS: u64 = 10_000;

/// Neck angle thresholds and alert cadence.
///
/// Right tilt is negative and left tilt positive, so a valid config keeps the
/// right-side bounds at or below zero and the left-side bounds at or above it.
/// Field names on disk are camelCase.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostureConfig {
    pub right_min_angle: f64,
    pub right_max_angle: f64,
    pub left_min_angle: f64,
    pub left_max_angle: f64,
    /// Milliseconds of continuous bad posture between alerts
    #[serde(rename = "alertInterval")]
    pub alert_interval_ms: u64,
}

impl PostureConfig {
    /// Thresholds from the service with the default alert interval
    pub fn from_defaults(defaults: &ServiceDefaults) -> Self {
        Self {
            right_min_angle: defaults.right_min_angle,
            right_max_angle: defaults.right_max_angle,
            left_min_angle: defaults.left_min_angle,
            left_max_angle: defaults.left_max_angle,
            alert_interval_ms: DEFAULT_ALERT_INTERVAL_MS,
        }
    }

    /// Alert interval in seconds, as entered by the user
    pub fn alert_interval_secs(&self) -> f64 {
        self.alert_interval_ms as f64 / 1000.0
    }

    /// Convert a user-entered interval in seconds to milliseconds
    pub fn interval_ms_from_secs(secs: f64) -> u64 {
        if secs.is_finite() && secs > 0.0 {
            (secs * 1000.0).round() as u64
        } else {
            0
        }
    }
}

/// Why a candidate config was rejected
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("right min angle ({min}) must be below right max angle ({max})")]
    RightRangeInverted { min: f64, max: f64 },

    #[error("left min angle ({min}) must be below left max angle ({max})")]
    LeftRangeInverted { min: f64, max: f64 },

    #[error("right side angles must be zero or negative (got {0})")]
    RightAnglePositive(f64),

    #[error("left side angles must be zero or positive (got {0})")]
    LeftAngleNegative(f64),

    #[error("angle values must be finite numbers")]
    NotFinite,

    #[error("alert interval must be greater than zero")]
    ZeroInterval,
}

impl ValidationError {
    /// Message shown to the user on a rejected save
    pub fn user_message(&self) -> String {
        format!("Invalid angle configuration: {}", self)
    }
}

/// Accept a candidate config or explain the first violated rule.
///
/// Nothing is applied here; on rejection the caller keeps its previous config.
pub fn validate(candidate: PostureConfig) -> Result<PostureConfig, ValidationError> {
    let PostureConfig {
        right_min_angle: right_min,
        right_max_angle: right_max,
        left_min_angle: left_min,
        left_max_angle: left_max,
        alert_interval_ms,
    } = candidate;

    if [right_min, right_max, left_min, left_max]
        .iter()
        .any(|angle| !angle.is_finite())
    {
        return Err(ValidationError::NotFinite);
    }

    if right_min >= right_max {
        return Err(ValidationError::RightRangeInverted {
            min: right_min,
            max: right_max,
        });
    }

    if left_min >= left_max {
        return Err(ValidationError::LeftRangeInverted {
            min: left_min,
            max: left_max,
        });
    }

    if right_min > 0.0 {
        return Err(ValidationError::RightAnglePositive(right_min));
    }
    if right_max > 0.0 {
        return Err(ValidationError::RightAnglePositive(right_max));
    }

    if left_min < 0.0 {
        return Err(ValidationError::LeftAngleNegative(left_min));
    }
    if left_max < 0.0 {
        return Err(ValidationError::LeftAngleNegative(left_max));
    }

    if alert_interval_ms == 0 {
        return Err(ValidationError::ZeroInterval);
    }

    Ok(candidate)
}

/// A stored config wins; otherwise build one from the service defaults
pub fn resolve(defaults: &ServiceDefaults, stored: Option<PostureConfig>) -> PostureConfig {
    stored.unwrap_or_else(|| PostureConfig::from_defaults(defaults))
}
