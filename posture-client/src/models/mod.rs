pub mod landmark;
pub mod posture_result;

pub use landmark::{Landmark, CONNECTIONS, LANDMARK_COUNT, VISIBILITY_THRESHOLD};
pub use posture_result::{
    NeckAngles, PostureAssessment, PostureMetrics, PostureResult, ServiceDefaults,
};
