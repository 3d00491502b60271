// Bad-posture duration tracking and alert throttling

mod alert;
mod tracker;

pub use alert::{sink_from_settings, AlertSink, SoundCommand, TerminalBell};
pub use tracker::{Alert, Observation, PostureSession, PostureState, PostureTracker};
