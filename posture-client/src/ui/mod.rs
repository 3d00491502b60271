// Terminal UI module using ratatui

mod app;
mod dashboard;
mod view;
mod widgets;

pub use app::{App, CameraState};
pub use dashboard::Dashboard;
pub use view::{StatusView, Tone};
