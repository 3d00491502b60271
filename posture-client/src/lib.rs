// Library exports for the posture client
// This allows testing of internal modules

pub mod api;
pub mod capture;
pub mod commands;
pub mod config;
pub mod models;
pub mod monitor;
pub mod posture;
pub mod render;
pub mod storage;
pub mod ui;
