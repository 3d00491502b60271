use anyhow::{Context, Result};
use chrono::Utc;
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;
use tokio::sync::mpsc;
use tokio::time::Duration;

use super::{fetch_service_defaults, open_config_store};
use crate::api::InferenceClient;
use crate::capture::{CommandCamera, StillImage};
use crate::config::Settings;
use crate::monitor::{Monitor, MonitorEvent, MonitorOptions};
use crate::posture::sink_from_settings;
use crate::ui::{App, Dashboard, Tone};

#[derive(Args)]
pub struct RunCommand {
    /// Print one status line per result instead of the dashboard
    #[arg(long)]
    headless: bool,

    /// Read frames from an image file instead of the camera
    #[arg(long, value_name = "PATH")]
    frame_file: Option<PathBuf>,

    /// Start with alert sounds muted
    #[arg(long)]
    no_alerts: bool,

    /// Capture interval in milliseconds
    #[arg(long, value_name = "MS")]
    interval_ms: Option<u64>,
}

impl RunCommand {
    pub fn is_headless(&self) -> bool {
        self.headless
    }

    pub async fn execute(self, settings: Settings) -> Result<()> {
        let client = InferenceClient::new(&settings.api)?;
        let defaults = fetch_service_defaults(&client).await;

        let store = open_config_store(&settings)?;
        let alerts_enabled = settings.alerts.enabled && !self.no_alerts;
        let app = App::new(
            store,
            defaults,
            alerts_enabled,
            sink_from_settings(&settings.alerts),
        );

        let mut options = MonitorOptions::from_settings(&settings.capture);
        if let Some(ms) = self.interval_ms {
            options.interval = Duration::from_millis(ms.max(1));
        }

        // The dashboard keeps a handle for fetching defaults on reset
        let monitor_client = client.clone();

        let (tx, rx) = mpsc::unbounded_channel();
        match &self.frame_file {
            Some(path) => {
                let monitor = Monitor::new(StillImage::new(path), monitor_client, options);
                tokio::spawn(monitor.run(tx));
            }
            None => {
                let camera = CommandCamera::from_settings(&settings.capture)
                    .context("Invalid capture command in settings")?;
                let monitor = Monitor::new(camera, monitor_client, options);
                tokio::spawn(monitor.run(tx));
            }
        }

        if self.headless {
            run_headless(app, rx).await
        } else {
            tokio::task::block_in_place(move || {
                let mut dashboard = Dashboard::new(app, rx, client)?;
                dashboard.run()
            })
        }
    }
}

async fn run_headless(mut app: App, mut events: mpsc::UnboundedReceiver<MonitorEvent>) -> Result<()> {
    println!("Posture detection running, press Ctrl+C to stop");
    println!("{}", app.alerts_label());

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => break,

            event = events.recv() => {
                let Some(event) = event else {
                    tracing::error!("Detection loop stopped unexpectedly");
                    break;
                };

                match &event {
                    MonitorEvent::CameraReady { width, height } => {
                        println!("{} Camera ready ({}x{})", "✓".green(), width, height);
                    }
                    MonitorEvent::CameraError(e) => {
                        println!("{} Camera access error: {}", "✗".red(), e);
                    }
                    MonitorEvent::Result(_) => {}
                }

                let is_result = matches!(event, MonitorEvent::Result(_));
                app.handle_event(event, Utc::now());

                if is_result {
                    let line = app.status_line();
                    match app.view.tone {
                        Tone::Good => println!("{}", line.green()),
                        Tone::Bad => println!("{}", line.red()),
                        Tone::Neutral => println!("{}", line),
                    }
                }
            }
        }
    }

    println!();
    println!(
        "Stopped after {} assessed frames, {} alerts",
        app.frames_assessed, app.alerts_played
    );

    Ok(())
}
