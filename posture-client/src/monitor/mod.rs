// Capture/submit loop

use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::time::{interval, Duration, Instant, MissedTickBehavior};

use crate::api::{ApiError, PostureService};
use crate::capture::{capture_frame, CaptureError, FrameSource};
use crate::config::CaptureSettings;
use crate::models::PostureResult;

mod sequencer;

pub use sequencer::Sequencer;

#[derive(Error, Debug)]
pub enum CycleError {
    #[error("Capture failed: {0}")]
    Capture(#[from] CaptureError),

    #[error("Inference request failed: {0}")]
    Api(#[from] ApiError),
}

#[derive(Debug, Clone)]
pub struct MonitorOptions {
    pub interval: Duration,
    pub cycle_timeout: Duration,
    pub jpeg_quality: u8,
}

impl Default for MonitorOptions {
    fn default() -> Self {
        Self::from_settings(&CaptureSettings::default())
    }
}

impl MonitorOptions {
    pub fn from_settings(settings: &CaptureSettings) -> Self {
        Self {
            interval: Duration::from_millis(settings.interval_ms.max(1)),
            cycle_timeout: Duration::from_millis(settings.cycle_timeout_ms.max(1)),
            jpeg_quality: settings.jpeg_quality,
        }
    }
}

/// An accepted inference result together with the frame it was computed on
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub seq: u64,
    pub width: u32,
    pub height: u32,
    pub result: PostureResult,
}

/// What the loop tells the presentation side
#[derive(Debug, Clone)]
pub enum MonitorEvent {
    /// First frame captured; the dimensions size the overlay
    CameraReady { width: u32, height: u32 },
    /// Capture failed before any frame was produced
    CameraError(String),
    Result(CycleReport),
}

enum CycleMessage {
    Captured {
        width: u32,
        height: u32,
    },
    Finished {
        seq: u64,
        outcome: Result<CycleReport, CycleError>,
    },
}

/// Periodically captures a frame and submits it for assessment
pub struct Monitor<F, S> {
    source: Arc<F>,
    service: Arc<S>,
    options: MonitorOptions,
}

impl<F: FrameSource, S: PostureService> Monitor<F, S> {
    pub fn new(source: F, service: S, options: MonitorOptions) -> Self {
        Self {
            source: Arc::new(source),
            service: Arc::new(service),
            options,
        }
    }

    /// Run until the receiving side of `events` goes away
    pub async fn run(self, events: mpsc::UnboundedSender<MonitorEvent>) {
        let (done_tx, mut done_rx) = mpsc::unbounded_channel();
        let mut sequencer = Sequencer::new();
        let mut camera_seen = false;
        let mut camera_error_reported = false;

        let mut ticker = interval(self.options.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        tracing::info!(
            "Detection started: capturing from {} every {:?}",
            self.source.describe(),
            self.options.interval
        );

        loop {
            tokio::select! {
                _ = events.closed() => break,

                _ = ticker.tick() => {
                    let now = Instant::now();

                    if let Some(seq) = sequencer.expire_overdue(now, self.options.cycle_timeout) {
                        tracing::warn!(
                            "Cycle {} exceeded {:?}, discarding its result",
                            seq,
                            self.options.cycle_timeout
                        );
                    }

                    match sequencer.try_begin(now) {
                        Some(seq) => self.spawn_cycle(seq, done_tx.clone()),
                        None => tracing::debug!("Previous cycle still in flight, skipping tick"),
                    }
                }

                Some(message) = done_rx.recv() => match message {
                    CycleMessage::Captured { width, height } => {
                        if !camera_seen {
                            camera_seen = true;
                            tracing::info!("Camera ready ({}x{})", width, height);
                            let _ = events.send(MonitorEvent::CameraReady { width, height });
                        }
                    }

                    CycleMessage::Finished { seq, outcome } => match outcome {
                        Ok(report) => {
                            if sequencer.complete(seq, true) {
                                let _ = events.send(MonitorEvent::Result(report));
                            } else {
                                tracing::debug!("Discarding stale result of cycle {}", seq);
                            }
                        }
                        Err(err) => {
                            sequencer.complete(seq, false);

                            if let CycleError::Capture(capture) = &err {
                                if !camera_seen && !camera_error_reported {
                                    camera_error_reported = true;
                                    tracing::error!("Camera access error: {}", capture);
                                    let _ = events.send(MonitorEvent::CameraError(capture.to_string()));
                                    continue;
                                }
                            }

                            tracing::warn!("Cycle {} skipped: {}", seq, err);
                        }
                    },
                },
            }
        }

        tracing::info!("Detection stopped");
    }

    fn spawn_cycle(&self, seq: u64, done: mpsc::UnboundedSender<CycleMessage>) {
        let source = Arc::clone(&self.source);
        let service = Arc::clone(&self.service);
        let quality = self.options.jpeg_quality;

        tokio::spawn(async move {
            let outcome = async {
                let frame = capture_frame(source.as_ref(), quality).await?;
                let _ = done.send(CycleMessage::Captured {
                    width: frame.width,
                    height: frame.height,
                });

                let result = service.assess(frame.jpeg).await?;
                Ok::<_, CycleError>(CycleReport {
                    seq,
                    width: frame.width,
                    height: frame.height,
                    result,
                })
            }
            .await;

            let _ = done.send(CycleMessage::Finished { seq, outcome });
        });
    }
}
