// Frame acquisition and JPEG encoding

use image::codecs::jpeg::JpegEncoder;
use image::ExtendedColorType;
use std::future::Future;
use std::io;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;

use crate::config::CaptureSettings;

#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("Capture command is empty")]
    EmptyCommand,

    #[error("Failed to start capture command {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("Capture command {program} produced no frame within {after:?}")]
    TimedOut { program: String, after: Duration },

    #[error("Capture command exited with {status}: {stderr}")]
    CommandFailed { status: String, stderr: String },

    #[error("Failed to read frame file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("No frame available yet")]
    NoFrame,

    #[error("Captured image could not be decoded: {0}")]
    Decode(#[source] image::ImageError),

    #[error("Failed to encode frame as JPEG: {0}")]
    Encode(#[source] image::ImageError),

    #[error("Frame encoding task failed: {0}")]
    Worker(String),
}

/// A still frame ready for upload
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub jpeg: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Source of still images in any format the `image` crate can decode
pub trait FrameSource: Send + Sync + 'static {
    /// Grab the current image, still encoded
    fn grab(&self) -> impl Future<Output = Result<Vec<u8>, CaptureError>> + Send;

    /// Short description for logs
    fn describe(&self) -> String;
}

/// Runs an external program that writes one encoded frame to stdout
///
/// A run that outlives `timeout` is killed.
#[derive(Debug, Clone)]
pub struct CommandCamera {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandCamera {
    pub fn new(command: &[String], timeout: Duration) -> Result<Self, CaptureError> {
        let (program, args) = command.split_first().ok_or(CaptureError::EmptyCommand)?;

        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
            timeout,
        })
    }

    pub fn from_settings(settings: &CaptureSettings) -> Result<Self, CaptureError> {
        Self::new(
            &settings.command,
            Duration::from_millis(settings.cycle_timeout_ms.max(1)),
        )
    }
}

impl FrameSource for CommandCamera {
    async fn grab(&self) -> Result<Vec<u8>, CaptureError> {
        let run = tokio::process::Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output();

        let output = tokio::time::timeout(self.timeout, run)
            .await
            .map_err(|_| CaptureError::TimedOut {
                program: self.program.clone(),
                after: self.timeout,
            })?
            .map_err(|source| CaptureError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(CaptureError::CommandFailed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        if output.stdout.is_empty() {
            return Err(CaptureError::NoFrame);
        }

        Ok(output.stdout)
    }

    fn describe(&self) -> String {
        format!("{} {}", self.program, self.args.join(" "))
    }
}

/// Re-reads an image file on every grab, e.g. one refreshed by another tool
#[derive(Debug, Clone)]
pub struct StillImage {
    path: PathBuf,
}

impl StillImage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl FrameSource for StillImage {
    async fn grab(&self) -> Result<Vec<u8>, CaptureError> {
        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|source| CaptureError::Read {
                path: self.path.clone(),
                source,
            })?;

        if bytes.is_empty() {
            return Err(CaptureError::NoFrame);
        }

        Ok(bytes)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Decode a captured image and re-encode it as JPEG
pub fn encode_frame(raw: &[u8], quality: u8) -> Result<Frame, CaptureError> {
    let image = image::load_from_memory(raw).map_err(CaptureError::Decode)?;
    let (width, height) = (image.width(), image.height());

    if width == 0 || height == 0 {
        return Err(CaptureError::NoFrame);
    }

    let rgb = image.to_rgb8();
    let mut jpeg = Vec::new();
    JpegEncoder::new_with_quality(&mut jpeg, quality.clamp(1, 100))
        .encode(rgb.as_raw(), width, height, ExtendedColorType::Rgb8)
        .map_err(CaptureError::Encode)?;

    Ok(Frame {
        jpeg,
        width,
        height,
    })
}

/// Grab one image from `source` and turn it into an upload-ready frame
pub async fn capture_frame<S: FrameSource + ?Sized>(
    source: &S,
    quality: u8,
) -> Result<Frame, CaptureError> {
    let raw = source.grab().await?;

    tokio::task::spawn_blocking(move || encode_frame(&raw, quality))
        .await
        .map_err(|e| CaptureError::Worker(e.to_string()))?
}
