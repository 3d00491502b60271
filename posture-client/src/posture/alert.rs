use anyhow::{Context, Result};
use std::io::Write;
use std::process::Stdio;

use crate::config::AlertSettings;

/// Something that can make the user notice an alert
pub trait AlertSink: Send {
    /// Start playback. Callers log and ignore failures.
    fn play(&mut self) -> Result<()>;
}

/// Rings the terminal bell
#[derive(Debug, Default)]
pub struct TerminalBell;

impl AlertSink for TerminalBell {
    fn play(&mut self) -> Result<()> {
        let mut stdout = std::io::stdout();
        stdout
            .write_all(b"\x07")
            .and_then(|_| stdout.flush())
            .context("Failed to ring terminal bell")
    }
}

/// Plays a sound clip through an external player, without waiting for it
#[derive(Debug, Clone)]
pub struct SoundCommand {
    program: String,
    args: Vec<String>,
}

impl SoundCommand {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Player from the alert settings with the clip path appended, `None` if unset
    pub fn from_settings(settings: &AlertSettings) -> Option<Self> {
        let (program, args) = settings.sound_command.split_first()?;
        let mut args = args.to_vec();
        args.push(settings.sound_file.clone());
        Some(Self::new(program.clone(), args))
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }
}

impl AlertSink for SoundCommand {
    fn play(&mut self) -> Result<()> {
        tokio::process::Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .with_context(|| format!("Failed to start sound player {}", self.program))?;

        Ok(())
    }
}

/// Build the sink described by the alert settings
pub fn sink_from_settings(settings: &AlertSettings) -> Box<dyn AlertSink> {
    match SoundCommand::from_settings(settings) {
        Some(command) => Box::new(command),
        None => Box::new(TerminalBell),
    }
}
