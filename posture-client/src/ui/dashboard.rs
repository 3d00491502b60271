use anyhow::{Context, Result};
use chrono::Utc;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    Frame, Terminal,
};
use std::io;
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, error::TryRecvError};

use super::app::App;
use super::widgets;
use crate::api::InferenceClient;
use crate::monitor::MonitorEvent;

/// Dashboard manages the TUI lifecycle
pub struct Dashboard {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
    app: App,
    events: mpsc::UnboundedReceiver<MonitorEvent>,
    client: InferenceClient,
    runtime: Handle,
}

impl Dashboard {
    /// Take over the terminal. Must be called from within a tokio runtime.
    pub fn new(
        app: App,
        events: mpsc::UnboundedReceiver<MonitorEvent>,
        client: InferenceClient,
    ) -> Result<Self> {
        let runtime = Handle::try_current().context("Dashboard needs a tokio runtime")?;

        enable_raw_mode().context("Failed to enable raw mode")?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)
            .context("Failed to setup terminal")?;

        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend).context("Failed to create terminal")?;

        Ok(Self {
            terminal,
            app,
            events,
            client,
            runtime,
        })
    }

    /// Run the dashboard event loop; blocks the calling thread
    pub fn run(&mut self) -> Result<()> {
        loop {
            self.drain_events();

            let app = &self.app;
            self.terminal.draw(|f| ui(f, app))?;

            if event::poll(std::time::Duration::from_millis(100))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == event::KeyEventKind::Press {
                        self.app.handle_key(key.code);
                    }
                }
            }

            if self.app.take_reset_request() {
                let app = &mut self.app;
                self.runtime.block_on(app.reset_from_service(&self.client));
            }

            if self.app.should_quit {
                break;
            }
        }

        Ok(())
    }

    fn drain_events(&mut self) {
        loop {
            match self.events.try_recv() {
                Ok(event) => self.app.handle_event(event, Utc::now()),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    if self.app.notice.is_none() {
                        tracing::error!("Detection loop stopped unexpectedly");
                        self.app.notice = Some("Detection stopped".to_string());
                    }
                    break;
                }
            }
        }
    }

    /// Cleanup terminal on exit
    pub fn cleanup(&mut self) -> Result<()> {
        disable_raw_mode().context("Failed to disable raw mode")?;
        execute!(
            self.terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )
        .context("Failed to restore terminal")?;
        self.terminal.show_cursor().context("Failed to show cursor")?;

        Ok(())
    }
}

impl Drop for Dashboard {
    fn drop(&mut self) {
        let _ = self.cleanup();
    }
}

/// Render the UI
fn ui(f: &mut Frame, app: &App) {
    let size = f.area();

    // Main layout: top area + status bar
    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(size);

    // Camera on the left, text on the right
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(main_chunks[0]);

    let right_panels = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(5)])
        .split(columns[1]);

    widgets::render_skeleton(
        columns[0],
        f.buffer_mut(),
        &app.scene,
        &app.camera,
        app.view.tone,
    );

    widgets::render_status(right_panels[0], f.buffer_mut(), &app.view);

    widgets::render_config(right_panels[1], f.buffer_mut(), app.config());

    widgets::render_status_bar(
        main_chunks[1],
        f.buffer_mut(),
        app.camera_label(),
        app.alerts_label(),
        app.tracker().session().alerts_enabled(),
        app.notice.as_deref(),
    );

    if app.show_help {
        let help_area = centered_rect(50, 50, size);
        widgets::render_help_overlay(help_area, f.buffer_mut());
    }
}

/// Helper function to create a centered rect
fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
