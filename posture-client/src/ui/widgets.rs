use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{
        canvas::{Canvas, Circle, Line as CanvasLine},
        Block, Borders, Paragraph, Widget, Wrap,
    },
};

use super::app::CameraState;
use super::view::{StatusView, Tone};
use crate::config::PostureConfig;
use crate::render::Scene;

fn tone_color(tone: Tone) -> Color {
    match tone {
        Tone::Good => Color::Green,
        Tone::Bad => Color::Red,
        Tone::Neutral => Color::Gray,
    }
}

/// Render the skeleton overlay, bordered in the posture colour
pub fn render_skeleton(area: Rect, buf: &mut Buffer, scene: &Scene, camera: &CameraState, tone: Tone) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" 🧍 Camera ")
        .border_style(Style::default().fg(tone_color(tone)));

    if scene.width <= 0.0 || scene.height <= 0.0 {
        let message = match camera {
            CameraState::Starting => "Waiting for camera...".to_string(),
            CameraState::Ready { width, height } => format!("Camera ready ({}x{})", width, height),
            CameraState::Error(e) => format!("Camera access error\n\n{}", e),
        };

        Paragraph::new(message)
            .style(Style::default().fg(Color::DarkGray))
            .wrap(Wrap { trim: true })
            .block(block)
            .render(area, buf);
        return;
    }

    // Canvas y grows upwards, the raster's downwards
    let height = scene.height;
    Canvas::default()
        .block(block)
        .x_bounds([0.0, scene.width])
        .y_bounds([0.0, height])
        .paint(|ctx| {
            for (from, to) in scene.segments() {
                ctx.draw(&CanvasLine::new(
                    from.x,
                    height - from.y,
                    to.x,
                    height - to.y,
                    Color::Green,
                ));
            }
            for (at, radius) in scene.markers() {
                ctx.draw(&Circle {
                    x: at.x,
                    y: height - at.y,
                    radius,
                    color: Color::Green,
                });
            }
        })
        .render(area, buf);
}

/// Render posture status and measurements
pub fn render_status(area: Rect, buf: &mut Buffer, view: &StatusView) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" 📋 Posture ")
        .border_style(Style::default().fg(Color::Gray));

    let inner = block.inner(area);
    block.render(area, buf);

    let mut lines = vec![
        Line::from(Span::styled(
            view.status.clone(),
            Style::default()
                .fg(tone_color(view.tone))
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
    ];

    if let Some(timer) = &view.timer {
        lines.push(Line::from(Span::styled(
            timer.clone(),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )));
        lines.push(Line::from(""));
    }

    for text in [&view.neck, &view.back, &view.shoulder, &view.knee]
        .into_iter()
        .flatten()
    {
        lines.push(Line::from(Span::styled(
            text.clone(),
            Style::default().fg(Color::White),
        )));
    }

    Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .render(inner, buf);
}

/// Render the active thresholds
pub fn render_config(area: Rect, buf: &mut Buffer, config: &PostureConfig) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" ⚙️  Thresholds ")
        .border_style(Style::default().fg(Color::Gray));

    let inner = block.inner(area);
    block.render(area, buf);

    let row = |label: &'static str, value: String| {
        Line::from(vec![
            Span::styled(label, Style::default().fg(Color::Gray)),
            Span::styled(value, Style::default().fg(Color::Cyan)),
        ])
    };

    let lines = vec![
        row(
            "Right neck: ",
            format!("{}° .. {}°", config.right_min_angle, config.right_max_angle),
        ),
        row(
            "Left neck:  ",
            format!("{}° .. {}°", config.left_min_angle, config.left_max_angle),
        ),
        row("Alert after: ", format!("{}s", config.alert_interval_secs())),
    ];

    Paragraph::new(lines).render(inner, buf);
}

/// Render help overlay
pub fn render_help_overlay(area: Rect, buf: &mut Buffer) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" ❓ Help ")
        .border_style(Style::default().fg(Color::Cyan))
        .style(Style::default().bg(Color::Black));

    let inner = block.inner(area);
    block.render(area, buf);

    let help_text = vec![
        Line::from(Span::styled(
            "Keyboard Shortcuts",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from("  a        - Toggle alert sound"),
        Line::from("  + / -    - Alert interval up / down by 1s"),
        Line::from("  r        - Reset thresholds to defaults"),
        Line::from("  ?        - Toggle this help"),
        Line::from("  q / Esc  - Quit"),
        Line::from(""),
        Line::from(Span::styled(
            "Press ? or ESC to close",
            Style::default().fg(Color::DarkGray),
        )),
    ];

    Paragraph::new(help_text).render(inner, buf);
}

/// Render status bar at bottom
pub fn render_status_bar(
    area: Rect,
    buf: &mut Buffer,
    camera_label: &str,
    alerts_label: &str,
    alerts_enabled: bool,
    notice: Option<&str>,
) {
    let alerts = if alerts_enabled {
        Span::styled(
            format!(" 🔔 {} ", alerts_label),
            Style::default().fg(Color::Green).bg(Color::DarkGray),
        )
    } else {
        Span::styled(
            format!(" 🔕 {} ", alerts_label),
            Style::default().fg(Color::Yellow).bg(Color::DarkGray),
        )
    };

    let mut spans = vec![
        Span::styled(
            format!(" {} ", camera_label),
            Style::default().fg(Color::Cyan).bg(Color::DarkGray),
        ),
        alerts,
    ];

    if let Some(notice) = notice {
        spans.push(Span::styled(
            format!(" {} ", notice),
            Style::default().fg(Color::White).bg(Color::DarkGray),
        ));
    }

    spans.push(Span::styled(
        " Press ? for help ",
        Style::default().fg(Color::Gray).bg(Color::DarkGray),
    ));

    Paragraph::new(Line::from(spans)).render(area, buf);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Landmark;
    use crate::render::render_landmarks;

    fn buffer_text(buf: &Buffer) -> String {
        buf.content().iter().map(|cell| cell.symbol()).collect()
    }

    #[test]
    fn test_status_panel_shows_timer() {
        let area = Rect::new(0, 0, 40, 10);
        let mut buf = Buffer::empty(area);
        let view = StatusView {
            status: "Bad posture".to_string(),
            tone: Tone::Bad,
            timer: Some("Bad Posture Time: 12s".to_string()),
            ..StatusView::default()
        };

        render_status(area, &mut buf, &view);

        let text = buffer_text(&buf);
        assert!(text.contains("Bad posture"));
        assert!(text.contains("Bad Posture Time: 12s"));
    }

    #[test]
    fn test_skeleton_placeholder_before_first_frame() {
        let area = Rect::new(0, 0, 40, 10);
        let mut buf = Buffer::empty(area);

        render_skeleton(
            area,
            &mut buf,
            &Scene::new(),
            &CameraState::Error("no device".to_string()),
            Tone::Neutral,
        );

        assert!(buffer_text(&buf).contains("Camera access error"));
    }

    #[test]
    fn test_skeleton_draws_points() {
        let area = Rect::new(0, 0, 40, 20);
        let mut buf = Buffer::empty(area);
        let mut scene = Scene::new();
        render_landmarks(&mut scene, &[Landmark::new(0.5, 0.5, 1.0)], 640.0, 480.0);

        render_skeleton(
            area,
            &mut buf,
            &scene,
            &CameraState::Ready {
                width: 640,
                height: 480,
            },
            Tone::Good,
        );

        let drawn = (1..area.height - 1)
            .flat_map(|y| (1..area.width - 1).map(move |x| (x, y)))
            .filter(|&(x, y)| buf.content()[buf.index_of(x, y)].symbol() != " ")
            .count();
        assert!(drawn > 0);
    }
}
