//! UI rendering helpers for the terminal user interface.
//!
//! This module contains functions to render the TUI using `ratatui`.

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style, Stylize},
    text::Line,
    widgets::{Block, Borders, Clear, Gauge, Padding, Paragraph, Wrap},
};

use crate::app::App;
use crate::config::{ControlsSettings, UiSettings};
use crate::playback::format_mmss;

const LEFT_PAD: Padding = Padding {
    left: 1,
    right: 0,
    top: 0,
    bottom: 0,
};

/// Render the controls help text, incorporating scrub seconds.
fn controls_text(app: &App, scrub_seconds: u64) -> String {
    let mut parts = vec![
        "[space/p] play/pause".to_string(),
        "[r] rewind".to_string(),
        format!("[h/l] scrub -/+{}s", scrub_seconds),
    ];
    if app.scrub.is_some() {
        parts.push("[enter] jump".to_string());
    }
    parts.extend([
        "[m] mute ambience".to_string(),
        "[f] favorite".to_string(),
        "[s] skip".to_string(),
        "[K] details".to_string(),
        "[q] quit".to_string(),
    ]);
    parts.join(" | ")
}

fn status_text(app: &App) -> String {
    let snap = &app.snapshot;
    let mut parts: Vec<String> = Vec::new();

    let state = if snap.is_finished {
        "Finished"
    } else if snap.is_playing {
        "Playing"
    } else {
        "Paused"
    };
    parts.push(state.to_string());

    if snap.track_favorited {
        parts.push("★ Favorite".to_string());
    }

    let ambience = match (snap.noise_channel.is_some(), snap.ambience_ready, snap.ambience_muted) {
        (false, _, _) => "Ambience: none",
        (true, false, _) => "Ambience: loading",
        (true, true, true) => "Ambience: muted",
        (true, true, false) => "Ambience: on",
    };
    parts.push(ambience.to_string());

    if snap.is_unguided_part && !snap.is_finished {
        parts.push("Unguided, press s to end the class".to_string());
    }

    parts.join(" • ")
}

/// A one-row ruler with a tick where the unguided tail begins.
fn marker_line(width: u16, marker: Option<f64>) -> String {
    let width = width as usize;
    let Some(marker) = marker else {
        return String::new();
    };
    if width == 0 {
        return String::new();
    }
    let pos = ((marker * width as f64).round() as usize).min(width - 1);
    let mut line = " ".repeat(pos);
    line.push('^');
    line
}

/// Compute a centered rectangle with given size constrained to `r`.
fn centered_rect_sized(mut width: u16, mut height: u16, r: Rect) -> Rect {
    width = width.min(r.width.saturating_sub(2)).max(10);
    height = height.min(r.height.saturating_sub(2)).max(5);

    let x = r.x + (r.width.saturating_sub(width) / 2);
    let y = r.y + (r.height.saturating_sub(height) / 2);
    Rect {
        x,
        y,
        width,
        height,
    }
}

fn details_text(app: &App) -> String {
    let track = &app.track;
    let duration = if app.snapshot.has_duration() {
        format_mmss(app.snapshot.duration)
    } else {
        "-".to_string()
    };
    format!(
        "Narration: {}\nBackground: {}\nAmbience volume: {}\nUnguided tail: {}\nDuration: {}",
        track.narration_source,
        track
            .background_animation_source
            .as_ref()
            .map_or_else(|| "-".to_string(), |s| s.to_string()),
        track
            .background_volume_percent
            .map_or_else(|| "-".to_string(), |v| format!("{v}%")),
        track
            .unguided_tail_seconds
            .map_or_else(|| "-".to_string(), |s| format!("{s:.0}s")),
        duration,
    )
}

/// Render the entire UI into the provided `frame` using `app` state and settings.
pub fn draw(
    frame: &mut Frame,
    app: &App,
    ui_settings: &UiSettings,
    controls_settings: &ControlsSettings,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(4),
            Constraint::Length(4),
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(4),
        ])
        .split(frame.area());

    // Header
    let header = Paragraph::new(ui_settings.header_text.as_str())
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" unguided ")
                .title_alignment(Alignment::Center),
        );
    frame.render_widget(header, chunks[0]);

    let labels = app.labels();

    // Title and subtitle
    let track_par = Paragraph::new(vec![
        Line::from(labels.title.clone()).bold(),
        Line::from(labels.subtitle.clone()).italic(),
    ])
    .alignment(Alignment::Center)
    .block(Block::bordered().padding(LEFT_PAD).title(" now playing "));
    frame.render_widget(track_par, chunks[1]);

    // Progress
    {
        let area = chunks[2];
        let block = Block::bordered().title(" progress ");
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Length(1)])
            .split(inner);

        let ratio = (app.snapshot.percent_complete() / 100.0).clamp(0.0, 1.0);
        let label = match &labels.remaining {
            Some(rem) => format!("{} / {}", labels.elapsed, rem),
            None => labels.elapsed.clone(),
        };
        let gauge_style = if app.scrub.is_some() {
            Style::default().add_modifier(Modifier::REVERSED)
        } else {
            Style::default()
        };
        let gauge = Gauge::default()
            .ratio(ratio)
            .label(label)
            .gauge_style(gauge_style)
            .use_unicode(true);
        frame.render_widget(gauge, rows[0]);

        let marker = Paragraph::new(marker_line(rows[1].width, app.snapshot.unguided_marker())).dim();
        frame.render_widget(marker, rows[1]);
    }

    // Status
    let status_par = Paragraph::new(status_text(app))
        .block(Block::bordered().padding(LEFT_PAD).title(" status "))
        .wrap(Wrap { trim: true });
    frame.render_widget(status_par, chunks[3]);

    if app.metadata_window {
        let popup_area = centered_rect_sized(72, 7, frame.area());
        frame.render_widget(Clear, popup_area);
        let details = Paragraph::new(details_text(app))
            .block(
                Block::default()
                    .padding(LEFT_PAD)
                    .borders(Borders::ALL)
                    .title(" details (K closes) "),
            )
            .wrap(Wrap { trim: true });
        frame.render_widget(details, popup_area);
    }

    let footer = Paragraph::new(controls_text(app, controls_settings.scrub_seconds))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" controls ")
                .padding(LEFT_PAD),
        )
        .wrap(Wrap { trim: true });
    frame.render_widget(footer, chunks[5]);
}
