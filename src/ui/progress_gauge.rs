//! Download progress gauge
//!
//! Shown while the loader fetches countries from the network.

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Gauge},
    Frame,
};

use crate::progress::Progress;

/// Label shown inside the gauge, e.g. "12/190 countries (6%)"
pub fn progress_label(progress: &Progress) -> String {
    format!(
        "{}/{} countries ({}%)",
        progress.done, progress.total, progress.percent
    )
}

/// Renders the gauge into `area`
pub fn render(frame: &mut Frame, area: Rect, progress: &Progress) {
    let color = if progress.is_finished() {
        Color::Green
    } else {
        Color::Cyan
    };

    let gauge = Gauge::default()
        .block(
            Block::default()
                .title(" Downloading measurements ")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(color)),
        )
        .gauge_style(Style::default().fg(color).add_modifier(Modifier::BOLD))
        .ratio(progress.ratio())
        .label(progress_label(progress));

    frame.render_widget(gauge, area);
}
