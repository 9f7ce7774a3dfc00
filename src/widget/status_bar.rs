use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Gauge, Paragraph},
};

use crate::reader::session::ReaderSession;
use crate::theme::Base16Palette;

/// Rows the toolbar needs for the current settings.
pub fn height(session: &ReaderSession) -> u16 {
    if session.settings().show_progress_bar { 2 } else { 1 }
}

pub fn render(f: &mut Frame, area: Rect, session: &ReaderSession, palette: &Base16Palette) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(0)])
        .split(area);

    f.render_widget(
        Paragraph::new(toolbar_line(session, palette)).style(Style::default().bg(palette.base_01)),
        rows[0],
    );

    if session.settings().show_progress_bar && rows[1].height > 0 {
        let progress = session.progress();
        let gauge = Gauge::default()
            .gauge_style(Style::default().fg(palette.base_0d).bg(palette.base_01))
            .ratio(f64::from(progress.progress_percentage / 100.0).clamp(0.0, 1.0))
            .label(format!(
                "{:.0}%{}",
                progress.progress_percentage,
                if progress.is_completed { " - finished" } else { "" }
            ));
        f.render_widget(gauge, rows[1]);
    }
}

pub fn toolbar_line(session: &ReaderSession, palette: &Base16Palette) -> Line<'static> {
    let label = Style::default().fg(palette.base_04);
    let value = Style::default().fg(palette.base_06).add_modifier(Modifier::BOLD);

    let mut spans = vec![Span::styled(format!(" {} ", session.title()), value)];

    if session.settings().show_page_numbers && session.total_pages() > 0 {
        spans.push(Span::styled("  page ", label));
        spans.push(Span::styled(
            format!("{}/{}", session.current_page(), session.total_pages()),
            value,
        ));
    }

    spans.push(Span::styled("  zoom ", label));
    spans.push(Span::styled(format!("{:.0}%", session.zoom() * 100.0), value));

    if session.rotation().degrees() != 0 {
        spans.push(Span::styled("  rot ", label));
        spans.push(Span::styled(format!("{}°", session.rotation().degrees()), value));
    }

    if session.bookmarks().is_bookmarked(session.current_page()) {
        spans.push(Span::styled(
            "  [bookmarked]",
            Style::default().fg(palette.base_0a),
        ));
    }

    if session.is_auto_advancing() {
        spans.push(Span::styled(
            format!("  [auto {}s]", session.settings().auto_advance_delay_secs),
            Style::default().fg(palette.base_0b),
        ));
    }

    spans.push(Span::styled(
        "  b bookmark  m list  s settings  q quit",
        Style::default().fg(palette.base_03),
    ));

    Line::from(spans)
}
