//! The page area
//!
//! Pixels come from an external viewer; here the page is drawn as a framed
//! sheet sized by the zoom factor and shifted by the pan offset, so the
//! view state is visible while reading in a terminal.

use ratatui::{
    Frame,
    layout::{Alignment, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
};

use crate::reader::document::{DocumentState, LoadError};
use crate::reader::navigation::{DEFAULT_ZOOM, MAX_ZOOM};
use crate::reader::session::ReaderSession;
use crate::theme::Base16Palette;

pub fn render(f: &mut Frame, area: Rect, session: &ReaderSession, palette: &Base16Palette) {
    match session.document() {
        DocumentState::Loading(_) => render_loading(f, area, session, palette),
        DocumentState::Failed(error) => render_load_error(f, area, error, palette),
        DocumentState::Ready(_) => render_page(f, area, session, palette),
    }
}

fn render_loading(f: &mut Frame, area: Rect, session: &ReaderSession, palette: &Base16Palette) {
    let text = vec![
        Line::from(""),
        Line::from(Span::styled(
            format!("Loading {}...", session.title()),
            Style::default().fg(palette.base_05),
        )),
    ];
    f.render_widget(
        Paragraph::new(text).alignment(Alignment::Center),
        area,
    );
}

fn render_load_error(f: &mut Frame, area: Rect, error: &LoadError, palette: &Base16Palette) {
    let block = Block::default()
        .title(" Could not open comic ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.base_08));
    let text = vec![
        Line::from(""),
        Line::from(Span::styled(
            error.to_string(),
            Style::default().fg(palette.base_08).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("R", Style::default().fg(palette.base_0d).add_modifier(Modifier::BOLD)),
            Span::styled(" retry   ", Style::default().fg(palette.base_05)),
            Span::styled("o", Style::default().fg(palette.base_0d).add_modifier(Modifier::BOLD)),
            Span::styled(" open in external viewer   ", Style::default().fg(palette.base_05)),
            Span::styled("q", Style::default().fg(palette.base_0d).add_modifier(Modifier::BOLD)),
            Span::styled(" quit", Style::default().fg(palette.base_05)),
        ]),
    ];
    f.render_widget(
        Paragraph::new(text)
            .block(block)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true }),
        area,
    );
}

fn render_page(f: &mut Frame, area: Rect, session: &ReaderSession, palette: &Base16Palette) {
    let sheet = sheet_rect(area, session.zoom(), session.pan());
    let bookmarked = session.bookmarks().is_bookmarked(session.current_page());

    let mut title = format!(" {} ", session.current_page());
    if bookmarked {
        title.push_str("* ");
    }
    let border = if bookmarked {
        palette.base_0a
    } else {
        palette.base_04
    };
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border))
        .style(Style::default().bg(palette.base_01));

    let (pan_x, pan_y) = session.pan();
    let mut text = vec![
        Line::from(""),
        Line::from(Span::styled(
            format!("Page {} of {}", session.current_page(), session.total_pages()),
            Style::default().fg(palette.base_06).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            format!(
                "{} | rotated {}°",
                session.settings().fit_mode.as_str(),
                session.rotation().degrees()
            ),
            Style::default().fg(palette.base_04),
        )),
    ];
    if pan_x != 0.0 || pan_y != 0.0 {
        text.push(Line::from(Span::styled(
            format!("offset {pan_x:.0}, {pan_y:.0}"),
            Style::default().fg(palette.base_03),
        )));
    }

    f.render_widget(
        Paragraph::new(text).block(block).alignment(Alignment::Center),
        sheet,
    );
}

/// Scale the sheet with zoom: full area at `MAX_ZOOM`, a bit over half at
/// the default. Pan shifts it by one cell per 10 px.
fn sheet_rect(area: Rect, zoom: f32, pan: (f32, f32)) -> Rect {
    let fraction = (zoom / MAX_ZOOM).clamp(0.2, 1.0);
    let width = ((area.width as f32 * fraction) as u16).max(12).min(area.width);
    let height = ((area.height as f32 * fraction.max(DEFAULT_ZOOM / MAX_ZOOM)) as u16)
        .max(5)
        .min(area.height);

    let slack_x = area.width - width;
    let slack_y = area.height - height;
    let shift_x = (pan.0 / 10.0) as i32;
    let shift_y = (pan.1 / 10.0) as i32;
    let x = (slack_x as i32 / 2 + shift_x).clamp(0, slack_x as i32) as u16;
    let y = (slack_y as i32 / 2 + shift_y).clamp(0, slack_y as i32) as u16;

    Rect {
        x: area.x + x,
        y: area.y + y,
        width,
        height,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sheet_grows_with_zoom_and_stays_inside() {
        let area = Rect::new(0, 0, 100, 40);
        let small = sheet_rect(area, 1.2, (0.0, 0.0));
        let large = sheet_rect(area, 3.0, (0.0, 0.0));
        assert!(large.width > small.width);
        assert_eq!(large, area);
    }

    #[test]
    fn pan_shifts_within_bounds() {
        let area = Rect::new(0, 0, 100, 40);
        let centered = sheet_rect(area, 2.0, (0.0, 0.0));
        let shifted = sheet_rect(area, 2.0, (10_000.0, 0.0));
        assert!(shifted.x > centered.x);
        assert!(shifted.x + shifted.width <= area.width);
    }

    #[test]
    fn tiny_areas_do_not_underflow() {
        let area = Rect::new(0, 0, 4, 2);
        let sheet = sheet_rect(area, 1.2, (-500.0, 500.0));
        assert!(sheet.width <= 4 && sheet.height <= 2);
    }
}
