use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::event::{Event, MouseButton, MouseEvent, MouseEventKind};
use log::debug;
use ratatui::{
    Frame, Terminal,
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    widgets::Block,
};

use crate::event_source::EventSource;
use crate::reader::gesture::{TouchEvent, TouchPhase, TouchPoint};
use crate::reader::session::{KeyOutcome, ReaderSession};
use crate::theme::palette_for;
use crate::widget::{bookmark_panel, hud_message, page_view, settings_popup, status_bar};

/// Approximate size of a terminal cell in pixels, for turning mouse drags
/// into touch distances.
const CELL_WIDTH_PX: f32 = 8.0;
const CELL_HEIGHT_PX: f32 = 16.0;

pub fn draw(f: &mut Frame, session: &ReaderSession) {
    let palette = palette_for(session.settings().theme);
    let area = f.area();
    f.render_widget(Block::default().style(Style::default().bg(palette.base_00)), area);

    let page_area = if session.is_fullscreen() {
        area
    } else {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(status_bar::height(session)),
                Constraint::Min(1),
            ])
            .split(area);
        status_bar::render(f, chunks[0], session, palette);
        chunks[1]
    };

    page_view::render(f, page_area, session, palette);

    if let Some(panel) = session.settings_panel() {
        settings_popup::render(f, area, panel, session.settings(), palette);
    }
    if let Some(panel) = session.bookmark_panel() {
        bookmark_panel::render(
            f,
            area,
            panel,
            session.bookmarks(),
            session.current_page(),
            palette,
        );
    }

    if let Some(notification) = session.notifications().current() {
        let bottom = Rect {
            y: area.y + area.height.saturating_sub(1),
            height: area.height.min(1),
            ..area
        };
        hud_message::render(f, bottom, notification, palette);
    }
}

/// Left-button mouse input, treated as a single finger.
pub fn mouse_to_touch(mouse: &MouseEvent, at: Duration) -> Option<TouchEvent> {
    let phase = match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => TouchPhase::Start,
        MouseEventKind::Drag(MouseButton::Left) => TouchPhase::Move,
        MouseEventKind::Up(MouseButton::Left) => TouchPhase::End,
        _ => return None,
    };
    let point = TouchPoint::new(
        f32::from(mouse.column) * CELL_WIDTH_PX,
        f32::from(mouse.row) * CELL_HEIGHT_PX,
    );
    Some(TouchEvent::new(phase, vec![point], at))
}

pub fn run_reader_with_event_source<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    session: &mut ReaderSession,
    event_source: &mut dyn EventSource,
) -> Result<()>
where
    B::Error: Send + Sync + 'static,
{
    let tick_rate = Duration::from_millis(50);
    let epoch = Instant::now();
    let mut last_tick = Instant::now();
    let mut first_render = true;

    loop {
        let mut events_processed = 0;
        let mut should_quit = false;

        while event_source.poll(Duration::from_millis(0))? && events_processed < 50 {
            let event = event_source.read()?;
            events_processed += 1;
            let now = Instant::now();

            match event {
                Event::Key(key) => {
                    if session.handle_key(&key, now) == KeyOutcome::Quit {
                        should_quit = true;
                    }
                }
                Event::Mouse(mouse) => match mouse.kind {
                    MouseEventKind::ScrollDown => session.next_page(),
                    MouseEventKind::ScrollUp => session.previous_page(),
                    MouseEventKind::ScrollLeft | MouseEventKind::ScrollRight => {
                        // Ignore horizontal scroll to prevent flooding
                    }
                    _ => {
                        if let Some(touch) = mouse_to_touch(&mouse, now - epoch) {
                            if let Some(intent) = session.handle_touch(&touch) {
                                debug!("Gesture: {intent:?}");
                            }
                        }
                    }
                },
                Event::Resize(_cols, _rows) => {}
                _ => {}
            }

            if should_quit || session.should_quit() {
                should_quit = true;
                break;
            }
        }

        let mut needs_redraw = events_processed > 0;
        if first_render {
            needs_redraw = true;
            first_render = false;
        }

        if last_tick.elapsed() >= tick_rate {
            session.tick(Instant::now());
            // Loading, timers and notifications all change what is shown
            needs_redraw = true;
            last_tick = Instant::now();
        }

        if needs_redraw {
            terminal.draw(|f| draw(f, session))?;
        }

        if should_quit {
            return Ok(());
        }

        // If no events were processed, wait a bit to avoid busy-waiting
        if events_processed == 0 {
            let timeout = tick_rate
                .checked_sub(last_tick.elapsed())
                .unwrap_or_else(|| Duration::from_secs(0));
            let _ = event_source.poll(timeout);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    fn mouse(kind: MouseEventKind, column: u16, row: u16) -> MouseEvent {
        MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::empty(),
        }
    }

    #[test]
    fn left_button_maps_to_one_finger() {
        let down = mouse(MouseEventKind::Down(MouseButton::Left), 10, 2);
        let touch = mouse_to_touch(&down, Duration::from_millis(5)).unwrap();
        assert_eq!(touch.phase, TouchPhase::Start);
        assert_eq!(touch.touches, vec![TouchPoint::new(80.0, 32.0)]);

        let up = mouse(MouseEventKind::Up(MouseButton::Left), 10, 2);
        let touch = mouse_to_touch(&up, Duration::from_millis(50)).unwrap();
        assert_eq!(touch.phase, TouchPhase::End);
        assert_eq!(touch.touches.len(), 1);
    }

    #[test]
    fn other_buttons_are_not_touches() {
        let right = mouse(MouseEventKind::Down(MouseButton::Right), 0, 0);
        assert!(mouse_to_touch(&right, Duration::ZERO).is_none());
        let moved = mouse(MouseEventKind::Moved, 0, 0);
        assert!(mouse_to_touch(&moved, Duration::ZERO).is_none());
    }
}
