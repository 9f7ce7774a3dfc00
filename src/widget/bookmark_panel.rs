use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph},
};

use super::centered_rect;
use crate::bookmark::BookmarkClient;
use crate::reader::panels::BookmarkPanel;
use crate::theme::Base16Palette;

pub fn render(
    f: &mut Frame,
    area: Rect,
    panel: &BookmarkPanel,
    bookmarks: &BookmarkClient,
    current_page: usize,
    palette: &Base16Palette,
) {
    let popup_area = centered_rect(50, 60, area);
    f.render_widget(Clear, popup_area);

    let block = Block::default()
        .title(format!(" Bookmarks ({}) ", bookmarks.len()))
        .title_bottom(Line::from(" j/k move  Enter go  d delete  Esc close ").right_aligned())
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.popup_border_color()))
        .style(Style::default().bg(palette.base_00));

    if bookmarks.is_empty() {
        let empty = Paragraph::new(Line::from(Span::styled(
            "No bookmarks yet. Press b on a page to add one.",
            Style::default().fg(palette.base_03),
        )))
        .block(block);
        f.render_widget(empty, popup_area);
        return;
    }

    let (selection_bg, selection_fg) = palette.get_selection_colors(true);
    let items: Vec<ListItem> = bookmarks
        .sorted_by_page()
        .into_iter()
        .map(|bookmark| {
            let marker = if bookmark.page == current_page { "> " } else { "  " };
            let mut spans = vec![
                Span::styled(marker, Style::default().fg(palette.base_0a)),
                Span::styled(
                    format!("Page {:>4}", bookmark.page),
                    Style::default().fg(palette.base_06),
                ),
            ];
            if let Some(note) = bookmark.note.as_deref().filter(|n| !n.is_empty()) {
                spans.push(Span::styled(
                    format!("  {note}"),
                    Style::default().fg(palette.base_04),
                ));
            }
            spans.push(Span::styled(
                format!("  {}", bookmark.created_at.format("%Y-%m-%d")),
                Style::default().fg(palette.base_03),
            ));
            ListItem::new(Line::from(spans))
        })
        .collect();

    let list = List::new(items).block(block).highlight_style(
        Style::default()
            .bg(selection_bg)
            .fg(selection_fg)
            .add_modifier(Modifier::BOLD),
    );

    let mut state = ListState::default();
    state.select(Some(panel.selected().min(bookmarks.len() - 1)));
    f.render_stateful_widget(list, popup_area, &mut state);
}
