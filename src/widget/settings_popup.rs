use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState},
};

use super::centered_rect;
use crate::reader::panels::{SettingRow, SettingsPanel};
use crate::settings::ReaderSettings;
use crate::theme::Base16Palette;

const LABEL_WIDTH: usize = 22;

pub fn render(
    f: &mut Frame,
    area: Rect,
    panel: &SettingsPanel,
    settings: &ReaderSettings,
    palette: &Base16Palette,
) {
    let popup_area = centered_rect(60, 70, area);
    f.render_widget(Clear, popup_area);

    // Footer hints on the bottom border
    let block = Block::default()
        .title(" Settings ")
        .title_bottom(Line::from(" j/k navigate  Enter change  x defaults  Esc close ").right_aligned())
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.popup_border_color()))
        .style(Style::default().bg(palette.base_00));

    let items: Vec<ListItem> = SettingRow::ALL
        .iter()
        .map(|row| {
            ListItem::new(Line::from(vec![
                Span::styled(
                    format!("  {:<LABEL_WIDTH$}", row.label()),
                    Style::default().fg(palette.base_05),
                ),
                Span::styled(
                    row.value(settings),
                    Style::default().fg(palette.base_0d).add_modifier(Modifier::BOLD),
                ),
            ]))
        })
        .collect();

    let (selection_bg, selection_fg) = palette.get_selection_colors(true);
    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().bg(selection_bg).fg(selection_fg));

    let mut state = ListState::default();
    state.select(Some(panel.selected()));
    f.render_stateful_widget(list, popup_area, &mut state);
}
