//! Console output pane rendering

use crate::snapshot::{ConsoleLevel, ConsoleLine};
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, List, ListItem, Padding, Paragraph},
    Frame,
};

fn level_color(level: ConsoleLevel) -> Color {
    match level {
        ConsoleLevel::Print => DEFAULT_THEME.fg,
        ConsoleLevel::Info => DEFAULT_THEME.info,
        ConsoleLevel::Error => DEFAULT_THEME.error,
        ConsoleLevel::Success => DEFAULT_THEME.success,
    }
}

/// Render the console pane with the lines printed up to the current step
pub fn render_console_pane(
    frame: &mut Frame,
    area: Rect,
    lines: &[ConsoleLine],
    is_focused: bool,
    scroll_offset: &mut usize,
) {
    let border_style = if is_focused {
        Style::default()
            .fg(DEFAULT_THEME.border_focused)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(DEFAULT_THEME.border_normal)
    };

    let block = Block::default()
        .title(" Console ")
        .borders(Borders::ALL)
        .border_style(border_style);

    if lines.is_empty() {
        let paragraph = Paragraph::new("(no output)")
            .block(block)
            .style(Style::default().fg(DEFAULT_THEME.comment));
        frame.render_widget(paragraph, area);
        return;
    }

    let block = block.padding(Padding::new(1, 0, 0, 0));
    let visible_height = area.height.saturating_sub(2).max(1) as usize;

    // Clamp only when the output overflows; usize::MAX pins to the bottom
    if lines.len() > visible_height {
        *scroll_offset = (*scroll_offset).min(lines.len() - visible_height);
    } else {
        *scroll_offset = 0;
    }

    let items: Vec<ListItem> = lines
        .iter()
        .skip(*scroll_offset)
        .take(visible_height)
        .map(|line| ListItem::new(line.text.as_str()).style(Style::default().fg(level_color(line.level))))
        .collect();

    frame.render_widget(List::new(items).block(block), area);
}
