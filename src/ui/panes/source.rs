//! Source code pane rendering with syntax highlighting
//!
//! Displays the program being stepped through with basic syntax highlighting.
//! Every line covered by the current node's span gets the current-line
//! background, and the span's exact columns are drawn on a brighter
//! background. When the current record carries the run's error, the span is
//! drawn in the error color instead.
//!
//! # Rendering
//!
//! The pane uses a simple character-by-character tokenizer to apply syntax
//! highlighting styles without requiring the real lexer.

use crate::parser::ast::Span as SourceSpan;
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

/// One highlighted character; columns are kept so the span overlay can be applied after highlighting
struct StyledChar {
    ch: char,
    style: Style,
}

fn push_run(out: &mut Vec<StyledChar>, run: &[char], style: Style) {
    out.extend(run.iter().map(|&ch| StyledChar { ch, style }));
}

fn highlight_source_code(line: &str) -> Vec<StyledChar> {
    let chars: Vec<char> = line.chars().collect();
    let mut out = Vec::with_capacity(chars.len());
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        // Comments run to the end of the line
        if c == '#' {
            push_run(&mut out, &chars[i..], Style::default().fg(DEFAULT_THEME.comment));
            break;
        }

        if c == '"' || (c == 'f' && chars.get(i + 1) == Some(&'"')) {
            let mut end = if c == 'f' { i + 2 } else { i + 1 };
            while end < chars.len() && chars[end] != '"' {
                end += if chars[end] == '\\' { 2 } else { 1 };
            }
            let end = (end + 1).min(chars.len());
            push_run(&mut out, &chars[i..end], Style::default().fg(DEFAULT_THEME.string));
            i = end;
            continue;
        }

        if c.is_ascii_digit() {
            let mut end = i;
            while end < chars.len() && (chars[end].is_ascii_digit() || chars[end] == '.') {
                end += 1;
            }
            push_run(&mut out, &chars[i..end], Style::default().fg(DEFAULT_THEME.number));
            i = end;
            continue;
        }

        if c.is_alphabetic() || c == '_' {
            let mut end = i;
            while end < chars.len() && (chars[end].is_alphanumeric() || chars[end] == '_') {
                end += 1;
            }
            let word: String = chars[i..end].iter().collect();
            let is_call = chars.get(end) == Some(&'(');
            push_run(&mut out, &chars[i..end], keyword_style(&word, is_call));
            i = end;
            continue;
        }

        let style = match c {
            '{' | '}' | '(' | ')' | '[' | ']' => Style::default().fg(DEFAULT_THEME.primary),
            _ => Style::default().fg(DEFAULT_THEME.fg),
        };
        push_run(&mut out, &chars[i..=i], style);
        i += 1;
    }

    out
}

fn keyword_style(word: &str, is_call: bool) -> Style {
    match word {
        "let" | "const" | "fn" | "return" | "if" | "elif" | "else" | "while" | "for"
        | "break" | "continue" | "class" | "extends" | "new" | "this" | "super" => Style::default()
            .fg(DEFAULT_THEME.keyword)
            .add_modifier(Modifier::BOLD),
        "true" | "false" | "null" => Style::default().fg(DEFAULT_THEME.number),
        _ if is_call => Style::default().fg(DEFAULT_THEME.function),
        _ => Style::default().fg(DEFAULT_THEME.fg),
    }
}

/// Columns (1-based, inclusive start, exclusive end) of `span` on `line`
fn span_columns(span: &SourceSpan, line: usize, line_len: usize) -> Option<(usize, usize)> {
    if !span.covers_line(line) {
        return None;
    }
    let start = if line == span.start.line { span.start.column } else { 1 };
    let end = if line == span.end.line {
        span.end.column
    } else {
        line_len + 1
    };
    Some((start, end.max(start)))
}

/// Scroll state for the source pane
pub struct SourceScrollState {
    pub offset: usize,
    /// Visual row the current line is pinned to; `None` until the first render
    pub target_line_row: Option<usize>,
}

/// Render the source code pane
pub fn render_source_pane(
    frame: &mut Frame,
    area: Rect,
    source_code: &str,
    span: SourceSpan,
    is_error: bool,
    is_focused: bool,
    scroll_state: &mut SourceScrollState,
) {
    let border_style = if is_focused {
        Style::default()
            .fg(DEFAULT_THEME.border_focused)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(DEFAULT_THEME.border_normal)
    };

    let block = Block::default()
        .title(" Source ")
        .borders(Borders::ALL)
        .border_style(border_style);

    let lines: Vec<&str> = source_code.lines().collect();
    let total_lines = lines.len();
    let current_line = span.start.line;

    let visible_height = area.height.saturating_sub(2).max(1) as usize;
    let target_row = scroll_state
        .target_line_row
        .unwrap_or(visible_height / 2)
        .min(visible_height.saturating_sub(1));
    scroll_state.target_line_row = Some(target_row);

    // Keep the current line at the target visual row
    if current_line > 0 && current_line <= total_lines {
        scroll_state.offset = (current_line - 1).saturating_sub(target_row);
        if total_lines > visible_height {
            scroll_state.offset = scroll_state.offset.min(total_lines - visible_height);
        } else {
            scroll_state.offset = 0;
        }
    }

    let overlay = if is_error {
        Style::default()
            .bg(DEFAULT_THEME.error)
            .fg(ratatui::style::Color::White)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().bg(DEFAULT_THEME.span_bg)
    };

    let visible_lines: Vec<Line> = lines
        .iter()
        .enumerate()
        .skip(scroll_state.offset)
        .take(visible_height)
        .map(|(idx, line)| {
            let line_num = idx + 1;
            let mut chars = highlight_source_code(line);
            let covered = span_columns(&span, line_num, chars.len());

            let num_style = if covered.is_some() {
                Style::default()
                    .fg(if is_error {
                        DEFAULT_THEME.error
                    } else {
                        DEFAULT_THEME.secondary
                    })
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(DEFAULT_THEME.comment)
            };

            if let Some((start, end)) = covered {
                for (col, styled) in chars.iter_mut().enumerate() {
                    let column = col + 1;
                    styled.style = if column >= start && column < end {
                        styled.style.patch(overlay)
                    } else {
                        styled.style.bg(DEFAULT_THEME.current_line_bg)
                    };
                }
            }

            let mut spans = vec![Span::styled(format!("{:4} ", line_num), num_style)];
            spans.extend(
                chars
                    .into_iter()
                    .map(|styled| Span::styled(styled.ch.to_string(), styled.style)),
            );
            Line::from(spans)
        })
        .collect();

    let paragraph = Paragraph::new(visible_lines).block(block);
    frame.render_widget(paragraph, area);
}
