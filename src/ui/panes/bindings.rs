//! Bindings pane rendering
//!
//! Shows the current step (node, phase, result or error) followed by every
//! binding visible at that step, grouped by scope with the innermost scope
//! on top. Bindings that changed at this step are marked and colored.

use crate::interpreter::constants::GLOBAL_SCOPE_ID;
use crate::memory::environment::ScopeId;
use crate::snapshot::{BindingSnapshot, Phase, StepRecord};
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

fn step_header(record: &StepRecord) -> Vec<Line<'static>> {
    let phase = match record.phase {
        Phase::Before => "enter",
        Phase::After => "exit",
    };
    let mut lines = vec![Line::from(vec![
        Span::styled(
            format!("{} ", phase),
            Style::default().fg(DEFAULT_THEME.comment),
        ),
        Span::styled(
            record.node.kind.to_string(),
            Style::default()
                .fg(DEFAULT_THEME.function)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("  @{}  depth {}", record.node.span.start, record.depth),
            Style::default().fg(DEFAULT_THEME.comment),
        ),
    ])];

    if let Some(error) = &record.error {
        lines.push(Line::from(Span::styled(
            error.to_string(),
            Style::default()
                .fg(DEFAULT_THEME.error)
                .add_modifier(Modifier::BOLD),
        )));
    } else if let Some(result) = &record.result {
        lines.push(Line::from(vec![
            Span::styled("=> ", Style::default().fg(DEFAULT_THEME.comment)),
            Span::styled(result.repr(), Style::default().fg(DEFAULT_THEME.secondary)),
        ]));
    }
    lines
}

fn binding_line(binding: &BindingSnapshot) -> Line<'static> {
    let marker = if binding.changed { "* " } else { "  " };
    let name_style = if binding.constant {
        Style::default().fg(DEFAULT_THEME.constant)
    } else {
        Style::default().fg(DEFAULT_THEME.fg)
    };
    let value_style = if binding.changed {
        Style::default()
            .fg(DEFAULT_THEME.changed)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(DEFAULT_THEME.fg)
    };

    Line::from(vec![
        Span::styled(marker, Style::default().fg(DEFAULT_THEME.changed)),
        Span::styled(binding.name.clone(), name_style),
        Span::styled(
            format!(": {} = ", binding.value.type_name()),
            Style::default().fg(DEFAULT_THEME.comment),
        ),
        Span::styled(binding.value.repr(), value_style),
    ])
}

/// Lines for the pane body, innermost scope first
pub(crate) fn binding_lines(record: &StepRecord) -> Vec<Line<'static>> {
    let mut lines = step_header(record);

    // Bindings arrive outermost scope first
    let mut scopes: Vec<(ScopeId, Vec<&BindingSnapshot>)> = Vec::new();
    for binding in &record.bindings {
        match scopes.iter_mut().find(|(scope, _)| *scope == binding.scope) {
            Some((_, group)) => group.push(binding),
            None => scopes.push((binding.scope, vec![binding])),
        }
    }

    for (scope, group) in scopes.iter().rev() {
        lines.push(Line::from(""));
        let title = if *scope == GLOBAL_SCOPE_ID {
            "global".to_string()
        } else {
            format!("scope #{}", scope)
        };
        lines.push(Line::from(Span::styled(
            title,
            Style::default()
                .fg(DEFAULT_THEME.primary)
                .add_modifier(Modifier::BOLD),
        )));
        lines.extend(group.iter().map(|binding| binding_line(binding)));
    }
    lines
}

/// Render the bindings pane
pub fn render_bindings_pane(
    frame: &mut Frame,
    area: Rect,
    record: &StepRecord,
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
        .title(" Bindings ")
        .borders(Borders::ALL)
        .border_style(border_style);

    let lines = binding_lines(record);
    let visible_height = area.height.saturating_sub(2).max(1) as usize;
    *scroll_offset = (*scroll_offset).min(lines.len().saturating_sub(visible_height));

    let visible: Vec<Line> = lines
        .into_iter()
        .skip(*scroll_offset)
        .take(visible_height)
        .collect();
    frame.render_widget(Paragraph::new(visible).block(block), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::limits::Limits;
    use crate::snapshot::prepare;

    fn text(line: &Line<'_>) -> String {
        line.spans.iter().map(|span| span.content.as_ref()).collect()
    }

    #[test]
    fn test_innermost_scope_listed_first() {
        let trace = match prepare("let a = 1; { let b = 2; b; }", &Limits::default()) {
            Ok(trace) => trace,
            Err(err) => panic!("prepare failed: {}", err),
        };
        // Deepest point: inside the block, after `b` is declared
        let record = trace
            .records()
            .iter()
            .find(|r| r.binding("b").is_some())
            .cloned();
        let record = match record {
            Some(record) => record,
            None => panic!("no record sees b"),
        };

        let rendered: Vec<String> = binding_lines(&record).iter().map(text).collect();
        let b_at = rendered.iter().position(|l| l.contains("b: integer = 2"));
        let a_at = rendered.iter().position(|l| l.contains("a: integer = 1"));
        assert!(b_at.is_some() && a_at.is_some());
        assert!(b_at < a_at);
        assert!(rendered.iter().any(|l| l == "global"));
    }
}
