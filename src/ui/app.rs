//! Main TUI application state and logic

use crate::snapshot::{Navigator, Outcome};
use crate::ui::panes::{self, SourceScrollState, StatusRenderData};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout},
    Frame, Terminal,
};
use std::io;
use std::time::{Duration, Instant};

const PLAY_INTERVAL: Duration = Duration::from_millis(400);

/// Which pane is currently focused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusedPane {
    Source,
    Bindings,
    Console,
}

impl FocusedPane {
    /// Move focus to the next pane (source -> console -> bindings)
    pub fn next(self) -> Self {
        match self {
            FocusedPane::Source => FocusedPane::Console,
            FocusedPane::Console => FocusedPane::Bindings,
            FocusedPane::Bindings => FocusedPane::Source,
        }
    }
}

/// The main application state
pub struct App {
    pub navigator: Navigator,

    /// The source code being stepped through
    pub source_code: String,

    pub focused_pane: FocusedPane,

    pub source_scroll: SourceScrollState,
    pub bindings_scroll: usize,
    pub console_scroll: usize,

    pub should_quit: bool,

    /// Status message to display
    pub status_message: String,

    /// Whether auto-play mode is active
    pub is_playing: bool,

    /// Last time a step was taken in play mode
    pub last_play_time: Instant,
}

impl App {
    pub fn new(navigator: Navigator, source_code: String) -> Self {
        let status_message = match navigator.trace().outcome() {
            Outcome::Completed(_) => format!("Recorded {} steps", navigator.len()),
            Outcome::Halted(err) => format!("Recorded {} steps, halted: {}", navigator.len(), err),
        };
        App {
            navigator,
            source_code,
            focused_pane: FocusedPane::Source,
            source_scroll: SourceScrollState {
                offset: 0,
                target_line_row: None,
            },
            bindings_scroll: 0,
            console_scroll: usize::MAX,
            should_quit: false,
            status_message,
            is_playing: false,
            last_play_time: Instant::now(),
        }
    }

    /// Run the TUI application
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        loop {
            terminal.draw(|f| self.render(f))?;

            if self.should_quit {
                break;
            }

            if self.is_playing && self.last_play_time.elapsed() >= PLAY_INTERVAL {
                if self.navigator.is_complete() {
                    self.is_playing = false;
                    self.status_message = "Playback complete".to_string();
                } else {
                    self.navigator.advance();
                    self.status_message = "Playing...".to_string();
                    self.console_scroll = usize::MAX;
                }
                self.last_play_time = Instant::now();
            }

            // Poll with a timeout so auto-play keeps ticking
            if event::poll(Duration::from_millis(50))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key_event(key);
                    }
                }
            }
        }

        Ok(())
    }

    fn render(&mut self, frame: &mut Frame) {
        let main_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(1)])
            .split(frame.area());

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(main_chunks[0]);

        // Left column: Source (top) | Console (bottom)
        let left_rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(70), Constraint::Percentage(30)])
            .split(columns[0]);

        let state = self.navigator.current_state();
        let is_error = state.record.is_error();

        panes::render_source_pane(
            frame,
            left_rows[0],
            &self.source_code,
            state.record.span(),
            is_error,
            self.focused_pane == FocusedPane::Source,
            &mut self.source_scroll,
        );

        panes::render_console_pane(
            frame,
            left_rows[1],
            state.output,
            self.focused_pane == FocusedPane::Console,
            &mut self.console_scroll,
        );

        panes::render_bindings_pane(
            frame,
            columns[1],
            state.record,
            self.focused_pane == FocusedPane::Bindings,
            &mut self.bindings_scroll,
        );

        panes::render_status_bar(
            frame,
            main_chunks[1],
            &StatusRenderData {
                message: &self.status_message,
                current_step: state.cursor,
                total_steps: self.navigator.len(),
                is_error,
                is_playing: self.is_playing,
            },
        );
    }

    fn handle_key_event(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q') => {
                self.should_quit = true;
            }
            KeyCode::Tab => {
                self.focused_pane = self.focused_pane.next();
            }
            KeyCode::Left => {
                self.is_playing = false;
                let cursor = self.navigator.retreat().cursor;
                self.status_message = format!("Stepped back to {}", cursor + 1);
                self.console_scroll = usize::MAX;
            }
            KeyCode::Right => {
                self.is_playing = false;
                self.step_forward();
            }
            KeyCode::Char('s') => {
                self.is_playing = false;
                let cursor = self.navigator.step_over().cursor;
                self.status_message = format!("Stepped over to {}", cursor + 1);
                self.console_scroll = usize::MAX;
            }
            KeyCode::Up => self.scroll(-1),
            KeyCode::Down => self.scroll(1),
            KeyCode::Char(' ') => {
                self.is_playing = !self.is_playing;
                self.status_message = if self.is_playing { "Playing..." } else { "Paused" }.to_string();
                self.last_play_time = Instant::now();
            }
            KeyCode::Enter => {
                self.is_playing = false;
                self.navigator.seek_to_end();
                self.status_message = "Jumped to end".to_string();
                self.console_scroll = usize::MAX;
            }
            KeyCode::Backspace => {
                self.is_playing = false;
                self.navigator.rewind();
                self.status_message = "Jumped to start".to_string();
                self.console_scroll = usize::MAX;
            }
            _ => {}
        }
    }

    fn step_forward(&mut self) {
        if self.navigator.is_complete() {
            self.status_message = "Already at the last step".to_string();
            return;
        }
        let state = self.navigator.advance();
        self.status_message = match &state.record.error {
            Some(err) => format!("Halted: {}", err),
            None => format!("Stepped to {}", state.cursor + 1),
        };
        self.console_scroll = usize::MAX;
    }

    fn scroll(&mut self, delta: isize) {
        match self.focused_pane {
            FocusedPane::Source => {
                // Scrolling moves the pinned current line the opposite way
                if let Some(row) = self.source_scroll.target_line_row {
                    self.source_scroll.target_line_row = Some(row.saturating_add_signed(-delta));
                }
            }
            FocusedPane::Bindings => {
                self.bindings_scroll = self.bindings_scroll.saturating_add_signed(delta);
            }
            FocusedPane::Console => {
                self.console_scroll = self.console_scroll.saturating_add_signed(delta);
            }
        }
    }
}
