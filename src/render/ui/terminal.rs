//! Full-screen view drawn with ratatui
//!
//! Draws a [`LogView`]: a header with the source summary and status, the log lines with a
//! gutter (severity mark, capture time, line number), and a status line. Input is read
//! elsewhere, on the input thread.

use crate::error::{Result, WtailError};
use crate::render::format::format_timestamp;
use crate::render::ui::state::{LogView, ViewLine};
use crate::render::ui::{ColorTheme, UIRenderer};
use ratatui::crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Paragraph, Wrap},
    Frame, Terminal,
};
use std::io::{self, Stdout};
use std::time::Instant;

type Screen = Terminal<CrosstermBackend<Stdout>>;

const SEVERITY_MARK: &str = "▌";

/// [`UIRenderer`] for a real terminal; inert until [`UIRenderer::initialize`]
pub struct TerminalUI {
    terminal: Option<Screen>,
    theme: ColorTheme,
}

impl TerminalUI {
    pub fn new() -> Result<Self> {
        Self::with_theme(ColorTheme::default())
    }

    pub fn with_theme(theme: ColorTheme) -> Result<Self> {
        Ok(Self {
            terminal: None,
            theme,
        })
    }

    fn render_header(frame: &mut Frame, area: Rect, view: &LogView, theme: &ColorTheme) {
        let style = if view.status.is_unavailable() {
            theme.header.fg(theme.error_text)
        } else {
            theme.header
        };
        frame.render_widget(Paragraph::new(view.header_text()).style(style), area);
    }

    fn render_content(frame: &mut Frame, area: Rect, view: &LogView, theme: &ColorTheme) {
        let now = Instant::now();
        let lines: Vec<Line> = view
            .visible()
            .map(|view_line| Self::build_line(view_line, theme, now))
            .collect();

        let mut paragraph = Paragraph::new(lines);
        if view.wrap {
            paragraph = paragraph.wrap(Wrap { trim: false });
        }
        frame.render_widget(paragraph, area);
    }

    /// Gutter plus content with filter matches highlighted
    fn build_line<'a>(view_line: &'a ViewLine, theme: &ColorTheme, now: Instant) -> Line<'a> {
        let line = &view_line.line;
        let mut base = Style::default();
        if let Some(color) = theme.normal_text {
            base = base.fg(color);
        }
        if view_line.is_fresh(now) {
            base = base.patch(theme.fresh_line);
        }

        let mut spans = Vec::with_capacity(line.spans.len() * 2 + 5);
        spans.push(match theme.severity_color(line.severity) {
            Some(color) => Span::styled(SEVERITY_MARK, Style::default().fg(color)),
            None => Span::raw(" "),
        });
        spans.push(Span::raw(" "));
        spans.push(Self::gutter_span(
            format_timestamp(&line.captured_at),
            theme.timestamp,
        ));
        spans.push(Span::raw(" "));
        spans.push(Self::gutter_span(
            format!("{:>6} ", line.seq + 1),
            theme.line_numbers,
        ));

        let content = line.text.as_str();
        let mut last_end = 0;
        for &(start, end) in &line.spans {
            let (Some(before), Some(matched)) =
                (content.get(last_end..start), content.get(start..end))
            else {
                continue;
            };
            if !before.is_empty() {
                spans.push(Span::styled(before, base));
            }
            spans.push(Span::styled(matched, base.patch(theme.filter_match)));
            last_end = end;
        }
        if last_end < content.len() {
            spans.push(Span::styled(&content[last_end..], base));
        }

        Line::from(spans)
    }

    fn gutter_span(text: String, color: Option<ratatui::style::Color>) -> Span<'static> {
        match color {
            Some(color) => Span::styled(text, Style::default().fg(color)),
            None => Span::raw(text),
        }
    }

    fn render_status(frame: &mut Frame, area: Rect, view: &LogView, theme: &ColorTheme) {
        let style = Style::default().bg(theme.status_bg).fg(theme.status_fg);
        frame.render_widget(Paragraph::new(view.status_text()).style(style), area);
    }
}

impl UIRenderer for TerminalUI {
    fn render(&mut self, view: &LogView) -> Result<()> {
        if let Some(ref mut terminal) = self.terminal {
            let theme = &self.theme;

            terminal
                .draw(move |frame| {
                    let size = frame.size();
                    let chunks = Layout::default()
                        .direction(Direction::Vertical)
                        .constraints([
                            Constraint::Length(1),
                            Constraint::Min(0),
                            Constraint::Length(1),
                        ])
                        .split(size);

                    Self::render_header(frame, chunks[0], view, theme);
                    Self::render_content(frame, chunks[1], view, theme);
                    Self::render_status(frame, chunks[2], view, theme);
                })
                .map_err(|e| WtailError::ui(format!("draw failed: {e}")))?;
        }
        Ok(())
    }

    fn initialize(&mut self) -> Result<()> {
        let ui_err = |what: &str, e: io::Error| WtailError::ui(format!("{what}: {e}"));

        enable_raw_mode().map_err(|e| ui_err("cannot enable raw mode", e))?;
        let mut out = io::stdout();
        if let Err(e) = execute!(out, EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(ui_err("cannot enter alternate screen", e));
        }
        self.terminal =
            Some(Terminal::new(CrosstermBackend::new(out)).map_err(|e| ui_err("terminal setup", e))?);
        Ok(())
    }

    fn cleanup(&mut self) -> Result<()> {
        let Some(mut screen) = self.terminal.take() else {
            return Ok(());
        };
        disable_raw_mode()?;
        execute!(screen.backend_mut(), LeaveAlternateScreen)?;
        screen.show_cursor()?;
        Ok(())
    }

    fn get_terminal_size(&self) -> Result<(u16, u16)> {
        let (cols, rows) = ratatui::crossterm::terminal::size()
            .map_err(|e| WtailError::ui(format!("cannot query terminal size: {e}")))?;
        Ok((cols, rows))
    }
}

impl Drop for TerminalUI {
    fn drop(&mut self) {
        let _ = self.cleanup();
    }
}
