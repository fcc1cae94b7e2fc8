//! Color theme and styling definitions using ratatui colors
//!
//! Themes are plain values handed to the terminal UI at construction; there is no global
//! theme state.

use crate::config::ThemeName;
use crate::filter::Severity;
use ratatui::style::{Color, Modifier, Style};

/// Colors and styles for every part of the screen
#[derive(Debug, Clone)]
pub struct ColorTheme {
    /// Log text; `None` keeps the terminal's foreground
    pub normal_text: Option<Color>,

    /// Filter match highlighting
    pub filter_match: Style,

    /// Lines that arrived in the last couple of seconds
    pub fresh_line: Style,

    /// Header line (file name, size, position)
    pub header: Style,

    /// Status line background
    pub status_bg: Color,

    /// Status line text
    pub status_fg: Color,

    /// Capture timestamps in the gutter
    pub timestamp: Option<Color>,

    /// Line numbers in the gutter
    pub line_numbers: Option<Color>,

    /// Severity gutter marks
    pub severity_bad: Color,
    pub severity_caution: Color,
    pub severity_good: Color,

    /// Unavailable status and other error text
    pub error_text: Color,
}

impl Default for ColorTheme {
    fn default() -> Self {
        Self {
            normal_text: None,
            filter_match: Style::default().fg(Color::Black).bg(Color::Yellow),
            fresh_line: Style::default().add_modifier(Modifier::BOLD),
            header: Style::default().fg(Color::Cyan),
            status_bg: Color::Blue,
            status_fg: Color::White,
            timestamp: Some(Color::DarkGray),
            line_numbers: Some(Color::DarkGray),
            severity_bad: Color::Red,
            severity_caution: Color::Yellow,
            severity_good: Color::Green,
            error_text: Color::Red,
        }
    }
}

impl ColorTheme {
    /// Attributes only, for terminals without color
    pub fn monochrome() -> Self {
        Self {
            normal_text: None,
            filter_match: Style::default().add_modifier(Modifier::REVERSED),
            fresh_line: Style::default().add_modifier(Modifier::BOLD),
            header: Style::default().add_modifier(Modifier::BOLD),
            status_bg: Color::Black,
            status_fg: Color::White,
            timestamp: None,
            line_numbers: None,
            severity_bad: Color::White,
            severity_caution: Color::White,
            severity_good: Color::White,
            error_text: Color::White,
        }
    }

    /// Bright foregrounds on a plain background
    pub fn high_contrast() -> Self {
        Self {
            normal_text: Some(Color::White),
            filter_match: Style::default().fg(Color::Black).bg(Color::LightYellow),
            fresh_line: Style::default()
                .fg(Color::LightCyan)
                .add_modifier(Modifier::BOLD),
            header: Style::default()
                .fg(Color::LightCyan)
                .add_modifier(Modifier::BOLD),
            status_bg: Color::White,
            status_fg: Color::Black,
            timestamp: Some(Color::Gray),
            line_numbers: Some(Color::LightGreen),
            severity_bad: Color::LightRed,
            severity_caution: Color::LightYellow,
            severity_good: Color::LightGreen,
            error_text: Color::LightRed,
        }
    }

    pub fn from_name(name: ThemeName) -> Self {
        match name {
            ThemeName::Default => Self::default(),
            ThemeName::Monochrome => Self::monochrome(),
            ThemeName::HighContrast => Self::high_contrast(),
        }
    }

    /// Gutter color for a severity hint; neutral lines get none
    pub fn severity_color(&self, severity: Severity) -> Option<Color> {
        match severity {
            Severity::Bad => Some(self.severity_bad),
            Severity::Caution => Some(self.severity_caution),
            Severity::Good => Some(self.severity_good),
            Severity::Neutral => None,
        }
    }
}
