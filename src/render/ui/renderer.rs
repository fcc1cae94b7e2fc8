//! Drawing seam between the application loop and the terminal.
//!
//! [`UIRenderer`] takes a finished [`LogView`] and puts it on screen. The application never
//! talks to ratatui directly, so tests can swap in [`tests::MockUIRenderer`].

use crate::error::Result;
use crate::render::ui::state::LogView;

/// Something that can show a [`LogView`]
pub trait UIRenderer {
    /// Draw header, visible lines and the status line (or the filter prompt)
    fn render(&mut self, view: &LogView) -> Result<()>;

    /// Take over the terminal (raw mode, alternate screen)
    fn initialize(&mut self) -> Result<()>;

    /// Give the terminal back; safe to call more than once
    fn cleanup(&mut self) -> Result<()>;

    /// `(columns, rows)`
    fn get_terminal_size(&self) -> Result<(u16, u16)>;
}

#[cfg(test)]
pub mod tests {
    use super::*;

    /// Records frames instead of drawing them
    #[derive(Debug)]
    pub struct MockUIRenderer {
        pub frames: usize,
        pub size: (u16, u16),
        pub active: bool,
        pub last_header: String,
        pub last_lines: Vec<String>,
    }

    impl Default for MockUIRenderer {
        fn default() -> Self {
            Self::new()
        }
    }

    impl MockUIRenderer {
        pub fn new() -> Self {
            Self {
                frames: 0,
                size: (80, 24),
                active: false,
                last_header: String::new(),
                last_lines: Vec::new(),
            }
        }
    }

    impl UIRenderer for MockUIRenderer {
        fn render(&mut self, view: &LogView) -> Result<()> {
            self.frames += 1;
            self.last_header = view.header_text();
            self.last_lines = view.visible().map(|v| v.line.text.clone()).collect();
            Ok(())
        }

        fn initialize(&mut self) -> Result<()> {
            self.active = true;
            Ok(())
        }

        fn cleanup(&mut self) -> Result<()> {
            self.active = false;
            Ok(())
        }

        fn get_terminal_size(&self) -> Result<(u16, u16)> {
            Ok(self.size)
        }
    }

    #[test]
    fn test_mock_records_frames() {
        let mut renderer = MockUIRenderer::new();
        renderer.initialize().unwrap();
        assert!(renderer.active);

        let view = LogView::new(80, 24);
        renderer.render(&view).unwrap();
        renderer.render(&view).unwrap();
        assert_eq!(renderer.frames, 2);
        assert_eq!(renderer.last_header, "no file  [Idle]");
        assert!(renderer.last_lines.is_empty());

        renderer.cleanup().unwrap();
        assert!(!renderer.active);
    }

    #[test]
    fn test_mock_reports_configured_size() {
        let renderer = MockUIRenderer {
            size: (120, 30),
            ..MockUIRenderer::new()
        };
        assert_eq!(renderer.get_terminal_size().unwrap(), (120, 30));
    }
}
