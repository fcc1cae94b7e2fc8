//! Terminal rendering components.
//!
//! This module hosts the ratatui terminal UI along with the [`LogView`] view model it draws and
//! the color themes.

pub mod renderer;
pub mod state;
pub mod terminal;
pub mod theme;

pub use renderer::UIRenderer;
pub use state::{LogView, ViewLine};
pub use terminal::TerminalUI;
pub use theme::ColorTheme;

#[cfg(test)]
pub use renderer::tests::MockUIRenderer;
