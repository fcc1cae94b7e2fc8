//! Keyboard handling.
//!
//! Crossterm events go through [`InputStateMachine`] and come out as [`InputAction`]s. The
//! terminal is polled on a plain thread; the application loop receives the actions over a
//! channel.

use crate::error::{Result, WtailError};
use ratatui::crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;

/// Current input mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputState {
    Navigation,
    /// Typing a filter pattern after `/`
    FilterInput,
}

/// Line scroll direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollDirection {
    Up,
    Down,
}

/// What a key press asks the application to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputAction {
    Scroll {
        direction: ScrollDirection,
        lines: usize,
    },
    PageUp,
    PageDown,
    GoToStart,
    GoToEnd,
    Quit,
    TogglePause,
    Clear,
    ToggleWrap,
    ToggleFollow,
    GrowCapacity,
    ShrinkCapacity,
    StartFilter,
    /// Filter text changed while editing; applied live
    UpdateFilter(String),
    /// Enter: keep the edited filter
    CommitFilter(String),
    /// Esc: restore the filter from before editing
    CancelFilter,
    Resize {
        width: u16,
        height: u16,
    },
    NoAction,
    InvalidInput,
}

fn unmodified(modifiers: KeyModifiers) -> bool {
    !modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT)
}

/// Key binding state machine
pub struct InputStateMachine {
    state: InputState,
    filter_buffer: String,
}

impl InputStateMachine {
    pub fn new() -> Self {
        Self {
            state: InputState::Navigation,
            filter_buffer: String::new(),
        }
    }

    pub fn handle_key_event(&mut self, key_event: KeyEvent) -> InputAction {
        if key_event.kind != KeyEventKind::Press {
            return InputAction::NoAction;
        }

        match self.state {
            InputState::Navigation => self.handle_navigation(key_event),
            InputState::FilterInput => self.handle_filter_input(key_event),
        }
    }

    fn handle_navigation(&mut self, key_event: KeyEvent) -> InputAction {
        let modifiers = key_event.modifiers;
        match key_event.code {
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => InputAction::Quit,
            _ if !unmodified(modifiers) => InputAction::InvalidInput,

            KeyCode::Char('q') => InputAction::Quit,
            KeyCode::Char('p') => InputAction::TogglePause,
            KeyCode::Char('c') => InputAction::Clear,
            KeyCode::Char('w') => InputAction::ToggleWrap,
            KeyCode::Char('f') => InputAction::ToggleFollow,
            KeyCode::Char('+') | KeyCode::Char('=') => InputAction::GrowCapacity,
            KeyCode::Char('-') => InputAction::ShrinkCapacity,
            KeyCode::Char('/') => {
                self.state = InputState::FilterInput;
                self.filter_buffer.clear();
                InputAction::StartFilter
            }

            KeyCode::Char('j') | KeyCode::Down => InputAction::Scroll {
                direction: ScrollDirection::Down,
                lines: 1,
            },
            KeyCode::Char('k') | KeyCode::Up => InputAction::Scroll {
                direction: ScrollDirection::Up,
                lines: 1,
            },
            KeyCode::Char(' ') | KeyCode::PageDown => InputAction::PageDown,
            KeyCode::Char('b') | KeyCode::PageUp => InputAction::PageUp,
            KeyCode::Char('g') | KeyCode::Home => InputAction::GoToStart,
            KeyCode::Char('G') | KeyCode::End => InputAction::GoToEnd,
            KeyCode::Esc => InputAction::NoAction,
            _ => InputAction::InvalidInput,
        }
    }

    fn handle_filter_input(&mut self, key_event: KeyEvent) -> InputAction {
        match key_event.code {
            KeyCode::Esc => self.leave_filter(InputAction::CancelFilter),
            KeyCode::Char('c') if key_event.modifiers.contains(KeyModifiers::CONTROL) => {
                self.leave_filter(InputAction::CancelFilter)
            }
            KeyCode::Enter => {
                let pattern = self.filter_buffer.clone();
                self.leave_filter(InputAction::CommitFilter(pattern))
            }
            KeyCode::Backspace => {
                self.filter_buffer.pop();
                InputAction::UpdateFilter(self.filter_buffer.clone())
            }
            KeyCode::Char(ch) if unmodified(key_event.modifiers) && !ch.is_control() => {
                self.filter_buffer.push(ch);
                InputAction::UpdateFilter(self.filter_buffer.clone())
            }
            _ => InputAction::InvalidInput,
        }
    }

    fn leave_filter(&mut self, action: InputAction) -> InputAction {
        self.state = InputState::Navigation;
        self.filter_buffer.clear();
        action
    }

    pub fn filter_buffer(&self) -> &str {
        &self.filter_buffer
    }

    pub fn state(&self) -> InputState {
        self.state
    }
}

impl Default for InputStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

/// Turns crossterm events into actions, dropping the ones that mean nothing
pub struct InputService {
    state_machine: InputStateMachine,
}

impl InputService {
    pub fn new() -> Self {
        Self {
            state_machine: InputStateMachine::new(),
        }
    }

    /// Wait up to `timeout` for an event, then drain whatever else is already queued
    pub fn poll_actions(&mut self, timeout: Duration) -> Result<Vec<InputAction>> {
        let mut actions = Vec::new();
        let mut wait = timeout;

        while event::poll(wait).map_err(|e| WtailError::ui(format!("input poll: {e}")))? {
            let event = event::read().map_err(|e| WtailError::ui(format!("input read: {e}")))?;
            actions.extend(self.process_event(event));
            wait = Duration::ZERO;
        }

        Ok(actions)
    }

    pub fn process_event(&mut self, event: Event) -> Option<InputAction> {
        let action = match event {
            Event::Key(key_event) => self.state_machine.handle_key_event(key_event),
            Event::Resize(width, height) => InputAction::Resize { width, height },
            _ => InputAction::NoAction,
        };

        match action {
            InputAction::NoAction | InputAction::InvalidInput => None,
            _ => Some(action),
        }
    }
}

impl Default for InputService {
    fn default() -> Self {
        Self::new()
    }
}

/// Poll the terminal on its own thread until `shutdown` is set or the receiver goes away
pub fn spawn_input_thread(
    actions: UnboundedSender<InputAction>,
    shutdown: Arc<AtomicBool>,
    poll_interval: Duration,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let mut keys = InputService::new();
        while !shutdown.load(Ordering::Relaxed) {
            let batch = match keys.poll_actions(poll_interval) {
                Ok(batch) => batch,
                Err(err) => {
                    log::error!("keyboard input stopped: {err}");
                    return;
                }
            };
            if batch.into_iter().any(|action| actions.send(action).is_err()) {
                return;
            }
        }
    })
}
