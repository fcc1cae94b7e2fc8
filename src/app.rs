//! Application orchestration layer
//!
//! Wires a byte source, the shared [`TailEngine`], its [`PollScheduler`], terminal input and a
//! renderer together. Two front ends share the same engine and event stream: the interactive
//! ratatui view and the plain line printer.

use crate::config::TailConfig;
use crate::engine::{PollScheduler, SharedEngine, TailEngine};
use crate::error::Result;
use crate::input::{spawn_input_thread, InputAction, ScrollDirection};
use crate::render::protocol::{RenderEvent, TailStatus};
use crate::render::ui::{LogView, UIRenderer};
use crate::render::PlainPrinter;
use crate::source::{ByteSource, OpenMode, SourceFactory};
use std::io::{self, Write};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};
use tokio::sync::Mutex;

const INPUT_POLL_INTERVAL: Duration = Duration::from_millis(50);
/// Redraw cadence so fresh-line highlighting fades without new events
const REDRAW_INTERVAL: Duration = Duration::from_millis(500);

/// Application orchestrator
pub struct Application {
    engine: SharedEngine,
    events: UnboundedReceiver<RenderEvent>,
    scheduler: Option<PollScheduler>,
    config: TailConfig,
}

impl Application {
    pub fn new(config: TailConfig) -> Self {
        let (tx, events) = unbounded_channel();
        let engine = Arc::new(Mutex::new(TailEngine::new(&config, tx)));
        Self {
            engine,
            events,
            scheduler: None,
            config,
        }
    }

    /// Shared handle to the engine
    pub fn engine(&self) -> SharedEngine {
        Arc::clone(&self.engine)
    }

    pub fn config(&self) -> &TailConfig {
        &self.config
    }

    pub fn is_polling(&self) -> bool {
        self.scheduler.as_ref().is_some_and(PollScheduler::is_running)
    }

    /// Open `path` and start polling if it is a live source
    pub async fn open_path(&mut self, path: &Path, mode: OpenMode) -> Result<()> {
        let source = SourceFactory::open(path, mode).await?;
        self.open_source(source).await
    }

    /// Replace the current source: stop polling, reset and load, then poll again if live
    pub async fn open_source(&mut self, source: Box<dyn ByteSource>) -> Result<()> {
        self.stop_polling().await;

        let live = {
            let mut engine = self.engine.lock().await;
            engine.open(source, self.config.initial_lines).await?;
            engine.is_live()
        };

        if live {
            self.scheduler = Some(PollScheduler::start(
                self.engine(),
                self.config.poll_interval(),
            ));
        }
        Ok(())
    }

    pub async fn stop_polling(&mut self) {
        if let Some(scheduler) = self.scheduler.take() {
            scheduler.stop().await;
        }
    }

    /// Apply every queued event to `view`; returns how many were applied
    pub fn drain_events(&mut self, view: &mut LogView) -> usize {
        let mut applied = 0;
        while let Ok(event) = self.events.try_recv() {
            view.apply(event);
            applied += 1;
        }
        applied
    }

    /// Run the interactive terminal view until the user quits
    pub async fn run_tui(&mut self, mut renderer: Box<dyn UIRenderer>) -> Result<()> {
        renderer.initialize()?;

        let (width, height) = renderer.get_terminal_size()?;
        let mut view = LogView::new(width, height);
        view.follow = self.config.follow;
        self.drain_events(&mut view);
        renderer.render(&view)?;

        let (input_tx, mut input_rx) = unbounded_channel();
        let shutdown = Arc::new(AtomicBool::new(false));
        let input_thread = spawn_input_thread(input_tx, Arc::clone(&shutdown), INPUT_POLL_INTERVAL);

        let mut redraw = tokio::time::interval(REDRAW_INTERVAL);
        let mut saved_filter: Option<String> = None;

        let result = loop {
            tokio::select! {
                action = input_rx.recv() => {
                    let Some(action) = action else {
                        break Ok(());
                    };
                    match self.handle_action(action, &mut view, &mut saved_filter).await {
                        Ok(true) => {}
                        Ok(false) => break Ok(()),
                        Err(err) => break Err(err),
                    }
                }
                Some(event) = self.events.recv() => {
                    view.apply(event);
                    self.drain_events(&mut view);
                }
                _ = redraw.tick() => {}
            }

            if let Err(err) = renderer.render(&view) {
                break Err(err);
            }
        };

        shutdown.store(true, Ordering::SeqCst);
        if tokio::task::spawn_blocking(move || input_thread.join())
            .await
            .is_err()
        {
            log::warn!("input thread did not shut down cleanly");
        }
        self.stop_polling().await;
        renderer.cleanup()?;
        result
    }

    /// Handle one input action; returns false when the user asked to quit
    pub async fn handle_action(
        &mut self,
        action: InputAction,
        view: &mut LogView,
        saved_filter: &mut Option<String>,
    ) -> Result<bool> {
        view.message = None;
        let mut engine = self.engine.lock().await;

        match action {
            InputAction::Quit => return Ok(false),
            InputAction::Scroll {
                direction: ScrollDirection::Up,
                lines,
            } => {
                view.scroll_up(lines);
                Self::unfollow(&mut engine, view);
            }
            InputAction::Scroll {
                direction: ScrollDirection::Down,
                lines,
            } => view.scroll_down(lines),
            InputAction::PageUp => {
                view.page_up();
                Self::unfollow(&mut engine, view);
            }
            InputAction::PageDown => view.page_down(),
            InputAction::GoToStart => {
                view.go_to_start();
                Self::unfollow(&mut engine, view);
            }
            InputAction::GoToEnd => {
                engine.set_follow(true);
                view.follow = true;
                view.go_to_end();
            }
            InputAction::TogglePause => {
                if engine.is_paused() {
                    engine.resume();
                } else {
                    engine.pause();
                }
            }
            InputAction::Clear => engine.clear(),
            InputAction::ToggleWrap => {
                let wrap = !engine.wrap();
                engine.set_wrap(wrap);
            }
            InputAction::ToggleFollow => {
                let follow = !engine.follow();
                engine.set_follow(follow);
                view.follow = follow;
                if follow {
                    view.go_to_end();
                }
            }
            InputAction::GrowCapacity => {
                let doubled = engine.max_lines().saturating_mul(2);
                let max_lines = engine.set_max_lines(doubled);
                view.set_message(format!("max lines: {max_lines}"));
            }
            InputAction::ShrinkCapacity => {
                let halved = engine.max_lines() / 2;
                let max_lines = engine.set_max_lines(halved);
                view.set_message(format!("max lines: {max_lines}"));
            }
            InputAction::StartFilter => {
                *saved_filter = Some(engine.filter_pattern().unwrap_or_default().to_string());
                view.prompt = Some(String::new());
            }
            InputAction::UpdateFilter(pattern) => {
                engine.set_filter(&pattern);
                view.prompt = Some(pattern);
            }
            InputAction::CommitFilter(pattern) => {
                engine.set_filter(&pattern);
                view.prompt = None;
                *saved_filter = None;
            }
            InputAction::CancelFilter => {
                engine.set_filter(&saved_filter.take().unwrap_or_default());
                view.prompt = None;
            }
            InputAction::Resize { width, height } => {
                view.resize(width, height);
            }
            InputAction::NoAction | InputAction::InvalidInput => {}
        }

        drop(engine);
        self.drain_events(view);
        Ok(true)
    }

    fn unfollow(engine: &mut TailEngine, view: &mut LogView) {
        if !view.at_end() && engine.follow() {
            engine.set_follow(false);
            view.follow = false;
        }
    }

    /// Print completed lines to `out` until Ctrl-C, or once for snapshots and `once`
    pub async fn run_plain<W: Write>(&mut self, out: W, once: bool) -> Result<()> {
        let mut printer = PlainPrinter::new(out);
        while let Ok(event) = self.events.try_recv() {
            if !Self::print_event(&mut printer, &event)? {
                return Ok(());
            }
        }

        if once || !self.is_polling() {
            Self::finish_plain(&mut printer)?;
            self.stop_polling().await;
            return Ok(());
        }

        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);

        loop {
            tokio::select! {
                event = self.events.recv() => {
                    let Some(event) = event else { break };
                    if !Self::print_event(&mut printer, &event)? {
                        break;
                    }
                }
                _ = &mut ctrl_c => {
                    log::debug!("interrupted");
                    break;
                }
            }
        }

        self.stop_polling().await;
        Ok(())
    }

    /// Returns false once the reader has gone away (broken pipe)
    fn print_event<W: Write>(printer: &mut PlainPrinter<W>, event: &RenderEvent) -> Result<bool> {
        if let RenderEvent::Status(TailStatus::Unavailable(reason)) = event {
            eprintln!("wtail: {reason}");
        }
        match printer.apply(event) {
            Ok(_) => Ok(true),
            Err(err) if err.kind() == io::ErrorKind::BrokenPipe => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    fn finish_plain<W: Write>(printer: &mut PlainPrinter<W>) -> Result<()> {
        match printer.finish() {
            Ok(_) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::BrokenPipe => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}
