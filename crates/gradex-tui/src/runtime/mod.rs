//! TUI runtime - owns terminal, runs event loop, executes effects.
//!
//! This is the "Elm runtime" boundary: all side effects happen here.
//! The reducer stays pure and produces effects; this module executes them.
//!
//! ## Inbox Pattern
//!
//! The runtime uses an "inbox" pattern for async event collection:
//! - Spawned tasks send `UiEvent`s directly to `inbox_tx`
//! - Runtime drains `inbox_rx` each frame
//!
//! The stream task and follow-up requests both report through the inbox.

use std::future::Future;
use std::io::Stdout;

use anyhow::{Context, Result};
use crossterm::event;
use futures_util::StreamExt;
use gradex_core::api::GradingClient;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::warn;

use crate::effects::UiEffect;
use crate::events::{StreamItem, UiEvent};
use crate::state::AppState;
use crate::{render, terminal, update};

/// Target frame rate for streaming updates (60fps = ~16ms per frame).
pub const FRAME_DURATION: std::time::Duration = std::time::Duration::from_millis(16);

/// Poll duration when idle (job settled, nothing in flight).
/// Longer timeout reduces CPU usage when nothing is happening.
pub const IDLE_POLL_DURATION: std::time::Duration = std::time::Duration::from_millis(100);

type UiEventSender = mpsc::UnboundedSender<UiEvent>;
type UiEventReceiver = mpsc::UnboundedReceiver<UiEvent>;

/// Full-screen TUI runtime.
///
/// Owns the terminal and state. Runs the event loop and executes effects.
/// Terminal state is guaranteed to be restored on drop or panic.
pub struct TuiRuntime {
    /// Terminal instance.
    terminal: Terminal<CrosstermBackend<Stdout>>,
    /// Application state.
    pub state: AppState,
    /// API client, cloned into spawned tasks.
    client: GradingClient,
    /// Inbox sender - spawned tasks send events here.
    inbox_tx: UiEventSender,
    /// Inbox receiver - runtime drains this each frame.
    inbox_rx: UiEventReceiver,
    /// Stream subscription task, aborted on exit.
    stream_task: Option<JoinHandle<()>>,
    /// Last time a Tick event was emitted.
    last_tick: std::time::Instant,
    /// Last time a terminal event was received (for fast tick during interaction).
    last_terminal_event: std::time::Instant,
}

impl TuiRuntime {
    /// Creates a new TUI runtime watching one job.
    pub fn new(client: GradingClient, job_id: String) -> Result<Self> {
        // Set up panic hook BEFORE entering alternate screen
        terminal::install_panic_hook();

        // Enter alternate screen and raw mode
        let terminal = terminal::setup_terminal().context("Failed to setup terminal")?;

        let state = AppState::new(job_id);

        // Create inbox channel for async event collection
        let (inbox_tx, inbox_rx) = mpsc::unbounded_channel();

        let now = std::time::Instant::now();
        Ok(Self {
            terminal,
            state,
            client,
            inbox_tx,
            inbox_rx,
            stream_task: None,
            last_tick: now,
            last_terminal_event: now,
        })
    }

    /// Runs the main event loop.
    ///
    /// Must be called within a tokio runtime; the stream subscription and
    /// follow-up requests are spawned onto it.
    pub fn run(&mut self) -> Result<()> {
        self.stream_task = Some(self.spawn_stream_task());

        let result = self.event_loop();

        // Quit releases the subscription
        if let Some(task) = self.stream_task.take() {
            task.abort();
        }
        result
    }

    fn event_loop(&mut self) -> Result<()> {
        let mut dirty = true; // Start dirty to ensure initial render

        while !self.state.should_quit {
            // Collect events from various sources
            let mut events = self.collect_events()?;

            // Prepend Frame event with current terminal size
            let size = self.terminal.size()?;
            events.insert(
                0,
                UiEvent::Frame {
                    width: size.width,
                    height: size.height,
                },
            );

            // Process each event through the reducer
            for event in events {
                // Track terminal activity for fast tick mode
                if matches!(&event, UiEvent::Terminal(_)) {
                    self.last_terminal_event = std::time::Instant::now();
                }

                // Only Tick triggers render - this caps frame rate at tick cadence
                // Stream events update state but batch renders to the next Tick
                let marks_dirty = matches!(&event, UiEvent::Tick);

                let effects = update::update(&mut self.state, event);
                if marks_dirty {
                    dirty = true;
                }
                self.execute_effects(effects);
            }

            // Only render if something changed
            if dirty {
                self.terminal.draw(|frame| {
                    render::render(&self.state, frame);
                })?;
                dirty = false;
            }
        }

        Ok(())
    }

    // ========================================================================
    // Event Collection
    // ========================================================================

    /// Collects events from the inbox and the terminal.
    fn collect_events(&mut self) -> Result<Vec<UiEvent>> {
        let mut events = Vec::new();

        // Determine tick interval based on activity level.
        // Use fast polling (60fps) when:
        // - The stream is live and the job is still running
        // - A follow-up answer is in flight (pending spinner)
        // - Recent terminal activity (scrolling, typing)
        // Otherwise use slow polling to save CPU.
        let recent_terminal_activity = self.last_terminal_event.elapsed() < IDLE_POLL_DURATION;
        let needs_fast_poll = self.state.is_streaming()
            || self.state.has_pending_follow_up()
            || recent_terminal_activity;

        let tick_interval = if needs_fast_poll {
            FRAME_DURATION
        } else {
            IDLE_POLL_DURATION
        };

        // Drain inbox - stream items and follow-up results arrive here
        while let Ok(ev) = self.inbox_rx.try_recv() {
            events.push(ev);
        }

        // Calculate time until next tick for poll duration.
        // This ensures we wake up exactly when Tick is due.
        let time_until_tick = tick_interval.saturating_sub(self.last_tick.elapsed());

        // Poll terminal events:
        // - If we already have events to process, do non-blocking poll (don't delay rendering)
        // - Otherwise, block until next tick is due (keeps input responsive while hitting tick cadence)
        let poll_duration = if events.is_empty() {
            time_until_tick
        } else {
            std::time::Duration::ZERO
        };

        if event::poll(poll_duration)? {
            events.push(UiEvent::Terminal(event::read()?));
            // Drain any remaining buffered events (non-blocking)
            while event::poll(std::time::Duration::ZERO)? {
                events.push(UiEvent::Terminal(event::read()?));
            }
        }

        // Emit Tick after poll - we've now waited until the tick interval elapsed
        // (or woke early due to terminal input, in which case we check again)
        if self.last_tick.elapsed() >= tick_interval {
            events.push(UiEvent::Tick);
            self.last_tick = std::time::Instant::now();
        }

        Ok(events)
    }

    /// Spawns the task that owns the stream subscription.
    ///
    /// Decoded events are forwarded into the inbox. Malformed frames are
    /// logged and skipped without disturbing the subscription; connectivity
    /// failures end the task after a single notice.
    fn spawn_stream_task(&self) -> JoinHandle<()> {
        let tx = self.inbox_tx.clone();
        let client = self.client.clone();
        let job_id = self.state.job_id.clone();
        tokio::spawn(async move {
            let mut stream = match client.open_event_stream(&job_id).await {
                Ok(stream) => stream,
                Err(e) => {
                    let _ = tx.send(UiEvent::Stream(StreamItem::ConnectionLost {
                        message: e.to_string(),
                    }));
                    return;
                }
            };
            while let Some(item) = stream.next().await {
                match item {
                    Ok(received) => {
                        let _ = tx.send(UiEvent::Stream(StreamItem::Event(received)));
                    }
                    Err(e) if e.is_connectivity() => {
                        let _ = tx.send(UiEvent::Stream(StreamItem::ConnectionLost {
                            message: e.to_string(),
                        }));
                        return;
                    }
                    Err(e) => {
                        // Malformed frame; the subscription itself is still good.
                        warn!(job_id = %job_id, error = %e, "Dropped malformed job event");
                    }
                }
            }
            let _ = tx.send(UiEvent::Stream(StreamItem::Ended));
        })
    }

    // ========================================================================
    // Effect Dispatch
    // ========================================================================

    /// Executes effects returned by the reducer.
    fn execute_effects(&mut self, effects: Vec<UiEffect>) {
        for effect in effects {
            self.execute_effect(effect);
        }
    }

    /// Spawns an async effect, sending the result event to the inbox.
    fn spawn_effect<F, Fut>(&self, f: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = UiEvent> + Send + 'static,
    {
        let tx = self.inbox_tx.clone();
        tokio::spawn(async move {
            let _ = tx.send(f().await);
        });
    }

    /// Executes a single effect.
    fn execute_effect(&mut self, effect: UiEffect) {
        match effect {
            UiEffect::Quit => {
                self.state.should_quit = true;
            }
            UiEffect::AskFollowUp {
                request,
                context,
                query,
            } => {
                let client = self.client.clone();
                self.spawn_effect(move || async move {
                    let outcome = client
                        .follow_up(&context, &query)
                        .await
                        .map(|answer| answer.answer);
                    UiEvent::FollowUpResult { request, outcome }
                });
            }
        }
    }
}

impl Drop for TuiRuntime {
    fn drop(&mut self) {
        if let Some(task) = self.stream_task.take() {
            task.abort();
        }
        let _ = terminal::restore_terminal();
    }
}
