//! Terminal setup, input forwarding and frame scheduling.
//!
//! [`Tui`] owns the ratatui terminal. Keyboard input and coalesced redraw
//! requests arrive on a single [`TuiEvent`] channel that the application
//! loop selects on next to the tracker's event channel.

use anyhow::Result;
use crossterm::event::DisableBracketedPaste;
use crossterm::event::EnableBracketedPaste;
use crossterm::event::Event as TermEvent;
use crossterm::event::EventStream;
use crossterm::event::KeyEvent;
use crossterm::execute;
use crossterm::terminal::disable_raw_mode;
use crossterm::terminal::enable_raw_mode;
use crossterm::terminal::EnterAlternateScreen;
use crossterm::terminal::LeaveAlternateScreen;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use std::io::stdout;
use std::io::Stdout;
use std::time::Duration;
use tokio::select;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tokio_stream::StreamExt;

pub type TerminalBackend = CrosstermBackend<Stdout>;

/// Input the application loop reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TuiEvent {
    Key(KeyEvent),
    /// Bracketed paste, e.g. a file path dropped onto the terminal.
    Paste(String),
    Draw,
}

pub struct Tui {
    terminal: Terminal<TerminalBackend>,
    frame_requester: FrameRequester,
    tasks: Vec<JoinHandle<()>>,
    restored: bool,
}

impl Tui {
    /// Enter raw mode and the alternate screen.
    ///
    /// Returns the terminal together with the receiver of its input and
    /// redraw events.
    pub fn init() -> Result<(Self, UnboundedReceiver<TuiEvent>)> {
        enable_raw_mode()?;
        execute!(stdout(), EnableBracketedPaste, EnterAlternateScreen)?;
        set_panic_hook();

        let terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

        let (events_tx, events_rx) = unbounded_channel();
        let (schedule_tx, schedule_rx) = unbounded_channel();
        let tasks = vec![
            spawn_input_forwarder(events_tx.clone()),
            spawn_frame_scheduler(schedule_rx, events_tx),
        ];

        let tui = Self {
            terminal,
            frame_requester: FrameRequester { schedule_tx },
            tasks,
            restored: false,
        };
        Ok((tui, events_rx))
    }

    /// Leave raw mode and the alternate screen. Safe to call twice.
    pub fn restore(&mut self) -> Result<()> {
        if self.restored {
            return Ok(());
        }
        self.restored = true;
        for task in self.tasks.drain(..) {
            task.abort();
        }
        disable_raw_mode()?;
        execute!(stdout(), DisableBracketedPaste, LeaveAlternateScreen)?;
        self.terminal.show_cursor()?;
        Ok(())
    }

    pub fn frame_requester(&self) -> FrameRequester {
        self.frame_requester.clone()
    }

    pub fn draw<F>(&mut self, f: F) -> Result<()>
    where
        F: FnOnce(&mut ratatui::Frame),
    {
        self.terminal.draw(f)?;
        Ok(())
    }
}

impl Drop for Tui {
    fn drop(&mut self) {
        let _ = self.restore();
    }
}

/// Handle for scheduling redraws.
#[derive(Clone, Debug)]
pub struct FrameRequester {
    schedule_tx: UnboundedSender<Instant>,
}

impl FrameRequester {
    pub fn schedule_frame(&self) {
        let _ = self.schedule_tx.send(Instant::now());
    }

    pub fn schedule_frame_in(&self, dur: Duration) {
        let _ = self.schedule_tx.send(Instant::now() + dur);
    }
}

fn spawn_input_forwarder(events_tx: UnboundedSender<TuiEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut input = EventStream::new();
        while let Some(next) = input.next().await {
            let event = match next {
                Ok(TermEvent::Key(key)) => TuiEvent::Key(key),
                Ok(TermEvent::Paste(text)) => TuiEvent::Paste(text),
                Ok(TermEvent::Resize(_, _)) => TuiEvent::Draw,
                Ok(_) => continue,
                Err(err) => {
                    tracing::warn!(error = %err, "terminal input failed");
                    break;
                }
            };
            if events_tx.send(event).is_err() {
                break;
            }
        }
    })
}

/// Coalesce redraw requests: every request made before the earliest pending
/// deadline collapses into one `Draw`.
fn spawn_frame_scheduler(
    mut schedule_rx: UnboundedReceiver<Instant>,
    events_tx: UnboundedSender<TuiEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut deadline: Option<Instant> = None;
        loop {
            let target = deadline.unwrap_or_else(|| Instant::now() + Duration::from_secs(3600));
            select! {
                requested = schedule_rx.recv() => match requested {
                    Some(at) => {
                        deadline = Some(deadline.map_or(at, |current| current.min(at)));
                    }
                    None => break,
                },
                _ = sleep_until(target) => {
                    if deadline.take().is_some() && events_tx.send(TuiEvent::Draw).is_err() {
                        break;
                    }
                }
            }
        }
    })
}

fn set_panic_hook() {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(stdout(), DisableBracketedPaste, LeaveAlternateScreen);
        original_hook(panic_info);
    }));
}
