use crate::clock::PlaybackClock;
use crate::cue::{find_active, Cue};

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(120);

/// What the caption display should show.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Caption {
    Visible(String),
    #[default]
    Hidden,
}

pub trait CaptionSink: Send + Sync {
    fn publish(&self, caption: &Caption);
}

impl CaptionSink for watch::Sender<Caption> {
    fn publish(&self, caption: &Caption) {
        self.send_if_modified(|current| {
            if current == caption {
                false
            } else {
                *current = caption.clone();
                true
            }
        });
    }
}

/// Prints a caption to stdout whenever the displayed text changes.
#[derive(Debug, Default)]
pub struct TerminalSink {
    last: Mutex<Caption>,
}

impl TerminalSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CaptionSink for TerminalSink {
    fn publish(&self, caption: &Caption) {
        let mut last = self.last.lock();
        if *last == *caption {
            return;
        }
        *last = caption.clone();
        if let Caption::Visible(text) = caption {
            let mut out = std::io::stdout().lock();
            // A closed stdout only loses the caption line.
            let _ = writeln!(out, "{}\n", text);
        }
    }
}

/// Shared on/off switch for caption display.
#[derive(Debug, Clone)]
pub struct CaptionToggle(Arc<AtomicBool>);

impl CaptionToggle {
    pub fn new(enabled: bool) -> Self {
        Self(Arc::new(AtomicBool::new(enabled)))
    }

    pub fn set(&self, enabled: bool) {
        self.0.store(enabled, Ordering::SeqCst);
    }

    pub fn is_enabled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

impl Default for CaptionToggle {
    fn default() -> Self {
        Self::new(true)
    }
}

/// The caption for playback position `t`: the first cue containing it, hidden
/// when there is none or its text is empty.
pub fn caption_at(cues: &[Cue], t: Duration) -> Caption {
    match find_active(cues, t) {
        Some(cue) if !cue.text.is_empty() => Caption::Visible(cue.text.clone()),
        _ => Caption::Hidden,
    }
}

struct Active {
    generation: u64,
    cues: Arc<[Cue]>,
}

/// Polls a playback clock and publishes the current caption.
///
/// At most one polling task is alive per player. [`CaptionPlayer::start`]
/// bumps a generation counter under the same lock every tick publishes under,
/// so once it returns no tick of an older loop can reach the sink.
pub struct CaptionPlayer {
    clock: Arc<dyn PlaybackClock>,
    sink: Arc<dyn CaptionSink>,
    toggle: CaptionToggle,
    interval: Duration,
    active: Arc<Mutex<Active>>,
    task: Option<JoinHandle<()>>,
}

impl CaptionPlayer {
    pub fn new(
        clock: Arc<dyn PlaybackClock>,
        sink: Arc<dyn CaptionSink>,
        toggle: CaptionToggle,
        interval: Duration,
    ) -> Self {
        Self {
            clock,
            sink,
            toggle,
            interval: interval.max(Duration::from_millis(1)),
            active: Arc::new(Mutex::new(Active {
                generation: 0,
                cues: Vec::<Cue>::new().into(),
            })),
            task: None,
        }
    }

    pub fn toggle(&self) -> &CaptionToggle {
        &self.toggle
    }

    pub fn cues(&self) -> Arc<[Cue]> {
        self.active.lock().cues.clone()
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().map_or(false, |t| !t.is_finished())
    }

    /// Replaces the active sequence and (re)arms the polling loop.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&mut self, cues: impl Into<Arc<[Cue]>>) {
        let cues = cues.into();
        let count = cues.len();
        let generation = {
            let mut active = self.active.lock();
            active.generation += 1;
            active.cues = cues;
            active.generation
        };
        if let Some(task) = self.task.take() {
            task.abort();
        }

        let clock = Arc::clone(&self.clock);
        let sink = Arc::clone(&self.sink);
        let toggle = self.toggle.clone();
        let active = Arc::clone(&self.active);
        let period = self.interval;

        tracing::info!(
            cues = count,
            generation,
            interval_ms = period.as_millis() as u64,
            "caption loop started"
        );

        self.task = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                let state = active.lock();
                if state.generation != generation {
                    tracing::trace!(generation, "superseded caption loop exiting");
                    break;
                }
                let caption = if toggle.is_enabled() {
                    caption_at(&state.cues, clock.current_time())
                } else {
                    Caption::Hidden
                };
                sink.publish(&caption);
            }
        }));
    }
}

impl Drop for CaptionPlayer {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
