//! Line-based playback controls for terminal playback.
//!
//! `c` toggles captions, `p` pauses or resumes, `s <secs>` seeks.

use crate::clock::{PlaybackClock, WallClock};
use crate::player::CaptionToggle;

use std::io::BufRead;
use std::time::Duration;

use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlaybackCommand {
    ToggleCaptions,
    PauseResume,
    Seek(Duration),
}

/// `None` for blank lines.
pub fn parse_command(line: &str) -> Option<Result<PlaybackCommand, String>> {
    let mut words = line.split_whitespace();
    let command = words.next()?;
    let parsed = match command.to_ascii_lowercase().as_str() {
        "c" | "cc" | "captions" => Ok(PlaybackCommand::ToggleCaptions),
        "p" | "pause" | "play" => Ok(PlaybackCommand::PauseResume),
        "s" | "seek" => match words.next() {
            Some(secs) => secs
                .parse::<f64>()
                .ok()
                .and_then(|s| Duration::try_from_secs_f64(s).ok())
                .map(PlaybackCommand::Seek)
                .ok_or_else(|| format!("invalid seek position '{}'", secs)),
            None => Err("usage: s <seconds>".to_string()),
        },
        other => Err(format!(
            "unknown command '{}' (c: captions, p: pause/resume, s <secs>: seek)",
            other
        )),
    };
    Some(parsed)
}

/// Applies `command` and returns a short description of the new state.
pub fn apply(command: PlaybackCommand, clock: &WallClock, toggle: &CaptionToggle) -> String {
    match command {
        PlaybackCommand::ToggleCaptions => {
            let enabled = !toggle.is_enabled();
            toggle.set(enabled);
            if enabled {
                "captions on".to_string()
            } else {
                "captions off".to_string()
            }
        }
        PlaybackCommand::PauseResume => {
            if clock.is_paused() {
                clock.resume();
                format!("playing at {:.1}s", clock.current_time().as_secs_f64())
            } else {
                clock.pause();
                format!("paused at {:.1}s", clock.current_time().as_secs_f64())
            }
        }
        PlaybackCommand::Seek(position) => {
            clock.seek(position);
            format!("seeked to {:.1}s", position.as_secs_f64())
        }
    }
}

/// Reads stdin on a dedicated thread so a pending read never holds up
/// runtime shutdown. The channel closes at end of input.
pub fn spawn_stdin_reader() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            match line {
                Ok(line) => {
                    if tx.send(line).is_err() {
                        break;
                    }
                }
                Err(err) => {
                    tracing::warn!(error = %err, "stopped reading playback controls");
                    break;
                }
            }
        }
    });
    rx
}
