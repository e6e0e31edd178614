use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;

/// Read-only view of the playback position.
pub trait PlaybackClock: Send + Sync {
    fn current_time(&self) -> Duration;
}

/// A clock that only moves when told to.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    position: Arc<Mutex<Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, position: Duration) {
        *self.position.lock() = position;
    }
}

impl PlaybackClock for ManualClock {
    fn current_time(&self) -> Duration {
        *self.position.lock()
    }
}

#[derive(Debug)]
struct WallState {
    offset: Duration,
    resumed_at: Option<Instant>,
}

/// Simulated playback that advances in real time from zero.
#[derive(Debug, Clone)]
pub struct WallClock {
    state: Arc<Mutex<WallState>>,
}

impl WallClock {
    pub fn start() -> Self {
        Self {
            state: Arc::new(Mutex::new(WallState {
                offset: Duration::ZERO,
                resumed_at: Some(Instant::now()),
            })),
        }
    }

    pub fn pause(&self) {
        let mut state = self.state.lock();
        if let Some(resumed_at) = state.resumed_at.take() {
            state.offset += resumed_at.elapsed();
        }
    }

    pub fn resume(&self) {
        let mut state = self.state.lock();
        if state.resumed_at.is_none() {
            state.resumed_at = Some(Instant::now());
        }
    }

    pub fn seek(&self, position: Duration) {
        let mut state = self.state.lock();
        state.offset = position;
        if state.resumed_at.is_some() {
            state.resumed_at = Some(Instant::now());
        }
    }

    pub fn is_paused(&self) -> bool {
        self.state.lock().resumed_at.is_none()
    }
}

impl PlaybackClock for WallClock {
    fn current_time(&self) -> Duration {
        let state = self.state.lock();
        match state.resumed_at {
            Some(resumed_at) => state.offset + resumed_at.elapsed(),
            None => state.offset,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_reports_last_set_position() {
        let clock = ManualClock::new();
        assert_eq!(clock.current_time(), Duration::ZERO);
        clock.set(Duration::from_millis(4_250));
        assert_eq!(clock.clone().current_time(), Duration::from_millis(4_250));
    }

    #[tokio::test(start_paused = true)]
    async fn wall_clock_advances_pauses_and_seeks() {
        let clock = WallClock::start();
        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(clock.current_time(), Duration::from_secs(2));

        clock.pause();
        assert!(clock.is_paused());
        tokio::time::advance(Duration::from_secs(5)).await;
        assert_eq!(clock.current_time(), Duration::from_secs(2));

        clock.seek(Duration::from_secs(10));
        assert_eq!(clock.current_time(), Duration::from_secs(10));

        clock.resume();
        tokio::time::advance(Duration::from_millis(500)).await;
        assert_eq!(clock.current_time(), Duration::from_millis(10_500));

        // Seeking backwards while playing restarts from the new position.
        clock.seek(Duration::from_secs(1));
        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(clock.current_time(), Duration::from_secs(2));
    }
}
