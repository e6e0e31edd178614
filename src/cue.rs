use std::time::Duration;

/// A single timed caption.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cue {
    pub(crate) start: Duration,
    pub(crate) end: Duration,
    pub(crate) text: String,
}

impl Cue {
    pub fn new(start: Duration, end: Duration, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            text: text.into(),
        }
    }

    pub fn start(&self) -> Duration {
        self.start
    }

    pub fn end(&self) -> Duration {
        self.end
    }

    pub fn start_secs(&self) -> f64 {
        self.start.as_secs_f64()
    }

    pub fn end_secs(&self) -> f64 {
        self.end.as_secs_f64()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Both bounds are inclusive.
    pub fn contains(&self, t: Duration) -> bool {
        self.start <= t && t <= self.end
    }
}

/// First cue in sequence order whose interval contains `t`.
pub fn find_active(cues: &[Cue], t: Duration) -> Option<&Cue> {
    cues.iter().find(|c| c.contains(t))
}
