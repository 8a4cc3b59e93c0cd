//! Per-label visibility timers

use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// Time source for the timer registry
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Wall clock
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to
#[derive(Debug)]
pub struct ManualClock {
    origin: Instant,
    offset: Mutex<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
        }
    }

    pub fn advance(&self, by: Duration) {
        *self.offset.lock() += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + *self.offset.lock()
    }
}

/// Whole minutes and seconds an object has been visible
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Elapsed {
    pub minutes: u64,
    pub seconds: u64,
}

impl Elapsed {
    pub fn from_duration(duration: Duration) -> Self {
        let total = duration.as_secs();
        Self {
            minutes: total / 60,
            seconds: total % 60,
        }
    }

    pub fn total_seconds(&self) -> u64 {
        self.minutes * 60 + self.seconds
    }
}

/// Renders as `m:ss`
impl fmt::Display for Elapsed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{:02}", self.minutes, self.seconds)
    }
}

#[derive(Debug, Clone, Copy)]
struct TimerEntry {
    started_at: Instant,
}

/// Tracks how long each label has been continuously present.
///
/// Keyed by label, not by detection instance: two cups in one frame share
/// one timer. A label missing from a single cycle loses its timer.
pub struct TimerRegistry {
    clock: Arc<dyn Clock>,
    entries: HashMap<String, TimerEntry>,
}

impl TimerRegistry {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            entries: HashMap::new(),
        }
    }

    /// Reconcile timers with the labels of the latest detection cycle
    pub fn update<I, S>(&mut self, current_labels: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let now = self.clock.now();
        let current: HashSet<String> = current_labels
            .into_iter()
            .map(|label| label.as_ref().to_string())
            .collect();

        self.entries.retain(|label, _| {
            let keep = current.contains(label);
            if !keep {
                debug!("Timer for '{}' expired", label);
            }
            keep
        });

        for label in current {
            self.entries.entry(label).or_insert_with_key(|label| {
                debug!("Timer for '{}' started", label);
                TimerEntry { started_at: now }
            });
        }
    }

    /// Elapsed visibility for `label`, `None` if it is not tracked
    pub fn elapsed(&self, label: &str) -> Option<Elapsed> {
        let entry = self.entries.get(label)?;
        let now = self.clock.now();
        Some(Elapsed::from_duration(now.saturating_duration_since(entry.started_at)))
    }

    pub fn is_tracking(&self, label: &str) -> bool {
        self.entries.contains_key(label)
    }

    /// Tracked labels in sorted order
    pub fn labels(&self) -> Vec<String> {
        let mut labels: Vec<String> = self.entries.keys().cloned().collect();
        labels.sort();
        labels
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
