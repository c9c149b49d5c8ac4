//! Cancellable scheduled tasks on simulated time
//!
//! The clock only moves when [`Timers::advance`] is called, so timers pause
//! with the game and replay deterministically. Due tasks are handed out one
//! at a time by [`Timers::pop_due`]; a task cancelled while handling an
//! earlier one never fires.

/// Slack when comparing accumulated f32 steps against due times
const DUE_EPSILON: f64 = 1e-6;

/// Identifies a scheduled task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(u64);

/// A task that came due
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerEvent<K> {
    pub handle: TimerHandle,
    pub kind: K,
}

#[derive(Debug, Clone)]
struct Scheduled<K> {
    handle: TimerHandle,
    due: f64,
    /// Repeat interval, `None` for one-shot tasks
    interval: Option<f64>,
    kind: K,
}

/// Timer set keyed by handle
#[derive(Debug, Clone)]
pub struct Timers<K> {
    now: f64,
    next_id: u64,
    tasks: Vec<Scheduled<K>>,
}

impl<K> Default for Timers<K> {
    fn default() -> Self {
        Self {
            now: 0.0,
            next_id: 1,
            tasks: Vec::new(),
        }
    }
}

impl<K: Copy> Timers<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seconds of simulated time elapsed
    pub fn now(&self) -> f64 {
        self.now
    }

    fn push(&mut self, delay: f32, interval: Option<f32>, kind: K) -> TimerHandle {
        let handle = TimerHandle(self.next_id);
        self.next_id += 1;
        self.tasks.push(Scheduled {
            handle,
            due: self.now + delay as f64,
            interval: interval.map(f64::from),
            kind,
        });
        handle
    }

    /// Fire `kind` once after `delay` seconds
    pub fn schedule_once(&mut self, delay: f32, kind: K) -> TimerHandle {
        self.push(delay, None, kind)
    }

    /// Fire `kind` every `interval` seconds, first after one interval
    pub fn schedule_repeating(&mut self, interval: f32, kind: K) -> TimerHandle {
        debug_assert!(interval > 0.0, "repeat interval must be positive");
        self.push(interval, Some(interval), kind)
    }

    /// Cancel a task. Returns false if it already fired or was cancelled.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.handle != handle);
        self.tasks.len() != before
    }

    pub fn is_pending(&self, handle: TimerHandle) -> bool {
        self.tasks.iter().any(|t| t.handle == handle)
    }

    /// Number of live tasks
    pub fn pending(&self) -> usize {
        self.tasks.len()
    }

    /// Move the clock forward
    pub fn advance(&mut self, dt: f32) {
        self.now += dt as f64;
    }

    /// Take the earliest due task, rescheduling it if it repeats
    pub fn pop_due(&mut self) -> Option<TimerEvent<K>> {
        let now = self.now;
        let idx = self
            .tasks
            .iter()
            .enumerate()
            .filter(|(_, t)| t.due <= now + DUE_EPSILON)
            .min_by(|(_, a), (_, b)| {
                a.due
                    .partial_cmp(&b.due)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then(a.handle.0.cmp(&b.handle.0))
            })
            .map(|(i, _)| i)?;

        let event = TimerEvent {
            handle: self.tasks[idx].handle,
            kind: self.tasks[idx].kind,
        };
        match self.tasks[idx].interval {
            Some(interval) => self.tasks[idx].due += interval,
            None => {
                self.tasks.swap_remove(idx);
            }
        }
        Some(event)
    }
}
