//! Deadline-based debouncing.
//!
//! Nothing here owns a timer. A debouncer records when its pending work
//! becomes due; the host polls and the owner fires whatever is due. Each
//! pending entry carries the [`Generation`] it was scheduled under, so work
//! scheduled before a pattern switch or teardown can never land afterwards.

/// Cancellation token for deferred work. Bumped whenever the owner's
/// context (active pattern, mounted instance) changes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Generation(u64);

impl Generation {
    pub fn next(self) -> Generation {
        Generation(self.0.wrapping_add(1))
    }

    pub fn value(self) -> u64 {
        self.0
    }

    pub fn from_value(v: u64) -> Generation {
        Generation(v)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Pending {
    due_ms: f64,
    generation: Generation,
}

#[derive(Clone, Debug)]
pub struct Debouncer {
    delay_ms: f64,
    pending: Option<Pending>,
}

impl Debouncer {
    pub fn new(delay_ms: f64) -> Self {
        Debouncer { delay_ms, pending: None }
    }

    /// Cancel-and-reschedule: only the latest request survives.
    pub fn schedule(&mut self, now_ms: f64, generation: Generation) {
        self.pending = Some(Pending { due_ms: now_ms + self.delay_ms, generation });
    }

    /// Returns whether something was pending.
    pub fn cancel(&mut self) -> bool {
        self.pending.take().is_some()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn due_at(&self) -> Option<f64> {
        self.pending.map(|p| p.due_ms)
    }

    /// Consumes the pending entry if it is due. Yields `true` only when it
    /// also belongs to `current`; stale entries are dropped silently.
    pub fn take_due(&mut self, now_ms: f64, current: Generation) -> bool {
        match self.pending {
            Some(p) if p.due_ms <= now_ms => {
                self.pending = None;
                p.generation == current
            }
            _ => false,
        }
    }

    /// Consumes the pending entry regardless of its deadline (flush).
    pub fn take_now(&mut self, current: Generation) -> bool {
        match self.pending.take() {
            Some(p) => p.generation == current,
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reschedule_pushes_deadline_out() {
        let g = Generation::default();
        let mut d = Debouncer::new(300.0);
        d.schedule(0.0, g);
        d.schedule(200.0, g);
        assert!(!d.take_due(300.0, g));
        assert!(d.is_pending());
        assert!(d.take_due(500.0, g));
        assert!(!d.is_pending());
        assert!(!d.take_due(900.0, g));
    }

    #[test]
    fn stale_generation_never_fires() {
        let g = Generation::default();
        let mut d = Debouncer::new(600.0);
        d.schedule(0.0, g);
        assert!(!d.take_due(1000.0, g.next()));
        assert!(!d.is_pending());
    }

    #[test]
    fn flush_ignores_deadline() {
        let g = Generation::default();
        let mut d = Debouncer::new(600.0);
        d.schedule(0.0, g);
        assert!(d.take_now(g));
        assert!(!d.take_now(g));
        assert!(!d.cancel());
    }
}
