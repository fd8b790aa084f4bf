//! Virtual-clock timer queue for deferred round callbacks
//!
//! Browsers get real `setTimeout`s; the headless driver and tests use this
//! instead so time only moves when they say so.

use super::state::Deferred;

#[derive(Debug, Clone, Copy)]
struct Pending {
    due_ms: f64,
    /// Insertion order, to keep equal deadlines FIFO
    seq: u64,
    deferred: Deferred,
}

/// One-shot timers ordered by deadline
#[derive(Debug, Default)]
pub struct TimerQueue {
    pending: Vec<Pending>,
    next_seq: u64,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `deferred` to fire `delay_ms` after `now_ms`
    pub fn schedule(&mut self, now_ms: f64, delay_ms: f64, deferred: Deferred) {
        self.pending.push(Pending {
            due_ms: now_ms + delay_ms.max(0.0),
            seq: self.next_seq,
            deferred,
        });
        self.next_seq += 1;
    }

    /// Remove and return every timer due at `now_ms`, earliest first
    pub fn due(&mut self, now_ms: f64) -> Vec<Deferred> {
        let (mut ready, rest): (Vec<Pending>, Vec<Pending>) =
            self.pending.drain(..).partition(|p| p.due_ms <= now_ms);
        self.pending = rest;
        ready.sort_by(|a, b| a.due_ms.total_cmp(&b.due_ms).then(a.seq.cmp(&b.seq)));
        ready.into_iter().map(|p| p.deferred).collect()
    }

    /// Deadline of the earliest pending timer
    pub fn next_due(&self) -> Option<f64> {
        self.pending.iter().map(|p| p.due_ms).min_by(f64::total_cmp)
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::DeferredAction;

    fn deferred(round_id: u64, action: DeferredAction) -> Deferred {
        Deferred { round_id, action }
    }

    #[test]
    fn test_fires_in_deadline_order() {
        let mut timers = TimerQueue::new();
        timers.schedule(0.0, 4000.0, deferred(1, DeferredAction::FinishCelebration));
        timers.schedule(0.0, 500.0, deferred(1, DeferredAction::ShowCelebration));
        assert_eq!(timers.next_due(), Some(500.0));
        assert!(timers.due(100.0).is_empty());

        let fired = timers.due(10_000.0);
        assert_eq!(
            fired,
            vec![
                deferred(1, DeferredAction::ShowCelebration),
                deferred(1, DeferredAction::FinishCelebration),
            ]
        );
        assert!(timers.is_empty());
    }

    #[test]
    fn test_equal_deadlines_are_fifo() {
        let mut timers = TimerQueue::new();
        timers.schedule(100.0, 0.0, deferred(1, DeferredAction::ShowCelebration));
        timers.schedule(100.0, 0.0, deferred(2, DeferredAction::ShowCelebration));
        let fired = timers.due(100.0);
        assert_eq!(fired[0].round_id, 1);
        assert_eq!(fired[1].round_id, 2);
        assert_eq!(timers.len(), 0);
    }
}
