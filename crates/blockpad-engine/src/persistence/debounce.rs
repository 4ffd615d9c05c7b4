//! Per-block debounce with a hard ceiling.
//!
//! Each block is either idle (absent from the map) or pending since its first
//! unsaved edit. A pending block is due once it has been quiet for the quiet
//! period, or once the ceiling has elapsed since the first edit, whichever
//! comes first. Taking a due block returns it to idle.

use std::collections::HashMap;
use std::time::Duration;

use tokio::time::Instant;

use crate::editing::block::BlockKey;

pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_millis(300);
pub const DEFAULT_MAX_WAIT: Duration = Duration::from_millis(2000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Pending {
    since: Instant,
    last_edit: Instant,
}

#[derive(Debug, Clone)]
pub struct DebounceTimers {
    quiet_period: Duration,
    max_wait: Duration,
    pending: HashMap<BlockKey, Pending>,
}

impl DebounceTimers {
    pub fn new(quiet_period: Duration, max_wait: Duration) -> Self {
        Self {
            quiet_period,
            max_wait: max_wait.max(quiet_period),
            pending: HashMap::new(),
        }
    }

    pub fn on_edit(&mut self, key: BlockKey, now: Instant) {
        self.pending
            .entry(key)
            .and_modify(|p| p.last_edit = now)
            .or_insert(Pending {
                since: now,
                last_edit: now,
            });
    }

    pub fn is_pending(&self, key: BlockKey) -> bool {
        self.pending.contains_key(&key)
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    fn deadline(&self, pending: &Pending) -> Instant {
        (pending.last_edit + self.quiet_period).min(pending.since + self.max_wait)
    }

    /// Earliest instant at which some block becomes due
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.values().map(|p| self.deadline(p)).min()
    }

    /// Remove and return every block that is due at `now`
    pub fn take_due(&mut self, now: Instant) -> Vec<BlockKey> {
        let mut due: Vec<(Instant, BlockKey)> = self
            .pending
            .iter()
            .map(|(key, p)| (self.deadline(p), *key))
            .filter(|(deadline, _)| *deadline <= now)
            .collect();
        due.sort();
        for (_, key) in &due {
            self.pending.remove(key);
        }
        due.into_iter().map(|(_, key)| key).collect()
    }

    /// Flush one block immediately; returns whether it was pending
    pub fn take(&mut self, key: BlockKey) -> bool {
        self.pending.remove(&key).is_some()
    }

    /// Remove and return everything pending, regardless of deadlines
    pub fn take_all(&mut self) -> Vec<BlockKey> {
        self.pending.drain().map(|(key, _)| key).collect()
    }

    /// Drop a pending write without flushing it
    pub fn forget(&mut self, key: BlockKey) {
        self.pending.remove(&key);
    }

    pub fn rekey(&mut self, old: BlockKey, new: BlockKey) {
        if let Some(pending) = self.pending.remove(&old) {
            self.pending.insert(new, pending);
        }
    }
}

impl Default for DebounceTimers {
    fn default() -> Self {
        Self::new(DEFAULT_QUIET_PERIOD, DEFAULT_MAX_WAIT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_rapid_edits_coalesce() {
        let mut timers = DebounceTimers::default();
        let key = BlockKey::provisional();
        let start = Instant::now();

        for i in 0..5 {
            timers.on_edit(key, start + ms(i * 100));
        }

        assert!(timers.take_due(start + ms(650)).is_empty());
        assert_eq!(timers.next_deadline(), Some(start + ms(700)));
        assert_eq!(timers.take_due(start + ms(700)), vec![key]);
        assert!(timers.is_empty());
    }

    #[test]
    fn test_continuous_typing_hits_ceiling() {
        let mut timers = DebounceTimers::default();
        let key = BlockKey::provisional();
        let start = Instant::now();

        let mut flushes = Vec::new();
        for i in 0..=25 {
            let now = start + ms(i * 100);
            flushes.extend(timers.take_due(now).into_iter().map(|_| i * 100));
            timers.on_edit(key, now);
        }

        assert_eq!(flushes, vec![2000]);
        // The ceiling restarts with the first edit after the flush
        assert_eq!(timers.next_deadline(), Some(start + ms(2800)));
    }

    #[test]
    fn test_blocks_have_independent_timers() {
        let mut timers = DebounceTimers::default();
        let a = BlockKey::provisional();
        let b = BlockKey::provisional();
        let start = Instant::now();

        timers.on_edit(a, start);
        timers.on_edit(b, start + ms(200));

        assert_eq!(timers.take_due(start + ms(300)), vec![a]);
        assert!(timers.is_pending(b));
        assert_eq!(timers.take_due(start + ms(500)), vec![b]);
    }

    #[test]
    fn test_take_and_forget() {
        let mut timers = DebounceTimers::default();
        let key = BlockKey::provisional();
        timers.on_edit(key, Instant::now());
        assert!(timers.take(key));
        assert!(!timers.take(key));

        timers.on_edit(key, Instant::now());
        timers.forget(key);
        assert_eq!(timers.next_deadline(), None);
    }

    #[test]
    fn test_rekey_moves_pending_state() {
        let mut timers = DebounceTimers::default();
        let old = BlockKey::provisional();
        let new = BlockKey::Persisted(uuid::Uuid::new_v4());
        let start = Instant::now();
        timers.on_edit(old, start);

        timers.rekey(old, new);

        assert!(!timers.is_pending(old));
        assert_eq!(timers.take_due(start + ms(300)), vec![new]);
    }
}
