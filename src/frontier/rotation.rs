//! Rotating host cache with a rotation-wide politeness budget

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Fixed-capacity host rotation enforcing the crawl-delay budget
///
/// Hosts rotate front-to-back; one full pass over the rotation is a cycle.
/// The politeness contract is cycle-wide: if any URL was handed out during a
/// cycle, the remainder of the crawl delay is slept off before the next cycle
/// starts, which guarantees no host is hit more than once per delay period.
/// Idle cycles owe no sleep.
///
/// Cycles that finish early while productive grow the capacity by one (up to
/// the configured ceiling), letting the scheduler discover how much
/// parallelism the backlog supports.
pub struct HostRotation {
    hosts: VecDeque<String>,
    capacity: usize,
    max_capacity: usize,
    auto_grow: bool,
    crawl_delay: Duration,
    /// Dequeues since the current cycle started
    iterations: usize,
    cycle_started: Instant,
    handed_out: bool,
}

impl HostRotation {
    pub fn new(capacity: usize, max_capacity: usize, auto_grow: bool, crawl_delay_ms: u64) -> Self {
        Self {
            hosts: VecDeque::new(),
            capacity,
            max_capacity,
            auto_grow,
            crawl_delay: Duration::from_millis(crawl_delay_ms),
            iterations: 0,
            cycle_started: Instant::now(),
            handed_out: false,
        }
    }

    /// Current capacity, also used as the per-host URL batch size
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn has_room(&self) -> bool {
        self.hosts.len() < self.capacity
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }

    pub fn contains(&self, hostname: &str) -> bool {
        self.hosts.iter().any(|h| h == hostname)
    }

    pub fn push(&mut self, hostname: String) {
        self.hosts.push_back(hostname);
    }

    /// Rotates to the next host, moving it to the back of the queue
    pub fn advance(&mut self) -> Option<String> {
        let host = self.hosts.pop_front()?;
        self.hosts.push_back(host.clone());
        self.iterations += 1;
        Some(host)
    }

    /// Drops an exhausted host from the rotation
    pub fn remove(&mut self, hostname: &str) {
        self.hosts.retain(|h| h != hostname);
    }

    /// Notes that the current cycle handed out a URL
    pub fn record_handout(&mut self) {
        self.handed_out = true;
    }

    /// True once every host in the rotation was visited this cycle
    pub fn cycle_complete(&self) -> bool {
        !self.hosts.is_empty() && self.iterations >= self.hosts.len()
    }

    /// Closes the cycle, returning how long the caller must sleep
    ///
    /// The sleep is the unspent part of the crawl-delay budget, owed only if
    /// the cycle handed out at least one URL. A productive cycle that came in
    /// under budget also grows the capacity when auto-grow is on.
    pub fn finish_cycle(&mut self) -> Option<Duration> {
        let remainder = self.crawl_delay.checked_sub(self.cycle_started.elapsed());

        if self.auto_grow
            && self.handed_out
            && remainder.is_some()
            && self.capacity < self.max_capacity
        {
            self.capacity += 1;
            tracing::debug!("Grew host rotation capacity to {}", self.capacity);
        }

        let sleep = if self.handed_out { remainder } else { None };

        self.iterations = 0;
        self.handed_out = false;
        self.cycle_started = Instant::now();
        sleep
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rotation_with(hosts: &[&str], capacity: usize) -> HostRotation {
        let mut rotation = HostRotation::new(capacity, capacity * 4, true, 10_000);
        for h in hosts {
            rotation.push(h.to_string());
        }
        rotation
    }

    #[test]
    fn test_advance_rotates_front_to_back() {
        let mut rotation = rotation_with(&["a", "b"], 2);
        assert_eq!(rotation.advance().as_deref(), Some("a"));
        assert_eq!(rotation.advance().as_deref(), Some("b"));
        assert_eq!(rotation.advance().as_deref(), Some("a"));
    }

    #[test]
    fn test_cycle_completes_after_full_pass() {
        let mut rotation = rotation_with(&["a", "b"], 2);
        rotation.advance();
        assert!(!rotation.cycle_complete());
        rotation.advance();
        assert!(rotation.cycle_complete());
    }

    #[test]
    fn test_idle_cycle_owes_no_sleep() {
        let mut rotation = rotation_with(&["a"], 1);
        rotation.advance();
        assert_eq!(rotation.finish_cycle(), None);
    }

    #[test]
    fn test_productive_cycle_owes_budget_remainder() {
        let mut rotation = rotation_with(&["a"], 1);
        rotation.advance();
        rotation.record_handout();
        let sleep = rotation.finish_cycle().unwrap();
        assert!(sleep <= Duration::from_millis(10_000));
        assert!(sleep > Duration::from_millis(9_000));
    }

    #[test]
    fn test_productive_on_time_cycle_grows_capacity() {
        let mut rotation = rotation_with(&["a"], 1);
        rotation.advance();
        rotation.record_handout();
        rotation.finish_cycle();
        assert_eq!(rotation.capacity(), 2);
    }

    #[test]
    fn test_idle_cycle_does_not_grow_capacity() {
        let mut rotation = rotation_with(&["a"], 1);
        rotation.advance();
        rotation.finish_cycle();
        assert_eq!(rotation.capacity(), 1);
    }

    #[test]
    fn test_growth_respects_ceiling() {
        let mut rotation = HostRotation::new(2, 2, true, 10_000);
        rotation.push("a".to_string());
        rotation.advance();
        rotation.record_handout();
        rotation.finish_cycle();
        assert_eq!(rotation.capacity(), 2);
    }

    #[test]
    fn test_growth_can_be_disabled() {
        let mut rotation = HostRotation::new(1, 8, false, 10_000);
        rotation.push("a".to_string());
        rotation.advance();
        rotation.record_handout();
        rotation.finish_cycle();
        assert_eq!(rotation.capacity(), 1);
    }

    #[test]
    fn test_remove_drops_host() {
        let mut rotation = rotation_with(&["a", "b"], 2);
        rotation.remove("a");
        assert!(!rotation.contains("a"));
        assert_eq!(rotation.advance().as_deref(), Some("b"));
    }

    #[test]
    fn test_finish_resets_cycle_state() {
        let mut rotation = rotation_with(&["a"], 1);
        rotation.advance();
        rotation.record_handout();
        rotation.finish_cycle();
        rotation.advance();
        // fresh cycle with no handouts yet
        assert_eq!(rotation.finish_cycle(), None);
    }
}
