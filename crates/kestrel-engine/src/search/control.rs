//! Search control: stop flag, node limit, and wall-clock limits.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Controls when a search should stop.
///
/// Checked periodically by the search (every 2048 nodes for the clock) to
/// decide whether to abort. Two clock limits exist:
/// - **soft**: no new iteration is started past it
/// - **hard**: the running iteration is aborted and discarded
pub struct SearchControl {
    stopped: Arc<AtomicBool>,
    start: Instant,
    soft_limit: Option<Duration>,
    hard_limit: Option<Duration>,
    node_limit: Option<u64>,
}

impl SearchControl {
    /// Create control without time limits (`go infinite`, `go depth`).
    pub fn new_infinite(stopped: Arc<AtomicBool>) -> Self {
        Self {
            stopped,
            start: Instant::now(),
            soft_limit: None,
            hard_limit: None,
            node_limit: None,
        }
    }

    /// Create control with time limits; the clock starts immediately.
    pub fn new_timed(stopped: Arc<AtomicBool>, soft: Duration, hard: Duration) -> Self {
        Self {
            stopped,
            start: Instant::now(),
            soft_limit: Some(soft),
            hard_limit: Some(hard.max(soft)),
            node_limit: None,
        }
    }

    /// Also abort once `nodes` nodes have been visited.
    pub fn with_node_limit(mut self, nodes: u64) -> Self {
        self.node_limit = Some(nodes);
        self
    }

    /// Check whether the search should abort immediately.
    ///
    /// Returns `true` if the external stop flag is set, the node limit is
    /// reached, or the hard limit has passed (the clock is read only every
    /// 2048 nodes). Limits set the stop flag so later calls return at once.
    pub fn should_stop(&self, nodes: u64) -> bool {
        if self.stopped.load(Ordering::Relaxed) {
            return true;
        }

        if let Some(limit) = self.node_limit
            && nodes >= limit
        {
            self.stop();
            return true;
        }

        if nodes & 2047 != 0 {
            return false;
        }

        if let Some(hard) = self.hard_limit
            && self.elapsed() >= hard
        {
            self.stop();
            return true;
        }

        false
    }

    /// Check whether iterative deepening should start another iteration,
    /// given how long the last one took.
    ///
    /// Refuses once stopped, once the soft limit has passed, or when twice
    /// the last iteration would run past the hard limit.
    pub fn can_start_iteration(&self, last_iteration: Duration) -> bool {
        if self.stopped.load(Ordering::Relaxed) {
            return false;
        }
        let elapsed = self.elapsed();
        if self.soft_limit.is_some_and(|soft| elapsed >= soft) {
            return false;
        }
        match self.hard_limit {
            Some(hard) => elapsed + last_iteration * 2 <= hard,
            None => true,
        }
    }

    /// Elapsed time since the control was created.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Raise the stop flag.
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::Release);
    }

    /// Whether the stop flag is raised.
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    /// Reference to the shared stop flag.
    pub fn stop_flag(&self) -> &Arc<AtomicBool> {
        &self.stopped
    }
}

impl std::fmt::Debug for SearchControl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchControl")
            .field("stopped", &self.is_stopped())
            .field("soft_limit", &self.soft_limit)
            .field("hard_limit", &self.hard_limit)
            .field("node_limit", &self.node_limit)
            .finish()
    }
}
