use rand::Rng;
use tokio::time::Duration;
use tokio::time::Instant;

/// Deadline with a randomized grace window.
///
/// Followers wait `failure_timeout` plus a per-view jitter drawn from
/// `jitter_range` before turning on the leader; the jitter keeps members
/// from flooding competing candidate views at the same instant.
#[derive(Clone, Debug)]
pub(crate) struct ProgressTimer {
    next_deadline: Instant,
    base_timeout: Duration,
    jitter_range: (u64, u64),
}

impl ProgressTimer {
    /// @param jitter_range: (election_timeout_min_ms, election_timeout_max_ms)
    pub(crate) fn new(
        base_timeout: Duration,
        jitter_range: (u64, u64),
    ) -> Self {
        let mut timer = Self {
            next_deadline: Instant::now(),
            base_timeout,
            jitter_range,
        };
        timer.reset();
        timer
    }

    pub(crate) fn reset(&mut self) {
        let (min, max) = self.jitter_range;
        self.next_deadline = Instant::now() + self.base_timeout + Self::random_duration(min, max);
    }

    pub(crate) fn random_duration(
        min: u64,
        max: u64,
    ) -> Duration {
        let mut rng = rand::thread_rng();
        Duration::from_millis(rng.gen_range(min..max))
    }

    pub(crate) fn is_expired(&self) -> bool {
        self.next_deadline <= Instant::now()
    }
}
