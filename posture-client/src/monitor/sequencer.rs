use tokio::time::{Duration, Instant};

/// Admission control for capture cycles
///
/// At most one cycle is in flight. Results are applied only when they are
/// newer than anything applied or abandoned before them.
#[derive(Debug, Default)]
pub struct Sequencer {
    next_seq: u64,
    in_flight: Option<(u64, Instant)>,
    watermark: u64,
}

impl Sequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a cycle, or `None` while the previous one is still running
    pub fn try_begin(&mut self, now: Instant) -> Option<u64> {
        if self.in_flight.is_some() {
            return None;
        }

        self.next_seq += 1;
        self.in_flight = Some((self.next_seq, now));
        Some(self.next_seq)
    }

    /// Abandon the in-flight cycle if it has run longer than `timeout`
    ///
    /// Its result, should it still arrive, will be ignored.
    pub fn expire_overdue(&mut self, now: Instant, timeout: Duration) -> Option<u64> {
        let (seq, started) = self.in_flight?;

        if now.duration_since(started) < timeout {
            return None;
        }

        self.in_flight = None;
        self.watermark = self.watermark.max(seq);
        Some(seq)
    }

    /// Record that cycle `seq` finished; true if its result should be applied
    pub fn complete(&mut self, seq: u64, succeeded: bool) -> bool {
        if matches!(self.in_flight, Some((current, _)) if current == seq) {
            self.in_flight = None;
        }

        if !succeeded || seq <= self.watermark {
            return false;
        }

        self.watermark = seq;
        true
    }

    #[cfg(test)]
    fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Highest sequence applied or abandoned so far
    #[cfg(test)]
    fn watermark(&self) -> u64 {
        self.watermark
    }
}
