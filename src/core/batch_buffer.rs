use std::collections::VecDeque;
use std::time::Duration;

use tokio::time::Instant;
use tracing::trace;

/// Groups client operations into one proposal round.
///
/// Flushes when `max_batch_size` fills or `batch_timeout` elapses with
/// pending entries, whichever comes first.
pub(crate) struct BatchBuffer<E> {
    max_batch_size: usize,
    batch_timeout: Duration,
    buffer: VecDeque<E>,
    last_flush: Instant,
}

impl<E> BatchBuffer<E> {
    pub(crate) fn new(
        max_batch_size: usize,
        batch_timeout: Duration,
    ) -> Self {
        Self {
            max_batch_size,
            batch_timeout,
            buffer: VecDeque::with_capacity(max_batch_size),
            last_flush: Instant::now(),
        }
    }

    /// Returns the buffered count when the batch is full and must flush now.
    pub(crate) fn push(
        &mut self,
        entry: E,
    ) -> Option<usize> {
        self.buffer.push_back(entry);
        trace!(
            "BatchBuffer::push, max_batch_size={}, len={}",
            self.max_batch_size,
            self.buffer.len()
        );
        if self.buffer.len() >= self.max_batch_size {
            Some(self.buffer.len())
        } else {
            None
        }
    }

    pub(crate) fn should_flush(&self) -> bool {
        !self.buffer.is_empty() && self.last_flush.elapsed() > self.batch_timeout
    }

    pub(crate) fn take(&mut self) -> VecDeque<E> {
        self.last_flush = Instant::now();
        std::mem::take(&mut self.buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// # Case 1: pushing to capacity signals an immediate flush
    #[test]
    fn test_full_batch_signals_flush() {
        let mut buffer: BatchBuffer<u32> = BatchBuffer::new(2, Duration::from_millis(50));

        assert_eq!(buffer.push(1), None);
        assert_eq!(buffer.push(2), Some(2));
        assert_eq!(buffer.take().len(), 2);
    }

    /// # Case 2: time-based flush only fires with pending entries
    #[tokio::test(start_paused = true)]
    async fn test_timeout_flush() {
        let mut buffer: BatchBuffer<u32> = BatchBuffer::new(16, Duration::from_millis(50));

        assert!(!buffer.should_flush());
        buffer.push(1);
        tokio::time::advance(Duration::from_millis(60)).await;
        assert!(buffer.should_flush());

        buffer.take();
        assert!(!buffer.should_flush());
    }
}
