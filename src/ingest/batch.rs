//! Batched-write policy
//!
//! Shared by every bulk operation in the ingestor: accumulate records up
//! to a fixed threshold, hand the full batch back for one parameterized
//! write, repeat, then hand back any remainder. Peak memory stays
//! O(batch size) no matter how large the source sequence is.

use crate::sink::Value;

/// Records per flush unless overridden.
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// Fixed-capacity buffer of pending write records.
///
/// Synchronous on purpose: the writer only decides *when* a batch is due,
/// the caller performs the actual (async) flush. That keeps the flush
/// count directly testable.
pub struct BatchWriter {
    capacity: usize,
    pending: Vec<Value>,
}

impl BatchWriter {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            pending: Vec::with_capacity(capacity),
        }
    }

    /// Buffer one record. Returns the full batch once the threshold is
    /// reached, leaving the buffer empty for the next round.
    pub fn push(&mut self, record: Value) -> Option<Vec<Value>> {
        self.pending.push(record);
        if self.pending.len() >= self.capacity {
            Some(std::mem::replace(
                &mut self.pending,
                Vec::with_capacity(self.capacity),
            ))
        } else {
            None
        }
    }

    /// Hand back whatever is still buffered after the source sequence is
    /// exhausted. `None` when empty: a trailing empty flush is skipped.
    pub fn finish(mut self) -> Option<Vec<Value>> {
        if self.pending.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut self.pending))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(writer: &mut BatchWriter, records: usize) -> Vec<usize> {
        let mut batches = Vec::new();
        for i in 0..records {
            if let Some(batch) = writer.push(Value::Int(i as i64)) {
                batches.push(batch.len());
            }
        }
        batches
    }

    #[test]
    fn flush_count_is_ceil_of_records_over_capacity() {
        let mut writer = BatchWriter::new(1000);
        let mut batches = drain(&mut writer, 2500);
        if let Some(rest) = writer.finish() {
            batches.push(rest.len());
        }
        assert_eq!(batches, vec![1000, 1000, 500]);
    }

    #[test]
    fn exact_multiple_has_no_trailing_flush() {
        let mut writer = BatchWriter::new(10);
        let batches = drain(&mut writer, 30);
        assert_eq!(batches, vec![10, 10, 10]);
        assert!(writer.finish().is_none());
    }

    #[test]
    fn empty_source_flushes_nothing() {
        let writer = BatchWriter::new(1000);
        assert!(writer.finish().is_none());
    }

    #[test]
    fn sub_threshold_records_arrive_only_at_finish() {
        let mut writer = BatchWriter::new(1000);
        assert!(drain(&mut writer, 3).is_empty());
        assert_eq!(writer.finish().map(|b| b.len()), Some(3));
    }

    #[test]
    fn zero_capacity_is_clamped() {
        let mut writer = BatchWriter::new(0);
        assert_eq!(writer.push(Value::Int(1)).map(|b| b.len()), Some(1));
    }
}
