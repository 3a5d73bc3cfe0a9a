//! Partial results accumulator
//!
//! Append-only, shared between the workers of one run and whoever harvests
//! partial output. Records go in whole, one push each, so a reader sees a
//! prefix of completion order.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use quarry_core::domain::job::Record;

#[derive(Clone, Default)]
pub struct PartialResults {
    records: Arc<Mutex<Vec<Record>>>,
}

impl PartialResults {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, record: Record) {
        self.lock().push(record);
    }

    /// Copy of everything accumulated so far
    pub fn snapshot(&self) -> Vec<Record> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Record>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(n: i64) -> Record {
        let mut record = Record::new();
        record.insert("n".into(), n.into());
        record
    }

    #[test]
    fn test_snapshot_is_a_copy() {
        let results = PartialResults::new();
        results.push(record(1));
        let before = results.snapshot();
        results.push(record(2));
        assert_eq!(before.len(), 1);
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn test_clones_share_storage() {
        let results = PartialResults::new();
        let writer = results.clone();
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let writer = writer.clone();
                std::thread::spawn(move || {
                    for j in 0..25 {
                        writer.push(record(i * 100 + j));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(results.len(), 100);
        assert!(!results.is_empty());
    }
}
