//! Record storage and aggregation.
use super::{Record, RecordValue};
use std::collections::BTreeSet;

/// Stores records and aggregates them on request.
///
/// Scalars appearing once are passed through; scalars appearing several
/// times are summarised as `{key}_min`, `{key}_max`, `{key}_mean` and
/// `{key}_median`. For other value types the most recent value is kept.
#[derive(Default)]
pub struct RecordStorage {
    data: Vec<Record>,
}

fn min(vs: &[f32]) -> RecordValue {
    RecordValue::Scalar(vs.iter().copied().fold(f32::INFINITY, f32::min))
}

fn max(vs: &[f32]) -> RecordValue {
    RecordValue::Scalar(vs.iter().copied().fold(f32::NEG_INFINITY, f32::max))
}

fn mean(vs: &[f32]) -> RecordValue {
    RecordValue::Scalar(vs.iter().sum::<f32>() / vs.len() as f32)
}

fn median(mut vs: Vec<f32>) -> RecordValue {
    vs.sort_by(|x, y| x.total_cmp(y));
    RecordValue::Scalar(vs[vs.len() / 2])
}

impl RecordStorage {
    /// Creates a new empty record storage.
    pub fn new() -> Self {
        Self { data: vec![] }
    }

    /// Stores a record.
    pub fn store(&mut self, record: Record) {
        self.data.push(record);
    }

    /// Returns the number of stored records.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if no record is stored.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    fn keys(&self) -> BTreeSet<String> {
        self.data
            .iter()
            .flat_map(|record| record.keys().cloned())
            .collect()
    }

    fn scalar(&self, key: &str, vs: Vec<f32>) -> Record {
        if vs.len() == 1 {
            Record::from_slice(&[(key.to_string(), RecordValue::Scalar(vs[0]))])
        } else {
            Record::from_slice(&[
                (format!("{}_min", key), min(&vs)),
                (format!("{}_max", key), max(&vs)),
                (format!("{}_mean", key), mean(&vs)),
                (format!("{}_median", key), median(vs)),
            ])
        }
    }

    /// Aggregates all stored records and clears the storage.
    pub fn aggregate(&mut self) -> Record {
        let mut record = Record::empty();

        for key in self.keys().iter() {
            let scalars: Vec<f32> = self
                .data
                .iter()
                .filter_map(|r| match r.get(key) {
                    Some(RecordValue::Scalar(v)) => Some(*v),
                    _ => None,
                })
                .collect();

            if !scalars.is_empty() {
                record.merge_inplace(self.scalar(key, scalars));
            } else if let Some(v) = self.data.iter().rev().find_map(|r| r.get(key)) {
                record.insert(key.clone(), v.clone());
            }
        }

        self.data.clear();

        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aggregate_scalars() {
        let mut storage = RecordStorage::new();
        for v in [1.0, 3.0, 2.0] {
            storage.store(Record::from_scalar("loss", v));
        }
        storage.store(Record::from_scalar("return", 5.0));
        let record = storage.aggregate();

        assert_eq!(record.get_scalar("loss_min"), Ok(1.0));
        assert_eq!(record.get_scalar("loss_max"), Ok(3.0));
        assert_eq!(record.get_scalar("loss_mean"), Ok(2.0));
        assert_eq!(record.get_scalar("loss_median"), Ok(2.0));
        assert_eq!(record.get_scalar("return"), Ok(5.0));
        assert!(storage.is_empty());
    }

    #[test]
    fn test_aggregate_keeps_latest_non_scalar() {
        let mut storage = RecordStorage::new();
        storage.store(Record::from_slice(&[(
            "agent",
            RecordValue::String("a".to_string()),
        )]));
        storage.store(Record::from_slice(&[(
            "agent",
            RecordValue::String("b".to_string()),
        )]));
        let record = storage.aggregate();
        assert_eq!(record.get_string("agent"), Ok("b".to_string()));
    }
}
