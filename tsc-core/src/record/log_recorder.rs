use super::{AggregateRecorder, Record, RecordStorage, RecordValue, Recorder};
use log::info;

/// Writes records with [`log::info!`].
///
/// Stored records are aggregated with [`RecordStorage`] on every flush.
#[derive(Default)]
pub struct LogRecorder {
    storage: RecordStorage,
}

impl LogRecorder {
    /// Constructs the recorder.
    pub fn new() -> Self {
        Self::default()
    }
}

fn format_value(v: &RecordValue) -> String {
    match v {
        RecordValue::Scalar(v) => format!("{:.4}", v),
        RecordValue::DateTime(t) => t.to_rfc3339(),
        RecordValue::Array1(vs) => format!("{:?}", vs),
        RecordValue::String(s) => s.clone(),
    }
}

impl Recorder for LogRecorder {
    fn write(&mut self, record: Record) {
        let line = record
            .iter()
            .map(|(k, v)| format!("{}={}", k, format_value(v)))
            .collect::<Vec<_>>()
            .join(", ");
        info!("{}", line);
    }
}

impl AggregateRecorder for LogRecorder {
    fn store(&mut self, record: Record) {
        self.storage.store(record);
    }

    fn flush(&mut self, step: i64) {
        let mut record = self.storage.aggregate();
        if !record.is_empty() {
            record.insert("step", RecordValue::Scalar(step as f32));
            self.write(record);
        }
    }
}
