//! Types and traits for recording training metrics.
//!
//! * [`Record`] - named values produced by learners and the trainer
//! * [`AggregateRecorder`] - stores records and writes aggregated values on flush
//! * [`RecordStorage`] - aggregation of stored records (min/max/mean/median)
//! * [`LogRecorder`] - writes aggregated records through the `log` crate
//! * [`BufferedRecorder`] - keeps every record in memory
//! * [`NullRecorder`] - discards all records
mod base;
mod buffered_recorder;
mod log_recorder;
mod null_recorder;
mod recorder;
mod storage;

pub use base::{Record, RecordValue};
pub use buffered_recorder::BufferedRecorder;
pub use log_recorder::LogRecorder;
pub use null_recorder::NullRecorder;
pub use recorder::{AggregateRecorder, Recorder};
pub use storage::RecordStorage;
