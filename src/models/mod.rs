// Domain models: parsed report state and emitted metric records

mod metric;
mod snapshot;

pub use metric::MetricRecord;
pub use snapshot::{ExtAppStat, FieldSet, Snapshot, VhostStat};
