pub mod entry;
pub mod error;
pub mod value;

pub use entry::{now_timestamp, MetricEntry, MetricSeries, MetricStoreState};
pub use error::{MonitorError, Result};
pub use value::{DataMap, MetricValue};
