pub mod aggregator;
pub mod flatten;
pub mod persistence;
pub mod store;

pub use aggregator::{MetricsAggregator, Stats};
pub use flatten::{flatten_payloads, FlattenedValues};
pub use persistence::{LoadOutcome, StateFile};
pub use store::{MetricStore, QueryError, DEFAULT_MAX_NUM_HISTORY};
