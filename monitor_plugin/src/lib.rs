pub mod bus;
pub mod config;
pub mod handlers;
pub mod parser;
pub mod paths;
pub mod plugin;
pub mod sink;

pub use bus::{Message, MessageBus};
pub use config::MonitorConfig;
pub use handlers::{METRIC_QUERY_AGGREGATE, METRIC_QUERY_RAW, METRIC_REPORT};
pub use parser::{parse_config_from_file, parse_config_from_str};
pub use plugin::CoreMonitor;
pub use sink::{HttpSink, MetricSink};
