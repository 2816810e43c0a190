//! Utility module: errors, logging and metrics.

pub mod errors;
pub mod metrics;
pub mod logging;

pub use errors::{NetError, Result};
pub use metrics::MetricsRegistry;
pub use logging::init_logging;
