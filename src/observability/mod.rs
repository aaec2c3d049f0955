//! Metrics recording and exposition

pub mod endpoint;
pub mod metrics;
pub mod recorder;

pub use endpoint::*;
pub use self::metrics::*;
pub use recorder::*;
