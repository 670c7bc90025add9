pub use instrumentation::*;
pub use metrics::*;

mod instrumentation;
mod metrics;
