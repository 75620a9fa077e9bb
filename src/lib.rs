// Library surface for the binary and integration tests.
pub mod analysis;
pub mod chart;
pub mod combiner;
pub mod config;
pub mod error;
pub mod loader;
pub mod locate;
pub mod record;
pub mod report;
pub mod util;

pub use error::{ReportError, Result};
