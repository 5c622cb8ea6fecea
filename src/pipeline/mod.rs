//! Demo drivers wiring image I/O, the codec, and the runtime together.

mod config;
mod driver;
mod report;

pub use config::{Config, Variant};
pub use driver::{Outcome, Pipeline};
pub use report::BatchReport;
