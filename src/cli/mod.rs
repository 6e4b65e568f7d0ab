//! Command-line workflows built on top of the library modules.

pub mod orchestration;

pub use orchestration::{Release, ReleaseOutcome, ReleaseStep, StatusReport, StepError};
