pub mod boundary;
pub mod changelog;
pub mod cli;
pub mod codec;
pub mod config;
pub mod domain;
pub mod error;
pub mod git;
pub mod ui;

pub use error::{Result, TaggerError};
