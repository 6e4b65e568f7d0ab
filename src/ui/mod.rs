//! User interface module - interaction (prompts) and formatting.
//!
//! Separates concerns:
//! - `formatter` - Pure formatting functions
//! - This module - Interactive prompts and user input handling

use std::io::{self, BufRead, Write};

use crate::domain::{BumpRequest, Version, VersionBump};
use crate::error::{Result, TaggerError};

pub mod formatter;

// Re-export formatter functions for convenience
pub use formatter::{
    display_boundary_warning, display_changelog, display_current_version, display_error,
    display_manual_push_instruction, display_proposed_version, display_status, display_success,
};

/// Prompts the operator for the next version.
///
/// Shows what each bump keyword would produce and reads a single line:
/// `major`, `minor`, `patch`, or an explicit `x.y.z`. This is the only
/// interactive point of a release.
///
/// # Arguments
/// * `current` - The currently released version
/// * `input` - Where the answer is read from (stdin in the binary)
///
/// # Returns
/// * `Ok(BumpRequest)` - The parsed answer
/// * `Err` - If input ends, cannot be read, or is not a keyword/version
pub fn prompt_bump<R: BufRead>(current: &Version, input: &mut R) -> Result<BumpRequest> {
    print!(
        "\nBump version {}:\n  major -> {}\n  minor -> {}\n  patch -> {}\n\nEnter major, minor, patch or an explicit version: ",
        current,
        preview(current, VersionBump::Major),
        preview(current, VersionBump::Minor),
        preview(current, VersionBump::Patch),
    );
    io::stdout().flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Err(TaggerError::input("no answer given at the version prompt"));
    }

    BumpRequest::parse(&line)
}

fn preview(current: &Version, bump: VersionBump) -> String {
    current
        .bump(bump)
        .map(|next| next.to_string())
        .unwrap_or_else(|_| "(not available)".to_string())
}
