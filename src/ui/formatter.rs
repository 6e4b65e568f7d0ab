//! Pure formatting functions for UI output.
//!
//! This module contains all display/formatting logic separated from user interaction.

use console::style;

use crate::boundary::BoundaryWarning;

/// Format and print an error message in red.
pub fn display_error(message: &str) {
    eprintln!("{} {}", style("ERROR:").red(), message);
}

/// Format and print a success message with green checkmark.
pub fn display_success(message: &str) {
    println!("{} {}", style("✓").green(), message);
}

/// Format and print a status message with yellow arrow.
pub fn display_status(message: &str) {
    println!("{} {}", style("→").yellow(), message);
}

/// Display a boundary warning to the user.
pub fn display_boundary_warning(warning: &BoundaryWarning) {
    eprintln!("{} {}", style("⚠ WARNING:").yellow(), warning);
}

/// Display the current released version.
pub fn display_current_version(version: &str) {
    println!("Current Version is: {}", style(version).bold());
}

/// Display the changelog entries collected since `since_tag`.
///
/// # Arguments
/// * `entries` - Changelog lines, newest first
/// * `since_tag` - Tag the changelog was computed from
pub fn display_changelog(entries: &[String], since_tag: &str) {
    println!(
        "\n{}",
        style(format!("*** CHANGELOG since {} ***", since_tag)).bold()
    );
    for entry in entries {
        println!("  {}", entry);
    }
    if entries.is_empty() {
        println!("  {}", style("(no merge commits)").dim());
    }
}

/// Display the proposed version change.
pub fn display_proposed_version(old: &str, new: &str) {
    println!("\n{}", style("Proposed Version Change:").bold());
    println!("  From: {}", style(old).red());
    println!("  To:   {}", style(new).green());
}

/// Display the push command left for the operator.
///
/// # Arguments
/// * `tag` - The tag that was created locally
/// * `remote` - The remote name (e.g., "upstream")
/// * `branch` - The release branch
pub fn display_manual_push_instruction(tag: &str, remote: &str, branch: &str) {
    println!(
        "\n{} To publish this release, run:\n  {}",
        style("→").yellow(),
        style(format!("git push {} {} {}", remote, branch, tag)).cyan()
    );
}
