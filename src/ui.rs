//! Terminal output formatting for the CLI.

use console::style;

use crate::domain::ReleaseSet;
use crate::manager::DeleteOutcome;
use crate::orchestrator::PushResult;

/// Print an error message in red.
pub fn display_error(message: &str) {
    eprintln!("{} {}", style("ERROR:").red().bold(), message);
}

/// Print a success message with a green checkmark.
pub fn display_success(message: &str) {
    println!("{} {}", style("✓").green(), message);
}

/// Print a status message with a yellow arrow.
pub fn display_status(message: &str) {
    println!("{} {}", style("→").yellow(), message);
}

/// Print the outcome of a push.
pub fn display_push_result(result: &PushResult) {
    display_success(&format!(
        "Pushed {}/{} version {}",
        result.organization,
        result.repo,
        style(&result.version).bold()
    ));
}

/// Print the raw release listing of a repository.
pub fn display_releases(organization: &str, repo: &str, releases: &ReleaseSet) {
    if releases.is_empty() {
        println!("No releases in {}/{}", organization, repo);
        return;
    }

    println!(
        "{}",
        style(format!("Releases in {}/{}:", organization, repo)).bold()
    );
    for version in releases.raw() {
        println!("  {}", version);
    }
}

/// Print what a delete removed, and what stopped it if incomplete.
pub fn display_delete_outcome(outcome: &DeleteOutcome) {
    for version in &outcome.deleted {
        display_success(&format!(
            "Deleted {}/{} version {}",
            outcome.organization, outcome.repo, version
        ));
    }

    if outcome.deleted.is_empty() && outcome.is_complete() {
        println!(
            "No releases to delete in {}/{}",
            outcome.organization, outcome.repo
        );
    }

    if let Some(failure) = &outcome.failed {
        display_error(&format!(
            "Failed to delete {}/{} version {}: {}",
            outcome.organization, outcome.repo, failure.version, failure.diagnostic
        ));
    }
}
