//! Colored terminal output helpers.
//!
//! All user-facing output goes through these functions so we get
//! consistent styling across every command.

use comfy_table::{ContentArrangement, Table};
use console::style;

use crate::gate::{credential_label, ValidationResult};
use crate::migrate::MigrationReport;
use crate::vault::CredentialMetadata;

/// Print a green success message: "check_mark {msg}"
pub fn success(msg: &str) {
    println!("{} {}", style("\u{2713}").green().bold(), msg);
}

/// Print a red error message: "x_mark {msg}"
pub fn error(msg: &str) {
    eprintln!("{} {}", style("\u{2717}").red().bold(), msg);
}

/// Print a yellow warning: "warning_sign {msg}"
pub fn warning(msg: &str) {
    eprintln!("{} {}", style("\u{26a0}").yellow().bold(), msg);
}

/// Print a blue info message: "info_sign {msg}"
pub fn info(msg: &str) {
    println!("{} {}", style("\u{2139}").blue().bold(), msg);
}

/// Print a dim tip/hint: "arrow {msg}"
pub fn tip(msg: &str) {
    println!("{} {}", style("\u{2192}").dim(), style(msg).dim());
}

/// Print a table of credential metadata (Name, Label, Status, Updated).
pub fn print_credentials_table(user: &str, credentials: &[CredentialMetadata]) {
    if credentials.is_empty() {
        info(&format!("No credentials stored for user '{user}' yet."));
        tip("Run `credvault set <NAME>` to add one.");
        return;
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Name", "Label", "Status", "Updated"]);

    for c in credentials {
        let status = if c.is_set {
            style("set").green().to_string()
        } else {
            style("not set").dim().to_string()
        };
        table.add_row(vec![
            c.name.clone(),
            credential_label(&c.name),
            status,
            c.updated_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        ]);
    }

    println!("{table}");
}

/// Print the outcome of a required-credential check.
///
/// On failure only the fix-up hints are printed; the gate message itself
/// is reported as the command's error.
pub fn print_validation(user: &str, result: &ValidationResult) {
    if result.valid {
        success(&format!("All required credentials are set for user '{user}'."));
    } else {
        for name in &result.missing {
            tip(&format!("credvault set {name} --user {user}"));
        }
    }
}

/// Print a migration summary.
pub fn print_migration_report(report: &MigrationReport) {
    let verb = if report.dry_run { "Would encrypt" } else { "Encrypted" };

    if !report.migrated.is_empty() {
        let mut table = Table::new();
        table.set_content_arrangement(ContentArrangement::Dynamic);
        table.set_header(vec!["User", "Credential"]);
        for id in &report.migrated {
            table.add_row(vec![id.user_id.clone(), id.name.clone()]);
        }
        println!("{table}");
    }

    success(&format!(
        "{verb} {} legacy value(s); {} already encrypted, {} empty.",
        report.migrated.len(),
        report.skipped.len(),
        report.empty.len()
    ));

    for (id, kind) in &report.failed {
        warning(&format!(
            "Could not migrate '{}' for user '{}' ({kind}).",
            id.name, id.user_id
        ));
    }

    if report.dry_run && !report.migrated.is_empty() {
        tip("Run without --dry-run to apply.");
    }
}
