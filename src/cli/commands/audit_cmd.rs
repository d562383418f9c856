//! `credvault audit` — display the audit log.
//!
//! Usage:
//!   credvault audit               # show last 50 entries
//!   credvault audit --last 20     # show last 20
//!   credvault audit --since 7d    # entries from last 7 days

use chrono::{DateTime, TimeDelta, Utc};
use comfy_table::{ContentArrangement, Table};
use console::style;

use crate::audit::{AuditEntry, AuditLog};
use crate::cli::{output, Context};
use crate::errors::{CredVaultError, Result};

/// Execute the `audit` command.
pub fn execute(ctx: &Context, last: usize, since: Option<&str>) -> Result<()> {
    let since_dt = since.map(parse_duration).transpose()?;

    let audit = AuditLog::open(&ctx.data_dir)
        .ok_or_else(|| CredVaultError::Audit("failed to open audit database".into()))?;

    let entries = audit.query(last, since_dt)?;

    if entries.is_empty() {
        output::info("No audit entries found.");
        return Ok(());
    }

    print_audit_table(&entries);
    Ok(())
}

/// Parse a human-friendly duration string like "7d", "24h", "30m" into
/// the point in time that far in the past.
fn parse_duration(input: &str) -> Result<DateTime<Utc>> {
    let input = input.trim();

    let (num_str, to_delta): (&str, fn(i64) -> Option<TimeDelta>) =
        if let Some(s) = input.strip_suffix('d') {
            (s, TimeDelta::try_days)
        } else if let Some(s) = input.strip_suffix('h') {
            (s, TimeDelta::try_hours)
        } else if let Some(s) = input.strip_suffix('m') {
            (s, TimeDelta::try_minutes)
        } else {
            return Err(CredVaultError::CommandFailed(format!(
                "invalid duration '{input}' — use format like 7d, 24h, or 30m"
            )));
        };

    let num: u32 = num_str.parse().map_err(|_| {
        CredVaultError::CommandFailed(format!(
            "invalid duration '{input}' — expected a non-negative whole number"
        ))
    })?;

    to_delta(i64::from(num))
        .and_then(|delta| Utc::now().checked_sub_signed(delta))
        .ok_or_else(|| CredVaultError::CommandFailed(format!("duration '{input}' out of range")))
}

/// Print audit entries in a formatted table.
fn print_audit_table(entries: &[AuditEntry]) {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Time", "Operation", "User", "Credential", "Details"]);

    for entry in entries {
        table.add_row(vec![
            entry.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            colorize_operation(&entry.operation),
            entry.user_id.clone(),
            entry.credential.as_deref().unwrap_or("-").to_string(),
            entry.details.as_deref().unwrap_or("-").to_string(),
        ]);
    }

    println!(
        "{}",
        style(format!("{} audit entries:", entries.len())).bold()
    );
    println!("{table}");
}

fn colorize_operation(op: &str) -> String {
    match op {
        "set" => style(op).blue().to_string(),
        "delete" => style(op).red().to_string(),
        "read-failed" | "verify" => style(op).yellow().to_string(),
        "migrate" => style(op).cyan().to_string(),
        _ => op.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_duration_days() {
        let dt = parse_duration("7d").unwrap();
        let diff = Utc::now() - dt;
        assert!((diff.num_days() - 7).abs() <= 1);
    }

    #[test]
    fn parse_duration_hours() {
        let dt = parse_duration("24h").unwrap();
        let diff = Utc::now() - dt;
        assert!((diff.num_hours() - 24).abs() <= 1);
    }

    #[test]
    fn parse_duration_minutes_with_whitespace() {
        let dt = parse_duration(" 30m ").unwrap();
        let diff = Utc::now() - dt;
        assert!((diff.num_minutes() - 30).abs() <= 1);
    }

    #[test]
    fn parse_duration_out_of_range_is_an_error() {
        assert!(parse_duration("9999999999999d").is_err());
        assert!(matches!(
            parse_duration("4000000000d"),
            Err(CredVaultError::CommandFailed(_))
        ));
        assert!(matches!(
            parse_duration("4294967295d"),
            Err(CredVaultError::CommandFailed(_))
        ));
    }

    #[test]
    fn parse_duration_rejects_negative_numbers() {
        assert!(parse_duration("-5d").is_err());
        assert!(parse_duration("-1m").is_err());
    }

    #[test]
    fn parse_duration_invalid() {
        assert!(parse_duration("abc").is_err());
        assert!(parse_duration("7x").is_err());
        assert!(parse_duration("d").is_err());
    }

    #[test]
    fn recent_entries_pass_since_filter() {
        let dir = tempfile::TempDir::new().unwrap();
        let audit = AuditLog::open(dir.path()).unwrap();

        audit.log("read-failed", "u1", Some("openai"), Some("integrity"));

        let since = parse_duration("1h").unwrap();
        let entries = audit.query(10, Some(since)).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].details.as_deref(), Some("integrity"));
    }
}
