//! Plain line-based terminal output.

use crate::models::{DistributionHistory, DistributionProvider, ProviderInstance};

/// Line width for separators.
const LINE_WIDTH: usize = 72;

/// Print a title with an underline.
///
/// ```text
/// PROVIDER INSTANCES (3)
/// ════════════════════════════════════════════════════════════════════════
/// ```
pub fn print_header(title: &str) {
    println!("{}", title);
    println!("{}", "═".repeat(LINE_WIDTH));
}

/// Print a status line.
///
/// ```text
///   ✓ Instance 7 disabled
/// ```
pub fn print_status(icon: &str, message: &str) {
    println!("  {} {}", icon, message);
}

fn ellipsize(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let kept: String = text.chars().take(width.saturating_sub(1)).collect();
    format!("{}…", kept)
}

/// One row per instance.
pub fn instance_rows(instances: &[ProviderInstance]) -> Vec<String> {
    instances
        .iter()
        .map(|i| {
            format!(
                "{:<10} {:<18} {:<30} {:<9} {:<3} {}",
                ellipsize(&i.id, 10),
                ellipsize(&i.name, 18),
                ellipsize(&i.endpoint, 30),
                if i.status.is_empty() { "-" } else { i.status.as_str() },
                if i.enabled { "ON" } else { "OFF" },
                i.provider_kind().unwrap_or("-"),
            )
        })
        .collect()
}

pub fn provider_rows(providers: &[DistributionProvider]) -> Vec<String> {
    providers
        .iter()
        .map(|p| {
            format!(
                "{:<14} {:<10} {:<7} {}",
                ellipsize(p.kind_id(), 14),
                if p.version.is_empty() { "-" } else { p.version.as_str() },
                p.auth_mode.map(|m| m.as_str()).unwrap_or("-"),
                p.source,
            )
        })
        .collect()
}

pub fn history_rows(records: &[DistributionHistory]) -> Vec<String> {
    records
        .iter()
        .map(|r| {
            let when = r
                .timestamp
                .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_else(|| "-".to_string());
            format!(
                "{:<19} {:<8} {:<36} {}/{}",
                when,
                r.status,
                ellipsize(&r.image, 36),
                r.provider,
                r.instance
            )
        })
        .collect()
}

pub fn print_rows(rows: &[String]) {
    if rows.is_empty() {
        println!("  (none)");
    }
    for row in rows {
        println!("{}", row);
    }
}
