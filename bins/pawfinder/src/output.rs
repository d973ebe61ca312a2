//! Terminal formatting helpers

use owo_colors::OwoColorize;
use pawfinder_geo::format_distance;
use pawfinder_search::PetReport;

const RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━";

/// Section header
pub fn banner(title: &str) {
    println!();
    println!("{}", RULE.blue());
    println!("  {}", title.blue().bold());
    println!("{}", RULE.blue());
    println!();
}

/// Success marker
pub fn ok(message: &str) {
    println!("  {} {}", "✓".green(), message);
}

/// Failure marker
pub fn fail(message: &str) {
    println!("  {} {}", "✗".red(), message);
}

/// Dimmed "(123ms)" suffix, or nothing
pub fn timing(elapsed_ms: u128, show: bool) -> String {
    if show {
        format!(" ({elapsed_ms}ms)")
    } else {
        String::new()
    }
}

/// Money as "฿1,500"
pub fn baht(amount: f64) -> String {
    let whole = amount.round();
    let digits = format!("{whole:.0}");
    let mut grouped = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    format!("฿{grouped}")
}

/// Column header for report rows
pub fn report_header() {
    println!(
        "  {:<8} {:<6} {:<4} {:<18} {:<10} {:<12} {:>9} {:>9}",
        "ID".dimmed(),
        "Kind".dimmed(),
        "Type".dimmed(),
        "Breed".dimmed(),
        "Province".dimmed(),
        "Date".dimmed(),
        "Reward".dimmed(),
        "Distance".dimmed()
    );
}

/// One report row; `distance_km` is shown when known
pub fn report_row(report: &PetReport, distance_km: Option<f64>) {
    let reward = report.reward.map_or_else(|| "-".to_string(), |r| baht(r.amount()));
    let distance = distance_km.map_or_else(|| "-".to_string(), format_distance);
    println!(
        "  {:<8} {:<6} {:<4} {:<18} {:<10} {:<12} {:>9} {:>9}",
        truncate(&report.id, 8),
        report.kind.as_str(),
        report.category.as_str(),
        truncate(&report.breed, 18),
        truncate(&report.location.province, 10),
        report.event_date.as_deref().map_or("-", |d| d.get(..10).unwrap_or(d)),
        reward,
        distance
    );
}

fn truncate(value: &str, width: usize) -> String {
    if value.chars().count() <= width {
        value.to_string()
    } else {
        let mut cut: String = value.chars().take(width.saturating_sub(1)).collect();
        cut.push('…');
        cut
    }
}
