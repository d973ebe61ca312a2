//! Health check command

use crate::context::Context;
use crate::output;
use anyhow::{bail, Result};
use owo_colors::OwoColorize;
use pawfinder_api_client::endpoints::HealthReport;

/// Check every backend service
pub async fn run(ctx: &Context, detailed: bool) -> Result<()> {
    let client = ctx.client()?;
    let report = client.health().check().await;

    if ctx.is_json() {
        ctx.print_json(&report)?;
    } else {
        print_text(&report, detailed);
    }

    if !report.is_healthy() {
        bail!("Some services are unhealthy");
    }
    Ok(())
}

fn print_text(report: &HealthReport, detailed: bool) {
    output::banner("🏥 Backend Health Check");

    for status in &report.services {
        let label = format!("{}:", status.service);
        print!("  {label:<10} ");
        let time_str = output::timing(status.response_time.as_millis(), detailed);

        if status.is_healthy {
            println!("{}{}", "✓ OK".green(), time_str.dimmed());
        } else if let Some(code) = status.status_code {
            println!("{} (HTTP {}){}", "✗ Error".red(), code, time_str.dimmed());
        } else {
            println!("{}", "✗ Error".red());
        }

        if detailed {
            println!("    └─ {}", status.url.dimmed());
            if let Some(ref error) = status.error {
                println!("    └─ {}", error.red());
            }
        }
    }

    println!();
    if report.is_healthy() {
        println!("  {} All services healthy", "✓".green().bold());
    } else {
        println!("  {} Some services have issues", "⚠".yellow().bold());
    }
    println!();
}
