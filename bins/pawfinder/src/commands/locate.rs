//! Location lookup command

use crate::context::Context;
use crate::output;
use anyhow::Result;
use owo_colors::OwoColorize;
use pawfinder_geo::Coordinate;
use pawfinder_locate::{ChainTimeouts, DeviceLocator, FixedDevice, IpApiLocator, LocationChain, NoDevice};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

/// Run the fallback chain once
pub async fn run(ctx: &Context, device: Option<Coordinate>) -> Result<()> {
    let config = &ctx.schema().locate;
    let device: Arc<dyn DeviceLocator> = match device {
        Some(coordinate) => Arc::new(FixedDevice::new(coordinate)),
        None => Arc::new(NoDevice),
    };
    let ip = IpApiLocator::new(
        config.ip_endpoint.clone(),
        Duration::from_millis(config.ip_timeout_ms),
    )?;
    let chain = LocationChain::new(device, Arc::new(ip), ChainTimeouts::from_config(config));

    let outcome = chain.spawn().wait().await;
    let (lat, lon) = ctx.schema().map.default_center;

    if ctx.is_json() {
        return match outcome {
            Ok(located) => ctx.print_json(&json!({
                "located": located,
                "label": located.label(),
            })),
            Err(err) => ctx.print_json(&json!({
                "located": null,
                "error": err.to_string(),
                "suggestion": err.suggestion(),
                "fallback_center": { "latitude": lat, "longitude": lon },
            })),
        };
    }

    output::banner("📍 Location");
    match outcome {
        Ok(located) => {
            output::ok(&format!("{}", located.coordinate));
            println!("    └─ {}", located.label().dimmed());
        }
        Err(err) => {
            output::fail(&err.to_string());
            if let Some(hint) = err.suggestion() {
                println!("    └─ {}", hint.yellow());
            }
            println!(
                "    └─ {}",
                format!("Map would open at the default center {lat:.5}, {lon:.5}").dimmed()
            );
        }
    }
    println!();
    Ok(())
}
