//! Place search command

use crate::context::Context;
use crate::output;
use anyhow::{bail, Result};
use owo_colors::OwoColorize;
use pawfinder_locate::{DebouncedSearch, NominatimSearcher};
use serde_json::json;
use std::sync::Arc;

/// Look up `query` through the debounced geocoder
pub async fn run(ctx: &Context, query: &str, limit: usize) -> Result<()> {
    if query.trim().is_empty() {
        bail!("Query is empty");
    }

    let config = &ctx.schema().locate;
    let searcher = NominatimSearcher::from_config(config)?.with_limit(limit);
    let search = DebouncedSearch::from_config(Arc::new(searcher), config);

    let mut rx = search.subscribe();
    search.submit(query);
    rx.changed().await?;
    let results = rx.borrow_and_update().clone();
    search.close();

    if let Some(error) = results.error {
        bail!("Place search failed: {error}");
    }

    if ctx.is_json() {
        return ctx.print_json(&json!({
            "query": results.query,
            "places": results.places,
        }));
    }

    output::banner(&format!("🗺️  Places matching \"{}\"", results.query));
    if results.places.is_empty() {
        println!("  {}", "No matches".dimmed());
    }
    for place in &results.places {
        println!("  {}", place.name);
        println!("    └─ {}", place.coordinate.to_string().dimmed());
    }
    println!();
    Ok(())
}
