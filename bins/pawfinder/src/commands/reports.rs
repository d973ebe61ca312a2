//! Report table commands

use crate::context::{api, Context};
use crate::output;
use anyhow::Result;
use owo_colors::OwoColorize;
use pawfinder_api_client::{PawfinderClient, ReportFeed, ReportQuery};
use pawfinder_geo::Coordinate;
use pawfinder_search::sort::distances;
use pawfinder_search::{
    filter_reports, sort_reports, DateKey, FilterCriteria, Page, PetReport, ReportKind, SortMode, SortOptions,
};
use serde::Serialize;
use serde_json::json;

/// Which report table to read
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum KindArg {
    /// Missing pets
    Lost,
    /// Pets picked up by someone
    Found,
    /// Both tables, lost first
    All,
}

impl KindArg {
    fn kinds(self) -> &'static [ReportKind] {
        match self {
            KindArg::Lost => &[ReportKind::Lost],
            KindArg::Found => &[ReportKind::Found],
            KindArg::All => &ReportKind::ALL,
        }
    }
}

/// Search flags
pub struct SearchArgs {
    pub kind: KindArg,
    pub province: String,
    pub pet_type: String,
    pub date: String,
    pub sort: Option<String>,
    pub date_key: Option<String>,
    pub near: Option<Coordinate>,
    pub page: usize,
    pub page_size: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
struct SearchRow {
    report: PetReport,
    distance_km: Option<f64>,
}

/// List rows as stored, without photos
pub async fn list(ctx: &Context, kind: KindArg, all_statuses: bool, limit: Option<u32>) -> Result<()> {
    let client = ctx.client()?;
    let query = if all_statuses {
        ReportQuery::new()
    } else {
        ReportQuery::active()
    }
    .with_limit(limit.unwrap_or(ctx.schema().feed.list_limit));

    let mut reports = Vec::new();
    for &k in kind.kinds() {
        reports.extend(api(client.reports().list(k, &query).await)?);
    }

    if ctx.is_json() {
        return ctx.print_json(&reports);
    }

    output::banner(&format!("📋 Reports ({})", reports.len()));
    if reports.is_empty() {
        println!("  {}", "No reports".dimmed());
    } else {
        output::report_header();
        for report in &reports {
            output::report_row(report, None);
        }
    }
    println!();
    Ok(())
}

async fn load(client: &PawfinderClient, ctx: &Context, kind: KindArg) -> Result<Vec<PetReport>> {
    let feed = ReportFeed::from_client(client, &ctx.schema().feed);
    let query = ReportQuery::active();
    let reports = match kind {
        KindArg::Lost => feed.load(ReportKind::Lost, &query).await,
        KindArg::Found => feed.load(ReportKind::Found, &query).await,
        KindArg::All => feed.load_both(&query).await,
    };
    api(reports)
}

/// Filter, rank and page active reports
pub async fn search(ctx: &Context, args: SearchArgs) -> Result<()> {
    let criteria = FilterCriteria::from_params(&args.province, &args.pet_type, &args.date)?;
    let defaults = &ctx.schema().search;
    let mode = SortMode::parse_or_default(args.sort.as_deref().unwrap_or(&defaults.default_sort));
    let date_key = DateKey::parse_or_default(args.date_key.as_deref().unwrap_or(&defaults.date_key));
    let page_size = args.page_size.unwrap_or(defaults.page_size);

    let client = ctx.client()?;
    let reports = load(&client, ctx, args.kind).await?;

    let filtered = filter_reports(&reports, &criteria);
    let options = SortOptions::new(mode).with_reference(args.near).with_date_key(date_key);
    let ranked = sort_reports(&filtered, &options);
    let km = distances(&ranked.reports, args.near.as_ref());

    let rows: Vec<SearchRow> = ranked
        .reports
        .into_iter()
        .zip(km)
        .map(|(report, d)| SearchRow {
            report,
            distance_km: d.is_finite().then_some(d),
        })
        .collect();
    let page = Page::of(&rows, args.page, page_size);

    if ctx.is_json() {
        return ctx.print_json(&json!({
            "sort": mode.as_str(),
            "matched": filtered.len(),
            "distance_unavailable": ranked.distance_unavailable,
            "page": page,
        }));
    }

    output::banner(&format!("🔎 Search ({} of {} match)", filtered.len(), reports.len()));
    if ranked.distance_unavailable {
        println!(
            "  {} Distance sorting needs {}; showing unsorted",
            "⚠".yellow().bold(),
            "--near".bold()
        );
        println!();
    }

    if page.is_empty() {
        println!("  {}", "No reports on this page".dimmed());
    } else {
        output::report_header();
        for row in &page.items {
            output::report_row(&row.report, row.distance_km);
        }
    }
    println!();
    println!(
        "  {}",
        format!(
            "Page {}/{} · {} per page · sorted by {}",
            page.page,
            page.total_pages.max(1),
            page.page_size,
            mode.as_str()
        )
        .dimmed()
    );
    println!();
    Ok(())
}
