//! PawFinder diagnostics CLI
//!
//! Exercises the hosted backend (health, storage, auth, report tables) and
//! the local ranking and location logic from the command line.

use clap::{Parser, Subcommand};
use owo_colors::OwoColorize;
use pawfinder_geo::Coordinate;
use std::path::PathBuf;
use std::process::ExitCode;

mod commands;
mod context;
mod output;

use commands::{auth, health, locate, places, reports, rewards, storage};
use context::{Context, OutputFormat};

/// Diagnostics for the PawFinder lost-and-found backend
#[derive(Parser)]
#[command(name = "pawfinder")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Configuration file (defaults to pawfinder.toml if present)
    #[arg(short, long, global = true, env = "PAWFINDER_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that the data, storage and auth services answer
    Health {
        /// Include response times
        #[arg(short, long)]
        detailed: bool,
    },

    /// Inspect and write object storage
    Storage {
        #[command(subcommand)]
        action: StorageAction,
    },

    /// Sign in and inspect the signed-in user
    Auth {
        #[command(subcommand)]
        action: AuthAction,
    },

    /// Read report tables
    Reports {
        #[command(subcommand)]
        action: ReportsAction,
    },

    /// Lost pets offering a reward
    Rewards {
        /// Ordering: reward, newest or nearest
        #[arg(short, long, value_enum, default_value_t = rewards::RewardSort::Reward)]
        sort: rewards::RewardSort,

        /// Your position as "lat,lon", for distances
        #[arg(long, value_parser = parse_coordinate)]
        near: Option<Coordinate>,

        /// Page number (1-based)
        #[arg(short, long, default_value = "1")]
        page: usize,

        /// Entries per page
        #[arg(long)]
        page_size: Option<usize>,
    },

    /// Find where this machine is
    Locate {
        /// Pretend the device reports this position as "lat,lon"
        #[arg(long, value_parser = parse_coordinate)]
        device: Option<Coordinate>,
    },

    /// Look up places by name
    Places {
        /// Place name
        query: String,

        /// Maximum results
        #[arg(short, long, default_value = "5")]
        limit: usize,
    },
}

#[derive(Subcommand)]
enum StorageAction {
    /// List buckets
    Buckets,

    /// Upload a file
    Upload {
        /// File to upload
        file: PathBuf,

        /// Object path inside the bucket (defaults to diagnostics/<file name>)
        #[arg(short, long)]
        path: Option<String>,

        /// Bucket (defaults to the configured photo bucket)
        #[arg(short, long)]
        bucket: Option<String>,

        /// Content type (guessed from the extension when omitted)
        #[arg(long)]
        content_type: Option<String>,

        /// Delete the object again after uploading
        #[arg(long)]
        cleanup: bool,
    },

    /// Create a bucket
    CreateBucket {
        /// Bucket name
        name: String,

        /// Require a token to read objects
        #[arg(long)]
        private: bool,
    },
}

#[derive(Subcommand)]
enum AuthAction {
    /// Sign in with email and password
    SignIn {
        /// Account email
        #[arg(short, long, env = "PAWFINDER_EMAIL")]
        email: String,

        /// Account password
        #[arg(short, long, env = "PAWFINDER_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Show the user an access token belongs to
    Whoami {
        /// Access token
        #[arg(short, long, env = "PAWFINDER_ACCESS_TOKEN", hide_env_values = true)]
        token: String,
    },

    /// Print the federated sign-in URL for a provider
    AuthorizeUrl {
        /// Provider, e.g. google
        provider: String,

        /// Where to send the user afterwards
        #[arg(long)]
        redirect_to: Option<String>,
    },
}

#[derive(Subcommand)]
enum ReportsAction {
    /// List rows as stored
    List {
        /// Which table
        #[arg(short, long, value_enum, default_value_t = reports::KindArg::Lost)]
        kind: reports::KindArg,

        /// Include inactive listings
        #[arg(long)]
        all_statuses: bool,

        /// Maximum rows
        #[arg(short, long)]
        limit: Option<u32>,
    },

    /// Filter, rank and page reports
    Search {
        /// Which table
        #[arg(short, long, value_enum, default_value_t = reports::KindArg::All)]
        kind: reports::KindArg,

        /// Province code, or "all"
        #[arg(long, default_value = "all")]
        province: String,

        /// cat, dog or "all"
        #[arg(long, default_value = "all")]
        pet_type: String,

        /// Day lost/found as YYYY-MM-DD
        #[arg(long, default_value = "")]
        date: String,

        /// reward_desc, reward_asc, date_desc, date_asc or distance_asc
        #[arg(short, long)]
        sort: Option<String>,

        /// Date used by date sorting: event or created
        #[arg(long)]
        date_key: Option<String>,

        /// Your position as "lat,lon", for distance sorting
        #[arg(long, value_parser = parse_coordinate)]
        near: Option<Coordinate>,

        /// Page number (1-based)
        #[arg(short, long, default_value = "1")]
        page: usize,

        /// Reports per page
        #[arg(long)]
        page_size: Option<usize>,
    },
}

/// Parse "lat,lon".
fn parse_coordinate(raw: &str) -> Result<Coordinate, String> {
    let (lat, lon) = raw
        .split_once(',')
        .ok_or_else(|| format!("expected \"lat,lon\", got \"{raw}\""))?;
    let lat: f64 = lat.trim().parse().map_err(|_| format!("invalid latitude \"{lat}\""))?;
    let lon: f64 = lon.trim().parse().map_err(|_| format!("invalid longitude \"{lon}\""))?;
    Coordinate::try_new(lat, lon).map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let ctx = match Context::init(cli.config.as_deref(), cli.format, cli.verbose) {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            return ExitCode::FAILURE;
        }
    };

    let result = match cli.command {
        Commands::Health { detailed } => health::run(&ctx, detailed).await,

        Commands::Storage { action } => match action {
            StorageAction::Buckets => storage::buckets(&ctx).await,
            StorageAction::Upload {
                file,
                path,
                bucket,
                content_type,
                cleanup,
            } => {
                let options = storage::UploadOptions {
                    path,
                    bucket,
                    content_type,
                    cleanup,
                };
                storage::upload(&ctx, &file, options).await
            }
            StorageAction::CreateBucket { name, private } => storage::create_bucket(&ctx, &name, !private).await,
        },

        Commands::Auth { action } => match action {
            AuthAction::SignIn { email, password } => auth::sign_in(&ctx, &email, &password).await,
            AuthAction::Whoami { token } => auth::whoami(&ctx, &token).await,
            AuthAction::AuthorizeUrl { provider, redirect_to } => {
                auth::authorize_url(&ctx, &provider, redirect_to.as_deref())
            }
        },

        Commands::Reports { action } => match action {
            ReportsAction::List {
                kind,
                all_statuses,
                limit,
            } => reports::list(&ctx, kind, all_statuses, limit).await,
            ReportsAction::Search {
                kind,
                province,
                pet_type,
                date,
                sort,
                date_key,
                near,
                page,
                page_size,
            } => {
                let args = reports::SearchArgs {
                    kind,
                    province,
                    pet_type,
                    date,
                    sort,
                    date_key,
                    near,
                    page,
                    page_size,
                };
                reports::search(&ctx, args).await
            }
        },

        Commands::Rewards {
            sort,
            near,
            page,
            page_size,
        } => rewards::run(&ctx, sort, near, page, page_size).await,

        Commands::Locate { device } => locate::run(&ctx, device).await,

        Commands::Places { query, limit } => places::run(&ctx, &query, limit).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}
