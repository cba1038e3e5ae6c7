mod commands;
mod render;
mod utils;

use anyhow::Result;
use clap::{Parser, Subcommand};
use sagra_core::geo::Coordinates;
use sagra_core::{Category, DateWindow};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sagra")]
#[command(about = "Browse and contribute local community events")]
struct Cli {
    /// Log debug output to stderr (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List upcoming events
    List {
        /// Only this category (e.g. "street-food")
        #[arg(short, long)]
        category: Option<Category>,

        /// today, weekend, week or month
        #[arg(short, long)]
        when: Option<DateWindow>,

        /// Only events within this many km of --near
        #[arg(short, long)]
        radius: Option<f64>,

        /// Your position as LAT,LNG
        #[arg(short, long, allow_hyphen_values = true)]
        near: Option<Coordinates>,

        /// Print counts by category and day
        #[arg(long)]
        stats: bool,
    },
    /// Add a new event
    Add {
        title: String,

        #[arg(short, long)]
        category: String,

        /// Event date (YYYY-MM-DD)
        #[arg(short, long)]
        date: String,

        #[arg(short, long)]
        location: String,

        /// Start time (e.g. "19:30")
        #[arg(short, long)]
        time: Option<String>,

        #[arg(long)]
        description: Option<String>,

        #[arg(long)]
        price: Option<String>,

        #[arg(long)]
        contact: Option<String>,

        /// Submit as this email instead of user_email from config
        #[arg(long = "as")]
        as_email: Option<String>,
    },
    /// Drop cached data and fetch events again
    Reload,
    /// List registered contributors
    Users,
    /// Resolve an address to coordinates
    Geocode { address: String },
    /// Show config location and current settings
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::List {
            category,
            when,
            radius,
            near,
            stats,
        } => {
            let filters = commands::list::Filters {
                category,
                when,
                radius,
                near,
            };
            commands::list::run(filters, stats).await
        }
        Commands::Add {
            title,
            category,
            date,
            location,
            time,
            description,
            price,
            contact,
            as_email,
        } => {
            let draft = sagra_core::NewEvent {
                title,
                category,
                date,
                time,
                location,
                description,
                price,
                contact,
            };
            commands::add::run(draft, as_email).await
        }
        Commands::Reload => commands::reload::run().await,
        Commands::Users => commands::users::run().await,
        Commands::Geocode { address } => commands::geocode::run(&address).await,
        Commands::Config => commands::config::run(),
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
