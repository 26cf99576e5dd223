use crate::infra::{load_config, open_store};
use crate::search::{run_search, SearchArgs};
use crate::server;
use campus_listings::error::AppError;
use campus_listings::listings::seed_listings;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "Campus Listings",
    about = "Serve, seed, and search the campus property catalog from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Load the sample Seattle listings into the catalog
    Seed(SeedArgs),
    /// Run a filtered listing search and print the results
    Search(SearchArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Override the configured SQLite database path
    #[arg(long)]
    pub(crate) database: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub(crate) struct SeedArgs {
    /// Override the configured SQLite database path
    #[arg(long)]
    database: Option<PathBuf>,
    /// Append the samples instead of replacing existing listings
    #[arg(long)]
    keep_existing: bool,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Seed(args) => run_seed(args),
        Command::Search(args) => run_search(args),
    }
}

fn run_seed(args: SeedArgs) -> Result<(), AppError> {
    let config = load_config(args.database)?;
    let store = open_store(&config)?;
    let total = seed_listings(&store, !args.keep_existing)?;
    println!("Catalog now holds {total} listings");
    Ok(())
}
