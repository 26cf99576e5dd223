use crate::infra::{load_config, open_store};
use campus_listings::error::AppError;
use campus_listings::listings::{ListingService, ListingView, SearchFilter, SearchResult};
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct SearchArgs {
    /// Listing type: all, rent, or sale
    #[arg(long = "type")]
    listing_type: Option<String>,
    /// Minimum price (inclusive)
    #[arg(long)]
    min_price: Option<String>,
    /// Maximum price (inclusive)
    #[arg(long)]
    max_price: Option<String>,
    /// Minimum bedroom count, or "any"
    #[arg(long)]
    bedrooms: Option<String>,
    /// Exact university name, or "any"
    #[arg(long)]
    university: Option<String>,
    /// Reference latitude in decimal degrees
    #[arg(long, allow_negative_numbers = true)]
    latitude: Option<String>,
    /// Reference longitude in decimal degrees
    #[arg(long, allow_negative_numbers = true)]
    longitude: Option<String>,
    /// Search radius in miles (requires latitude and longitude)
    #[arg(long)]
    max_distance: Option<String>,
    /// Print JSON instead of a table
    #[arg(long)]
    json: bool,
    /// Override the configured SQLite database path
    #[arg(long)]
    database: Option<PathBuf>,
}

impl SearchArgs {
    pub(crate) fn filter(&self) -> SearchFilter {
        SearchFilter {
            listing_type: self.listing_type.clone(),
            min_price: self.min_price.clone(),
            max_price: self.max_price.clone(),
            bedrooms: self.bedrooms.clone(),
            university: self.university.clone(),
            latitude: self.latitude.clone(),
            longitude: self.longitude.clone(),
            max_distance: self.max_distance.clone(),
        }
    }
}

pub(crate) fn run_search(args: SearchArgs) -> Result<(), AppError> {
    let filter = args.filter();
    let config = load_config(args.database)?;
    let store = open_store(&config)?;
    let service = ListingService::new(Arc::new(store));

    let results = service.search(&filter)?;

    if args.json {
        println!("{}", render_json(&results)?);
    } else {
        render_results(&results);
    }

    Ok(())
}

fn render_json(results: &[SearchResult]) -> Result<String, AppError> {
    let views: Vec<ListingView> = results.iter().map(SearchResult::view).collect();
    Ok(serde_json::to_string_pretty(&views)?)
}

fn render_results(results: &[SearchResult]) {
    if results.is_empty() {
        println!("No listings match the given filters");
        return;
    }

    println!("{} listing(s)", results.len());
    for result in results {
        let property = &result.property;
        let distance = match result.distance {
            Some(miles) => format!(" | {miles:.1} mi"),
            None => String::new(),
        };
        let university = property.near_university.as_deref().unwrap_or("no university");
        println!(
            "- #{} {} ${} | {} bd / {} ba | {} | {} | {} photo(s) | listed {}{}",
            property.id,
            property.listing_type,
            property.price,
            property.bedrooms,
            property.bathrooms,
            property.address,
            university,
            result.images.len(),
            property.created_at.format("%Y-%m-%d"),
            distance
        );
    }
}
