//! Sample Seattle catalog used by the `seed` command.

use chrono::{Duration, Utc};
use tracing::info;

use super::domain::{ListingType, NewProperty, PropertyValidationError};
use super::repository::RepositoryError;
use super::sqlite::SqliteListingStore;

#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error("sample listing {index} is invalid: {source}")]
    Invalid {
        index: usize,
        source: PropertyValidationError,
    },
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

#[allow(clippy::too_many_arguments)]
fn listing(
    price: i64,
    bedrooms: i64,
    bathrooms: f64,
    sqft: i64,
    address: &str,
    description: &str,
    listing_type: ListingType,
    university: &str,
    location: Option<(f64, f64)>,
    images: &[&str],
) -> NewProperty {
    NewProperty {
        price,
        bedrooms,
        bathrooms,
        sqft,
        address: address.to_string(),
        description: description.to_string(),
        listing_type,
        near_university: Some(university.to_string()),
        latitude: location.map(|(latitude, _)| latitude),
        longitude: location.map(|(_, longitude)| longitude),
        images: images.iter().map(|image| image.to_string()).collect(),
    }
}

/// The eight sample listings, oldest first.
pub fn sample_listings() -> Vec<NewProperty> {
    const UW: &str = "University of Washington";
    const SU: &str = "Seattle University";
    const SPU: &str = "Seattle Pacific University";

    vec![
        listing(
            599_000,
            3,
            2.0,
            2100,
            "4557 15th Ave NE, Seattle, WA 98105",
            "Beautiful modern home with updated kitchen, hardwood floors, and spacious backyard. Walking distance to UW campus.",
            ListingType::Sale,
            UW,
            Some((47.661475, -122.312543)),
            &[
                "https://example.com/house1a.jpg",
                "https://example.com/house1b.jpg",
                "https://example.com/house1c.jpg",
            ],
        ),
        listing(
            2500,
            2,
            1.0,
            900,
            "1100 12th Ave, Seattle, WA 98122",
            "Modern apartment with city views, in-unit laundry, and secure parking. 5-minute walk to Seattle University.",
            ListingType::Rent,
            SU,
            Some((47.6118, -122.3170)),
            &[
                "https://example.com/apt1a.jpg",
                "https://example.com/apt1b.jpg",
            ],
        ),
        listing(
            450_000,
            4,
            3.0,
            2800,
            "3469 3rd Ave W, Seattle, WA 98119",
            "Spacious family home near SPU campus. Features updated kitchen, large basement, and mountain views.",
            ListingType::Sale,
            SPU,
            None,
            &[
                "https://example.com/house2a.jpg",
                "https://example.com/house2b.jpg",
            ],
        ),
        listing(
            1800,
            1,
            1.0,
            800,
            "4700 Brooklyn Ave NE, Seattle, WA 98105",
            "Cozy studio in the heart of the U-District. Includes parking and utilities.",
            ListingType::Rent,
            UW,
            Some((47.6633, -122.3141)),
            &[
                "https://example.com/studio1a.jpg",
                "https://example.com/studio1b.jpg",
            ],
        ),
        listing(
            3200,
            3,
            2.0,
            1500,
            "1111 E Cherry St, Seattle, WA 98122",
            "Newly renovated townhouse with rooftop deck. Perfect for students sharing.",
            ListingType::Rent,
            SU,
            None,
            &[
                "https://example.com/town1a.jpg",
                "https://example.com/town1b.jpg",
            ],
        ),
        listing(
            725_000,
            3,
            2.5,
            2400,
            "3213 W McGraw St, Seattle, WA 98199",
            "Charming craftsman near SPU with finished basement and large yard.",
            ListingType::Sale,
            SPU,
            None,
            &[
                "https://example.com/house3a.jpg",
                "https://example.com/house3b.jpg",
            ],
        ),
        listing(
            2100,
            2,
            1.0,
            950,
            "4545 15th Ave NE, Seattle, WA 98105",
            "Updated apartment with balcony and secure entry. All utilities included.",
            ListingType::Rent,
            UW,
            Some((47.6616, -122.3126)),
            &[
                "https://example.com/apt2a.jpg",
                "https://example.com/apt2b.jpg",
            ],
        ),
        listing(
            899_000,
            5,
            3.0,
            3200,
            "901 12th Ave, Seattle, WA 98122",
            "Historic home converted to student housing. Great investment opportunity.",
            ListingType::Sale,
            SU,
            None,
            &[
                "https://example.com/house4a.jpg",
                "https://example.com/house4b.jpg",
            ],
        ),
    ]
}

/// Load the sample catalog, optionally wiping existing listings first.
///
/// Creation times are spaced one minute apart so recency ordering is stable.
pub fn seed_listings(store: &SqliteListingStore, replace: bool) -> Result<usize, SeedError> {
    load_samples(store, sample_listings(), replace)
}

/// Validate every sample, then write them (and the optional wipe) in one transaction.
fn load_samples(
    store: &SqliteListingStore,
    samples: Vec<NewProperty>,
    replace: bool,
) -> Result<usize, SeedError> {
    let start = Utc::now() - Duration::minutes(samples.len() as i64);
    let drafts = samples
        .into_iter()
        .enumerate()
        .map(|(index, sample)| {
            sample
                .into_draft()
                .map(|draft| (draft, start + Duration::minutes(index as i64)))
                .map_err(|source| SeedError::Invalid { index, source })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let total = store.load_listings(&drafts, replace)?;
    info!(total, replace, "sample listings loaded");
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn samples_are_valid_drafts() {
        for sample in sample_listings() {
            let draft = sample.into_draft().expect("sample validates");
            assert!(!draft.images.is_empty());
        }
    }

    #[test]
    fn seeding_replaces_or_appends() {
        let store = SqliteListingStore::in_memory().expect("store opens");
        assert_eq!(seed_listings(&store, true).expect("seed"), 8);
        assert_eq!(seed_listings(&store, false).expect("seed"), 16);
        assert_eq!(seed_listings(&store, true).expect("seed"), 8);
    }

    #[test]
    fn invalid_sample_leaves_catalog_untouched() {
        let store = SqliteListingStore::in_memory().expect("store opens");
        seed_listings(&store, true).expect("seed");

        let mut samples = sample_listings();
        samples[5].latitude = Some(47.6);
        samples[5].longitude = None;

        match load_samples(&store, samples, true) {
            Err(SeedError::Invalid { index: 5, .. }) => {}
            other => panic!("expected invalid sample, got {other:?}"),
        }
        assert_eq!(store.listing_count().expect("count"), 8);
    }
}
