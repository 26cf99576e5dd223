use super::domain::{Property, SearchResult};

/// Separator between image references in the grouped aggregate (ASCII unit separator).
pub const IMAGE_SEPARATOR: char = '\u{1f}';

/// One grouped row as produced by the composed query.
#[derive(Debug, Clone, PartialEq)]
pub struct RawPropertyRow {
    pub property: Property,
    /// Display-ordered image references joined with [`IMAGE_SEPARATOR`]; `None` when no image rows joined.
    pub images: Option<String>,
    pub distance: Option<f64>,
}

/// Join image references the same way the grouped query does.
pub fn join_images(images: &[String]) -> String {
    let mut joined = String::new();
    for (index, image) in images.iter().enumerate() {
        if index > 0 {
            joined.push(IMAGE_SEPARATOR);
        }
        joined.push_str(image);
    }
    joined
}

/// Split an image aggregate back into its ordered references.
pub fn split_images(aggregate: Option<&str>) -> Vec<String> {
    match aggregate {
        None | Some("") => Vec::new(),
        Some(joined) => joined.split(IMAGE_SEPARATOR).map(str::to_string).collect(),
    }
}

/// Round miles to one decimal place.
pub fn round_distance(miles: f64) -> f64 {
    (miles * 10.0).round() / 10.0
}

pub fn format_row(row: RawPropertyRow) -> SearchResult {
    let images = split_images(row.images.as_deref());
    SearchResult {
        property: row.property,
        images,
        distance: row.distance.filter(|miles| miles.is_finite()).map(round_distance),
    }
}

pub fn format_rows(rows: Vec<RawPropertyRow>) -> Vec<SearchResult> {
    rows.into_iter().map(format_row).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listings::domain::{ListingType, PropertyId};
    use chrono::{TimeZone, Utc};

    fn property(id: i64) -> Property {
        Property {
            id: PropertyId(id),
            price: 2500,
            bedrooms: 2,
            bathrooms: 1.0,
            sqft: 900,
            address: "1100 12th Ave, Seattle, WA 98122".to_string(),
            description: "Modern apartment with city views".to_string(),
            listing_type: ListingType::Rent,
            near_university: Some("Seattle University".to_string()),
            location: None,
            created_at: Utc.with_ymd_and_hms(2025, 9, 1, 8, 0, 0).unwrap(),
        }
    }

    #[test]
    fn missing_or_empty_aggregate_yields_no_images() {
        assert!(split_images(None).is_empty());
        assert!(split_images(Some("")).is_empty());

        let result = format_row(RawPropertyRow {
            property: property(1),
            images: None,
            distance: None,
        });
        assert_eq!(result.images, Vec::<String>::new());
    }

    #[test]
    fn aggregate_round_trips_image_order() {
        let lists: Vec<Vec<String>> = vec![
            vec!["https://example.com/only.jpg".to_string()],
            vec![
                "https://example.com/c.jpg".to_string(),
                "https://example.com/a.jpg".to_string(),
                "https://example.com/b.jpg".to_string(),
            ],
            vec![
                "images/with,comma.jpg".to_string(),
                "images/with spaces.png".to_string(),
            ],
        ];

        for images in lists {
            let joined = join_images(&images);
            assert_eq!(split_images(Some(&joined)), images);
        }
    }

    #[test]
    fn distance_is_rounded_to_one_decimal() {
        assert_eq!(round_distance(1.04), 1.0);
        assert_eq!(round_distance(1.05000001), 1.1);
        assert_eq!(round_distance(0.0), 0.0);

        let result = format_row(RawPropertyRow {
            property: property(2),
            images: Some("a.jpg".to_string()),
            distance: Some(3.14159),
        });
        assert_eq!(result.distance, Some(3.1));
    }

    #[test]
    fn other_fields_pass_through_untouched() {
        let original = property(3);
        let result = format_row(RawPropertyRow {
            property: original.clone(),
            images: Some(join_images(&["x.jpg".to_string(), "y.jpg".to_string()])),
            distance: None,
        });
        assert_eq!(result.property, original);
        assert_eq!(result.distance, None);
        assert_eq!(result.images, vec!["x.jpg", "y.jpg"]);
    }

    #[test]
    fn format_rows_preserves_row_order() {
        let rows = vec![3, 1, 2]
            .into_iter()
            .map(|id| RawPropertyRow {
                property: property(id),
                images: None,
                distance: None,
            })
            .collect();
        let ids: Vec<i64> = format_rows(rows)
            .iter()
            .map(|result| result.property.id.0)
            .collect();
        assert_eq!(ids, vec![3, 1, 2]);
    }
}
