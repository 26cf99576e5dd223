use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::format::IMAGE_SEPARATOR;

/// Storage identifier for a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PropertyId(pub i64);

impl fmt::Display for PropertyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Whether a unit is offered for rent or for sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingType {
    Rent,
    Sale,
}

impl ListingType {
    pub fn as_str(self) -> &'static str {
        match self {
            ListingType::Rent => "rent",
            ListingType::Sale => "sale",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "rent" => Some(ListingType::Rent),
            "sale" => Some(ListingType::Sale),
            _ => None,
        }
    }
}

impl fmt::Display for ListingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A point in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    /// Range-checked constructor; `None` for non-finite or out-of-range degrees.
    pub fn new(latitude: f64, longitude: f64) -> Option<Self> {
        if is_latitude(latitude) && is_longitude(longitude) {
            Some(Self {
                latitude,
                longitude,
            })
        } else {
            None
        }
    }

    /// Pair two optional columns; absent unless both halves are present.
    pub fn from_parts(latitude: Option<f64>, longitude: Option<f64>) -> Option<Self> {
        match (latitude, longitude) {
            (Some(latitude), Some(longitude)) => Some(Self {
                latitude,
                longitude,
            }),
            _ => None,
        }
    }
}

pub(crate) fn is_latitude(value: f64) -> bool {
    value.is_finite() && (-90.0..=90.0).contains(&value)
}

pub(crate) fn is_longitude(value: f64) -> bool {
    value.is_finite() && (-180.0..=180.0).contains(&value)
}

/// A stored listing as read back from the catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub id: PropertyId,
    pub price: i64,
    pub bedrooms: i64,
    pub bathrooms: f64,
    pub sqft: i64,
    pub address: String,
    pub description: String,
    pub listing_type: ListingType,
    pub near_university: Option<String>,
    pub location: Option<Coordinate>,
    pub created_at: DateTime<Utc>,
}

/// One property with its ordered images and, for geographic searches, its distance.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub property: Property,
    pub images: Vec<String>,
    pub distance: Option<f64>,
}

impl SearchResult {
    pub fn view(&self) -> ListingView {
        let property = &self.property;
        ListingView {
            id: property.id,
            price: property.price,
            bedrooms: property.bedrooms,
            bathrooms: property.bathrooms,
            sqft: property.sqft,
            address: property.address.clone(),
            description: property.description.clone(),
            listing_type: property.listing_type,
            near_university: property.near_university.clone(),
            latitude: property.location.map(|point| point.latitude),
            longitude: property.location.map(|point| point.longitude),
            created_at: property.created_at,
            images: self.images.clone(),
            distance: self.distance,
        }
    }
}

/// Wire representation of a search result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingView {
    pub id: PropertyId,
    pub price: i64,
    pub bedrooms: i64,
    pub bathrooms: f64,
    pub sqft: i64,
    pub address: String,
    pub description: String,
    #[serde(rename = "type")]
    pub listing_type: ListingType,
    pub near_university: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub images: Vec<String>,
    pub distance: Option<f64>,
}

/// Create-property payload as submitted by the listing form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProperty {
    pub price: i64,
    pub bedrooms: i64,
    pub bathrooms: f64,
    pub sqft: i64,
    pub address: String,
    pub description: String,
    #[serde(rename = "type")]
    pub listing_type: ListingType,
    #[serde(default)]
    pub near_university: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub images: Vec<String>,
}

/// Validated listing ready for insertion; images keep their submitted order.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyDraft {
    pub price: i64,
    pub bedrooms: i64,
    pub bathrooms: f64,
    pub sqft: i64,
    pub address: String,
    pub description: String,
    pub listing_type: ListingType,
    pub near_university: Option<String>,
    pub location: Option<Coordinate>,
    pub images: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PropertyValidationError {
    #[error("price must be a positive integer, found {0}")]
    NonPositivePrice(i64),
    #[error("{field} must not be negative")]
    Negative { field: &'static str },
    #[error("{field} is required")]
    Missing { field: &'static str },
    #[error("latitude and longitude must be supplied together")]
    UnpairedCoordinate,
    #[error("coordinate ({latitude}, {longitude}) is outside the valid range")]
    CoordinateOutOfRange { latitude: f64, longitude: f64 },
    #[error("image reference at position {index} is blank or contains a control separator")]
    InvalidImage { index: usize },
}

impl NewProperty {
    pub fn into_draft(self) -> Result<PropertyDraft, PropertyValidationError> {
        if self.price <= 0 {
            return Err(PropertyValidationError::NonPositivePrice(self.price));
        }
        if self.bedrooms < 0 {
            return Err(PropertyValidationError::Negative { field: "bedrooms" });
        }
        if !(self.bathrooms.is_finite() && self.bathrooms >= 0.0) {
            return Err(PropertyValidationError::Negative { field: "bathrooms" });
        }
        if self.sqft < 0 {
            return Err(PropertyValidationError::Negative { field: "sqft" });
        }

        let address = self.address.trim().to_string();
        if address.is_empty() {
            return Err(PropertyValidationError::Missing { field: "address" });
        }

        let location = match (self.latitude, self.longitude) {
            (None, None) => None,
            (Some(latitude), Some(longitude)) => Some(
                Coordinate::new(latitude, longitude).ok_or(
                    PropertyValidationError::CoordinateOutOfRange {
                        latitude,
                        longitude,
                    },
                )?,
            ),
            _ => return Err(PropertyValidationError::UnpairedCoordinate),
        };

        for (index, image) in self.images.iter().enumerate() {
            if image.trim().is_empty() || image.contains(IMAGE_SEPARATOR) {
                return Err(PropertyValidationError::InvalidImage { index });
            }
        }

        let near_university = self
            .near_university
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty());

        Ok(PropertyDraft {
            price: self.price,
            bedrooms: self.bedrooms,
            bathrooms: self.bathrooms,
            sqft: self.sqft,
            address,
            description: self.description.trim().to_string(),
            listing_type: self.listing_type,
            near_university,
            location,
            images: self.images,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> NewProperty {
        NewProperty {
            price: 2100,
            bedrooms: 2,
            bathrooms: 1.0,
            sqft: 950,
            address: "4545 15th Ave NE, Seattle, WA 98105".to_string(),
            description: "Updated apartment with balcony.".to_string(),
            listing_type: ListingType::Rent,
            near_university: Some(" University of Washington ".to_string()),
            latitude: Some(47.6616),
            longitude: Some(-122.3126),
            images: vec![
                "https://example.com/apt2a.jpg".to_string(),
                "https://example.com/apt2b.jpg".to_string(),
            ],
        }
    }

    #[test]
    fn valid_payload_becomes_draft() {
        let draft = payload().into_draft().expect("payload is valid");
        assert_eq!(draft.near_university.as_deref(), Some("University of Washington"));
        assert_eq!(
            draft.location,
            Some(Coordinate {
                latitude: 47.6616,
                longitude: -122.3126
            })
        );
        assert_eq!(draft.images.len(), 2);
    }

    #[test]
    fn unpaired_coordinate_is_rejected() {
        let mut payload = payload();
        payload.longitude = None;
        assert_eq!(
            payload.into_draft(),
            Err(PropertyValidationError::UnpairedCoordinate)
        );
    }

    #[test]
    fn blank_and_separator_images_are_rejected() {
        let mut payload = payload();
        payload.images.push("   ".to_string());
        assert_eq!(
            payload.into_draft(),
            Err(PropertyValidationError::InvalidImage { index: 2 })
        );

        let mut payload = self::payload();
        payload.images[0] = format!("a{IMAGE_SEPARATOR}b");
        assert_eq!(
            payload.into_draft(),
            Err(PropertyValidationError::InvalidImage { index: 0 })
        );
    }

    #[test]
    fn non_positive_price_is_rejected() {
        let mut payload = payload();
        payload.price = 0;
        assert_eq!(
            payload.into_draft(),
            Err(PropertyValidationError::NonPositivePrice(0))
        );
    }

    #[test]
    fn blank_university_is_dropped() {
        let mut payload = payload();
        payload.near_university = Some("  ".to_string());
        let draft = payload.into_draft().expect("valid");
        assert_eq!(draft.near_university, None);
    }

    #[test]
    fn listing_view_uses_wire_names() {
        let result = SearchResult {
            property: Property {
                id: PropertyId(7),
                price: 1800,
                bedrooms: 1,
                bathrooms: 1.0,
                sqft: 800,
                address: "4700 Brooklyn Ave NE".to_string(),
                description: "Cozy studio".to_string(),
                listing_type: ListingType::Rent,
                near_university: None,
                location: None,
                created_at: DateTime::parse_from_rfc3339("2025-09-01T12:00:00Z")
                    .expect("valid timestamp")
                    .with_timezone(&Utc),
            },
            images: Vec::new(),
            distance: None,
        };

        let json = serde_json::to_value(result.view()).expect("serializes");
        assert_eq!(json["id"], 7);
        assert_eq!(json["type"], "rent");
        assert!(json["nearUniversity"].is_null());
        assert!(json["latitude"].is_null());
        assert!(json["distance"].is_null());
        assert_eq!(json["images"], serde_json::json!([]));
        assert!(json["createdAt"].is_string());
    }
}
