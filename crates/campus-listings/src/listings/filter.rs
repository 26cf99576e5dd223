use std::fmt;

use serde::{Deserialize, Serialize};

/// Raw search constraints as they arrive from a query string or the CLI.
///
/// Every field is optional and textual; blank values count as absent.
/// Parsing and validation happen in the predicate builder.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchFilter {
    #[serde(default, rename = "type")]
    pub listing_type: Option<String>,
    #[serde(default)]
    pub min_price: Option<String>,
    #[serde(default)]
    pub max_price: Option<String>,
    #[serde(default)]
    pub bedrooms: Option<String>,
    #[serde(default)]
    pub university: Option<String>,
    #[serde(default)]
    pub latitude: Option<String>,
    #[serde(default)]
    pub longitude: Option<String>,
    #[serde(default)]
    pub max_distance: Option<String>,
}

impl SearchFilter {
    pub fn with_type(mut self, value: impl Into<String>) -> Self {
        self.listing_type = Some(value.into());
        self
    }

    pub fn with_price_range(mut self, min: Option<i64>, max: Option<i64>) -> Self {
        self.min_price = min.map(|value| value.to_string());
        self.max_price = max.map(|value| value.to_string());
        self
    }

    pub fn with_bedrooms(mut self, value: impl Into<String>) -> Self {
        self.bedrooms = Some(value.into());
        self
    }

    pub fn with_university(mut self, value: impl Into<String>) -> Self {
        self.university = Some(value.into());
        self
    }

    pub fn with_origin(mut self, latitude: f64, longitude: f64) -> Self {
        self.latitude = Some(latitude.to_string());
        self.longitude = Some(longitude.to_string());
        self
    }

    pub fn with_max_distance(mut self, miles: f64) -> Self {
        self.max_distance = Some(miles.to_string());
        self
    }
}

/// Names of the filter fields, rendered the way callers spell them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum FilterField {
    #[serde(rename = "type")]
    ListingType,
    #[serde(rename = "minPrice")]
    MinPrice,
    #[serde(rename = "maxPrice")]
    MaxPrice,
    #[serde(rename = "bedrooms")]
    Bedrooms,
    #[serde(rename = "university")]
    University,
    #[serde(rename = "latitude")]
    Latitude,
    #[serde(rename = "longitude")]
    Longitude,
    #[serde(rename = "maxDistance")]
    MaxDistance,
}

impl FilterField {
    pub fn as_str(self) -> &'static str {
        match self {
            FilterField::ListingType => "type",
            FilterField::MinPrice => "minPrice",
            FilterField::MaxPrice => "maxPrice",
            FilterField::Bedrooms => "bedrooms",
            FilterField::University => "university",
            FilterField::Latitude => "latitude",
            FilterField::Longitude => "longitude",
            FilterField::MaxDistance => "maxDistance",
        }
    }
}

impl fmt::Display for FilterField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rejection raised for malformed or inconsistent search filters.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FilterError {
    #[error("type must be one of all, rent, sale; found '{0}'")]
    UnknownListingType(String),
    #[error("{field} must be a non-negative integer, found '{value}'")]
    NotAnInteger { field: FilterField, value: String },
    #[error("{field} must be a decimal number, found '{value}'")]
    NotANumber { field: FilterField, value: String },
    #[error("{field} is out of range: {value}")]
    OutOfRange { field: FilterField, value: f64 },
    #[error("{present} was supplied without {missing}")]
    UnpairedCoordinate {
        present: FilterField,
        missing: FilterField,
    },
    #[error("maxDistance requires latitude and longitude")]
    DistanceWithoutOrigin,
    #[error("minPrice {min} exceeds maxPrice {max}")]
    InvertedPriceRange { min: i64, max: i64 },
}

impl FilterError {
    /// The field the caller should correct.
    pub fn field(&self) -> FilterField {
        match self {
            FilterError::UnknownListingType(_) => FilterField::ListingType,
            FilterError::NotAnInteger { field, .. }
            | FilterError::NotANumber { field, .. }
            | FilterError::OutOfRange { field, .. } => *field,
            FilterError::UnpairedCoordinate { missing, .. } => *missing,
            FilterError::DistanceWithoutOrigin => FilterField::MaxDistance,
            FilterError::InvertedPriceRange { .. } => FilterField::MinPrice,
        }
    }
}

/// Trimmed value, or `None` when absent or blank.
pub(crate) fn present(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

/// `true` for the wildcard spellings `any` / `all`.
pub(crate) fn is_wildcard(value: &str, wildcard: &str) -> bool {
    value.eq_ignore_ascii_case(wildcard)
}

pub(crate) fn parse_count(field: FilterField, raw: &str) -> Result<i64, FilterError> {
    match raw.parse::<i64>() {
        Ok(value) if value >= 0 => Ok(value),
        _ => Err(FilterError::NotAnInteger {
            field,
            value: raw.to_string(),
        }),
    }
}

pub(crate) fn parse_decimal(field: FilterField, raw: &str) -> Result<f64, FilterError> {
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        Ok(value) => Err(FilterError::OutOfRange { field, value }),
        Err(_) => Err(FilterError::NotANumber {
            field,
            value: raw.to_string(),
        }),
    }
}
