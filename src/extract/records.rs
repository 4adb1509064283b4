use serde::{Deserialize, Serialize};

/// A rental unit summary from one card on a search-results page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    pub name: String,
    pub address: String,
    pub link: String,
    /// Whole currency units, separators removed
    pub price: i64,
    pub currency: String,
    /// Billing period, e.g. "/mo"
    pub period: String,
    /// Price per square foot
    pub psf: f64,
    /// Floor area descriptor as shown on the card
    pub area: String,
    pub furnished: String,
    pub property_type: String,
    pub amenities: Amenities,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Amenities {
    pub studio: bool,
    pub bathrooms: i64,
    pub bedrooms: i64,
}

/// A building or project record from one detail page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub name: String,
    #[serde(rename = "type")]
    pub property_type: String,
    pub address: String,
    pub district: String,
    pub region: String,
    pub coordinates: Coordinate,
    pub facilities: Vec<String>,
    /// Detail page the record was extracted from
    pub link: String,
}

/// Latitude/longitude in degrees; `(0, 0)` when the page has none
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}
