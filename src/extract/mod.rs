//! Page extraction: raw HTML to structured records
//!
//! Extraction is pure and stateless. Each function takes page HTML plus the
//! compiled selectors and returns records:
//! - Search-results pages yield zero or more `Listing`s
//! - Search-results pages yield property links (link discovery)
//! - Detail pages yield one `Property`

mod fields;
mod listing;
mod property;
mod records;
mod selectors;

pub use fields::{parse_leading_float, parse_leading_int, resolve_link};
pub use listing::{classify_descriptors, extract_listings};
pub use property::{district_and_region, extract_property, extract_property_links};
pub use records::{Amenities, Coordinate, Listing, Property};
pub use selectors::{
    CompiledSelectors, ListingSelectorConfig, ListingSelectors, PropertySelectorConfig,
    PropertySelectors, SelectorConfig,
};

use crate::{ConfigError, ExtractError};
use url::Url;

/// Selector-bound extractor shared by all crawl workers
#[derive(Debug, Clone)]
pub struct Extractor {
    selectors: CompiledSelectors,
    site_url: Url,
}

impl Extractor {
    /// Compiles the selectors and parses the site root used for link resolution
    pub fn new(selectors: &SelectorConfig, site_url: &str) -> Result<Self, ConfigError> {
        let site_url = Url::parse(site_url)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid site_url '{}': {}", site_url, e)))?;

        Ok(Self {
            selectors: selectors.compile()?,
            site_url,
        })
    }

    pub fn listings(&self, html: &str) -> Result<Vec<Listing>, ExtractError> {
        extract_listings(html, &self.selectors.listing, &self.site_url)
    }

    pub fn property_links(&self, html: &str) -> Result<Vec<String>, ExtractError> {
        extract_property_links(html, &self.selectors.property, &self.site_url)
    }

    pub fn property(&self, html: &str, link: &str) -> Result<Property, ExtractError> {
        extract_property(html, link, &self.selectors.property)
    }
}
