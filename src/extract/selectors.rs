//! Selector configuration for the target site's page structure
//!
//! Everything tied to the site's markup lives here as data: CSS selectors,
//! classification keywords and table labels. Layout changes on the site are
//! handled by editing `[selectors.*]` in the configuration, not the crawl code.

use crate::ConfigError;
use scraper::Selector;
use serde::Deserialize;

/// All selectors used by the extractor
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    pub listing: ListingSelectorConfig,
    pub property: PropertySelectorConfig,
}

/// Selectors for a search-results page of rental listings
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ListingSelectorConfig {
    /// Page container holding the cards
    pub container: String,
    /// One listing card
    pub card: String,
    /// Card heading link; `title` is the name, `href` the link
    pub title_link: String,
    pub address: String,
    pub currency: String,
    pub price: String,
    pub period: String,
    /// Candidate nodes for the furnished/property-type classification
    pub descriptors: String,
    /// Floor-area nodes: first holds the PSF, second the area descriptor
    pub floor_area: String,
    /// Element whose `title` attribute holds the bathroom count
    pub bathrooms: String,
    /// Element whose `title` attribute holds the bedroom count
    pub bedrooms: String,
    pub furnished_keyword: String,
    pub excluded_keyword: String,
    pub studio_keyword: String,
}

impl Default for ListingSelectorConfig {
    fn default() -> Self {
        Self {
            container: "#listings-container".to_string(),
            card: ".listing-card".to_string(),
            title_link: ".header-wrapper .header-container a.nav-link".to_string(),
            address: "p.listing-location span".to_string(),
            currency: ".listing-features .list-price .currency".to_string(),
            price: ".listing-features .list-price .price".to_string(),
            period: ".listing-features .list-price .period".to_string(),
            descriptors: ".listing-properties .listing-property-type li".to_string(),
            floor_area: ".listing-features .listing-floorarea".to_string(),
            bathrooms: ".listing-features li.listing-rooms span.bath".to_string(),
            bedrooms: ".listing-features li.listing-rooms span.bed".to_string(),
            furnished_keyword: "Furnished".to_string(),
            excluded_keyword: "Completion".to_string(),
            studio_keyword: "Studio".to_string(),
        }
    }
}

/// Selectors for link discovery and property detail pages
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct PropertySelectorConfig {
    /// Search-results container used for link discovery
    pub link_container: String,
    /// Repeated result heading inside `link_container`
    pub link_item: String,
    /// Anchor inside a result heading
    pub link_anchor: String,

    /// Detail page root container
    pub container: String,
    /// Breadcrumb entries; district is 2nd and region 3rd from the end
    pub breadcrumb: String,
    /// Text node inside a breadcrumb entry
    pub breadcrumb_text: String,
    pub address: String,
    /// Repeated label/value block of the details table
    pub detail_row: String,
    pub detail_label: String,
    pub detail_value: String,
    /// Label (case-insensitive) of the project name row
    pub name_label: String,
    /// Label (case-insensitive) of the project type row
    pub type_label: String,
    /// One facility entry
    pub facility: String,
    /// Text node inside a facility entry
    pub facility_text: String,
    /// `meta[itemprop][content]` nodes carrying latitude and longitude
    pub coordinates: String,
}

impl Default for PropertySelectorConfig {
    fn default() -> Self {
        Self {
            link_container: ".main-content".to_string(),
            link_item: ".header-container".to_string(),
            link_anchor: "h3 .nav-link".to_string(),
            container: "#wrapper".to_string(),
            breadcrumb: ".container ol.breadcrumb li".to_string(),
            breadcrumb_text: "a span".to_string(),
            address: ".listing-address span".to_string(),
            detail_row: ".listing-details-primary table tbody".to_string(),
            detail_label: "tr.property-attr td.label-block h4.label-block".to_string(),
            detail_value: "tr.property-attr td.value-block".to_string(),
            name_label: "project name".to_string(),
            type_label: "project type".to_string(),
            facility: "#facilities ul li".to_string(),
            facility_text: "span".to_string(),
            coordinates: "#map meta".to_string(),
        }
    }
}

/// Compiled listing selectors
#[derive(Debug, Clone)]
pub struct ListingSelectors {
    pub container: Selector,
    pub card: Selector,
    pub title_link: Selector,
    pub address: Selector,
    pub currency: Selector,
    pub price: Selector,
    pub period: Selector,
    pub descriptors: Selector,
    pub floor_area: Selector,
    pub bathrooms: Selector,
    pub bedrooms: Selector,
    pub furnished_keyword: String,
    pub excluded_keyword: String,
    pub studio_keyword: String,
}

/// Compiled property selectors
#[derive(Debug, Clone)]
pub struct PropertySelectors {
    pub link_container: Selector,
    pub link_item: Selector,
    pub link_anchor: Selector,
    pub container: Selector,
    pub breadcrumb: Selector,
    pub breadcrumb_text: Selector,
    pub address: Selector,
    pub detail_row: Selector,
    pub detail_label: Selector,
    pub detail_value: Selector,
    pub name_label: String,
    pub type_label: String,
    pub facility: Selector,
    pub facility_text: Selector,
    pub coordinates: Selector,
}

/// Selectors ready for matching, compiled once per run
#[derive(Debug, Clone)]
pub struct CompiledSelectors {
    pub listing: ListingSelectors,
    pub property: PropertySelectors,
}

impl SelectorConfig {
    /// Compiles every selector, failing on the first invalid one
    pub fn compile(&self) -> Result<CompiledSelectors, ConfigError> {
        Ok(CompiledSelectors {
            listing: self.listing.compile()?,
            property: self.property.compile()?,
        })
    }
}

impl ListingSelectorConfig {
    fn compile(&self) -> Result<ListingSelectors, ConfigError> {
        Ok(ListingSelectors {
            container: compile(&self.container)?,
            card: compile(&self.card)?,
            title_link: compile(&self.title_link)?,
            address: compile(&self.address)?,
            currency: compile(&self.currency)?,
            price: compile(&self.price)?,
            period: compile(&self.period)?,
            descriptors: compile(&self.descriptors)?,
            floor_area: compile(&self.floor_area)?,
            bathrooms: compile(&self.bathrooms)?,
            bedrooms: compile(&self.bedrooms)?,
            furnished_keyword: self.furnished_keyword.clone(),
            excluded_keyword: self.excluded_keyword.clone(),
            studio_keyword: self.studio_keyword.clone(),
        })
    }
}

impl PropertySelectorConfig {
    fn compile(&self) -> Result<PropertySelectors, ConfigError> {
        Ok(PropertySelectors {
            link_container: compile(&self.link_container)?,
            link_item: compile(&self.link_item)?,
            link_anchor: compile(&self.link_anchor)?,
            container: compile(&self.container)?,
            breadcrumb: compile(&self.breadcrumb)?,
            breadcrumb_text: compile(&self.breadcrumb_text)?,
            address: compile(&self.address)?,
            detail_row: compile(&self.detail_row)?,
            detail_label: compile(&self.detail_label)?,
            detail_value: compile(&self.detail_value)?,
            name_label: self.name_label.to_lowercase(),
            type_label: self.type_label.to_lowercase(),
            facility: compile(&self.facility)?,
            facility_text: compile(&self.facility_text)?,
            coordinates: compile(&self.coordinates)?,
        })
    }
}

fn compile(selector: &str) -> Result<Selector, ConfigError> {
    Selector::parse(selector).map_err(|e| ConfigError::InvalidSelector {
        selector: selector.to_string(),
        message: e.to_string(),
    })
}
