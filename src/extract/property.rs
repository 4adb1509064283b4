//! Property link discovery and property detail extraction

use crate::extract::fields::{element_text, parse_leading_float, resolve_link, select_attr, select_text};
use crate::extract::records::{Coordinate, Property};
use crate::extract::selectors::PropertySelectors;
use crate::ExtractError;
use scraper::{ElementRef, Html};
use url::Url;

/// Extracts property detail links from a search-results page, in page order
pub fn extract_property_links(
    html: &str,
    selectors: &PropertySelectors,
    base_url: &Url,
) -> Result<Vec<String>, ExtractError> {
    let document = Html::parse_document(html);

    let container = document
        .select(&selectors.link_container)
        .next()
        .ok_or(ExtractError::MissingContainer {
            page: "search results",
        })?;

    let links = container
        .select(&selectors.link_item)
        .filter_map(|item| select_attr(item, &selectors.link_anchor, "href"))
        .filter_map(|href| resolve_link(&href, base_url))
        .collect();

    Ok(links)
}

/// Extracts one property from its detail page
///
/// `link` is the page's own URL and is stored on the record as-is.
///
/// # Errors
///
/// * `ExtractError::MissingContainer` - the page has no detail container
pub fn extract_property(
    html: &str,
    link: &str,
    selectors: &PropertySelectors,
) -> Result<Property, ExtractError> {
    let document = Html::parse_document(html);

    let container = document
        .select(&selectors.container)
        .next()
        .ok_or(ExtractError::MissingContainer { page: "property" })?;

    let breadcrumbs: Vec<String> = container
        .select(&selectors.breadcrumb)
        .map(|entry| breadcrumb_text(entry, selectors))
        .collect();
    let (district, region) = district_and_region(&breadcrumbs);

    let (name, property_type) = detail_table(container, selectors);

    // One entry per item, empty ones included
    let facilities = container
        .select(&selectors.facility)
        .map(|entry| {
            let text = select_text(entry, &selectors.facility_text);
            if text.is_empty() {
                element_text(entry)
            } else {
                text
            }
        })
        .collect();

    Ok(Property {
        name,
        property_type,
        address: select_text(container, &selectors.address),
        district,
        region,
        coordinates: coordinates(container, selectors, link),
        facilities,
        link: link.to_string(),
    })
}

fn breadcrumb_text(entry: ElementRef<'_>, selectors: &PropertySelectors) -> String {
    let text = select_text(entry, &selectors.breadcrumb_text);
    if text.is_empty() {
        element_text(entry)
    } else {
        text
    }
}

/// Picks (district, region) out of the breadcrumb trail
///
/// The site's trail ends `.., region, district, property`, so the district
/// is the 2nd entry from the end and the region the 3rd. Shorter trails leave
/// the missing values empty.
pub fn district_and_region(breadcrumbs: &[String]) -> (String, String) {
    let from_end = |n: usize| {
        breadcrumbs
            .len()
            .checked_sub(n)
            .and_then(|i| breadcrumbs.get(i))
            .cloned()
            .unwrap_or_default()
    };

    (from_end(2), from_end(3))
}

/// Reads the project name and type from the label/value rows
fn detail_table(container: ElementRef<'_>, selectors: &PropertySelectors) -> (String, String) {
    let mut name = String::new();
    let mut property_type = String::new();

    for row in container.select(&selectors.detail_row) {
        let label = select_text(row, &selectors.detail_label).to_lowercase();
        if label == selectors.name_label {
            name = select_text(row, &selectors.detail_value);
        } else if label == selectors.type_label {
            property_type = select_text(row, &selectors.detail_value);
        }
    }

    (name, property_type)
}

fn coordinates(container: ElementRef<'_>, selectors: &PropertySelectors, link: &str) -> Coordinate {
    let mut coordinate = Coordinate::default();

    for meta in container.select(&selectors.coordinates) {
        let content = meta.value().attr("content").unwrap_or("");
        match meta.value().attr("itemprop") {
            Some("latitude") => coordinate.latitude = parse_leading_float(content, "latitude", link),
            Some("longitude") => {
                coordinate.longitude = parse_leading_float(content, "longitude", link)
            }
            _ => {}
        }
    }

    coordinate
}
