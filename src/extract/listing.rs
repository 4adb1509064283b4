//! Listing extraction from search-results pages

use crate::extract::fields::{
    element_text, parse_leading_float, parse_leading_int, resolve_link, select_attr, select_text,
};
use crate::extract::records::{Amenities, Listing};
use crate::extract::selectors::ListingSelectors;
use crate::ExtractError;
use scraper::{ElementRef, Html};
use url::Url;

/// Extracts every listing card from a search-results page
///
/// Cards are read from the first match of the container selector. A card
/// without a usable link is dropped, since the link is what makes a record
/// traceable; every other missing or malformed field falls back to its default.
///
/// # Errors
///
/// * `ExtractError::MissingContainer` - the page has no listings container,
///   which is what a bot-challenge or error page looks like
pub fn extract_listings(
    html: &str,
    selectors: &ListingSelectors,
    base_url: &Url,
) -> Result<Vec<Listing>, ExtractError> {
    let document = Html::parse_document(html);

    let container = document
        .select(&selectors.container)
        .next()
        .ok_or(ExtractError::MissingContainer { page: "listings" })?;

    let mut listings = Vec::new();
    for (index, card) in container.select(&selectors.card).enumerate() {
        match extract_card(card, selectors, base_url) {
            Some(listing) => listings.push(listing),
            None => tracing::warn!("Skipping listing card {} without a link", index),
        }
    }

    Ok(listings)
}

fn extract_card(card: ElementRef<'_>, selectors: &ListingSelectors, base_url: &Url) -> Option<Listing> {
    let link = select_attr(card, &selectors.title_link, "href")
        .and_then(|href| resolve_link(&href, base_url))?;

    let name = select_attr(card, &selectors.title_link, "title").unwrap_or_default();
    let price_text = select_text(card, &selectors.price);

    let (furnished, property_type) = classify_descriptors(
        card.select(&selectors.descriptors).map(element_text),
        &selectors.furnished_keyword,
        &selectors.excluded_keyword,
    );

    let mut psf = 0.0;
    let mut area = String::new();
    for (i, node) in card.select(&selectors.floor_area).enumerate() {
        match i {
            0 => psf = parse_leading_float(&element_text(node), "psf", &link),
            1 => area = element_text(node),
            _ => break,
        }
    }

    let bathrooms_text = select_attr(card, &selectors.bathrooms, "title").unwrap_or_default();
    let bedrooms_text = select_attr(card, &selectors.bedrooms, "title").unwrap_or_default();

    let studio = contains_ignore_case(&bedrooms_text, &selectors.studio_keyword);
    let bedrooms = if studio {
        0
    } else {
        parse_leading_int(&bedrooms_text, "bedrooms", &link)
    };

    Some(Listing {
        name,
        address: select_text(card, &selectors.address),
        price: parse_leading_int(&price_text, "price", &link),
        currency: select_text(card, &selectors.currency),
        period: select_text(card, &selectors.period),
        psf,
        area,
        furnished,
        property_type,
        amenities: Amenities {
            studio,
            bathrooms: parse_leading_int(&bathrooms_text, "bathrooms", &link),
            bedrooms,
        },
        link,
    })
}

/// Splits descriptor nodes into (furnished, property type)
///
/// The first node mentioning the furnished keyword becomes the furnished
/// descriptor. The first node mentioning neither keyword becomes the property
/// type. Matching is case-insensitive so "Unfurnished" counts as furnished
/// status.
pub fn classify_descriptors<I>(nodes: I, furnished_keyword: &str, excluded_keyword: &str) -> (String, String)
where
    I: IntoIterator<Item = String>,
{
    let mut furnished = String::new();
    let mut property_type = String::new();

    for text in nodes {
        if text.is_empty() {
            continue;
        }

        if contains_ignore_case(&text, furnished_keyword) {
            if furnished.is_empty() {
                furnished = text;
            }
        } else if !contains_ignore_case(&text, excluded_keyword) && property_type.is_empty() {
            property_type = text;
        }
    }

    (furnished, property_type)
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    !needle.is_empty() && haystack.to_lowercase().contains(&needle.to_lowercase())
}
