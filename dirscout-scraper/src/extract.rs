use dirscout_config::SelectorConfig;
use thiserror::Error;
use tracing::{debug, info};

use crate::fetch::CardHandle;
use crate::record::{ListingRecord, PLACEHOLDER};

/// Why a card produced no record.
#[derive(Debug, Error)]
pub enum CardError {
    #[error("business card has no name")]
    MissingName,
    #[error("failed to read business name: {0}")]
    Query(#[source] anyhow::Error),
}

/// Records from one page plus the cards that were skipped.
#[derive(Debug, Default)]
pub struct PageExtraction {
    pub records: Vec<ListingRecord>,
    pub skipped: Vec<CardError>,
}

/// Build a record from one card. Only the name is required; every other
/// field degrades to the placeholder.
pub async fn extract_card(
    card: &dyn CardHandle,
    selectors: &SelectorConfig,
) -> Result<ListingRecord, CardError> {
    let business_name = card
        .text_of(&selectors.name)
        .await
        .map_err(CardError::Query)?
        .and_then(non_empty)
        .ok_or(CardError::MissingName)?;

    let street = optional_text(card, &selectors.street, "street").await;
    let locality = optional_text(card, &selectors.locality, "locality").await;
    let phone = optional_text(card, &selectors.phone, "phone").await;
    let website = match card.attr_of(&selectors.website, "href").await {
        Ok(value) => value.and_then(non_empty),
        Err(e) => {
            debug!(target: "scraper.extract", field = "website", error = %e, "field lookup failed");
            None
        }
    };

    Ok(ListingRecord {
        business_name,
        address: ListingRecord::join_address(street.as_deref(), locality.as_deref()),
        phone: phone.unwrap_or_else(|| PLACEHOLDER.to_string()),
        website: website.unwrap_or_else(|| PLACEHOLDER.to_string()),
    })
}

/// Extract every card of a page. Card failures stay inside the card.
pub async fn extract_page(
    cards: &[Box<dyn CardHandle>],
    selectors: &SelectorConfig,
) -> PageExtraction {
    let mut out = PageExtraction::default();
    for (index, card) in cards.iter().enumerate() {
        match extract_card(card.as_ref(), selectors).await {
            Ok(record) => out.records.push(record),
            Err(e) => {
                info!(target: "scraper.extract", card = index, error = %e, "skipping business card");
                out.skipped.push(e);
            }
        }
    }
    out
}

async fn optional_text(
    card: &dyn CardHandle,
    selector: &str,
    field: &'static str,
) -> Option<String> {
    match card.text_of(selector).await {
        Ok(value) => value.and_then(non_empty),
        Err(e) => {
            debug!(target: "scraper.extract", field, error = %e, "field lookup failed");
            None
        }
    }
}

fn non_empty(raw: String) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else if trimmed.len() == raw.len() {
        Some(raw)
    } else {
        Some(trimmed.to_string())
    }
}
