use serde::{Deserialize, Serialize};

/// Stands in for any field the listing does not show.
pub const PLACEHOLDER: &str = "-";

/// Column names, in file order.
pub const HEADER: [&str; 4] = ["Business Name", "Address", "Phone", "Website"];

/// One business listing, serialized as one CSV row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingRecord {
    #[serde(rename = "Business Name")]
    pub business_name: String,
    #[serde(rename = "Address")]
    pub address: String,
    #[serde(rename = "Phone")]
    pub phone: String,
    #[serde(rename = "Website")]
    pub website: String,
}

impl ListingRecord {
    /// Street and locality joined as `"<street>, <locality>"`; each missing
    /// part is the placeholder.
    pub fn join_address(street: Option<&str>, locality: Option<&str>) -> String {
        format!(
            "{}, {}",
            street.unwrap_or(PLACEHOLDER),
            locality.unwrap_or(PLACEHOLDER)
        )
    }
}
