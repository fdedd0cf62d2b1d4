use dirscout_common::{Result, ScoutError};
use url::{form_urlencoded, Url};

/// What to search for and where. Immutable once a run starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    term: String,
    location: String,
}

impl SearchQuery {
    /// Build a query from free-text input. Both parts are trimmed and must
    /// be non-empty.
    pub fn new(term: &str, location: &str) -> Result<Self> {
        let term = term.trim();
        let location = location.trim();
        if term.is_empty() || location.is_empty() {
            return Err(ScoutError::InvalidQuery(
                "Please enter both search term and location.".into(),
            ));
        }
        Ok(Self {
            term: term.to_string(),
            location: location.to_string(),
        })
    }

    pub fn term(&self) -> &str {
        &self.term
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    /// Fill `{term}`, `{location}` and `{page}` in `template`.
    pub fn page_url(&self, template: &str, page: u32) -> Result<Url> {
        let rendered = template
            .replace("{term}", &encode_component(&self.term))
            .replace("{location}", &encode_component(&self.location))
            .replace("{page}", &page.to_string());

        Url::parse(&rendered)
            .map_err(|e| ScoutError::InvalidQuery(format!("cannot build page URL {rendered}: {e}")))
    }
}

/// Collapse whitespace runs into `+` and percent-encode everything else
/// that is not URL-safe.
pub fn encode_component(raw: &str) -> String {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    form_urlencoded::byte_serialize(collapsed.as_bytes()).collect()
}
