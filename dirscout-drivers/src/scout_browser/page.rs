use crate::scout_browser::{
    behavioral::BehavioralEngine,
    fingerprint::UserAgentManager,
    stealth::{StealthProfile, StealthScripts},
};
use anyhow::Result;
use fantoccini::{elements::Element, Client, Locator};

/// Jitter before each navigation, in milliseconds.
const NAVIGATION_JITTER_MS: (u64, u64) = (300, 1200);

/// Page wrapper providing navigation and element queries.
///
/// Queries never wait for elements to appear: the caller decides how long a
/// page gets to render, and an absent element is an empty result.
pub struct ScoutPage {
    pub(crate) client: Client,
    pub(crate) stealth_profile: StealthProfile,
    pub(crate) fingerprint_manager: UserAgentManager,
    pub(crate) behavioral_engine: BehavioralEngine,
}

impl ScoutPage {
    /// Construct a page wrapper around an existing WebDriver client.
    pub fn new(
        client: Client,
        stealth_profile: StealthProfile,
        fingerprint_manager: UserAgentManager,
        behavioral_engine: BehavioralEngine,
    ) -> Self {
        Self {
            client,
            stealth_profile,
            fingerprint_manager,
            behavioral_engine,
        }
    }

    /// Navigate to `url` and apply stealth/fingerprint scripts.
    pub async fn goto(&mut self, url: &str) -> Result<()> {
        let (min, max) = NAVIGATION_JITTER_MS;
        self.behavioral_engine.random_delay(min, max).await;
        self.client.goto(url).await?;

        self.apply_stealth_and_fingerprint().await?;

        Ok(())
    }

    async fn apply_stealth_and_fingerprint(&mut self) -> Result<()> {
        let profile = self.fingerprint_manager.session_profile().clone();
        self.client
            .execute(&StealthScripts::core_evasions(&profile), vec![])
            .await?;

        match self.stealth_profile {
            StealthProfile::Lightweight => {}
            StealthProfile::Balanced => {
                self.client
                    .execute(StealthScripts::canvas_evasions(), vec![])
                    .await?;
            }
            StealthProfile::Maximum => {
                self.client
                    .execute(StealthScripts::canvas_evasions(), vec![])
                    .await?;
                self.client
                    .execute(StealthScripts::webgl_evasions(), vec![])
                    .await?;
                self.client
                    .execute(&StealthScripts::platform_override(&profile), vec![])
                    .await?;
            }
        }
        Ok(())
    }

    /// Return the full rendered page HTML.
    pub async fn get_content(&self) -> Result<String> {
        Ok(self.client.source().await?)
    }

    /// Current page URL, after any redirects.
    pub async fn get_url(&self) -> Result<url::Url> {
        Ok(self.client.current_url().await?)
    }

    /// Find zero or more elements by CSS selector.
    pub async fn find_elements(&self, selector: &str) -> Result<Vec<ScoutElement>> {
        let elements = self.client.find_all(Locator::Css(selector)).await?;
        Ok(elements.into_iter().map(ScoutElement::new).collect())
    }
}

#[derive(Clone)]
/// Wrapper for DOM elements that provides typed helpers consistent with [`ScoutPage`].
pub struct ScoutElement {
    pub element: Element,
}

impl ScoutElement {
    pub fn new(element: Element) -> Self {
        Self { element }
    }

    /// Find zero or more child elements by CSS selector.
    pub async fn find_elements(&self, selector: &str) -> Result<Vec<ScoutElement>> {
        let elements = self.element.find_all(Locator::Css(selector)).await?;
        Ok(elements.into_iter().map(ScoutElement::new).collect())
    }

    /// First child matching `selector`, if any.
    pub async fn first(&self, selector: &str) -> Result<Option<ScoutElement>> {
        Ok(self.find_elements(selector).await?.into_iter().next())
    }

    /// Read a DOM property. For `href` this is the resolved absolute URL,
    /// not the raw attribute text.
    pub async fn get_property(&self, property: &str) -> Result<Option<String>> {
        Ok(self.element.prop(property).await?)
    }

    /// Return the element's visible text.
    pub async fn get_inner_text(&self) -> Result<String> {
        Ok(self.element.text().await?)
    }
}
