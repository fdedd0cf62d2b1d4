use crate::scout_browser::{
    behavioral::BehavioralEngine,
    fingerprint::UserAgentManager,
    page::ScoutPage,
    stealth::{build_stealth_arguments, StealthProfile},
};
use anyhow::{Context, Result};
use fantoccini::{Client, ClientBuilder};
use serde_json::json;
use tracing::{debug, info};
use webdriver::capabilities::Capabilities;

/// How to reach and configure the WebDriver-controlled browser.
#[derive(Debug, Clone)]
pub struct BrowserSettings {
    /// WebDriver endpoint, e.g. `http://localhost:9515` for chromedriver.
    pub webdriver_url: String,
    pub headless: bool,
    pub stealth: StealthProfile,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            webdriver_url: "http://localhost:9515".to_string(),
            headless: false,
            stealth: StealthProfile::Balanced,
        }
    }
}

/// Thin wrapper around a `fantoccini` WebDriver client with stealth and
/// behavioral helpers. One driver is one browser session.
pub struct ScoutDriver {
    client: Client,
    behavioral_engine: BehavioralEngine,
    user_agent_manager: UserAgentManager,
    stealth_profile: StealthProfile,
}

impl ScoutDriver {
    /// Start a browser session on the configured WebDriver service.
    pub async fn connect(settings: &BrowserSettings) -> Result<Self> {
        let mut user_agent_manager = UserAgentManager::new();
        let user_agent_profile = user_agent_manager.session_profile().clone();

        let args =
            build_stealth_arguments(settings.stealth, &user_agent_profile, settings.headless);
        let mut caps = Capabilities::new();
        caps.insert(
            "goog:chromeOptions".to_string(),
            json!({
                "args": args,
                "excludeSwitches": ["enable-automation"],
            }),
        );

        debug!(
            target: "browser.driver",
            endpoint = %settings.webdriver_url,
            user_agent = %user_agent_profile.user_agent,
            headless = settings.headless,
            "opening browser session"
        );

        let client = ClientBuilder::native()
            .capabilities(caps)
            .connect(&settings.webdriver_url)
            .await
            .with_context(|| {
                format!(
                    "failed to open a WebDriver session at {}",
                    settings.webdriver_url
                )
            })?;

        info!(target: "browser.driver", endpoint = %settings.webdriver_url, "browser session ready");

        Ok(Self {
            client,
            behavioral_engine: BehavioralEngine::new(),
            user_agent_manager,
            stealth_profile: settings.stealth,
        })
    }

    /// Navigate to `url` and return a [`ScoutPage`] with stealth/fingerprint
    /// scripts applied.
    pub async fn goto(&mut self, url: &str) -> Result<ScoutPage> {
        let mut page = ScoutPage::new(
            self.client.clone(),
            self.stealth_profile,
            self.user_agent_manager.clone(),
            self.behavioral_engine.clone(),
        );
        page.goto(url).await?;
        Ok(page)
    }

    /// Close the underlying browser session.
    pub async fn close(self) -> Result<()> {
        self.client.close().await?;
        info!(target: "browser.driver", "browser session closed");
        Ok(())
    }
}
