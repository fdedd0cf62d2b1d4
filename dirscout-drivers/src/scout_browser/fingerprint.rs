use rand::prelude::SliceRandom;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Snapshot of user agent, viewport, and locale characteristics.
pub struct UserAgentProfile {
    pub user_agent: String,
    pub viewport: (u32, u32),
    pub platform: String,
    pub languages: Vec<String>,
}

impl UserAgentProfile {
    fn windows_chrome() -> Self {
        Self {
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36".to_string(),
            viewport: (1920, 1080),
            platform: "Win32".to_string(),
            languages: vec!["en-US".to_string(), "en".to_string()],
        }
    }

    fn mac_chrome() -> Self {
        Self {
            user_agent: "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36".to_string(),
            viewport: (1440, 900),
            platform: "MacIntel".to_string(),
            languages: vec!["en-US".to_string(), "en".to_string()],
        }
    }

    fn linux_chrome() -> Self {
        Self {
            user_agent: "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36".to_string(),
            viewport: (1366, 768),
            platform: "Linux x86_64".to_string(),
            languages: vec!["en-US".to_string(), "en".to_string()],
        }
    }
}

#[derive(Debug, Clone)]
/// Maintains a small pool of plausible desktop fingerprint profiles and pins
/// one of them for the lifetime of a browser session.
pub struct UserAgentManager {
    desktop_profiles: Vec<UserAgentProfile>,
    current_session_profile: Option<UserAgentProfile>,
}

impl Default for UserAgentManager {
    fn default() -> Self {
        Self::new()
    }
}

impl UserAgentManager {
    /// Create a new manager with built-in desktop profiles.
    pub fn new() -> Self {
        Self {
            desktop_profiles: vec![
                UserAgentProfile::windows_chrome(),
                UserAgentProfile::mac_chrome(),
                UserAgentProfile::linux_chrome(),
            ],
            current_session_profile: None,
        }
    }

    /// Get (or lazily select at random) the current session profile.
    pub fn session_profile(&mut self) -> &UserAgentProfile {
        let profiles = &self.desktop_profiles;
        self.current_session_profile.get_or_insert_with(|| {
            let mut rng = rand::thread_rng();
            profiles
                .choose(&mut rng)
                .cloned()
                .unwrap_or_else(UserAgentProfile::windows_chrome)
        })
    }
}
