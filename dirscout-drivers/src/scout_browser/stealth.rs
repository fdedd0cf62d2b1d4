use dirscout_common::StealthLevel;
use serde::{Deserialize, Serialize};

use super::fingerprint::UserAgentProfile;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
/// Levels of stealth applied to the browser session.
pub enum StealthProfile {
    Lightweight,
    Balanced,
    Maximum,
}

impl From<StealthLevel> for StealthProfile {
    fn from(level: StealthLevel) -> Self {
        match level {
            StealthLevel::Lightweight => StealthProfile::Lightweight,
            StealthLevel::Balanced => StealthProfile::Balanced,
            StealthLevel::Maximum => StealthProfile::Maximum,
        }
    }
}

/// Construct Chrome command-line arguments for a given stealth profile
/// and fingerprint.
pub fn build_stealth_arguments(
    profile: StealthProfile,
    user_profile: &UserAgentProfile,
    headless: bool,
) -> Vec<String> {
    let mut args = vec![
        "--disable-blink-features=AutomationControlled".to_string(),
        "--disable-infobars".to_string(),
        "--disable-dev-shm-usage".to_string(),
        "--no-sandbox".to_string(),
        "--disable-extensions".to_string(),
        "--disable-plugins-discovery".to_string(),
        format!("--user-agent={}", user_profile.user_agent),
        format!(
            "--window-size={},{}",
            user_profile.viewport.0, user_profile.viewport.1
        ),
        format!("--lang={}", user_profile.languages.join(",")),
    ];
    if headless {
        // new headless mode keeps the full browser feature set
        args.push("--headless=new".to_string());
    }
    if headless || profile == StealthProfile::Maximum {
        args.push("--disable-gpu".to_string());
    }
    args
}

/// JavaScript evasions applied at page load to reduce automation signals.
pub struct StealthScripts;

impl StealthScripts {
    /// Hide `navigator.webdriver` and align `navigator.languages` with the
    /// session fingerprint.
    pub fn core_evasions(user_profile: &UserAgentProfile) -> String {
        let languages =
            serde_json::to_string(&user_profile.languages).unwrap_or_else(|_| "[]".into());
        format!(
            r#"
            Object.defineProperty(navigator, 'webdriver', {{ get: () => undefined }});
            Object.defineProperty(navigator, 'plugins', {{ get: () => [1,2,3] }});
            Object.defineProperty(navigator, 'languages', {{ get: () => {languages} }});
            if (!window.chrome) window.chrome = {{ runtime: {{}} }};
        "#
        )
    }

    pub fn platform_override(user_profile: &UserAgentProfile) -> String {
        let platform =
            serde_json::to_string(&user_profile.platform).unwrap_or_else(|_| "\"\"".into());
        format!("Object.defineProperty(navigator, 'platform', {{ get: () => {platform} }});")
    }

    pub fn webgl_evasions() -> &'static str {
        r#"
            const getParameter = WebGLRenderingContext.prototype.getParameter;
            WebGLRenderingContext.prototype.getParameter = function(parameter) {
                if (parameter === 37445) return 'Intel Inc.';
                if (parameter === 37446) return 'Intel Iris OpenGL Engine';
                return getParameter.call(this, parameter);
            };
        "#
    }

    pub fn canvas_evasions() -> &'static str {
        r#"
            const getContext = HTMLCanvasElement.prototype.getContext;
            HTMLCanvasElement.prototype.getContext = function(type, ...args) {
                const ctx = getContext.call(this, type, ...args);
                if (type === '2d' && ctx) {
                    const origToDataURL = this.toDataURL;
                    this.toDataURL = function(...a) {
                        const img = ctx.getImageData(0, 0, this.width, this.height);
                        for (let i = 0; i < img.data.length; i += 4) {
                            if (Math.random() < 0.001) img.data[i] += Math.random() < 0.5 ? -1 : 1;
                        }
                        ctx.putImageData(img, 0, 0);
                        return origToDataURL.call(this, ...a);
                    };
                }
                return ctx;
            };
        "#
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scout_browser::fingerprint::UserAgentManager;

    fn profile() -> UserAgentProfile {
        UserAgentManager::new().session_profile().clone()
    }

    #[test]
    fn arguments_carry_fingerprint() {
        let p = profile();
        let args = build_stealth_arguments(StealthProfile::Balanced, &p, false);
        assert!(args.contains(&"--disable-blink-features=AutomationControlled".to_string()));
        assert!(args.contains(&format!("--user-agent={}", p.user_agent)));
        assert!(!args.iter().any(|a| a.starts_with("--headless")));
        assert!(!args.contains(&"--disable-gpu".to_string()));
    }

    #[test]
    fn headless_adds_headless_flags() {
        let args = build_stealth_arguments(StealthProfile::Lightweight, &profile(), true);
        assert!(args.contains(&"--headless=new".to_string()));
        assert!(args.contains(&"--disable-gpu".to_string()));
    }

    #[test]
    fn level_maps_to_profile() {
        assert_eq!(
            StealthProfile::from(StealthLevel::Maximum),
            StealthProfile::Maximum
        );
        assert_eq!(
            StealthProfile::from(StealthLevel::default()),
            StealthProfile::Balanced
        );
    }

    #[test]
    fn core_evasions_embed_languages() {
        let script = StealthScripts::core_evasions(&profile());
        assert!(script.contains(r#"["en-US","en"]"#));
        assert!(script.contains("'webdriver'"));
    }
}
