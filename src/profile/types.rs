//! Profile data types

use serde::{Deserialize, Serialize};

use crate::id::RecordId;

/// The streamer's public profile
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    #[serde(default)]
    pub name: String,
    /// Bio text
    #[serde(default)]
    pub info: String,
    #[serde(default)]
    pub photo_url: String,
    #[serde(default)]
    pub social_links: Vec<SocialLink>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialLink {
    #[serde(default)]
    pub platform: String,
    #[serde(default)]
    pub url: String,
}

/// Platforms that get a dedicated icon
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Twitch,
    YouTube,
    Instagram,
    Discord,
}

impl SocialLink {
    pub fn new(platform: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            platform: platform.into(),
            url: url.into(),
        }
    }

    /// Both platform and URL filled in
    pub fn is_complete(&self) -> bool {
        !self.platform.trim().is_empty() && !self.url.trim().is_empty()
    }

    pub fn known_platform(&self) -> Option<Platform> {
        match self.platform.trim().to_lowercase().as_str() {
            "twitch" => Some(Platform::Twitch),
            "youtube" => Some(Platform::YouTube),
            "instagram" => Some(Platform::Instagram),
            "discord" => Some(Platform::Discord),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_partial_profile() {
        let profile: Profile = serde_json::from_str(
            r#"{"_id":"u1","name":"Mochi","socialLinks":[{"platform":"Twitch","url":"https://twitch.tv/mochi"}]}"#,
        )
        .unwrap();
        assert_eq!(profile.name, "Mochi");
        assert_eq!(profile.info, "");
        assert_eq!(profile.photo_url, "");
        assert_eq!(profile.social_links[0].known_platform(), Some(Platform::Twitch));
    }

    #[test]
    fn test_platform_detection() {
        assert_eq!(SocialLink::new("YouTube", "u").known_platform(), Some(Platform::YouTube));
        assert_eq!(SocialLink::new(" discord ", "u").known_platform(), Some(Platform::Discord));
        assert_eq!(SocialLink::new("Bluesky", "u").known_platform(), None);
    }

    #[test]
    fn test_link_completeness() {
        assert!(SocialLink::new("twitch", "https://twitch.tv/x").is_complete());
        assert!(!SocialLink::new("", "https://twitch.tv/x").is_complete());
        assert!(!SocialLink::new("twitch", " ").is_complete());
    }
}
