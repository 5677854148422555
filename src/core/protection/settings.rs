// Per-guild protection configuration.
//
// Every rule category gets its own defaulted sub-struct, deserialized
// straight into closed enums and validated once at load time. A default
// settings object is inert: protection is on, but no category is enabled.

use super::protection_models::RuleAction;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Invalid settings: {0}")]
    Invalid(String),
}

/// Trait for loading/saving per-guild settings.
///
/// Same port pattern as the stores in the other feature modules: the core
/// does not care whether this is SQLite or an in-memory map.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Fetch settings for a guild. `None` means the guild was never
    /// configured, which the pipeline treats as "protection off".
    async fn get_settings(&self, guild_id: u64) -> Result<Option<ProtectionSettings>, SettingsError>;

    /// Persist settings for a guild. Last write wins.
    async fn save_settings(
        &self,
        guild_id: u64,
        settings: ProtectionSettings,
    ) -> Result<(), SettingsError>;
}

/// Root per-guild configuration object.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtectionSettings {
    /// Master switch. Off means every message passes untouched.
    pub enabled: bool,
    pub bot_policy: BotPolicyConfig,
    pub prohibited_words: WordFilterConfig,
    pub blocked_links: LinkFilterConfig,
    pub moderation_gate: ModerationGateConfig,
    pub anti_spam: FloodConfig,
    pub image_policy: ImagePolicyConfig,
    pub channel_policy: ChannelPolicyConfig,
}

impl Default for ProtectionSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            bot_policy: BotPolicyConfig::default(),
            prohibited_words: WordFilterConfig::default(),
            blocked_links: LinkFilterConfig::default(),
            moderation_gate: ModerationGateConfig::default(),
            anti_spam: FloodConfig::default(),
            image_policy: ImagePolicyConfig::default(),
            channel_policy: ChannelPolicyConfig::default(),
        }
    }
}

impl ProtectionSettings {
    /// Validate once at load time so checkers never have to second-guess
    /// their inputs.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.anti_spam.enabled {
            if self.anti_spam.max_messages == 0 {
                return Err(SettingsError::Invalid(
                    "anti_spam.max_messages must be at least 1".to_string(),
                ));
            }
            if self.anti_spam.window_secs == 0 {
                return Err(SettingsError::Invalid(
                    "anti_spam.window_secs must be at least 1".to_string(),
                ));
            }
        }
        if self.prohibited_words.enabled
            && self.prohibited_words.words.iter().any(|w| w.trim().is_empty())
        {
            return Err(SettingsError::Invalid(
                "prohibited_words.words must not contain empty entries".to_string(),
            ));
        }
        if self.blocked_links.enabled
            && self
                .blocked_links
                .entries
                .iter()
                .any(|e| e.pattern.trim().is_empty())
        {
            return Err(SettingsError::Invalid(
                "blocked_links entries must have a non-empty pattern".to_string(),
            ));
        }
        Ok(())
    }
}

/// Bot-account policy: whether messages from other bots are tolerated.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BotPolicyConfig {
    pub enabled: bool,
    /// When false, bot accounts posting outside the whitelist are removed.
    pub allow_bots: bool,
    pub channel_whitelist: Vec<u64>,
}

impl Default for BotPolicyConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            allow_bots: true,
            channel_whitelist: Vec::new(),
        }
    }
}

/// Prohibited-words filter.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WordFilterConfig {
    pub enabled: bool,
    /// Matched case-insensitively as substrings.
    pub words: Vec<String>,
    pub punishment: RuleAction,
    /// Channel scope: when either list is non-empty, the filter only runs
    /// in channels from their union.
    pub attachment_channels: Vec<u64>,
    pub command_channels: Vec<u64>,
    /// Channels exempt from kick/ban; severe actions downgrade to delete.
    pub severe_whitelist: Vec<u64>,
}

impl Default for WordFilterConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            words: Vec::new(),
            punishment: RuleAction::Warn,
            attachment_channels: Vec::new(),
            command_channels: Vec::new(),
            severe_whitelist: Vec::new(),
        }
    }
}

/// Channel-scope semantics of one blocked-link entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkScope {
    /// The link is tolerated inside the listed channels; matches there are
    /// skipped and scanning continues.
    AllowOnlyHere,
    /// The entry only acts inside the listed channels.
    RestrictActionToHere,
}

/// One explicit blocked-link entry with its own action and channel scope.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BlockedLinkEntry {
    /// Case-insensitive substring to look for.
    pub pattern: String,
    pub action: RuleAction,
    /// Empty list means the entry applies everywhere regardless of scope.
    pub channels: Vec<u64>,
    pub scope: LinkScope,
}

impl Default for BlockedLinkEntry {
    fn default() -> Self {
        Self {
            pattern: String::new(),
            action: RuleAction::Delete,
            channels: Vec::new(),
            scope: LinkScope::AllowOnlyHere,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkFilterConfig {
    pub enabled: bool,
    /// When false, Discord invite links trigger the invite sub-check.
    pub allow_invites: bool,
    pub entries: Vec<BlockedLinkEntry>,
}

impl Default for LinkFilterConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            allow_invites: true,
            entries: Vec::new(),
        }
    }
}

/// Generic moderation gate: channels placed under lockdown reject all
/// traffic from regular members.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ModerationGateConfig {
    pub enabled: bool,
    pub locked_channels: Vec<u64>,
}

/// Message-flood (anti-spam) parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FloodConfig {
    pub enabled: bool,
    /// Messages allowed inside the window before the flood check fires.
    pub max_messages: u32,
    pub window_secs: u64,
    pub punishment: RuleAction,
    /// Channels exempt from kick/ban escalation (deletion still applies).
    pub escalation_whitelist: Vec<u64>,
}

impl Default for FloodConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            max_messages: 5,
            window_secs: 60,
            punishment: RuleAction::Mute,
            escalation_whitelist: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImagePolicyMode {
    AllowAll,
    BlockAll,
    Whitelist,
    Blacklist,
    TextRequired,
    TextWhitelist,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImagePolicyConfig {
    pub enabled: bool,
    pub mode: ImagePolicyMode,
    pub channels: Vec<u64>,
}

impl Default for ImagePolicyConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            mode: ImagePolicyMode::AllowAll,
            channels: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelPolicyMode {
    AllowAll,
    BlockAll,
    Whitelist,
    Blacklist,
}

/// Fine-grained per-channel content toggles for `allow_all` mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelContentRules {
    pub allow_images: bool,
    pub allow_files: bool,
    pub allow_text: bool,
    pub allow_commands: bool,
}

impl Default for ChannelContentRules {
    fn default() -> Self {
        Self {
            allow_images: true,
            allow_files: true,
            allow_text: true,
            allow_commands: true,
        }
    }
}

/// Destination-content policy: what kinds of content each channel accepts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelPolicyConfig {
    pub enabled: bool,
    pub mode: ChannelPolicyMode,
    pub channels: Vec<u64>,
    /// Per-channel toggles, consulted in `allow_all` mode.
    pub overrides: HashMap<u64, ChannelContentRules>,
}

impl Default for ChannelPolicyConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            mode: ChannelPolicyMode::AllowAll,
            channels: Vec::new(),
            overrides: HashMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_are_inert() {
        let settings = ProtectionSettings::default();
        assert!(settings.enabled);
        assert!(!settings.bot_policy.enabled);
        assert!(!settings.prohibited_words.enabled);
        assert!(!settings.blocked_links.enabled);
        assert!(!settings.moderation_gate.enabled);
        assert!(!settings.anti_spam.enabled);
        assert!(!settings.image_policy.enabled);
        assert!(!settings.channel_policy.enabled);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn validation_rejects_zero_flood_threshold() {
        let mut settings = ProtectionSettings::default();
        settings.anti_spam.enabled = true;
        settings.anti_spam.max_messages = 0;
        assert!(matches!(
            settings.validate(),
            Err(SettingsError::Invalid(_))
        ));
    }

    #[test]
    fn validation_rejects_empty_link_pattern() {
        let mut settings = ProtectionSettings::default();
        settings.blocked_links.enabled = true;
        settings.blocked_links.entries.push(BlockedLinkEntry::default());
        assert!(settings.validate().is_err());
    }

    #[test]
    fn settings_round_trip_through_json() {
        let mut settings = ProtectionSettings::default();
        settings.prohibited_words.enabled = true;
        settings.prohibited_words.words = vec!["badword".to_string()];
        settings.prohibited_words.punishment = RuleAction::Mute;
        settings
            .channel_policy
            .overrides
            .insert(42, ChannelContentRules {
                allow_images: false,
                ..Default::default()
            });

        let json = serde_json::to_string(&settings).unwrap();
        let back: ProtectionSettings = serde_json::from_str(&json).unwrap();
        assert_eq!(back.prohibited_words.punishment, RuleAction::Mute);
        assert!(!back.channel_policy.overrides[&42].allow_images);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let json = r#"{"anti_spam": {"enabled": true, "max_messages": 8}}"#;
        let settings: ProtectionSettings = serde_json::from_str(json).unwrap();
        assert!(settings.enabled);
        assert!(settings.anti_spam.enabled);
        assert_eq!(settings.anti_spam.max_messages, 8);
        assert_eq!(settings.anti_spam.window_secs, 60);
        assert_eq!(settings.anti_spam.punishment, RuleAction::Mute);
    }
}
