// Protection domain models - data structures for the moderation pipeline.
//
// These are pure domain types with no Discord dependencies.
// The Discord layer converts inbound gateway events into a MessageEvent
// and translates verdicts back into platform actions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Prefix that marks a message as a bot command for content policy purposes.
pub const COMMAND_PREFIX: char = '!';

/// Descriptor of a single message attachment.
#[derive(Debug, Clone, PartialEq)]
pub struct AttachmentInfo {
    pub filename: String,
    pub content_type: Option<String>,
    pub size: u64,
}

impl AttachmentInfo {
    /// Whether this attachment is an image, judged by content type first
    /// and filename extension as a fallback.
    pub fn is_image(&self) -> bool {
        if let Some(ct) = &self.content_type {
            return ct.starts_with("image/");
        }
        let name = self.filename.to_lowercase();
        name.ends_with(".png")
            || name.ends_with(".jpg")
            || name.ends_with(".jpeg")
            || name.ends_with(".gif")
            || name.ends_with(".webp")
    }
}

/// Immutable snapshot of an inbound message.
///
/// Created once per gateway event and never mutated; lives for the
/// duration of one pipeline evaluation.
#[derive(Debug, Clone)]
pub struct MessageEvent {
    pub guild_id: u64,
    pub channel_id: u64,
    pub channel_name: String,
    pub message_id: u64,
    pub author_id: u64,
    pub author_name: String,
    pub author_is_bot: bool,
    pub content: String,
    pub attachments: Vec<AttachmentInfo>,
    pub timestamp: DateTime<Utc>,
}

impl MessageEvent {
    pub fn has_text(&self) -> bool {
        !self.content.trim().is_empty()
    }

    pub fn has_image(&self) -> bool {
        self.attachments.iter().any(|a| a.is_image())
    }

    /// Non-image attachment (archives, executables, documents...).
    pub fn has_file(&self) -> bool {
        self.attachments.iter().any(|a| !a.is_image())
    }

    pub fn is_command(&self) -> bool {
        self.content.trim_start().starts_with(COMMAND_PREFIX)
    }
}

/// Enforcement action requested by a rule checker.
///
/// Deserialized directly from configuration - no runtime label translation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleAction {
    None,
    Warn,
    Delete,
    Mute,
    Kick,
    Ban,
}

impl RuleAction {
    /// Kick and ban are "severe" - channel whitelists can downgrade them.
    pub fn is_severe(&self) -> bool {
        matches!(self, RuleAction::Kick | RuleAction::Ban)
    }

    /// Whether this action removes the triggering message as a side effect.
    pub fn deletes_message(&self) -> bool {
        matches!(self, RuleAction::Warn | RuleAction::Delete | RuleAction::Mute)
    }
}

impl std::fmt::Display for RuleAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RuleAction::None => "none",
            RuleAction::Warn => "warn",
            RuleAction::Delete => "delete",
            RuleAction::Mute => "mute",
            RuleAction::Kick => "kick",
            RuleAction::Ban => "ban",
        };
        write!(f, "{}", s)
    }
}

/// Rule category, used as the ledger key for offense escalation and for audit.
///
/// `DiscordInvites` and `BlockedLinks` are tracked separately on purpose:
/// their escalation curves differ.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleCategory {
    BotAccounts,
    DuplicateMessages,
    ProhibitedWords,
    DiscordInvites,
    BlockedLinks,
    ModerationGate,
    AntiSpam,
    ImagePolicy,
    ChannelPolicy,
}

impl std::fmt::Display for RuleCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RuleCategory::BotAccounts => "bot_accounts",
            RuleCategory::DuplicateMessages => "duplicate_messages",
            RuleCategory::ProhibitedWords => "prohibited_words",
            RuleCategory::DiscordInvites => "discord_invites",
            RuleCategory::BlockedLinks => "blocked_links",
            RuleCategory::ModerationGate => "moderation_gate",
            RuleCategory::AntiSpam => "anti_spam",
            RuleCategory::ImagePolicy => "image_policy",
            RuleCategory::ChannelPolicy => "channel_policy",
        };
        write!(f, "{}", s)
    }
}

/// A single rule violation with the action the checker wants applied.
#[derive(Debug, Clone, PartialEq)]
pub struct Infraction {
    pub category: RuleCategory,
    pub action: RuleAction,
    pub reason: String,
    /// Optional user-facing notice posted alongside the action.
    pub notice: Option<String>,
    /// Whether the triggering message must be removed. Defaults from the
    /// action, but e.g. blocked-link matches always delete regardless.
    pub delete_message: bool,
    /// Additional message ids to remove (flood excess, oldest first).
    pub extra_deletions: Vec<u64>,
}

impl Infraction {
    pub fn new(category: RuleCategory, action: RuleAction, reason: impl Into<String>) -> Self {
        Self {
            category,
            action,
            reason: reason.into(),
            notice: None,
            delete_message: action.deletes_message(),
            extra_deletions: Vec::new(),
        }
    }

    pub fn with_notice(mut self, notice: impl Into<String>) -> Self {
        self.notice = Some(notice.into());
        self
    }

    pub fn always_delete(mut self) -> Self {
        self.delete_message = true;
        self
    }

    pub fn with_extra_deletions(mut self, message_ids: Vec<u64>) -> Self {
        self.extra_deletions = message_ids;
        self
    }
}

/// The result of one rule checker.
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    /// No action.
    Pass,
    /// No enforcement, but notify the user (first-offense leniency).
    /// The pipeline posts the notice and keeps evaluating.
    Advise {
        category: RuleCategory,
        notice: String,
    },
    /// Stop the pipeline and hand the infraction to the punishment executor.
    Block(Infraction),
}

/// Result of one punishment executor invocation. Failures are reported
/// here, never raised.
#[derive(Debug, Clone, PartialEq)]
pub struct PunishmentResult {
    pub success: bool,
    pub description: String,
}

impl PunishmentResult {
    pub fn ok(description: impl Into<String>) -> Self {
        Self {
            success: true,
            description: description.into(),
        }
    }

    pub fn failed(description: impl Into<String>) -> Self {
        Self {
            success: false,
            description: description.into(),
        }
    }
}

/// Final outcome of one pipeline evaluation.
#[derive(Debug, Clone)]
pub struct Outcome {
    pub verdict: Verdict,
    pub punishment: Option<PunishmentResult>,
    /// Advisory notices posted along the way (first-offense warnings).
    pub advisories: Vec<String>,
}

impl Outcome {
    pub fn pass() -> Self {
        Self {
            verdict: Verdict::Pass,
            punishment: None,
            advisories: Vec::new(),
        }
    }

    pub fn is_pass(&self) -> bool {
        matches!(self.verdict, Verdict::Pass)
    }
}
