// Punishment executor - turns an infraction into privileged platform
// operations, with capability pre-checks and graceful degradation.
//
// Failures never propagate past this boundary: every branch produces a
// PunishmentResult and the worst user-visible outcome is an action that
// silently did not happen.

use super::protection_models::{Infraction, MessageEvent, PunishmentResult, RuleAction, RuleCategory};
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Default mute length: ten minutes.
pub const DEFAULT_MUTE_DURATION: Duration = Duration::from_secs(10 * 60);
/// Self-deleting notices disappear after this long.
pub const NOTICE_TTL: Duration = Duration::from_secs(12);

#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("platform API error: {0}")]
    Api(String),
}

/// What the bot is allowed to do in a guild.
#[derive(Debug, Clone, Copy, Default)]
pub struct Capabilities {
    pub manage_messages: bool,
    pub moderate_members: bool,
    pub kick_members: bool,
    pub ban_members: bool,
}

/// Port over the chat platform's privileged operations.
///
/// The Discord implementation lives in the discord layer; tests use an
/// in-memory mock.
#[async_trait]
pub trait PlatformClient: Send + Sync {
    async fn capabilities(&self, guild_id: u64) -> Capabilities;

    async fn delete_message(&self, channel_id: u64, message_id: u64) -> Result<(), PlatformError>;

    /// Post a channel message; with a TTL the message deletes itself.
    async fn post_notice(
        &self,
        channel_id: u64,
        text: &str,
        self_destruct: Option<Duration>,
    ) -> Result<(), PlatformError>;

    async fn timeout_member(
        &self,
        guild_id: u64,
        user_id: u64,
        duration: Duration,
        reason: &str,
    ) -> Result<(), PlatformError>;

    async fn kick_member(&self, guild_id: u64, user_id: u64, reason: &str)
        -> Result<(), PlatformError>;

    async fn ban_member(&self, guild_id: u64, user_id: u64, reason: &str)
        -> Result<(), PlatformError>;
}

#[async_trait]
impl<P: PlatformClient> PlatformClient for std::sync::Arc<P> {
    async fn capabilities(&self, guild_id: u64) -> Capabilities {
        (**self).capabilities(guild_id).await
    }

    async fn delete_message(&self, channel_id: u64, message_id: u64) -> Result<(), PlatformError> {
        (**self).delete_message(channel_id, message_id).await
    }

    async fn post_notice(
        &self,
        channel_id: u64,
        text: &str,
        self_destruct: Option<Duration>,
    ) -> Result<(), PlatformError> {
        (**self).post_notice(channel_id, text, self_destruct).await
    }

    async fn timeout_member(
        &self,
        guild_id: u64,
        user_id: u64,
        duration: Duration,
        reason: &str,
    ) -> Result<(), PlatformError> {
        (**self).timeout_member(guild_id, user_id, duration, reason).await
    }

    async fn kick_member(&self, guild_id: u64, user_id: u64, reason: &str) -> Result<(), PlatformError> {
        (**self).kick_member(guild_id, user_id, reason).await
    }

    async fn ban_member(&self, guild_id: u64, user_id: u64, reason: &str) -> Result<(), PlatformError> {
        (**self).ban_member(guild_id, user_id, reason).await
    }
}

pub struct PunishmentExecutor<P: PlatformClient> {
    platform: P,
    mute_duration: Duration,
}

impl<P: PlatformClient> PunishmentExecutor<P> {
    pub fn new(platform: P) -> Self {
        Self {
            platform,
            mute_duration: DEFAULT_MUTE_DURATION,
        }
    }

    #[allow(dead_code)]
    pub fn with_mute_duration(mut self, duration: Duration) -> Self {
        self.mute_duration = duration;
        self
    }

    /// Post a first-offense advisory notice. Failures are logged only.
    pub async fn post_advisory(&self, event: &MessageEvent, notice: &str) {
        if let Err(e) = self
            .platform
            .post_notice(event.channel_id, notice, Some(NOTICE_TTL))
            .await
        {
            tracing::warn!(channel_id = event.channel_id, error = %e, "Failed to post advisory notice");
        }
    }

    /// Apply the requested action. Never errors; the result reports what
    /// actually happened.
    pub async fn execute(&self, event: &MessageEvent, infraction: &Infraction) -> PunishmentResult {
        // Flood excess first; each failure is isolated.
        for message_id in &infraction.extra_deletions {
            if let Err(e) = self.platform.delete_message(event.channel_id, *message_id).await {
                tracing::warn!(message_id, error = %e, "Failed to delete excess flood message");
            }
        }

        match infraction.action {
            RuleAction::None => {
                if let Some(notice) = &infraction.notice {
                    self.post_advisory(event, notice).await;
                }
                tracing::info!(reason = %infraction.reason, "No-op punishment");
                PunishmentResult::ok("no action")
            }
            RuleAction::Delete => self.delete(event, infraction).await,
            RuleAction::Warn => self.warn(event, infraction).await,
            RuleAction::Mute => self.mute(event, infraction).await,
            RuleAction::Kick => self.kick(event, infraction).await,
            RuleAction::Ban => self.ban(event, infraction).await,
        }
    }

    async fn delete_event_message(&self, event: &MessageEvent) -> Result<(), PlatformError> {
        self.platform
            .delete_message(event.channel_id, event.message_id)
            .await
    }

    async fn delete(&self, event: &MessageEvent, infraction: &Infraction) -> PunishmentResult {
        if let Err(e) = self.delete_event_message(event).await {
            tracing::error!(message_id = event.message_id, error = %e, "Failed to delete message");
            return PunishmentResult::failed(format!("message deletion failed: {}", e));
        }
        // Link-related deletions explain themselves; a failed notice does
        // not undo the successful delete.
        if let Some(notice) = &infraction.notice {
            self.post_advisory(event, notice).await;
        }
        PunishmentResult::ok("message deleted")
    }

    async fn warn(&self, event: &MessageEvent, infraction: &Infraction) -> PunishmentResult {
        let delete_ok = match self.delete_event_message(event).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(message_id = event.message_id, error = %e, "Failed to delete warned message");
                false
            }
        };

        let notice = infraction.notice.clone().unwrap_or_else(|| {
            format!("{}, this is a warning: {}.", event.author_name, infraction.reason)
        });
        self.post_advisory(event, &notice).await;

        if delete_ok {
            PunishmentResult::ok("user warned, message deleted")
        } else {
            PunishmentResult::failed("user warned, but message deletion failed")
        }
    }

    async fn mute(&self, event: &MessageEvent, infraction: &Infraction) -> PunishmentResult {
        let caps = self.platform.capabilities(event.guild_id).await;
        if !caps.moderate_members {
            // Degrade: the message still goes away.
            if infraction.delete_message {
                if let Err(e) = self.delete_event_message(event).await {
                    tracing::warn!(error = %e, "Failed to delete message while degrading mute");
                }
            }
            return PunishmentResult::failed("missing moderate-members permission; message removed only");
        }

        if let Err(e) = self
            .platform
            .timeout_member(event.guild_id, event.author_id, self.mute_duration, &infraction.reason)
            .await
        {
            tracing::error!(user_id = event.author_id, error = %e, "Failed to timeout member");
            if infraction.delete_message {
                if let Err(e) = self.delete_event_message(event).await {
                    tracing::warn!(error = %e, "Failed to delete message after timeout failure");
                }
            }
            return PunishmentResult::failed(format!("timeout failed: {}; message removed only", e));
        }

        if infraction.delete_message {
            if let Err(e) = self.delete_event_message(event).await {
                tracing::warn!(error = %e, "Failed to delete muted user's message");
            }
        }
        self.post_advisory(
            event,
            &format!(
                "{} has been muted for {} minutes: {}.",
                event.author_name,
                self.mute_duration.as_secs() / 60,
                infraction.reason
            ),
        )
        .await;

        PunishmentResult::ok(format!(
            "user muted for {} minutes",
            self.mute_duration.as_secs() / 60
        ))
    }

    async fn kick(&self, event: &MessageEvent, infraction: &Infraction) -> PunishmentResult {
        let caps = self.platform.capabilities(event.guild_id).await;
        if !caps.kick_members {
            // Bot-account removals degrade to deleting the message; a
            // regular kick just fails without touching the message.
            if infraction.category == RuleCategory::BotAccounts {
                return match self.delete_event_message(event).await {
                    Ok(()) => PunishmentResult::failed(
                        "missing kick-members permission; bot message removed instead",
                    ),
                    Err(e) => PunishmentResult::failed(format!(
                        "missing kick-members permission and message deletion failed: {}",
                        e
                    )),
                };
            }
            return PunishmentResult::failed("missing kick-members permission");
        }

        if infraction.delete_message {
            if let Err(e) = self.delete_event_message(event).await {
                tracing::warn!(error = %e, "Failed to delete message before kick");
            }
        }

        match self
            .platform
            .kick_member(event.guild_id, event.author_id, &infraction.reason)
            .await
        {
            Ok(()) => PunishmentResult::ok("user kicked"),
            Err(e) => {
                tracing::error!(user_id = event.author_id, error = %e, "Failed to kick member");
                if infraction.category == RuleCategory::BotAccounts {
                    if let Err(e) = self.delete_event_message(event).await {
                        tracing::warn!(error = %e, "Failed to delete bot message after kick failure");
                    }
                }
                PunishmentResult::failed(format!("kick failed: {}", e))
            }
        }
    }

    async fn ban(&self, event: &MessageEvent, infraction: &Infraction) -> PunishmentResult {
        let caps = self.platform.capabilities(event.guild_id).await;
        if !caps.ban_members {
            return PunishmentResult::failed("missing ban-members permission");
        }

        if infraction.delete_message {
            if let Err(e) = self.delete_event_message(event).await {
                tracing::warn!(error = %e, "Failed to delete message before ban");
            }
        }

        match self
            .platform
            .ban_member(event.guild_id, event.author_id, &infraction.reason)
            .await
        {
            Ok(()) => PunishmentResult::ok("user banned"),
            Err(e) => {
                tracing::error!(user_id = event.author_id, error = %e, "Failed to ban member");
                PunishmentResult::failed(format!("ban failed: {}", e))
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod mock {
    use super::*;
    use std::sync::Mutex;

    /// Recorded platform calls, for asserting side effects.
    #[derive(Debug, Clone, PartialEq)]
    pub enum PlatformCall {
        Delete { channel_id: u64, message_id: u64 },
        Notice { channel_id: u64, text: String, self_destruct: bool },
        Timeout { guild_id: u64, user_id: u64, secs: u64 },
        Kick { guild_id: u64, user_id: u64 },
        Ban { guild_id: u64, user_id: u64 },
    }

    #[derive(Default)]
    pub struct MockPlatform {
        pub caps: Capabilities,
        pub fail_timeouts: bool,
        pub calls: Mutex<Vec<PlatformCall>>,
    }

    impl MockPlatform {
        pub fn with_caps(caps: Capabilities) -> Self {
            Self {
                caps,
                ..Default::default()
            }
        }

        pub fn full_caps() -> Self {
            Self::with_caps(Capabilities {
                manage_messages: true,
                moderate_members: true,
                kick_members: true,
                ban_members: true,
            })
        }

        pub fn calls(&self) -> Vec<PlatformCall> {
            self.calls.lock().unwrap().clone()
        }

        pub fn deletions(&self) -> usize {
            self.calls()
                .iter()
                .filter(|c| matches!(c, PlatformCall::Delete { .. }))
                .count()
        }
    }

    #[async_trait]
    impl PlatformClient for MockPlatform {
        async fn capabilities(&self, _guild_id: u64) -> Capabilities {
            self.caps
        }

        async fn delete_message(&self, channel_id: u64, message_id: u64) -> Result<(), PlatformError> {
            self.calls.lock().unwrap().push(PlatformCall::Delete { channel_id, message_id });
            Ok(())
        }

        async fn post_notice(
            &self,
            channel_id: u64,
            text: &str,
            self_destruct: Option<Duration>,
        ) -> Result<(), PlatformError> {
            self.calls.lock().unwrap().push(PlatformCall::Notice {
                channel_id,
                text: text.to_string(),
                self_destruct: self_destruct.is_some(),
            });
            Ok(())
        }

        async fn timeout_member(
            &self,
            guild_id: u64,
            user_id: u64,
            duration: Duration,
            _reason: &str,
        ) -> Result<(), PlatformError> {
            if self.fail_timeouts {
                return Err(PlatformError::Api("timeout rejected".to_string()));
            }
            self.calls.lock().unwrap().push(PlatformCall::Timeout {
                guild_id,
                user_id,
                secs: duration.as_secs(),
            });
            Ok(())
        }

        async fn kick_member(&self, guild_id: u64, user_id: u64, _reason: &str) -> Result<(), PlatformError> {
            self.calls.lock().unwrap().push(PlatformCall::Kick { guild_id, user_id });
            Ok(())
        }

        async fn ban_member(&self, guild_id: u64, user_id: u64, _reason: &str) -> Result<(), PlatformError> {
            self.calls.lock().unwrap().push(PlatformCall::Ban { guild_id, user_id });
            Ok(())
        }
    }
}
