// Serenity-backed implementation of the PlatformClient port.
//
// Capability checks come from the cached guild member permissions, so a
// missing permission is caught before we burn an API call. Self-deleting
// notices are owned scheduled tasks: shutdown can abort them instead of
// leaking timers.

use crate::core::protection::{Capabilities, PlatformClient, PlatformError};
use async_trait::async_trait;
use poise::serenity_prelude as serenity;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;

pub struct SerenityPlatform {
    http: Arc<serenity::Http>,
    cache: Arc<serenity::Cache>,
    notice_tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl SerenityPlatform {
    pub fn new(http: Arc<serenity::Http>, cache: Arc<serenity::Cache>) -> Self {
        Self {
            http,
            cache,
            notice_tasks: Mutex::new(Vec::new()),
        }
    }

    /// Abort any pending notice deletions (shutdown, tests).
    #[allow(dead_code)]
    pub fn shutdown(&self) {
        let mut tasks = self.notice_tasks.lock().unwrap();
        for task in tasks.drain(..) {
            task.abort();
        }
    }

    fn track_notice_task(&self, handle: JoinHandle<()>) {
        let mut tasks = self.notice_tasks.lock().unwrap();
        tasks.retain(|t| !t.is_finished());
        tasks.push(handle);
    }
}

#[async_trait]
impl PlatformClient for SerenityPlatform {
    async fn capabilities(&self, guild_id: u64) -> Capabilities {
        let bot_id = self.cache.current_user().id;
        let Some(guild) = self.cache.guild(serenity::GuildId::new(guild_id)) else {
            return Capabilities::default();
        };
        let Some(member) = guild.members.get(&bot_id) else {
            return Capabilities::default();
        };
        let perms = guild.member_permissions(member);

        Capabilities {
            manage_messages: perms.manage_messages(),
            moderate_members: perms.moderate_members(),
            kick_members: perms.kick_members(),
            ban_members: perms.ban_members(),
        }
    }

    async fn delete_message(&self, channel_id: u64, message_id: u64) -> Result<(), PlatformError> {
        serenity::ChannelId::new(channel_id)
            .delete_message(&self.http, serenity::MessageId::new(message_id))
            .await
            .map_err(|e| PlatformError::Api(e.to_string()))
    }

    async fn post_notice(
        &self,
        channel_id: u64,
        text: &str,
        self_destruct: Option<Duration>,
    ) -> Result<(), PlatformError> {
        let message = serenity::ChannelId::new(channel_id)
            .say(&self.http, text)
            .await
            .map_err(|e| PlatformError::Api(e.to_string()))?;

        if let Some(ttl) = self_destruct {
            let http = Arc::clone(&self.http);
            let handle = tokio::spawn(async move {
                tokio::time::sleep(ttl).await;
                if let Err(e) = message.delete(&http).await {
                    tracing::warn!(message_id = message.id.get(), "Failed to delete notice: {}", e);
                }
            });
            self.track_notice_task(handle);
        }
        Ok(())
    }

    async fn timeout_member(
        &self,
        guild_id: u64,
        user_id: u64,
        duration: Duration,
        reason: &str,
    ) -> Result<(), PlatformError> {
        let until = serenity::Timestamp::from_unix_timestamp(
            chrono::Utc::now().timestamp() + duration.as_secs() as i64,
        )
        .map_err(|e| PlatformError::Api(format!("invalid timeout timestamp: {}", e)))?;

        tracing::debug!(guild_id, user_id, reason, "Applying communication timeout");
        serenity::GuildId::new(guild_id)
            .edit_member(
                &self.http,
                serenity::UserId::new(user_id),
                serenity::EditMember::new().disable_communication_until_datetime(until),
            )
            .await
            .map(|_| ())
            .map_err(|e| PlatformError::Api(e.to_string()))
    }

    async fn kick_member(
        &self,
        guild_id: u64,
        user_id: u64,
        reason: &str,
    ) -> Result<(), PlatformError> {
        serenity::GuildId::new(guild_id)
            .kick_with_reason(&self.http, serenity::UserId::new(user_id), reason)
            .await
            .map_err(|e| PlatformError::Api(e.to_string()))
    }

    async fn ban_member(
        &self,
        guild_id: u64,
        user_id: u64,
        reason: &str,
    ) -> Result<(), PlatformError> {
        serenity::GuildId::new(guild_id)
            .ban_with_reason(&self.http, serenity::UserId::new(user_id), 0, reason)
            .await
            .map_err(|e| PlatformError::Api(e.to_string()))
    }
}
