// Protection slash commands for configuration.

use crate::core::audit::AuditSink;
use crate::core::protection::{ProtectionService, RuleCategory};
use crate::discord::platform::SerenityPlatform;
use crate::infra::protection::SqliteSettingsStore;
use poise::serenity_prelude as serenity;
use std::sync::Arc;

/// Type alias for our bot's context.
/// This is what every command receives as its first parameter.
pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Context<'a> = poise::Context<'a, Data, Error>;

/// Data that's shared across all commands and event handlers.
pub struct Data {
    pub protection: Arc<ProtectionService<SqliteSettingsStore, Arc<SerenityPlatform>>>,
    pub audit: Arc<dyn AuditSink>,
}

#[derive(Debug, Clone, Copy, poise::ChoiceParameter)]
pub enum WarningCategoryChoice {
    #[name = "Discord Invites"]
    DiscordInvites,
    #[name = "Blocked Links"]
    BlockedLinks,
    #[name = "All Categories"]
    All,
}

impl WarningCategoryChoice {
    fn to_category(self) -> Option<RuleCategory> {
        match self {
            Self::DiscordInvites => Some(RuleCategory::DiscordInvites),
            Self::BlockedLinks => Some(RuleCategory::BlockedLinks),
            Self::All => None,
        }
    }
}

/// Server protection configuration commands.
///
/// Configure message protection for your server.
#[poise::command(
    slash_command,
    subcommands("status", "enable", "disable", "reset_warnings", "lock", "unlock"),
    required_permissions = "MANAGE_MESSAGES",
    guild_only
)]
pub async fn protection(_ctx: Context<'_>) -> Result<(), Error> {
    // Parent command - shows help
    Ok(())
}

/// Show current protection status and which rules are active.
#[poise::command(slash_command, guild_only)]
pub async fn status(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be used in a server")?;

    let settings = ctx
        .data()
        .protection
        .get_settings(guild_id.get())
        .await
        .map_err(|e| Error::from(e.to_string()))?
        .unwrap_or_default();

    let status_emoji = if settings.enabled { "✅" } else { "❌" };
    let on_off = |enabled: bool| if enabled { "✅ On" } else { "❌ Off" };

    let embed = serenity::CreateEmbed::new()
        .title("🛡️ Protection Status")
        .color(if settings.enabled { 0x00FF00 } else { 0xFF0000 })
        .field(
            "Status",
            format!(
                "{} {}",
                status_emoji,
                if settings.enabled {
                    "Enabled"
                } else {
                    "Disabled"
                }
            ),
            false,
        )
        .field("Bot Accounts", on_off(settings.bot_policy.enabled), true)
        .field(
            "Word Filter",
            on_off(settings.prohibited_words.enabled),
            true,
        )
        .field(
            "Link Filter",
            format!(
                "{} ({} rules, invites {})",
                on_off(settings.blocked_links.enabled),
                settings.blocked_links.entries.len(),
                if settings.blocked_links.allow_invites {
                    "allowed"
                } else {
                    "blocked"
                }
            ),
            true,
        )
        .field(
            "Moderation Gate",
            format!(
                "{} ({} locked channels)",
                on_off(settings.moderation_gate.enabled),
                settings.moderation_gate.locked_channels.len()
            ),
            true,
        )
        .field(
            "Anti-Flood",
            format!(
                "{} ({} msgs / {} sec)",
                on_off(settings.anti_spam.enabled),
                settings.anti_spam.max_messages,
                settings.anti_spam.window_secs
            ),
            true,
        )
        .field("Image Policy", on_off(settings.image_policy.enabled), true)
        .field(
            "Channel Policy",
            on_off(settings.channel_policy.enabled),
            true,
        );

    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// Enable protection for this server.
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_MESSAGES")]
pub async fn enable(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be used in a server")?;

    ctx.data()
        .protection
        .set_enabled(guild_id.get(), true)
        .await
        .map_err(|e| Error::from(e.to_string()))?;

    ctx.say("✅ Server protection has been **enabled**.").await?;
    Ok(())
}

/// Disable protection for this server.
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_MESSAGES")]
pub async fn disable(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be used in a server")?;

    ctx.data()
        .protection
        .set_enabled(guild_id.get(), false)
        .await
        .map_err(|e| Error::from(e.to_string()))?;

    ctx.say("❌ Server protection has been **disabled**.")
        .await?;
    Ok(())
}

/// Reset recorded warnings for a user.
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_MESSAGES")]
pub async fn reset_warnings(
    ctx: Context<'_>,
    #[description = "User to reset warnings for"] user: serenity::User,
    #[description = "Category to reset (default: all)"] category: Option<WarningCategoryChoice>,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be used in a server")?;

    let choice = category.unwrap_or(WarningCategoryChoice::All);
    let cleared =
        ctx.data()
            .protection
            .reset_warnings(guild_id.get(), user.id.get(), choice.to_category());

    ctx.say(format!(
        "✅ Cleared {} warning record(s) for <@{}>.",
        cleared, user.id
    ))
    .await?;
    Ok(())
}

/// Put a channel under moderation: every new message in it is removed.
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_MESSAGES")]
pub async fn lock(
    ctx: Context<'_>,
    #[description = "Channel to lock (default: current channel)"] channel: Option<
        serenity::GuildChannel,
    >,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be used in a server")?;
    let channel_id = channel
        .map(|c| c.id.get())
        .unwrap_or_else(|| ctx.channel_id().get());

    let mut settings = ctx
        .data()
        .protection
        .get_settings(guild_id.get())
        .await
        .map_err(|e| Error::from(e.to_string()))?
        .unwrap_or_default();

    settings.moderation_gate.enabled = true;
    if !settings.moderation_gate.locked_channels.contains(&channel_id) {
        settings.moderation_gate.locked_channels.push(channel_id);
    }

    ctx.data()
        .protection
        .save_settings(guild_id.get(), settings)
        .await
        .map_err(|e| Error::from(e.to_string()))?;

    ctx.say(format!("🔒 <#{}> is now under moderation.", channel_id))
        .await?;
    Ok(())
}

/// Lift moderation from a channel.
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_MESSAGES")]
pub async fn unlock(
    ctx: Context<'_>,
    #[description = "Channel to unlock (default: current channel)"] channel: Option<
        serenity::GuildChannel,
    >,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be used in a server")?;
    let channel_id = channel
        .map(|c| c.id.get())
        .unwrap_or_else(|| ctx.channel_id().get());

    let mut settings = ctx
        .data()
        .protection
        .get_settings(guild_id.get())
        .await
        .map_err(|e| Error::from(e.to_string()))?
        .unwrap_or_default();

    settings
        .moderation_gate
        .locked_channels
        .retain(|&id| id != channel_id);

    ctx.data()
        .protection
        .save_settings(guild_id.get(), settings)
        .await
        .map_err(|e| Error::from(e.to_string()))?;

    ctx.say(format!("🔓 <#{}> is no longer under moderation.", channel_id))
        .await?;
    Ok(())
}
