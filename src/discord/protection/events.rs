// Message event handling: translate incoming Discord messages into
// platform-neutral events and feed them through the protection pipeline.

use crate::core::audit::AuditRecord;
use crate::core::protection::{AttachmentInfo, MessageEvent, Verdict};
use crate::discord::{Data, Error};
use chrono::Utc;
use poise::serenity_prelude as serenity;

pub async fn handle_message(
    ctx: &serenity::Context,
    msg: &serenity::Message,
    data: &Data,
) -> Result<(), Error> {
    // Never moderate our own messages (notices would loop forever).
    if msg.author.id == ctx.cache.current_user().id {
        return Ok(());
    }
    // DMs are out of scope.
    let Some(guild_id) = msg.guild_id else {
        return Ok(());
    };

    let event = message_event(ctx, msg, guild_id);
    let outcome = data.protection.evaluate(&event).await;

    if let Verdict::Block(infraction) = &outcome.verdict {
        let (success, description) = match &outcome.punishment {
            Some(result) => (result.success, result.description.clone()),
            None => (false, "no punishment attempted".to_string()),
        };
        data.audit
            .enforcement(AuditRecord {
                guild_id: event.guild_id,
                channel_id: event.channel_id,
                category: infraction.category,
                action: infraction.action,
                target_id: event.author_id,
                target_name: event.author_name.clone(),
                success,
                description,
            })
            .await;
    }

    Ok(())
}

fn message_event(
    ctx: &serenity::Context,
    msg: &serenity::Message,
    guild_id: serenity::GuildId,
) -> MessageEvent {
    let channel_name = ctx
        .cache
        .guild(guild_id)
        .and_then(|guild| {
            guild
                .channels
                .get(&msg.channel_id)
                .map(|channel| channel.name.clone())
        })
        .unwrap_or_else(|| msg.channel_id.to_string());

    MessageEvent {
        guild_id: guild_id.get(),
        channel_id: msg.channel_id.get(),
        channel_name,
        message_id: msg.id.get(),
        author_id: msg.author.id.get(),
        author_name: msg.author.name.clone(),
        author_is_bot: msg.author.bot,
        content: msg.content.clone(),
        attachments: msg
            .attachments
            .iter()
            .map(|a| AttachmentInfo {
                filename: a.filename.clone(),
                content_type: a.content_type.clone(),
                size: u64::from(a.size),
            })
            .collect(),
        timestamp: chrono::DateTime::from_timestamp(msg.timestamp.unix_timestamp(), 0)
            .unwrap_or_else(Utc::now),
    }
}
