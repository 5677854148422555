// Message-flood checker: sliding window over the transient state cache.
//
// Image posts bypass counting entirely; only textual messages count. The
// pipeline records the message before checkers run, so the window already
// includes the triggering message here.

use super::{CheckContext, CheckerError, RuleChecker};
use crate::core::protection::protection_models::{
    Infraction, MessageEvent, RuleAction, RuleCategory, Verdict,
};
use crate::core::protection::settings::ProtectionSettings;

pub struct FloodChecker;

impl RuleChecker for FloodChecker {
    fn category(&self) -> RuleCategory {
        RuleCategory::AntiSpam
    }

    fn is_enabled(&self, settings: &ProtectionSettings) -> bool {
        settings.anti_spam.enabled
    }

    fn check(
        &self,
        event: &MessageEvent,
        settings: &ProtectionSettings,
        ctx: &CheckContext<'_>,
    ) -> Result<Verdict, CheckerError> {
        let cfg = &settings.anti_spam;

        if event.has_image() || !event.has_text() {
            return Ok(Verdict::Pass);
        }

        let recent = ctx.cache.recent(
            event.guild_id,
            event.author_id,
            cfg.window_secs,
            ctx.now,
        );

        let threshold = cfg.max_messages as usize;
        if recent.len() <= threshold {
            return Ok(Verdict::Pass);
        }

        // Oldest-first excess beyond the threshold; the triggering message
        // itself is handled by the punishment, not here.
        let excess = recent.len() - threshold;
        let extra: Vec<u64> = recent
            .iter()
            .filter(|m| m.message_id != event.message_id)
            .take(excess)
            .map(|m| m.message_id)
            .collect();

        let mut action = cfg.punishment;
        if action.is_severe() && cfg.escalation_whitelist.contains(&event.channel_id) {
            action = RuleAction::Delete;
        }

        Ok(Verdict::Block(
            Infraction::new(
                RuleCategory::AntiSpam,
                action,
                format!(
                    "message flood: {} messages within {}s (limit {})",
                    recent.len(),
                    cfg.window_secs,
                    cfg.max_messages
                ),
            )
            .with_extra_deletions(extra),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{image_attachment, message_at};
    use super::*;
    use crate::core::protection::state_cache::TransientStateCache;
    use crate::core::protection::warning_ledger::WarningLedger;
    use chrono::{Duration, Utc};

    fn flood_settings(max: u32, window: u64) -> ProtectionSettings {
        let mut settings = ProtectionSettings::default();
        settings.anti_spam.enabled = true;
        settings.anti_spam.max_messages = max;
        settings.anti_spam.window_secs = window;
        settings
    }

    #[test]
    fn sixth_message_in_window_triggers_mute_with_one_excess() {
        let ledger = WarningLedger::new();
        let cache = TransientStateCache::new();
        let settings = flood_settings(5, 60);
        let now = Utc::now();

        for i in 0..5u64 {
            let mut msg = message_at(1, 10, 2, "hi", now - Duration::seconds(50 - i as i64 * 10));
            msg.message_id = 100 + i;
            cache.record(&msg);
        }

        let mut trigger = message_at(1, 10, 2, "hi", now);
        trigger.message_id = 105;
        cache.record(&trigger);
        let ctx = CheckContext {
            ledger: &ledger,
            cache: &cache,
            now,
        };

        let verdict = FloodChecker.check(&trigger, &settings, &ctx).unwrap();
        match verdict {
            Verdict::Block(inf) => {
                assert_eq!(inf.action, RuleAction::Mute);
                // Exactly one excess deletion, the oldest message.
                assert_eq!(inf.extra_deletions, vec![100]);
            }
            other => panic!("expected block, got {:?}", other),
        }
    }

    #[test]
    fn messages_outside_the_window_do_not_count() {
        let ledger = WarningLedger::new();
        let cache = TransientStateCache::new();
        let settings = flood_settings(5, 60);
        let now = Utc::now();

        // Six old messages, then one fresh message after the window passed.
        for i in 0..6u64 {
            let mut msg = message_at(1, 10, 2, "hi", now - Duration::seconds(120 + i as i64));
            msg.message_id = 100 + i;
            cache.record(&msg);
        }
        let mut fresh = message_at(1, 10, 2, "hi", now);
        fresh.message_id = 200;
        cache.record(&fresh);

        let ctx = CheckContext {
            ledger: &ledger,
            cache: &cache,
            now,
        };
        let verdict = FloodChecker.check(&fresh, &settings, &ctx).unwrap();
        assert_eq!(verdict, Verdict::Pass);
    }

    #[test]
    fn image_posts_bypass_flood_counting() {
        let ledger = WarningLedger::new();
        let cache = TransientStateCache::new();
        let settings = flood_settings(1, 60);
        let now = Utc::now();

        for i in 0..5u64 {
            let mut msg = message_at(1, 10, 2, "hi", now - Duration::seconds(10 + i as i64));
            msg.message_id = 100 + i;
            cache.record(&msg);
        }

        let mut trigger = message_at(1, 10, 2, "look", now);
        trigger.message_id = 300;
        trigger.attachments.push(image_attachment());

        let ctx = CheckContext {
            ledger: &ledger,
            cache: &cache,
            now,
        };
        let verdict = FloodChecker.check(&trigger, &settings, &ctx).unwrap();
        assert_eq!(verdict, Verdict::Pass);
    }

    #[test]
    fn whitelist_downgrades_severe_punishment_to_delete() {
        let ledger = WarningLedger::new();
        let cache = TransientStateCache::new();
        let mut settings = flood_settings(1, 60);
        settings.anti_spam.punishment = RuleAction::Kick;
        settings.anti_spam.escalation_whitelist = vec![10];
        let now = Utc::now();

        for i in 0..3u64 {
            let mut msg = message_at(1, 10, 2, "hi", now - Duration::seconds(5 + i as i64));
            msg.message_id = 100 + i;
            cache.record(&msg);
        }

        let mut trigger = message_at(1, 10, 2, "hi", now);
        trigger.message_id = 103;
        cache.record(&trigger);
        let ctx = CheckContext {
            ledger: &ledger,
            cache: &cache,
            now,
        };

        let verdict = FloodChecker.check(&trigger, &settings, &ctx).unwrap();
        match verdict {
            Verdict::Block(inf) => {
                assert_eq!(inf.action, RuleAction::Delete);
                assert!(!inf.extra_deletions.is_empty());
            }
            other => panic!("expected block, got {:?}", other),
        }
    }
}
