// Bot-account policy and duplicate-message checker.
//
// Bot accounts posting where they shouldn't are removed from the guild
// (the executor falls back to deleting the message when kicking is not
// permitted). Separately, a verbatim repeat of recent content gets the
// message deleted - cheap copy-paste spam that the flood window alone
// would miss.

use super::{CheckContext, CheckerError, RuleChecker};
use crate::core::protection::protection_models::{
    Infraction, MessageEvent, RuleAction, RuleCategory, Verdict,
};
use crate::core::protection::settings::ProtectionSettings;

/// How many of the user's most recent messages the repeat check inspects.
const DUPLICATE_HISTORY: usize = 10;
/// Prior occurrences needed before a repeat is deleted.
const DUPLICATE_LIMIT: usize = 3;
/// Repeats older than this no longer count.
const DUPLICATE_WINDOW_SECS: u64 = 60;

pub struct BotPolicyChecker;

impl RuleChecker for BotPolicyChecker {
    fn category(&self) -> RuleCategory {
        RuleCategory::BotAccounts
    }

    fn is_enabled(&self, settings: &ProtectionSettings) -> bool {
        settings.bot_policy.enabled
    }

    fn check(
        &self,
        event: &MessageEvent,
        settings: &ProtectionSettings,
        ctx: &CheckContext<'_>,
    ) -> Result<Verdict, CheckerError> {
        let cfg = &settings.bot_policy;

        if event.author_is_bot {
            if !cfg.allow_bots && !cfg.channel_whitelist.contains(&event.channel_id) {
                return Ok(Verdict::Block(Infraction::new(
                    RuleCategory::BotAccounts,
                    RuleAction::Kick,
                    format!("bot account `{}` is not permitted here", event.author_name),
                )));
            }
            // Tolerated bots are not subject to the repeat check.
            return Ok(Verdict::Pass);
        }

        // Duplicate-message check; attachments are exempt.
        if event.attachments.is_empty() && event.has_text() {
            let repeats = ctx.cache.duplicate_count(
                event.guild_id,
                event.author_id,
                &event.content,
                DUPLICATE_WINDOW_SECS,
                DUPLICATE_HISTORY,
                event.message_id,
                ctx.now,
            );
            if repeats >= DUPLICATE_LIMIT {
                return Ok(Verdict::Block(Infraction::new(
                    RuleCategory::DuplicateMessages,
                    RuleAction::Delete,
                    format!("message repeated {} times within {}s", repeats + 1, DUPLICATE_WINDOW_SECS),
                )));
            }
        }

        Ok(Verdict::Pass)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{file_attachment, message, message_at};
    use super::*;
    use crate::core::protection::state_cache::TransientStateCache;
    use crate::core::protection::warning_ledger::WarningLedger;
    use chrono::{Duration, Utc};

    fn bot_settings(allow_bots: bool, whitelist: Vec<u64>) -> ProtectionSettings {
        let mut settings = ProtectionSettings::default();
        settings.bot_policy.enabled = true;
        settings.bot_policy.allow_bots = allow_bots;
        settings.bot_policy.channel_whitelist = whitelist;
        settings
    }

    #[test]
    fn disallowed_bot_account_gets_kicked() {
        let ledger = WarningLedger::new();
        let cache = TransientStateCache::new();
        let ctx = CheckContext {
            ledger: &ledger,
            cache: &cache,
            now: Utc::now(),
        };
        let settings = bot_settings(false, vec![99]);

        let mut msg = message(1, 10, 2, "beep boop");
        msg.author_is_bot = true;

        match BotPolicyChecker.check(&msg, &settings, &ctx).unwrap() {
            Verdict::Block(inf) => {
                assert_eq!(inf.action, RuleAction::Kick);
                // Kick path does not delete by default; the executor owns
                // the fallback.
                assert!(!inf.delete_message);
            }
            other => panic!("expected block, got {:?}", other),
        }

        // Whitelisted channel tolerates the bot.
        let mut msg = message(1, 99, 2, "beep boop");
        msg.author_is_bot = true;
        assert_eq!(BotPolicyChecker.check(&msg, &settings, &ctx).unwrap(), Verdict::Pass);
    }

    #[test]
    fn verbatim_repeat_is_deleted_after_three_copies() {
        let ledger = WarningLedger::new();
        let cache = TransientStateCache::new();
        let now = Utc::now();
        let settings = bot_settings(true, Vec::new());

        for i in 0..3u64 {
            let mut msg = message_at(1, 10, 2, "free nitro!!", now - Duration::seconds(30 - i as i64));
            msg.message_id = 100 + i;
            cache.record(&msg);
        }

        let mut repeat = message_at(1, 10, 2, "free nitro!!", now);
        repeat.message_id = 200;
        cache.record(&repeat);

        let ctx = CheckContext {
            ledger: &ledger,
            cache: &cache,
            now,
        };
        match BotPolicyChecker.check(&repeat, &settings, &ctx).unwrap() {
            Verdict::Block(inf) => {
                assert_eq!(inf.action, RuleAction::Delete);
                assert_eq!(inf.category, RuleCategory::DuplicateMessages);
            }
            other => panic!("expected block, got {:?}", other),
        }
    }

    #[test]
    fn two_copies_are_still_tolerated() {
        let ledger = WarningLedger::new();
        let cache = TransientStateCache::new();
        let now = Utc::now();
        let settings = bot_settings(true, Vec::new());

        for i in 0..2u64 {
            let mut msg = message_at(1, 10, 2, "hello again", now - Duration::seconds(10 - i as i64));
            msg.message_id = 100 + i;
            cache.record(&msg);
        }
        let mut repeat = message_at(1, 10, 2, "hello again", now);
        repeat.message_id = 200;
        cache.record(&repeat);

        let ctx = CheckContext {
            ledger: &ledger,
            cache: &cache,
            now,
        };
        assert_eq!(
            BotPolicyChecker.check(&repeat, &settings, &ctx).unwrap(),
            Verdict::Pass
        );
    }

    #[test]
    fn attachments_are_exempt_from_the_repeat_check() {
        let ledger = WarningLedger::new();
        let cache = TransientStateCache::new();
        let now = Utc::now();
        let settings = bot_settings(true, Vec::new());

        for i in 0..4u64 {
            let mut msg = message_at(1, 10, 2, "same caption", now - Duration::seconds(10 - i as i64));
            msg.message_id = 100 + i;
            cache.record(&msg);
        }

        let mut repeat = message_at(1, 10, 2, "same caption", now);
        repeat.message_id = 200;
        repeat.attachments.push(file_attachment());

        let ctx = CheckContext {
            ledger: &ledger,
            cache: &cache,
            now,
        };
        assert_eq!(
            BotPolicyChecker.check(&repeat, &settings, &ctx).unwrap(),
            Verdict::Pass
        );
    }
}
