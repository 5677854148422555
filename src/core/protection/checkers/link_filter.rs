// Blocked-links checker with ledger-driven escalation.
//
// Two sub-checks, tracked under separate ledger categories:
// - Discord invites: warn once, always delete afterwards.
// - Explicit entries: warn once, apply the entry's action on the second
//   offense, escalate to kick from the third on.
// The asymmetry between the two curves mirrors the settled product
// behavior; do not unify them.

use super::{CheckContext, CheckerError, RuleChecker};
use crate::core::protection::protection_models::{
    Infraction, MessageEvent, RuleAction, RuleCategory, Verdict,
};
use crate::core::protection::settings::{LinkScope, ProtectionSettings};

const INVITE_PATTERNS: [&str; 3] = [
    "discord.gg/",
    "discord.com/invite/",
    "discordapp.com/invite/",
];

pub struct LinkFilterChecker;

impl RuleChecker for LinkFilterChecker {
    fn category(&self) -> RuleCategory {
        RuleCategory::BlockedLinks
    }

    fn is_enabled(&self, settings: &ProtectionSettings) -> bool {
        settings.blocked_links.enabled
    }

    fn check(
        &self,
        event: &MessageEvent,
        settings: &ProtectionSettings,
        ctx: &CheckContext<'_>,
    ) -> Result<Verdict, CheckerError> {
        let cfg = &settings.blocked_links;
        let lowered = event.content.to_lowercase();

        // Sub-check 1: invite links.
        if !cfg.allow_invites && INVITE_PATTERNS.iter().any(|p| lowered.contains(p)) {
            let prior = ctx
                .ledger
                .count(event.guild_id, event.author_id, RuleCategory::DiscordInvites);
            ctx.ledger
                .record(event.guild_id, event.author_id, RuleCategory::DiscordInvites);

            if prior == 0 {
                return Ok(Verdict::Advise {
                    category: RuleCategory::DiscordInvites,
                    notice: format!(
                        "{}, invite links are not allowed here. \
                         This is a warning; the next one will be removed.",
                        event.author_name
                    ),
                });
            }
            return Ok(Verdict::Block(
                Infraction::new(
                    RuleCategory::DiscordInvites,
                    RuleAction::Delete,
                    "invite link posted after a prior warning",
                )
                .with_notice(format!(
                    "{}, invite links are not allowed here.",
                    event.author_name
                )),
            ));
        }

        // Sub-check 2: explicit entries. First matching entry wins.
        for entry in &cfg.entries {
            if entry.pattern.is_empty() || !lowered.contains(&entry.pattern.to_lowercase()) {
                continue;
            }

            if !entry.channels.is_empty() {
                let listed = entry.channels.contains(&event.channel_id);
                let skip = match entry.scope {
                    // Link tolerated inside the listed channels.
                    LinkScope::AllowOnlyHere => listed,
                    // Entry only acts inside the listed channels.
                    LinkScope::RestrictActionToHere => !listed,
                };
                if skip {
                    continue;
                }
            }

            let prior = ctx
                .ledger
                .count(event.guild_id, event.author_id, RuleCategory::BlockedLinks);
            ctx.ledger
                .record(event.guild_id, event.author_id, RuleCategory::BlockedLinks);

            return Ok(match prior {
                0 => Verdict::Advise {
                    category: RuleCategory::BlockedLinks,
                    notice: format!(
                        "{}, links matching `{}` are blocked on this server. \
                         This is a warning.",
                        event.author_name, entry.pattern
                    ),
                },
                1 => Verdict::Block(
                    Infraction::new(
                        RuleCategory::BlockedLinks,
                        entry.action,
                        format!("blocked link `{}` (second offense)", entry.pattern),
                    )
                    .always_delete(),
                ),
                _ => Verdict::Block(
                    Infraction::new(
                        RuleCategory::BlockedLinks,
                        RuleAction::Kick,
                        format!("blocked link `{}` (repeat offender)", entry.pattern),
                    )
                    .always_delete(),
                ),
            });
        }

        Ok(Verdict::Pass)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::message;
    use super::*;
    use crate::core::protection::settings::BlockedLinkEntry;
    use crate::core::protection::state_cache::TransientStateCache;
    use crate::core::protection::warning_ledger::WarningLedger;
    use chrono::Utc;

    struct Fixture {
        ledger: WarningLedger,
        cache: TransientStateCache,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                ledger: WarningLedger::new(),
                cache: TransientStateCache::new(),
            }
        }

        fn ctx(&self) -> CheckContext<'_> {
            CheckContext {
                ledger: &self.ledger,
                cache: &self.cache,
                now: Utc::now(),
            }
        }
    }

    fn invite_settings() -> ProtectionSettings {
        let mut settings = ProtectionSettings::default();
        settings.blocked_links.enabled = true;
        settings.blocked_links.allow_invites = false;
        settings
    }

    fn entry_settings(entries: Vec<BlockedLinkEntry>) -> ProtectionSettings {
        let mut settings = ProtectionSettings::default();
        settings.blocked_links.enabled = true;
        settings.blocked_links.entries = entries;
        settings
    }

    #[test]
    fn invite_first_offense_warns_without_blocking() {
        let fx = Fixture::new();
        let settings = invite_settings();
        let msg = message(1, 10, 2, "join discord.gg/abc123");

        let verdict = LinkFilterChecker.check(&msg, &settings, &fx.ctx()).unwrap();
        assert!(matches!(verdict, Verdict::Advise { .. }));

        // Second occurrence gets deleted.
        let verdict = LinkFilterChecker.check(&msg, &settings, &fx.ctx()).unwrap();
        match verdict {
            Verdict::Block(inf) => {
                assert_eq!(inf.action, RuleAction::Delete);
                assert_eq!(inf.category, RuleCategory::DiscordInvites);
            }
            other => panic!("expected block, got {:?}", other),
        }

        // And so does every occurrence after that - no kick escalation
        // on the invite curve.
        let verdict = LinkFilterChecker.check(&msg, &settings, &fx.ctx()).unwrap();
        match verdict {
            Verdict::Block(inf) => assert_eq!(inf.action, RuleAction::Delete),
            other => panic!("expected block, got {:?}", other),
        }
    }

    #[test]
    fn entry_escalation_warn_then_action_then_kick() {
        let fx = Fixture::new();
        let settings = entry_settings(vec![BlockedLinkEntry {
            pattern: "badsite.example".to_string(),
            action: RuleAction::Mute,
            ..Default::default()
        }]);
        let msg = message(1, 10, 2, "check badsite.example/page");

        // First offense: warn only, nothing deleted.
        let verdict = LinkFilterChecker.check(&msg, &settings, &fx.ctx()).unwrap();
        assert!(matches!(verdict, Verdict::Advise { .. }));

        // Second offense: configured action, message deleted.
        let verdict = LinkFilterChecker.check(&msg, &settings, &fx.ctx()).unwrap();
        match verdict {
            Verdict::Block(inf) => {
                assert_eq!(inf.action, RuleAction::Mute);
                assert!(inf.delete_message);
            }
            other => panic!("expected block, got {:?}", other),
        }

        // Third and later: kick, regardless of the configured action.
        let verdict = LinkFilterChecker.check(&msg, &settings, &fx.ctx()).unwrap();
        match verdict {
            Verdict::Block(inf) => {
                assert_eq!(inf.action, RuleAction::Kick);
                assert!(inf.delete_message);
            }
            other => panic!("expected block, got {:?}", other),
        }
    }

    #[test]
    fn allow_scope_skips_entry_but_keeps_scanning() {
        let fx = Fixture::new();
        let settings = entry_settings(vec![
            BlockedLinkEntry {
                pattern: "badsite.example".to_string(),
                action: RuleAction::Delete,
                channels: vec![10],
                scope: LinkScope::AllowOnlyHere,
            },
            BlockedLinkEntry {
                pattern: "badsite".to_string(),
                action: RuleAction::Delete,
                ..Default::default()
            },
        ]);

        // Channel 10 is tolerated for the first entry, but the broader
        // second entry still matches.
        let verdict = LinkFilterChecker
            .check(&message(1, 10, 2, "badsite.example"), &settings, &fx.ctx())
            .unwrap();
        assert!(matches!(verdict, Verdict::Advise { .. }));
    }

    #[test]
    fn restrict_scope_only_acts_in_listed_channels() {
        let fx = Fixture::new();
        let settings = entry_settings(vec![BlockedLinkEntry {
            pattern: "badsite.example".to_string(),
            action: RuleAction::Delete,
            channels: vec![77],
            scope: LinkScope::RestrictActionToHere,
        }]);

        let verdict = LinkFilterChecker
            .check(&message(1, 10, 2, "badsite.example"), &settings, &fx.ctx())
            .unwrap();
        assert_eq!(verdict, Verdict::Pass);

        let verdict = LinkFilterChecker
            .check(&message(1, 77, 2, "badsite.example"), &settings, &fx.ctx())
            .unwrap();
        assert!(matches!(verdict, Verdict::Advise { .. }));
    }

    #[test]
    fn first_matching_entry_short_circuits_the_list() {
        let fx = Fixture::new();
        let settings = entry_settings(vec![
            BlockedLinkEntry {
                pattern: "badsite".to_string(),
                action: RuleAction::Delete,
                ..Default::default()
            },
            BlockedLinkEntry {
                pattern: "badsite.example".to_string(),
                action: RuleAction::Ban,
                ..Default::default()
            },
        ]);

        // Push the user to the apply-action stage first.
        fx.ledger.record(1, 2, RuleCategory::BlockedLinks);

        let verdict = LinkFilterChecker
            .check(&message(1, 10, 2, "badsite.example"), &settings, &fx.ctx())
            .unwrap();
        match verdict {
            // First entry's delete, not the second entry's ban.
            Verdict::Block(inf) => assert_eq!(inf.action, RuleAction::Delete),
            other => panic!("expected block, got {:?}", other),
        }
    }
}
