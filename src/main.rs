// This is the entry point of the Discord bot.
//
// **Architecture Overview:**
// - `core/` = Business logic (platform-agnostic)
// - `infra/` = Implementations of core traits (databases)
// - `discord/` = Discord-specific adapters (commands, events, platform client)
//
// This file's job is to:
// 1. Load configuration
// 2. Initialize services (dependency injection)
// 3. Set up the Discord framework
// 4. Register commands and event handlers

// These attrs point each module declaration at a more descriptive root file
// so we don't end up with half a dozen mod.rs files that all look the same.
#[path = "core/core_layer.rs"]
mod core;
#[path = "discord/discord_layer.rs"]
mod discord;
#[path = "infra/infra_layer.rs"]
mod infra;

use crate::core::audit::TracingAuditSink;
use crate::core::protection::{
    ProtectionService, PunishmentExecutor, TransientStateCache, WarningLedger,
};
use crate::discord::platform::SerenityPlatform;
use crate::discord::{Data, Error};
use crate::infra::protection::SqliteSettingsStore;
use poise::serenity_prelude as serenity;
use std::sync::Arc;

/// How often the transient message cache is swept for stale entries.
const CACHE_SWEEP_INTERVAL_SECS: u64 = 60 * 60;

/// Event handler for non-command Discord events.
/// This is where incoming messages are run through the protection pipeline.
async fn event_handler(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, Data, Error>,
    data: &Data,
) -> Result<(), Error> {
    match event {
        serenity::FullEvent::Message { new_message } => {
            if let Err(e) = discord::events::handle_message(ctx, new_message, data).await {
                tracing::error!("Error handling message: {}", e);
            }
        }
        _ => {}
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    // Initialize logging so we can see what's happening
    tracing_subscriber::fmt::init();

    // Load environment variables from .env file (if it exists)
    dotenv::dotenv().ok();

    // Get Discord bot token from environment
    let token = std::env::var("DISCORD_TOKEN").expect(
        "Missing DISCORD_TOKEN environment variable! Create a .env file with your bot token.",
    );

    // Keep runtime databases in a dedicated folder so the repo root stays tidy.
    let data_dir = "data";
    std::fs::create_dir_all(data_dir).expect("Failed to create data directory for SQLite files");
    let settings_db_path = format!("{}/protection.db", data_dir);

    // ========================================================================
    // DEPENDENCY INJECTION
    // ========================================================================
    // Create our services with their dependencies.
    // This is the "composition root" where we wire everything together.
    // The platform adapter needs the gateway's http/cache handles, so the
    // protection service itself is assembled in the framework setup hook.

    let settings_pool = sqlx::sqlite::SqlitePoolOptions::new()
        .connect(&format!("sqlite://{}?mode=rwc", settings_db_path))
        .await
        .expect("Failed to connect to settings DB");
    let settings_store = SqliteSettingsStore::new(settings_pool);
    settings_store
        .migrate()
        .await
        .expect("Failed to migrate settings DB");

    let ledger = Arc::new(WarningLedger::new());
    let state_cache = Arc::new(TransientStateCache::new());

    // ========================================================================
    // DISCORD FRAMEWORK SETUP
    // ========================================================================
    // Configure the poise framework with our commands and settings.

    let intents = serenity::GatewayIntents::GUILD_MESSAGES
        | serenity::GatewayIntents::MESSAGE_CONTENT // Required to read message content
        | serenity::GatewayIntents::GUILDS
        | serenity::GatewayIntents::GUILD_MEMBERS;

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            // Register all our commands here
            commands: vec![discord::commands::protection()],
            // Event handler for messages and other events
            event_handler: |ctx, event, framework, data| {
                Box::pin(event_handler(ctx, event, framework, data))
            },
            ..Default::default()
        })
        .setup(move |ctx, _ready, framework| {
            Box::pin(async move {
                println!("🤖 Bot is starting up...");

                // Register slash commands globally (can take up to an hour to propagate)
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;

                println!("✅ Commands registered!");

                let platform = Arc::new(SerenityPlatform::new(ctx.http.clone(), ctx.cache.clone()));
                let executor = PunishmentExecutor::new(Arc::clone(&platform));
                let protection = Arc::new(ProtectionService::new(
                    settings_store,
                    executor,
                    Arc::clone(&ledger),
                    Arc::clone(&state_cache),
                ));

                // Background sweep so guilds that go quiet don't pin stale
                // message history in memory forever.
                let sweep_cache = Arc::clone(&state_cache);
                tokio::spawn(async move {
                    use std::time::Duration as StdDuration;
                    use tokio::time::sleep;

                    loop {
                        sleep(StdDuration::from_secs(CACHE_SWEEP_INTERVAL_SECS)).await;
                        let evicted = sweep_cache.sweep(chrono::Utc::now());
                        tracing::debug!(evicted, "Transient cache sweep completed");
                    }
                });

                println!("🚀 Bot is ready!");

                Ok(Data {
                    protection,
                    audit: Arc::new(TracingAuditSink),
                })
            })
        })
        .build();

    // Create the client and start the bot
    let mut settings = serenity::cache::Settings::default();
    settings.max_messages = 10000;

    let mut client = serenity::ClientBuilder::new(token, intents)
        .framework(framework)
        .cache_settings(settings)
        .await
        .expect("Error creating client");

    client.start().await.expect("Error running bot");
}
