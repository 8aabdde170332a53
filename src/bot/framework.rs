use std::sync::Arc;

use poise::serenity_prelude::{self as serenity, GatewayIntents, GuildId};
use sqlx::PgPool;
use tracing::{error, info, warn};

use crate::bot::data::Data;
use crate::bot::error::Error;
use crate::commands;
use crate::config::Settings;
use crate::handlers::event_handler::event_handler;

pub async fn run(settings: Settings, pool: PgPool) -> Result<(), Error> {
    let token = settings.discord_token.clone();
    let prefix = settings.command_prefix.clone();

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: vec![
                commands::setup::muterole(),
                commands::moderation::softmute(),
                commands::moderation::hardmute(),
                commands::moderation::unmute(),
            ],
            prefix_options: poise::PrefixFrameworkOptions {
                prefix: Some(prefix),
                mention_as_prefix: true,
                ..Default::default()
            },
            event_handler: |ctx, event, framework, data| {
                Box::pin(event_handler(ctx, event, framework, data))
            },
            on_error: |error| {
                Box::pin(async move {
                    match error {
                        poise::FrameworkError::Command { error, ctx, .. } => {
                            error!("Command error: {:?}", error);
                            let _ = ctx.say(format!("Error: {}", error)).await;
                        }
                        poise::FrameworkError::ArgumentParse { error, ctx, .. } => {
                            let _ = ctx.say(format!("Invalid argument: {}", error)).await;
                        }
                        poise::FrameworkError::MissingUserPermissions {
                            missing_permissions,
                            ctx,
                            ..
                        } => {
                            let missing = missing_permissions
                                .map(|p| p.to_string())
                                .unwrap_or_else(|| "the required".to_string());
                            let _ = ctx
                                .say(format!("You need {} permissions to use this command.", missing))
                                .await;
                        }
                        poise::FrameworkError::MissingBotPermissions {
                            missing_permissions,
                            ctx,
                            ..
                        } => {
                            let _ = ctx
                                .say(format!("I am missing permissions: {}", missing_permissions))
                                .await;
                        }
                        poise::FrameworkError::UnknownCommand { .. } => {
                            // Plain chat that happens to start with the prefix
                        }
                        err => {
                            error!("Framework error: {:?}", err);
                        }
                    }
                })
            },
            ..Default::default()
        })
        .setup(move |ctx, ready, framework| {
            Box::pin(async move {
                info!("Bot connected as {}", ready.user.name);

                let data = Arc::new(Data::new(pool, settings, ctx.http.clone(), ready.user.id));

                // Re-arm timed mutes that were pending when the bot last stopped
                match data.mute_service.resume_pending().await {
                    Ok(count) => {
                        if count > 0 {
                            info!("Resumed {} pending timed mutes", count);
                        }
                    }
                    Err(e) => {
                        warn!("Failed to resume pending timed mutes: {:?}", e);
                    }
                }

                match data.settings.guild_id {
                    Some(guild_id) => {
                        let guild_id = GuildId::new(guild_id);
                        info!("Registering commands for guild {}", guild_id);

                        if let Err(e) = poise::builtins::register_in_guild(
                            ctx,
                            &framework.options().commands,
                            guild_id,
                        )
                        .await
                        {
                            error!("Failed to register guild commands: {:?}", e);
                            return Err(Error::Serenity(e));
                        }
                        info!("Registered commands in guild {}", guild_id);
                    }
                    None => {
                        if let Err(e) =
                            poise::builtins::register_globally(ctx, &framework.options().commands)
                                .await
                        {
                            error!("Failed to register commands globally: {:?}", e);
                            return Err(Error::Serenity(e));
                        }
                        info!("Registered commands globally");
                        info!("Note: Global commands can take up to 1 hour to appear in all servers");
                    }
                }

                Ok(data)
            })
        })
        .build();

    let intents = GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MEMBERS
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT;

    let mut client = serenity::ClientBuilder::new(&token, intents)
        .framework(framework)
        .await
        .map_err(Error::Serenity)?;

    info!("Starting Discord client...");
    client.start().await.map_err(Error::Serenity)
}
