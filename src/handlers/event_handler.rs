use std::sync::Arc;

use poise::serenity_prelude::{self as serenity, FullEvent};
use tracing::{debug, error, info};

use crate::bot::data::Data;
use crate::bot::error::Error;

pub async fn event_handler(
    _ctx: &serenity::Context,
    event: &FullEvent,
    _framework: poise::FrameworkContext<'_, Arc<Data>, Error>,
    data: &Arc<Data>,
) -> Result<(), Error> {
    match event {
        FullEvent::Ready { data_about_bot, .. } => {
            info!("Bot ready as {}", data_about_bot.user.name);
        }

        FullEvent::GuildRoleDelete {
            guild_id,
            removed_role_id,
            ..
        } => {
            // A deleted mute role leaves the guild unconfigured
            match data
                .mute_service
                .store()
                .clear_mute_role(*guild_id, *removed_role_id)
                .await
            {
                Ok(true) => info!(
                    "Mute role {} of guild {} was deleted, configuration cleared",
                    removed_role_id, guild_id
                ),
                Ok(false) => {}
                Err(e) => error!(
                    "Failed to clear mute role {} of guild {}: {:?}",
                    removed_role_id, guild_id, e
                ),
            }
        }

        FullEvent::GuildDelete { incomplete, .. } => {
            debug!("Guild {} removed", incomplete.id);
        }

        _ => {}
    }

    Ok(())
}
