use poise::serenity_prelude::Role;
use poise::CreateReply;
use tracing::info;

use crate::bot::data::Context;
use crate::bot::error::Error;
use crate::constants::embeds;
use crate::services::moderation::prepare_channels;
use crate::utils::formatting::mention_role;
use crate::utils::permissions::{role_positions, top_role_position};

/// Set the role used for soft and hard mutes
///
/// Hides every channel from the role and creates a `muted` channel that
/// only the role can see.
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    aliases("setmuterole"),
    required_permissions = "ADMINISTRATOR",
    required_bot_permissions = "MANAGE_ROLES | MANAGE_CHANNELS"
)]
pub async fn muterole(
    ctx: Context<'_>,
    #[description = "Role to apply to muted members"] role: Role,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or(Error::custom("Not in a guild"))?;
    let http = ctx.http();
    let author_id = ctx.author().id;

    let guild = guild_id.to_partial_guild(http).await?;
    let positions = role_positions(&guild);
    let bot = guild_id.member(http, ctx.framework().bot_id).await?;
    let author = guild_id.member(http, author_id).await?;

    check_role_reachable(
        i64::from(role.position),
        top_role_position(&positions, &bot.roles),
        top_role_position(&positions, &author.roles),
        author_id == guild.owner_id,
    )?;

    ctx.defer().await?;

    ctx.data()
        .mute_service
        .store()
        .set_mute_role(guild_id, role.id, author_id)
        .await?;
    info!(
        "Mute role for guild {} set to {} by {}",
        guild_id, role.id, author_id
    );

    let setup = prepare_channels(http, guild_id, role.id).await?;

    let mut description = format!(
        "Saved {} as this server's mute role.\nHidden {} channel(s) from it.",
        mention_role(role.id),
        setup.hidden
    );
    if setup.failed > 0 {
        description.push_str(&format!(
            "\nCould not update {} channel(s); check my permissions there.",
            setup.failed
        ));
    }
    if setup.created_muted_channel {
        description.push_str("\nCreated the `muted` channel.");
    }

    let embed = if setup.failed > 0 {
        embeds::warning_embed()
    } else {
        embeds::success_embed()
    }
    .title("Mute Role Set")
    .description(description);

    ctx.send(CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// The mute role must sit at or below the bot's top role, and at or below
/// the author's unless the author owns the guild
fn check_role_reachable(
    role_position: i64,
    bot_top: i64,
    author_top: i64,
    author_is_owner: bool,
) -> Result<(), Error> {
    if bot_top < role_position {
        return Err(Error::PermissionDenied(
            "The mute role is above my highest role".to_string(),
        ));
    }
    if !author_is_owner && author_top < role_position {
        return Err(Error::PermissionDenied(
            "The mute role is above your highest role".to_string(),
        ));
    }
    Ok(())
}
