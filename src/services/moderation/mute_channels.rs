use serenity::all::{
    ChannelType, CreateChannel, GuildChannel, GuildId, Http, PermissionOverwrite,
    PermissionOverwriteType, Permissions, RoleId,
};
use tracing::{info, warn};

use crate::bot::error::Error;
use crate::constants::timeouts::{MUTED_CHANNEL_NAME, MUTED_CHANNEL_SLOWMODE_SECONDS};

/// What preparing the guild's channels for a mute role changed
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ChannelSetup {
    pub hidden: usize,
    pub failed: usize,
    pub created_muted_channel: bool,
}

/// Overwrite that hides a channel from the mute role
pub fn hide_from(role_id: RoleId) -> PermissionOverwrite {
    PermissionOverwrite {
        allow: Permissions::empty(),
        deny: Permissions::VIEW_CHANNEL,
        kind: PermissionOverwriteType::Role(role_id),
    }
}

/// Overwrites for the muted channel: hidden from everyone, open to the role
pub fn muted_channel_overwrites(guild_id: GuildId, role_id: RoleId) -> Vec<PermissionOverwrite> {
    vec![
        PermissionOverwrite {
            allow: Permissions::empty(),
            deny: Permissions::VIEW_CHANNEL,
            kind: PermissionOverwriteType::Role(RoleId::new(guild_id.get())),
        },
        PermissionOverwrite {
            allow: Permissions::VIEW_CHANNEL | Permissions::SEND_MESSAGES,
            deny: Permissions::empty(),
            kind: PermissionOverwriteType::Role(role_id),
        },
    ]
}

fn is_muted_channel(channel: &GuildChannel) -> bool {
    channel.kind == ChannelType::Text && channel.name == MUTED_CHANNEL_NAME
}

/// Hide every channel from the mute role and create the muted channel if
/// the guild has none. Per-channel failures are counted, not fatal.
pub async fn prepare_channels(
    http: &Http,
    guild_id: GuildId,
    role_id: RoleId,
) -> Result<ChannelSetup, Error> {
    let channels = guild_id.channels(http).await?;
    let mut setup = ChannelSetup::default();

    for (channel_id, channel) in &channels {
        if is_muted_channel(channel) {
            continue;
        }

        match channel_id.create_permission(http, hide_from(role_id)).await {
            Ok(()) => setup.hidden += 1,
            Err(e) => {
                warn!(
                    "Failed to hide channel {} from mute role {}: {:?}",
                    channel_id, role_id, e
                );
                setup.failed += 1;
            }
        }
    }

    if !channels.values().any(is_muted_channel) {
        let channel = guild_id
            .create_channel(
                http,
                CreateChannel::new(MUTED_CHANNEL_NAME)
                    .kind(ChannelType::Text)
                    .topic("Punishment Channel")
                    .rate_limit_per_user(MUTED_CHANNEL_SLOWMODE_SECONDS)
                    .permissions(muted_channel_overwrites(guild_id, role_id)),
            )
            .await?;

        info!("Created muted channel {} in guild {}", channel.id, guild_id);
        setup.created_muted_channel = true;
    }

    Ok(setup)
}
