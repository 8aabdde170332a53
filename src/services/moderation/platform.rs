use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serenity::all::{CreateMessage, EditMember, GuildId, Http, Permissions, RoleId, UserId};
use tracing::debug;

use super::policy::{Capability, Hierarchy};
use crate::bot::error::Error;
use crate::constants::embeds;
use crate::utils::permissions::{member_permissions, role_positions, top_role_position};

#[derive(Debug, Clone)]
pub struct GuildInfo {
    pub guild_id: GuildId,
    pub name: String,
    pub owner_id: UserId,
    pub role_positions: HashMap<RoleId, i64>,
}

impl GuildInfo {
    pub fn role_exists(&self, role_id: RoleId) -> bool {
        self.role_positions.contains_key(&role_id)
    }

    pub fn role_rank(&self, role_id: RoleId) -> Option<i64> {
        self.role_positions.get(&role_id).copied()
    }
}

#[derive(Debug, Clone)]
pub struct MemberInfo {
    pub user_id: UserId,
    pub roles: Vec<RoleId>,
    pub permissions: Permissions,
}

impl MemberInfo {
    pub fn has_role(&self, role_id: RoleId) -> bool {
        self.roles.contains(&role_id)
    }
}

/// Chat platform operations the mute service needs
#[async_trait]
pub trait Platform: Send + Sync {
    fn bot_id(&self) -> UserId;

    async fn guild(&self, guild_id: GuildId) -> Result<GuildInfo, Error>;

    async fn member(&self, guild_id: GuildId, user_id: UserId) -> Result<MemberInfo, Error>;

    /// Replace the member's full role list
    async fn set_roles(
        &self,
        guild_id: GuildId,
        user_id: UserId,
        roles: &[RoleId],
        reason: &str,
    ) -> Result<(), Error>;

    async fn add_role(
        &self,
        guild_id: GuildId,
        user_id: UserId,
        role_id: RoleId,
        reason: &str,
    ) -> Result<(), Error>;

    async fn remove_role(
        &self,
        guild_id: GuildId,
        user_id: UserId,
        role_id: RoleId,
        reason: &str,
    ) -> Result<(), Error>;

    async fn send_dm(&self, user_id: UserId, title: &str, description: &str) -> Result<(), Error>;
}

/// Ranks and capabilities of the members fetched for one command
pub struct GuildHierarchy<'a> {
    guild: &'a GuildInfo,
    members: HashMap<UserId, MemberInfo>,
}

impl<'a> GuildHierarchy<'a> {
    pub fn new(guild: &'a GuildInfo) -> Self {
        Self {
            guild,
            members: HashMap::new(),
        }
    }

    pub fn insert(&mut self, member: MemberInfo) {
        self.members.insert(member.user_id, member);
    }
}

impl Hierarchy for GuildHierarchy<'_> {
    fn rank(&self, user: UserId) -> i64 {
        self.members
            .get(&user)
            .map(|m| top_role_position(&self.guild.role_positions, &m.roles))
            .unwrap_or(0)
    }

    fn has_capability(&self, user: UserId, capability: Capability) -> bool {
        self.members
            .get(&user)
            .map(|m| m.permissions.administrator() || m.permissions.contains(capability.permission()))
            .unwrap_or(false)
    }
}

/// Serenity HTTP implementation
pub struct SerenityPlatform {
    http: Arc<Http>,
    bot_id: UserId,
}

impl SerenityPlatform {
    pub fn new(http: Arc<Http>, bot_id: UserId) -> Self {
        Self { http, bot_id }
    }
}

#[async_trait]
impl Platform for SerenityPlatform {
    fn bot_id(&self) -> UserId {
        self.bot_id
    }

    async fn guild(&self, guild_id: GuildId) -> Result<GuildInfo, Error> {
        let guild = guild_id.to_partial_guild(self.http.as_ref()).await?;

        Ok(GuildInfo {
            guild_id,
            name: guild.name.clone(),
            owner_id: guild.owner_id,
            role_positions: role_positions(&guild),
        })
    }

    async fn member(&self, guild_id: GuildId, user_id: UserId) -> Result<MemberInfo, Error> {
        let guild = guild_id.to_partial_guild(self.http.as_ref()).await?;
        let member = guild_id.member(self.http.as_ref(), user_id).await?;
        let permissions = member_permissions(&guild, &member);

        Ok(MemberInfo {
            user_id,
            roles: member.roles.clone(),
            permissions,
        })
    }

    async fn set_roles(
        &self,
        guild_id: GuildId,
        user_id: UserId,
        roles: &[RoleId],
        reason: &str,
    ) -> Result<(), Error> {
        guild_id
            .edit_member(
                self.http.as_ref(),
                user_id,
                EditMember::new()
                    .roles(roles.iter().copied())
                    .audit_log_reason(reason),
            )
            .await?;

        debug!("Set {} roles on user {} in guild {}", roles.len(), user_id, guild_id);
        Ok(())
    }

    async fn add_role(
        &self,
        guild_id: GuildId,
        user_id: UserId,
        role_id: RoleId,
        reason: &str,
    ) -> Result<(), Error> {
        self.http
            .add_member_role(guild_id, user_id, role_id, Some(reason))
            .await?;
        Ok(())
    }

    async fn remove_role(
        &self,
        guild_id: GuildId,
        user_id: UserId,
        role_id: RoleId,
        reason: &str,
    ) -> Result<(), Error> {
        self.http
            .remove_member_role(guild_id, user_id, role_id, Some(reason))
            .await?;
        Ok(())
    }

    async fn send_dm(&self, user_id: UserId, title: &str, description: &str) -> Result<(), Error> {
        let message =
            CreateMessage::new().embed(embeds::info_embed().title(title).description(description));

        let dm_channel = user_id.create_dm_channel(self.http.as_ref()).await?;
        dm_channel.send_message(self.http.as_ref(), message).await?;
        Ok(())
    }
}
