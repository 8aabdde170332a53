use chrono::{DateTime, Utc};
use serenity::all::{GuildId, RoleId, UserId};
use uuid::Uuid;

/// Snapshot of a hard-muted member, keyed by (guild_id, user_id)
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct MuteRecord {
    pub id: Uuid,
    pub guild_id: i64,
    pub user_id: i64,
    /// Roles held before the hard mute, never including the mute role
    pub saved_role_ids: Vec<i64>,
    pub muted_by_user_id: i64,
    pub reason: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl MuteRecord {
    pub fn guild(&self) -> GuildId {
        GuildId::new(self.guild_id as u64)
    }

    pub fn user(&self) -> UserId {
        UserId::new(self.user_id as u64)
    }

    pub fn saved_roles(&self) -> Vec<RoleId> {
        self.saved_role_ids
            .iter()
            .map(|id| RoleId::new(*id as u64))
            .collect()
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map(|at| at <= now).unwrap_or(false)
    }
}

/// Values written when a hard mute is recorded
#[derive(Debug, Clone)]
pub struct NewMute {
    pub guild_id: GuildId,
    pub user_id: UserId,
    pub saved_role_ids: Vec<RoleId>,
    pub muted_by: UserId,
    pub reason: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl NewMute {
    pub(crate) fn saved_role_ids_i64(&self) -> Vec<i64> {
        self.saved_role_ids.iter().map(|r| r.get() as i64).collect()
    }
}
