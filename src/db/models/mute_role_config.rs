use chrono::{DateTime, Utc};
use serenity::all::RoleId;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MuteRoleConfig {
    pub guild_id: i64,
    pub mute_role_id: i64,
    pub updated_by_user_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MuteRoleConfig {
    pub fn mute_role(&self) -> RoleId {
        RoleId::new(self.mute_role_id as u64)
    }
}
