use async_trait::async_trait;
use serenity::all::{GuildId, RoleId, UserId};
use sqlx::PgPool;
use thiserror::Error;

use crate::db::models::{MuteRecord, NewMute};
use crate::db::queries::{mute, mute_role};

#[derive(Debug, Error)]
pub enum MuteStoreError {
    #[error("a mute record already exists for user {user_id} in guild {guild_id}")]
    Conflict { guild_id: GuildId, user_id: UserId },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, MuteStoreError>;

/// Persistence for mute records and the per-guild mute role
#[async_trait]
pub trait MuteStore: Send + Sync {
    /// Persist a hard-mute snapshot. Fails with [`MuteStoreError::Conflict`]
    /// when the (guild, user) pair already has a record.
    async fn record_mute(&self, new: NewMute) -> StoreResult<MuteRecord>;

    async fn get_mute(&self, guild_id: GuildId, user_id: UserId)
        -> StoreResult<Option<MuteRecord>>;

    /// Delete a record; a no-op returning `false` when none exists
    async fn clear_mute(&self, guild_id: GuildId, user_id: UserId) -> StoreResult<bool>;

    /// Every record that carries an expiry, across all guilds
    async fn list_expiring(&self) -> StoreResult<Vec<MuteRecord>>;

    async fn get_mute_role(&self, guild_id: GuildId) -> StoreResult<Option<RoleId>>;

    async fn set_mute_role(
        &self,
        guild_id: GuildId,
        role_id: RoleId,
        updated_by: UserId,
    ) -> StoreResult<()>;

    /// Forget the guild's mute role if it is still `role_id`
    async fn clear_mute_role(&self, guild_id: GuildId, role_id: RoleId) -> StoreResult<bool>;
}

/// PostgreSQL-backed store
pub struct PgMuteStore {
    pool: PgPool,
}

impl PgMuteStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MuteStore for PgMuteStore {
    async fn record_mute(&self, new: NewMute) -> StoreResult<MuteRecord> {
        mute::create(&self.pool, &new)
            .await?
            .ok_or(MuteStoreError::Conflict {
                guild_id: new.guild_id,
                user_id: new.user_id,
            })
    }

    async fn get_mute(
        &self,
        guild_id: GuildId,
        user_id: UserId,
    ) -> StoreResult<Option<MuteRecord>> {
        Ok(mute::get(&self.pool, guild_id.get() as i64, user_id.get() as i64).await?)
    }

    async fn clear_mute(&self, guild_id: GuildId, user_id: UserId) -> StoreResult<bool> {
        Ok(mute::delete(&self.pool, guild_id.get() as i64, user_id.get() as i64).await?)
    }

    async fn list_expiring(&self) -> StoreResult<Vec<MuteRecord>> {
        Ok(mute::list_expiring(&self.pool).await?)
    }

    async fn get_mute_role(&self, guild_id: GuildId) -> StoreResult<Option<RoleId>> {
        let config = mute_role::get(&self.pool, guild_id.get() as i64).await?;
        Ok(config.map(|c| c.mute_role()))
    }

    async fn set_mute_role(
        &self,
        guild_id: GuildId,
        role_id: RoleId,
        updated_by: UserId,
    ) -> StoreResult<()> {
        mute_role::set(
            &self.pool,
            guild_id.get() as i64,
            role_id.get() as i64,
            updated_by.get() as i64,
        )
        .await?;
        Ok(())
    }

    async fn clear_mute_role(&self, guild_id: GuildId, role_id: RoleId) -> StoreResult<bool> {
        Ok(mute_role::delete_if_role(&self.pool, guild_id.get() as i64, role_id.get() as i64).await?)
    }
}

#[cfg(test)]
mod tests {
    use tokio_test::block_on;

    use super::*;
    use crate::services::moderation::testing::{
        MemoryMuteStore, GUILD, MODERATOR, MUTE_ROLE, ROLE_A, USER,
    };

    fn new_mute() -> NewMute {
        NewMute {
            guild_id: GUILD,
            user_id: USER,
            saved_role_ids: vec![ROLE_A],
            muted_by: MODERATOR,
            reason: None,
            expires_at: None,
        }
    }

    #[test]
    fn test_second_record_conflicts() {
        let store = MemoryMuteStore::default();

        block_on(store.record_mute(new_mute())).unwrap();
        let err = block_on(store.record_mute(new_mute())).unwrap_err();
        assert!(matches!(err, MuteStoreError::Conflict { .. }));
    }

    #[test]
    fn test_clear_mute_is_idempotent() {
        let store = MemoryMuteStore::default();
        block_on(store.record_mute(new_mute())).unwrap();

        assert!(block_on(store.clear_mute(GUILD, USER)).unwrap());
        assert!(!block_on(store.clear_mute(GUILD, USER)).unwrap());
        assert!(block_on(store.get_mute(GUILD, USER)).unwrap().is_none());
    }

    #[test]
    fn test_clear_mute_role_only_matches_current_role() {
        let store = MemoryMuteStore::default();
        block_on(store.set_mute_role(GUILD, MUTE_ROLE, MODERATOR)).unwrap();

        assert!(!block_on(store.clear_mute_role(GUILD, ROLE_A)).unwrap());
        assert_eq!(block_on(store.get_mute_role(GUILD)).unwrap(), Some(MUTE_ROLE));

        assert!(block_on(store.clear_mute_role(GUILD, MUTE_ROLE)).unwrap());
        assert_eq!(block_on(store.get_mute_role(GUILD)).unwrap(), None);
    }
}
