use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use serenity::all::{GuildId, Permissions, RoleId, UserId};
use uuid::Uuid;

use super::mute_service::{BatchMode, MuteService};
use super::platform::{GuildInfo, MemberInfo, Platform};
use super::policy::MutePolicy;
use super::store::{MuteStore, MuteStoreError, StoreResult};
use crate::bot::error::Error;
use crate::db::models::{MuteRecord, NewMute};

pub const GUILD: GuildId = GuildId::new(100);

pub const OWNER: UserId = UserId::new(1);
pub const BOT: UserId = UserId::new(2);
pub const OPERATOR: UserId = UserId::new(3);
pub const MODERATOR: UserId = UserId::new(10);
pub const USER: UserId = UserId::new(11);
pub const STAFF: UserId = UserId::new(12);
pub const OTHER: UserId = UserId::new(13);

pub const ROLE_A: RoleId = RoleId::new(501);
pub const ROLE_B: RoleId = RoleId::new(502);
pub const MUTE_ROLE: RoleId = RoleId::new(503);
pub const STAFF_ROLE: RoleId = RoleId::new(504);
pub const MOD_ROLE: RoleId = RoleId::new(505);
pub const BOT_ROLE: RoleId = RoleId::new(506);

/// In-memory guild standing in for the chat platform in tests
pub struct FakePlatform {
    guild: Mutex<GuildInfo>,
    members: Mutex<HashMap<UserId, MemberInfo>>,
    dms: Mutex<Vec<(UserId, String)>>,
    pub fail_set_roles: AtomicBool,
    pub set_roles_calls: AtomicUsize,
    pub remove_role_calls: AtomicUsize,
}

impl FakePlatform {
    /// Guild with ranks: ROLE_A 1, ROLE_B 2, MUTE_ROLE 3, STAFF_ROLE 4,
    /// MOD_ROLE 5, BOT_ROLE 10
    pub fn new() -> Self {
        let guild = GuildInfo {
            guild_id: GUILD,
            name: "Test Guild".to_string(),
            owner_id: OWNER,
            role_positions: HashMap::from([
                (ROLE_A, 1),
                (ROLE_B, 2),
                (MUTE_ROLE, 3),
                (STAFF_ROLE, 4),
                (MOD_ROLE, 5),
                (BOT_ROLE, 10),
            ]),
        };

        let platform = Self {
            guild: Mutex::new(guild),
            members: Mutex::new(HashMap::new()),
            dms: Mutex::new(Vec::new()),
            fail_set_roles: AtomicBool::new(false),
            set_roles_calls: AtomicUsize::new(0),
            remove_role_calls: AtomicUsize::new(0),
        };

        platform.add_member(OWNER, vec![], Permissions::empty());
        platform.add_member(BOT, vec![BOT_ROLE], Permissions::MANAGE_ROLES);
        platform.add_member(OPERATOR, vec![], Permissions::empty());
        platform.add_member(MODERATOR, vec![MOD_ROLE], Permissions::KICK_MEMBERS);
        platform.add_member(USER, vec![ROLE_A, ROLE_B], Permissions::empty());
        platform.add_member(STAFF, vec![STAFF_ROLE], Permissions::KICK_MEMBERS);
        platform.add_member(OTHER, vec![ROLE_A], Permissions::empty());
        platform
    }

    pub fn add_member(&self, user_id: UserId, roles: Vec<RoleId>, permissions: Permissions) {
        self.members.lock().unwrap().insert(
            user_id,
            MemberInfo {
                user_id,
                roles,
                permissions,
            },
        );
    }

    pub fn set_member_roles(&self, user_id: UserId, roles: Vec<RoleId>) {
        if let Some(member) = self.members.lock().unwrap().get_mut(&user_id) {
            member.roles = roles;
        }
    }

    pub fn roles_of(&self, user_id: UserId) -> Vec<RoleId> {
        self.members
            .lock()
            .unwrap()
            .get(&user_id)
            .map(|m| m.roles.clone())
            .unwrap_or_default()
    }

    pub fn delete_role(&self, role_id: RoleId) {
        self.guild.lock().unwrap().role_positions.remove(&role_id);
    }

    pub fn dms(&self) -> Vec<(UserId, String)> {
        self.dms.lock().unwrap().clone()
    }

    fn edit_roles(&self, user_id: UserId, edit: impl FnOnce(&mut Vec<RoleId>)) -> Result<(), Error> {
        let mut members = self.members.lock().unwrap();
        let member = members
            .get_mut(&user_id)
            .ok_or_else(|| Error::custom(format!("Unknown member {}", user_id)))?;
        edit(&mut member.roles);
        Ok(())
    }
}

#[async_trait]
impl Platform for FakePlatform {
    fn bot_id(&self) -> UserId {
        BOT
    }

    async fn guild(&self, _guild_id: GuildId) -> Result<GuildInfo, Error> {
        Ok(self.guild.lock().unwrap().clone())
    }

    async fn member(&self, _guild_id: GuildId, user_id: UserId) -> Result<MemberInfo, Error> {
        self.members
            .lock()
            .unwrap()
            .get(&user_id)
            .cloned()
            .ok_or_else(|| Error::custom(format!("Unknown member {}", user_id)))
    }

    async fn set_roles(
        &self,
        _guild_id: GuildId,
        user_id: UserId,
        roles: &[RoleId],
        _reason: &str,
    ) -> Result<(), Error> {
        if self.fail_set_roles.load(Ordering::SeqCst) {
            return Err(Error::custom("Missing Permissions"));
        }
        self.set_roles_calls.fetch_add(1, Ordering::SeqCst);
        self.edit_roles(user_id, |current| *current = roles.to_vec())
    }

    async fn add_role(
        &self,
        _guild_id: GuildId,
        user_id: UserId,
        role_id: RoleId,
        _reason: &str,
    ) -> Result<(), Error> {
        self.edit_roles(user_id, |current| {
            if !current.contains(&role_id) {
                current.push(role_id);
            }
        })
    }

    async fn remove_role(
        &self,
        _guild_id: GuildId,
        user_id: UserId,
        role_id: RoleId,
        _reason: &str,
    ) -> Result<(), Error> {
        self.remove_role_calls.fetch_add(1, Ordering::SeqCst);
        self.edit_roles(user_id, |current| current.retain(|r| *r != role_id))
    }

    async fn send_dm(&self, user_id: UserId, _title: &str, description: &str) -> Result<(), Error> {
        self.dms
            .lock()
            .unwrap()
            .push((user_id, description.to_string()));
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryMuteStore {
    records: DashMap<(GuildId, UserId), MuteRecord>,
    mute_roles: DashMap<GuildId, RoleId>,
    pub fail_writes: AtomicBool,
}

impl MemoryMuteStore {
    pub fn remove_mute_role(&self, guild_id: GuildId) {
        self.mute_roles.remove(&guild_id);
    }
}

#[async_trait]
impl MuteStore for MemoryMuteStore {
    async fn record_mute(&self, new: NewMute) -> StoreResult<MuteRecord> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(MuteStoreError::Database(sqlx::Error::PoolTimedOut));
        }

        let key = (new.guild_id, new.user_id);
        if self.records.contains_key(&key) {
            return Err(MuteStoreError::Conflict {
                guild_id: new.guild_id,
                user_id: new.user_id,
            });
        }

        let record = MuteRecord {
            id: Uuid::new_v4(),
            guild_id: new.guild_id.get() as i64,
            user_id: new.user_id.get() as i64,
            saved_role_ids: new.saved_role_ids_i64(),
            muted_by_user_id: new.muted_by.get() as i64,
            reason: new.reason,
            expires_at: new.expires_at,
            created_at: Utc::now(),
        };
        self.records.insert(key, record.clone());
        Ok(record)
    }

    async fn get_mute(
        &self,
        guild_id: GuildId,
        user_id: UserId,
    ) -> StoreResult<Option<MuteRecord>> {
        Ok(self.records.get(&(guild_id, user_id)).map(|r| r.clone()))
    }

    async fn clear_mute(&self, guild_id: GuildId, user_id: UserId) -> StoreResult<bool> {
        Ok(self.records.remove(&(guild_id, user_id)).is_some())
    }

    async fn list_expiring(&self) -> StoreResult<Vec<MuteRecord>> {
        Ok(self
            .records
            .iter()
            .filter(|r| r.expires_at.is_some())
            .map(|r| r.clone())
            .collect())
    }

    async fn get_mute_role(&self, guild_id: GuildId) -> StoreResult<Option<RoleId>> {
        Ok(self.mute_roles.get(&guild_id).map(|r| *r))
    }

    async fn set_mute_role(
        &self,
        guild_id: GuildId,
        role_id: RoleId,
        _updated_by: UserId,
    ) -> StoreResult<()> {
        self.mute_roles.insert(guild_id, role_id);
        Ok(())
    }

    async fn clear_mute_role(&self, guild_id: GuildId, role_id: RoleId) -> StoreResult<bool> {
        Ok(self
            .mute_roles
            .remove_if(&guild_id, |_, current| *current == role_id)
            .is_some())
    }
}

/// A configured guild with a service wired to the fakes
pub struct World {
    pub service: Arc<MuteService>,
    pub platform: Arc<FakePlatform>,
    pub store: Arc<MemoryMuteStore>,
}

impl World {
    pub fn new() -> Self {
        Self::with_batch_mode(BatchMode::AbortOnFirstFailure)
    }

    pub fn with_batch_mode(batch_mode: BatchMode) -> Self {
        let platform = Arc::new(FakePlatform::new());
        let store = Arc::new(MemoryMuteStore::default());
        store.mute_roles.insert(GUILD, MUTE_ROLE);

        let service = Arc::new(MuteService::new(
            store.clone(),
            platform.clone(),
            MutePolicy::new([OPERATOR]),
            batch_mode,
        ));

        Self {
            service,
            platform,
            store,
        }
    }

    pub fn scheduler_pending(&self) -> usize {
        self.service.scheduler().pending_count()
    }
}
