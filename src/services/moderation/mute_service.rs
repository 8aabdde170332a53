use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serenity::all::{GuildId, RoleId, UserId};
use tracing::{debug, error, info, warn};

use super::outcome::{FailReason, Outcome, SkipReason, TargetResult};
use super::platform::{GuildHierarchy, GuildInfo, MemberInfo, Platform};
use super::policy::{MutePolicy, PolicyContext, Verdict};
use super::scheduler::ExpiryScheduler;
use super::store::MuteStore;
use crate::bot::error::Error;
use crate::constants::timeouts::format_mute_length;
use crate::db::models::NewMute;
use crate::utils::formatting::truncate;

/// Audit log reasons are capped by the platform
const AUDIT_REASON_MAX_LEN: usize = 512;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MuteKind {
    /// Add the mute role, keep every other role
    Soft,
    /// Replace every role with the mute role, snapshotting the old ones
    Hard,
}

impl MuteKind {
    pub fn label(self) -> &'static str {
        match self {
            MuteKind::Soft => "Softmuted",
            MuteKind::Hard => "Hardmuted",
        }
    }
}

/// What happens to the remaining targets once one of them fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BatchMode {
    #[default]
    AbortOnFirstFailure,
    Continue,
}

impl FromStr for BatchMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "abort" | "" => Ok(BatchMode::AbortOnFirstFailure),
            "continue" => Ok(BatchMode::Continue),
            other => Err(format!(
                "Invalid MUTE_BATCH_MODE '{}', expected 'abort' or 'continue'",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnmuteTrigger {
    /// A moderator ran the unmute command
    Manual { actor: UserId },
    /// A timed mute ran out; `notify` carries over whether the mute was announced
    Expiry { notify: bool },
}

/// Values shared by every target of one mute command
struct MuteBatch<'a> {
    kind: MuteKind,
    guild: &'a GuildInfo,
    policy_ctx: PolicyContext,
    mute_role: RoleId,
    actor: UserId,
    expires_at: Option<DateTime<Utc>>,
    reason: Option<&'a str>,
    audit_reason: String,
}

/// Applies and lifts mutes, snapshotting roles for hard mutes and arming
/// their expiry
pub struct MuteService {
    store: Arc<dyn MuteStore>,
    platform: Arc<dyn Platform>,
    policy: MutePolicy,
    scheduler: ExpiryScheduler,
    batch_mode: BatchMode,
}

impl MuteService {
    pub fn new(
        store: Arc<dyn MuteStore>,
        platform: Arc<dyn Platform>,
        policy: MutePolicy,
        batch_mode: BatchMode,
    ) -> Self {
        Self {
            store,
            platform,
            policy,
            scheduler: ExpiryScheduler::new(),
            batch_mode,
        }
    }

    pub fn store(&self) -> &Arc<dyn MuteStore> {
        &self.store
    }

    pub fn scheduler(&self) -> &ExpiryScheduler {
        &self.scheduler
    }

    /// Mute every target, in order, and arrange their expiry when a duration
    /// is given. Returns one result per target.
    pub async fn apply_mute(
        self: &Arc<Self>,
        kind: MuteKind,
        guild_id: GuildId,
        actor: UserId,
        targets: &[UserId],
        duration: Option<Duration>,
        reason: Option<&str>,
    ) -> Result<Vec<TargetResult>, Error> {
        let mute_role = self
            .store
            .get_mute_role(guild_id)
            .await?
            .ok_or(Error::MuteRoleNotConfigured)?;

        let guild = self.platform.guild(guild_id).await?;
        let mute_role_rank = guild
            .role_rank(mute_role)
            .ok_or(Error::MuteRoleNotConfigured)?;

        let bot_id = self.platform.bot_id();
        let mut hierarchy = GuildHierarchy::new(&guild);
        hierarchy.insert(self.platform.member(guild_id, actor).await?);
        hierarchy.insert(self.platform.member(guild_id, bot_id).await?);

        let batch = MuteBatch {
            kind,
            guild: &guild,
            policy_ctx: PolicyContext {
                owner_id: guild.owner_id,
                bot_id,
                mute_role_rank,
            },
            mute_role,
            actor,
            expires_at: duration
                .and_then(|d| chrono::Duration::from_std(d).ok())
                .map(|d| Utc::now() + d),
            reason,
            audit_reason: audit_reason(actor, reason),
        };

        let mut results = Vec::with_capacity(targets.len());
        let mut muted = Vec::new();
        let mut aborted = false;

        for &target in targets {
            if aborted {
                results.push(TargetResult::new(
                    target,
                    Outcome::Skipped(SkipReason::BatchAborted),
                ));
                continue;
            }

            let outcome = self.mute_one(&batch, &mut hierarchy, target).await;
            match &outcome {
                Outcome::Muted => {
                    info!(
                        "{} user {} in guild {} (by {}, {})",
                        kind.label(),
                        target,
                        guild_id,
                        actor,
                        format_mute_length(duration)
                    );
                    self.notify_muted(&guild, target, duration, reason).await;
                    muted.push(target);
                }
                Outcome::Failed(why) => {
                    warn!(
                        "Failed to mute user {} in guild {}: {}",
                        target, guild_id, why
                    );
                    aborted = self.batch_mode == BatchMode::AbortOnFirstFailure;
                }
                _ => {}
            }

            results.push(TargetResult::new(target, outcome));
        }

        match duration {
            Some(delay) => self.schedule_unmute(guild_id, &muted, delay, reason.is_some()),
            None => {
                // An indefinite mute only ends by command, never by a leftover timer
                for &target in &muted {
                    if self.scheduler.cancel(guild_id, target) {
                        debug!(
                            "Dropped pending expiry for user {} in guild {}",
                            target, guild_id
                        );
                    }
                }
            }
        }

        Ok(results)
    }

    async fn mute_one(
        &self,
        batch: &MuteBatch<'_>,
        hierarchy: &mut GuildHierarchy<'_>,
        target: UserId,
    ) -> Outcome {
        let guild_id = batch.guild.guild_id;

        let member = match self.platform.member(guild_id, target).await {
            Ok(m) => m,
            Err(e) => return Outcome::Failed(FailReason::Platform(e.to_string())),
        };

        if member.has_role(batch.mute_role) {
            return Outcome::Skipped(SkipReason::AlreadyMuted);
        }

        hierarchy.insert(member.clone());
        if let Verdict::Deny(reason) =
            self.policy
                .evaluate(&*hierarchy, &batch.policy_ctx, batch.actor, target)
        {
            return Outcome::Failed(FailReason::PolicyDenied(reason));
        }

        // The member lacks the mute role, so any record left is stale
        match self.store.get_mute(guild_id, target).await {
            Ok(Some(_)) => {
                warn!(
                    "Discarding stale mute record for user {} in guild {}",
                    target, guild_id
                );
                if let Err(e) = self.store.clear_mute(guild_id, target).await {
                    return Outcome::Failed(FailReason::Store(e.to_string()));
                }
            }
            Ok(None) => {}
            Err(e) => return Outcome::Failed(FailReason::Store(e.to_string())),
        }

        match batch.kind {
            MuteKind::Soft => {
                match self
                    .platform
                    .add_role(guild_id, target, batch.mute_role, &batch.audit_reason)
                    .await
                {
                    Ok(()) => Outcome::Muted,
                    Err(e) => Outcome::Failed(FailReason::Platform(e.to_string())),
                }
            }
            MuteKind::Hard => self.hard_mute(batch, &member).await,
        }
    }

    async fn hard_mute(&self, batch: &MuteBatch<'_>, member: &MemberInfo) -> Outcome {
        let guild_id = batch.guild.guild_id;
        let target = member.user_id;

        let saved_roles: Vec<RoleId> = member
            .roles
            .iter()
            .copied()
            .filter(|r| *r != batch.mute_role)
            .collect();

        if let Err(e) = self
            .platform
            .set_roles(guild_id, target, &[batch.mute_role], &batch.audit_reason)
            .await
        {
            return Outcome::Failed(FailReason::Platform(e.to_string()));
        }

        let new = NewMute {
            guild_id,
            user_id: target,
            saved_role_ids: saved_roles.clone(),
            muted_by: batch.actor,
            reason: batch.reason.map(str::to_string),
            expires_at: batch.expires_at,
        };

        match self.store.record_mute(new).await {
            Ok(_) => Outcome::Muted,
            Err(e) => {
                // Roles are already replaced; keep the snapshot in the logs so
                // an administrator can restore it by hand.
                error!(
                    "Hardmuted user {} in guild {} but could not save role snapshot {:?}: {}",
                    target, guild_id, saved_roles, e
                );
                Outcome::Failed(FailReason::Store(e.to_string()))
            }
        }
    }

    /// Unmute every target through the same routine for commands and expiry
    pub async fn unmute(
        &self,
        guild_id: GuildId,
        trigger: UnmuteTrigger,
        targets: &[UserId],
    ) -> Result<Vec<TargetResult>, Error> {
        let mute_role = self
            .store
            .get_mute_role(guild_id)
            .await?
            .ok_or(Error::MuteRoleNotConfigured)?;

        let guild = self.platform.guild(guild_id).await?;
        let audit = match trigger {
            UnmuteTrigger::Manual { actor } => format!("Unmuted by {}", actor),
            UnmuteTrigger::Expiry { .. } => "Timed mute expired".to_string(),
        };

        let mut results = Vec::with_capacity(targets.len());
        let mut aborted = false;

        for &target in targets {
            if aborted {
                results.push(TargetResult::new(
                    target,
                    Outcome::Skipped(SkipReason::BatchAborted),
                ));
                continue;
            }

            let outcome = self
                .unmute_one(&guild, mute_role, trigger, target, &audit)
                .await;

            match &outcome {
                Outcome::Unmuted => {
                    info!("Unmuted user {} in guild {} ({:?})", target, guild_id, trigger);
                    if let UnmuteTrigger::Manual { .. } = trigger {
                        self.scheduler.cancel(guild_id, target);
                    }
                    let notify = match trigger {
                        UnmuteTrigger::Manual { .. } => true,
                        UnmuteTrigger::Expiry { notify } => notify,
                    };
                    if notify {
                        self.notify_unmuted(&guild, target).await;
                    }
                }
                Outcome::Failed(why) => {
                    if let UnmuteTrigger::Manual { .. } = trigger {
                        aborted = self.batch_mode == BatchMode::AbortOnFirstFailure;
                    }
                    warn!(
                        "Failed to unmute user {} in guild {}: {}",
                        target, guild_id, why
                    );
                }
                _ => {}
            }

            results.push(TargetResult::new(target, outcome));
        }

        Ok(results)
    }

    async fn unmute_one(
        &self,
        guild: &GuildInfo,
        mute_role: RoleId,
        trigger: UnmuteTrigger,
        target: UserId,
        audit: &str,
    ) -> Outcome {
        let guild_id = guild.guild_id;

        let member = match self.platform.member(guild_id, target).await {
            Ok(m) => m,
            Err(e) => return Outcome::Failed(FailReason::Platform(e.to_string())),
        };

        if !member.has_role(mute_role) {
            match self.store.clear_mute(guild_id, target).await {
                Ok(true) => warn!(
                    "Cleared stale mute record for user {} in guild {}",
                    target, guild_id
                ),
                Ok(false) => {}
                Err(e) => warn!("Could not clear mute record for user {}: {}", target, e),
            }

            return match trigger {
                UnmuteTrigger::Manual { .. } => Outcome::Failed(FailReason::NotMuted),
                UnmuteTrigger::Expiry { .. } => Outcome::Skipped(SkipReason::AlreadyUnmuted),
            };
        }

        let record = match self.store.get_mute(guild_id, target).await {
            Ok(r) => r,
            Err(e) => return Outcome::Failed(FailReason::Store(e.to_string())),
        };

        let Some(record) = record else {
            // Soft mute, or a hard mute whose snapshot was never written
            return match self
                .platform
                .remove_role(guild_id, target, mute_role, audit)
                .await
            {
                Ok(()) => Outcome::Unmuted,
                Err(e) => Outcome::Failed(FailReason::Platform(e.to_string())),
            };
        };

        let restored = restored_roles(guild, &member, mute_role, &record.saved_roles());
        if let Err(e) = self
            .platform
            .set_roles(guild_id, target, &restored, audit)
            .await
        {
            // Keep the record so the next attempt can still restore it
            return Outcome::Failed(FailReason::Platform(e.to_string()));
        }

        match self.store.clear_mute(guild_id, target).await {
            Ok(_) => Outcome::Unmuted,
            Err(e) => Outcome::Failed(FailReason::Store(e.to_string())),
        }
    }

    /// Arrange an automatic unmute for each target after `delay`
    pub fn schedule_unmute(
        self: &Arc<Self>,
        guild_id: GuildId,
        targets: &[UserId],
        delay: Duration,
        notify: bool,
    ) {
        for &target in targets {
            let service = Arc::clone(self);
            self.scheduler.schedule(guild_id, target, delay, async move {
                service.expire(guild_id, target, notify).await;
            });
        }
    }

    async fn expire(&self, guild_id: GuildId, user_id: UserId, notify: bool) {
        match self
            .unmute(guild_id, UnmuteTrigger::Expiry { notify }, &[user_id])
            .await
        {
            Ok(results) => {
                for result in results {
                    match result.outcome {
                        Outcome::Skipped(reason) => debug!(
                            "Expiry for user {} in guild {} was a no-op: {}",
                            user_id, guild_id, reason
                        ),
                        Outcome::Failed(reason) => error!(
                            "Timed unmute of user {} in guild {} failed: {}",
                            user_id, guild_id, reason
                        ),
                        _ => {}
                    }
                }
            }
            Err(e) => error!(
                "Timed unmute of user {} in guild {} failed: {}",
                user_id, guild_id, e
            ),
        }
    }

    /// Re-arm timers for every stored mute with an expiry. Overdue mutes
    /// are released right away.
    pub async fn resume_pending(self: &Arc<Self>) -> Result<usize, Error> {
        let records = self.store.list_expiring().await?;
        let now = Utc::now();

        for record in &records {
            let delay = if record.is_expired(now) {
                debug!(
                    "Mute of user {} in guild {} ran out while offline",
                    record.user_id, record.guild_id
                );
                Duration::ZERO
            } else {
                record
                    .expires_at
                    .and_then(|at| (at - now).to_std().ok())
                    .unwrap_or(Duration::ZERO)
            };

            self.schedule_unmute(
                record.guild(),
                &[record.user()],
                delay,
                record.reason.is_some(),
            );
        }

        Ok(records.len())
    }

    async fn notify_muted(
        &self,
        guild: &GuildInfo,
        target: UserId,
        duration: Option<Duration>,
        reason: Option<&str>,
    ) {
        // Only announced when the moderator gave a reason
        let Some(reason) = reason else { return };

        let description = format!(
            "You have been muted in **{}**.\n**Reason:** {}\n**Duration:** {}",
            guild.name,
            reason,
            format_mute_length(duration)
        );

        if let Err(e) = self
            .platform
            .send_dm(target, "You have been muted", &description)
            .await
        {
            debug!("Could not DM user {} about their mute: {:?}", target, e);
        }
    }

    async fn notify_unmuted(&self, guild: &GuildInfo, target: UserId) {
        let description = format!("You have been unmuted in **{}**.", guild.name);

        if let Err(e) = self
            .platform
            .send_dm(target, "You have been unmuted", &description)
            .await
        {
            debug!("Could not DM user {} about their unmute: {:?}", target, e);
        }
    }
}

/// Roles to apply when lifting a hard mute: whatever the member holds now
/// (minus the mute role) plus the snapshot, skipping roles deleted since.
fn restored_roles(
    guild: &GuildInfo,
    member: &MemberInfo,
    mute_role: RoleId,
    saved: &[RoleId],
) -> Vec<RoleId> {
    let mut roles: Vec<RoleId> = member
        .roles
        .iter()
        .copied()
        .filter(|r| *r != mute_role)
        .collect();

    for role in saved {
        if *role != mute_role && guild.role_exists(*role) && !roles.contains(role) {
            roles.push(*role);
        }
    }

    roles
}

fn audit_reason(actor: UserId, reason: Option<&str>) -> String {
    let text = match reason {
        Some(r) => format!("Muted by {}: {}", actor, r),
        None => format!("Muted by {}", actor),
    };
    truncate(&text, AUDIT_REASON_MAX_LEN)
}
