use std::collections::HashSet;

use serenity::all::{Permissions, UserId};
use thiserror::Error;

/// Platform capabilities the policy cares about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    KickMembers,
}

impl Capability {
    pub fn permission(self) -> Permissions {
        match self {
            Capability::KickMembers => Permissions::KICK_MEMBERS,
        }
    }
}

/// Read-only view of a guild's role hierarchy
pub trait Hierarchy {
    /// Position of the user's highest role; 0 for members with no roles
    fn rank(&self, user: UserId) -> i64;

    fn has_capability(&self, user: UserId, capability: Capability) -> bool;
}

/// Per-guild facts the policy needs besides the hierarchy itself
#[derive(Debug, Clone, Copy)]
pub struct PolicyContext {
    pub owner_id: UserId,
    pub bot_id: UserId,
    pub mute_role_rank: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DenyReason {
    #[error("cannot act on protected user")]
    ProtectedTarget,

    #[error("cannot act on self")]
    SelfTarget,

    #[error("cannot act on self (bot)")]
    BotTarget,

    #[error("cannot punish staff")]
    StaffTarget,

    #[error("insufficient rank")]
    InsufficientRank,

    #[error("mute role unreachable")]
    MuteRoleUnreachable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Allow,
    Deny(DenyReason),
}

impl Verdict {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Verdict::Allow)
    }
}

/// Capability that marks a member as staff
const STAFF_CAPABILITY: Capability = Capability::KickMembers;

/// Decides whether a moderator may mute a target
///
/// Ranks and capabilities are only seen through [`Hierarchy`], so the rules
/// run without a live platform connection.
#[derive(Debug, Clone, Default)]
pub struct MutePolicy {
    protected: HashSet<UserId>,
}

impl MutePolicy {
    pub fn new(protected: impl IntoIterator<Item = UserId>) -> Self {
        Self {
            protected: protected.into_iter().collect(),
        }
    }

    pub fn is_protected(&self, user: UserId) -> bool {
        self.protected.contains(&user)
    }

    /// Evaluate a mute/unmute request. Rules are checked in order and the
    /// first match wins; denial has no side effects.
    pub fn evaluate<H: Hierarchy + ?Sized>(
        &self,
        hierarchy: &H,
        ctx: &PolicyContext,
        actor: UserId,
        target: UserId,
    ) -> Verdict {
        let actor_privileged = self.is_protected(actor) || actor == ctx.owner_id;

        if self.is_protected(target) {
            return Verdict::Deny(DenyReason::ProtectedTarget);
        }
        if target == actor {
            return Verdict::Deny(DenyReason::SelfTarget);
        }
        if target == ctx.bot_id {
            return Verdict::Deny(DenyReason::BotTarget);
        }
        if hierarchy.has_capability(target, STAFF_CAPABILITY) && !actor_privileged {
            return Verdict::Deny(DenyReason::StaffTarget);
        }

        let effective = self.effective_rank(hierarchy, ctx, actor);
        if !self.is_protected(actor) && effective < hierarchy.rank(target) {
            return Verdict::Deny(DenyReason::InsufficientRank);
        }
        if effective < ctx.mute_role_rank {
            return Verdict::Deny(DenyReason::MuteRoleUnreachable);
        }

        Verdict::Allow
    }

    /// The acting side can never reach further than the bot itself. Protected
    /// identities and the guild owner act with the bot's full rank.
    fn effective_rank<H: Hierarchy + ?Sized>(
        &self,
        hierarchy: &H,
        ctx: &PolicyContext,
        actor: UserId,
    ) -> i64 {
        let bot_rank = hierarchy.rank(ctx.bot_id);
        if self.is_protected(actor) || actor == ctx.owner_id {
            bot_rank
        } else {
            hierarchy.rank(actor).min(bot_rank)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    const OWNER: UserId = UserId::new(1);
    const BOT: UserId = UserId::new(2);
    const OPERATOR: UserId = UserId::new(3);
    const MODERATOR: UserId = UserId::new(10);
    const MEMBER: UserId = UserId::new(11);
    const STAFF: UserId = UserId::new(12);
    const ADMIN: UserId = UserId::new(13);

    #[derive(Default)]
    struct FakeHierarchy {
        ranks: HashMap<UserId, i64>,
        staff: HashSet<UserId>,
    }

    impl Hierarchy for FakeHierarchy {
        fn rank(&self, user: UserId) -> i64 {
            self.ranks.get(&user).copied().unwrap_or(0)
        }

        fn has_capability(&self, user: UserId, capability: Capability) -> bool {
            capability == Capability::KickMembers && self.staff.contains(&user)
        }
    }

    fn hierarchy() -> FakeHierarchy {
        FakeHierarchy {
            ranks: HashMap::from([
                (BOT, 10),
                (OWNER, 20),
                (MODERATOR, 5),
                (MEMBER, 1),
                (STAFF, 4),
                (ADMIN, 8),
            ]),
            staff: HashSet::from([STAFF, MODERATOR, ADMIN]),
        }
    }

    fn ctx() -> PolicyContext {
        PolicyContext {
            owner_id: OWNER,
            bot_id: BOT,
            mute_role_rank: 2,
        }
    }

    fn policy() -> MutePolicy {
        MutePolicy::new([OPERATOR])
    }

    #[test]
    fn test_allows_moderator_over_member() {
        let verdict = policy().evaluate(&hierarchy(), &ctx(), MODERATOR, MEMBER);
        assert_eq!(verdict, Verdict::Allow);
        assert!(verdict.is_allowed());
    }

    #[test]
    fn test_protected_target_checked_first() {
        // Even the guild owner cannot touch an operator
        let verdict = policy().evaluate(&hierarchy(), &ctx(), OWNER, OPERATOR);
        assert_eq!(verdict, Verdict::Deny(DenyReason::ProtectedTarget));
    }

    #[test]
    fn test_self_check_precedes_rank_check() {
        let mut h = hierarchy();
        h.ranks.insert(MEMBER, 0);
        let ctx = PolicyContext {
            mute_role_rank: 9,
            ..ctx()
        };

        let verdict = policy().evaluate(&h, &ctx, MEMBER, MEMBER);
        assert_eq!(verdict, Verdict::Deny(DenyReason::SelfTarget));
    }

    #[test]
    fn test_cannot_target_bot() {
        let verdict = policy().evaluate(&hierarchy(), &ctx(), OWNER, BOT);
        assert_eq!(verdict, Verdict::Deny(DenyReason::BotTarget));
    }

    #[test]
    fn test_staff_protected_from_non_owner() {
        let verdict = policy().evaluate(&hierarchy(), &ctx(), ADMIN, STAFF);
        assert_eq!(verdict, Verdict::Deny(DenyReason::StaffTarget));
    }

    #[test]
    fn test_owner_and_operator_may_punish_staff() {
        assert_eq!(
            policy().evaluate(&hierarchy(), &ctx(), OWNER, STAFF),
            Verdict::Allow
        );
        assert_eq!(
            policy().evaluate(&hierarchy(), &ctx(), OPERATOR, STAFF),
            Verdict::Allow
        );
    }

    #[test]
    fn test_insufficient_rank() {
        let mut h = hierarchy();
        h.ranks.insert(MEMBER, 7);

        let verdict = policy().evaluate(&h, &ctx(), MODERATOR, MEMBER);
        assert_eq!(verdict, Verdict::Deny(DenyReason::InsufficientRank));
    }

    #[test]
    fn test_equal_rank_is_allowed() {
        let mut h = hierarchy();
        h.ranks.insert(MEMBER, 5);

        let verdict = policy().evaluate(&h, &ctx(), MODERATOR, MEMBER);
        assert_eq!(verdict, Verdict::Allow);
    }

    #[test]
    fn test_rank_is_capped_by_bot() {
        // The moderator outranks the target, but the bot does not
        let mut h = hierarchy();
        h.ranks.insert(MODERATOR, 12);
        h.ranks.insert(MEMBER, 11);

        let verdict = policy().evaluate(&h, &ctx(), MODERATOR, MEMBER);
        assert_eq!(verdict, Verdict::Deny(DenyReason::InsufficientRank));
    }

    #[test]
    fn test_operator_bypasses_rank_but_not_mute_role() {
        let mut h = hierarchy();
        h.ranks.insert(MEMBER, 15);
        assert_eq!(
            policy().evaluate(&h, &ctx(), OPERATOR, MEMBER),
            Verdict::Allow
        );

        let ctx = PolicyContext {
            mute_role_rank: 12,
            ..ctx()
        };
        assert_eq!(
            policy().evaluate(&h, &ctx, OPERATOR, MEMBER),
            Verdict::Deny(DenyReason::MuteRoleUnreachable)
        );
    }

    #[test]
    fn test_mute_role_unreachable() {
        let ctx = PolicyContext {
            mute_role_rank: 6,
            ..ctx()
        };

        let verdict = policy().evaluate(&hierarchy(), &ctx, MODERATOR, MEMBER);
        assert_eq!(verdict, Verdict::Deny(DenyReason::MuteRoleUnreachable));
    }

    #[test]
    fn test_deny_reason_messages() {
        assert_eq!(DenyReason::SelfTarget.to_string(), "cannot act on self");
        assert_eq!(DenyReason::StaffTarget.to_string(), "cannot punish staff");
        assert_eq!(
            DenyReason::MuteRoleUnreachable.to_string(),
            "mute role unreachable"
        );
    }
}
