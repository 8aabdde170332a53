use std::collections::HashMap;

use serenity::all::{Member, PartialGuild, Permissions, RoleId};

/// Compute a member's guild-level permissions from their roles
///
/// The guild owner implicitly has every permission, and administrators are
/// expanded to the full set the same way the platform does.
pub fn member_permissions(guild: &PartialGuild, member: &Member) -> Permissions {
    if member.user.id == guild.owner_id {
        return Permissions::all();
    }

    let everyone = RoleId::new(guild.id.get());
    let mut permissions = guild
        .roles
        .get(&everyone)
        .map(|r| r.permissions)
        .unwrap_or_else(Permissions::empty);

    for role_id in &member.roles {
        if let Some(role) = guild.roles.get(role_id) {
            permissions |= role.permissions;
        }
    }

    if permissions.administrator() {
        Permissions::all()
    } else {
        permissions
    }
}

/// Role id -> hierarchy position for every role of a guild
pub fn role_positions(guild: &PartialGuild) -> HashMap<RoleId, i64> {
    guild
        .roles
        .iter()
        .map(|(id, role)| (*id, i64::from(role.position)))
        .collect()
}

/// Position of the highest role in `held`, or 0 when none are known
pub fn top_role_position(positions: &HashMap<RoleId, i64>, held: &[RoleId]) -> i64 {
    held.iter()
        .filter_map(|id| positions.get(id).copied())
        .max()
        .unwrap_or(0)
}
