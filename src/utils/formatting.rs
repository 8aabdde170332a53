use serenity::all::{RoleId, UserId};

/// Format a user mention
pub fn mention_user(user_id: UserId) -> String {
    format!("<@{}>", user_id)
}

/// Format a role mention
pub fn mention_role(role_id: RoleId) -> String {
    format!("<@&{}>", role_id)
}

/// Join user mentions into a single comma-separated line
pub fn mention_users(user_ids: &[UserId]) -> String {
    user_ids
        .iter()
        .map(|id| mention_user(*id))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Truncate a string to a maximum length, adding ellipsis if needed
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mentions() {
        assert_eq!(mention_user(UserId::new(42)), "<@42>");
        assert_eq!(mention_role(RoleId::new(7)), "<@&7>");
        assert_eq!(
            mention_users(&[UserId::new(1), UserId::new(2)]),
            "<@1>, <@2>"
        );
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a longer reason", 8), "a lon...");
        assert_eq!(truncate("abcdef", 2), "ab");
    }
}
