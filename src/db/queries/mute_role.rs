use sqlx::PgPool;

use crate::db::models::MuteRoleConfig;

pub async fn get(pool: &PgPool, guild_id: i64) -> Result<Option<MuteRoleConfig>, sqlx::Error> {
    sqlx::query_as::<_, MuteRoleConfig>("SELECT * FROM mute_role_configs WHERE guild_id = $1")
        .bind(guild_id)
        .fetch_optional(pool)
        .await
}

/// Create or replace the guild's mute role
pub async fn set(
    pool: &PgPool,
    guild_id: i64,
    mute_role_id: i64,
    updated_by_user_id: i64,
) -> Result<MuteRoleConfig, sqlx::Error> {
    sqlx::query_as::<_, MuteRoleConfig>(
        r#"
        INSERT INTO mute_role_configs (guild_id, mute_role_id, updated_by_user_id)
        VALUES ($1, $2, $3)
        ON CONFLICT (guild_id)
        DO UPDATE SET mute_role_id = $2, updated_by_user_id = $3, updated_at = NOW()
        RETURNING *
        "#,
    )
    .bind(guild_id)
    .bind(mute_role_id)
    .bind(updated_by_user_id)
    .fetch_one(pool)
    .await
}

/// Remove the guild's mute role, only if it still points at `mute_role_id`
pub async fn delete_if_role(
    pool: &PgPool,
    guild_id: i64,
    mute_role_id: i64,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "DELETE FROM mute_role_configs WHERE guild_id = $1 AND mute_role_id = $2",
    )
    .bind(guild_id)
    .bind(mute_role_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}
