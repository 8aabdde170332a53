use sqlx::PgPool;

use crate::db::models::{MuteRecord, NewMute};

/// Insert a mute record, returning `None` when one already exists for the
/// (guild, user) pair
pub async fn create(pool: &PgPool, new: &NewMute) -> Result<Option<MuteRecord>, sqlx::Error> {
    sqlx::query_as::<_, MuteRecord>(
        r#"
        INSERT INTO mute_records (guild_id, user_id, saved_role_ids, muted_by_user_id, reason, expires_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (guild_id, user_id) DO NOTHING
        RETURNING *
        "#,
    )
    .bind(new.guild_id.get() as i64)
    .bind(new.user_id.get() as i64)
    .bind(new.saved_role_ids_i64())
    .bind(new.muted_by.get() as i64)
    .bind(new.reason.as_deref())
    .bind(new.expires_at)
    .fetch_optional(pool)
    .await
}

pub async fn get(
    pool: &PgPool,
    guild_id: i64,
    user_id: i64,
) -> Result<Option<MuteRecord>, sqlx::Error> {
    sqlx::query_as::<_, MuteRecord>(
        "SELECT * FROM mute_records WHERE guild_id = $1 AND user_id = $2",
    )
    .bind(guild_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

/// Delete a mute record. Returns whether a row was removed.
pub async fn delete(pool: &PgPool, guild_id: i64, user_id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM mute_records WHERE guild_id = $1 AND user_id = $2")
        .bind(guild_id)
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// All records that carry an expiry, soonest first
pub async fn list_expiring(pool: &PgPool) -> Result<Vec<MuteRecord>, sqlx::Error> {
    sqlx::query_as::<_, MuteRecord>(
        r#"
        SELECT * FROM mute_records
        WHERE expires_at IS NOT NULL
        ORDER BY expires_at ASC
        "#,
    )
    .fetch_all(pool)
    .await
}
