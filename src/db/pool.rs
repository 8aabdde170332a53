use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::info;

/// Schema files, applied in order on every start
const MIGRATIONS: [(&str, &str); 2] = [
    (
        "001_mute_role_configs",
        include_str!("../../migrations/001_mute_role_configs.sql"),
    ),
    (
        "002_mute_records",
        include_str!("../../migrations/002_mute_records.sql"),
    ),
];

pub async fn create_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    info!("Connecting to database...");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;

    info!("Database connection established");

    Ok(pool)
}

pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    info!("Running database migrations...");

    for (name, migration) in MIGRATIONS {
        info!("Running migration {}", name);
        for statement in statements(migration) {
            // Tables and indexes from an earlier start are left as they are
            if let Err(e) = sqlx::query(statement).execute(pool).await {
                if !is_already_applied(&e.to_string()) {
                    return Err(e);
                }
            }
        }
    }

    info!("Migrations completed successfully");
    Ok(())
}

/// Non-empty statements of a migration file
fn statements(migration: &str) -> impl Iterator<Item = &str> {
    migration.split(';').map(str::trim).filter(|s| !s.is_empty())
}

fn is_already_applied(message: &str) -> bool {
    message.contains("already exists") || message.contains("duplicate key")
}
