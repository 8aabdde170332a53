use std::collections::HashSet;
use std::env;

use crate::constants::timeouts::DEFAULT_COMMAND_PREFIX;
use crate::services::moderation::BatchMode;

#[derive(Debug, Clone)]
pub struct Settings {
    pub discord_token: String,
    pub database_url: String,
    pub guild_id: Option<u64>,
    /// Prefix for text commands (mute commands take a variable target list)
    pub command_prefix: String,
    /// Bot operators that can never be punished and bypass rank checks
    pub owner_ids: HashSet<u64>,
    /// What to do with the rest of a batch after one target fails
    pub batch_mode: BatchMode,
}

impl Settings {
    pub fn from_env() -> Result<Self, String> {
        let discord_token = env::var("DISCORD_TOKEN")
            .map_err(|_| "DISCORD_TOKEN environment variable not set")?;

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| "DATABASE_URL environment variable not set")?;

        let guild_id = env::var("GUILD_ID")
            .ok()
            .and_then(|s| s.parse::<u64>().ok());

        let command_prefix = env::var("COMMAND_PREFIX")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_COMMAND_PREFIX.to_string());

        let owner_ids = match env::var("OWNER_IDS") {
            Ok(raw) => parse_id_list(&raw)?,
            Err(_) => HashSet::new(),
        };

        let batch_mode = match env::var("MUTE_BATCH_MODE") {
            Ok(raw) => raw.parse()?,
            Err(_) => BatchMode::default(),
        };

        Ok(Self {
            discord_token,
            database_url,
            guild_id,
            command_prefix,
            owner_ids,
            batch_mode,
        })
    }
}

/// Parse a comma-separated list of snowflake ids, ignoring blanks
pub fn parse_id_list(raw: &str) -> Result<HashSet<u64>, String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<u64>()
                .map_err(|_| format!("Invalid id in OWNER_IDS: {}", s))
        })
        .collect()
}
