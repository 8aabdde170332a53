use std::fmt;
use std::sync::Arc;

use serenity::all::{Http, UserId};
use sqlx::PgPool;

use crate::config::Settings;
use crate::services::moderation::{MutePolicy, MuteService, PgMuteStore, SerenityPlatform};

/// Shared data available to all commands and handlers
pub struct Data {
    pub settings: Settings,
    /// Mute lifecycle, including the pending expiry timers
    pub mute_service: Arc<MuteService>,
}

impl Data {
    pub fn new(pool: PgPool, settings: Settings, http: Arc<Http>, bot_id: UserId) -> Self {
        let store = Arc::new(PgMuteStore::new(pool));
        let platform = Arc::new(SerenityPlatform::new(http, bot_id));
        let policy = MutePolicy::new(settings.owner_ids.iter().map(|id| UserId::new(*id)));

        let mute_service = Arc::new(MuteService::new(
            store,
            platform,
            policy,
            settings.batch_mode,
        ));

        Self {
            settings,
            mute_service,
        }
    }
}

impl fmt::Debug for Data {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Data")
            .field("batch_mode", &self.settings.batch_mode)
            .field(
                "pending_expiries",
                &self.mute_service.scheduler().pending_count(),
            )
            .finish_non_exhaustive()
    }
}

pub type Context<'a> = poise::Context<'a, Arc<Data>, crate::bot::error::Error>;
