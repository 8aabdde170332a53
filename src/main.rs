use muzzle::{bot, bot::error::Error, config::Settings, db};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // RUST_LOG wins; otherwise log this crate at info
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("muzzle=info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Muzzle Discord Bot");

    // Load settings
    let settings = match Settings::from_env() {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to load settings: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = start(settings).await {
        error!("Bot stopped: {}", e);
        std::process::exit(1);
    }
}

async fn start(settings: Settings) -> Result<(), Error> {
    info!(
        "Batch mode {:?}, {} protected user(s), prefix '{}'",
        settings.batch_mode,
        settings.owner_ids.len(),
        settings.command_prefix
    );

    // Mute records and mute role configs live in Postgres
    let pool = db::pool::create_pool(&settings.database_url).await?;
    db::pool::run_migrations(&pool).await?;
    info!("Database initialized successfully");

    bot::framework::run(settings, pool).await
}
