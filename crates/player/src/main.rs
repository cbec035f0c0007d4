mod app;
mod client;
mod command;
mod config;
mod render;

use clap::Parser;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use app::Player;
use config::PlayerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env before clap reads env fallbacks.
    dotenvy::dotenv().ok();

    // Logs go to stderr so they do not interleave with the story text.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "storyline_player=info,storyline_core=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = PlayerConfig::parse();
    tracing::info!(slug = %config.slug, api_url = %config.api_url, "Starting player");

    let (player, effects) = Player::load(&config).await?;
    player.run(effects).await
}
