//! A Discord bot for an osu! private-server community.
//!
//! Commands are grouped into cogs under [commands], the shared state lives in [data],
//! and everything needed to start the bot is in [setup].

mod chat;
mod commands;
mod data;
mod error;
mod lastfm;
mod lib;
mod log;
mod osu;
mod reworks;
mod setup;
mod wordbomb;

use poise::serenity_prelude as serenity;

pub use data::Data;
pub use error::KselonError;
pub use setup::Config;

/// Convenient type alias for [poise::Context].
type Context<'a> = poise::Context<'a, Data, KselonError>;

#[tokio::main]
async fn main() -> Result<(), KselonError> {
    // Secrets may live in a `.env` file, load it before reading the config.
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("No .env loaded: {e}");
    }

    let config = Config::read()?;

    // Keep the guard alive, dropping it stops the file writer.
    let _guard = log::install_tracing(&config);

    let mut client = setup::client(config).await?;

    tracing::info!("Starting the bot...");
    client.start().await?;

    Ok(())
}
