//! Defines and implements custom bot functionality.

mod config;
mod framework;

use crate::serenity;
use crate::KselonError;

pub use config::Config;
pub use config::DatabaseConfig;
pub use config::LlmConfig;

/// Constructs a [serenity::Client] running the [poise::Framework].
pub(super) async fn client(config: Config) -> Result<serenity::Client, KselonError> {
    // Get discord token from config file
    let token = config.token()?.clone();

    // Message content for prefix commands and word bomb, members for the auto role.
    // See https://discord.com/developers/docs/topics/gateway#gateway-intents
    let intents = serenity::GatewayIntents::non_privileged()
        | serenity::GatewayIntents::MESSAGE_CONTENT
        | serenity::GatewayIntents::GUILD_MEMBERS;

    let mut builder = serenity::ClientBuilder::new(token, intents);
    if !config.status().is_empty() {
        builder = builder.activity(serenity::ActivityData::custom(config.status()));
    }

    let client = builder.framework(framework::framework(config)).await?;

    Ok(client)
}
